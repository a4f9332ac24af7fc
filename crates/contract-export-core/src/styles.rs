//! Stylesheet and overlay markup injected while exporting

use crate::signature::escape_html;

/// Print-safe layout applied to the live document during capture
pub const PRINT_STYLESHEET: &str = r#"
body {
    background-color: white !important;
    margin: 0 !important;
    padding: 0 !important;
}

.contract-container {
    box-shadow: none !important;
    width: 210mm !important;
}

.no-print {
    display: none !important;
}

.page-break {
    page-break-after: always;
    break-after: page;
    height: 0;
    display: block;
}

.signature-area, .payment-info, h1, h2, h3,
.info-box, .section-title, .witness-section {
    break-inside: avoid;
    page-break-inside: avoid;
}

h1, h2, h3 {
    break-after: avoid;
    page-break-after: avoid;
}
"#;

/// Inline style of the full-screen busy overlay
pub const OVERLAY_STYLE: &str = "position: fixed; top: 0; left: 0; width: 100%; height: 100%; \
background-color: rgba(0, 0, 0, 0.5); display: flex; justify-content: center; \
align-items: center; z-index: 9999;";

/// Inner markup of the busy overlay: message and spinner
pub fn overlay_markup(message: &str) -> String {
    format!(
        r#"<div style="background-color: white; padding: 20px; border-radius: 5px; text-align: center;">
    <p>{}</p>
    <div style="margin: 10px auto; width: 40px; height: 40px; border: 4px solid #f3f3f3; border-top: 4px solid #0B3C5D; border-radius: 50%; animation: pdf-export-spin 1s linear infinite;"></div>
</div>
<style>
    @keyframes pdf-export-spin {{
        0% {{ transform: rotate(0deg); }}
        100% {{ transform: rotate(360deg); }}
    }}
</style>"#,
        escape_html(message)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_stylesheet_covers_breaks() {
        assert!(PRINT_STYLESHEET.contains(".page-break"));
        assert!(PRINT_STYLESHEET.contains("break-after: page"));
        assert!(PRINT_STYLESHEET.contains(".no-print"));
        assert!(PRINT_STYLESHEET.contains("width: 210mm"));
    }

    #[test]
    fn test_overlay_markup_escapes_message() {
        let html = overlay_markup("Generating <PDF>...");
        assert!(html.contains("<p>Generating &lt;PDF&gt;...</p>"));
        assert!(html.contains("@keyframes pdf-export-spin {"));
    }
}
