//! Page break hints for the rasterizer's document clone
//!
//! The rules are positional: breaks go after fixed section ordinals, and the
//! signature block is pushed to the next page when it starts inside the last
//! band of a page. No layout is computed.

use crate::config::{PageBreakRules, PageFormat};

/// The document clone the rasterizer is about to capture.
pub trait ClonedDocument {
    /// Number of elements matching the section selector
    fn section_count(&self) -> usize;

    /// Insert a break element immediately after the section at `index`
    fn insert_break_after_section(&mut self, index: usize) -> Result<(), String>;

    /// Top of the signature block in CSS pixels, if the block exists
    fn signature_top(&self) -> Option<f64>;

    /// Insert a break element immediately before the signature block
    fn insert_break_before_signature(&mut self) -> Result<(), String>;
}

/// Breaks actually inserted into a clone
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BreakReport {
    pub after_sections: Vec<usize>,
    pub before_signature: bool,
}

/// Page height in CSS pixels as approximated by the rules
pub fn page_height_px(rules: &PageBreakRules, format: &PageFormat) -> f64 {
    format.height_mm * rules.px_per_mm
}

/// Whether a block starting at `top_px` sits in the trailing band of a page
pub fn signature_needs_break(top_px: f64, rules: &PageBreakRules, format: &PageFormat) -> bool {
    let page_height = page_height_px(rules, format);
    (top_px % page_height) > page_height - rules.trailing_band_px
}

/// Apply the break rules to a document clone
pub fn prepare_clone<D: ClonedDocument + ?Sized>(
    doc: &mut D,
    rules: &PageBreakRules,
    format: &PageFormat,
) -> Result<BreakReport, String> {
    let mut report = BreakReport::default();
    let sections = doc.section_count();

    for &index in &rules.break_after_sections {
        if index < sections {
            doc.insert_break_after_section(index)?;
            report.after_sections.push(index);
        }
    }

    if let Some(top) = doc.signature_top() {
        if signature_needs_break(top, rules, format) {
            doc.insert_break_before_signature()?;
            report.before_signature = true;
        }
    }

    tracing::debug!(?report, "page breaks inserted into clone");
    Ok(report)
}
