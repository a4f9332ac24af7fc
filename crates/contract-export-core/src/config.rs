//! Export and signature rendering configuration
//!
//! Every field has a default matching the contract page markup, so callers
//! only need to pass the values they want to override. Keys are camelCase
//! because the configuration usually arrives from JavaScript.

use crate::error::ExportError;
use serde::{Deserialize, Serialize};

/// Page size of the produced document, in millimetres (portrait).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageFormat {
    #[serde(default = "default_page_width")]
    pub width_mm: f64,
    #[serde(default = "default_page_height")]
    pub height_mm: f64,
}

impl PageFormat {
    pub const A4: PageFormat = PageFormat {
        width_mm: 210.0,
        height_mm: 297.0,
    };
}

impl Default for PageFormat {
    fn default() -> Self {
        Self::A4
    }
}

/// Options handed to the external rasterizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureOptions {
    /// Device pixel multiplier (default: 2)
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default = "default_true")]
    pub use_cors: bool,
    #[serde(default = "default_true")]
    pub allow_taint: bool,
    #[serde(default = "default_background")]
    pub background_color: String,
    /// Rasterizer-side logging
    #[serde(default)]
    pub logging: bool,
    /// Per-image timeout in ms; 0 disables it
    #[serde(default)]
    pub image_timeout_ms: u32,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            scale: default_scale(),
            use_cors: true,
            allow_taint: true,
            background_color: default_background(),
            logging: false,
            image_timeout_ms: 0,
        }
    }
}

/// Content-blind page break hints applied to the rasterizer's document clone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageBreakRules {
    #[serde(default = "default_section_selector")]
    pub section_selector: String,
    #[serde(default = "default_signature_selector")]
    pub signature_selector: String,
    /// Zero-based section ordinals followed by a forced break
    #[serde(default = "default_break_after")]
    pub break_after_sections: Vec<usize>,
    /// Trailing band of a page (px) in which the signature block is pushed down
    #[serde(default = "default_trailing_band")]
    pub trailing_band_px: f64,
    /// Approximate CSS pixels per millimetre
    #[serde(default = "default_px_per_mm")]
    pub px_per_mm: f64,
    #[serde(default = "default_break_class")]
    pub break_class: String,
}

impl Default for PageBreakRules {
    fn default() -> Self {
        Self {
            section_selector: default_section_selector(),
            signature_selector: default_signature_selector(),
            break_after_sections: default_break_after(),
            trailing_band_px: default_trailing_band(),
            px_per_mm: default_px_per_mm(),
            break_class: default_break_class(),
        }
    }
}

/// Configuration of a single export call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportConfig {
    #[serde(default = "default_root_element_id")]
    pub root_element_id: String,
    /// Element whose text names the downloaded file
    #[serde(default = "default_identifier_element_id")]
    pub identifier_element_id: String,
    #[serde(default = "default_fallback_file_stem")]
    pub fallback_file_stem: String,
    #[serde(default = "default_overlay_id")]
    pub overlay_id: String,
    #[serde(default = "default_print_style_id")]
    pub print_style_id: String,
    #[serde(default = "default_busy_message")]
    pub busy_message: String,
    #[serde(default = "default_failure_message")]
    pub failure_message: String,
    #[serde(default)]
    pub capture: CaptureOptions,
    #[serde(default)]
    pub page_breaks: PageBreakRules,
    #[serde(default)]
    pub page_format: PageFormat,
    /// JPEG quality, 1-100
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            root_element_id: default_root_element_id(),
            identifier_element_id: default_identifier_element_id(),
            fallback_file_stem: default_fallback_file_stem(),
            overlay_id: default_overlay_id(),
            print_style_id: default_print_style_id(),
            busy_message: default_busy_message(),
            failure_message: default_failure_message(),
            capture: CaptureOptions::default(),
            page_breaks: PageBreakRules::default(),
            page_format: PageFormat::A4,
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

impl ExportConfig {
    /// Parse a (possibly partial) JSON configuration
    pub fn from_json(s: &str) -> Result<Self, ExportError> {
        let config: Self =
            serde_json::from_str(s).map_err(|e| ExportError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> Result<(), ExportError> {
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ExportError::Config(format!(
                "jpegQuality must be within 1-100, got {}",
                self.jpeg_quality
            )));
        }
        if self.page_format.width_mm <= 0.0 || self.page_format.height_mm <= 0.0 {
            return Err(ExportError::Config("page dimensions must be positive".into()));
        }
        if self.capture.scale <= 0.0 {
            return Err(ExportError::Config("capture scale must be positive".into()));
        }
        if self.overlay_id == self.print_style_id {
            return Err(ExportError::Config(
                "overlayId and printStyleId must differ".into(),
            ));
        }
        Ok(())
    }
}

/// Where signatures are read from and written to on the contract page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureConfig {
    #[serde(default = "default_interpreter_container_id")]
    pub interpreter_container_id: String,
    /// Element carrying the `data-signature-*` attributes
    #[serde(default = "default_signature_data_selector")]
    pub signature_data_selector: String,
    #[serde(default = "default_company_container_id")]
    pub company_container_id: String,
    #[serde(default = "default_font_class")]
    pub default_font_class: String,
    #[serde(default = "default_representative")]
    pub default_representative: String,
    #[serde(default = "default_company_font_family")]
    pub company_font_family: String,
}

impl Default for SignatureConfig {
    fn default() -> Self {
        Self {
            interpreter_container_id: default_interpreter_container_id(),
            signature_data_selector: default_signature_data_selector(),
            company_container_id: default_company_container_id(),
            default_font_class: default_font_class(),
            default_representative: default_representative(),
            company_font_family: default_company_font_family(),
        }
    }
}

impl SignatureConfig {
    pub fn from_json(s: &str) -> Result<Self, ExportError> {
        serde_json::from_str(s).map_err(|e| ExportError::Config(e.to_string()))
    }
}

fn default_page_width() -> f64 {
    PageFormat::A4.width_mm
}

fn default_page_height() -> f64 {
    PageFormat::A4.height_mm
}

fn default_true() -> bool {
    true
}

fn default_scale() -> f64 {
    2.0
}

fn default_background() -> String {
    "#FFFFFF".to_string()
}

fn default_section_selector() -> String {
    ".section".to_string()
}

fn default_signature_selector() -> String {
    ".signature-area".to_string()
}

fn default_break_after() -> Vec<usize> {
    vec![3, 6, 9]
}

fn default_trailing_band() -> f64 {
    150.0
}

fn default_px_per_mm() -> f64 {
    3.78
}

fn default_break_class() -> String {
    "page-break".to_string()
}

fn default_root_element_id() -> String {
    "contract-document".to_string()
}

fn default_identifier_element_id() -> String {
    "agreement-number".to_string()
}

fn default_fallback_file_stem() -> String {
    "contract".to_string()
}

fn default_overlay_id() -> String {
    "pdf-loading".to_string()
}

fn default_print_style_id() -> String {
    "temp-print-style".to_string()
}

fn default_busy_message() -> String {
    "Generating PDF...".to_string()
}

fn default_failure_message() -> String {
    "An error occurred while generating the PDF.".to_string()
}

fn default_jpeg_quality() -> u8 {
    100
}

fn default_interpreter_container_id() -> String {
    "interpreter-signature".to_string()
}

fn default_signature_data_selector() -> String {
    ".signature-data".to_string()
}

fn default_company_container_id() -> String {
    "company-signature".to_string()
}

fn default_font_class() -> String {
    "font-script".to_string()
}

fn default_representative() -> String {
    "Marc-Henry Valme".to_string()
}

fn default_company_font_family() -> String {
    "Helvetica, Arial, sans-serif".to_string()
}
