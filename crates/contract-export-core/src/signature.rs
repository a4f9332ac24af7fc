//! Signature block markup
//!
//! A signature is described declaratively by `data-signature-*` attributes and
//! rendered into HTML. The `signatureType` discriminator picks the variant; it
//! is never inferred from which other attributes happen to be present.

use crate::config::SignatureConfig;
use crate::error::PresentationError;
use crate::strokes::StrokeSet;
use serde::{Deserialize, Serialize};

pub const TYPED_CLASS: &str = "typography-signature";
pub const DRAWN_CLASS: &str = "drawn-signature";
pub const UPLOADED_CLASS: &str = "uploaded-signature";
pub const PLACEHOLDER_CLASS: &str = "signature-placeholder";
pub const ERROR_CLASS: &str = "signature-error";

/// Raw declarative attributes as found on the signature data element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureAttributes {
    pub signature_type: Option<String>,
    pub signature_text: Option<String>,
    pub signature_font: Option<String>,
    pub signature_drawn_data: Option<String>,
    pub signature_image_url: Option<String>,
}

/// Which kind of signature the signer provided
#[derive(Debug, Clone, PartialEq)]
pub enum SignatureDescriptor {
    /// Typed name shown in a script-style font class
    Typed { text: String, font: Option<String> },
    /// Freehand strokes; `None` when no drawing data was supplied
    Drawn(Option<StrokeSet>),
    /// Uploaded image; `None` when no URL was supplied
    Uploaded(Option<String>),
    /// Missing or unrecognised discriminator
    Unknown,
}

impl SignatureDescriptor {
    /// Build a descriptor from the declarative attributes.
    ///
    /// Fails only when drawn data is present but cannot be parsed.
    pub fn from_attributes(attrs: &SignatureAttributes) -> Result<Self, PresentationError> {
        let descriptor = match attrs.signature_type.as_deref() {
            Some("type") => SignatureDescriptor::Typed {
                text: attrs.signature_text.clone().unwrap_or_default(),
                font: attrs.signature_font.clone().filter(|f| !f.is_empty()),
            },
            Some("draw") => match attrs.signature_drawn_data.as_deref() {
                Some(data) if !data.is_empty() => {
                    SignatureDescriptor::Drawn(Some(StrokeSet::from_json(data)?))
                }
                _ => SignatureDescriptor::Drawn(None),
            },
            Some("upload") => SignatureDescriptor::Uploaded(
                attrs.signature_image_url.clone().filter(|u| !u.is_empty()),
            ),
            _ => SignatureDescriptor::Unknown,
        };
        Ok(descriptor)
    }

    /// Markup for this signature, or `None` when the container should be left untouched
    pub fn render(&self, config: &SignatureConfig) -> Option<String> {
        match self {
            SignatureDescriptor::Typed { text, font } => {
                let font = font.as_deref().unwrap_or(&config.default_font_class);
                Some(format!(
                    r#"<div class="{} {}">{}</div>"#,
                    TYPED_CLASS,
                    escape_html(font),
                    escape_html(text)
                ))
            }
            SignatureDescriptor::Drawn(Some(strokes)) => Some(format!(
                r#"<div class="{}">{}</div>"#,
                DRAWN_CLASS,
                strokes.to_svg()
            )),
            SignatureDescriptor::Drawn(None) => None,
            SignatureDescriptor::Uploaded(Some(url)) => Some(format!(
                r#"<div class="{}"><img src="{}" alt="Signature" /></div>"#,
                UPLOADED_CLASS,
                escape_html(url)
            )),
            SignatureDescriptor::Uploaded(None) => None,
            SignatureDescriptor::Unknown => Some(placeholder_markup()),
        }
    }
}

/// Render the signer's signature from its attributes.
///
/// Malformed drawing data is logged and replaced with an "unavailable" notice;
/// no error reaches the caller.
pub fn render_signature(attrs: &SignatureAttributes, config: &SignatureConfig) -> Option<String> {
    match SignatureDescriptor::from_attributes(attrs) {
        Ok(descriptor) => descriptor.render(config),
        Err(err) => {
            tracing::error!(error = %err, "drawn signature could not be parsed");
            Some(error_markup())
        }
    }
}

pub fn placeholder_markup() -> String {
    format!(r#"<div class="{}">Signature</div>"#, PLACEHOLDER_CLASS)
}

pub fn error_markup() -> String {
    format!(r#"<div class="{}">Signature unavailable</div>"#, ERROR_CLASS)
}

/// Static display of the company representative's name
#[derive(Debug, Clone, PartialEq)]
pub struct CompanySignature {
    pub name: String,
    pub font_family: String,
}

impl CompanySignature {
    /// Empty or missing names fall back to the configured representative
    pub fn new(representative: Option<&str>, config: &SignatureConfig) -> Self {
        let name = representative
            .filter(|name| !name.is_empty())
            .unwrap_or(&config.default_representative);
        Self {
            name: name.to_string(),
            font_family: config.company_font_family.clone(),
        }
    }
}

/// Escape text for use in HTML content and double-quoted attributes
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
