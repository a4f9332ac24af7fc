//! Writing signature markup into the contract page

use contract_export_core::signature::error_markup;
use contract_export_core::{
    CompanySignature, SignatureAttributes, SignatureConfig, SignatureDescriptor,
};
use wasm_bindgen::prelude::*;
use web_sys::{Document, HtmlElement};

/// Read the `data-signature-*` attributes of an element
pub fn read_attributes(element: &HtmlElement) -> SignatureAttributes {
    let data = element.dataset();
    SignatureAttributes {
        signature_type: data.get("signatureType"),
        signature_text: data.get("signatureText"),
        signature_font: data.get("signatureFont"),
        signature_drawn_data: data.get("signatureDrawnData"),
        signature_image_url: data.get("signatureImageUrl"),
    }
}

/// Render the signer's signature into its container.
///
/// Does nothing when either the container or the data element is missing.
pub fn render_interpreter_signature(document: &Document, config: &SignatureConfig) {
    let Some(container) = document.get_element_by_id(&config.interpreter_container_id) else {
        return;
    };
    let data = document
        .query_selector(&config.signature_data_selector)
        .ok()
        .flatten()
        .and_then(|el| el.dyn_into::<HtmlElement>().ok());
    let Some(data) = data else {
        return;
    };

    if let Some(markup) = signature_markup(&read_attributes(&data), config) {
        container.set_inner_html(&markup);
    }
}

/// Markup for the signer's signature; malformed drawing data is reported on
/// the console and shown as "unavailable"
pub fn signature_markup(attrs: &SignatureAttributes, config: &SignatureConfig) -> Option<String> {
    match SignatureDescriptor::from_attributes(attrs) {
        Ok(descriptor) => descriptor.render(config),
        Err(e) => {
            web_sys::console::error_1(&format!("Error rendering drawn signature: {}", e).into());
            Some(error_markup())
        }
    }
}

/// Show the company representative's name in the company signature slot
pub fn render_company_signature(document: &Document, config: &SignatureConfig) {
    let Some(container) = document
        .get_element_by_id(&config.company_container_id)
        .and_then(|el| el.dyn_into::<HtmlElement>().ok())
    else {
        return;
    };

    let representative = container.dataset().get("companyRepresentative");
    let signature = CompanySignature::new(representative.as_deref(), config);
    container.set_text_content(Some(&signature.name));
    if let Err(e) = container
        .style()
        .set_property("font-family", &signature.font_family)
    {
        web_sys::console::warn_1(&format!("Could not set company font: {:?}", e).into());
    }
}
