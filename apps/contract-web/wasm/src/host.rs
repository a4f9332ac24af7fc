//! The browser side of an export
//!
//! `BrowserHost` implements [`ExportHost`] on top of web-sys. Element
//! lifetimes are managed by the core crate's scoped guards; this type only
//! knows how to insert and remove them.

use crate::{download, rasterizer, readiness};
use contract_export_core::styles::{overlay_markup, OVERLAY_STYLE};
use contract_export_core::{CaptureRequest, ExportError, ExportHost, ImageReadiness, RasterSnapshot};
use wasm_bindgen::prelude::*;
use web_sys::{Document, Window};

pub struct BrowserHost {
    window: Window,
    document: Document,
}

impl BrowserHost {
    /// # Errors
    /// Returns JsValue error if unable to access window or document
    pub fn new() -> Result<Self, JsValue> {
        let window =
            web_sys::window().ok_or_else(|| JsValue::from_str("No window object available"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("No document object available"))?;
        Ok(Self { window, document })
    }

    pub fn document(&self) -> &Document {
        &self.document
    }
}

fn host_error(context: &str, err: JsValue) -> ExportError {
    ExportError::Host(format!("{}: {:?}", context, err))
}

impl ExportHost for BrowserHost {
    fn contains_element(&self, id: &str) -> bool {
        self.document.get_element_by_id(id).is_some()
    }

    fn show_busy_overlay(&self, id: &str, message: &str) -> Result<(), ExportError> {
        let body = self
            .document
            .body()
            .ok_or_else(|| ExportError::Host("document has no body".into()))?;
        let overlay = self
            .document
            .create_element("div")
            .map_err(|e| host_error("create overlay", e))?;
        overlay.set_id(id);
        overlay
            .set_attribute("style", OVERLAY_STYLE)
            .map_err(|e| host_error("style overlay", e))?;
        overlay.set_inner_html(&overlay_markup(message));
        body.append_child(&overlay)
            .map_err(|e| host_error("append overlay", e))?;
        Ok(())
    }

    fn inject_stylesheet(&self, id: &str, css: &str) -> Result<(), ExportError> {
        let head = self
            .document
            .head()
            .ok_or_else(|| ExportError::Host("document has no head".into()))?;
        let style = self
            .document
            .create_element("style")
            .map_err(|e| host_error("create stylesheet", e))?;
        style.set_id(id);
        style.set_text_content(Some(css));
        head.append_child(&style)
            .map_err(|e| host_error("append stylesheet", e))?;
        Ok(())
    }

    fn remove_element(&self, id: &str) {
        if let Some(element) = self.document.get_element_by_id(id) {
            element.remove();
        }
    }

    async fn fonts_ready(&self) -> Result<(), ExportError> {
        readiness::fonts_ready(&self.document).await
    }

    async fn images_settled(&self, root_element_id: &str) -> Result<ImageReadiness, ExportError> {
        readiness::images_settled(&self.document, root_element_id).await
    }

    async fn rasterize(&self, request: CaptureRequest<'_>) -> Result<RasterSnapshot, ExportError> {
        rasterizer::capture(&self.document, request).await
    }

    fn element_text(&self, id: &str) -> Option<String> {
        self.document
            .get_element_by_id(id)
            .and_then(|element| element.text_content())
    }

    fn deliver(&self, filename: &str, bytes: Vec<u8>) -> Result<(), ExportError> {
        download::trigger_download(&self.document, filename, &bytes, "application/pdf")
            .map_err(|e| host_error("download", e))
    }

    fn notify_failure(&self, message: &str) {
        if self.window.alert_with_message(message).is_err() {
            web_sys::console::error_1(&JsValue::from_str(message));
        }
    }
}
