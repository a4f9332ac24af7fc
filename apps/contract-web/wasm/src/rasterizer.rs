//! Rasterization through html2canvas
//!
//! html2canvas must be loaded globally. Page break hints are applied in its
//! `onclone` hook so the live document is never modified.

use contract_export_core::{
    prepare_clone, CaptureRequest, ClonedDocument, ExportError, PageBreakRules, PageFormat,
    RasterSnapshot,
};
use js_sys::{Object, Promise, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{CanvasRenderingContext2d, Document, Element, HtmlCanvasElement};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(catch, js_name = html2canvas)]
    fn html2canvas(element: &Element, options: &JsValue) -> Result<Promise, JsValue>;
}

/// The document clone handed to `onclone`
pub struct DomClone {
    document: Document,
    rules: PageBreakRules,
}

impl DomClone {
    pub fn new(document: Document, rules: PageBreakRules) -> Self {
        Self { document, rules }
    }

    fn break_element(&self) -> Result<Element, String> {
        let div = self
            .document
            .create_element("div")
            .map_err(|e| format!("create break: {:?}", e))?;
        div.set_class_name(&self.rules.break_class);
        Ok(div)
    }

    fn section(&self, index: usize) -> Option<Element> {
        let sections = self
            .document
            .query_selector_all(&self.rules.section_selector)
            .ok()?;
        sections
            .item(index as u32)
            .and_then(|node| node.dyn_into::<Element>().ok())
    }

    fn signature_area(&self) -> Option<Element> {
        self.document
            .query_selector(&self.rules.signature_selector)
            .ok()
            .flatten()
    }
}

impl ClonedDocument for DomClone {
    fn section_count(&self) -> usize {
        self.document
            .query_selector_all(&self.rules.section_selector)
            .map(|list| list.length() as usize)
            .unwrap_or(0)
    }

    fn insert_break_after_section(&mut self, index: usize) -> Result<(), String> {
        let section = self
            .section(index)
            .ok_or_else(|| format!("section {} not found", index))?;
        let div = self.break_element()?;
        section
            .after_with_node_1(&div)
            .map_err(|e| format!("insert break after section {}: {:?}", index, e))
    }

    fn signature_top(&self) -> Option<f64> {
        self.signature_area()
            .map(|area| area.get_bounding_client_rect().top())
    }

    fn insert_break_before_signature(&mut self) -> Result<(), String> {
        let area = self
            .signature_area()
            .ok_or_else(|| "signature area not found".to_string())?;
        let div = self.break_element()?;
        area.before_with_node_1(&div)
            .map_err(|e| format!("insert break before signature: {:?}", e))
    }
}

fn set(target: &Object, key: &str, value: &JsValue) -> Result<(), ExportError> {
    Reflect::set(target, &JsValue::from_str(key), value)
        .map(|_| ())
        .map_err(|e| ExportError::Rasterize(format!("set option {}: {:?}", key, e)))
}

/// Capture the root element into a raster snapshot
pub async fn capture(
    document: &Document,
    request: CaptureRequest<'_>,
) -> Result<RasterSnapshot, ExportError> {
    let element = document
        .get_element_by_id(request.root_element_id)
        .ok_or_else(|| {
            ExportError::Rasterize(format!("#{} not found", request.root_element_id))
        })?;

    let rules = request.page_breaks.clone();
    let format: PageFormat = *request.page_format;
    let on_clone = Closure::<dyn FnMut(Document) -> Document>::new(move |cloned: Document| {
        let mut clone = DomClone::new(cloned.clone(), rules.clone());
        if let Err(e) = prepare_clone(&mut clone, &rules, &format) {
            web_sys::console::warn_1(&format!("Page break hints skipped: {}", e).into());
        }
        cloned
    });

    let options = Object::new();
    let capture = request.options;
    set(&options, "scale", &JsValue::from_f64(capture.scale))?;
    set(&options, "useCORS", &JsValue::from_bool(capture.use_cors))?;
    set(&options, "allowTaint", &JsValue::from_bool(capture.allow_taint))?;
    set(
        &options,
        "backgroundColor",
        &JsValue::from_str(&capture.background_color),
    )?;
    set(&options, "logging", &JsValue::from_bool(capture.logging))?;
    set(&options, "removeContainer", &JsValue::FALSE)?;
    set(
        &options,
        "imageTimeout",
        &JsValue::from_f64(capture.image_timeout_ms as f64),
    )?;
    set(&options, "onclone", on_clone.as_ref())?;

    let promise = html2canvas(&element, &options)
        .map_err(|e| ExportError::Rasterize(format!("html2canvas unavailable: {:?}", e)))?;
    keep_alive_until_settled(&promise, on_clone);
    let canvas = JsFuture::from(promise)
        .await
        .map_err(|e| ExportError::Rasterize(format!("html2canvas failed: {:?}", e)))?;

    let canvas: HtmlCanvasElement = canvas
        .dyn_into()
        .map_err(|_| ExportError::Rasterize("html2canvas did not return a canvas".into()))?;
    canvas_snapshot(&canvas)
}

/// Hold `hook` until `promise` settles.
///
/// html2canvas may still call `onclone` after the capture future is dropped,
/// so the closure must not live on that future.
fn keep_alive_until_settled<T: ?Sized + 'static>(promise: &Promise, hook: Closure<T>) {
    let settled = JsFuture::from(promise.clone());
    wasm_bindgen_futures::spawn_local(async move {
        let _ = settled.await;
        drop(hook);
    });
}

/// Read back the pixels of a canvas
pub fn canvas_snapshot(canvas: &HtmlCanvasElement) -> Result<RasterSnapshot, ExportError> {
    let (width, height) = (canvas.width(), canvas.height());
    if width == 0 || height == 0 {
        return Err(ExportError::EmptyRaster { width, height });
    }
    let context: CanvasRenderingContext2d = canvas
        .get_context("2d")
        .map_err(|e| ExportError::Rasterize(format!("getContext: {:?}", e)))?
        .ok_or_else(|| ExportError::Rasterize("canvas has no 2d context".into()))?
        .dyn_into()
        .map_err(|_| ExportError::Rasterize("unexpected canvas context".into()))?;
    let image_data = context
        .get_image_data(0.0, 0.0, width as f64, height as f64)
        .map_err(|e| ExportError::Rasterize(format!("getImageData: {:?}", e)))?;
    RasterSnapshot::from_rgba(width, height, image_data.data().0)
}
