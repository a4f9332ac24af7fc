//! Font and image readiness in the browser

use contract_export_core::{settle_images, ExportError, ImageLoad, ImageReadiness};
use js_sys::{Function, Promise};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{AddEventListenerOptions, Document, Event, HtmlImageElement};

const SETTLE_EVENTS: [&str; 2] = ["load", "error"];

/// Resolve once `document.fonts.ready` settles
pub async fn fonts_ready(document: &Document) -> Result<(), ExportError> {
    let ready = document
        .fonts()
        .ready()
        .map_err(|e| ExportError::Readiness(format!("document.fonts.ready: {:?}", e)))?;
    JsFuture::from(ready)
        .await
        .map_err(|e| ExportError::Readiness(format!("font loading failed: {:?}", e)))?;
    Ok(())
}

/// Wait for every `<img>` under the root element to load or fail
pub async fn images_settled(
    document: &Document,
    root_element_id: &str,
) -> Result<ImageReadiness, ExportError> {
    let selector = format!("#{} img", root_element_id);
    let nodes = document
        .query_selector_all(&selector)
        .map_err(|e| ExportError::Readiness(format!("query {}: {:?}", selector, e)))?;

    let mut pending = Vec::with_capacity(nodes.length() as usize);
    for i in 0..nodes.length() {
        if let Some(img) = nodes
            .item(i)
            .and_then(|node| node.dyn_into::<HtmlImageElement>().ok())
        {
            pending.push(image_settled(img));
        }
    }
    Ok(settle_images(pending).await)
}

/// Terminal state of one image.
///
/// Already complete images resolve immediately; a complete image with no
/// natural width failed to decode.
async fn image_settled(img: HtmlImageElement) -> ImageLoad {
    if img.complete() {
        return if img.natural_width() > 0 {
            ImageLoad::Loaded
        } else {
            ImageLoad::Failed
        };
    }

    // `resolve` listens for both events; the first one wins
    let mut listener: Option<Function> = None;
    let promise = Promise::new(&mut |resolve, reject| {
        if let Err(e) = listen_once(&img, &resolve) {
            let _ = reject.call1(&JsValue::UNDEFINED, &e);
        }
        listener = Some(resolve);
    });

    let outcome = match JsFuture::from(promise).await {
        Ok(value) => match value.dyn_into::<Event>() {
            Ok(event) if event.type_() == "load" => ImageLoad::Loaded,
            _ => ImageLoad::Failed,
        },
        Err(_) => ImageLoad::Failed,
    };

    // `once` only drops the listener that fired
    if let Some(listener) = listener {
        for event in SETTLE_EVENTS {
            let _ = img.remove_event_listener_with_callback(event, &listener);
        }
    }
    outcome
}

fn listen_once(img: &HtmlImageElement, callback: &Function) -> Result<(), JsValue> {
    let options = AddEventListenerOptions::new();
    options.set_once(true);
    for event in SETTLE_EVENTS {
        img.add_event_listener_with_callback_and_add_event_listener_options(
            event, callback, &options,
        )?;
    }
    Ok(())
}
