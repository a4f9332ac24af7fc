//! WASM bindings for the contract page
//!
//! Renders the signature block and exports the rendered contract as a
//! paginated A4 PDF. Pagination, PDF assembly and signature markup live in
//! `contract-export-core`; this crate supplies the browser host.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { install, exportContract } from './pkg/contract_web_wasm.js';
//!
//! await init();
//!
//! // Render signatures and wire #generate-pdf-button
//! install();
//!
//! // Or drive the export yourself, with optional overrides
//! const ok = await exportContract({ rootElementId: "contract-document" });
//! ```
//!
//! html2canvas must be available as a global before an export starts.

pub mod download;
pub mod host;
pub mod rasterizer;
pub mod readiness;
pub mod signatures;

use contract_export_core::{ExportConfig, SignatureConfig};
use serde::de::DeserializeOwned;
use wasm_bindgen::prelude::*;

pub use host::BrowserHost;

const EXPORT_BUTTON_ID: &str = "generate-pdf-button";

/// Initialize the WASM module
/// Called automatically by wasm-bindgen
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Get the library version
#[wasm_bindgen(js_name = getVersion)]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Read an optional configuration object; `undefined`/`null` mean defaults
fn config_from_js<T: DeserializeOwned + Default>(value: JsValue) -> Result<T, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(T::default());
    }
    serde_wasm_bindgen::from_value(value)
        .map_err(|e| JsValue::from_str(&format!("Invalid configuration: {}", e)))
}

/// Render the interpreter and company signatures into their containers
#[wasm_bindgen(js_name = renderSignatures)]
pub fn render_signatures(config: JsValue) -> Result<(), JsValue> {
    let config: SignatureConfig = config_from_js(config)?;
    let host = BrowserHost::new()?;
    signatures::render_interpreter_signature(host.document(), &config);
    signatures::render_company_signature(host.document(), &config);
    Ok(())
}

/// Export the contract as a PDF download.
///
/// Resolves to `true` when the file was handed to the browser. Failures have
/// already been shown to the user and resolve to `false`.
#[wasm_bindgen(js_name = exportContract)]
pub async fn export_contract(config: JsValue) -> Result<bool, JsValue> {
    let config: ExportConfig = config_from_js(config)?;
    run_export(&config).await
}

async fn run_export(config: &ExportConfig) -> Result<bool, JsValue> {
    let host = BrowserHost::new()?;
    match contract_export_core::export(&host, config).await {
        Ok(report) => {
            web_sys::console::log_1(
                &format!(
                    "Exported {} ({} pages, {} bytes)",
                    report.filename, report.page_count, report.byte_len
                )
                .into(),
            );
            Ok(true)
        }
        Err(err) => {
            web_sys::console::error_1(&format!("PDF generation failed: {}", err).into());
            Ok(false)
        }
    }
}

/// Render signatures now and wire the export button.
///
/// `export_config` and `signature_config` are optional override objects.
#[wasm_bindgen]
pub fn install(export_config: JsValue, signature_config: JsValue) -> Result<(), JsValue> {
    render_signatures(signature_config)?;

    // Validate once up front so a bad config fails here rather than on click
    let export_config: ExportConfig = config_from_js(export_config)?;
    export_config
        .validate()
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

    let host = BrowserHost::new()?;
    let Some(button) = host.document().get_element_by_id(EXPORT_BUTTON_ID) else {
        return Ok(());
    };

    let on_click = Closure::<dyn FnMut()>::new(move || {
        let config = export_config.clone();
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(e) = run_export(&config).await {
                web_sys::console::error_1(&e);
            }
        });
    });
    button.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
    // The button lives as long as the page
    on_click.forget();
    Ok(())
}
