//! Contract signature rendering and paginated PDF export
//!
//! This crate holds everything that does not need a browser:
//! - `signature` / `strokes`: signature descriptors rendered to HTML and SVG
//! - `pagination` / `assembler`: slicing a tall raster into A4 pages with lopdf
//! - `page_breaks`: content-blind break hints for the rasterizer's document clone
//! - `export`: the export pipeline, generic over an [`ExportHost`]
//!
//! The browser host lives in the contract-web wasm crate.

pub mod assembler;
pub mod config;
pub mod error;
pub mod export;
pub mod page_breaks;
pub mod pagination;
pub mod raster;
pub mod signature;
pub mod strokes;
pub mod styles;

pub use assembler::{render_pdf, ImageHandle, PdfAssembler, RenderedPdf};
pub use config::{CaptureOptions, ExportConfig, PageBreakRules, PageFormat, SignatureConfig};
pub use error::{ExportError, PresentationError};
pub use export::{
    export, output_filename, settle_images, CaptureRequest, ExportHost, ExportReport, ImageLoad,
    ImageReadiness, ScopedElement,
};
pub use page_breaks::{prepare_clone, signature_needs_break, BreakReport, ClonedDocument};
pub use pagination::{paginate, PageSlice};
pub use raster::{encode_jpeg, EncodedImage, RasterSnapshot};
pub use signature::{render_signature, CompanySignature, SignatureAttributes, SignatureDescriptor};
pub use strokes::{BoundingBox, Point, Stroke, StrokeSet};
