//! Export orchestration
//!
//! [`export`] drives the whole pipeline against an [`ExportHost`]: busy
//! overlay, asset readiness, print stylesheet, rasterization, pagination, PDF
//! assembly and delivery. The host owns everything environment specific (DOM,
//! rasterizer, downloads), which keeps this module free of browser types.

use crate::assembler::render_pdf;
use crate::config::{CaptureOptions, ExportConfig, PageBreakRules, PageFormat};
use crate::error::ExportError;
use crate::raster::RasterSnapshot;
use crate::styles::PRINT_STYLESHEET;
use futures::future::join_all;
use std::future::Future;
use tracing::{debug, error, info, instrument, warn};

/// Terminal state of one image element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageLoad {
    Loaded,
    Failed,
}

/// How the images under the captured element settled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImageReadiness {
    pub loaded: usize,
    pub failed: usize,
}

impl ImageReadiness {
    pub fn total(&self) -> usize {
        self.loaded + self.failed
    }
}

/// Wait until every image future has reached a terminal state.
///
/// Failed images count as settled so a broken image cannot block an export.
pub async fn settle_images<I, F>(images: I) -> ImageReadiness
where
    I: IntoIterator<Item = F>,
    F: Future<Output = ImageLoad>,
{
    let outcomes = join_all(images).await;
    let mut readiness = ImageReadiness::default();
    for outcome in outcomes {
        match outcome {
            ImageLoad::Loaded => readiness.loaded += 1,
            ImageLoad::Failed => readiness.failed += 1,
        }
    }
    readiness
}

/// Everything the rasterizer needs for one capture
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureRequest<'a> {
    pub root_element_id: &'a str,
    pub options: &'a CaptureOptions,
    /// Applied to the rasterizer's document clone before capture
    pub page_breaks: &'a PageBreakRules,
    pub page_format: &'a PageFormat,
}

/// The environment an export runs in.
///
/// Element insertion and removal are keyed by id; [`export`] wraps them in
/// scoped guards so they are undone on every exit path.
#[allow(async_fn_in_trait)]
pub trait ExportHost {
    fn contains_element(&self, id: &str) -> bool;

    /// Insert the full-screen busy overlay with the given element id
    fn show_busy_overlay(&self, id: &str, message: &str) -> Result<(), ExportError>;

    /// Insert a document-level stylesheet with the given element id
    fn inject_stylesheet(&self, id: &str, css: &str) -> Result<(), ExportError>;

    /// Remove an element by id; missing elements are ignored
    fn remove_element(&self, id: &str);

    async fn fonts_ready(&self) -> Result<(), ExportError>;

    /// Resolve once every image under the root element is loaded or failed
    async fn images_settled(&self, root_element_id: &str) -> Result<ImageReadiness, ExportError>;

    async fn rasterize(&self, request: CaptureRequest<'_>) -> Result<RasterSnapshot, ExportError>;

    /// Visible text of an element, if present
    fn element_text(&self, id: &str) -> Option<String>;

    /// Hand the finished file to the user
    fn deliver(&self, filename: &str, bytes: Vec<u8>) -> Result<(), ExportError>;

    /// Show a user-facing failure notice
    fn notify_failure(&self, message: &str);
}

/// An element inserted for the duration of a scope.
///
/// Acquiring fails if an element with the same id is already present, which
/// is how overlapping exports are detected.
pub struct ScopedElement<'h, H: ExportHost + ?Sized> {
    host: &'h H,
    id: String,
}

impl<'h, H: ExportHost + ?Sized> ScopedElement<'h, H> {
    pub fn acquire(
        host: &'h H,
        id: &str,
        insert: impl FnOnce(&H) -> Result<(), ExportError>,
    ) -> Result<Self, ExportError> {
        if host.contains_element(id) {
            return Err(ExportError::AlreadyInProgress(id.to_string()));
        }
        // Guard first, so a partially inserted element is still cleaned up
        let guard = Self {
            host,
            id: id.to_string(),
        };
        insert(host)?;
        Ok(guard)
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl<H: ExportHost + ?Sized> Drop for ScopedElement<'_, H> {
    fn drop(&mut self) {
        self.host.remove_element(&self.id);
    }
}

/// Result of a delivered export
#[derive(Debug, Clone, PartialEq)]
pub struct ExportReport {
    pub filename: String,
    pub page_count: usize,
    pub byte_len: usize,
    pub images: ImageReadiness,
}

/// Output filename from the visible contract identifier
pub fn output_filename(identifier: Option<&str>, fallback_stem: &str) -> String {
    let stem = identifier
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(fallback_stem);
    format!("{}.pdf", stem)
}

/// Export the contract element as a paginated PDF.
///
/// On failure the error is logged, the overlay and stylesheet are already
/// gone and the user has been shown `config.failure_message`; the error is
/// returned for callers that want to inspect it. Re-invoking after a failure
/// is safe.
#[instrument(skip_all, fields(root = %config.root_element_id))]
pub async fn export<H: ExportHost + ?Sized>(
    host: &H,
    config: &ExportConfig,
) -> Result<ExportReport, ExportError> {
    match run_export(host, config).await {
        Ok(report) => {
            info!(
                filename = %report.filename,
                pages = report.page_count,
                bytes = report.byte_len,
                "contract exported"
            );
            Ok(report)
        }
        Err(err) => {
            if matches!(err, ExportError::AlreadyInProgress(_)) {
                warn!(error = %err, "export requested while another is running");
            } else {
                error!(error = %err, "contract export failed");
            }
            host.notify_failure(&config.failure_message);
            Err(err)
        }
    }
}

async fn run_export<H: ExportHost + ?Sized>(
    host: &H,
    config: &ExportConfig,
) -> Result<ExportReport, ExportError> {
    config.validate()?;

    let _busy = ScopedElement::acquire(host, &config.overlay_id, |h| {
        h.show_busy_overlay(&config.overlay_id, &config.busy_message)
    })?;

    host.fonts_ready().await?;
    let images = host.images_settled(&config.root_element_id).await?;
    debug!(
        loaded = images.loaded,
        failed = images.failed,
        "assets settled"
    );

    let snapshot = {
        let _print_style = ScopedElement::acquire(host, &config.print_style_id, |h| {
            h.inject_stylesheet(&config.print_style_id, PRINT_STYLESHEET)
        })?;
        host.rasterize(CaptureRequest {
            root_element_id: &config.root_element_id,
            options: &config.capture,
            page_breaks: &config.page_breaks,
            page_format: &config.page_format,
        })
        .await?
    };
    debug!(
        width = snapshot.width(),
        height = snapshot.height(),
        "raster captured"
    );

    let pdf = render_pdf(&snapshot, &config.page_format, config.jpeg_quality)?;
    drop(snapshot);

    let identifier = host.element_text(&config.identifier_element_id);
    let filename = output_filename(identifier.as_deref(), &config.fallback_file_stem);
    let byte_len = pdf.bytes.len();
    host.deliver(&filename, pdf.bytes)?;

    Ok(ExportReport {
        filename,
        page_count: pdf.page_count,
        byte_len,
        images,
    })
}
