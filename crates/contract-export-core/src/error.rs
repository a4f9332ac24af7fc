use thiserror::Error;

/// Failures of the export pipeline.
///
/// Every variant is caught by [`crate::export::export`], logged and turned into
/// a single generic notice for the user.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("An export is already in progress (element #{0} exists)")]
    AlreadyInProgress(String),

    #[error("Asset readiness failed: {0}")]
    Readiness(String),

    #[error("Rasterization failed: {0}")]
    Rasterize(String),

    #[error("Raster snapshot is empty ({width}x{height})")]
    EmptyRaster { width: u32, height: u32 },

    #[error("Image encoding failed: {0}")]
    Encode(String),

    #[error("PDF assembly failed: {0}")]
    Assemble(String),

    #[error("Host operation failed: {0}")]
    Host(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Recoverable presentation problems. These never leave the renderer; they are
/// logged and replaced by placeholder markup.
#[derive(Error, Debug)]
pub enum PresentationError {
    #[error("Malformed drawn signature data: {0}")]
    MalformedStrokes(#[from] serde_json::Error),
}
