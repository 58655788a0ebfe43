use std::path::PathBuf;

/// Everything that can go wrong between picking a file and saving the crop.
///
/// Errors stay local to the action that raised them; the state container is
/// never left half-updated.
#[derive(Debug, thiserror::Error)]
pub enum CropError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid data URL: {0}")]
    InvalidDataUrl(String),

    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("no output surface has been rendered")]
    SurfaceUnavailable,

    #[error("nothing to export until a crop has been committed")]
    ExportUnavailable,

    #[error("failed to encode PNG: {0}")]
    Encode(#[source] image::ImageError),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("background task failed: {0}")]
    TaskJoin(String),
}
