use std::path::PathBuf;

use thiserror::Error;

/// Failures while placing the camera around a target.
#[derive(Debug, Error, PartialEq)]
pub enum FramingError {
    #[error("no camera available for framing")]
    CameraNotFound,

    #[error("target not found: {0}")]
    TargetNotFound(String),

    #[error("target {0} has no visible geometry")]
    EmptyGeometry(String),

    #[error("non-finite value in {0}")]
    NonFinite(&'static str),
}

/// Failures while compositing a drop shadow.
#[derive(Debug, Error, PartialEq)]
pub enum CompositingError {
    #[error("bitmap has zero area ({width}x{height})")]
    EmptyBitmap { width: u32, height: u32 },

    #[error("pixel buffer holds {actual} channels, expected {expected}")]
    BufferMismatch { expected: usize, actual: usize },

    #[error("invalid shadow scale: {0}")]
    InvalidScale(f32),

    #[error("shadow offset must be finite, got ({x}, {y})")]
    InvalidOffset { x: f32, y: f32 },
}

/// Failures reported by a [`Renderer`](crate::render::Renderer).
#[derive(Debug, Error, PartialEq)]
pub enum RenderError {
    #[error("invalid output size: {0}")]
    InvalidSize(u32),

    #[error("render set is empty")]
    EmptyRenderSet,

    #[error("invalid camera placement: {0}")]
    InvalidPlacement(String),
}

/// Failures reported by an [`AssetSink`](crate::sink::AssetSink).
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("PNG encoding error: {0}")]
    Encoding(#[from] image::ImageError),
}

/// Failures of the preset store.
#[derive(Debug, Error)]
pub enum PresetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid preset JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid preset name: {0:?}")]
    InvalidName(String),

    #[error("preset not found: {0}")]
    NotFound(String),
}

/// Per-target failure inside the icon pipeline.
#[derive(Debug, Error, PartialEq)]
pub enum IconError {
    #[error(transparent)]
    Framing(#[from] FramingError),

    #[error(transparent)]
    Render(#[from] RenderError),
}
