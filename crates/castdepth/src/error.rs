//! Error types for the depth-map pipeline.

use std::path::PathBuf;

use castdepth_core::CoreError;
use castdepth_render::{RenderError, ScreenshotError};
use thiserror::Error;

/// Errors raised while turning a cast pair into a depth map.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A mesh could not be loaded or a config could not be read.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Rasterization failed.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// The depth map could not be written.
    #[error(transparent)]
    Screenshot(#[from] ScreenshotError),

    /// The surface to render has no points left after cleaning.
    #[error("target mesh has no renderable points")]
    EmptyMesh,

    /// The output directory could not be created.
    #[error("cannot create output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An input directory could not be listed.
    #[error("cannot read directory {}: {source}", path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A pair failed; wraps the cause with the pair's file name.
    #[error("pair '{name}' failed: {source}")]
    Pair {
        name: String,
        #[source]
        source: Box<PipelineError>,
    },
}

/// A specialized Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
