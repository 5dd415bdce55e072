//! Rendering error types.

use castdepth_core::CoreError;
use thiserror::Error;

/// Errors that can occur during rendering operations.
#[derive(Error, Debug)]
pub enum RenderError {
    /// The framebuffer has a zero dimension or exceeds the device limits.
    #[error("invalid framebuffer size {width}x{height}")]
    InvalidFramebuffer { width: u32, height: u32 },

    /// The mesh to draw is malformed.
    #[error("invalid mesh: {0}")]
    InvalidMesh(#[from] CoreError),

    /// Failed to create wgpu adapter.
    #[error("failed to create graphics adapter")]
    AdapterCreationFailed,

    /// Failed to create wgpu device.
    #[error("failed to create graphics device: {0}")]
    DeviceCreationFailed(#[from] wgpu::RequestDeviceError),

    /// Mapping the depth readback buffer failed.
    #[error("failed to read back depth buffer")]
    BufferMapFailed,

    /// Timeout waiting for GPU.
    #[error("timeout waiting for GPU")]
    Timeout,
}

/// A specialized Result type for rendering operations.
pub type RenderResult<T> = std::result::Result<T, RenderError>;
