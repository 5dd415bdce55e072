//! Off-screen depth rendering for castdepth.
//!
//! This crate turns a [`TriMesh`](castdepth_core::TriMesh) into a depth map:
//! - [`Camera`] orthographic camera with scene-graph style reset and clipping
//! - [`Rasterizer`] headless wgpu depth pass ([`DepthEngine`]) with a CPU
//!   fallback ([`render_depth_software`])
//! - [`depth_to_gray`] Z-buffer to 8-bit intensity, [`fill_holes`] cleanup
//! - [`save_gray_png`] PNG output

pub mod camera;
pub mod depth_image;
pub mod engine;
pub mod error;
pub mod rasterizer;
pub mod screenshot;

pub use camera::{fit_orthographic, Camera};
pub use depth_image::{depth_to_gray, fill_holes, shift_scale};
pub use engine::DepthEngine;
pub use error::{RenderError, RenderResult};
pub use rasterizer::{render_depth, render_depth_software, DepthBuffer, Rasterizer, CLEAR_DEPTH};
pub use screenshot::{encode_gray_png, save_gray_png, ScreenshotError};
