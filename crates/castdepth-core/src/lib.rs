//! Core types for castdepth.
//!
//! This crate provides the geometry and configuration shared by the renderer
//! and the batch driver:
//! - [`TriMesh`] indexed triangle surfaces with clean/append/transform
//! - [`BoundingBox`] axis-aligned bounds
//! - [`Rotation`] and [`rotation_about`] for aligning a cast about its centroid
//! - [`load_mesh`] for PLY, STL and OBJ scans
//! - [`OrientedBox`] principal-axis bounds and [`align_to_obb`]
//! - Serializable options ([`RenderOptions`], [`BatchConfig`])

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]

pub mod bounds;
pub mod error;
pub mod io;
pub mod mesh;
pub mod obb;
pub mod options;
pub mod transform;

pub use bounds::BoundingBox;
pub use error::{CoreError, Result};
pub use io::{load_mesh, MeshFormat};
pub use mesh::TriMesh;
pub use obb::{align_to_obb, OrientedBox};
pub use options::{
    BatchConfig, ClipPolicy, DatasetLayout, DepthScale, Framing, PairJob, RenderBackend,
    RenderOptions,
};
pub use transform::{rotation_about, Rotation, RotationAxis};

// Re-export glam types for convenience
pub use glam::{Mat4, Vec3};
