//! castdepth: depth-map training images from paired dental casts.
//!
//! For every file name present in both a target directory (e.g. lower casts)
//! and a reference directory (the opposing upper casts), castdepth loads the
//! two surfaces, rotates the target about its center of mass, renders it
//! through an orthographic camera into an off-screen depth buffer and writes
//! the depth as an 8-bit grayscale PNG.
//!
//! Depth is rasterized on the GPU through a headless wgpu device. When no
//! adapter is available the batch falls back to a software Z-buffer; select
//! the path explicitly with [`RenderOptions::backend`].
//!
//! # Quick Start
//!
//! ```no_run
//! use castdepth::*;
//!
//! fn main() -> Result<()> {
//!     let config = BatchConfig::single("training/Onlay/Down", "training/Onlay/Up", "depth90");
//!     let report = run_batch(&config)?;
//!     println!("{} depth maps written", report.rendered);
//!     Ok(())
//! }
//! ```
//!
//! A single pair can be rendered without touching the file system for output:
//!
//! ```no_run
//! use castdepth::*;
//! use std::path::Path;
//!
//! let options = RenderOptions::default();
//! let mut rasterizer = Rasterizer::new(options.backend).unwrap();
//! let render = render_pair(
//!     Path::new("Down/data0001.ply"),
//!     Path::new("Up/data0001.ply"),
//!     &options,
//!     &mut rasterizer,
//! )
//! .unwrap();
//! assert_eq!(render.image.dimensions(), (256, 256));
//! ```

pub mod batch;
pub mod error;
pub mod pipeline;

pub use batch::{
    match_pairs, output_path, process_pair, run_batch, scan_dir, BatchReport, MeshPair, Pairing,
};
pub use error::{PipelineError, Result};
pub use pipeline::{render_meshes, render_pair, PairRender};

// Re-export core and render types
pub use castdepth_core::{
    align_to_obb, load_mesh, rotation_about, BatchConfig, BoundingBox, ClipPolicy, DatasetLayout,
    DepthScale, Framing, PairJob, RenderBackend, RenderOptions, Rotation, RotationAxis, TriMesh,
    Vec3,
};
pub use castdepth_render::{fill_holes, Camera, DepthBuffer, Rasterizer};
