//! Configuration options for castdepth.
//!
//! Every option struct derives serde so a batch can be described by a JSON
//! file. `Default` impls carry the values the GAN training set was generated
//! with: 256x256 frames, a quarter turn about +Y, and the front half of the
//! depth range.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::transform::Rotation;

/// How the camera's near/far clipping range is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum ClipPolicy {
    /// Fit the range to the bounds, then keep only its front half.
    #[default]
    FrontHalf,
    /// Tight range around the Z extent, with extra room in front.
    Tight {
        /// Distance the near plane is pulled toward the camera.
        near_margin: f32,
    },
    /// Tight range, with the near plane pulled forward far enough to keep the
    /// reference cast's center in view.
    Reference,
}

/// How the camera is placed around the aligned cast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Framing {
    /// Reset to the axis-aligned bounds after rotating about the centroid.
    #[default]
    Bounds,
    /// Align the cast's oriented bounding box to the axes first: shortest
    /// side along Z, longest along Y. The rotation is applied afterwards.
    ObbAligned,
}

/// Which rasterizer draws the depth buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RenderBackend {
    /// Use the GPU if an adapter is available, otherwise the CPU.
    #[default]
    Auto,
    /// Require a GPU adapter.
    Gpu,
    /// Always rasterize on the CPU.
    Software,
}

/// Linear mapping from normalized Z-buffer depth to 8-bit intensity:
/// `out = (z + shift) * scale`, clamped to `0..=255`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthScale {
    /// Added to the depth before scaling.
    pub shift: f32,
    /// Multiplier applied after the shift.
    pub scale: f32,
}

impl Default for DepthScale {
    fn default() -> Self {
        // Near plane -> 255, far plane and background -> 0.
        Self {
            shift: -1.0,
            scale: -255.0,
        }
    }
}

/// Options for rendering a single cast pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Framebuffer width in pixels.
    pub width: u32,
    /// Framebuffer height in pixels.
    pub height: u32,
    /// Alignment rotation about the target's center of mass, or about the
    /// pair center when the reference is included.
    pub rotation: Rotation,
    /// Added to half the Y extent to get the orthographic half-height.
    pub scale_padding: f32,
    /// Clipping range policy.
    pub clip: ClipPolicy,
    /// Whether the reference cast is merged into the rendered surface.
    pub include_reference: bool,
    /// Depth to intensity mapping.
    pub depth_scale: DepthScale,
    /// Camera placement.
    pub framing: Framing,
    /// Fill background holes enclosed by the cast and blank the spans
    /// between its outer walls.
    pub fill_holes: bool,
    /// Rasterizer selection.
    pub backend: RenderBackend,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 256,
            height: 256,
            rotation: Rotation::default(),
            scale_padding: 0.1,
            clip: ClipPolicy::FrontHalf,
            include_reference: false,
            depth_scale: DepthScale::default(),
            framing: Framing::Bounds,
            fill_holes: false,
            backend: RenderBackend::Auto,
        }
    }
}

/// One pair of directories to match file names across.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairJob {
    /// Directory of casts that get rotated and rendered.
    pub target_dir: PathBuf,
    /// Directory of the opposing casts, matched by file name.
    pub reference_dir: PathBuf,
}

/// The on-disk layout of the training set: one folder per restoration
/// category, each holding a target and a reference subfolder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetLayout {
    /// Dataset root.
    pub root: PathBuf,
    /// Category folder names under `root`.
    pub categories: Vec<String>,
    /// Subfolder holding the casts to render.
    pub target_subdir: String,
    /// Subfolder holding the opposing casts.
    pub reference_subdir: String,
}

impl Default for DatasetLayout {
    fn default() -> Self {
        Self {
            root: PathBuf::new(),
            categories: [
                "Four-Surface",
                "Onlay",
                "Single-Surface",
                "Three-Surface",
                "Two-Surface",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            target_subdir: "Down".to_string(),
            reference_subdir: "Up".to_string(),
        }
    }
}

impl DatasetLayout {
    /// Expands the layout into one job per category.
    #[must_use]
    pub fn jobs(&self) -> Vec<PairJob> {
        self.categories
            .iter()
            .map(|category| {
                let base = self.root.join(category);
                PairJob {
                    target_dir: base.join(&self.target_subdir),
                    reference_dir: base.join(&self.reference_subdir),
                }
            })
            .collect()
    }
}

/// A full batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Explicit directory pairs.
    #[serde(default)]
    pub jobs: Vec<PairJob>,
    /// Category layout, expanded after `jobs`.
    #[serde(default)]
    pub dataset: Option<DatasetLayout>,
    /// Where the PNG files are written.
    pub output_dir: PathBuf,
    /// Per-pair render options.
    #[serde(default)]
    pub render: RenderOptions,
    /// Continue with the next pair when one fails.
    #[serde(default)]
    pub keep_going: bool,
}

impl BatchConfig {
    /// Creates a config for a single directory pair with default options.
    #[must_use]
    pub fn single(
        target_dir: impl Into<PathBuf>,
        reference_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            jobs: vec![PairJob {
                target_dir: target_dir.into(),
                reference_dir: reference_dir.into(),
            }],
            dataset: None,
            output_dir: output_dir.into(),
            render: RenderOptions::default(),
            keep_going: false,
        }
    }

    /// Loads a config from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// All jobs: explicit ones first, then those from the dataset layout.
    #[must_use]
    pub fn all_jobs(&self) -> Vec<PairJob> {
        let mut jobs = self.jobs.clone();
        if let Some(layout) = &self.dataset {
            jobs.extend(layout.jobs());
        }
        jobs
    }
}
