//! The per-pair depth-map pipeline.
//!
//! One target cast and its opposing reference cast go in, one grayscale depth
//! image comes out. The steps are fixed:
//!
//! 1. load both meshes
//! 2. optionally lay both casts flat on the target's oriented bounding box
//! 3. rotate both casts about one pivot: the target's center of mass, or the
//!    center of the pair's bounds when the reference is rendered too
//! 4. clean the result (optionally merging in the reference)
//! 5. fit an orthographic camera to the surface bounds
//! 6. rasterize the Z-buffer, map it to 8-bit intensity, optionally fill holes

use std::borrow::Cow;
use std::path::Path;

use castdepth_core::{
    align_to_obb, load_mesh, rotation_about, BoundingBox, Framing, RenderOptions, TriMesh,
};
use castdepth_render::{
    depth_to_gray, fill_holes, fit_orthographic, Camera, DepthBuffer, Rasterizer,
};
use glam::Vec3;
use image::GrayImage;

use crate::error::{PipelineError, Result};

/// Everything produced while rendering one pair.
#[derive(Debug, Clone)]
pub struct PairRender {
    /// The 8-bit depth map.
    pub image: GrayImage,
    /// The raw normalized depth buffer.
    pub depth: DepthBuffer,
    /// Camera the depth map was taken with.
    pub camera: Camera,
    /// Center of mass of the target as loaded.
    pub target_centroid: Vec3,
    /// Center of mass of the reference cast as loaded, if it has points.
    pub reference_centroid: Option<Vec3>,
    /// Point the alignment rotation was taken about.
    pub pivot: Vec3,
    /// Bounds of the rendered surface.
    pub surface_bounds: BoundingBox,
    /// Bounds of the aligned target and the aligned reference together.
    pub combined_bounds: BoundingBox,
}

/// Loads a cast pair from disk and renders its depth map.
pub fn render_pair(
    target_path: &Path,
    reference_path: &Path,
    options: &RenderOptions,
    rasterizer: &mut Rasterizer,
) -> Result<PairRender> {
    let target = load_mesh(target_path)?;
    let reference = load_mesh(reference_path)?;
    render_meshes(&target, &reference, options, rasterizer)
}

/// Renders the depth map of an already loaded cast pair.
///
/// Both casts always move together, so the reference keeps its place
/// relative to the target for merging and for [`ClipPolicy::Reference`].
///
/// [`ClipPolicy::Reference`]: castdepth_core::ClipPolicy::Reference
pub fn render_meshes(
    target: &TriMesh,
    reference: &TriMesh,
    options: &RenderOptions,
    rasterizer: &mut Rasterizer,
) -> Result<PairRender> {
    target.validate()?;
    reference.validate()?;

    let target_centroid = target
        .center_of_mass()
        .ok_or(PipelineError::EmptyMesh)?;
    let reference_centroid = reference.center_of_mass();

    let (target, reference): (Cow<'_, TriMesh>, Cow<'_, TriMesh>) = match options.framing {
        Framing::Bounds => (Cow::Borrowed(target), Cow::Borrowed(reference)),
        Framing::ObbAligned => {
            let lay_flat = align_to_obb(target).ok_or(PipelineError::EmptyMesh)?;
            (
                Cow::Owned(target.transformed(&lay_flat)),
                Cow::Owned(reference.transformed(&lay_flat)),
            )
        }
    };

    let pivot = match (options.include_reference, target.bounds(), reference.bounds()) {
        (true, Some(t), Some(r)) => t.union(&r).center(),
        _ => target.center_of_mass().ok_or(PipelineError::EmptyMesh)?,
    };
    let alignment = rotation_about(pivot, options.rotation);
    let aligned = target.transformed(&alignment).clean();
    let placed_reference = reference.transformed(&alignment);

    let surface = if options.include_reference {
        let mut merged = aligned.clone();
        merged.append(&placed_reference);
        merged.clean()
    } else {
        aligned.clone()
    };

    let surface_bounds = surface.bounds().ok_or(PipelineError::EmptyMesh)?;
    let aligned_bounds = aligned.bounds().unwrap_or(surface_bounds);
    let reference_bounds = placed_reference.bounds();
    let combined_bounds =
        reference_bounds.map_or(aligned_bounds, |bounds| aligned_bounds.union(&bounds));

    let camera = fit_orthographic(
        &surface_bounds,
        options,
        reference_bounds.map(|b| b.center()),
    );
    let depth = rasterizer.render(&surface, &camera, options.width, options.height)?;
    let mut image = depth_to_gray(&depth, options.depth_scale);
    if options.fill_holes {
        fill_holes(&mut image);
    }

    Ok(PairRender {
        image,
        depth,
        camera,
        target_centroid,
        reference_centroid,
        pivot,
        surface_bounds,
        combined_bounds,
    })
}
