//! Off-screen depth rasterization.
//!
//! A [`Rasterizer`] draws a mesh into a [`DepthBuffer`], a single float
//! Z-buffer holding normalized window depth in `[0, 1]`. Only depth is
//! produced; there is no color attachment. The GPU path is a
//! [`DepthEngine`]; [`render_depth_software`] scan-converts on the CPU and is
//! used when no adapter is available or when asked for explicitly.

use castdepth_core::{RenderBackend, TriMesh};
use glam::Vec3;
use pollster::FutureExt;

use crate::camera::Camera;
use crate::engine::DepthEngine;
use crate::error::{RenderError, RenderResult};

/// Depth value of an empty pixel (the far plane).
pub const CLEAR_DEPTH: f32 = 1.0;

/// A row-major depth framebuffer. Row 0 is the top of the image.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthBuffer {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl DepthBuffer {
    /// Creates a buffer cleared to [`CLEAR_DEPTH`].
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![CLEAR_DEPTH; width as usize * height as usize],
        }
    }

    /// Wraps depth values read back from a render target.
    pub(crate) fn from_raw(width: u32, height: u32, data: Vec<f32>) -> Self {
        debug_assert_eq!(data.len(), width as usize * height as usize);
        Self {
            width,
            height,
            data,
        }
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw depth values, row-major from the top-left pixel.
    #[must_use]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Depth at pixel `(x, y)`, or `None` outside the buffer.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(self.index(x, y)).copied()
    }

    /// Resets every pixel to [`CLEAR_DEPTH`].
    pub fn clear(&mut self) {
        self.data.fill(CLEAR_DEPTH);
    }

    /// Number of pixels that received a fragment.
    #[must_use]
    pub fn covered_pixels(&self) -> usize {
        self.data.iter().filter(|&&z| z < CLEAR_DEPTH).count()
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Writes `depth` if it is strictly closer than the stored value.
    fn test_and_set(&mut self, x: u32, y: u32, depth: f32) {
        let idx = self.index(x, y);
        if depth < self.data[idx] {
            self.data[idx] = depth;
        }
    }

    /// Scan-converts one screen-space triangle. `z` holds window depth.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss,
        clippy::similar_names
    )]
    fn draw_triangle(&mut self, a: Vec3, b: Vec3, c: Vec3) {
        let area = edge(a, b, c);
        if area == 0.0 || !area.is_finite() {
            return;
        }

        // Pixel centers sit at +0.5; clamp the covered range to the buffer.
        let min = a.min(b).min(c);
        let max = a.max(b).max(c);
        let x0 = (min.x - 0.5).ceil().max(0.0);
        let y0 = (min.y - 0.5).ceil().max(0.0);
        let x1 = (max.x - 0.5).floor().min(self.width as f32 - 1.0);
        let y1 = (max.y - 0.5).floor().min(self.height as f32 - 1.0);
        if x0 > x1 || y0 > y1 {
            return;
        }

        for py in y0 as u32..=y1 as u32 {
            for px in x0 as u32..=x1 as u32 {
                let p = Vec3::new(px as f32 + 0.5, py as f32 + 0.5, 0.0);
                let wa = edge(b, c, p) / area;
                let wb = edge(c, a, p) / area;
                let wc = edge(a, b, p) / area;
                if wa < 0.0 || wb < 0.0 || wc < 0.0 {
                    continue;
                }
                let depth = wa * a.z + wb * b.z + wc * c.z;
                if !(0.0..=1.0).contains(&depth) {
                    continue;
                }
                self.test_and_set(px, py, depth);
            }
        }
    }
}

/// Twice the signed area of the 2D triangle `(a, b, p)`.
fn edge(a: Vec3, b: Vec3, p: Vec3) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

/// Selects where depth maps are rasterized.
#[derive(Debug)]
pub enum Rasterizer {
    /// Headless wgpu depth pass.
    Gpu(Box<DepthEngine>),
    /// CPU scan conversion.
    Software,
}

impl Rasterizer {
    /// Creates a rasterizer for `backend`.
    ///
    /// [`RenderBackend::Auto`] falls back to the CPU when no GPU adapter or
    /// device can be created; [`RenderBackend::Gpu`] reports the error.
    pub fn new(backend: RenderBackend) -> RenderResult<Self> {
        match backend {
            RenderBackend::Software => Ok(Self::Software),
            RenderBackend::Gpu => {
                let engine = DepthEngine::new_headless().block_on()?;
                Ok(Self::Gpu(Box::new(engine)))
            }
            RenderBackend::Auto => match DepthEngine::new_headless().block_on() {
                Ok(engine) => Ok(Self::Gpu(Box::new(engine))),
                Err(e) => {
                    log::warn!("GPU depth engine unavailable ({e}), rasterizing on the CPU");
                    Ok(Self::Software)
                }
            },
        }
    }

    /// Returns true if depth maps are drawn on the GPU.
    #[must_use]
    pub fn is_gpu(&self) -> bool {
        matches!(self, Self::Gpu(_))
    }

    /// Renders the depth of `mesh` as seen by `camera` into a new buffer.
    ///
    /// Both triangle windings are drawn. Fragments in front of the near plane
    /// or behind the far plane are discarded.
    pub fn render(
        &mut self,
        mesh: &TriMesh,
        camera: &Camera,
        width: u32,
        height: u32,
    ) -> RenderResult<DepthBuffer> {
        match self {
            Self::Gpu(engine) => engine.render(mesh, camera, width, height),
            Self::Software => render_depth_software(mesh, camera, width, height),
        }
    }
}

/// One-off render with a fresh [`RenderBackend::Auto`] rasterizer.
///
/// Creating a GPU device is costly; batch code keeps a [`Rasterizer`].
pub fn render_depth(
    mesh: &TriMesh,
    camera: &Camera,
    width: u32,
    height: u32,
) -> RenderResult<DepthBuffer> {
    Rasterizer::new(RenderBackend::Auto)?.render(mesh, camera, width, height)
}

/// Renders the depth of `mesh` on the CPU.
///
/// Pixel centers inside a triangle (edges inclusive) are covered, depth is
/// interpolated linearly in window space and the strictly nearer fragment
/// wins. Fragments in front of the near plane or behind the far plane are
/// discarded.
pub fn render_depth_software(
    mesh: &TriMesh,
    camera: &Camera,
    width: u32,
    height: u32,
) -> RenderResult<DepthBuffer> {
    if width == 0 || height == 0 {
        return Err(RenderError::InvalidFramebuffer { width, height });
    }
    mesh.validate()?;

    let mut buffer = DepthBuffer::new(width, height);
    let view_projection = camera.view_projection_matrix();
    #[allow(clippy::cast_precision_loss)]
    let (w, h) = (width as f32, height as f32);

    // NDC x/y to pixel coordinates, flipping y so +Y is up in the image.
    let screen: Vec<Vec3> = mesh
        .vertices
        .iter()
        .map(|&v| {
            let ndc = view_projection.project_point3(v);
            Vec3::new((ndc.x + 1.0) * 0.5 * w, (1.0 - ndc.y) * 0.5 * h, ndc.z)
        })
        .collect();

    for face in &mesh.faces {
        let [a, b, c] = face.map(|i| screen[i as usize]);
        buffer.draw_triangle(a, b, c);
    }

    log::debug!(
        "CPU rasterized {} triangles, {} of {} pixels covered",
        mesh.face_count(),
        buffer.covered_pixels(),
        buffer.data.len()
    );
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A square of side `2 * half` in the plane `z`, centered on the Z axis.
    fn square(half: f32, z: f32) -> TriMesh {
        TriMesh::new(
            vec![
                Vec3::new(-half, -half, z),
                Vec3::new(half, -half, z),
                Vec3::new(half, half, z),
                Vec3::new(-half, half, z),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        )
    }

    /// Camera looking down -Z at the origin with a fixed clip range.
    fn camera(ortho_scale: f32, near: f32, far: f32) -> Camera {
        let mut cam = Camera::new(1.0);
        cam.position = Vec3::new(0.0, 0.0, 10.0);
        cam.target = Vec3::ZERO;
        cam.ortho_scale = ortho_scale;
        cam.set_clipping_range(near, far);
        cam
    }

    #[test]
    fn test_empty_mesh_leaves_buffer_clear() {
        let buffer = render_depth_software(&TriMesh::default(), &camera(1.0, 1.0, 20.0), 8, 8).unwrap();
        assert_eq!(buffer.covered_pixels(), 0);
        assert!(buffer.data().iter().all(|&z| z == CLEAR_DEPTH));
    }

    #[test]
    fn test_zero_sized_framebuffer() {
        assert!(matches!(
            render_depth_software(&square(1.0, 0.0), &Camera::default(), 0, 16),
            Err(RenderError::InvalidFramebuffer {
                width: 0,
                height: 16
            })
        ));
    }

    #[test]
    fn test_full_screen_quad_covers_everything() {
        let buffer = render_depth_software(&square(2.0, 0.0), &camera(1.0, 5.0, 15.0), 16, 16).unwrap();
        assert_eq!(buffer.covered_pixels(), 256);
        // z = 0 is 10 units away: halfway between near 5 and far 15.
        assert!(buffer.data().iter().all(|&z| (z - 0.5).abs() < 1e-4));
    }

    #[test]
    fn test_half_size_quad_covers_center() {
        let buffer = render_depth_software(&square(0.5, 0.0), &camera(1.0, 5.0, 15.0), 16, 16).unwrap();
        assert_eq!(buffer.covered_pixels(), 64);
        assert!(buffer.get(8, 8).unwrap() < CLEAR_DEPTH);
        assert_eq!(buffer.get(0, 0), Some(CLEAR_DEPTH));
        assert_eq!(buffer.get(16, 0), None);
    }

    #[test]
    fn test_clear_resets_buffer() {
        let mut buffer =
            render_depth_software(&square(2.0, 0.0), &camera(1.0, 5.0, 15.0), 8, 8).unwrap();
        assert_eq!(buffer.covered_pixels(), 64);
        buffer.clear();
        assert_eq!(buffer, DepthBuffer::new(8, 8));
    }

    #[test]
    fn test_both_windings_are_drawn() {
        let mut mesh = square(2.0, 0.0);
        for f in &mut mesh.faces {
            f.swap(1, 2);
        }
        let buffer = render_depth_software(&mesh, &camera(1.0, 5.0, 15.0), 8, 8).unwrap();
        assert_eq!(buffer.covered_pixels(), 64);
    }

    #[test]
    fn test_nearest_surface_wins() {
        let mut mesh = square(2.0, -2.0);
        mesh.append(&square(0.5, 2.0));
        let buffer = render_depth_software(&mesh, &camera(1.0, 5.0, 15.0), 16, 16).unwrap();
        let center = buffer.get(8, 8).unwrap();
        let corner = buffer.get(0, 0).unwrap();
        // z = 2 is 8 away, z = -2 is 12 away.
        assert!((center - 0.3).abs() < 1e-4);
        assert!((corner - 0.7).abs() < 1e-4);

        // Draw order does not matter.
        let mut reversed = square(0.5, 2.0);
        reversed.append(&square(2.0, -2.0));
        let again = render_depth_software(&reversed, &camera(1.0, 5.0, 15.0), 16, 16).unwrap();
        assert_eq!(again, buffer);
    }

    #[test]
    fn test_fragments_outside_clip_range_are_discarded() {
        // z = 0 is 10 away; the far plane at 8 cuts it off.
        let buffer = render_depth_software(&square(2.0, 0.0), &camera(1.0, 1.0, 8.0), 8, 8).unwrap();
        assert_eq!(buffer.covered_pixels(), 0);
        // So does a near plane at 12.
        let buffer = render_depth_software(&square(2.0, 0.0), &camera(1.0, 12.0, 20.0), 8, 8).unwrap();
        assert_eq!(buffer.covered_pixels(), 0);
    }

    #[test]
    fn test_image_y_points_up() {
        // Triangle only in the upper half of the world.
        let mesh = TriMesh::new(
            vec![
                Vec3::new(-2.0, 0.1, 0.0),
                Vec3::new(2.0, 0.1, 0.0),
                Vec3::new(0.0, 2.0, 0.0),
            ],
            vec![[0, 1, 2]],
        );
        let buffer = render_depth_software(&mesh, &camera(1.0, 5.0, 15.0), 16, 16).unwrap();
        assert!(buffer.get(8, 2).unwrap() < CLEAR_DEPTH);
        assert_eq!(buffer.get(8, 13), Some(CLEAR_DEPTH));
    }

    #[test]
    fn test_sloped_surface_interpolates_depth() {
        // A plane tilted about Y: depth increases with x.
        let mesh = TriMesh::new(
            vec![
                Vec3::new(-2.0, -2.0, 2.0),
                Vec3::new(2.0, -2.0, -2.0),
                Vec3::new(2.0, 2.0, -2.0),
                Vec3::new(-2.0, 2.0, 2.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        );
        let buffer = render_depth_software(&mesh, &camera(1.0, 5.0, 15.0), 16, 16).unwrap();
        let row: Vec<f32> = (0..16).map(|x| buffer.get(x, 8).unwrap()).collect();
        assert!(row.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_rejects_invalid_mesh() {
        let mesh = TriMesh::new(vec![Vec3::ZERO], vec![[0, 1, 2]]);
        assert!(matches!(
            render_depth_software(&mesh, &Camera::default(), 4, 4),
            Err(RenderError::InvalidMesh(_))
        ));
    }

    #[test]
    fn test_software_backend_is_explicit() {
        let mut rasterizer = Rasterizer::new(RenderBackend::Software).unwrap();
        assert!(!rasterizer.is_gpu());
        let buffer = rasterizer
            .render(&square(0.5, 0.0), &camera(1.0, 5.0, 15.0), 16, 16)
            .unwrap();
        assert_eq!(buffer.covered_pixels(), 64);
    }

    #[test]
    fn test_auto_backend_always_renders() {
        // Either a GPU engine or the CPU fallback; both see the same quad.
        let buffer = render_depth(&square(2.0, 0.0), &camera(1.0, 5.0, 15.0), 8, 8).unwrap();
        assert_eq!(buffer.covered_pixels(), 64);
        assert!(buffer.data().iter().all(|&z| (z - 0.5).abs() < 1e-4));
    }

    #[test]
    fn test_fitted_camera_frames_mesh() {
        let mesh = square(10.0, 3.0);
        let mut cam = Camera::new(1.0);
        cam.reset_to_bounds(&mesh.bounds().unwrap());
        cam.set_ortho_scale(10.1);
        let buffer = render_depth_software(&mesh, &cam, 32, 32).unwrap();
        // Everything but a thin rim is covered.
        assert!(buffer.covered_pixels() >= 30 * 30);
    }
}
