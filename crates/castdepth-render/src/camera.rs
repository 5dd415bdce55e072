//! Orthographic camera and clipping range management.
//!
//! The camera mirrors a classic scene-graph camera: it sits on the +Z side of
//! its focal point looking down -Z with +Y up, and a reset places it far
//! enough away that a 30 degree frustum would contain the bounding sphere.
//! Only the orthographic projection is used for depth maps, so the distance
//! matters only for the clipping range.

use castdepth_core::{BoundingBox, ClipPolicy, Framing, RenderOptions};
use glam::{Mat4, Vec3};

/// Expansion applied on both sides of the fitted clipping range, as a
/// fraction of the range.
const CLIPPING_RANGE_EXPANSION: f32 = 0.5;

/// Smallest allowed near/far ratio, for a 24-bit depth buffer.
const NEAR_CLIPPING_PLANE_TOLERANCE: f32 = 0.001;

/// Default margin for [`ClipPolicy::Reference`] without a reference cast.
const DEFAULT_NEAR_MARGIN: f32 = 2.0;

/// An orthographic camera.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Camera position in world space.
    pub position: Vec3,
    /// Focal point.
    pub target: Vec3,
    /// Up vector.
    pub up: Vec3,
    /// Vertical view angle in degrees, used only to place the camera on reset.
    pub view_angle: f32,
    /// Aspect ratio (width / height).
    pub aspect_ratio: f32,
    /// Half of the visible height in world units.
    pub ortho_scale: f32,
    /// Near clipping distance along the view direction.
    pub near: f32,
    /// Far clipping distance along the view direction.
    pub far: f32,
}

impl Camera {
    /// Creates a new camera with default settings.
    #[must_use]
    pub fn new(aspect_ratio: f32) -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 1.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            view_angle: 30.0,
            aspect_ratio,
            near: 0.01,
            far: 1000.01,
            ortho_scale: 1.0,
        }
    }

    /// Returns the view matrix.
    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// Returns the orthographic projection matrix.
    ///
    /// Depth maps to `[0, 1]` between the near and far planes.
    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        let half_height = self.ortho_scale;
        let half_width = half_height * self.aspect_ratio;
        Mat4::orthographic_rh(
            -half_width,
            half_width,
            -half_height,
            half_height,
            self.near,
            self.far,
        )
    }

    /// Returns the combined view-projection matrix.
    #[must_use]
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Returns the camera's forward direction.
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize()
    }

    /// Distance from the camera to the focal point.
    #[must_use]
    pub fn distance(&self) -> f32 {
        self.position.distance(self.target)
    }

    /// Signed distance of `point` in front of the camera.
    #[must_use]
    pub fn view_distance(&self, point: Vec3) -> f32 {
        (point - self.position).dot(self.forward())
    }

    /// Sets the orthographic scale.
    pub fn set_ortho_scale(&mut self, scale: f32) {
        self.ortho_scale = scale.max(1e-6);
    }

    /// Sets the near and far clipping distances.
    pub fn set_clipping_range(&mut self, near: f32, far: f32) {
        self.near = near;
        self.far = far;
    }

    /// Points the camera at the center of `bounds` from the +Z side.
    ///
    /// The distance is chosen so the bounding sphere fills the view angle;
    /// the orthographic scale is set to the sphere radius and the clipping
    /// range is refitted. A point-sized box gets a radius of 0.5.
    pub fn reset_to_bounds(&mut self, bounds: &BoundingBox) {
        let center = bounds.center();
        let mut diagonal = bounds.diagonal();
        if diagonal == 0.0 {
            diagonal = 1.0;
        }
        let radius = diagonal * 0.5;
        let distance = radius / (self.view_angle.to_radians() * 0.5).sin();

        self.target = center;
        self.up = Vec3::Y;
        self.position = center + Vec3::Z * distance;
        self.ortho_scale = radius;
        self.reset_clipping_range(bounds);
    }

    /// Fits the clipping range around `bounds`, with some breathing room.
    ///
    /// Corners behind the camera count as distance zero. If the expanded near
    /// plane ends up beyond the far plane it is reset to `0.01 * far`.
    pub fn reset_clipping_range(&mut self, bounds: &BoundingBox) {
        let (n0, f0) = bounds
            .corners()
            .iter()
            .map(|&c| self.view_distance(c))
            .fold((f32::MAX, f32::MIN), |(lo, hi), d| (lo.min(d), hi.max(d)));
        let n0 = n0.max(0.0);

        let mut near = 0.99 * n0 - (f0 - n0) * CLIPPING_RANGE_EXPANSION;
        let far = 1.01 * f0 + (f0 - near) * CLIPPING_RANGE_EXPANSION;
        if near >= far {
            near = 0.01 * far;
        }
        near = near.max(NEAR_CLIPPING_PLANE_TOLERANCE * far);

        self.set_clipping_range(near, far);
    }

    /// Applies a clipping policy after a reset.
    ///
    /// `reference_center` is the center of the opposing cast, used by
    /// [`ClipPolicy::Reference`].
    pub fn apply_clip_policy(
        &mut self,
        policy: ClipPolicy,
        bounds: &BoundingBox,
        reference_center: Option<Vec3>,
    ) {
        let distance = self.distance();
        let half_depth = bounds.extent().z * 0.5;
        let tight = |margin: f32| (distance - half_depth - margin, distance + half_depth);

        let (near, far) = match policy {
            ClipPolicy::FrontHalf => (self.near, self.far - (self.far - self.near) * 0.5),
            ClipPolicy::Tight { near_margin } => tight(near_margin),
            ClipPolicy::Reference => match reference_center {
                Some(center) => tight(distance - self.position.distance(center)),
                None => tight(DEFAULT_NEAR_MARGIN),
            },
        };
        self.set_clipping_range(near, far);
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(1.0)
    }
}

/// Builds the depth-map camera for a surface with the given bounds.
///
/// With [`Framing::Bounds`] the orthographic half-height is half the Y extent
/// plus `scale_padding`. With [`Framing::ObbAligned`] the bounds are expected
/// to be those of an OBB-aligned cast: the half-height is exactly half the Y
/// extent, and [`ClipPolicy::FrontHalf`] keeps the front half of the tight
/// range around the Z extent instead of the refitted one.
#[must_use]
pub fn fit_orthographic(
    bounds: &BoundingBox,
    options: &RenderOptions,
    reference_center: Option<Vec3>,
) -> Camera {
    #[allow(clippy::cast_precision_loss)]
    let aspect_ratio = options.width as f32 / options.height.max(1) as f32;
    let mut camera = Camera::new(aspect_ratio);
    camera.reset_to_bounds(bounds);
    match options.framing {
        Framing::Bounds => {
            camera.set_ortho_scale(bounds.extent().y * 0.5 + options.scale_padding);
            camera.apply_clip_policy(options.clip, bounds, reference_center);
        }
        Framing::ObbAligned => {
            camera.set_ortho_scale(bounds.extent().y * 0.5);
            if options.clip == ClipPolicy::FrontHalf {
                camera.apply_clip_policy(ClipPolicy::Tight { near_margin: 0.0 }, bounds, None);
            }
            camera.apply_clip_policy(options.clip, bounds, reference_center);
        }
    }

    log::debug!(
        "camera: focal {:?}, distance {:.3}, scale {:.3}, clip [{:.3}, {:.3}]",
        camera.target,
        camera.distance(),
        camera.ortho_scale,
        camera.near,
        camera.far
    );
    camera
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cast_bounds() -> BoundingBox {
        BoundingBox::new(Vec3::new(-30.0, -20.0, -5.0), Vec3::new(30.0, 20.0, 5.0))
    }

    #[test]
    fn test_reset_places_camera_on_positive_z() {
        let bounds = cast_bounds();
        let mut camera = Camera::default();
        camera.reset_to_bounds(&bounds);

        assert_eq!(camera.target, bounds.center());
        assert!(camera.forward().abs_diff_eq(Vec3::NEG_Z, 1e-6));
        let radius = bounds.diagonal() * 0.5;
        let expected = radius / 15f32.to_radians().sin();
        assert!((camera.distance() - expected).abs() < 1e-3);
        assert!((camera.ortho_scale - radius).abs() < 1e-5);
    }

    #[test]
    fn test_reset_clipping_range_contains_bounds() {
        let bounds = cast_bounds();
        let mut camera = Camera::default();
        camera.reset_to_bounds(&bounds);

        let d = camera.distance();
        let (n0, f0) = (d - 5.0, d + 5.0);
        let near = 0.99 * n0 - 10.0 * 0.5;
        let far = 1.01 * f0 + (f0 - near) * 0.5;
        assert!((camera.near - near).abs() < 1e-3);
        assert!((camera.far - far).abs() < 1e-3);
        assert!(camera.near < n0 && camera.far > f0);
    }

    #[test]
    fn test_reset_degenerate_bounds() {
        let point = BoundingBox::new(Vec3::ONE, Vec3::ONE);
        let mut camera = Camera::default();
        camera.reset_to_bounds(&point);
        assert!((camera.ortho_scale - 0.5).abs() < 1e-6);
        let d = 0.5 / 15f32.to_radians().sin();
        assert!((camera.distance() - d).abs() < 1e-4);
        assert!((camera.near - 0.99 * d).abs() < 1e-4);
        assert!((camera.far - 1.015 * d).abs() < 1e-4);
    }

    #[test]
    fn test_clipping_range_for_bounds_behind_camera() {
        let mut camera = Camera::new(1.0);
        camera.position = Vec3::new(0.0, 0.0, 10.0);
        camera.target = Vec3::ZERO;
        // Every corner is 10 to 20 units behind the camera.
        let behind = BoundingBox::new(Vec3::new(-1.0, -1.0, 20.0), Vec3::new(1.0, 1.0, 30.0));
        camera.reset_clipping_range(&behind);

        // n0 clamps to 0, so near = 5 and far = -10.1 - 7.5 = -17.6. The near
        // plane falls back to 0.01 * far, then to the tolerance floor.
        assert!((camera.far + 17.6).abs() < 1e-3, "{}", camera.far);
        assert!((camera.near - 0.001 * camera.far).abs() < 1e-5, "{}", camera.near);
        assert!(camera.near < 0.0);
    }

    #[test]
    fn test_front_half_policy() {
        let bounds = cast_bounds();
        let mut camera = Camera::default();
        camera.reset_to_bounds(&bounds);
        let (near, far) = (camera.near, camera.far);
        camera.apply_clip_policy(ClipPolicy::FrontHalf, &bounds, None);
        assert_eq!(camera.near, near);
        assert!((camera.far - (near + far) * 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_tight_policy() {
        let bounds = cast_bounds();
        let mut camera = Camera::default();
        camera.reset_to_bounds(&bounds);
        let d = camera.distance();
        camera.apply_clip_policy(ClipPolicy::Tight { near_margin: 2.0 }, &bounds, None);
        assert!((camera.near - (d - 7.0)).abs() < 1e-3);
        assert!((camera.far - (d + 5.0)).abs() < 1e-3);
    }

    #[test]
    fn test_reference_policy_pulls_near_plane_forward() {
        let bounds = cast_bounds();
        let mut camera = Camera::default();
        camera.reset_to_bounds(&bounds);
        let d = camera.distance();
        // The opposing cast sits 12 units closer to the camera.
        let reference = bounds.center() + Vec3::Z * 12.0;
        camera.apply_clip_policy(ClipPolicy::Reference, &bounds, Some(reference));
        assert!((camera.near - (d - 5.0 - 12.0)).abs() < 1e-3);
        assert!(camera.view_distance(reference) > camera.near);

        camera.apply_clip_policy(ClipPolicy::Reference, &bounds, None);
        assert!((camera.near - (d - 7.0)).abs() < 1e-3);
    }

    #[test]
    fn test_projection_maps_clip_range_to_unit_depth() {
        let bounds = cast_bounds();
        let mut camera = Camera::default();
        camera.reset_to_bounds(&bounds);
        let vp = camera.view_projection_matrix();

        let on_near = camera.position + camera.forward() * camera.near;
        let on_far = camera.position + camera.forward() * camera.far;
        assert!(vp.project_point3(on_near).z.abs() < 1e-3);
        assert!((vp.project_point3(on_far).z - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_fit_orthographic_scale() {
        let bounds = cast_bounds();
        let camera = fit_orthographic(&bounds, &RenderOptions::default(), None);
        assert!((camera.ortho_scale - 20.1).abs() < 1e-4);
        assert_eq!(camera.aspect_ratio, 1.0);

        // Top edge of the bounds lands just inside the top of the frame.
        let top = camera
            .view_projection_matrix()
            .project_point3(Vec3::new(0.0, 20.0, 0.0));
        assert!(top.y < 1.0 && top.y > 0.99);
    }

    #[test]
    fn test_fit_obb_aligned_frames_exact_height() {
        let bounds = cast_bounds();
        let options = RenderOptions {
            framing: Framing::ObbAligned,
            ..Default::default()
        };
        let camera = fit_orthographic(&bounds, &options, None);
        assert!((camera.ortho_scale - 20.0).abs() < 1e-5);
        // Front half of [d - 5, d + 5].
        let d = camera.distance();
        assert!((camera.near - (d - 5.0)).abs() < 1e-3);
        assert!((camera.far - d).abs() < 1e-3);

        let tight = fit_orthographic(
            &bounds,
            &RenderOptions {
                clip: ClipPolicy::Tight { near_margin: 2.0 },
                ..options
            },
            None,
        );
        assert!((tight.near - (d - 7.0)).abs() < 1e-3);
        assert!((tight.far - (d + 5.0)).abs() < 1e-3);
    }
}
