//! Rigid transforms used to align casts before rendering.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Coordinate axis a rotation is taken about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RotationAxis {
    /// The X axis.
    X,
    /// The Y axis.
    #[default]
    Y,
    /// The Z axis.
    Z,
}

impl RotationAxis {
    /// Returns the unit vector for this axis.
    #[must_use]
    pub fn to_vec3(self) -> Vec3 {
        match self {
            RotationAxis::X => Vec3::X,
            RotationAxis::Y => Vec3::Y,
            RotationAxis::Z => Vec3::Z,
        }
    }
}

/// A rotation by a fixed angle about a coordinate axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    /// Axis of rotation.
    pub axis: RotationAxis,
    /// Angle in degrees, counter-clockwise looking down the axis.
    pub degrees: f32,
}

impl Default for Rotation {
    fn default() -> Self {
        Self {
            axis: RotationAxis::Y,
            degrees: 90.0,
        }
    }
}

impl Rotation {
    /// Creates a rotation.
    #[must_use]
    pub fn new(axis: RotationAxis, degrees: f32) -> Self {
        Self { axis, degrees }
    }

    /// Returns the rotation about the origin as a matrix.
    #[must_use]
    pub fn matrix(&self) -> Mat4 {
        let radians = self.degrees.to_radians();
        match self.axis {
            RotationAxis::X => Mat4::from_rotation_x(radians),
            RotationAxis::Y => Mat4::from_rotation_y(radians),
            RotationAxis::Z => Mat4::from_rotation_z(radians),
        }
    }
}

/// Builds the transform that rotates about `pivot` instead of the origin.
///
/// Composed as `T(pivot) * R * T(-pivot)`, so `pivot` maps to itself.
#[must_use]
pub fn rotation_about(pivot: Vec3, rotation: Rotation) -> Mat4 {
    Mat4::from_translation(pivot) * rotation.matrix() * Mat4::from_translation(-pivot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-3
    }

    #[test]
    fn test_default_is_quarter_turn_about_y() {
        let r = Rotation::default();
        assert_eq!(r.axis, RotationAxis::Y);
        assert_eq!(r.degrees, 90.0);
        // +X goes to -Z under a right-handed quarter turn about +Y.
        let p = r.matrix().transform_point3(Vec3::X);
        assert!(approx(p, Vec3::NEG_Z), "got {p}");
    }

    #[test]
    fn test_rotation_about_keeps_pivot() {
        let pivot = Vec3::new(12.5, -3.0, 40.0);
        let m = rotation_about(pivot, Rotation::default());
        assert!(approx(m.transform_point3(pivot), pivot));
        let p = m.transform_point3(pivot + Vec3::X);
        assert!(approx(p, pivot + Vec3::NEG_Z), "got {p}");
    }

    #[test]
    fn test_axis_serde_names() {
        let json = serde_json::to_string(&Rotation::new(RotationAxis::X, 45.0)).unwrap();
        assert_eq!(json, r#"{"axis":"X","degrees":45.0}"#);
    }

    proptest! {
        #[test]
        fn prop_rotation_about_preserves_distance_to_pivot(
            px in -100.0f32..100.0, py in -100.0f32..100.0, pz in -100.0f32..100.0,
            qx in -100.0f32..100.0, qy in -100.0f32..100.0, qz in -100.0f32..100.0,
            degrees in -360.0f32..360.0,
            axis in prop_oneof![Just(RotationAxis::X), Just(RotationAxis::Y), Just(RotationAxis::Z)],
        ) {
            let pivot = Vec3::new(px, py, pz);
            let q = Vec3::new(qx, qy, qz);
            let m = rotation_about(pivot, Rotation::new(axis, degrees));
            let before = q.distance(pivot);
            let after = m.transform_point3(q).distance(pivot);
            prop_assert!((before - after).abs() < 1e-2 * (1.0 + before));
            // The component along the axis is untouched.
            let a = axis.to_vec3();
            let moved = m.transform_point3(q);
            prop_assert!((moved.dot(a) - q.dot(a)).abs() < 1e-2 * (1.0 + before));
        }
    }
}
