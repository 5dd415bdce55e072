//! Oriented bounding boxes.
//!
//! The box follows the principal axes of the point set (PCA of the point
//! covariance). [`OrientedBox::alignment`] turns it into a rigid transform that
//! lays a cast flat: longest side along +Y, middle side along +X, shortest
//! side along +Z.

use glam::{DVec3, Mat3, Mat4, Vec3};
use nalgebra::Matrix3;

use crate::mesh::TriMesh;

/// A box aligned to the principal axes of a point set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientedBox {
    /// Center of the box.
    pub center: Vec3,
    /// Unit axes, longest side first.
    pub axes: [Vec3; 3],
    /// Side lengths along `axes`.
    pub lengths: Vec3,
}

impl OrientedBox {
    /// Fits a box to the principal axes of `points`.
    ///
    /// Returns `None` for an empty point set.
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }

        #[allow(clippy::cast_precision_loss)]
        let n = points.len() as f64;
        let mean = points
            .iter()
            .fold(DVec3::ZERO, |acc, p| acc + p.as_dvec3())
            / n;

        let mut cov = Matrix3::<f64>::zeros();
        for p in points {
            let d = (p.as_dvec3() - mean).to_array();
            for r in 0..3 {
                for c in 0..3 {
                    cov[(r, c)] += d[r] * d[c];
                }
            }
        }
        cov /= n;
        let eigen = cov.symmetric_eigen();

        // (axis, lowest projection, highest projection) per eigenvector.
        let mut fitted: [(DVec3, f64, f64); 3] = std::array::from_fn(|i| {
            let col = eigen.eigenvectors.column(i);
            let axis = DVec3::new(col[0], col[1], col[2]);
            let (lo, hi) = points
                .iter()
                .map(|p| (p.as_dvec3() - mean).dot(axis))
                .fold((f64::MAX, f64::MIN), |(lo, hi), t| (lo.min(t), hi.max(t)));
            (axis, lo, hi)
        });
        fitted.sort_by(|a, b| (b.2 - b.1).total_cmp(&(a.2 - a.1)));

        let center = fitted
            .iter()
            .fold(mean, |c, (axis, lo, hi)| c + *axis * ((lo + hi) * 0.5));

        #[allow(clippy::cast_possible_truncation)]
        Some(Self {
            center: center.as_vec3(),
            axes: fitted.map(|(axis, _, _)| axis.as_vec3()),
            lengths: Vec3::from_array(fitted.map(|(_, lo, hi)| (hi - lo) as f32)),
        })
    }

    /// The rotation about the box center that maps the longest axis to +Y,
    /// the middle one to +X and the shortest one to +Z.
    ///
    /// Each axis is signed to point toward the extreme point of `points` in
    /// its target direction (highest Y, X and Z respectively), so a cast that
    /// already lies flat is left alone. If the result would be a reflection,
    /// the X axis is reversed to keep it rigid.
    #[must_use]
    pub fn alignment(&self, points: &[Vec3]) -> Mat4 {
        let extreme = |key: fn(Vec3) -> f32| {
            points
                .iter()
                .copied()
                .max_by(|a, b| key(*a).total_cmp(&key(*b)))
        };
        let orient = |axis: Vec3, toward: Option<Vec3>| match toward {
            Some(p) if (p - self.center).dot(axis) < 0.0 => -axis,
            _ => axis,
        };

        let [longest, middle, shortest] = self.axes;
        let y_axis = orient(longest, extreme(|p| p.y));
        let mut x_axis = orient(middle, extreme(|p| p.x));
        let z_axis = orient(shortest, extreme(|p| p.z));
        if x_axis.cross(y_axis).dot(z_axis) < 0.0 {
            x_axis = -x_axis;
        }

        // Rows are the new basis: p' = R (p - c) + c.
        let rotation = Mat3::from_cols(x_axis, y_axis, z_axis).transpose();
        Mat4::from_translation(self.center)
            * Mat4::from_mat3(rotation)
            * Mat4::from_translation(-self.center)
    }
}

/// The transform that lays `mesh` flat on its oriented bounding box.
///
/// Returns `None` for a mesh without points.
#[must_use]
pub fn align_to_obb(mesh: &TriMesh) -> Option<Mat4> {
    OrientedBox::from_points(&mesh.vertices).map(|obb| obb.alignment(&mesh.vertices))
}
