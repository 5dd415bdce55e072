//! Indexed triangle meshes.
//!
//! A [`TriMesh`] is the in-memory form of one dental cast surface: a point list
//! and a list of triangles indexing into it. Beyond storage it provides the
//! handful of polydata operations the depth pipeline needs:
//! - bounds and (unweighted) center of mass
//! - affine transformation of every point
//! - appending one mesh to another
//! - cleaning (merging coincident points, dropping degenerate triangles)

use std::collections::HashMap;

use glam::{Mat4, Vec3};

use crate::bounds::BoundingBox;
use crate::error::{CoreError, Result};

/// A triangulated surface.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriMesh {
    /// Point positions.
    pub vertices: Vec<Vec3>,
    /// Triangles as indices into `vertices`.
    pub faces: Vec<[u32; 3]>,
}

impl TriMesh {
    /// Creates a mesh from raw vertex and face data.
    #[must_use]
    pub fn new(vertices: Vec<Vec3>, faces: Vec<[u32; 3]>) -> Self {
        Self { vertices, faces }
    }

    /// Checks that every face index refers to an existing vertex.
    pub fn validate(&self) -> Result<()> {
        let vertex_count = self.vertices.len();
        for (face, tri) in self.faces.iter().enumerate() {
            if let Some(&index) = tri.iter().find(|&&i| i as usize >= vertex_count) {
                return Err(CoreError::IndexOutOfBounds {
                    face,
                    index,
                    vertex_count,
                });
            }
        }
        Ok(())
    }

    /// Returns true if the mesh has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Number of points.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles.
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Bounds over all stored points.
    #[must_use]
    pub fn bounds(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.vertices.iter().copied())
    }

    /// Unweighted mean of all point positions.
    #[must_use]
    pub fn center_of_mass(&self) -> Option<Vec3> {
        if self.vertices.is_empty() {
            return None;
        }
        // Accumulate in f64: casts carry tens of thousands of points with
        // coordinates in the tens of millimetres.
        let sum = self
            .vertices
            .iter()
            .fold(glam::DVec3::ZERO, |acc, v| acc + v.as_dvec3());
        #[allow(clippy::cast_precision_loss)]
        let mean = sum / self.vertices.len() as f64;
        Some(mean.as_vec3())
    }

    /// Applies an affine transform to every point in place.
    pub fn transform(&mut self, matrix: &Mat4) {
        for v in &mut self.vertices {
            *v = matrix.transform_point3(*v);
        }
    }

    /// Returns a transformed copy of the mesh.
    #[must_use]
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        let mut out = self.clone();
        out.transform(matrix);
        out
    }

    /// Appends another mesh, offsetting its face indices.
    pub fn append(&mut self, other: &TriMesh) {
        #[allow(clippy::cast_possible_truncation)]
        let offset = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.faces.extend(
            other
                .faces
                .iter()
                .map(|f| [f[0] + offset, f[1] + offset, f[2] + offset]),
        );
    }

    /// Returns a cleaned copy of the mesh.
    ///
    /// Exactly coincident points are merged into their first occurrence,
    /// triangles that collapse to fewer than three distinct points are
    /// removed, and points no longer referenced by any triangle are dropped.
    /// Relative order of surviving points and triangles is preserved.
    #[must_use]
    pub fn clean(&self) -> Self {
        // Map every point to the first point with identical coordinates.
        let mut first_seen: HashMap<[u32; 3], u32> = HashMap::with_capacity(self.vertices.len());
        let mut merged: Vec<u32> = Vec::with_capacity(self.vertices.len());
        for (i, v) in self.vertices.iter().enumerate() {
            #[allow(clippy::cast_possible_truncation)]
            let id = *first_seen.entry(point_key(*v)).or_insert(i as u32);
            merged.push(id);
        }

        let faces: Vec<[u32; 3]> = self
            .faces
            .iter()
            .map(|f| f.map(|i| merged[i as usize]))
            .filter(|f| f[0] != f[1] && f[1] != f[2] && f[0] != f[2])
            .collect();

        // Compact: keep only referenced points, in original order.
        let mut used = vec![false; self.vertices.len()];
        for f in &faces {
            for &i in f {
                used[i as usize] = true;
            }
        }
        let mut remap = vec![u32::MAX; self.vertices.len()];
        let mut vertices = Vec::with_capacity(self.vertices.len());
        for (i, v) in self.vertices.iter().enumerate() {
            if used[i] {
                #[allow(clippy::cast_possible_truncation)]
                {
                    remap[i] = vertices.len() as u32;
                }
                vertices.push(*v);
            }
        }

        let faces = faces
            .into_iter()
            .map(|f| f.map(|i| remap[i as usize]))
            .collect();

        Self { vertices, faces }
    }
}

/// Hash key for exact point equality. `-0.0` and `0.0` compare equal.
fn point_key(v: Vec3) -> [u32; 3] {
    [
        (v.x + 0.0).to_bits(),
        (v.y + 0.0).to_bits(),
        (v.z + 0.0).to_bits(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> TriMesh {
        TriMesh::new(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        )
    }

    #[test]
    fn test_validate_rejects_bad_index() {
        let mut mesh = unit_square();
        assert!(mesh.validate().is_ok());
        mesh.faces.push([0, 1, 7]);
        match mesh.validate() {
            Err(CoreError::IndexOutOfBounds {
                face,
                index,
                vertex_count,
            }) => {
                assert_eq!(face, 2);
                assert_eq!(index, 7);
                assert_eq!(vertex_count, 4);
            }
            other => panic!("expected IndexOutOfBounds, got {other:?}"),
        }
    }

    #[test]
    fn test_center_of_mass() {
        let mesh = unit_square();
        let c = mesh.center_of_mass().unwrap();
        assert!((c - Vec3::new(0.5, 0.5, 0.0)).length() < 1e-6);
        assert!(TriMesh::default().center_of_mass().is_none());
    }

    #[test]
    fn test_center_of_mass_is_unweighted() {
        // Duplicated points pull the centroid, unlike the bounds center.
        let mut mesh = unit_square();
        mesh.vertices.push(Vec3::new(1.0, 1.0, 0.0));
        mesh.vertices.push(Vec3::new(1.0, 1.0, 0.0));
        let c = mesh.center_of_mass().unwrap();
        assert!(c.x > 0.5 && c.y > 0.5);
        assert_eq!(mesh.bounds().unwrap().center(), Vec3::new(0.5, 0.5, 0.0));
    }

    #[test]
    fn test_append_offsets_indices() {
        let mut a = unit_square();
        let b = unit_square().transformed(&Mat4::from_translation(Vec3::Z));
        a.append(&b);
        assert_eq!(a.vertex_count(), 8);
        assert_eq!(a.face_count(), 4);
        assert_eq!(a.faces[2], [4, 5, 6]);
        assert_eq!(a.faces[3], [4, 6, 7]);
        assert!(a.validate().is_ok());
    }

    #[test]
    fn test_clean_merges_coincident_points() {
        // Triangle soup, as loaded from STL: every corner duplicated.
        let soup = TriMesh::new(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2], [3, 4, 5]],
        );
        let clean = soup.clean();
        assert_eq!(clean.vertex_count(), 4);
        assert_eq!(clean.faces, vec![[0, 1, 2], [0, 2, 3]]);
    }

    #[test]
    fn test_clean_merges_signed_zero() {
        let mesh = TriMesh::new(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::new(-0.0, 0.0, -0.0),
                Vec3::new(0.0, -1.0, 0.0),
            ],
            vec![[0, 1, 2], [3, 4, 1]],
        );
        assert_eq!(mesh.clean().vertex_count(), 4);
    }

    #[test]
    fn test_clean_drops_degenerate_and_unused() {
        let mut mesh = unit_square();
        // Collapsed triangle and an orphan point.
        mesh.vertices.push(Vec3::new(0.0, 0.0, 0.0));
        mesh.vertices.push(Vec3::new(9.0, 9.0, 9.0));
        mesh.faces.push([0, 4, 1]);
        let clean = mesh.clean();
        assert_eq!(clean, unit_square());
    }

    #[test]
    fn test_clean_is_idempotent() {
        let mut mesh = unit_square();
        mesh.append(&unit_square());
        let once = mesh.clean();
        assert_eq!(once.clean(), once);
        assert_eq!(once.vertex_count(), 4);
        assert_eq!(once.face_count(), 4);
    }

    #[test]
    fn test_bounds_include_all_points() {
        let mut mesh = unit_square();
        mesh.vertices.push(Vec3::new(5.0, -1.0, 2.0));
        let bb = mesh.bounds().unwrap();
        assert_eq!(bb.min, Vec3::new(0.0, -1.0, 0.0));
        assert_eq!(bb.max, Vec3::new(5.0, 1.0, 2.0));
    }
}
