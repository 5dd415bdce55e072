//! Loading dental cast meshes from disk.
//!
//! Scanner exports come as PLY, STL or OBJ. The format is chosen from the
//! file extension (case-insensitive):
//!
//! - **PLY** via `ply-rs`, ASCII or binary. Polygons are fan-triangulated.
//! - **STL** via `stl_io`, ASCII or binary.
//! - **OBJ** via `tobj`, triangulated, all models concatenated.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use glam::Vec3;
use ply_rs::parser::Parser;
use ply_rs::ply::{DefaultElement, Property};

use crate::error::{CoreError, Result};
use crate::mesh::TriMesh;

/// Supported mesh file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshFormat {
    /// Stanford polygon file.
    Ply,
    /// Stereolithography.
    Stl,
    /// Wavefront OBJ.
    Obj,
}

impl MeshFormat {
    /// Determines the format from a path's extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "ply" => Ok(MeshFormat::Ply),
            "stl" => Ok(MeshFormat::Stl),
            "obj" => Ok(MeshFormat::Obj),
            _ => Err(CoreError::UnsupportedFormat(extension)),
        }
    }
}

/// Loads a triangle mesh, choosing the reader from the file extension.
pub fn load_mesh<P: AsRef<Path>>(path: P) -> Result<TriMesh> {
    let path = path.as_ref();
    let format = MeshFormat::from_path(path)?;
    if !path.is_file() {
        return Err(CoreError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let mesh = match format {
        MeshFormat::Ply => load_ply(path)?,
        MeshFormat::Stl => load_stl(path)?,
        MeshFormat::Obj => load_obj(path)?,
    };
    mesh.validate()?;

    log::debug!(
        "loaded {} ({} vertices, {} faces)",
        path.display(),
        mesh.vertex_count(),
        mesh.face_count()
    );
    Ok(mesh)
}

fn load_ply(path: &Path) -> Result<TriMesh> {
    let mut reader = BufReader::new(File::open(path)?);
    let parser = Parser::<DefaultElement>::new();
    let ply = parser
        .read_ply(&mut reader)
        .map_err(|e| CoreError::invalid_content(path, format!("failed to parse PLY: {e}")))?;

    let mut mesh = TriMesh::default();

    if let Some(vertex_elements) = ply.payload.get("vertex") {
        mesh.vertices.reserve(vertex_elements.len());
        for element in vertex_elements {
            let coord = |key: &str| {
                float_property(element, key).ok_or_else(|| {
                    CoreError::invalid_content(path, format!("vertex is missing '{key}'"))
                })
            };
            mesh.vertices
                .push(Vec3::new(coord("x")?, coord("y")?, coord("z")?));
        }
    }

    if let Some(face_elements) = ply.payload.get("face") {
        mesh.faces.reserve(face_elements.len());
        for element in face_elements {
            let indices = index_list(element)
                .ok_or_else(|| CoreError::invalid_content(path, "face has no vertex index list"))?;
            // Fan triangulation for polygons with more than three corners.
            for i in 1..indices.len().saturating_sub(1) {
                mesh.faces.push([indices[0], indices[i], indices[i + 1]]);
            }
        }
    }

    Ok(mesh)
}

fn float_property(element: &DefaultElement, key: &str) -> Option<f32> {
    match element.get(key)? {
        Property::Float(v) => Some(*v),
        #[allow(clippy::cast_possible_truncation)]
        Property::Double(v) => Some(*v as f32),
        _ => None,
    }
}

#[allow(clippy::cast_sign_loss)]
fn index_list(element: &DefaultElement) -> Option<Vec<u32>> {
    ["vertex_indices", "vertex_index"]
        .iter()
        .find_map(|key| match element.get(*key)? {
            Property::ListInt(v) => Some(v.iter().map(|&i| i as u32).collect()),
            Property::ListUInt(v) => Some(v.clone()),
            Property::ListShort(v) => Some(v.iter().map(|&i| i as u32).collect()),
            Property::ListUShort(v) => Some(v.iter().map(|&i| u32::from(i)).collect()),
            Property::ListChar(v) => Some(v.iter().map(|&i| i as u32).collect()),
            Property::ListUChar(v) => Some(v.iter().map(|&i| u32::from(i)).collect()),
            _ => None,
        })
}

fn load_stl(path: &Path) -> Result<TriMesh> {
    let mut reader = BufReader::new(File::open(path)?);
    let stl = stl_io::read_stl(&mut reader)
        .map_err(|e| CoreError::invalid_content(path, format!("failed to parse STL: {e}")))?;

    let vertices = stl
        .vertices
        .iter()
        .map(|v| Vec3::new(v[0], v[1], v[2]))
        .collect();
    #[allow(clippy::cast_possible_truncation)]
    let faces = stl
        .faces
        .iter()
        .map(|f| f.vertices.map(|i| i as u32))
        .collect();

    Ok(TriMesh::new(vertices, faces))
}

fn load_obj(path: &Path) -> Result<TriMesh> {
    let (models, _materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )
    .map_err(|e| CoreError::invalid_content(path, format!("failed to parse OBJ: {e}")))?;

    let mut mesh = TriMesh::default();
    for model in &models {
        let part = TriMesh::new(
            model
                .mesh
                .positions
                .chunks_exact(3)
                .map(|p| Vec3::new(p[0], p[1], p[2]))
                .collect(),
            model
                .mesh
                .indices
                .chunks_exact(3)
                .map(|t| [t[0], t[1], t[2]])
                .collect(),
        );
        mesh.append(&part);
    }
    Ok(mesh)
}
