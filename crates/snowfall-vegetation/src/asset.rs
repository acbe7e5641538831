//! Loading tree geometry from disk.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use glam::Vec3;

use crate::mesh::{MeshData, MeshVertex};

/// Errors produced while loading a mesh file.
#[derive(Debug, thiserror::Error)]
pub enum MeshLoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid OBJ data: {0}")]
    Malformed(#[source] tobj::LoadError),
    #[error("mesh contains no triangles")]
    Empty,
}

/// Anything that can turn a path into mesh geometry.
pub trait MeshSource {
    fn load(&self, path: &Path) -> Result<MeshData, MeshLoadError>;
}

/// Reads Wavefront OBJ files through `tobj`. Every object in the file is
/// merged into one triangulated mesh; materials are ignored.
#[derive(Clone, Copy, Debug, Default)]
pub struct ObjMeshSource;

impl MeshSource for ObjMeshSource {
    fn load(&self, path: &Path) -> Result<MeshData, MeshLoadError> {
        let file = File::open(path).map_err(|source| MeshLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        read_obj(&mut BufReader::new(file))
    }
}

/// Parse OBJ text into an indexed mesh.
pub fn parse_obj(text: &str) -> Result<MeshData, MeshLoadError> {
    read_obj(&mut text.as_bytes())
}

fn read_obj(reader: &mut impl BufRead) -> Result<MeshData, MeshLoadError> {
    let (models, _materials) = tobj::load_obj_buf(reader, &tobj::GPU_LOAD_OPTIONS, |_| {
        Err(tobj::LoadError::OpenFileFailed)
    })
    .map_err(MeshLoadError::Malformed)?;

    let mut mesh = MeshData::default();
    for model in &models {
        append_model(&mut mesh, &model.mesh);
    }

    if mesh.indices.is_empty() {
        return Err(MeshLoadError::Empty);
    }
    Ok(mesh)
}

/// Append one `tobj` mesh, recomputing normals when the file has none.
fn append_model(out: &mut MeshData, mesh: &tobj::Mesh) {
    let positions: Vec<Vec3> = mesh
        .positions
        .chunks_exact(3)
        .map(|p| Vec3::new(p[0], p[1], p[2]))
        .collect();

    let normals: Vec<Vec3> = if mesh.normals.len() == mesh.positions.len() {
        mesh.normals
            .chunks_exact(3)
            .map(|n| Vec3::new(n[0], n[1], n[2]))
            .collect()
    } else {
        let mut normals = vec![Vec3::ZERO; positions.len()];
        for tri in mesh.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| positions[i as usize]);
            let face = (b - a).cross(c - a);
            for &i in tri {
                normals[i as usize] += face;
            }
        }
        normals
    };

    let base = out.vertices.len() as u32;
    out.vertices
        .extend(positions.iter().zip(&normals).map(|(p, n)| MeshVertex {
            position: p.to_array(),
            normal: n.normalize_or(Vec3::Y).to_array(),
        }));
    out.indices.extend(mesh.indices.iter().map(|&i| base + i));
}
