use serde::Serialize;
use tracing::debug;

use crate::error::{ImportError, ImportResult, Referrer};
use crate::model::Vertex;

/// Mesh left after dropping the vertices no triangle refers to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReducedMesh {
    /// Referenced vertices in first-encounter order.
    pub vertices: Vec<Vertex>,
    /// Input triangles re-indexed into `vertices`.
    pub triangles: Vec<[usize; 3]>,
    /// Source vertex index → compacted index; `None` for dropped vertices.
    pub old_to_new: Vec<Option<usize>>,
    /// Compacted index → source vertex index.
    pub source_indices: Vec<usize>,
}

impl ReducedMesh {
    /// Multiplies every vertex position by `scale`.
    pub fn scale_positions(&mut self, scale: f32) {
        for vertex in &mut self.vertices {
            for component in &mut vertex.position {
                *component *= scale;
            }
        }
    }
}

/// Drops unreferenced vertices and re-indexes the triangles.
///
/// Vertices are numbered in the order they are first met while walking the
/// triangles corner by corner, so the output only depends on the input order.
/// Two vertices with identical attributes stay distinct; only index references
/// are merged.
///
/// # Errors
///
/// `ImportError::DanglingIndex` when any corner points past `vertices`. No
/// partial mesh is returned in that case.
pub fn reduce_vertices(vertices: &[Vertex], triangles: &[[usize; 3]]) -> ImportResult<ReducedMesh> {
    let mut old_to_new = vec![None::<usize>; vertices.len()];
    let mut source_indices = Vec::<usize>::new();
    let mut remapped = Vec::<[usize; 3]>::with_capacity(triangles.len());

    for (triangle_index, corners) in triangles.iter().enumerate() {
        let mut new_corners = [0usize; 3];
        for (slot, &old_index) in corners.iter().enumerate() {
            let Some(entry) = old_to_new.get_mut(old_index) else {
                return Err(ImportError::DanglingIndex {
                    referrer: Referrer::Triangle(triangle_index),
                    index: i64::try_from(old_index).unwrap_or(i64::MAX),
                    available: vertices.len(),
                });
            };

            new_corners[slot] = *entry.get_or_insert_with(|| {
                source_indices.push(old_index);
                source_indices.len() - 1
            });
        }
        remapped.push(new_corners);
    }

    let compacted: Vec<Vertex> = source_indices
        .iter()
        .map(|&old_index| vertices[old_index].clone())
        .collect();

    debug!(
        vertices_in = vertices.len(),
        vertices_out = compacted.len(),
        triangles = remapped.len(),
        "reduced vertices"
    );

    Ok(ReducedMesh {
        vertices: compacted,
        triangles: remapped,
        old_to_new,
        source_indices,
    })
}

/// Per-corner ("loop") attributes, in triangle order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoopAttributes {
    pub normals: Vec<[f32; 3]>,
    /// Corners of vertices without a UV get `[0.0, 0.0]`.
    pub uvs: Vec<[f32; 2]>,
    /// True when at least one referenced vertex carried a UV.
    pub has_uvs: bool,
}

pub fn loop_attributes(mesh: &ReducedMesh) -> LoopAttributes {
    let corner_count = mesh.triangles.len() * 3;
    let mut normals = Vec::with_capacity(corner_count);
    let mut uvs = Vec::with_capacity(corner_count);

    for corner in mesh.triangles.iter().flatten() {
        let vertex = &mesh.vertices[*corner];
        normals.push(vertex.normal);
        uvs.push(vertex.uv.unwrap_or([0.0, 0.0]));
    }

    LoopAttributes {
        normals,
        uvs,
        has_uvs: mesh.vertices.iter().any(|vertex| vertex.uv.is_some()),
    }
}
