use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::error::{ImportError, ImportResult};
use crate::reduce::ReducedMesh;

/// Vertex groups: bone index → `(compacted vertex index, weight)` pairs,
/// ordered by vertex index.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SkinWeights {
    pub groups: BTreeMap<usize, Vec<(usize, f32)>>,
}

impl SkinWeights {
    pub fn weights_for_bone(&self, bone: usize) -> &[(usize, f32)] {
        self.groups.get(&bone).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Sum of the weights a vertex receives across all bones.
    pub fn total_weight(&self, vertex: usize) -> f32 {
        self.groups
            .values()
            .flatten()
            .filter(|(index, _)| *index == vertex)
            .map(|(_, weight)| weight)
            .sum()
    }

    pub fn entry_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }
}

/// Distributes each vertex's two-bone influence over per-bone vertex groups.
///
/// A vertex without `bone_0` is rigid and produces nothing. With only
/// `bone_0` it goes fully to that bone; with both bones it is split
/// `1 - bone_1_weight` / `bone_1_weight`. Repeated (bone, vertex) pairs add up.
///
/// # Errors
///
/// `ImportError::InvalidWeight`, naming the source vertex index, when the
/// weight is outside `[0, 1]`, a bone index is not below `bone_count`, or
/// `bone_1` is set without `bone_0`.
pub fn assign_skin_weights(mesh: &ReducedMesh, bone_count: usize) -> ImportResult<SkinWeights> {
    let mut accumulated = BTreeMap::<usize, BTreeMap<usize, f32>>::new();

    for (new_index, vertex) in mesh.vertices.iter().enumerate() {
        let source_index = mesh.source_indices.get(new_index).copied().unwrap_or(new_index);
        let invalid = |reason: String| ImportError::InvalidWeight {
            vertex: source_index,
            reason,
        };

        let Some(bone_0) = vertex.bone_0 else {
            if let Some(bone_1) = vertex.bone_1 {
                return Err(invalid(format!(
                    "secondary bone {bone_1} is set without a primary bone"
                )));
            }
            continue;
        };

        if !(0.0..=1.0).contains(&vertex.bone_1_weight) {
            return Err(invalid(format!(
                "weight {} is outside [0, 1]",
                vertex.bone_1_weight
            )));
        }

        let contributions = match vertex.bone_1 {
            Some(bone_1) => vec![
                (bone_0, 1.0 - vertex.bone_1_weight),
                (bone_1, vertex.bone_1_weight),
            ],
            None => vec![(bone_0, 1.0)],
        };

        for (bone, weight) in contributions {
            if bone >= bone_count {
                return Err(invalid(format!(
                    "bone {bone} is out of range (bone count: {bone_count})"
                )));
            }
            *accumulated
                .entry(bone)
                .or_default()
                .entry(new_index)
                .or_insert(0.0) += weight;
        }
    }

    let groups: BTreeMap<usize, Vec<(usize, f32)>> = accumulated
        .into_iter()
        .map(|(bone, vertices)| (bone, vertices.into_iter().collect()))
        .collect();

    debug!(
        vertices = mesh.vertices.len(),
        bones_used = groups.len(),
        "assigned skin weights"
    );

    Ok(SkinWeights { groups })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Vertex;
    use crate::reduce::reduce_vertices;

    fn skinned(bone_0: Option<usize>, bone_1: Option<usize>, bone_1_weight: f32) -> Vertex {
        Vertex {
            position: [0.0; 3],
            normal: [0.0, 0.0, 1.0],
            uv: None,
            bone_0,
            bone_1,
            bone_1_weight,
        }
    }

    fn mesh_of(vertices: Vec<Vertex>) -> ReducedMesh {
        let count = vertices.len();
        ReducedMesh {
            vertices,
            triangles: Vec::new(),
            old_to_new: (0..count).map(Some).collect(),
            source_indices: (0..count).collect(),
        }
    }

    #[test]
    fn given_two_bone_vertex_when_assigning_then_weights_sum_to_one() {
        let mesh = mesh_of(vec![skinned(Some(0), Some(2), 0.3)]);

        let weights = assign_skin_weights(&mesh, 3).expect("assign");

        assert_eq!(weights.weights_for_bone(0).len(), 1);
        assert!((weights.weights_for_bone(0)[0].1 - 0.7).abs() < 1e-6);
        assert!((weights.weights_for_bone(2)[0].1 - 0.3).abs() < 1e-6);
        assert!((weights.total_weight(0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn given_single_bone_vertex_when_assigning_then_full_weight_goes_to_primary() {
        let mesh = mesh_of(vec![skinned(Some(1), None, 0.0)]);

        let weights = assign_skin_weights(&mesh, 2).expect("assign");

        assert_eq!(weights.weights_for_bone(1), &[(0, 1.0)]);
        assert_eq!(weights.entry_count(), 1);
    }

    #[test]
    fn given_rigid_vertex_when_assigning_then_no_entries_are_emitted() {
        let mesh = mesh_of(vec![skinned(None, None, 0.0)]);

        let weights = assign_skin_weights(&mesh, 1).expect("assign");

        assert_eq!(weights.entry_count(), 0);
        assert!(weights.groups.is_empty());
    }

    #[test]
    fn given_same_bone_twice_when_assigning_then_contributions_add() {
        let mesh = mesh_of(vec![skinned(Some(1), Some(1), 0.25)]);

        let weights = assign_skin_weights(&mesh, 2).expect("assign");

        assert_eq!(weights.weights_for_bone(1).len(), 1);
        assert!((weights.weights_for_bone(1)[0].1 - 1.0).abs() < 1e-6);
    }

    #[test]
    fn given_reduced_mesh_when_assigning_then_compacted_indices_are_used() {
        let vertices = vec![
            skinned(Some(0), None, 0.0),
            skinned(Some(1), None, 0.0),
            skinned(Some(2), None, 0.0),
        ];
        let mesh = reduce_vertices(&vertices, &[[2, 2, 1]]).expect("reduce");

        let weights = assign_skin_weights(&mesh, 3).expect("assign");

        assert!(weights.weights_for_bone(0).is_empty());
        assert_eq!(weights.weights_for_bone(2), &[(0, 1.0)]);
        assert_eq!(weights.weights_for_bone(1), &[(1, 1.0)]);
    }

    #[test]
    fn given_out_of_range_weight_when_assigning_then_source_vertex_is_reported() {
        let vertices = vec![skinned(Some(0), None, 0.0), skinned(Some(0), Some(1), 1.5)];
        let mesh = reduce_vertices(&vertices, &[[1, 0, 1]]).expect("reduce");

        let err = assign_skin_weights(&mesh, 2).unwrap_err();

        assert!(matches!(err, ImportError::InvalidWeight { vertex: 1, .. }));
    }

    #[test]
    fn given_out_of_range_bone_or_orphan_secondary_when_assigning_then_weight_is_invalid() {
        let out_of_range = mesh_of(vec![skinned(Some(0), Some(4), 0.5)]);
        let orphan = mesh_of(vec![skinned(None, Some(0), 0.5)]);
        let not_a_number = mesh_of(vec![skinned(Some(0), Some(0), f32::NAN)]);

        assert!(matches!(
            assign_skin_weights(&out_of_range, 4),
            Err(ImportError::InvalidWeight { vertex: 0, .. })
        ));
        assert!(matches!(
            assign_skin_weights(&orphan, 4),
            Err(ImportError::InvalidWeight { vertex: 0, .. })
        ));
        assert!(matches!(
            assign_skin_weights(&not_a_number, 4),
            Err(ImportError::InvalidWeight { vertex: 0, .. })
        ));
    }
}
