use tracing::debug;

use crate::error::{ImportError, ImportResult};
use crate::math::{AbsoluteTransform, QuaternionConvention};
use crate::model::{NO_PARENT, Node};

/// Reads a node's parent index, enforcing topological order.
///
/// Returns `None` for the root sentinel.
pub(crate) fn parent_of(node_index: usize, parent_index: i32) -> ImportResult<Option<usize>> {
    if parent_index == NO_PARENT {
        return Ok(None);
    }

    let malformed = ImportError::MalformedHierarchy {
        node: node_index,
        parent: parent_index,
    };
    let parent = usize::try_from(parent_index).map_err(|_| malformed.clone())?;
    if parent >= node_index {
        return Err(malformed);
    }

    Ok(Some(parent))
}

/// Resolves every node's transform in model root space.
///
/// Nodes are processed in index order. Because a parent always precedes its
/// children, the parent's absolute transform is available when a child is
/// reached and a single forward pass is enough.
///
/// # Arguments
///
/// * `nodes` - Node records in file order.
/// * `scale` - Uniform multiplier applied to every local translation.
/// * `convention` - How raw record quaternions are read.
///
/// # Returns
///
/// One absolute transform per node, indexed like `nodes`.
///
/// # Errors
///
/// `ImportError::MalformedHierarchy` when a parent index points at the node
/// itself, at a later node, or is negative but not `-1`.
pub fn resolve_hierarchy(
    nodes: &[Node],
    scale: f32,
    convention: QuaternionConvention,
) -> ImportResult<Vec<AbsoluteTransform>> {
    let mut absolute = Vec::<AbsoluteTransform>::with_capacity(nodes.len());

    for (index, node) in nodes.iter().enumerate() {
        let local =
            AbsoluteTransform::from_record(node.translation, node.rotation, scale, convention);

        let resolved = match parent_of(index, node.parent_index)? {
            Some(parent) => absolute[parent].compose(&local),
            None => local,
        };
        absolute.push(resolved);
    }

    debug!(node_count = nodes.len(), scale, "resolved node hierarchy");
    Ok(absolute)
}

/// Display length of every bone, in scaled units.
///
/// A bone reaches to its first child (lowest child index). Leaves, and bones
/// whose first child sits on top of them, get `leaf_length`.
///
/// `nodes` must already have passed [`resolve_hierarchy`]; entries with an
/// invalid parent are ignored here.
pub fn bone_lengths(
    nodes: &[Node],
    transforms: &[AbsoluteTransform],
    leaf_length: f32,
) -> Vec<f32> {
    let mut first_child = vec![None::<usize>; nodes.len()];
    for (index, node) in nodes.iter().enumerate() {
        let Ok(Some(parent)) = parent_of(index, node.parent_index) else {
            continue;
        };
        if first_child[parent].is_none() {
            first_child[parent] = Some(index);
        }
    }

    first_child
        .into_iter()
        .enumerate()
        .map(|(index, child)| {
            let length = child
                .and_then(|child| {
                    Some(transforms.get(index)?.distance_to(transforms.get(child)?))
                })
                .unwrap_or(0.0);
            if length > f32::EPSILON {
                length
            } else {
                leaf_length
            }
        })
        .collect()
}
