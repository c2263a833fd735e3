use std::path::Path;

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{ImportError, ImportResult, Referrer};
use crate::hierarchy::{bone_lengths, parent_of, resolve_hierarchy};
use crate::marker::{MarkerDisplay, MarkerPlacement, place_marker};
use crate::math::AbsoluteTransform;
use crate::model::{JmsModel, load_model_document};
use crate::options::ImportOptions;
use crate::reduce::{LoopAttributes, ReducedMesh, loop_attributes, reduce_vertices};
use crate::region::{ResolvedSelection, filter_markers};
use crate::skinning::{SkinWeights, assign_skin_weights};

/// Prefix given to bone names in the produced scene.
pub const NODE_SYMBOL: &str = "@";

// ─── Scene types ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bone {
    pub index: usize,
    pub name: String,
    pub parent: Option<usize>,
    /// Bone head in model root space.
    pub transform: AbsoluteTransform,
    pub length: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Armature {
    pub bones: Vec<Bone>,
    pub node_size: f32,
}

/// Renderable mesh for one region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionMesh {
    pub region: usize,
    pub name: String,
    /// Compacted mesh; positions are already scaled.
    pub mesh: ReducedMesh,
    pub loops: LoopAttributes,
    pub weights: SkinWeights,
}

/// Everything a scene builder needs to recreate the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportedScene {
    pub armature: Option<Armature>,
    pub meshes: Vec<RegionMesh>,
    pub markers: Vec<MarkerPlacement>,
}

/// Summary printed by the CLI after an import.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportReport {
    pub version: String,
    pub scale_factor: f32,
    pub bone_count: usize,
    pub mesh_count: usize,
    pub source_vertices: usize,
    pub imported_vertices: usize,
    pub imported_triangles: usize,
    pub marker_count: usize,
    pub weight_entries: usize,
}

// ─── Public API ───────────────────────────────────────────────────────────────

/// Import a model into a scene description.
///
/// The node hierarchy is resolved once and shared by the marker placement.
/// Region meshes are independent and built in parallel. Results are gathered
/// in region order, so the lowest failing region aborts the import no matter
/// how the work was scheduled.
///
/// # Errors
///
/// Any [`ImportError`] raised by the version check, the hierarchy, the vertex
/// reduction, the skin weights or the marker placement.
pub fn import_model(model: &JmsModel, options: &ImportOptions) -> ImportResult<ImportedScene> {
    model.check_version()?;
    let scale = options.scale.factor()?;
    let convention = options.quaternion_convention;

    let transforms = resolve_hierarchy(&model.nodes, scale, convention)?;
    let lengths = bone_lengths(&model.nodes, &transforms, options.leaf_bone_length);

    let armature = options.import_nodes.then(|| Armature {
        bones: build_bones(model, &transforms, &lengths),
        node_size: options.node_size,
    });

    let selection = options.selection.resolve(model);
    debug!(
        regions = selection.regions.len(),
        permutations = selection.permutations.len(),
        "resolved selection"
    );

    let regions: Vec<usize> = selection.regions.iter().copied().collect();
    let meshes = regions
        .par_iter()
        .map(|&region| build_region_mesh(model, &selection, region, scale))
        .collect::<Vec<ImportResult<Option<RegionMesh>>>>()
        .into_iter()
        .collect::<ImportResult<Vec<Option<RegionMesh>>>>()?
        .into_iter()
        .flatten()
        .collect::<Vec<RegionMesh>>();

    let display = MarkerDisplay {
        marker_size: options.marker_size,
        import_radius: options.import_radius,
    };
    let markers = filter_markers(&model.markers, &selection)
        .into_iter()
        .map(|(index, marker)| {
            place_marker(
                index,
                marker,
                &transforms,
                &lengths,
                scale,
                convention,
                display,
            )
        })
        .collect::<ImportResult<Vec<MarkerPlacement>>>()?;

    info!(
        bones = model.nodes.len(),
        meshes = meshes.len(),
        markers = markers.len(),
        "model imported"
    );

    Ok(ImportedScene {
        armature,
        meshes,
        markers,
    })
}

/// Load a model document from disk and import it.
pub fn import_model_document(
    path: &Path,
    options: &ImportOptions,
) -> Result<(ImportedScene, ImportReport)> {
    let model = load_model_document(path)?;
    let scene = import_model(&model, options)
        .with_context(|| format!("failed to import model: {}", path.display()))?;
    let report = scene.report(&model, options)?;
    Ok((scene, report))
}

impl ImportedScene {
    pub fn report(&self, model: &JmsModel, options: &ImportOptions) -> ImportResult<ImportReport> {
        Ok(ImportReport {
            version: model.version.clone(),
            scale_factor: options.scale.factor()?,
            bone_count: self
                .armature
                .as_ref()
                .map(|armature| armature.bones.len())
                .unwrap_or(0),
            mesh_count: self.meshes.len(),
            source_vertices: model.vertices.len(),
            imported_vertices: self.meshes.iter().map(|mesh| mesh.mesh.vertices.len()).sum(),
            imported_triangles: self.meshes.iter().map(|mesh| mesh.mesh.triangles.len()).sum(),
            marker_count: self.markers.len(),
            weight_entries: self
                .meshes
                .iter()
                .map(|mesh| mesh.weights.entry_count())
                .sum(),
        })
    }
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

fn build_bones(model: &JmsModel, transforms: &[AbsoluteTransform], lengths: &[f32]) -> Vec<Bone> {
    model
        .nodes
        .iter()
        .enumerate()
        .map(|(index, node)| Bone {
            index,
            name: format!("{NODE_SYMBOL}{}", node.name),
            // Already validated by resolve_hierarchy.
            parent: parent_of(index, node.parent_index).ok().flatten(),
            transform: transforms[index],
            length: lengths[index],
        })
        .collect()
}

fn build_region_mesh(
    model: &JmsModel,
    selection: &ResolvedSelection,
    region: usize,
    scale: f32,
) -> ImportResult<Option<RegionMesh>> {
    let triangles = selection.triangles_for_region(&model.triangles, region);
    if triangles.is_empty() {
        warn!(region, "selected region has no triangles; skipped");
        return Ok(None);
    }

    let corners: Vec<[usize; 3]> = triangles.iter().map(|triangle| triangle.vertices).collect();
    let mut mesh = reduce_vertices(&model.vertices, &corners)
        .map_err(|err| locate_triangle(err, model, selection, region))?;
    let weights = assign_skin_weights(&mesh, model.nodes.len())?;
    let loops = loop_attributes(&mesh);
    mesh.scale_positions(scale);

    Ok(Some(RegionMesh {
        region,
        name: model.region_name(region),
        mesh,
        loops,
        weights,
    }))
}

/// Rewrites a dangling triangle reference from its position in the region's
/// filtered list to its position in the model.
fn locate_triangle(
    err: ImportError,
    model: &JmsModel,
    selection: &ResolvedSelection,
    region: usize,
) -> ImportError {
    let ImportError::DanglingIndex {
        referrer: Referrer::Triangle(filtered_index),
        index,
        available,
    } = err
    else {
        return err;
    };

    let original = model
        .triangles
        .iter()
        .enumerate()
        .filter(|(_, triangle)| {
            triangle.region == region && selection.permutations.contains(&triangle.permutation)
        })
        .nth(filtered_index)
        .map(|(original, _)| original)
        .unwrap_or(filtered_index);

    ImportError::DanglingIndex {
        referrer: Referrer::Triangle(original),
        index,
        available,
    }
}
