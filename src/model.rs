use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::{ImportError, ImportResult};
use crate::math::RawRotation;

/// JMS revision written by the Halo 1 tool set.
pub const JMS_VERSION_HALO_1: &str = "8200";

/// Parent index that marks a root node or an unparented marker.
pub const NO_PARENT: i32 = -1;

/// A bone in the model's skeletal hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    #[serde(default = "no_parent")]
    pub parent_index: i32,
    pub translation: [f32; 3],
    #[serde(default)]
    pub rotation: RawRotation,
}

/// Attachment point used as an anchor for effects and interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub name: String,
    #[serde(default = "no_parent")]
    pub parent_index: i32,
    pub region: usize,
    #[serde(default)]
    pub permutation: usize,
    pub translation: [f32; 3],
    #[serde(default)]
    pub rotation: RawRotation,
    #[serde(default)]
    pub radius: f32,
}

/// Vertex with the two-bone skin influence of the JMS format.
///
/// `bone_0`'s weight is implicit: `1 - bone_1_weight` when `bone_1` is set,
/// otherwise `1.0`. A vertex without `bone_0` is rigid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    #[serde(default)]
    pub uv: Option<[f32; 2]>,
    #[serde(default)]
    pub bone_0: Option<usize>,
    #[serde(default)]
    pub bone_1: Option<usize>,
    #[serde(default)]
    pub bone_1_weight: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triangle {
    pub vertices: [usize; 3],
    pub region: usize,
    #[serde(default)]
    pub permutation: usize,
}

/// Everything the importer reads from one JMS model.
///
/// Region and permutation identifiers on triangles and markers are indices
/// into `regions` and `permutations`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JmsModel {
    pub version: String,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub markers: Vec<Marker>,
    #[serde(default)]
    pub regions: Vec<String>,
    #[serde(default)]
    pub permutations: Vec<String>,
    #[serde(default)]
    pub vertices: Vec<Vertex>,
    #[serde(default)]
    pub triangles: Vec<Triangle>,
}

fn no_parent() -> i32 {
    NO_PARENT
}

impl JmsModel {
    /// Rejects models that were not written as Halo 1 JMS.
    pub fn check_version(&self) -> ImportResult<()> {
        if self.version.trim() != JMS_VERSION_HALO_1 {
            return Err(ImportError::UnsupportedFormatVersion {
                found: self.version.clone(),
                expected: JMS_VERSION_HALO_1.to_string(),
            });
        }

        Ok(())
    }

    pub fn region_name(&self, region: usize) -> String {
        self.regions
            .get(region)
            .cloned()
            .unwrap_or_else(|| format!("region_{region}"))
    }
}

/// Load a model document (the parser's records serialized as JSON).
pub fn load_model_document(path: &Path) -> Result<JmsModel> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read model document: {}", path.display()))?;
    let model: JmsModel = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse model document JSON: {}", path.display()))?;
    Ok(model)
}
