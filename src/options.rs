use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::{ImportError, ImportResult};
use crate::math::QuaternionConvention;
use crate::region::Selection;

/// Unit conversion applied to every translation (and marker radius).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum ScalePreset {
    /// Meters. One JMS unit is a tenth of a foot.
    #[default]
    Metric,
    /// Platform-native scale, 100x the JMS unit.
    Native,
    /// JMS units as stored.
    Identity,
    /// Caller-supplied multiplier.
    Custom(f32),
}

impl ScalePreset {
    pub const METRIC_FACTOR: f32 = 0.03048;
    pub const NATIVE_FACTOR: f32 = 100.0;

    /// Multiplier for this preset.
    ///
    /// # Errors
    ///
    /// `ImportError::InvalidScale` for a custom factor that is not finite and
    /// positive.
    pub fn factor(self) -> ImportResult<f32> {
        let factor = match self {
            ScalePreset::Metric => Self::METRIC_FACTOR,
            ScalePreset::Native => Self::NATIVE_FACTOR,
            ScalePreset::Identity => 1.0,
            ScalePreset::Custom(factor) => factor,
        };

        if !factor.is_finite() || factor <= 0.0 {
            return Err(ImportError::InvalidScale(factor));
        }
        Ok(factor)
    }
}

/// Import options shared by the library entry point and the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
    pub scale: ScalePreset,
    pub quaternion_convention: QuaternionConvention,
    /// Build the armature. Mesh weights refer to node indices either way.
    pub import_nodes: bool,
    /// Draw size for bones.
    pub node_size: f32,
    /// Draw size for markers when `import_radius` is off.
    pub marker_size: f32,
    /// Use each marker's radius as its draw size.
    pub import_radius: bool,
    /// Length given to bones without a usable child, in scaled units.
    pub leaf_bone_length: f32,
    pub selection: Selection,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            scale: ScalePreset::Metric,
            quaternion_convention: QuaternionConvention::NegateScalar,
            import_nodes: true,
            node_size: 0.02,
            marker_size: 0.01,
            import_radius: false,
            leaf_bone_length: 0.02,
            selection: Selection::default(),
        }
    }
}

/// Save import options to a JSON file.
pub fn save_import_settings(path: &Path, options: &ImportOptions) -> Result<()> {
    let content = serde_json::to_string_pretty(options)
        .context("failed to serialize import settings as JSON")?;
    fs::write(path, content)
        .with_context(|| format!("failed to save import settings: {}", path.display()))?;
    Ok(())
}

/// Load import options from a JSON file. Missing fields take their defaults.
pub fn load_import_settings(path: &Path) -> Result<ImportOptions> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to load import settings: {}", path.display()))?;
    let options: ImportOptions =
        serde_json::from_str(&content).context("failed to parse import settings JSON")?;
    Ok(options)
}
