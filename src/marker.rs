use std::f32::consts::FRAC_PI_2;

use nalgebra::{UnitQuaternion, Vector3};
use serde::Serialize;

use crate::error::{ImportError, ImportResult, Referrer};
use crate::math::{AbsoluteTransform, QuaternionConvention};
use crate::model::{Marker, NO_PARENT};

/// Prefix given to marker objects in the produced scene.
pub const MARKER_SYMBOL: &str = "#";

/// Where a marker ends up in the scene.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerPlacement {
    /// Position of the marker in `markers`.
    pub index: usize,
    pub name: String,
    /// Parent node, when the marker has one.
    pub parent: Option<usize>,
    pub region: usize,
    pub permutation: usize,
    /// Placement in model root space.
    pub absolute: AbsoluteTransform,
    /// Local transform relative to the end of the parent bone. Identical to
    /// `absolute` for markers without a parent.
    pub attachment: AbsoluteTransform,
    /// Marker radius in scaled units.
    pub radius: f32,
    /// Size to draw the marker with.
    pub display_size: f32,
}

/// Marker size settings taken from the import options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerDisplay {
    pub marker_size: f32,
    pub import_radius: bool,
}

/// JMS places markers relative to the start of their parent node, while the
/// scene attaches children to the end of a bone whose length runs along +Y.
/// The bridge rotates the marker a quarter turn about X and pulls it back by
/// the parent bone's length.
fn bone_end_bridge(bone_length: f32) -> AbsoluteTransform {
    AbsoluteTransform::new(
        Vector3::new(0.0, -bone_length, 0.0),
        UnitQuaternion::from_axis_angle(&Vector3::x_axis(), FRAC_PI_2),
    )
}

/// Resolves one marker against the resolved node hierarchy.
///
/// # Arguments
///
/// * `index` - Position of the marker in the model's marker list.
/// * `marker` - The marker record.
/// * `transforms` - Absolute node transforms from `resolve_hierarchy`.
/// * `bone_lengths` - Bone lengths from `bone_lengths`, indexed like nodes.
///   A parent is only valid when it has both a transform and a length.
/// * `scale` - Uniform multiplier applied to translations and radius.
/// * `convention` - How the raw marker quaternion is read.
/// * `display` - Marker display size policy.
///
/// # Errors
///
/// `ImportError::DanglingIndex` when the parent index is neither `-1` nor an
/// index covered by both `transforms` and `bone_lengths`.
pub fn place_marker(
    index: usize,
    marker: &Marker,
    transforms: &[AbsoluteTransform],
    bone_lengths: &[f32],
    scale: f32,
    convention: QuaternionConvention,
    display: MarkerDisplay,
) -> ImportResult<MarkerPlacement> {
    let available = transforms.len().min(bone_lengths.len());
    let parent = if marker.parent_index == NO_PARENT {
        None
    } else {
        let parent = usize::try_from(marker.parent_index)
            .ok()
            .filter(|parent| *parent < available)
            .ok_or(ImportError::DanglingIndex {
                referrer: Referrer::Marker(index),
                index: i64::from(marker.parent_index),
                available,
            })?;
        Some(parent)
    };

    let local =
        AbsoluteTransform::from_record(marker.translation, marker.rotation, scale, convention);

    let (absolute, attachment) = match parent {
        Some(parent) => {
            (
                transforms[parent].compose(&local),
                bone_end_bridge(bone_lengths[parent]).compose(&local),
            )
        }
        None => (local, local),
    };

    let radius = marker.radius * scale;

    Ok(MarkerPlacement {
        index,
        name: format!("{MARKER_SYMBOL}{}", marker.name),
        parent,
        region: marker.region,
        permutation: marker.permutation,
        absolute,
        attachment,
        radius,
        display_size: if display.import_radius {
            radius
        } else {
            display.marker_size
        },
    })
}
