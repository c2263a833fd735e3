use nalgebra::{Isometry3, Matrix4, Quaternion, Translation3, Unit, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// Quaternion exactly as stored in a JMS record (`i, j, k, w`).
///
/// The default is the JMS identity, which carries `w = -1` because of the
/// scalar negation applied by [`QuaternionConvention::NegateScalar`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawRotation {
    pub i: f32,
    pub j: f32,
    pub k: f32,
    pub w: f32,
}

impl Default for RawRotation {
    fn default() -> Self {
        Self {
            i: 0.0,
            j: 0.0,
            k: 0.0,
            w: -1.0,
        }
    }
}

/// How a raw JMS quaternion maps onto a scene rotation.
///
/// JMS data is written with the opposite handedness for the scalar part, so
/// the importer negates `w` before use. Some older tool revisions wrote data
/// without that flip; `AsIs` exists to read those files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QuaternionConvention {
    #[default]
    NegateScalar,
    AsIs,
}

impl QuaternionConvention {
    /// Converts a raw record rotation into a unit quaternion.
    ///
    /// A degenerate (zero length) quaternion yields the identity rotation.
    pub fn to_rotation(self, raw: RawRotation) -> UnitQuaternion<f32> {
        let w = match self {
            QuaternionConvention::NegateScalar => -raw.w,
            QuaternionConvention::AsIs => raw.w,
        };

        Unit::try_new(Quaternion::new(w, raw.i, raw.j, raw.k), f32::EPSILON)
            .unwrap_or_else(UnitQuaternion::identity)
    }

    /// Inverse of [`Self::to_rotation`]: writes a rotation back in record form.
    pub fn to_raw(self, rotation: &UnitQuaternion<f32>) -> RawRotation {
        let q = rotation.quaternion();
        let w = match self {
            QuaternionConvention::NegateScalar => -q.w,
            QuaternionConvention::AsIs => q.w,
        };

        RawRotation {
            i: q.i,
            j: q.j,
            k: q.k,
            w,
        }
    }
}

/// Position and orientation of a node or marker.
///
/// Used both for parent-relative (local) transforms and for transforms in the
/// model's root space; [`AbsoluteTransform::compose`] turns the former into the
/// latter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AbsoluteTransform {
    pub translation: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
}

impl Default for AbsoluteTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl AbsoluteTransform {
    pub fn new(translation: Vector3<f32>, rotation: UnitQuaternion<f32>) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    pub fn identity() -> Self {
        Self::new(Vector3::zeros(), UnitQuaternion::identity())
    }

    /// Builds a local transform from raw record fields.
    ///
    /// # Arguments
    ///
    /// * `translation` - Record translation in JMS units.
    /// * `rotation` - Record rotation in raw `i, j, k, w` form.
    /// * `scale` - Uniform multiplier applied to the translation.
    /// * `convention` - Quaternion convention used to read `rotation`.
    pub fn from_record(
        translation: [f32; 3],
        rotation: RawRotation,
        scale: f32,
        convention: QuaternionConvention,
    ) -> Self {
        Self::new(
            Vector3::from(translation) * scale,
            convention.to_rotation(rotation),
        )
    }

    /// Places `local`, expressed in this transform's space, into the space
    /// this transform is expressed in.
    ///
    /// Rotation composes as `self.rotation * local.rotation`; the local
    /// translation is rotated by the parent rotation before it is added.
    pub fn compose(&self, local: &AbsoluteTransform) -> AbsoluteTransform {
        AbsoluteTransform {
            translation: self.translation + self.rotation.transform_vector(&local.translation),
            rotation: self.rotation * local.rotation,
        }
    }

    pub fn inverse(&self) -> AbsoluteTransform {
        let rotation = self.rotation.inverse();
        AbsoluteTransform {
            translation: -rotation.transform_vector(&self.translation),
            rotation,
        }
    }

    pub fn rotate(&self, vector: &Vector3<f32>) -> Vector3<f32> {
        self.rotation.transform_vector(vector)
    }

    pub fn transform_point(&self, point: &Vector3<f32>) -> Vector3<f32> {
        self.translation + self.rotate(point)
    }

    /// Homogeneous 4x4 matrix (rotation then translation).
    pub fn to_matrix(&self) -> Matrix4<f32> {
        Isometry3::from_parts(Translation3::from(self.translation), self.rotation).to_homogeneous()
    }

    pub fn distance_to(&self, other: &AbsoluteTransform) -> f32 {
        (self.translation - other.translation).norm()
    }
}
