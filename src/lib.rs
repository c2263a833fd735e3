//! Geometry resolution for JMS models.
//!
//! Turns the node, marker, vertex and triangle records of a JMS model into an
//! armature with absolute bone transforms, compacted per-region meshes with
//! per-corner attributes, skin weight groups and marker placements.

pub mod convert;
pub mod error;
pub mod hierarchy;
pub mod marker;
pub mod math;
pub mod model;
pub mod options;
pub mod reduce;
pub mod region;
pub mod skinning;

pub use convert::{ImportReport, ImportedScene, import_model, import_model_document};
pub use error::{ImportError, ImportResult, Referrer};
pub use math::{AbsoluteTransform, QuaternionConvention, RawRotation};
pub use model::{JmsModel, Marker, Node, Triangle, Vertex};
pub use options::{ImportOptions, ScalePreset};
