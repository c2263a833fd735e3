use std::fmt;

use thiserror::Error;

/// Record that holds a dangling reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Referrer {
    /// A triangle, by position in the triangle list handed to the reducer.
    Triangle(usize),
    /// A marker, by position in the model's marker list.
    Marker(usize),
}

impl fmt::Display for Referrer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Referrer::Triangle(index) => write!(f, "triangle {index}"),
            Referrer::Marker(index) => write!(f, "marker {index}"),
        }
    }
}

/// Errors returned by the geometry resolution entry points.
///
/// Every variant carries the offending index or value so that callers can
/// report exactly which record broke the import.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ImportError {
    /// A node refers to a parent that is not strictly before it in the node
    /// list, or to a negative index other than the `-1` root sentinel.
    #[error("malformed node hierarchy: node {node} has parent index {parent}")]
    MalformedHierarchy { node: usize, parent: i32 },

    /// A triangle points past the vertex list, or a marker past the node list.
    #[error("{referrer} references index {index}, but only {available} entries exist")]
    DanglingIndex {
        referrer: Referrer,
        index: i64,
        available: usize,
    },

    /// A skin influence record is out of range or internally inconsistent.
    #[error("invalid skin weight on vertex {vertex}: {reason}")]
    InvalidWeight { vertex: usize, reason: String },

    #[error("unsupported JMS version {found} (expected {expected})")]
    UnsupportedFormatVersion { found: String, expected: String },

    #[error("scale factor must be finite and positive, got {0}")]
    InvalidScale(f32),
}

pub type ImportResult<T> = Result<T, ImportError>;
