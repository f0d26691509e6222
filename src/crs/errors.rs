//! Custom error types for CRS resolution and coordinate transformation

use std::fmt;
use std::io;

use crate::coordinate::TransformDirection;

/// Details of a coordinate (or batch of coordinates) that could not be transformed
///
/// This is both the payload of [`CrsError::Transform`] and the value handed to
/// invalid-transform observers.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformFailure {
    /// The offending coordinate, when a single point was being transformed
    pub coordinate: Option<(f64, f64, f64)>,
    /// Number of coordinates in the failed call
    pub count: usize,
    /// Direction of the failed call
    pub direction: TransformDirection,
    /// Reason reported by the projection layer
    pub reason: String,
}

impl TransformFailure {
    /// Failure of a single coordinate
    pub fn point(x: f64, y: f64, z: f64, direction: TransformDirection, reason: impl Into<String>) -> Self {
        TransformFailure {
            coordinate: Some((x, y, z)),
            count: 1,
            direction,
            reason: reason.into(),
        }
    }

    /// Failure of a batch of `count` coordinates
    pub fn batch(count: usize, direction: TransformDirection, reason: impl Into<String>) -> Self {
        TransformFailure {
            coordinate: None,
            count,
            direction,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for TransformFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.coordinate {
            Some((x, y, z)) => write!(f, "{} transform of ({}, {}, {}) failed: {}",
                                      self.direction, x, y, z, self.reason),
            None => write!(f, "{} transform of {} coordinates failed: {}",
                           self.direction, self.count, self.reason),
        }
    }
}

/// Error types for CRS handling and coordinate transformation
#[derive(Debug)]
pub enum CrsError {
    /// A CRS identifier, WKT or definition could not be resolved
    CrsResolution(String),
    /// A coordinate or batch could not be converted
    Transform(TransformFailure),
    /// The transform has no usable projection context
    NotUsable(String),
    /// Malformed caller input
    InvalidInput(String),
    /// XML document error
    Xml(String),
    /// Configuration file error
    Config(String),
    /// I/O error
    IoError(io::Error),
    /// Generic error with message
    GenericError(String),
}

impl fmt::Display for CrsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrsError::CrsResolution(msg) => write!(f, "CRS resolution failed: {}", msg),
            CrsError::Transform(failure) => write!(f, "Transform failed: {}", failure),
            CrsError::NotUsable(msg) => write!(f, "Coordinate transform not usable: {}", msg),
            CrsError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            CrsError::Xml(msg) => write!(f, "XML error: {}", msg),
            CrsError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CrsError::IoError(e) => write!(f, "I/O error: {}", e),
            CrsError::GenericError(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for CrsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CrsError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for CrsError {
    fn from(error: io::Error) -> Self {
        CrsError::IoError(error)
    }
}

impl From<TransformFailure> for CrsError {
    fn from(failure: TransformFailure) -> Self {
        CrsError::Transform(failure)
    }
}

impl From<String> for CrsError {
    fn from(msg: String) -> Self {
        CrsError::GenericError(msg)
    }
}

/// Result type for CRS operations
pub type CrsResult<T> = Result<T, CrsError>;

impl CrsError {
    /// The transform failure carried by this error, if any
    pub fn transform_failure(&self) -> Option<&TransformFailure> {
        match self {
            CrsError::Transform(failure) => Some(failure),
            _ => None,
        }
    }
}
