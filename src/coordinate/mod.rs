//! Coordinate transformation between coordinate reference systems
//!
//! This module provides the point and rectangle types, the projection
//! context and the [`CoordinateTransform`] engine built on top of them.

mod bbox;
mod bbox_transform;
mod context;
mod notify;
mod persistence;
mod point;
mod transform;

#[cfg(test)]
mod tests;

// Re-export key types
pub use self::bbox::BoundingBox;
pub use self::bbox_transform::{boundary_samples, DEFAULT_EDGE_SEGMENTS};
pub use self::context::ProjectionContext;
pub use self::notify::{InvalidTransformNotifier, ObserverId};
pub use self::persistence::TRANSFORM_ELEMENT;
pub use self::point::Point;
pub use self::transform::{CoordinateTransform, TransformDirection, TransformState, TransformStatus};
