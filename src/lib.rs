pub mod crs;
pub mod coordinate;
pub mod utils;
pub mod commands;
pub mod api;

pub use crate::api::CrsKit;

pub use crs::{Crs, CrsError, CrsResult, CrsRegistry, CrsResolver};
pub use coordinate::{BoundingBox, Point, CoordinateTransform, TransformDirection};
