//! Coordinate reference system handling
//!
//! This module provides CRS handles, the resolver seam used by the transform
//! engine, the default caching registry and the catalog configuration.

pub mod errors;
mod handle;
pub mod wkt;
pub mod definitions;
mod registry;

pub use self::errors::{CrsError, CrsResult, TransformFailure};
pub use self::handle::{Crs, CrsId, CrsIdType, CrsKind, normalize_definition, is_geographic_definition};
pub use self::definitions::{CrsDefinitions, UserCrsDefinition};
pub use self::registry::{CrsResolver, CrsRegistry};
