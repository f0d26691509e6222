//! Projection context bound to a pair of coordinate reference systems
//!
//! The context owns the two compiled `proj4rs` projections and converts
//! coordinates between them in either direction. proj4rs expects radians for
//! geographic systems while callers use degrees; the context converts on the
//! way in and out.

use std::fmt;
use log::debug;
use proj4rs::proj::Proj;
use proj4rs::transform::transform;

use super::transform::TransformDirection;
use crate::crs::errors::{CrsError, CrsResult, TransformFailure};
use crate::crs::Crs;

/// Tolerance on the latitude range check, in degrees
const LATITUDE_TOLERANCE: f64 = 1e-10;

/// Largest round-trip error accepted for geographic coordinates, in degrees
const GEOGRAPHIC_ROUND_TRIP_TOLERANCE: f64 = 1e-7;

/// Smallest round-trip error bound for projected coordinates, in CRS units
const PROJECTED_ROUND_TRIP_TOLERANCE: f64 = 1e-3;

/// Compiled transformation pipeline between two CRS
pub struct ProjectionContext {
    source: Proj,
    destination: Proj,
    source_geographic: bool,
    destination_geographic: bool,
}

impl ProjectionContext {
    /// Build a context from two resolved CRS handles
    ///
    /// # Arguments
    /// * `source` - CRS the forward direction converts from
    /// * `destination` - CRS the forward direction converts to
    ///
    /// # Returns
    /// The context, or a resolution error when either definition is rejected
    pub fn new(source: &Crs, destination: &Crs) -> CrsResult<Self> {
        let source_proj = compile(source)?;
        let destination_proj = compile(destination)?;

        let context = ProjectionContext {
            source_geographic: source_proj.is_latlong(),
            destination_geographic: destination_proj.is_latlong(),
            source: source_proj,
            destination: destination_proj,
        };

        debug!("Built projection context {} -> {} (geographic: {} -> {})",
               source, destination, context.source_geographic, context.destination_geographic);

        Ok(context)
    }

    /// Whether the "from" side of `direction` is geographic
    pub fn from_is_geographic(&self, direction: TransformDirection) -> bool {
        match direction {
            TransformDirection::Forward => self.source_geographic,
            TransformDirection::Reverse => self.destination_geographic,
        }
    }

    /// Whether the "to" side of `direction` is geographic
    pub fn to_is_geographic(&self, direction: TransformDirection) -> bool {
        self.from_is_geographic(direction.inverse())
    }

    fn endpoints(&self, direction: TransformDirection) -> (&Proj, &Proj) {
        match direction {
            TransformDirection::Forward => (&self.source, &self.destination),
            TransformDirection::Reverse => (&self.destination, &self.source),
        }
    }

    /// Transform a single coordinate triplet
    ///
    /// The result is transformed back and must land on the input again. This
    /// rejects singular points, such as the far pole of a polar projection,
    /// where the projection returns a value that belongs to another input.
    pub fn transform_point(&self, x: f64, y: f64, z: f64, direction: TransformDirection)
                           -> CrsResult<(f64, f64, f64)> {
        let fail = |reason: String| CrsError::Transform(TransformFailure::point(x, y, z, direction, reason));

        self.check_input(x, y, z, direction).map_err(fail)?;

        let input = [(x, y, z)];
        let mut output = input;
        self.project(&mut output, direction).map_err(fail)?;
        check_output(output[0]).map_err(fail)?;
        self.check_round_trip(&input, &output, direction).map_err(fail)?;

        Ok(output[0])
    }

    /// Transform a batch of coordinate triplets in one projection call
    ///
    /// The slice is only written when every coordinate transformed; on failure
    /// it is left as it was.
    pub fn transform_batch(&self, coords: &mut [(f64, f64, f64)], direction: TransformDirection) -> CrsResult<()> {
        let count = coords.len();
        let fail = |reason: String| CrsError::Transform(TransformFailure::batch(count, direction, reason));

        for (index, &(x, y, z)) in coords.iter().enumerate() {
            self.check_input(x, y, z, direction)
                .map_err(|reason| fail(format!("coordinate {}: {}", index, reason)))?;
        }

        let mut buffer = coords.to_vec();
        self.project(&mut buffer, direction).map_err(fail)?;

        for (index, &coord) in buffer.iter().enumerate() {
            check_output(coord).map_err(|reason| fail(format!("coordinate {}: {}", index, reason)))?;
        }
        self.check_round_trip(coords, &buffer, direction).map_err(fail)?;

        coords.copy_from_slice(&buffer);
        Ok(())
    }

    /// Run coordinates through proj4rs in place, converting angles at the geographic ends
    fn project(&self, coords: &mut [(f64, f64, f64)], direction: TransformDirection) -> Result<(), String> {
        for coord in coords.iter_mut() {
            *coord = self.to_native_input(*coord, direction);
        }

        let (from, to) = self.endpoints(direction);
        transform(from, to, coords).map_err(|e| e.to_string())?;

        for coord in coords.iter_mut() {
            *coord = self.from_native_output(*coord, direction);
        }
        Ok(())
    }

    /// Transform `outputs` back and compare them with `inputs`
    fn check_round_trip(&self, inputs: &[(f64, f64, f64)], outputs: &[(f64, f64, f64)],
                        direction: TransformDirection) -> Result<(), String> {
        let mut back = outputs.to_vec();
        self.project(&mut back, direction.inverse())
            .map_err(|e| format!("result cannot be transformed back: {}", e))?;

        let position = |index: usize| if inputs.len() > 1 { format!("coordinate {}: ", index) } else { String::new() };

        for (index, ((input, output), back)) in inputs.iter().zip(outputs).zip(&back).enumerate() {
            if !self.same_position(*input, *back, direction) {
                return Err(format!("{}result ({}, {}) transforms back to ({}, {}) instead of ({}, {})",
                                   position(index), output.0, output.1, back.0, back.1, input.0, input.1));
            }
        }
        Ok(())
    }

    /// Compare two positions in the units of the "from" side of `direction`
    fn same_position(&self, (x, y, _): (f64, f64, f64), (other_x, other_y, _): (f64, f64, f64),
                     direction: TransformDirection) -> bool {
        if self.from_is_geographic(direction) {
            // Longitudes may come back wrapped, and shrink to nothing at the poles
            let delta_lon = (x - other_x + 180.0).rem_euclid(360.0) - 180.0;
            (y - other_y).abs() <= GEOGRAPHIC_ROUND_TRIP_TOLERANCE
                && (delta_lon * y.to_radians().cos()).abs() <= GEOGRAPHIC_ROUND_TRIP_TOLERANCE
        } else {
            let tolerance = |v: f64| PROJECTED_ROUND_TRIP_TOLERANCE.max(v.abs() * 1e-9);
            (x - other_x).abs() <= tolerance(x) && (y - other_y).abs() <= tolerance(y)
        }
    }

    fn check_input(&self, x: f64, y: f64, z: f64, direction: TransformDirection) -> Result<(), String> {
        if !x.is_finite() || !y.is_finite() || !z.is_finite() {
            return Err("non-finite input coordinate".to_string());
        }
        if self.from_is_geographic(direction) && y.abs() > 90.0 + LATITUDE_TOLERANCE {
            return Err(format!("latitude {} outside [-90, 90]", y));
        }
        Ok(())
    }

    fn to_native_input(&self, (x, y, z): (f64, f64, f64), direction: TransformDirection) -> (f64, f64, f64) {
        if self.from_is_geographic(direction) {
            (x.to_radians(), y.to_radians(), z)
        } else {
            (x, y, z)
        }
    }

    fn from_native_output(&self, (x, y, z): (f64, f64, f64), direction: TransformDirection) -> (f64, f64, f64) {
        if self.to_is_geographic(direction) {
            (x.to_degrees(), y.to_degrees(), z)
        } else {
            (x, y, z)
        }
    }
}

impl fmt::Debug for ProjectionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectionContext")
            .field("source_geographic", &self.source_geographic)
            .field("destination_geographic", &self.destination_geographic)
            .finish_non_exhaustive()
    }
}

fn compile(crs: &Crs) -> CrsResult<Proj> {
    Proj::from_proj_string(crs.proj4())
        .map_err(|e| CrsError::CrsResolution(format!("Cannot build projection for {}: {}", crs, e)))
}

fn check_output((x, y, z): (f64, f64, f64)) -> Result<(), String> {
    if x.is_finite() && y.is_finite() && z.is_finite() {
        Ok(())
    } else {
        Err("projection produced a non-finite coordinate".to_string())
    }
}
