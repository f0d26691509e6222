//! Single point transformation command

use clap::ArgMatches;
use log::info;

use crate::api::CrsKit;
use crate::commands::command_traits::Command;
use crate::commands::{direction_from_args, precision_from_args, transform_from_args};
use crate::coordinate::{CoordinateTransform, Point, TransformDirection};
use crate::crs::errors::{CrsError, CrsResult};
use crate::utils::coordinate_utils::format_point;
use crate::utils::logger::Logger;

/// Command transforming one point given on the command line
pub struct PointCommand<'a> {
    point: Point,
    direction: TransformDirection,
    precision: Option<usize>,
    transform: CoordinateTransform,
    logger: &'a Logger,
}

impl<'a> PointCommand<'a> {
    /// Create a new point command
    ///
    /// # Arguments
    /// * `args` - CLI argument matches from clap
    /// * `kit` - Library interface used to resolve the CRS pair
    /// * `logger` - Logger for recording operations
    pub fn new(args: &ArgMatches, kit: &CrsKit, logger: &'a Logger) -> CrsResult<Self> {
        let point_str = args.get_one::<String>("point")
            .ok_or_else(|| CrsError::InvalidInput("Missing point".to_string()))?;

        Ok(PointCommand {
            point: Point::from_string(point_str)?,
            direction: direction_from_args(args),
            precision: precision_from_args(args),
            transform: transform_from_args(args, kit)?,
            logger,
        })
    }

    /// Transform the point without printing it
    pub fn run(&self) -> CrsResult<Point> {
        self.transform.transform(&self.point, self.direction)
    }
}

impl<'a> Command for PointCommand<'a> {
    fn execute(&self) -> CrsResult<()> {
        let result = self.run()?;
        info!("{} -> {} ({})", self.point, result, self.direction);
        println!("{}", format_point(&result, self.precision));

        self.logger.log(&format!("Transformed point {} -> {} with {}", self.point, result, self.transform))?;
        Ok(())
    }
}
