//! Bounding box transformation command

use clap::ArgMatches;
use log::info;

use crate::api::CrsKit;
use crate::commands::command_traits::Command;
use crate::commands::{direction_from_args, precision_from_args, transform_from_args};
use crate::coordinate::{BoundingBox, CoordinateTransform, TransformDirection};
use crate::crs::errors::{CrsError, CrsResult};
use crate::utils::logger::Logger;

/// Command transforming a rectangle by densified boundary sampling
pub struct BboxCommand<'a> {
    bbox: BoundingBox,
    direction: TransformDirection,
    precision: Option<usize>,
    transform: CoordinateTransform,
    logger: &'a Logger,
}

impl<'a> BboxCommand<'a> {
    /// Create a new bounding box command
    ///
    /// # Arguments
    /// * `args` - CLI argument matches from clap
    /// * `kit` - Library interface used to resolve the CRS pair
    /// * `logger` - Logger for recording operations
    pub fn new(args: &ArgMatches, kit: &CrsKit, logger: &'a Logger) -> CrsResult<Self> {
        let bbox_str = args.get_one::<String>("bbox")
            .ok_or_else(|| CrsError::InvalidInput("Missing bounding box".to_string()))?;

        Ok(BboxCommand {
            bbox: BoundingBox::from_string(bbox_str)?,
            direction: direction_from_args(args),
            precision: precision_from_args(args),
            transform: transform_from_args(args, kit)?,
            logger,
        })
    }

    /// Transform the bounding box without printing it
    pub fn run(&self) -> CrsResult<BoundingBox> {
        self.transform.transform_bounding_box(&self.bbox, self.direction)
    }
}

impl<'a> Command for BboxCommand<'a> {
    fn execute(&self) -> CrsResult<()> {
        let result = self.run()?;
        info!("Bounding box {} -> {} ({}, {} segments per edge)",
              self.bbox, result, self.direction, self.transform.bbox_edge_segments());

        match self.precision {
            Some(p) => println!("{:.*},{:.*},{:.*},{:.*}",
                                p, result.min_x, p, result.min_y, p, result.max_x, p, result.max_y),
            None => println!("{}", result),
        }

        self.logger.log(&format!("Transformed bounding box {} -> {} with {}", self.bbox, result, self.transform))?;
        Ok(())
    }
}
