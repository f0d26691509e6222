//! Coordinate file transformation command
//!
//! Reads one point per line, transforms all of them in a single batched call
//! and writes the result to a file or to stdout.

use std::fs;
use clap::ArgMatches;
use log::{info, warn};

use crate::api::CrsKit;
use crate::commands::command_traits::Command;
use crate::commands::{direction_from_args, precision_from_args, transform_from_args};
use crate::coordinate::{CoordinateTransform, Point, TransformDirection};
use crate::crs::errors::{CrsError, CrsResult};
use crate::utils::coordinate_utils::{format_point, parse_coordinate_line};
use crate::utils::logger::Logger;
use crate::utils::progress::ProgressTracker;

/// Command transforming every point of a coordinate file
pub struct BatchCommand<'a> {
    input_file: String,
    output_file: Option<String>,
    direction: TransformDirection,
    precision: Option<usize>,
    transform: CoordinateTransform,
    logger: &'a Logger,
}

impl<'a> BatchCommand<'a> {
    /// Create a new batch command
    ///
    /// # Arguments
    /// * `args` - CLI argument matches from clap
    /// * `kit` - Library interface used to resolve the CRS pair
    /// * `logger` - Logger for recording operations
    pub fn new(args: &ArgMatches, kit: &CrsKit, logger: &'a Logger) -> CrsResult<Self> {
        let input_file = args.get_one::<String>("input")
            .ok_or_else(|| CrsError::InvalidInput("Missing input file".to_string()))?
            .clone();

        Ok(BatchCommand {
            input_file,
            output_file: args.get_one::<String>("output").cloned(),
            direction: direction_from_args(args),
            precision: precision_from_args(args),
            transform: transform_from_args(args, kit)?,
            logger,
        })
    }

    fn read_points(&self) -> CrsResult<Vec<Point>> {
        let content = fs::read_to_string(&self.input_file)?;
        let lines: Vec<&str> = content.lines().collect();

        let progress = ProgressTracker::new(lines.len() as u64, "Reading coordinates");
        let mut points = Vec::with_capacity(lines.len());
        for (index, line) in lines.iter().enumerate() {
            let parsed = parse_coordinate_line(line)
                .map_err(|e| CrsError::InvalidInput(format!("{} line {}: {}", self.input_file, index + 1, e)))?;
            if let Some(point) = parsed {
                points.push(point);
            }
            progress.increment(1);
        }
        progress.finish();

        Ok(points)
    }

    fn write_points(&self, points: &[Point]) -> CrsResult<()> {
        let progress = ProgressTracker::new(points.len() as u64, "Writing coordinates");
        let mut content = String::with_capacity(points.len() * 32);
        for point in points {
            content.push_str(&format_point(point, self.precision));
            content.push('\n');
            progress.increment(1);
        }

        match &self.output_file {
            Some(path) => fs::write(path, content)?,
            None => print!("{}", content),
        }
        progress.finish();
        Ok(())
    }

    /// Read and transform the input without writing anything
    pub fn run(&self) -> CrsResult<Vec<Point>> {
        let mut points = self.read_points()?;
        if points.is_empty() {
            warn!("{} holds no coordinates", self.input_file);
            return Ok(points);
        }

        self.transform.transform_points(&mut points, self.direction)?;
        Ok(points)
    }
}

impl<'a> Command for BatchCommand<'a> {
    fn execute(&self) -> CrsResult<()> {
        let points = self.run()?;
        self.write_points(&points)?;

        let target = self.output_file.as_deref().unwrap_or("stdout");
        info!("Transformed {} coordinates from {} to {} ({})",
              points.len(), self.input_file, target, self.direction);
        self.logger.log(&format!("Transformed {} coordinates from {} to {} with {}",
                                 points.len(), self.input_file, target, self.transform))?;
        Ok(())
    }
}
