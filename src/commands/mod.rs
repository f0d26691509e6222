//! CLI command implementations
//!
//! This module contains implementations of various commands
//! supported by the CLI application using the Command pattern.

pub mod cli;
pub mod command_traits;
pub mod point_command;
pub mod bbox_command;
pub mod batch_command;
pub mod info_command;

pub use cli::build_cli;
pub use command_traits::{Command, CommandFactory};
pub use point_command::PointCommand;
pub use bbox_command::BboxCommand;
pub use batch_command::BatchCommand;
pub use info_command::InfoCommand;

use clap::ArgMatches;
use log::debug;
use crate::api::CrsKit;
use crate::coordinate::{CoordinateTransform, TransformDirection};
use crate::crs::errors::{CrsError, CrsResult};
use crate::utils::logger::Logger;

/// Factory for creating command instances based on CLI arguments
///
/// This factory examines the command-line arguments and creates
/// the appropriate command instance for execution.
pub struct CrsKitCommandFactory<'k> {
    kit: &'k CrsKit,
}

impl<'k> CrsKitCommandFactory<'k> {
    /// Create a new factory resolving CRS through `kit`
    pub fn new(kit: &'k CrsKit) -> Self {
        CrsKitCommandFactory { kit }
    }
}

impl<'a> CommandFactory<'a> for CrsKitCommandFactory<'a> {
    fn create_command(&self, args: &ArgMatches, logger: &'a Logger) -> CrsResult<Box<dyn Command + 'a>> {
        // Determine which command to run based on args
        if args.contains_id("bbox") {
            Ok(Box::new(BboxCommand::new(args, self.kit, logger)?))
        } else if args.contains_id("input") {
            Ok(Box::new(BatchCommand::new(args, self.kit, logger)?))
        } else if args.contains_id("point") {
            Ok(Box::new(PointCommand::new(args, self.kit, logger)?))
        } else {
            // Default to describing the transform
            Ok(Box::new(InfoCommand::new(args, self.kit, logger)?))
        }
    }
}

/// Build the transform described by `--load-state`, `--source`, `--dest` and `--segments`
///
/// With `--load-state`, the stored pair is used and `--source` / `--dest`
/// replace the corresponding side.
pub(crate) fn transform_from_args(args: &ArgMatches, kit: &CrsKit) -> CrsResult<CoordinateTransform> {
    let source = args.get_one::<String>("source");
    let destination = args.get_one::<String>("dest");

    let mut transform = match args.get_one::<String>("load-state") {
        Some(path) => {
            let mut transform = kit.load_state(path)?;
            if let Some(source) = source {
                transform.set_source_crs(kit.resolve(source)?);
            }
            if let Some(destination) = destination {
                transform.set_dest_crs(kit.resolve(destination)?);
            }
            transform
        },
        None => {
            let source = source.ok_or_else(|| CrsError::InvalidInput(
                "--source is required unless --load-state is given".to_string()))?;
            let destination = destination.ok_or_else(|| CrsError::InvalidInput(
                "--dest is required unless --load-state is given".to_string()))?;
            kit.create_transform(source, destination)?
        },
    };

    if let Some(segments) = args.get_one::<usize>("segments") {
        transform.set_bbox_edge_segments(*segments);
    }

    debug!("Using transform {}", transform);
    Ok(transform)
}

/// Direction selected by `--reverse`
pub(crate) fn direction_from_args(args: &ArgMatches) -> TransformDirection {
    if args.get_flag("reverse") {
        TransformDirection::Reverse
    } else {
        TransformDirection::Forward
    }
}

/// Decimal places requested with `--precision`
pub(crate) fn precision_from_args(args: &ArgMatches) -> Option<usize> {
    args.get_one::<usize>("precision").copied()
}
