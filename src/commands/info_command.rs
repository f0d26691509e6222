//! Transform description command
//!
//! Prints both CRS of a transform and its lifecycle state, optionally saving
//! the pair to a state file.

use clap::ArgMatches;
use log::info;

use crate::api::CrsKit;
use crate::commands::command_traits::Command;
use crate::commands::transform_from_args;
use crate::coordinate::CoordinateTransform;
use crate::crs::errors::CrsResult;
use crate::crs::Crs;
use crate::utils::logger::Logger;

/// Command describing a transform
pub struct InfoCommand<'a> {
    transform: CoordinateTransform,
    save_state: Option<String>,
    verbose: bool,
    kit: &'a CrsKit,
    logger: &'a Logger,
}

impl<'a> InfoCommand<'a> {
    /// Create a new info command
    ///
    /// # Arguments
    /// * `args` - CLI argument matches from clap
    /// * `kit` - Library interface used to resolve and save the CRS pair
    /// * `logger` - Logger for recording operations
    pub fn new(args: &ArgMatches, kit: &'a CrsKit, logger: &'a Logger) -> CrsResult<Self> {
        Ok(InfoCommand {
            transform: transform_from_args(args, kit)?,
            save_state: args.get_one::<String>("save-state").cloned(),
            verbose: args.get_flag("verbose"),
            kit,
            logger,
        })
    }

    /// Human readable description of the transform
    pub fn describe(&self) -> String {
        let mut result = format!("Transform: {}\n", self.transform);
        if let Some(crs) = self.transform.source_crs() {
            result.push_str(&describe_crs("Source", crs, self.verbose));
        }
        if let Some(crs) = self.transform.dest_crs() {
            result.push_str(&describe_crs("Destination", crs, self.verbose));
        }

        result.push_str(&format!("  Status: {}\n", self.transform.status()));
        if let Some(reason) = self.transform.failure_reason() {
            result.push_str(&format!("  Reason: {}\n", reason));
        }
        result.push_str(&format!("  Bounding box segments per edge: {}\n", self.transform.bbox_edge_segments()));
        result
    }
}

fn describe_crs(label: &str, crs: &Crs, verbose: bool) -> String {
    let mut result = format!("  {}: {} ({})\n", label, crs, crs.description());
    result.push_str(&format!("    Geographic: {}\n", crs.is_geographic()));
    result.push_str(&format!("    PROJ: {}\n", crs.proj4()));
    if verbose {
        if let Some(wkt) = crs.wkt() {
            result.push_str(&format!("    WKT: {}\n", wkt));
        }
    }
    result
}

impl<'a> Command for InfoCommand<'a> {
    fn execute(&self) -> CrsResult<()> {
        print!("{}", self.describe());

        if let Some(path) = &self.save_state {
            self.kit.save_state(&self.transform, path)?;
            info!("Saved transform state to {}", path);
        }

        self.logger.log(&format!("Described transform {}", self.transform))?;
        Ok(())
    }
}
