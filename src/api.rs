use std::fs;
use std::sync::Arc;
use log::info;

use crate::coordinate::{CoordinateTransform, TransformDirection};
use crate::crs::errors::{CrsError, CrsResult};
use crate::crs::{Crs, CrsDefinitions, CrsRegistry, CrsResolver};
use crate::utils::coordinate_utils::{read_coordinate_file, write_coordinate_file};
use crate::utils::logger::Logger;
use crate::utils::xml_utils::XmlNode;

/// Root element of a standalone state file
pub const STATE_ROOT_ELEMENT: &str = "crskit";

const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

/// Main interface to the CrsKit library
pub struct CrsKit {
    registry: Arc<CrsRegistry>,
    logger: Logger,
}

impl CrsKit {
    /// Create a new CrsKit instance
    ///
    /// # Arguments
    /// * `definitions_file` - Optional TOML file merged over the built-in CRS definitions
    /// * `log_file` - Optional file receiving operation records
    ///
    /// # Returns
    /// A CrsKit instance or an error if a file cannot be read
    pub fn new(definitions_file: Option<&str>, log_file: Option<&str>) -> CrsResult<Self> {
        let mut definitions = CrsDefinitions::builtin().clone();
        if let Some(path) = definitions_file {
            definitions.merge(CrsDefinitions::from_file(path)?);
            info!("Loaded CRS definitions from {}", path);
        }

        let logger = match log_file {
            Some(path) => Logger::append(path)?,
            None => Logger::disabled(),
        };

        Ok(CrsKit {
            registry: Arc::new(CrsRegistry::new(definitions)),
            logger,
        })
    }

    pub fn registry(&self) -> &Arc<CrsRegistry> {
        &self.registry
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Resolve a catalog id, alias, WKT string or PROJ definition
    pub fn resolve(&self, text: &str) -> CrsResult<Arc<Crs>> {
        self.registry.resolve(text)
    }

    /// Create a transform between two CRS given as ids, WKT or PROJ definitions
    ///
    /// # Arguments
    /// * `source` - Source CRS text
    /// * `destination` - Destination CRS text
    ///
    /// # Returns
    /// The initialised transform. Its status may still be `Failed` when the
    /// pair cannot be compiled into a projection.
    pub fn create_transform(&self, source: &str, destination: &str) -> CrsResult<CoordinateTransform> {
        let source = self.resolve(source)?;
        let destination = self.resolve(destination)?;

        let mut transform = self.empty_transform();
        transform.set_crs_pair(source, destination);
        Ok(transform)
    }

    /// A transform with no CRS, resolving through this kit's registry
    pub fn empty_transform(&self) -> CoordinateTransform {
        let mut transform = CoordinateTransform::unbound(Arc::clone(&self.registry) as Arc<dyn CrsResolver>);
        transform.set_bbox_edge_segments(self.registry.definitions().bbox_edge_segments());
        transform
    }

    /// Restore a transform from a state file written by [`save_state`](Self::save_state)
    pub fn load_state(&self, path: &str) -> CrsResult<CoordinateTransform> {
        let document = XmlNode::parse(&fs::read_to_string(path)?)?;

        let mut transform = self.empty_transform();
        if !transform.read_xml(&document) {
            return Err(CrsError::Xml(format!("{} does not hold a usable coordinate transform", path)));
        }

        self.logger.log(&format!("Loaded transform {} from {}", transform, path))?;
        Ok(transform)
    }

    /// Save the CRS pair of a transform to a standalone state file
    pub fn save_state(&self, transform: &CoordinateTransform, path: &str) -> CrsResult<()> {
        let mut document = XmlNode::new(STATE_ROOT_ELEMENT);
        document.set_attribute("version", env!("CARGO_PKG_VERSION"));
        if !transform.write_xml(&mut document) {
            return Err(CrsError::NotUsable(format!("Cannot save transform {}: CRS pair is incomplete", transform)));
        }

        let mut content = String::from(XML_DECLARATION);
        content.push_str(&document.to_xml_string()?);
        content.push('\n');
        fs::write(path, content)?;

        self.logger.log(&format!("Saved transform {} to {}", transform, path))?;
        Ok(())
    }

    /// Transform every point of a coordinate file with one batched call
    ///
    /// # Returns
    /// The number of points written
    pub fn transform_file(&self, transform: &CoordinateTransform, input: &str, output: &str,
                          direction: TransformDirection) -> CrsResult<usize> {
        let mut points = read_coordinate_file(input)?;
        transform.transform_points(&mut points, direction)?;
        write_coordinate_file(output, &points, None)?;

        self.logger.log(&format!("Transformed {} points from {} to {} ({})",
                                 points.len(), input, output, direction))?;
        Ok(points.len())
    }
}
