//! Saving and restoring the CRS pair of a transform in a host XML document
//!
//! Only the two CRS are stored. The projection context and short-circuit
//! state are always rebuilt after a read.
//!
//! ```xml
//! <coordinatetransform>
//!   <sourcesrs>
//!     <spatialrefsys>
//!       <authid>EPSG:4326</authid>
//!       <proj4>+proj=longlat +datum=WGS84 +no_defs</proj4>
//!       <description>WGS 84</description>
//!       <geographicflag>true</geographicflag>
//!     </spatialrefsys>
//!   </sourcesrs>
//!   <destinationsrs>...</destinationsrs>
//! </coordinatetransform>
//! ```

use std::sync::Arc;
use log::{debug, info, warn};

use super::transform::CoordinateTransform;
use crate::crs::errors::{CrsError, CrsResult};
use crate::crs::{Crs, CrsResolver};
use crate::utils::xml_utils::XmlNode;

pub const TRANSFORM_ELEMENT: &str = "coordinatetransform";
const SOURCE_ELEMENT: &str = "sourcesrs";
const DESTINATION_ELEMENT: &str = "destinationsrs";
const SRS_ELEMENT: &str = "spatialrefsys";

const AUTHID_ELEMENT: &str = "authid";
const PROJ4_ELEMENT: &str = "proj4";
const WKT_ELEMENT: &str = "wkt";
const DESCRIPTION_ELEMENT: &str = "description";
const GEOGRAPHIC_ELEMENT: &str = "geographicflag";

impl CoordinateTransform {
    /// Restore the CRS pair from the `coordinatetransform` element under `node`
    ///
    /// `node` may also be the `coordinatetransform` element itself. Each side
    /// is resolved from its authority id, falling back to the PROJ definition
    /// and then to the WKT text.
    ///
    /// # Returns
    /// `true` when both CRS were restored and the transform re-initialised.
    /// On `false` the transform is left exactly as it was.
    pub fn read_xml(&mut self, node: &XmlNode) -> bool {
        match self.read_crs_pair(node) {
            Ok((source, destination)) => {
                self.set_crs_pair(source, destination);
                info!("Restored coordinate transform {}", self);
                true
            },
            Err(e) => {
                warn!("Could not restore coordinate transform from <{}>: {}", node.name, e);
                false
            },
        }
    }

    /// Store the CRS pair as a `coordinatetransform` child of `node`
    ///
    /// An existing `coordinatetransform` child is replaced. Returns `false`,
    /// leaving the node untouched, when either CRS is unset.
    pub fn write_xml(&self, node: &mut XmlNode) -> bool {
        let (source, destination) = match (self.source_crs(), self.dest_crs()) {
            (Some(source), Some(destination)) => (source, destination),
            _ => {
                warn!("Cannot save coordinate transform {}: CRS pair is incomplete", self);
                return false;
            },
        };

        let mut element = XmlNode::new(TRANSFORM_ELEMENT);
        element.append_child(srs_element(SOURCE_ELEMENT, source));
        element.append_child(srs_element(DESTINATION_ELEMENT, destination));
        node.replace_child(element);

        debug!("Saved coordinate transform {} into <{}>", self, node.name);
        true
    }

    fn read_crs_pair(&self, node: &XmlNode) -> CrsResult<(Arc<Crs>, Arc<Crs>)> {
        let element = if node.name == TRANSFORM_ELEMENT {
            node
        } else {
            node.child(TRANSFORM_ELEMENT)
                .ok_or_else(|| CrsError::Xml(format!("missing <{}> element", TRANSFORM_ELEMENT)))?
        };

        let source = self.read_srs(element, SOURCE_ELEMENT)?;
        let destination = self.read_srs(element, DESTINATION_ELEMENT)?;
        Ok((source, destination))
    }

    fn read_srs(&self, element: &XmlNode, side: &str) -> CrsResult<Arc<Crs>> {
        let srs = element.child(side)
            .and_then(|side_node| side_node.child(SRS_ELEMENT))
            .ok_or_else(|| CrsError::Xml(format!("missing <{}><{}> element", side, SRS_ELEMENT)))?;

        let resolver = self.resolver();
        let mut last_error = None;

        if let Some(authid) = srs.child_text(AUTHID_ELEMENT) {
            match resolver.resolve_id(authid) {
                Ok(crs) => return Ok(crs),
                Err(e) => last_error = Some(e),
            }
        }
        if let Some(proj4) = srs.child_text(PROJ4_ELEMENT) {
            match resolver.resolve_definition(proj4) {
                Ok(crs) => return Ok(crs),
                Err(e) => last_error = Some(e),
            }
        }
        if let Some(wkt) = srs.child_text(WKT_ELEMENT) {
            match resolver.resolve_wkt(wkt) {
                Ok(crs) => return Ok(crs),
                Err(e) => last_error = Some(e),
            }
        }

        Err(last_error.unwrap_or_else(|| CrsError::Xml(
            format!("<{}> has no {}, {} or {}", side, AUTHID_ELEMENT, PROJ4_ELEMENT, WKT_ELEMENT))))
    }
}

fn srs_element(side: &str, crs: &Crs) -> XmlNode {
    let mut srs = XmlNode::new(SRS_ELEMENT);
    if let Some(authid) = crs.authid() {
        srs.set_child_text(AUTHID_ELEMENT, authid);
    }
    srs.set_child_text(PROJ4_ELEMENT, crs.proj4());
    if let Some(wkt) = crs.wkt() {
        srs.set_child_text(WKT_ELEMENT, wkt);
    }
    srs.set_child_text(DESCRIPTION_ELEMENT, crs.description());
    srs.set_child_text(GEOGRAPHIC_ELEMENT, if crs.is_geographic() { "true" } else { "false" });

    let mut side_node = XmlNode::new(side);
    side_node.append_child(srs);
    side_node
}
