//! CRS catalog configuration
//!
//! Aliases, user-defined coordinate reference systems and engine settings
//! are read from a TOML file. The built-in file is embedded at compile time;
//! user files can be merged on top of it.

use std::collections::HashMap;
use std::fs;
use lazy_static::lazy_static;
use log::{debug, warn};

use crate::coordinate::DEFAULT_EDGE_SEGMENTS;
use crate::crs::errors::{CrsError, CrsResult};

lazy_static! {
    // Parse the embedded definitions once
    static ref BUILTIN_DEFINITIONS: CrsDefinitions = {
        let content = include_str!("../../crs_definitions.toml");
        CrsDefinitions::from_str(content).unwrap_or_else(|e| {
            warn!("Failed to parse built-in CRS definitions: {}", e);
            CrsDefinitions::default()
        })
    };
}

/// A user-defined CRS, addressed as "USER:<id>"
#[derive(Debug, Clone, PartialEq)]
pub struct UserCrsDefinition {
    pub id: u32,
    pub description: String,
    pub proj4: String,
}

impl UserCrsDefinition {
    /// Catalog id of this definition
    pub fn authid(&self) -> String {
        format!("USER:{}", self.id)
    }
}

/// Container for catalog aliases, user CRS and engine settings
#[derive(Debug, Clone, Default)]
pub struct CrsDefinitions {
    // Maps lower-cased alias names to catalog ids
    aliases: HashMap<String, String>,
    // Maps user CRS ids to definitions
    user_crs: HashMap<u32, UserCrsDefinition>,
    // Densification segments per rectangle edge, when configured
    bbox_edge_segments: Option<usize>,
}

impl CrsDefinitions {
    /// The definitions embedded in the library
    pub fn builtin() -> &'static CrsDefinitions {
        &BUILTIN_DEFINITIONS
    }

    /// Parse definitions from a TOML string
    pub fn from_str(content: &str) -> CrsResult<Self> {
        let toml_value: toml::Value = match content.parse() {
            Ok(value) => value,
            Err(e) => return Err(CrsError::Config(format!("Failed to parse TOML: {}", e))),
        };

        let mut defs = CrsDefinitions::default();

        if let Some(engine) = toml_value.get("engine").and_then(|v| v.as_table()) {
            if let Some(value) = engine.get("bbox_edge_segments") {
                let segments = value.as_integer()
                    .filter(|n| *n >= 1)
                    .ok_or_else(|| CrsError::Config(format!(
                        "engine.bbox_edge_segments must be a positive integer, got {}", value)))?;
                defs.bbox_edge_segments = Some(segments as usize);
            }
        }

        if let Some(table) = toml_value.get("aliases").and_then(|v| v.as_table()) {
            for (name, target) in table {
                match target.as_str() {
                    Some(target) => {
                        defs.aliases.insert(name.trim().to_lowercase(), target.trim().to_string());
                    },
                    None => return Err(CrsError::Config(format!("Alias '{}' must map to a string", name))),
                }
            }
        }

        if let Some(table) = toml_value.get("user").and_then(|v| v.as_table()) {
            for (key, entry) in table {
                let definition = Self::parse_user_crs(key, entry)?;
                defs.user_crs.insert(definition.id, definition);
            }
        }

        debug!("Parsed {} CRS aliases and {} user CRS definitions",
               defs.aliases.len(), defs.user_crs.len());

        Ok(defs)
    }

    /// Helper to parse one `[user.<id>]` table
    fn parse_user_crs(key: &str, entry: &toml::Value) -> CrsResult<UserCrsDefinition> {
        let id = key.parse::<u32>()
            .map_err(|_| CrsError::Config(format!("User CRS id '{}' is not a number", key)))?;

        let proj4 = entry.get("proj4")
            .and_then(|v| v.as_str())
            .ok_or_else(|| CrsError::Config(format!("User CRS {} has no proj4 definition", id)))?;

        let description = entry.get("description")
            .and_then(|v| v.as_str())
            .unwrap_or("User defined CRS");

        Ok(UserCrsDefinition {
            id,
            description: description.to_string(),
            proj4: proj4.trim().to_string(),
        })
    }

    /// Load definitions from a TOML file
    pub fn from_file(path: &str) -> CrsResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Merge another set of definitions on top of this one
    ///
    /// Entries of `other` replace entries with the same key.
    pub fn merge(&mut self, other: CrsDefinitions) {
        self.aliases.extend(other.aliases);
        self.user_crs.extend(other.user_crs);
        if other.bbox_edge_segments.is_some() {
            self.bbox_edge_segments = other.bbox_edge_segments;
        }
    }

    /// Look up the catalog id an alias points to
    pub fn alias(&self, name: &str) -> Option<&str> {
        self.aliases.get(&name.trim().to_lowercase()).map(String::as_str)
    }

    /// Look up a user-defined CRS
    pub fn user_crs(&self, id: u32) -> Option<&UserCrsDefinition> {
        self.user_crs.get(&id)
    }

    /// Number of bounding box densification segments per edge
    pub fn bbox_edge_segments(&self) -> usize {
        self.bbox_edge_segments.unwrap_or(DEFAULT_EDGE_SEGMENTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_definitions_parse() {
        let defs = CrsDefinitions::builtin();
        assert_eq!(defs.alias("wgs84"), Some("EPSG:4326"));
        assert_eq!(defs.alias(" Web Mercator "), Some("EPSG:3857"));
        assert!(defs.user_crs(100000).is_some());
        assert_eq!(defs.bbox_edge_segments(), 20);
    }

    #[test]
    fn test_merge_overrides() {
        let mut defs = CrsDefinitions::builtin().clone();
        let extra = CrsDefinitions::from_str(r#"
            [engine]
            bbox_edge_segments = 50

            [aliases]
            WGS84 = "EPSG:4258"

            [user.200]
            proj4 = "+proj=longlat +ellps=GRS80"
        "#).unwrap();

        defs.merge(extra);
        assert_eq!(defs.alias("WGS84"), Some("EPSG:4258"));
        assert_eq!(defs.bbox_edge_segments(), 50);
        let user = defs.user_crs(200).unwrap();
        assert_eq!(user.authid(), "USER:200");
        assert_eq!(user.description, "User defined CRS");
    }

    #[test]
    fn test_invalid_definitions() {
        assert!(CrsDefinitions::from_str("[engine]\nbbox_edge_segments = 0").is_err());
        assert!(CrsDefinitions::from_str("[user.abc]\nproj4 = \"+proj=merc\"").is_err());
        assert!(CrsDefinitions::from_str("[user.5]\ndescription = \"no proj\"").is_err());
        assert!(CrsDefinitions::from_str("not toml [").is_err());
    }
}
