//! Coordinate Reference System handles
//!
//! A [`Crs`] is an immutable, resolved description of a coordinate reference
//! system. Handles are created by a [`CrsResolver`](super::CrsResolver) and
//! shared between transforms through `Arc<Crs>`.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

/// PROJ parameters that carry no meaning for the coordinate math
const IGNORED_PARAMETERS: [&str; 3] = ["+no_defs", "+type=crs", "+wktext"];

/// How a numeric CRS identifier is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrsIdType {
    /// Spatial reference id of a spatial database (EPSG numbering)
    Srid,
    /// EPSG code
    Epsg,
    /// Id of a user-defined CRS from the definitions file
    Internal,
}

impl CrsIdType {
    /// Parse a CRS id type from its name
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "srid" | "postgis" => Some(CrsIdType::Srid),
            "epsg" => Some(CrsIdType::Epsg),
            "internal" | "user" => Some(CrsIdType::Internal),
            _ => None,
        }
    }
}

/// Identity of a resolved CRS
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CrsId {
    /// Authority code such as "EPSG:4326"
    Authority(String),
    /// Hash of the normalized definition of a CRS without authority
    Definition(u64),
}

impl fmt::Display for CrsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrsId::Authority(authid) => write!(f, "{}", authid),
            CrsId::Definition(hash) => write!(f, "PROJ:{:016x}", hash),
        }
    }
}

/// Origin of a CRS definition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrsKind {
    /// Looked up in the catalog by id
    Catalog,
    /// Resolved from WKT text
    Wkt,
    /// Raw PROJ definition string
    Proj,
}

/// A resolved coordinate reference system
#[derive(Debug, Clone)]
pub struct Crs {
    id: CrsId,
    kind: CrsKind,
    proj4: String,
    wkt: Option<String>,
    description: String,
    geographic: bool,
}

impl Crs {
    /// Create a catalog CRS with an authority id
    ///
    /// # Arguments
    /// * `authid` - Authority id such as "EPSG:4326" or "USER:100000"
    /// * `proj4` - PROJ definition used to build projection contexts
    /// * `description` - Human readable name
    pub fn from_catalog(authid: &str, proj4: &str, description: &str) -> Self {
        Crs {
            id: CrsId::Authority(authid.to_uppercase()),
            kind: CrsKind::Catalog,
            proj4: proj4.trim().to_string(),
            wkt: None,
            description: description.to_string(),
            geographic: is_geographic_definition(proj4),
        }
    }

    /// Create a custom CRS from a PROJ string
    ///
    /// The identity is a hash of the normalized definition, so two strings
    /// that differ only in parameter order resolve to the same id.
    pub fn from_proj_string(proj4: &str) -> Self {
        let normalized = normalize_definition(proj4);
        let mut hasher = DefaultHasher::new();
        normalized.hash(&mut hasher);

        Crs {
            id: CrsId::Definition(hasher.finish()),
            kind: CrsKind::Proj,
            proj4: proj4.trim().to_string(),
            wkt: None,
            description: "Custom CRS".to_string(),
            geographic: is_geographic_definition(proj4),
        }
    }

    /// Attach the WKT text this CRS was resolved from
    pub fn with_wkt(mut self, wkt: &str) -> Self {
        self.kind = CrsKind::Wkt;
        self.wkt = Some(wkt.to_string());
        self
    }

    /// Replace the description
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn id(&self) -> &CrsId {
        &self.id
    }

    pub fn kind(&self) -> CrsKind {
        self.kind
    }

    /// Authority id ("EPSG:4326"), when the CRS has one
    pub fn authid(&self) -> Option<&str> {
        match &self.id {
            CrsId::Authority(authid) => Some(authid),
            CrsId::Definition(_) => None,
        }
    }

    /// EPSG code, when the authority is EPSG
    pub fn epsg_code(&self) -> Option<u32> {
        self.authid()
            .and_then(|authid| authid.strip_prefix("EPSG:"))
            .and_then(|code| code.parse().ok())
    }

    /// PROJ definition string
    pub fn proj4(&self) -> &str {
        &self.proj4
    }

    /// WKT text, when the CRS was resolved from WKT
    pub fn wkt(&self) -> Option<&str> {
        self.wkt.as_deref()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Whether coordinates are longitude/latitude in degrees
    pub fn is_geographic(&self) -> bool {
        self.geographic
    }

    /// The PROJ definition with ordering and no-op parameters normalized away
    pub fn normalized_definition(&self) -> String {
        normalize_definition(&self.proj4)
    }

    /// Check whether two handles describe the same CRS
    ///
    /// Handles with authority ids are equivalent when the ids match. Otherwise
    /// the normalized definitions are compared.
    pub fn is_equivalent(&self, other: &Crs) -> bool {
        match (self.authid(), other.authid()) {
            (Some(a), Some(b)) => a == b,
            _ => self.normalized_definition() == other.normalized_definition(),
        }
    }
}

impl PartialEq for Crs {
    fn eq(&self, other: &Self) -> bool {
        self.is_equivalent(other)
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// Normalize a PROJ string: drop no-op parameters, sort and de-duplicate tokens
pub fn normalize_definition(proj4: &str) -> String {
    let mut tokens: Vec<&str> = proj4
        .split_whitespace()
        .filter(|token| !IGNORED_PARAMETERS.contains(token))
        .collect();
    tokens.sort_unstable();
    tokens.dedup();
    tokens.join(" ")
}

/// Check whether a PROJ string describes a geographic CRS
pub fn is_geographic_definition(proj4: &str) -> bool {
    proj4.split_whitespace().any(|token| {
        matches!(token, "+proj=longlat" | "+proj=latlong" | "+proj=lonlat" | "+proj=latlon")
    })
}
