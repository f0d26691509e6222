//! CRS resolution and caching
//!
//! The [`CrsResolver`] trait is the seam through which the transform engine
//! turns identifiers into [`Crs`] handles. [`CrsRegistry`] is the default
//! implementation: it resolves EPSG codes through the `crs-definitions`
//! database, user CRS and aliases through [`CrsDefinitions`], and caches
//! every handle so that transforms referencing the same CRS share one `Arc`.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use lazy_static::lazy_static;
use log::debug;
use proj4rs::proj::Proj;

use crate::crs::definitions::CrsDefinitions;
use crate::crs::errors::{CrsError, CrsResult};
use crate::crs::handle::{Crs, CrsIdType};
use crate::crs::wkt;

lazy_static! {
    static ref GLOBAL_REGISTRY: Arc<CrsRegistry> =
        Arc::new(CrsRegistry::new(CrsDefinitions::builtin().clone()));
}

/// Capability to turn CRS identifiers into shared handles
pub trait CrsResolver: Send + Sync {
    /// Resolve a catalog id ("EPSG:4326", "USER:100000", "4326" or an alias)
    fn resolve_id(&self, id: &str) -> CrsResult<Arc<Crs>>;

    /// Resolve a WKT string
    fn resolve_wkt(&self, wkt: &str) -> CrsResult<Arc<Crs>>;

    /// Resolve a raw PROJ definition string
    fn resolve_definition(&self, proj4: &str) -> CrsResult<Arc<Crs>>;

    /// Resolve a numeric id interpreted according to `id_type`
    fn resolve_srid(&self, srid: u32, id_type: CrsIdType) -> CrsResult<Arc<Crs>>;

    /// Resolve free-form input, dispatching on its shape
    fn resolve(&self, text: &str) -> CrsResult<Arc<Crs>> {
        let text = text.trim();
        if wkt::looks_like_wkt(text) {
            self.resolve_wkt(text)
        } else if text.starts_with('+') {
            self.resolve_definition(text)
        } else {
            self.resolve_id(text)
        }
    }
}

/// Caching CRS resolver backed by the EPSG database and the definitions file
#[derive(Debug)]
pub struct CrsRegistry {
    definitions: CrsDefinitions,
    cache: RwLock<HashMap<String, Arc<Crs>>>,
}

impl CrsRegistry {
    /// Create a registry over the given definitions
    pub fn new(definitions: CrsDefinitions) -> Self {
        CrsRegistry {
            definitions,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// The process-wide registry built from the embedded definitions
    pub fn global() -> Arc<CrsRegistry> {
        Arc::clone(&GLOBAL_REGISTRY)
    }

    pub fn definitions(&self) -> &CrsDefinitions {
        &self.definitions
    }

    /// Number of handles currently cached
    pub fn cached_count(&self) -> usize {
        self.cache.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn cached(&self, key: &str) -> Option<Arc<Crs>> {
        let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
        cache.get(key).cloned()
    }

    fn insert(&self, key: String, crs: Crs) -> Arc<Crs> {
        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        // Another thread may have resolved the same key in the meantime
        Arc::clone(cache.entry(key).or_insert_with(|| Arc::new(crs)))
    }

    /// Resolve an "AUTH:CODE" id without alias lookup
    fn resolve_catalog(&self, authid: &str) -> CrsResult<Arc<Crs>> {
        let (authority, code) = split_authid(authid)?;
        let key = format!("{}:{}", authority, code);

        if let Some(crs) = self.cached(&key) {
            return Ok(crs);
        }

        let crs = match authority.as_str() {
            "EPSG" => {
                let def = u16::try_from(code)
                    .ok()
                    .and_then(crs_definitions::from_code)
                    .ok_or_else(|| CrsError::CrsResolution(format!("{} is not in the EPSG database", key)))?;
                let description = wkt::crs_name(def.wkt).unwrap_or_else(|| key.clone());
                Crs::from_catalog(&key, def.proj4, &description)
            },
            "USER" => {
                let def = self.definitions.user_crs(code)
                    .ok_or_else(|| CrsError::CrsResolution(format!("{} is not a configured user CRS", key)))?;
                Crs::from_catalog(&key, &def.proj4, &def.description)
            },
            _ => return Err(CrsError::CrsResolution(format!("Unsupported authority '{}'", authority))),
        };

        debug!("Resolved {} ({})", key, crs.description());
        Ok(self.insert(key, crs))
    }
}

impl Default for CrsRegistry {
    fn default() -> Self {
        CrsRegistry::new(CrsDefinitions::builtin().clone())
    }
}

impl CrsResolver for CrsRegistry {
    fn resolve_id(&self, id: &str) -> CrsResult<Arc<Crs>> {
        let id = id.trim();
        if id.is_empty() {
            return Err(CrsError::CrsResolution("Empty CRS id".to_string()));
        }

        match self.definitions.alias(id) {
            Some(target) => {
                debug!("CRS alias '{}' -> {}", id, target);
                self.resolve_catalog(target)
            },
            None => self.resolve_catalog(id),
        }
    }

    fn resolve_wkt(&self, wkt_text: &str) -> CrsResult<Arc<Crs>> {
        let wkt_text = wkt_text.trim();
        let key = format!("WKT:{}", wkt_text);

        if let Some(crs) = self.cached(&key) {
            return Ok(crs);
        }

        let authid = wkt::top_level_authority(wkt_text)
            .ok_or_else(|| CrsError::CrsResolution(
                "WKT without a top-level authority identifier cannot be resolved".to_string()))?;
        let base = self.resolve_catalog(&authid)?;

        let mut crs = (*base).clone().with_wkt(wkt_text);
        if let Some(name) = wkt::crs_name(wkt_text) {
            crs = crs.with_description(&name);
        }

        Ok(self.insert(key, crs))
    }

    fn resolve_definition(&self, proj4: &str) -> CrsResult<Arc<Crs>> {
        let proj4 = proj4.trim();
        if !proj4.split_whitespace().any(|token| token.starts_with("+proj=")) {
            return Err(CrsError::CrsResolution(format!("Not a PROJ definition: '{}'", proj4)));
        }

        let crs = Crs::from_proj_string(proj4);
        let key = crs.id().to_string();

        if let Some(cached) = self.cached(&key) {
            return Ok(cached);
        }

        Proj::from_proj_string(proj4)
            .map_err(|e| CrsError::CrsResolution(format!("Invalid PROJ definition '{}': {}", proj4, e)))?;

        debug!("Resolved custom CRS {} from '{}'", key, proj4);
        Ok(self.insert(key, crs))
    }

    fn resolve_srid(&self, srid: u32, id_type: CrsIdType) -> CrsResult<Arc<Crs>> {
        match id_type {
            CrsIdType::Srid | CrsIdType::Epsg => self.resolve_catalog(&format!("EPSG:{}", srid)),
            CrsIdType::Internal => self.resolve_catalog(&format!("USER:{}", srid)),
        }
    }
}

/// Split "AUTH:CODE" (or a bare EPSG code) into upper-cased authority and code
fn split_authid(authid: &str) -> CrsResult<(String, u32)> {
    let authid = authid.trim();
    let (authority, code) = match authid.split_once(':') {
        Some((authority, code)) => (authority.trim().to_uppercase(), code.trim()),
        None => ("EPSG".to_string(), authid),
    };

    let code = code.parse::<u32>()
        .map_err(|_| CrsError::CrsResolution(format!("Invalid CRS id '{}'", authid)))?;

    Ok((authority, code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_epsg_is_cached_and_shared() {
        let registry = CrsRegistry::default();
        let a = registry.resolve_id("EPSG:4326").unwrap();
        let b = registry.resolve_id("epsg:4326").unwrap();
        let c = registry.resolve_id("4326").unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&a, &c));
        assert_eq!(a.authid(), Some("EPSG:4326"));
        assert!(a.is_geographic());
        assert_eq!(registry.cached_count(), 1);
    }

    #[test]
    fn test_resolve_alias_and_user_crs() {
        let registry = CrsRegistry::default();
        let mercator = registry.resolve_id("WebMercator").unwrap();
        assert_eq!(mercator.authid(), Some("EPSG:3857"));

        let user = registry.resolve_srid(100000, CrsIdType::Internal).unwrap();
        assert_eq!(user.authid(), Some("USER:100000"));
        assert!(user.proj4().contains("+proj=tmerc"));
    }

    #[test]
    fn test_resolution_failures() {
        let registry = CrsRegistry::default();
        assert!(matches!(registry.resolve_id(""), Err(CrsError::CrsResolution(_))));
        assert!(matches!(registry.resolve_id("EPSG:abc"), Err(CrsError::CrsResolution(_))));
        assert!(matches!(registry.resolve_id("FOO:4326"), Err(CrsError::CrsResolution(_))));
        assert!(matches!(registry.resolve_id("USER:42"), Err(CrsError::CrsResolution(_))));
        assert!(matches!(registry.resolve_wkt(r#"GEOGCS["No id",UNIT["degree",0.01745]]"#),
                         Err(CrsError::CrsResolution(_))));
        assert!(matches!(registry.resolve_definition("longlat"), Err(CrsError::CrsResolution(_))));
    }

    #[test]
    fn test_resolve_dispatch() {
        let registry = CrsRegistry::default();
        let from_wkt = registry.resolve(r#"GEOGCRS["WGS 84",CS[ellipsoidal,2],ID["EPSG",4326]]"#).unwrap();
        let from_id = registry.resolve("EPSG:4326").unwrap();
        let from_proj = registry.resolve("+proj=longlat +datum=WGS84 +no_defs").unwrap();

        assert_eq!(from_wkt.wkt().map(|w| w.starts_with("GEOGCRS")), Some(true));
        assert!(from_wkt.is_equivalent(&from_id));
        assert!(from_proj.authid().is_none());
        assert!(from_proj.is_geographic());
    }
}
