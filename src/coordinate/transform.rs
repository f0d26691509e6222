//! Coordinate transformation engine
//!
//! A [`CoordinateTransform`] binds a source and a destination CRS, builds the
//! projection context between them and exposes point, array and bounding box
//! transformation in both directions.
//!
//! Lifecycle is an explicit state machine:
//! `Uninitialized -> Initializing -> {ShortCircuited | Active | Failed}`.
//! Every CRS setter drops back to `Uninitialized` and runs
//! [`CoordinateTransform::initialise`] before returning, so transform calls
//! made right after a CRS change always see the new pair.
//!
//! The engine is not internally synchronized. CRS setters take `&mut self`
//! and transform calls take `&self`, so sharing one instance across threads
//! requires wrapping it in a lock.

use std::fmt;
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use log::{debug, info, warn};

use super::bbox_transform::DEFAULT_EDGE_SEGMENTS;
use super::context::ProjectionContext;
use super::notify::{InvalidTransformNotifier, ObserverId};
use super::point::Point;
use crate::crs::errors::{CrsError, CrsResult, TransformFailure};
use crate::crs::{Crs, CrsIdType, CrsRegistry, CrsResolver};

/// Direction of a transformation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformDirection {
    /// Source CRS to destination CRS
    Forward,
    /// Destination CRS to source CRS
    Reverse,
}

impl TransformDirection {
    /// The opposite direction
    pub fn inverse(self) -> Self {
        match self {
            TransformDirection::Forward => TransformDirection::Reverse,
            TransformDirection::Reverse => TransformDirection::Forward,
        }
    }
}

impl fmt::Display for TransformDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformDirection::Forward => write!(f, "forward"),
            TransformDirection::Reverse => write!(f, "reverse"),
        }
    }
}

/// Lifecycle state of a coordinate transform
#[derive(Debug)]
pub enum TransformState {
    /// No initialisation has run since construction or the last CRS change
    Uninitialized,
    /// Initialisation in progress
    Initializing,
    /// Source and destination are equivalent; every transform is the identity
    ShortCircuited,
    /// A projection context is available
    Active(ProjectionContext),
    /// Initialisation ran but no usable context could be built
    Failed(String),
}

/// Data-free view of [`TransformState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformStatus {
    Uninitialized,
    Initializing,
    ShortCircuited,
    Active,
    Failed,
}

impl fmt::Display for TransformStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransformStatus::Uninitialized => "uninitialized",
            TransformStatus::Initializing => "initializing",
            TransformStatus::ShortCircuited => "short-circuited",
            TransformStatus::Active => "active",
            TransformStatus::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Transformer between a source and a destination coordinate reference system
pub struct CoordinateTransform {
    source: Option<Arc<Crs>>,
    destination: Option<Arc<Crs>>,
    resolver: Arc<dyn CrsResolver>,
    state: TransformState,
    bbox_edge_segments: usize,
    notifier: InvalidTransformNotifier,
}

impl CoordinateTransform {
    /// Create a transform between two resolved CRS handles
    ///
    /// Initialisation runs immediately. A pair that cannot be compiled leaves
    /// the transform in the `Failed` state; check [`CoordinateTransform::status`].
    pub fn new(source: Arc<Crs>, destination: Arc<Crs>) -> Self {
        Self::with_resolver(source, destination, CrsRegistry::global())
    }

    /// Create a transform that resolves later CRS ids through `resolver`
    pub fn with_resolver(source: Arc<Crs>, destination: Arc<Crs>, resolver: Arc<dyn CrsResolver>) -> Self {
        let mut transform = Self::unbound(resolver);
        transform.set_crs_pair(source, destination);
        transform
    }

    /// Create a transform with no CRS, to be filled by setters or [`read_xml`](Self::read_xml)
    pub fn unbound(resolver: Arc<dyn CrsResolver>) -> Self {
        CoordinateTransform {
            source: None,
            destination: None,
            resolver,
            state: TransformState::Uninitialized,
            bbox_edge_segments: DEFAULT_EDGE_SEGMENTS,
            notifier: InvalidTransformNotifier::new(),
        }
    }

    /// Create a transform from two catalog ids such as "EPSG:4326"
    pub fn from_ids(source_id: &str, destination_id: &str) -> CrsResult<Self> {
        let resolver = CrsRegistry::global();
        let source = resolver.resolve_id(source_id)?;
        let destination = resolver.resolve_id(destination_id)?;
        Ok(Self::with_resolver(source, destination, resolver))
    }

    /// Create a transform from two WKT strings
    pub fn from_wkt(source_wkt: &str, destination_wkt: &str) -> CrsResult<Self> {
        let resolver = CrsRegistry::global();
        let source = resolver.resolve_wkt(source_wkt)?;
        let destination = resolver.resolve_wkt(destination_wkt)?;
        Ok(Self::with_resolver(source, destination, resolver))
    }

    /// Create a transform from a numeric source id and a destination WKT
    ///
    /// # Arguments
    /// * `source_srid` - Source id, interpreted according to `id_type`
    /// * `destination_wkt` - Destination CRS as WKT
    /// * `id_type` - How `source_srid` is interpreted
    pub fn from_srid(source_srid: u32, destination_wkt: &str, id_type: CrsIdType) -> CrsResult<Self> {
        let resolver = CrsRegistry::global();
        let source = resolver.resolve_srid(source_srid, id_type)?;
        let destination = resolver.resolve_wkt(destination_wkt)?;
        Ok(Self::with_resolver(source, destination, resolver))
    }

    /// Rebuild the lifecycle state from the current CRS pair
    ///
    /// Idempotent. Always leaves the transform initialised; a pair that cannot
    /// be used ends in the `Failed` state with the reason recorded.
    pub fn initialise(&mut self) {
        self.state = TransformState::Initializing;
        self.state = self.build_state();

        match &self.state {
            TransformState::ShortCircuited => debug!("{}: short-circuited", self),
            TransformState::Active(_) => info!("Initialised coordinate transform {}", self),
            TransformState::Failed(reason) => warn!("Coordinate transform {} is not usable: {}", self, reason),
            TransformState::Uninitialized | TransformState::Initializing => {},
        }
    }

    fn build_state(&self) -> TransformState {
        let (source, destination) = match (&self.source, &self.destination) {
            (Some(source), Some(destination)) => (source, destination),
            (None, _) => return TransformState::Failed("source CRS is not set".to_string()),
            (_, None) => return TransformState::Failed("destination CRS is not set".to_string()),
        };

        for crs in [source, destination] {
            if crs.proj4().trim().is_empty() {
                return TransformState::Failed(format!("{} has no definition", crs));
            }
        }

        if source.is_equivalent(destination) {
            return TransformState::ShortCircuited;
        }

        match ProjectionContext::new(source, destination) {
            Ok(context) => TransformState::Active(context),
            Err(e) => TransformState::Failed(e.to_string()),
        }
    }

    /// Whether initialisation has run since construction or the last CRS change
    pub fn is_initialised(&self) -> bool {
        !matches!(self.state, TransformState::Uninitialized | TransformState::Initializing)
    }

    /// Whether source and destination are equivalent, making every transform the identity
    pub fn is_short_circuited(&self) -> bool {
        matches!(self.state, TransformState::ShortCircuited)
    }

    pub fn state(&self) -> &TransformState {
        &self.state
    }

    pub fn status(&self) -> TransformStatus {
        match self.state {
            TransformState::Uninitialized => TransformStatus::Uninitialized,
            TransformState::Initializing => TransformStatus::Initializing,
            TransformState::ShortCircuited => TransformStatus::ShortCircuited,
            TransformState::Active(_) => TransformStatus::Active,
            TransformState::Failed(_) => TransformStatus::Failed,
        }
    }

    /// Reason the transform is unusable, when in the `Failed` state
    pub fn failure_reason(&self) -> Option<&str> {
        match &self.state {
            TransformState::Failed(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn source_crs(&self) -> Option<&Arc<Crs>> {
        self.source.as_ref()
    }

    pub fn dest_crs(&self) -> Option<&Arc<Crs>> {
        self.destination.as_ref()
    }

    pub fn resolver(&self) -> &Arc<dyn CrsResolver> {
        &self.resolver
    }

    /// Replace the source CRS and re-initialise
    pub fn set_source_crs(&mut self, crs: Arc<Crs>) {
        debug!("Setting source CRS to {}", crs);
        self.source = Some(crs);
        self.state = TransformState::Uninitialized;
        self.initialise();
    }

    /// Replace the destination CRS and re-initialise
    pub fn set_dest_crs(&mut self, crs: Arc<Crs>) {
        debug!("Setting destination CRS to {}", crs);
        self.destination = Some(crs);
        self.state = TransformState::Uninitialized;
        self.initialise();
    }

    /// Resolve a catalog id and install it as the destination CRS
    ///
    /// On resolution failure the transform is left unchanged.
    pub fn set_dest_crs_id(&mut self, id: &str) -> CrsResult<()> {
        let crs = self.resolver.resolve_id(id)?;
        self.set_dest_crs(crs);
        Ok(())
    }

    /// Replace both CRS and re-initialise once
    pub fn set_crs_pair(&mut self, source: Arc<Crs>, destination: Arc<Crs>) {
        self.source = Some(source);
        self.destination = Some(destination);
        self.state = TransformState::Uninitialized;
        self.initialise();
    }

    /// Number of segments each rectangle edge is split into by bounding box transforms
    pub fn bbox_edge_segments(&self) -> usize {
        self.bbox_edge_segments
    }

    /// Set the bounding box densification; values below 1 are raised to 1
    pub fn set_bbox_edge_segments(&mut self, segments: usize) {
        self.bbox_edge_segments = segments.max(1);
    }

    /// Register an observer for invalid transform input
    pub fn on_invalid_transform<F>(&mut self, callback: F) -> ObserverId
    where
        F: Fn(&TransformFailure) + Send + Sync + 'static,
    {
        self.notifier.subscribe(callback)
    }

    /// Register a channel receiving every transform failure
    pub fn invalid_transform_channel(&mut self) -> (ObserverId, Receiver<TransformFailure>) {
        self.notifier.subscribe_channel()
    }

    /// Remove an invalid-transform observer
    pub fn remove_observer(&mut self, id: ObserverId) -> bool {
        self.notifier.unsubscribe(id)
    }

    /// The projection context, or None when short-circuited
    pub(crate) fn context(&self) -> CrsResult<Option<&ProjectionContext>> {
        match &self.state {
            TransformState::ShortCircuited => Ok(None),
            TransformState::Active(context) => Ok(Some(context)),
            TransformState::Failed(reason) => Err(CrsError::NotUsable(reason.clone())),
            TransformState::Uninitialized | TransformState::Initializing => {
                Err(CrsError::NotUsable("transform has not been initialised".to_string()))
            },
        }
    }

    /// Single-coordinate path shared by every point entry point; does not notify
    pub(crate) fn transform_coordinate(&self, x: f64, y: f64, z: f64, direction: TransformDirection)
                                       -> CrsResult<(f64, f64, f64)> {
        match self.context()? {
            None => Ok((x, y, z)),
            Some(context) => context.transform_point(x, y, z, direction),
        }
    }

    /// Broadcast transform failures to observers, passing the result through
    pub(crate) fn report<T>(&self, result: CrsResult<T>) -> CrsResult<T> {
        if let Err(CrsError::Transform(failure)) = &result {
            debug!("Invalid transform input: {}", failure);
            self.notifier.notify(failure);
        }
        result
    }

    fn transform_raw(&self, x: f64, y: f64, z: f64, direction: TransformDirection) -> CrsResult<(f64, f64, f64)> {
        self.report(self.transform_coordinate(x, y, z, direction))
    }

    /// Transform a point
    ///
    /// When short-circuited the point is returned unchanged. A z value is
    /// carried through the transformation when present.
    pub fn transform(&self, point: &Point, direction: TransformDirection) -> CrsResult<Point> {
        let (x, y, z) = self.transform_raw(point.x, point.y, point.z_value(), direction)?;
        Ok(point.with_coordinates(x, y, z))
    }

    /// Transform a 2D coordinate pair
    pub fn transform_xy(&self, x: f64, y: f64, direction: TransformDirection) -> CrsResult<Point> {
        self.transform(&Point::new(x, y), direction)
    }

    /// Transform a coordinate triplet in place
    ///
    /// The values are only written when the transformation succeeds.
    pub fn transform_in_place(&self, x: &mut f64, y: &mut f64, z: &mut f64, direction: TransformDirection)
                              -> CrsResult<()> {
        let (tx, ty, tz) = self.transform_raw(*x, *y, *z, direction)?;
        *x = tx;
        *y = ty;
        *z = tz;
        Ok(())
    }

    /// Transform coordinate arrays in place with one batched projection call
    ///
    /// If any coordinate cannot be transformed the whole call fails and the
    /// arrays are left untouched. Callers that need per-element tolerance
    /// should transform elements individually.
    ///
    /// # Arguments
    /// * `xs` - X coordinates
    /// * `ys` - Y coordinates, same length as `xs`
    /// * `zs` - Optional Z coordinates, same length as `xs`
    /// * `direction` - Transformation direction
    pub fn transform_coords(&self, xs: &mut [f64], ys: &mut [f64], mut zs: Option<&mut [f64]>,
                            direction: TransformDirection) -> CrsResult<()> {
        let count = xs.len();
        let z_count = zs.as_ref().map_or(count, |zs| zs.len());
        if ys.len() != count || z_count != count {
            return Err(CrsError::InvalidInput(format!(
                "Coordinate arrays differ in length: x={}, y={}, z={}", count, ys.len(), z_count)));
        }

        let context = match self.context()? {
            Some(context) => context,
            None => return Ok(()),
        };

        let mut coords: Vec<(f64, f64, f64)> = (0..count)
            .map(|i| (xs[i], ys[i], zs.as_ref().map_or(0.0, |zs| zs[i])))
            .collect();

        self.report(context.transform_batch(&mut coords, direction))?;

        for (i, (x, y, z)) in coords.into_iter().enumerate() {
            xs[i] = x;
            ys[i] = y;
            if let Some(zs) = zs.as_mut() {
                zs[i] = z;
            }
        }

        debug!("Transformed {} coordinates ({})", count, direction);
        Ok(())
    }

    /// Transform a slice of points in place with one batched projection call
    ///
    /// Same all-or-nothing policy as [`transform_coords`](Self::transform_coords).
    pub fn transform_points(&self, points: &mut [Point], direction: TransformDirection) -> CrsResult<()> {
        let context = match self.context()? {
            Some(context) => context,
            None => return Ok(()),
        };

        let mut coords: Vec<(f64, f64, f64)> = points.iter()
            .map(|p| (p.x, p.y, p.z_value()))
            .collect();

        self.report(context.transform_batch(&mut coords, direction))?;

        for (point, (x, y, z)) in points.iter_mut().zip(coords) {
            *point = point.with_coordinates(x, y, z);
        }
        Ok(())
    }
}

impl Default for CoordinateTransform {
    fn default() -> Self {
        Self::unbound(CrsRegistry::global())
    }
}

impl fmt::Display for CoordinateTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = |crs: &Option<Arc<Crs>>| crs.as_ref().map_or("<unset>".to_string(), |c| c.to_string());
        write!(f, "{} -> {} ({})", name(&self.source), name(&self.destination), self.status())
    }
}

impl fmt::Debug for CoordinateTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoordinateTransform")
            .field("source", &self.source)
            .field("destination", &self.destination)
            .field("state", &self.state)
            .field("bbox_edge_segments", &self.bbox_edge_segments)
            .field("notifier", &self.notifier)
            .finish_non_exhaustive()
    }
}
