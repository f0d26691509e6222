//! Bounding box transformation by boundary densification
//!
//! A nonlinear projection bends the sides of a rectangle, so transforming the
//! four corners alone can under-estimate the extent of the result. The sides
//! are sampled at evenly spaced points instead, each sample is transformed on
//! its own and the results are folded into a min/max accumulator.
//!
//! Samples that fail to transform are skipped; only a rectangle where every
//! sample fails is reported as a failure. A rectangle crossing a projection
//! discontinuity such as the antimeridian is not unwrapped and can come out
//! too narrow.

use log::{debug, warn};

use super::bbox::BoundingBox;
use super::transform::{CoordinateTransform, TransformDirection};
use crate::crs::errors::{CrsError, CrsResult, TransformFailure};

/// Default number of segments each rectangle edge is split into
pub const DEFAULT_EDGE_SEGMENTS: usize = 20;

/// Sample points along the boundary of a rectangle
///
/// Walks the ring counter-clockwise from (min_x, min_y). Every edge
/// contributes `segments` points, so every corner appears exactly once and
/// the result holds `4 * segments` points. A degenerate rectangle still yields
/// its corners.
///
/// # Arguments
/// * `rect` - Normalized rectangle to sample
/// * `segments` - Segments per edge; values below 1 are treated as 1
pub fn boundary_samples(rect: &BoundingBox, segments: usize) -> Vec<(f64, f64)> {
    let segments = segments.max(1);
    let n = segments as f64;
    let lerp = |from: f64, to: f64, i: usize| from + (to - from) * (i as f64) / n;

    let mut samples = Vec::with_capacity(4 * segments);
    for i in 0..segments {
        samples.push((lerp(rect.min_x, rect.max_x, i), rect.min_y));
    }
    for i in 0..segments {
        samples.push((rect.max_x, lerp(rect.min_y, rect.max_y, i)));
    }
    for i in 0..segments {
        samples.push((lerp(rect.max_x, rect.min_x, i), rect.max_y));
    }
    for i in 0..segments {
        samples.push((rect.min_x, lerp(rect.max_y, rect.min_y, i)));
    }
    samples
}

/// Running min/max over transformed samples
#[derive(Debug, Clone, Copy)]
struct BoundsAccumulator {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
    count: usize,
}

impl BoundsAccumulator {
    fn new() -> Self {
        BoundsAccumulator {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
            count: 0,
        }
    }

    fn include(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
        self.count += 1;
    }

    fn finish(&self) -> Option<BoundingBox> {
        if self.count == 0 {
            None
        } else {
            Some(BoundingBox::new(self.min_x, self.min_y, self.max_x, self.max_y))
        }
    }
}

impl CoordinateTransform {
    /// Transform a rectangle into a box containing the image of all its boundary points
    ///
    /// The result is always normalized (min <= max), even when the projection
    /// flips an axis. When short-circuited the normalized input is returned;
    /// otherwise a rectangle with a NaN or infinite bound is rejected.
    pub fn transform_bounding_box(&self, rect: &BoundingBox, direction: TransformDirection)
                                  -> CrsResult<BoundingBox> {
        self.transform_bounding_box_with_segments(rect, direction, self.bbox_edge_segments())
    }

    /// Same as [`transform_bounding_box`](Self::transform_bounding_box)
    pub fn transform_rect(&self, rect: &BoundingBox, direction: TransformDirection) -> CrsResult<BoundingBox> {
        self.transform_bounding_box(rect, direction)
    }

    /// Transform a rectangle with an explicit number of segments per edge
    pub fn transform_bounding_box_with_segments(&self, rect: &BoundingBox, direction: TransformDirection,
                                                segments: usize) -> CrsResult<BoundingBox> {
        if self.context()?.is_none() {
            return Ok(rect.normalized());
        }
        // Checked before normalizing, which would silently drop a NaN bound
        if !rect.is_finite() {
            return Err(CrsError::InvalidInput(format!("bounding box {} has a non-finite bound", rect)));
        }
        let rect = rect.normalized();

        let samples = boundary_samples(&rect, segments);
        let mut bounds = BoundsAccumulator::new();
        let mut last_reason = None;

        for &(x, y) in &samples {
            match self.transform_coordinate(x, y, 0.0, direction) {
                Ok((tx, ty, _)) => bounds.include(tx, ty),
                Err(CrsError::Transform(failure)) => {
                    debug!("Skipping bounding box sample: {}", failure);
                    last_reason = Some(failure.reason);
                },
                Err(e) => return Err(e),
            }
        }

        match bounds.finish() {
            Some(result) => {
                let skipped = samples.len() - bounds.count;
                if skipped > 0 {
                    warn!("{} of {} boundary samples of {} could not be transformed ({})",
                          skipped, samples.len(), rect, direction);
                }
                debug!("Transformed bounding box {} -> {} ({})", rect, result, direction);
                Ok(result)
            },
            None => {
                let reason = format!("none of the {} boundary samples could be transformed: {}",
                                     samples.len(), last_reason.unwrap_or_default());
                let failure = TransformFailure::batch(samples.len(), direction, reason);
                self.report(Err(CrsError::Transform(failure)))
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_samples_cover_corners_and_edges() {
        let rect = BoundingBox::new(0.0, 0.0, 4.0, 2.0);
        let samples = boundary_samples(&rect, 4);
        assert_eq!(samples.len(), 16);

        for corner in rect.corners() {
            assert_eq!(samples.iter().filter(|s| **s == (corner.x, corner.y)).count(), 1);
        }
        // Edge midpoints are sampled
        assert!(samples.contains(&(2.0, 0.0)));
        assert!(samples.contains(&(4.0, 1.0)));
        assert!(samples.contains(&(2.0, 2.0)));
        assert!(samples.contains(&(0.0, 1.0)));
        assert!(samples.iter().all(|(x, y)| rect.contains(&(*x, *y).into())));
    }

    #[test]
    fn test_degenerate_rectangle_still_has_corners() {
        let rect = BoundingBox::new(5.0, 5.0, 5.0, 5.0);
        let samples = boundary_samples(&rect, 0);
        assert_eq!(samples.len(), 4);
        assert!(samples.iter().all(|s| *s == (5.0, 5.0)));
    }

    #[test]
    fn test_accumulator() {
        let mut bounds = BoundsAccumulator::new();
        assert!(bounds.finish().is_none());
        bounds.include(3.0, -1.0);
        bounds.include(-2.0, 4.0);
        assert_eq!(bounds.finish(), Some(BoundingBox::new(-2.0, -1.0, 3.0, 4.0)));
    }
}
