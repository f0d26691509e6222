//! Axis-aligned bounding box in a coordinate system

use std::fmt;

use super::point::Point;
use crate::crs::errors::{CrsError, CrsResult};

/// An axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Minimum X coordinate
    pub min_x: f64,
    /// Minimum Y coordinate
    pub min_y: f64,
    /// Maximum X coordinate
    pub max_x: f64,
    /// Maximum Y coordinate
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a new bounding box
    ///
    /// The values are stored as given; use [`BoundingBox::normalized`] when the
    /// caller cannot guarantee min <= max.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        BoundingBox {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Parse a bounding box from a string (format: "minx,miny,maxx,maxy")
    pub fn from_string(bbox_str: &str) -> CrsResult<Self> {
        let parts: Vec<&str> = bbox_str.split(',').collect();
        if parts.len() != 4 {
            return Err(CrsError::InvalidInput(
                "Bounding box must have 4 comma-separated values".to_string()));
        }

        let parse = |value: &str, name: &str| {
            value.trim().parse::<f64>()
                .map_err(|_| CrsError::InvalidInput(format!("Invalid {} value '{}'", name, value.trim())))
        };

        let min_x = parse(parts[0], "min_x")?;
        let min_y = parse(parts[1], "min_y")?;
        let max_x = parse(parts[2], "max_x")?;
        let max_y = parse(parts[3], "max_y")?;

        Ok(BoundingBox::new(min_x, min_y, max_x, max_y))
    }

    /// Create a buffer around a point (square buffer)
    pub fn from_point_buffer(center: &Point, buffer_size: f64) -> Self {
        BoundingBox::new(
            center.x - buffer_size,
            center.y - buffer_size,
            center.x + buffer_size,
            center.y + buffer_size,
        )
    }

    /// Copy of this box with min and max swapped where needed
    pub fn normalized(&self) -> Self {
        BoundingBox::new(
            self.min_x.min(self.max_x),
            self.min_y.min(self.max_y),
            self.min_x.max(self.max_x),
            self.min_y.max(self.max_y),
        )
    }

    /// Check that min <= max on both axes
    pub fn is_normalized(&self) -> bool {
        self.min_x <= self.max_x && self.min_y <= self.max_y
    }

    /// Whether all four bounds are finite numbers
    pub fn is_finite(&self) -> bool {
        self.min_x.is_finite() && self.min_y.is_finite() && self.max_x.is_finite() && self.max_y.is_finite()
    }

    /// Get the width of the bounding box
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Get the height of the bounding box
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Whether the box has zero width or zero height
    pub fn is_degenerate(&self) -> bool {
        self.width() == 0.0 || self.height() == 0.0
    }

    /// Get the center point of the bounding box
    pub fn center(&self) -> Point {
        Point::new(
            self.min_x + self.width() / 2.0,
            self.min_y + self.height() / 2.0,
        )
    }

    /// The four corners, counter-clockwise from (min_x, min_y)
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.min_x, self.min_y),
            Point::new(self.max_x, self.min_y),
            Point::new(self.max_x, self.max_y),
            Point::new(self.min_x, self.max_y),
        ]
    }

    /// Check if this bounding box contains a point
    pub fn contains(&self, point: &Point) -> bool {
        point.x >= self.min_x && point.x <= self.max_x &&
            point.y >= self.min_y && point.y <= self.max_y
    }

    /// Check if this bounding box contains a point, allowing `tolerance` on every side
    pub fn contains_with_tolerance(&self, point: &Point, tolerance: f64) -> bool {
        point.x >= self.min_x - tolerance && point.x <= self.max_x + tolerance &&
            point.y >= self.min_y - tolerance && point.y <= self.max_y + tolerance
    }

    /// Check if this bounding box fully contains another one
    pub fn contains_box(&self, other: &BoundingBox) -> bool {
        other.min_x >= self.min_x && other.max_x <= self.max_x &&
            other.min_y >= self.min_y && other.max_y <= self.max_y
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.min_x, self.min_y, self.max_x, self.max_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_string() {
        let bbox = BoundingBox::from_string("-10, -5, 10, 5").unwrap();
        assert_eq!(bbox, BoundingBox::new(-10.0, -5.0, 10.0, 5.0));
        assert!(BoundingBox::from_string("1,2,3").is_err());
        assert!(BoundingBox::from_string("1,2,3,north").is_err());
    }

    #[test]
    fn test_normalize_flipped_box() {
        let flipped = BoundingBox::new(10.0, 5.0, -10.0, -5.0);
        assert!(!flipped.is_normalized());
        let bbox = flipped.normalized();
        assert!(bbox.is_normalized());
        assert_eq!(bbox.width(), 20.0);
        assert_eq!(bbox.center(), Point::new(0.0, 0.0));
    }

    #[test]
    fn test_degenerate_and_containment() {
        let point_box = BoundingBox::from_point_buffer(&Point::new(3.0, 4.0), 0.0);
        assert!(point_box.is_degenerate());
        assert!(point_box.contains(&Point::new(3.0, 4.0)));
        assert!(!point_box.contains(&Point::new(3.0, 4.1)));
        assert!(point_box.contains_with_tolerance(&Point::new(3.0, 4.1), 0.2));

        let outer = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        assert!(outer.contains_box(&BoundingBox::new(1.0, 1.0, 2.0, 2.0)));
        assert!(!outer.contains_box(&BoundingBox::new(-1.0, 1.0, 2.0, 2.0)));
    }
}
