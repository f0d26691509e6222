//! Point structure for representing coordinates

use std::fmt;

use crate::crs::errors::{CrsError, CrsResult};

/// A point in a coordinate system
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// X coordinate (longitude in geographic systems)
    pub x: f64,
    /// Y coordinate (latitude in geographic systems)
    pub y: f64,
    /// Z coordinate (elevation, optional)
    pub z: Option<f64>,
}

impl Point {
    /// Create a new 2D point
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y, z: None }
    }

    /// Create a new 3D point
    pub fn new_3d(x: f64, y: f64, z: f64) -> Self {
        Point { x, y, z: Some(z) }
    }

    /// Check if this point has a Z coordinate
    pub fn has_z(&self) -> bool {
        self.z.is_some()
    }

    /// Get the Z coordinate, or 0.0 if not present
    pub fn z_value(&self) -> f64 {
        self.z.unwrap_or(0.0)
    }

    /// Copy of this point with new x/y and, when this point has one, a new z
    pub(crate) fn with_coordinates(&self, x: f64, y: f64, z: f64) -> Self {
        Point {
            x,
            y,
            z: self.z.map(|_| z),
        }
    }

    /// Parse a point from a string (format: "x,y" or "x,y,z")
    pub fn from_string(point_str: &str) -> CrsResult<Self> {
        let parts: Vec<&str> = point_str.split(',').map(str::trim).collect();
        if parts.len() != 2 && parts.len() != 3 {
            return Err(CrsError::InvalidInput(format!(
                "Point must have 2 or 3 comma-separated values, got '{}'", point_str)));
        }

        let mut values = [0.0; 3];
        for (value, part) in values.iter_mut().zip(&parts) {
            *value = part.parse::<f64>()
                .map_err(|_| CrsError::InvalidInput(format!("Invalid coordinate value '{}'", part)))?;
        }

        Ok(if parts.len() == 3 {
            Point::new_3d(values[0], values[1], values[2])
        } else {
            Point::new(values[0], values[1])
        })
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.z {
            Some(z) => write!(f, "{},{},{}", self.x, self.y, z),
            None => write!(f, "{},{}", self.x, self.y),
        }
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Point::new(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_points() {
        assert_eq!(Point::from_string("1.5, -2").unwrap(), Point::new(1.5, -2.0));
        assert_eq!(Point::from_string("1,2,3").unwrap(), Point::new_3d(1.0, 2.0, 3.0));
        assert!(Point::from_string("1").is_err());
        assert!(Point::from_string("1,x").is_err());
    }

    #[test]
    fn test_z_passthrough_shape() {
        let flat = Point::new(1.0, 2.0).with_coordinates(3.0, 4.0, 9.0);
        assert_eq!(flat.z, None);
        let tall = Point::new_3d(1.0, 2.0, 5.0).with_coordinates(3.0, 4.0, 9.0);
        assert_eq!(tall.z, Some(9.0));
        assert_eq!(tall.to_string(), "3,4,9");
    }
}
