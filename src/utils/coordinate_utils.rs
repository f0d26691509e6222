//! Coordinate utility functions
//!
//! Reading and writing plain-text coordinate lists. A coordinate file holds
//! one `x,y` or `x,y,z` point per line; blank lines and `#` comments are
//! skipped.

use std::fs;
use log::debug;

use crate::coordinate::Point;
use crate::crs::errors::{CrsError, CrsResult};

/// Parse one line of a coordinate file
///
/// # Returns
/// `None` for blank and comment lines, the point otherwise
pub fn parse_coordinate_line(line: &str) -> CrsResult<Option<Point>> {
    let content = match line.find('#') {
        Some(index) => &line[..index],
        None => line,
    }.trim();

    if content.is_empty() {
        return Ok(None);
    }
    Point::from_string(content).map(Some)
}

/// Parse the content of a coordinate file
///
/// Errors name the offending line (1-based).
pub fn parse_coordinates(content: &str) -> CrsResult<Vec<Point>> {
    let mut points = Vec::new();
    for (index, line) in content.lines().enumerate() {
        match parse_coordinate_line(line) {
            Ok(Some(point)) => points.push(point),
            Ok(None) => {},
            Err(e) => return Err(CrsError::InvalidInput(format!("Line {}: {}", index + 1, e))),
        }
    }
    Ok(points)
}

/// Read all points from a coordinate file
pub fn read_coordinate_file(path: &str) -> CrsResult<Vec<Point>> {
    let content = fs::read_to_string(path)?;
    let points = parse_coordinates(&content)?;
    debug!("Read {} coordinates from {}", points.len(), path);
    Ok(points)
}

/// Format a point as `x,y[,z]`, optionally with a fixed number of decimals
pub fn format_point(point: &Point, precision: Option<usize>) -> String {
    match (precision, point.z) {
        (None, _) => point.to_string(),
        (Some(p), Some(z)) => format!("{:.*},{:.*},{:.*}", p, point.x, p, point.y, p, z),
        (Some(p), None) => format!("{:.*},{:.*}", p, point.x, p, point.y),
    }
}

/// Write points to a coordinate file, one per line
pub fn write_coordinate_file(path: &str, points: &[Point], precision: Option<usize>) -> CrsResult<()> {
    let mut content = String::with_capacity(points.len() * 32);
    for point in points {
        content.push_str(&format_point(point, precision));
        content.push('\n');
    }
    fs::write(path, content)?;
    debug!("Wrote {} coordinates to {}", points.len(), path);
    Ok(())
}
