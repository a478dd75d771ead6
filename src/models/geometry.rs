//! WKT geometry validation
//!
//! Positions, paths and zone boundaries travel through the API as WKT text
//! (`POINT(13.06 55.57)`) in longitude/latitude order, SRID 4326. PostGIS does
//! the spatial work; this module only checks that the text is well formed
//! before it reaches the database. Parsing is done by the `wkt` crate into
//! `geo-types` values.

use std::borrow::Cow;

use geo_types::{Coord, Geometry, LineString, Point, Polygon};
use thiserror::Error;
use validator::ValidationError;
use wkt::Wkt;

pub use wkt::ToWkt;

#[derive(Debug, Error, PartialEq)]
pub enum WktError {
    #[error("Invalid WKT format: {0}")]
    Malformed(String),

    #[error("Geometry must be a {0}")]
    WrongType(&'static str),

    #[error(
        "Invalid coordinates ({0}, {1}). Longitude must be between -180 and 180, \
         latitude must be between -90 and 90"
    )]
    OutOfBounds(f64, f64),

    #[error("{0}")]
    InvalidShape(String),
}

/// Drop an EWKT `SRID=...;` prefix
fn strip_srid(text: &str) -> Result<&str, WktError> {
    let has_srid = text
        .get(..5)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("SRID="));
    if !has_srid {
        return Ok(text);
    }
    text.split_once(';')
        .map(|(_, rest)| rest.trim())
        .ok_or_else(|| WktError::Malformed("SRID prefix without ';'".to_string()))
}

/// Parse WKT (optionally EWKT) into a `geo-types` geometry.
///
/// Polygon rings are checked before conversion because `geo-types` closes
/// open rings silently.
pub fn parse_wkt(input: &str) -> Result<Geometry<f64>, WktError> {
    // Keywords are matched case-insensitively
    let text = strip_srid(input.trim())?.to_ascii_uppercase();
    let parsed: Wkt<f64> = text
        .parse()
        .map_err(|e| WktError::Malformed(format!("{}", e)))?;

    if let wkt::Geometry::Polygon(polygon) = &parsed.item {
        if polygon.0.is_empty() {
            return Err(WktError::InvalidShape(
                "A polygon needs at least one ring".to_string(),
            ));
        }
        for ring in &polygon.0 {
            let points = &ring.0;
            if points.len() < 4 {
                return Err(WktError::InvalidShape(
                    "A polygon ring needs at least four points".to_string(),
                ));
            }
            let closed = match (points.first(), points.last()) {
                (Some(first), Some(last)) => first.x == last.x && first.y == last.y,
                _ => false,
            };
            if !closed {
                return Err(WktError::InvalidShape(
                    "A polygon ring must be closed".to_string(),
                ));
            }
        }
    }

    Geometry::try_from(parsed).map_err(|e| WktError::Malformed(e.to_string()))
}

fn check_bounds<'a>(coords: impl IntoIterator<Item = &'a Coord<f64>>) -> Result<(), WktError> {
    for c in coords {
        if !(-180.0..=180.0).contains(&c.x) || !(-90.0..=90.0).contains(&c.y) {
            return Err(WktError::OutOfBounds(c.x, c.y));
        }
    }
    Ok(())
}

/// Validate a WKT `POINT`
pub fn validate_point(input: &str) -> Result<Point<f64>, WktError> {
    match parse_wkt(input)? {
        Geometry::Point(point) => {
            check_bounds([&point.0])?;
            Ok(point)
        }
        _ => Err(WktError::WrongType("Point")),
    }
}

/// Validate a WKT `LINESTRING` of at least two points
pub fn validate_linestring(input: &str) -> Result<LineString<f64>, WktError> {
    match parse_wkt(input)? {
        Geometry::LineString(line) => {
            if line.0.len() < 2 {
                return Err(WktError::InvalidShape(
                    "A linestring needs at least two points".to_string(),
                ));
            }
            check_bounds(line.coords())?;
            Ok(line)
        }
        _ => Err(WktError::WrongType("LineString")),
    }
}

/// Validate a WKT `POLYGON`: closed rings of at least four points
pub fn validate_polygon(input: &str) -> Result<Polygon<f64>, WktError> {
    match parse_wkt(input)? {
        Geometry::Polygon(polygon) => {
            check_bounds(polygon.exterior().coords())?;
            for hole in polygon.interiors() {
                check_bounds(hole.coords())?;
            }
            Ok(polygon)
        }
        _ => Err(WktError::WrongType("Polygon")),
    }
}

fn to_validation_error(code: &'static str, err: WktError) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Owned(err.to_string()));
    error
}

/// `validator` hook for WKT points
pub fn wkt_point(value: &str) -> Result<(), ValidationError> {
    validate_point(value)
        .map(|_| ())
        .map_err(|e| to_validation_error("wkt_point", e))
}

/// `validator` hook for WKT linestrings
pub fn wkt_linestring(value: &str) -> Result<(), ValidationError> {
    validate_linestring(value)
        .map(|_| ())
        .map_err(|e| to_validation_error("wkt_linestring", e))
}

/// `validator` hook for WKT polygons
pub fn wkt_polygon(value: &str) -> Result<(), ValidationError> {
    validate_polygon(value)
        .map(|_| ())
        .map_err(|e| to_validation_error("wkt_polygon", e))
}
