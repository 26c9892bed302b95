//! Well-known-text encoding for stored geometry.
//!
//! Only the three shapes the editor produces are supported:
//! `POINT (x y)`, `LINESTRING (x y, ...)` and `MULTILINESTRING ((x y, ...), ...)`.
//! Coordinates are written as integers; fractional input is rounded.

use bevy::math::IVec2;
use thiserror::Error;

use crate::map::GeometryData;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WktError {
    #[error("empty geometry text")]
    Empty,
    #[error("unsupported geometry type '{0}'")]
    UnknownType(String),
    #[error("malformed geometry text: {0}")]
    Malformed(String),
    #[error("invalid coordinate '{0}'")]
    BadCoordinate(String),
}

pub fn encode(geometry: &GeometryData) -> String {
    match geometry {
        GeometryData::Point(p) => format!("POINT ({} {})", p.x, p.y),
        GeometryData::LineString(points) => format!("LINESTRING ({})", coords(points)),
        GeometryData::MultiLineString(branches) => {
            let parts: Vec<String> = branches
                .iter()
                .map(|b| format!("({})", coords(b)))
                .collect();
            format!("MULTILINESTRING ({})", parts.join(", "))
        }
    }
}

fn coords(points: &[IVec2]) -> String {
    points
        .iter()
        .map(|p| format!("{} {}", p.x, p.y))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn decode(text: &str) -> Result<GeometryData, WktError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(WktError::Empty);
    }
    let open = text
        .find('(')
        .ok_or_else(|| WktError::Malformed(text.to_string()))?;
    let tag = text[..open].trim().to_ascii_uppercase();
    let body = text[open..].trim();
    let inner = body
        .strip_prefix('(')
        .and_then(|b| b.strip_suffix(')'))
        .ok_or_else(|| WktError::Malformed(text.to_string()))?;

    match tag.as_str() {
        "POINT" => Ok(GeometryData::Point(parse_coord(inner)?)),
        "LINESTRING" => Ok(GeometryData::LineString(parse_coords(inner)?)),
        "MULTILINESTRING" => {
            let mut branches = Vec::new();
            for chunk in inner.split(')') {
                let chunk = chunk.trim().trim_start_matches(',').trim();
                if chunk.is_empty() {
                    continue;
                }
                let chunk = chunk
                    .strip_prefix('(')
                    .ok_or_else(|| WktError::Malformed(text.to_string()))?;
                branches.push(parse_coords(chunk)?);
            }
            if branches.is_empty() {
                return Err(WktError::Empty);
            }
            Ok(GeometryData::MultiLineString(branches))
        }
        "" => Err(WktError::Malformed(text.to_string())),
        other => Err(WktError::UnknownType(other.to_string())),
    }
}

fn parse_coords(text: &str) -> Result<Vec<IVec2>, WktError> {
    text.split(',').map(parse_coord).collect()
}

fn parse_coord(text: &str) -> Result<IVec2, WktError> {
    let mut parts = text.split_whitespace();
    let (Some(x), Some(y), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(WktError::BadCoordinate(text.trim().to_string()));
    };
    Ok(IVec2::new(parse_number(x)?, parse_number(y)?))
}

fn parse_number(text: &str) -> Result<i32, WktError> {
    let value: f64 = text
        .parse()
        .map_err(|_| WktError::BadCoordinate(text.to_string()))?;
    if !value.is_finite() || value.abs() > i32::MAX as f64 {
        return Err(WktError::BadCoordinate(text.to_string()));
    }
    Ok(value.round() as i32)
}
