//! Coordinate parsing for the location map.
//!
//! Coordinates arrive as free text typed in the field, often with a comma
//! as decimal separator (`4,6097`). Numeric answers are accepted as well.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::catalog::keys;
use crate::session::Answers;

/// Which coordinate is being parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Axis {
    /// Latitude, degrees north.
    Latitude,
    /// Longitude, degrees east.
    Longitude,
}

impl Axis {
    const fn limit(self) -> f64 {
        match self {
            Self::Latitude => 90.0,
            Self::Longitude => 180.0,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Latitude => "latitude",
            Self::Longitude => "longitude",
        })
    }
}

/// A coordinate could not be turned into degrees.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoordinateError {
    /// The answer is absent or empty.
    #[error("missing {0}")]
    Missing(Axis),

    /// The answer is not a number.
    #[error("invalid {axis}: {raw:?}")]
    Malformed {
        /// Coordinate being parsed.
        axis: Axis,
        /// Text as entered.
        raw: String,
    },

    /// The number lies outside the valid range for its axis.
    #[error("{axis} {value} is outside -{limit}..={limit}", limit = .axis.limit())]
    OutOfRange {
        /// Coordinate being parsed.
        axis: Axis,
        /// Parsed value.
        value: f64,
    },
}

/// A parsed geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LonLat {
    /// Degrees east.
    pub lon: f64,
    /// Degrees north.
    pub lat: f64,
}

/// Parse a decimal number that may use `,` as decimal separator.
///
/// Surrounding whitespace is ignored. Returns `None` for anything that is
/// not a finite number.
#[must_use]
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let normalized = raw.trim().replace(',', ".");
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse one coordinate answer.
///
/// # Errors
///
/// Returns a [`CoordinateError`] describing why the value is unusable.
pub fn parse_coordinate(axis: Axis, value: Option<&Value>) -> Result<f64, CoordinateError> {
    let degrees = match value {
        None | Some(Value::Null) => return Err(CoordinateError::Missing(axis)),
        Some(Value::String(s)) if s.trim().is_empty() => return Err(CoordinateError::Missing(axis)),
        Some(Value::String(s)) => parse_decimal(s).ok_or_else(|| CoordinateError::Malformed {
            axis,
            raw: s.clone(),
        })?,
        Some(Value::Number(n)) => n.as_f64().ok_or_else(|| CoordinateError::Malformed {
            axis,
            raw: n.to_string(),
        })?,
        Some(other) => {
            return Err(CoordinateError::Malformed {
                axis,
                raw: other.to_string(),
            });
        }
    };
    if degrees.abs() > axis.limit() {
        return Err(CoordinateError::OutOfRange {
            axis,
            value: degrees,
        });
    }
    Ok(degrees)
}

/// Parse the latitude and longitude answers.
///
/// # Errors
///
/// Returns the first [`CoordinateError`], latitude checked first.
pub fn location(answers: &Answers) -> Result<LonLat, CoordinateError> {
    let lat = parse_coordinate(Axis::Latitude, answers.get(keys::LATITUDE))?;
    let lon = parse_coordinate(Axis::Longitude, answers.get(keys::LONGITUDE))?;
    Ok(LonLat { lon, lat })
}
