//! Coordinate and fix types: where the device is.

use std::fmt;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Errors raised when a latitude/longitude pair is out of range.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoordinateError {
    #[error("latitude {0} is outside [-90, 90]")]
    Latitude(f64),

    #[error("longitude {0} is outside [-180, 180]")]
    Longitude(f64),
}

/// A latitude/longitude pair in decimal degrees (WGS 84).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Builds a coordinate, rejecting non-finite or out-of-range values.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinateError::Latitude(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinateError::Longitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ns = if self.latitude < 0.0 { 'S' } else { 'N' };
        let ew = if self.longitude < 0.0 { 'W' } else { 'E' };
        write!(
            f,
            "{:.5}°{ns} {:.5}°{ew}",
            self.latitude.abs(),
            self.longitude.abs()
        )
    }
}

/// One position report from a location provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fix {
    pub coordinate: Coordinate,

    /// Horizontal accuracy in meters, when the provider reports one.
    pub accuracy_m: Option<f64>,

    /// Altitude above mean sea level in meters.
    pub altitude_m: Option<f64>,

    /// When the provider took the reading.
    pub timestamp: Timestamp,
}

impl Fix {
    /// A fix with only a coordinate, stamped now.
    pub fn at(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            accuracy_m: None,
            altitude_m: None,
            timestamp: Timestamp::now(),
        }
    }
}
