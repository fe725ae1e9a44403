//! Add-device form: draft state and validation.
//!
//! Checks run in a fixed order and stop at the first failure:
//!   name → location → coordinates present and numeric → coordinates in range
//!
//! A draft that fails validation never produces a `NewGauge`, so nothing
//! reaches the store.

use crate::model::{
    Coordinate, DEFAULT_MAX_CAPACITY_M, DEFAULT_WATER_LEVEL_M, GaugeStatus, NewGauge,
    latitude_in_range, longitude_in_range,
};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    MissingName,
    MissingLocation,
    MissingCoordinates,
    InvalidCoordinates,
    OutOfRange,
}

impl ValidationError {
    /// Text shown to the user.
    pub fn message(&self) -> &'static str {
        match self {
            ValidationError::MissingName => "Please enter device name",
            ValidationError::MissingLocation => "Please enter location description",
            ValidationError::MissingCoordinates => "Please set coordinates",
            ValidationError::InvalidCoordinates => "Invalid coordinates",
            ValidationError::OutOfRange => "Coordinates out of range",
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for ValidationError {}

/// Values written into fields the form does not collect.
#[derive(Debug, Clone, PartialEq)]
pub struct GaugeDefaults {
    pub water_level: f64,
    pub max_capacity: f64,
    pub status: GaugeStatus,
}

impl Default for GaugeDefaults {
    fn default() -> Self {
        GaugeDefaults {
            water_level: DEFAULT_WATER_LEVEL_M,
            max_capacity: DEFAULT_MAX_CAPACITY_M,
            status: GaugeStatus::Normal,
        }
    }
}

/// Free-text form fields, exactly as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceDraft {
    pub name: String,
    pub location: String,
    pub latitude: String,
    pub longitude: String,
}

/// A draft that passed validation, with trimmed text and parsed coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidDevice {
    pub name: String,
    pub location: String,
    pub coordinate: Coordinate,
}

impl DeviceDraft {
    pub fn new(
        name: impl Into<String>,
        location: impl Into<String>,
        latitude: impl Into<String>,
        longitude: impl Into<String>,
    ) -> Self {
        DeviceDraft {
            name: name.into(),
            location: location.into(),
            latitude: latitude.into(),
            longitude: longitude.into(),
        }
    }

    /// Fills both coordinate fields from a fix, six decimals each.
    pub fn set_coordinate(&mut self, coordinate: Coordinate) {
        self.latitude = format!("{:.6}", coordinate.latitude);
        self.longitude = format!("{:.6}", coordinate.longitude);
    }

    pub fn clear(&mut self) {
        *self = DeviceDraft::default();
    }

    pub fn validate(&self) -> Result<ValidDevice, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingName);
        }

        let location = self.location.trim();
        if location.is_empty() {
            return Err(ValidationError::MissingLocation);
        }

        let (lat_text, lon_text) = (self.latitude.trim(), self.longitude.trim());
        if lat_text.is_empty() || lon_text.is_empty() {
            return Err(ValidationError::MissingCoordinates);
        }

        let (latitude, longitude) = match (parse_degrees(lat_text), parse_degrees(lon_text)) {
            (Some(lat), Some(lon)) => (lat, lon),
            _ => return Err(ValidationError::InvalidCoordinates),
        };

        if !latitude_in_range(latitude) || !longitude_in_range(longitude) {
            return Err(ValidationError::OutOfRange);
        }

        Ok(ValidDevice {
            name: name.to_string(),
            location: location.to_string(),
            coordinate: Coordinate::new(latitude, longitude),
        })
    }
}

/// Strict decimal parse; "14.6abc", "NaN" and "inf" are all rejected.
fn parse_degrees(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

impl ValidDevice {
    pub fn into_new_gauge(self, defaults: &GaugeDefaults) -> NewGauge {
        NewGauge {
            name: self.name,
            location: self.location,
            latitude: self.coordinate.latitude,
            longitude: self.coordinate.longitude,
            water_level: defaults.water_level,
            max_capacity: defaults.max_capacity,
            status: defaults.status,
        }
    }
}
