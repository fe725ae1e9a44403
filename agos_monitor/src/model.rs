/// Core data types for the Agos water monitoring client.
///
/// This module defines the shared domain model imported by all other modules:
/// gauge records as the table store returns them, the insert payload, and the
/// error types that cross module boundaries. It contains no I/O.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Name of the gauge table in the hosted store.
pub const GAUGE_TABLE: &str = "water_gauges";

/// Map centre used when the device position is unavailable (Pakil, Laguna).
pub const FALLBACK_LATITUDE: f64 = 14.3833;
pub const FALLBACK_LONGITUDE: f64 = 121.4667;

/// Initial zoom of the map, in degrees of latitude/longitude shown.
pub const DEFAULT_REGION_DELTA: f64 = 0.1;

/// Values written for a freshly registered device, in meters.
pub const DEFAULT_WATER_LEVEL_M: f64 = 0.0;
pub const DEFAULT_MAX_CAPACITY_M: f64 = 10.0;

// ---------------------------------------------------------------------------
// Coordinates
// ---------------------------------------------------------------------------

/// A WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Coordinate { latitude, longitude }
    }

    /// The fixed centre shown when no device fix is available.
    pub fn fallback() -> Self {
        Coordinate::new(FALLBACK_LATITUDE, FALLBACK_LONGITUDE)
    }

    /// Both components are finite and inside their ranges.
    pub fn is_valid(&self) -> bool {
        latitude_in_range(self.latitude) && longitude_in_range(self.longitude)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

pub fn latitude_in_range(latitude: f64) -> bool {
    (-90.0..=90.0).contains(&latitude)
}

pub fn longitude_in_range(longitude: f64) -> bool {
    (-180.0..=180.0).contains(&longitude)
}

// ---------------------------------------------------------------------------
// Gauge status
// ---------------------------------------------------------------------------

/// Coarse severity of a gauge's current reading.
///
/// The store keeps status as free text. Anything other than the three known
/// values (including a missing value) becomes `Unknown`, which renders with
/// the neutral marker colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GaugeStatus {
    Normal,
    Warning,
    Critical,
    Unknown,
}

impl GaugeStatus {
    /// Case-insensitive parse; never fails.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "normal" => GaugeStatus::Normal,
            "warning" => GaugeStatus::Warning,
            "critical" => GaugeStatus::Critical,
            _ => GaugeStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GaugeStatus::Normal => "normal",
            GaugeStatus::Warning => "warning",
            GaugeStatus::Critical => "critical",
            GaugeStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for GaugeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for GaugeStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for GaugeStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw.as_deref().map(GaugeStatus::parse).unwrap_or(GaugeStatus::Unknown))
    }
}

// ---------------------------------------------------------------------------
// Gauge records
// ---------------------------------------------------------------------------

/// Opaque row identifier assigned by the store.
///
/// Hosted tables may use integer or UUID keys; both are held as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct GaugeId(pub String);

impl<'de> Deserialize<'de> for GaugeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Integer(i64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(text) => GaugeId(text),
            RawId::Integer(n) => GaugeId(n.to_string()),
        })
    }
}

impl fmt::Display for GaugeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One row of the `water_gauges` table.
///
/// The store owns these; the client only ever holds read-only snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaugeRecord {
    pub id: GaugeId,
    #[serde(default, deserialize_with = "empty_if_null")]
    pub name: String,
    /// Human-readable location description, e.g. "Pasig City, Metro Manila".
    #[serde(default, deserialize_with = "empty_if_null")]
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Current reading, meters.
    #[serde(default, deserialize_with = "zero_if_null")]
    pub water_level: f64,
    /// Level at which the site is considered full, meters.
    #[serde(default, deserialize_with = "zero_if_null")]
    pub max_capacity: f64,
    #[serde(default = "unknown_status")]
    pub status: GaugeStatus,
    /// `timestamptz` or plain `timestamp`; the latter is taken as UTC.
    #[serde(deserialize_with = "utc_timestamp")]
    pub created_at: DateTime<Utc>,
}

fn unknown_status() -> GaugeStatus {
    GaugeStatus::Unknown
}

fn zero_if_null<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}

fn empty_if_null<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn utc_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_utc_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", raw)))
}

/// Parses an RFC 3339 timestamp, or a zone-less one which is read as UTC.
pub fn parse_utc_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = raw.parse::<DateTime<Utc>>() {
        return Some(dt);
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

impl GaugeRecord {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    /// Fraction of capacity currently used. `None` when capacity is not positive.
    pub fn fill_ratio(&self) -> Option<f64> {
        if self.max_capacity > 0.0 {
            Some(self.water_level / self.max_capacity)
        } else {
            None
        }
    }
}

/// Insert payload for a new gauge device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewGauge {
    pub name: String,
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
    pub water_level: f64,
    pub max_capacity: f64,
    pub status: GaugeStatus,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors from a gauge store call.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Non-2xx HTTP response, with the store's message if it sent one.
    HttpError(u16, String),
    /// The request never completed (offline, DNS, timeout).
    Transport(String),
    /// The response body could not be deserialized.
    ParseError(String),
    /// The database backend reported an error.
    Database(String),
    /// The call succeeded but the store refused or returned nothing usable.
    Rejected(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::HttpError(code, msg) if msg.is_empty() => write!(f, "HTTP error: {}", code),
            StoreError::HttpError(code, msg) => write!(f, "HTTP error: {} ({})", code, msg),
            StoreError::Transport(msg) => write!(f, "Network error: {}", msg),
            StoreError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            StoreError::Database(msg) => write!(f, "Database error: {}", msg),
            StoreError::Rejected(msg) => write!(f, "Rejected: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

/// A blocking, user-visible message, the CLI's stand-in for an alert dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Notice {
            title: title.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}

/// Terminal failure of a user action.
///
/// Each is caught where the action runs and reported through a `Notice`;
/// none of them tears down a screen.
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// Location permission refused while capturing a position for the form.
    PermissionDenied,
    /// Permission granted but no fix could be obtained.
    LocationUnavailable(String),
    /// Reading the gauge list failed; the previous list stays on screen.
    FetchFailed(StoreError),
    /// Inserting a device failed; the draft stays populated.
    SubmitFailed(StoreError),
    /// The draft did not pass validation; nothing was sent.
    ValidationFailed(crate::form::ValidationError),
}

impl AppError {
    pub fn notice(&self) -> Notice {
        match self {
            AppError::PermissionDenied => {
                Notice::new("Permission Denied", "Location permission is required")
            }
            AppError::LocationUnavailable(_) => {
                Notice::new("Error", "Failed to get current location")
            }
            AppError::FetchFailed(e) => {
                Notice::new("Error", format!("Failed to load devices: {}", e))
            }
            AppError::SubmitFailed(e) => {
                Notice::new("Error", format!("Failed to add device: {}", e))
            }
            AppError::ValidationFailed(e) => Notice::new("Error", e.message()),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::PermissionDenied => write!(f, "Location permission denied"),
            AppError::LocationUnavailable(msg) => write!(f, "Location unavailable: {}", msg),
            AppError::FetchFailed(e) => write!(f, "Fetch failed: {}", e),
            AppError::SubmitFailed(e) => write!(f, "Submit failed: {}", e),
            AppError::ValidationFailed(e) => write!(f, "Validation failed: {}", e.message()),
        }
    }
}

impl std::error::Error for AppError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
