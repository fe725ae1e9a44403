//! Device location access and the map's initial-centre gate.
//!
//! The provider is a trait so the platform positioning service can be swapped
//! for a scripted one in tests and on machines without a GPS.

use crate::logging::{self, Component};
use crate::model::Coordinate;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LocationError {
    PermissionDenied,
    /// Permission was granted but no fix came back (timeout, no hardware).
    Unavailable(String),
}

impl fmt::Display for LocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationError::PermissionDenied => write!(f, "location permission denied"),
            LocationError::Unavailable(msg) => write!(f, "position unavailable: {}", msg),
        }
    }
}

impl std::error::Error for LocationError {}

/// Source of foreground location permission and one-shot position fixes.
pub trait LocationProvider {
    fn request_foreground_permission(&self) -> PermissionStatus;
    fn current_position(&self) -> Result<Coordinate, LocationError>;
}

impl<L: LocationProvider + ?Sized> LocationProvider for Rc<L> {
    fn request_foreground_permission(&self) -> PermissionStatus {
        (**self).request_foreground_permission()
    }

    fn current_position(&self) -> Result<Coordinate, LocationError> {
        (**self).current_position()
    }
}

/// Requests permission, then takes a single fix.
///
/// A fix outside the valid coordinate ranges is reported as unavailable.
pub fn capture_fix(provider: &dyn LocationProvider) -> Result<Coordinate, LocationError> {
    let status = provider.request_foreground_permission();
    logging::debug(Component::Location, None, &format!("Location permission: {:?}", status));
    if status != PermissionStatus::Granted {
        return Err(LocationError::PermissionDenied);
    }

    let fix = provider.current_position()?;
    if !fix.is_valid() {
        return Err(LocationError::Unavailable(format!("fix out of range ({})", fix)));
    }
    Ok(fix)
}

// ---------------------------------------------------------------------------
// Map centre gate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CenterSource {
    Device,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapCenter {
    pub coordinate: Coordinate,
    pub source: CenterSource,
}

/// Resolves the map's initial centre once per screen mount.
///
/// Always yields a centre: the device fix when permission is granted and a
/// fix arrives, otherwise the configured fallback. A refusal is not retried
/// until the screen is mounted again.
#[derive(Debug, Clone)]
pub struct LocationGate {
    fallback: Coordinate,
    resolved: Option<MapCenter>,
}

impl LocationGate {
    pub fn new(fallback: Coordinate) -> Self {
        LocationGate {
            fallback,
            resolved: None,
        }
    }

    /// Forget the previous answer; called when the map screen is mounted.
    pub fn reset(&mut self) {
        self.resolved = None;
    }

    pub fn resolved(&self) -> Option<MapCenter> {
        self.resolved
    }

    pub fn resolve(&mut self, provider: &dyn LocationProvider) -> MapCenter {
        if let Some(center) = self.resolved {
            return center;
        }

        let center = match capture_fix(provider) {
            Ok(coordinate) => {
                logging::info(Component::Location, None, &format!("Got location: {}", coordinate));
                MapCenter {
                    coordinate,
                    source: CenterSource::Device,
                }
            }
            Err(e) => {
                logging::log_location_failure("initial fix", &e);
                MapCenter {
                    coordinate: self.fallback,
                    source: CenterSource::Fallback,
                }
            }
        };

        self.resolved = Some(center);
        center
    }
}

// ---------------------------------------------------------------------------
// Scripted provider
// ---------------------------------------------------------------------------

/// A provider with fixed answers, counting how often it is asked.
///
/// Used by the CLI (a desktop has no GPS; the fix comes from flags) and by
/// tests.
#[derive(Debug)]
pub struct StaticLocation {
    permission: PermissionStatus,
    fix: Option<Coordinate>,
    permission_requests: Cell<u32>,
    fix_requests: Cell<u32>,
}

impl StaticLocation {
    pub fn granted(fix: Coordinate) -> Self {
        Self::with(PermissionStatus::Granted, Some(fix))
    }

    pub fn denied() -> Self {
        Self::with(PermissionStatus::Denied, None)
    }

    /// Permission granted, but the positioning hardware never answers.
    pub fn unavailable() -> Self {
        Self::with(PermissionStatus::Granted, None)
    }

    fn with(permission: PermissionStatus, fix: Option<Coordinate>) -> Self {
        StaticLocation {
            permission,
            fix,
            permission_requests: Cell::new(0),
            fix_requests: Cell::new(0),
        }
    }

    pub fn permission_requests(&self) -> u32 {
        self.permission_requests.get()
    }

    pub fn fix_requests(&self) -> u32 {
        self.fix_requests.get()
    }
}

impl LocationProvider for StaticLocation {
    fn request_foreground_permission(&self) -> PermissionStatus {
        self.permission_requests.set(self.permission_requests.get() + 1);
        self.permission
    }

    fn current_position(&self) -> Result<Coordinate, LocationError> {
        self.fix_requests.set(self.fix_requests.get() + 1);
        self.fix
            .ok_or_else(|| LocationError::Unavailable("no position fix".to_string()))
    }
}
