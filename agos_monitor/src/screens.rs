//! Screen controllers and navigation.
//!
//! Each screen owns its own state (the map its gauge list and centre, the
//! form its draft); nothing is shared between screens except through the
//! store and navigation. `App` wires the screens to a store, a location
//! provider and a notice queue standing in for blocking alert dialogs.

use crate::config::{AppConfig, MapConfig};
use crate::form::{DeviceDraft, GaugeDefaults};
use crate::gauges::{GaugeListCache, RefreshOutcome};
use crate::location::{self, LocationError, LocationGate, LocationProvider};
use crate::logging::{self, Component};
use crate::markers::{self, MapRegion, Marker, StatusSummary};
use crate::model::{AppError, Coordinate, GaugeRecord, Notice};
use crate::store::GaugeStore;

pub const APP_NAME: &str = "Agos";
pub const TAGLINE: &str = "Real-Time Water Level Monitoring";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Landing,
    Map,
    AddDevice,
}

/// Back-stack of screens. The landing screen is always at the bottom.
#[derive(Debug, Clone)]
pub struct Navigator {
    stack: Vec<Screen>,
}

impl Default for Navigator {
    fn default() -> Self {
        Navigator {
            stack: vec![Screen::Landing],
        }
    }
}

impl Navigator {
    pub fn current(&self) -> Screen {
        self.stack.last().copied().unwrap_or(Screen::Landing)
    }

    pub fn push(&mut self, screen: Screen) {
        self.stack.push(screen);
    }

    /// Pops the current screen and returns the one now showing, or `None`
    /// when already at the root.
    pub fn back(&mut self) -> Option<Screen> {
        if self.stack.len() <= 1 {
            return None;
        }
        self.stack.pop();
        Some(self.current())
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

// ---------------------------------------------------------------------------
// Map screen
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct MapScreen {
    gate: LocationGate,
    cache: GaugeListCache,
    region: Option<MapRegion>,
    latitude_delta: f64,
    longitude_delta: f64,
    loading: bool,
}

impl MapScreen {
    pub fn new(config: &MapConfig) -> Self {
        MapScreen {
            gate: LocationGate::new(config.fallback()),
            cache: GaugeListCache::new(),
            region: None,
            latitude_delta: config.latitude_delta,
            longitude_delta: config.longitude_delta,
            loading: true,
        }
    }

    /// Resolves the centre (once per mount) and loads the list.
    pub fn on_mount(
        &mut self,
        provider: &dyn LocationProvider,
        store: &dyn GaugeStore,
        notices: &mut Vec<Notice>,
    ) -> RefreshOutcome {
        self.loading = true;
        self.gate.reset();
        let center = self.gate.resolve(provider);
        self.region = Some(MapRegion {
            center,
            latitude_delta: self.latitude_delta,
            longitude_delta: self.longitude_delta,
        });
        self.loading = false;

        self.on_focus(store, notices)
    }

    /// Re-fetches the list; a failure keeps the old one and raises a notice.
    pub fn on_focus(&mut self, store: &dyn GaugeStore, notices: &mut Vec<Notice>) -> RefreshOutcome {
        let outcome = self.cache.refresh(store);
        match &outcome {
            RefreshOutcome::Applied { count } => {
                logging::info(Component::Map, None, &format!("Loaded {} gauges", count));
            }
            RefreshOutcome::Failed(e) => {
                notices.push(AppError::FetchFailed(e.clone()).notice());
            }
            RefreshOutcome::Discarded { .. } => {}
        }
        outcome
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn region(&self) -> Option<MapRegion> {
        self.region
    }

    pub fn gauges(&self) -> &[GaugeRecord] {
        self.cache.gauges()
    }

    pub fn cache(&self) -> &GaugeListCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut GaugeListCache {
        &mut self.cache
    }

    pub fn markers(&self) -> Vec<Marker> {
        markers::project_markers(self.cache.gauges())
    }

    pub fn summary(&self) -> StatusSummary {
        StatusSummary::from_gauges(self.cache.gauges())
    }
}

// ---------------------------------------------------------------------------
// Add-device screen
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct AddDeviceScreen {
    pub draft: DeviceDraft,
    submitting: bool,
    capturing: bool,
}

impl AddDeviceScreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn is_capturing(&self) -> bool {
        self.capturing
    }

    /// One-shot "use current location". Denial raises its own notice; the
    /// draft's coordinates are left as they were.
    pub fn capture_location(
        &mut self,
        provider: &dyn LocationProvider,
        notices: &mut Vec<Notice>,
    ) -> Result<Coordinate, AppError> {
        self.capturing = true;
        let result = location::capture_fix(provider);
        self.capturing = false;

        match result {
            Ok(fix) => {
                self.draft.set_coordinate(fix);
                notices.push(Notice::new("Success", "Current location captured!"));
                Ok(fix)
            }
            Err(e) => {
                logging::log_location_failure("capture", &e);
                let err = match e {
                    LocationError::PermissionDenied => AppError::PermissionDenied,
                    LocationError::Unavailable(msg) => AppError::LocationUnavailable(msg),
                };
                notices.push(err.notice());
                Err(err)
            }
        }
    }

    /// Validates and inserts. On any failure the draft is kept for correction.
    pub fn submit(
        &mut self,
        store: &dyn GaugeStore,
        defaults: &GaugeDefaults,
        notices: &mut Vec<Notice>,
    ) -> Result<GaugeRecord, AppError> {
        let device = match self.draft.validate() {
            Ok(device) => device,
            Err(e) => {
                let err = AppError::ValidationFailed(e);
                notices.push(err.notice());
                return Err(err);
            }
        };

        self.submitting = true;
        let result = store.insert(&device.into_new_gauge(defaults));
        self.submitting = false;

        match result {
            Ok(record) => {
                logging::info(
                    Component::Form,
                    Some(&record.id.0),
                    &format!("Added device {}", record.name),
                );
                self.draft.clear();
                notices.push(Notice::new("Success", "Device added successfully!"));
                Ok(record)
            }
            Err(e) => {
                logging::log_store_failure("insert", &e);
                let err = AppError::SubmitFailed(e);
                notices.push(err.notice());
                Err(err)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub struct App {
    store: Box<dyn GaugeStore>,
    location: Box<dyn LocationProvider>,
    defaults: GaugeDefaults,
    navigator: Navigator,
    map: MapScreen,
    add_device: Option<AddDeviceScreen>,
    notices: Vec<Notice>,
}

impl App {
    pub fn new(
        config: &AppConfig,
        store: Box<dyn GaugeStore>,
        location: Box<dyn LocationProvider>,
    ) -> Self {
        App {
            store,
            location,
            defaults: config.defaults.gauge_defaults(),
            navigator: Navigator::default(),
            map: MapScreen::new(&config.map),
            add_device: None,
            notices: Vec::new(),
        }
    }

    pub fn current_screen(&self) -> Screen {
        self.navigator.current()
    }

    pub fn store(&self) -> &dyn GaugeStore {
        self.store.as_ref()
    }

    pub fn map(&self) -> &MapScreen {
        &self.map
    }

    pub fn add_device(&self) -> Option<&AddDeviceScreen> {
        self.add_device.as_ref()
    }

    pub fn add_device_mut(&mut self) -> Option<&mut AddDeviceScreen> {
        self.add_device.as_mut()
    }

    /// Drains notices raised since the last call, oldest first.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Landing → map. Mounts the map screen.
    pub fn open_map(&mut self) -> RefreshOutcome {
        self.navigator.push(Screen::Map);
        self.map
            .on_mount(self.location.as_ref(), self.store.as_ref(), &mut self.notices)
    }

    /// Map → add-device, with an empty draft.
    pub fn open_add_device(&mut self) {
        self.navigator.push(Screen::AddDevice);
        self.add_device = Some(AddDeviceScreen::new());
    }

    /// Navigates back. Leaving the form discards its draft; arriving on the
    /// map re-fetches the list.
    pub fn back(&mut self) -> Option<Screen> {
        let left = self.navigator.current();
        let now = self.navigator.back()?;
        if left == Screen::AddDevice {
            self.add_device = None;
        }
        if now == Screen::Map {
            self.map.on_focus(self.store.as_ref(), &mut self.notices);
        }
        Some(now)
    }

    pub fn capture_location(&mut self) -> Result<Coordinate, AppError> {
        let form = self
            .add_device
            .get_or_insert_with(AddDeviceScreen::new);
        form.capture_location(self.location.as_ref(), &mut self.notices)
    }

    /// Submits the form; on success returns to the previous screen.
    pub fn submit_device(&mut self) -> Result<GaugeRecord, AppError> {
        let form = self
            .add_device
            .get_or_insert_with(AddDeviceScreen::new);
        let record = form.submit(self.store.as_ref(), &self.defaults, &mut self.notices)?;
        if self.navigator.current() == Screen::AddDevice {
            self.back();
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigator_never_pops_landing() {
        let mut nav = Navigator::default();
        assert_eq!(nav.back(), None);
        nav.push(Screen::Map);
        nav.push(Screen::AddDevice);
        assert_eq!(nav.back(), Some(Screen::Map));
        assert_eq!(nav.back(), Some(Screen::Landing));
        assert_eq!(nav.back(), None);
        assert_eq!(nav.depth(), 1);
    }

    #[test]
    fn test_new_map_screen_is_loading_without_region() {
        let screen = MapScreen::new(&MapConfig::default());
        assert!(screen.is_loading());
        assert!(screen.region().is_none());
        assert!(screen.markers().is_empty());
    }
}
