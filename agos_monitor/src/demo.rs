/// Demo mode: a seeded in-memory gauge table.
///
/// With `backend = "demo"` (or `--demo`) the client runs against these
/// sample devices around Laguna de Bay and Metro Manila.
/// The set covers every status, including one the app does not recognise,
/// so all marker colours show up.

use crate::logging;
use crate::model::{GaugeStatus, NewGauge};
use crate::store::{GaugeStore, MemoryGaugeStore};

/// A sample device in the demo registry.
pub struct DemoGauge {
    pub name: &'static str,
    pub location: &'static str,
    /// WGS84 latitude.
    pub latitude: f64,
    /// WGS84 longitude.
    pub longitude: f64,
    pub water_level: f64,
    pub max_capacity: f64,
    /// Raw status text as the store would hold it.
    pub status: &'static str,
}

pub static DEMO_GAUGES: &[DemoGauge] = &[
    DemoGauge {
        name: "Pakil Creek Sensor",
        location: "Pakil, Laguna",
        latitude: 14.3811,
        longitude: 121.4790,
        water_level: 1.2,
        max_capacity: 10.0,
        status: "normal",
    },
    DemoGauge {
        name: "Paete Lakeshore Gauge",
        location: "Paete, Laguna",
        latitude: 14.3650,
        longitude: 121.4830,
        water_level: 6.4,
        max_capacity: 10.0,
        status: "warning",
    },
    DemoGauge {
        name: "Pasig River Monitor",
        location: "Pasig City, Metro Manila",
        latitude: 14.5764,
        longitude: 121.0851,
        water_level: 9.1,
        max_capacity: 10.0,
        status: "critical",
    },
    DemoGauge {
        name: "Marikina Bridge Gauge",
        location: "Marikina City, Metro Manila",
        latitude: 14.6360,
        longitude: 121.0930,
        water_level: 3.0,
        max_capacity: 18.0,
        status: "normal",
    },
    DemoGauge {
        name: "Santa Cruz River Sensor",
        location: "Santa Cruz, Laguna",
        latitude: 14.2787,
        longitude: 121.4156,
        water_level: 0.0,
        max_capacity: 8.0,
        status: "maintenance",
    },
];

/// Inserts the demo registry into `store`, in registry order.
///
/// Returns how many rows were written; a failed insert is logged and the
/// remaining gauges are still tried.
pub fn seed(store: &dyn GaugeStore) -> usize {
    let mut written = 0;
    for gauge in DEMO_GAUGES {
        let row = NewGauge {
            name: gauge.name.to_string(),
            location: gauge.location.to_string(),
            latitude: gauge.latitude,
            longitude: gauge.longitude,
            water_level: gauge.water_level,
            max_capacity: gauge.max_capacity,
            status: GaugeStatus::parse(gauge.status),
        };
        match store.insert(&row) {
            Ok(_) => written += 1,
            Err(e) => logging::log_store_failure("seed", &e),
        }
    }
    written
}

/// Builds a memory store holding the demo registry.
pub fn seeded_store() -> MemoryGaugeStore {
    let store = MemoryGaugeStore::new();
    seed(&store);
    store
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Coordinate;
    use std::collections::HashSet;

    #[test]
    fn test_demo_coordinates_are_valid() {
        for gauge in DEMO_GAUGES {
            assert!(
                Coordinate::new(gauge.latitude, gauge.longitude).is_valid(),
                "{} has an invalid coordinate",
                gauge.name
            );
        }
    }

    #[test]
    fn test_no_duplicate_demo_names() {
        let names: HashSet<&str> = DEMO_GAUGES.iter().map(|g| g.name).collect();
        assert_eq!(names.len(), DEMO_GAUGES.len());
    }

    #[test]
    fn test_demo_covers_every_status() {
        let statuses: HashSet<GaugeStatus> =
            DEMO_GAUGES.iter().map(|g| GaugeStatus::parse(g.status)).collect();
        for expected in [
            GaugeStatus::Normal,
            GaugeStatus::Warning,
            GaugeStatus::Critical,
            GaugeStatus::Unknown,
        ] {
            assert!(statuses.contains(&expected), "missing {:?}", expected);
        }
    }

    #[test]
    fn test_levels_do_not_exceed_capacity() {
        for gauge in DEMO_GAUGES {
            assert!(gauge.max_capacity > 0.0);
            assert!(gauge.water_level <= gauge.max_capacity, "{}", gauge.name);
        }
    }

    #[test]
    fn test_seeded_store_preserves_registry_order() {
        let rows = seeded_store().select_all().unwrap();
        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        let expected: Vec<&str> = DEMO_GAUGES.iter().map(|g| g.name).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn test_seed_reports_failed_inserts_without_panicking() {
        let store = MemoryGaugeStore::new();
        store.fail_inserts(Some(crate::model::StoreError::Transport("offline".into())));
        assert_eq!(seed(&store), 0);
        assert!(store.is_empty());

        store.fail_inserts(None);
        assert_eq!(seed(&store), DEMO_GAUGES.len());
    }
}
