//! Map markers, projected from the cached gauge list.
//!
//! Nothing here holds state: markers and the status summary are recomputed
//! from the list every time they are asked for.

use crate::location::MapCenter;
use crate::model::{Coordinate, GaugeId, GaugeRecord, GaugeStatus};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MarkerColor {
    Green,
    Amber,
    Red,
    Gray,
}

impl MarkerColor {
    pub fn hex(&self) -> &'static str {
        match self {
            MarkerColor::Green => "#10b981",
            MarkerColor::Amber => "#f59e0b",
            MarkerColor::Red => "#ef4444",
            MarkerColor::Gray => "#94a3b8",
        }
    }
}

impl fmt::Display for MarkerColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MarkerColor::Green => "green",
            MarkerColor::Amber => "amber",
            MarkerColor::Red => "red",
            MarkerColor::Gray => "gray",
        };
        f.write_str(name)
    }
}

pub fn status_color(status: GaugeStatus) -> MarkerColor {
    match status {
        GaugeStatus::Normal => MarkerColor::Green,
        GaugeStatus::Warning => MarkerColor::Amber,
        GaugeStatus::Critical => MarkerColor::Red,
        GaugeStatus::Unknown => MarkerColor::Gray,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub id: GaugeId,
    pub coordinate: Coordinate,
    pub title: String,
    pub subtitle: String,
    pub status: GaugeStatus,
    pub color: MarkerColor,
}

/// "2.5m / 10m"
pub fn marker_subtitle(record: &GaugeRecord) -> String {
    format!("{}m / {}m", record.water_level, record.max_capacity)
}

pub fn marker_for(record: &GaugeRecord) -> Marker {
    Marker {
        id: record.id.clone(),
        coordinate: record.coordinate(),
        title: record.name.clone(),
        subtitle: marker_subtitle(record),
        status: record.status,
        color: status_color(record.status),
    }
}

/// One marker per record, in list order.
pub fn project_markers(gauges: &[GaugeRecord]) -> Vec<Marker> {
    gauges.iter().map(marker_for).collect()
}

// ---------------------------------------------------------------------------
// Region
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapRegion {
    pub center: MapCenter,
    pub latitude_delta: f64,
    pub longitude_delta: f64,
}

impl MapRegion {
    /// Whether a coordinate falls inside the visible window.
    pub fn contains(&self, c: Coordinate) -> bool {
        let centre = self.center.coordinate;
        (c.latitude - centre.latitude).abs() <= self.latitude_delta / 2.0
            && (c.longitude - centre.longitude).abs() <= self.longitude_delta / 2.0
    }
}

// ---------------------------------------------------------------------------
// Status bar
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    pub total: usize,
    pub normal: usize,
    pub warning: usize,
    pub critical: usize,
    pub unknown: usize,
}

impl StatusSummary {
    pub fn from_gauges(gauges: &[GaugeRecord]) -> Self {
        let mut summary = StatusSummary::default();
        for gauge in gauges {
            summary.total += 1;
            match gauge.status {
                GaugeStatus::Normal => summary.normal += 1,
                GaugeStatus::Warning => summary.warning += 1,
                GaugeStatus::Critical => summary.critical += 1,
                GaugeStatus::Unknown => summary.unknown += 1,
            }
        }
        summary
    }

    /// Worst status present, driving the status-bar dot colour.
    pub fn overall_color(&self) -> MarkerColor {
        if self.critical > 0 {
            MarkerColor::Red
        } else if self.warning > 0 {
            MarkerColor::Amber
        } else if self.total > 0 && self.normal == self.total {
            MarkerColor::Green
        } else {
            MarkerColor::Gray
        }
    }

    pub fn headline(&self) -> String {
        if self.total == 0 {
            return "No Sensors Registered".to_string();
        }
        if self.normal == self.total {
            return "All Systems Normal".to_string();
        }

        let mut parts = Vec::new();
        if self.critical > 0 {
            parts.push(format!("{} Critical", self.critical));
        }
        if self.warning > 0 {
            parts.push(format!("{} Warning", self.warning));
        }
        if self.unknown > 0 {
            parts.push(format!("{} No Status", self.unknown));
        }
        parts.join(", ")
    }

    pub fn sensors_label(&self) -> String {
        match self.total {
            1 => "1 Sensor Active".to_string(),
            n => format!("{} Sensors Active", n),
        }
    }
}
