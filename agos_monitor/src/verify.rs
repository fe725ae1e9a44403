//! Store Verification Module
//!
//! Checks that the configured gauge store is reachable and audits the rows it
//! returns: coordinates within range, status one the app recognises, and a
//! positive capacity. Run this after pointing the client at a new backend.

use crate::logging;
use crate::model::{GaugeRecord, GaugeStatus};
use crate::store::GaugeStore;
use chrono::Utc;
use serde::{Deserialize, Serialize};

// ============================================================================
// Verification Results
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationStatus {
    Success,
    PartialSuccess,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    pub timestamp: String,
    pub store: String,
    pub status: VerificationStatus,
    pub reachable: bool,
    pub records: Vec<RecordAudit>,
    pub summary: VerificationSummary,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationSummary {
    pub total: usize,
    pub clean: usize,
    pub flagged: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordAudit {
    pub id: String,
    pub name: String,
    pub issues: Vec<String>,
}

// ============================================================================
// Record Audit
// ============================================================================

pub fn audit_record(record: &GaugeRecord) -> RecordAudit {
    let mut issues = Vec::new();

    if record.name.trim().is_empty() {
        issues.push("empty name".to_string());
    }
    if !record.coordinate().is_valid() {
        issues.push(format!(
            "coordinate out of range ({}, {})",
            record.latitude, record.longitude
        ));
    }
    if record.status == GaugeStatus::Unknown {
        issues.push("unrecognised status".to_string());
    }
    if !(record.max_capacity > 0.0) {
        issues.push(format!("non-positive max_capacity {}", record.max_capacity));
    } else if record.water_level > record.max_capacity {
        issues.push(format!(
            "water_level {}m above max_capacity {}m",
            record.water_level, record.max_capacity
        ));
    }

    RecordAudit {
        id: record.id.0.clone(),
        name: record.name.clone(),
        issues,
    }
}

/// True when the rows are in non-decreasing `created_at` order.
pub fn is_creation_ordered(records: &[GaugeRecord]) -> bool {
    records.windows(2).all(|w| w[0].created_at <= w[1].created_at)
}

// ============================================================================
// Full Verification Runner
// ============================================================================

pub fn verify_store(store: &dyn GaugeStore) -> VerificationReport {
    let mut report = VerificationReport {
        timestamp: Utc::now().to_rfc3339(),
        store: store.describe(),
        status: VerificationStatus::Failed,
        reachable: false,
        records: Vec::new(),
        summary: VerificationSummary::default(),
        error_message: None,
    };

    let rows = match store.select_all() {
        Ok(rows) => rows,
        Err(e) => {
            logging::log_store_failure("verify", &e);
            report.error_message = Some(format!("Select failed: {}", e));
            return report;
        }
    };
    report.reachable = true;

    for row in &rows {
        let audit = audit_record(row);
        if audit.issues.is_empty() {
            report.summary.clean += 1;
        } else {
            report.summary.flagged += 1;
        }
        report.records.push(audit);
    }
    report.summary.total = rows.len();

    if !is_creation_ordered(&rows) {
        report.error_message = Some("rows are not ordered by created_at".to_string());
    }

    report.status = if report.summary.flagged == 0 && report.error_message.is_none() {
        VerificationStatus::Success
    } else {
        VerificationStatus::PartialSuccess
    };

    logging::log_audit_summary(report.summary.total, report.summary.clean, report.summary.flagged);
    report
}

pub fn print_summary(report: &VerificationReport) {
    println!("\n═══════════════════════════════════════════════════════════");
    println!("📊 STORE VERIFICATION");
    println!("═══════════════════════════════════════════════════════════");
    println!();
    println!("Store:      {}", report.store);
    println!("Reachable:  {}", if report.reachable { "yes" } else { "no" });
    println!(
        "Records:    {}/{} clean  ({} flagged)",
        report.summary.clean, report.summary.total, report.summary.flagged
    );

    for audit in report.records.iter().filter(|a| !a.issues.is_empty()) {
        println!("  ⚠ {} ({}): {}", audit.name, audit.id, audit.issues.join("; "));
    }

    if let Some(msg) = &report.error_message {
        println!("  ✗ {}", msg);
    }

    println!();
    println!("Overall: {:?}", report.status);
    println!("═══════════════════════════════════════════════════════════");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GaugeId, NewGauge, StoreError};
    use crate::store::MemoryGaugeStore;
    use chrono::TimeZone;

    fn record(status: GaugeStatus, latitude: f64, water_level: f64, max_capacity: f64) -> GaugeRecord {
        GaugeRecord {
            id: GaugeId("9".to_string()),
            name: "Gauge".to_string(),
            location: "Laguna".to_string(),
            latitude,
            longitude: 121.0,
            water_level,
            max_capacity,
            status,
            created_at: Utc.with_ymd_and_hms(2025, 1, 10, 8, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_clean_record_has_no_issues() {
        let audit = audit_record(&record(GaugeStatus::Normal, 14.0, 1.0, 10.0));
        assert!(audit.issues.is_empty(), "{:?}", audit.issues);
    }

    #[test]
    fn test_audit_flags_each_problem() {
        let audit = audit_record(&record(GaugeStatus::Unknown, 95.0, 0.0, 0.0));
        assert_eq!(audit.issues.len(), 3, "{:?}", audit.issues);

        let overflowing = audit_record(&record(GaugeStatus::Critical, 14.0, 12.0, 10.0));
        assert_eq!(overflowing.issues, vec!["water_level 12m above max_capacity 10m"]);
    }

    #[test]
    fn test_unreachable_store_fails_verification() {
        let store = MemoryGaugeStore::new();
        store.fail_selects(Some(StoreError::Transport("connection refused".into())));
        let report = verify_store(&store);
        assert_eq!(report.status, VerificationStatus::Failed);
        assert!(!report.reachable);
        assert!(report.error_message.unwrap().contains("connection refused"));
    }

    #[test]
    fn test_demo_store_is_partial_because_of_unknown_status() {
        let report = verify_store(&crate::demo::seeded_store());
        assert!(report.reachable);
        assert_eq!(report.summary.total, crate::demo::DEMO_GAUGES.len());
        assert_eq!(report.summary.flagged, 1);
        assert_eq!(report.status, VerificationStatus::PartialSuccess);
    }

    #[test]
    fn test_clean_store_succeeds() {
        let store = MemoryGaugeStore::new();
        store
            .insert(&NewGauge {
                name: "Pakil".into(),
                location: "Laguna".into(),
                latitude: 14.38,
                longitude: 121.47,
                water_level: 0.0,
                max_capacity: 10.0,
                status: GaugeStatus::Normal,
            })
            .unwrap();
        let report = verify_store(&store);
        assert_eq!(report.status, VerificationStatus::Success);
        assert_eq!(report.summary, VerificationSummary { total: 1, clean: 1, flagged: 0 });
    }
}
