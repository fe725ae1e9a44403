//! In-process gauge table.
//!
//! Behaves like the hosted table for the two calls the app makes. Failure
//! switches let tests simulate an offline backend, and call counters let them
//! assert that nothing reached the store.
//!
//! # Clock injection
//! Row timestamps come from an internal clock that starts at the value passed
//! to `starting_at` and advances one second per insert, so ordering is
//! deterministic in tests.

use super::GaugeStore;
use crate::model::{GaugeId, GaugeRecord, NewGauge, StoreError};
use chrono::{DateTime, Duration, Utc};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

struct Table {
    rows: Vec<GaugeRecord>,
    next_id: u64,
    clock: DateTime<Utc>,
    select_failure: Option<StoreError>,
    insert_failure: Option<StoreError>,
}

pub struct MemoryGaugeStore {
    table: Mutex<Table>,
    select_calls: AtomicUsize,
    insert_calls: AtomicUsize,
}

impl MemoryGaugeStore {
    pub fn new() -> Self {
        Self::starting_at(Utc::now())
    }

    pub fn starting_at(clock: DateTime<Utc>) -> Self {
        MemoryGaugeStore {
            table: Mutex::new(Table {
                rows: Vec::new(),
                next_id: 1,
                clock,
                select_failure: None,
                insert_failure: None,
            }),
            select_calls: AtomicUsize::new(0),
            insert_calls: AtomicUsize::new(0),
        }
    }

    /// Make every `select_all` fail with `err` until cleared with `None`.
    pub fn fail_selects(&self, err: Option<StoreError>) {
        if let Ok(mut table) = self.table.lock() {
            table.select_failure = err;
        }
    }

    /// Make every `insert` fail with `err` until cleared with `None`.
    pub fn fail_inserts(&self, err: Option<StoreError>) {
        if let Ok(mut table) = self.table.lock() {
            table.insert_failure = err;
        }
    }

    pub fn select_calls(&self) -> usize {
        self.select_calls.load(Ordering::SeqCst)
    }

    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.table.lock().map(|t| t.rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Table>, StoreError> {
        self.table
            .lock()
            .map_err(|_| StoreError::Database("memory table lock poisoned".to_string()))
    }
}

impl Default for MemoryGaugeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GaugeStore for MemoryGaugeStore {
    fn select_all(&self) -> Result<Vec<GaugeRecord>, StoreError> {
        self.select_calls.fetch_add(1, Ordering::SeqCst);
        let table = self.lock()?;
        if let Some(err) = &table.select_failure {
            return Err(err.clone());
        }

        let mut rows = table.rows.clone();
        rows.sort_by_key(|r| r.created_at);
        Ok(rows)
    }

    fn insert(&self, gauge: &NewGauge) -> Result<GaugeRecord, StoreError> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        let mut table = self.lock()?;
        if let Some(err) = &table.insert_failure {
            return Err(err.clone());
        }

        let record = GaugeRecord {
            id: GaugeId(table.next_id.to_string()),
            name: gauge.name.clone(),
            location: gauge.location.clone(),
            latitude: gauge.latitude,
            longitude: gauge.longitude,
            water_level: gauge.water_level,
            max_capacity: gauge.max_capacity,
            status: gauge.status,
            created_at: table.clock,
        };
        table.next_id += 1;
        table.clock += Duration::seconds(1);
        table.rows.push(record.clone());
        Ok(record)
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
