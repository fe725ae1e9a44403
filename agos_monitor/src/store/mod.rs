//! Gauge table access.
//!
//! The app makes exactly two calls against the table store: read every row
//! in creation order, and insert one row. `GaugeStore` is that contract;
//! the submodules are its backends.
//!
//! Submodules:
//! - `rest`     hosted PostgREST/Supabase endpoint over HTTPS.
//! - `pg`       self-hosted Postgres table.
//! - `memory`   in-process table for tests and demo mode.

pub mod memory;
pub mod pg;
pub mod rest;

pub use memory::MemoryGaugeStore;
pub use pg::PgGaugeStore;
pub use rest::RestGaugeStore;

use crate::config::{StoreBackend, StoreConfig};
use crate::model::{GaugeRecord, NewGauge, StoreError};
use std::sync::Arc;
use std::time::Duration;

pub trait GaugeStore {
    /// All rows, ordered by `created_at` ascending.
    fn select_all(&self) -> Result<Vec<GaugeRecord>, StoreError>;

    /// Inserts one row and returns it as stored.
    fn insert(&self, gauge: &NewGauge) -> Result<GaugeRecord, StoreError>;

    /// Short description for logs and verification reports.
    fn describe(&self) -> String;
}

impl<S: GaugeStore + ?Sized> GaugeStore for Arc<S> {
    fn select_all(&self) -> Result<Vec<GaugeRecord>, StoreError> {
        (**self).select_all()
    }

    fn insert(&self, gauge: &NewGauge) -> Result<GaugeRecord, StoreError> {
        (**self).insert(gauge)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Opens the backend named in the configuration.
pub fn open_store(config: &StoreConfig) -> Result<Box<dyn GaugeStore>, StoreError> {
    match config.backend {
        StoreBackend::Rest => {
            let url = config
                .url
                .as_deref()
                .ok_or_else(|| StoreError::Rejected("store.url is not configured".to_string()))?;
            let key = config.api_key.as_deref().unwrap_or_default();
            let store = RestGaugeStore::new(
                url,
                key,
                &config.table,
                Duration::from_secs(config.timeout_seconds),
            )?;
            Ok(Box::new(store))
        }
        StoreBackend::Postgres => {
            let url = config.database_url.as_deref().ok_or_else(|| {
                StoreError::Rejected("store.database_url is not configured".to_string())
            })?;
            Ok(Box::new(PgGaugeStore::connect(url, &config.table)?))
        }
        StoreBackend::Demo => Ok(Box::new(crate::demo::seeded_store())),
    }
}
