/// Self-hosted gauge table over a direct Postgres connection.
///
/// Same two calls as the hosted REST store, for deployments that run the
/// `water_gauges` table on their own database. The id column is read as text
/// so integer and UUID keys both work.

use super::GaugeStore;
use crate::logging;
use crate::model::{GaugeId, GaugeRecord, GaugeStatus, NewGauge, StoreError};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use postgres::{Client, NoTls, Row};
use std::sync::Mutex;

const COLUMNS: &str = "id::text, name, location, latitude::float8, longitude::float8, \
                       water_level::float8, max_capacity::float8, status, created_at";

pub struct PgGaugeStore {
    client: Mutex<Client>,
    table: String,
}

/// Table names are spliced into SQL, so only plain identifiers are accepted.
pub fn is_valid_table_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 63
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
        && !name.starts_with(|c: char| c.is_ascii_digit())
}

impl PgGaugeStore {
    pub fn connect(database_url: &str, table: &str) -> Result<Self, StoreError> {
        if !is_valid_table_name(table) {
            return Err(StoreError::Rejected(format!("invalid table name: {}", table)));
        }
        let client = Client::connect(database_url, NoTls).map_err(db_error)?;
        Ok(PgGaugeStore {
            client: Mutex::new(client),
            table: table.to_string(),
        })
    }

    fn with_client<T>(
        &self,
        f: impl FnOnce(&mut Client) -> Result<T, postgres::Error>,
    ) -> Result<T, StoreError> {
        let mut client = self
            .client
            .lock()
            .map_err(|_| StoreError::Database("connection lock poisoned".to_string()))?;
        f(&mut client).map_err(db_error)
    }
}

fn db_error(e: postgres::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

/// `timestamptz` columns decode directly; plain `timestamp` is taken as UTC.
fn created_at(row: &Row, idx: usize) -> Result<DateTime<Utc>, postgres::Error> {
    match row.try_get::<_, DateTime<Utc>>(idx) {
        Ok(dt) => Ok(dt),
        Err(_) => row
            .try_get::<_, NaiveDateTime>(idx)
            .map(|naive| Utc.from_utc_datetime(&naive)),
    }
}

fn row_to_record(row: &Row) -> Result<GaugeRecord, StoreError> {
    let parse = |e: postgres::Error| StoreError::ParseError(e.to_string());
    let status: Option<String> = row.try_get(7).map_err(parse)?;

    Ok(GaugeRecord {
        id: GaugeId(row.try_get(0).map_err(parse)?),
        name: row.try_get::<_, Option<String>>(1).map_err(parse)?.unwrap_or_default(),
        location: row.try_get::<_, Option<String>>(2).map_err(parse)?.unwrap_or_default(),
        latitude: row.try_get(3).map_err(parse)?,
        longitude: row.try_get(4).map_err(parse)?,
        water_level: row.try_get::<_, Option<f64>>(5).map_err(parse)?.unwrap_or_default(),
        max_capacity: row.try_get::<_, Option<f64>>(6).map_err(parse)?.unwrap_or_default(),
        status: status.as_deref().map(GaugeStatus::parse).unwrap_or(GaugeStatus::Unknown),
        created_at: created_at(row, 8).map_err(parse)?,
    })
}

impl GaugeStore for PgGaugeStore {
    fn select_all(&self) -> Result<Vec<GaugeRecord>, StoreError> {
        let query = format!("SELECT {} FROM {} ORDER BY created_at ASC", COLUMNS, self.table);
        let rows = self.with_client(|client| client.query(query.as_str(), &[]))?;
        let mut records = Vec::with_capacity(rows.len());
        for (index, row) in rows.iter().enumerate() {
            match row_to_record(row) {
                Ok(record) => records.push(record),
                Err(e) => logging::log_store_failure(
                    "decode row",
                    &StoreError::ParseError(format!("row {} skipped: {}", index, e)),
                ),
            }
        }
        Ok(records)
    }

    fn insert(&self, gauge: &NewGauge) -> Result<GaugeRecord, StoreError> {
        let query = format!(
            "INSERT INTO {} (name, location, latitude, longitude, water_level, max_capacity, status)
             VALUES ($1, $2, $3::float8, $4::float8, $5::float8, $6::float8, $7::text)
             RETURNING {}",
            self.table, COLUMNS
        );
        let status = gauge.status.as_str();
        let row = self.with_client(|client| {
            client.query_one(
                query.as_str(),
                &[
                    &gauge.name,
                    &gauge.location,
                    &gauge.latitude,
                    &gauge.longitude,
                    &gauge.water_level,
                    &gauge.max_capacity,
                    &status,
                ],
            )
        })?;
        row_to_record(&row)
    }

    fn describe(&self) -> String {
        format!("postgres table {}", self.table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_name_validation() {
        assert!(is_valid_table_name("water_gauges"));
        assert!(is_valid_table_name("public.water_gauges"));
        assert!(!is_valid_table_name(""));
        assert!(!is_valid_table_name("gauges; DROP TABLE users"));
        assert!(!is_valid_table_name("1gauges"));
    }
}
