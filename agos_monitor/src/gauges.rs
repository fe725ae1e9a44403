/// Screen-scoped gauge list cache.
///
/// Holds the last successfully fetched snapshot of the gauge table. A
/// refresh replaces the whole list; nothing is merged or diffed.
///
/// # Ordering of overlapping refreshes
/// Every refresh takes a `RefreshTicket` carrying a monotonically increasing
/// sequence number. A response is applied only if its ticket is newer than
/// the last one applied, so a slow response from an earlier focus event can
/// never overwrite a fresher list.
///
/// # Failures
/// A failed fetch leaves the current list untouched (stale but available).

use crate::logging::{self, Component};
use crate::model::{GaugeRecord, StoreError};
use crate::store::GaugeStore;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RefreshTicket(u64);

impl RefreshTicket {
    pub fn sequence(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// The list now holds `count` records from this response.
    Applied { count: usize },
    /// A newer response had already been applied; this one was dropped.
    Discarded { sequence: u64, last_applied: u64 },
    /// The store call failed; the previous list is still shown.
    Failed(StoreError),
}

#[derive(Debug, Clone, Default)]
pub struct GaugeListCache {
    gauges: Vec<GaugeRecord>,
    issued: u64,
    last_applied: u64,
    refreshed_at: Option<DateTime<Utc>>,
}

impl GaugeListCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gauges(&self) -> &[GaugeRecord] {
        &self.gauges
    }

    pub fn len(&self) -> usize {
        self.gauges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gauges.is_empty()
    }

    /// When the current snapshot was applied; `None` before the first success.
    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }

    pub fn last_applied(&self) -> u64 {
        self.last_applied
    }

    /// Issues the ticket for a fetch about to start.
    pub fn begin_refresh(&mut self) -> RefreshTicket {
        self.issued += 1;
        RefreshTicket(self.issued)
    }

    /// Applies the result of the fetch identified by `ticket`.
    pub fn complete_refresh(
        &mut self,
        ticket: RefreshTicket,
        result: Result<Vec<GaugeRecord>, StoreError>,
    ) -> RefreshOutcome {
        self.complete_refresh_at(ticket, result, Utc::now())
    }

    pub fn complete_refresh_at(
        &mut self,
        ticket: RefreshTicket,
        result: Result<Vec<GaugeRecord>, StoreError>,
        now: DateTime<Utc>,
    ) -> RefreshOutcome {
        if ticket.0 <= self.last_applied {
            logging::debug(
                Component::Map,
                None,
                &format!(
                    "Dropping refresh #{}: #{} already applied",
                    ticket.0, self.last_applied
                ),
            );
            return RefreshOutcome::Discarded {
                sequence: ticket.0,
                last_applied: self.last_applied,
            };
        }

        match result {
            Ok(gauges) => {
                let count = gauges.len();
                self.gauges = gauges;
                self.last_applied = ticket.0;
                self.refreshed_at = Some(now);
                RefreshOutcome::Applied { count }
            }
            Err(e) => {
                logging::log_store_failure("refresh", &e);
                RefreshOutcome::Failed(e)
            }
        }
    }

    /// Fetches and applies in one step.
    pub fn refresh(&mut self, store: &dyn GaugeStore) -> RefreshOutcome {
        let ticket = self.begin_refresh();
        let result = store.select_all();
        self.complete_refresh(ticket, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GaugeId, GaugeStatus};
    use chrono::TimeZone;

    fn record(id: &str) -> GaugeRecord {
        GaugeRecord {
            id: GaugeId(id.to_string()),
            name: format!("Gauge {}", id),
            location: "Laguna".to_string(),
            latitude: 14.38,
            longitude: 121.47,
            water_level: 1.0,
            max_capacity: 10.0,
            status: GaugeStatus::Normal,
            created_at: Utc.with_ymd_and_hms(2025, 1, 10, 8, 0, 0).unwrap(),
        }
    }

    fn ids(cache: &GaugeListCache) -> Vec<String> {
        cache.gauges().iter().map(|g| g.id.0.clone()).collect()
    }

    #[test]
    fn test_successful_refresh_replaces_whole_list() {
        let mut cache = GaugeListCache::new();
        let t1 = cache.begin_refresh();
        cache.complete_refresh(t1, Ok(vec![record("1"), record("2")]));
        let t2 = cache.begin_refresh();
        let outcome = cache.complete_refresh(t2, Ok(vec![record("3")]));
        assert_eq!(outcome, RefreshOutcome::Applied { count: 1 });
        assert_eq!(ids(&cache), vec!["3"]);
    }

    #[test]
    fn test_failed_refresh_keeps_previous_list() {
        let mut cache = GaugeListCache::new();
        let t1 = cache.begin_refresh();
        cache.complete_refresh(t1, Ok(vec![record("1"), record("2")]));

        let t2 = cache.begin_refresh();
        let outcome = cache.complete_refresh(t2, Err(StoreError::Transport("offline".into())));
        assert!(matches!(outcome, RefreshOutcome::Failed(_)));
        assert_eq!(ids(&cache), vec!["1", "2"], "stale list must survive a failed fetch");
        assert_eq!(cache.last_applied(), 1);
    }

    #[test]
    fn test_out_of_order_response_is_discarded() {
        let mut cache = GaugeListCache::new();
        let older = cache.begin_refresh();
        let newer = cache.begin_refresh();

        cache.complete_refresh(newer, Ok(vec![record("fresh")]));
        let outcome = cache.complete_refresh(older, Ok(vec![record("stale")]));

        assert_eq!(outcome, RefreshOutcome::Discarded { sequence: 1, last_applied: 2 });
        assert_eq!(ids(&cache), vec!["fresh"]);
    }

    #[test]
    fn test_older_success_applies_after_newer_failure() {
        // The failure applied nothing, so the older snapshot is still the
        // freshest data available.
        let mut cache = GaugeListCache::new();
        let older = cache.begin_refresh();
        let newer = cache.begin_refresh();

        cache.complete_refresh(newer, Err(StoreError::HttpError(502, String::new())));
        let outcome = cache.complete_refresh(older, Ok(vec![record("1")]));
        assert_eq!(outcome, RefreshOutcome::Applied { count: 1 });
    }

    #[test]
    fn test_refreshed_at_set_only_on_success() {
        let mut cache = GaugeListCache::new();
        let now = Utc.with_ymd_and_hms(2025, 1, 10, 9, 30, 0).unwrap();
        let t1 = cache.begin_refresh();
        cache.complete_refresh_at(t1, Err(StoreError::Transport("x".into())), now);
        assert_eq!(cache.refreshed_at(), None);

        let t2 = cache.begin_refresh();
        cache.complete_refresh_at(t2, Ok(vec![]), now);
        assert_eq!(cache.refreshed_at(), Some(now));
        assert!(cache.is_empty());
    }
}
