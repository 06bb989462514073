//! Rolling averages and trends over the persisted series.

use crate::store::{DayKey, Snapshot, SnapshotStore};
use anyhow::Result;
use serde_json::Value;

/// Read-only view of the historical series anchored at a fixed day.
///
/// The anchor day is captured once per run so every lookup uses the same
/// notion of "today".
pub struct SeriesView<'a> {
    store: &'a SnapshotStore,
    today: DayKey,
}

impl<'a> SeriesView<'a> {
    pub fn new(store: &'a SnapshotStore, today: DayKey) -> Self {
        Self { store, today }
    }

    /// Trailing average of `field` over today plus up to `n` prior days.
    ///
    /// Samples are today's value from the in-progress snapshot (if present
    /// and numeric) and the stored values for the `n` preceding days. Days
    /// with no stored snapshot, or with a null or non-numeric value, are
    /// left out of both the sum and the count, so the average is over
    /// however many samples were actually found.
    ///
    /// With zero samples the result is 0, not an error. This mirrors the
    /// historical behavior of the series and is relied on by downstream
    /// readers; it does depart from the shrinking-denominator rule used
    /// whenever at least one sample exists.
    pub fn n_day_average(&self, n: u32, todays_snapshot: &Snapshot, field: &str) -> Result<f64> {
        let mut sum = 0.0;
        let mut count = 0u32;

        if let Some(value) = todays_snapshot.num(field) {
            sum += value;
            count += 1;
        }

        for i in 1..=n {
            if let Some(value) = numeric(self.store.get(self.today - i as i64, field)?) {
                sum += value;
                count += 1;
            }
        }

        if count > 0 {
            Ok(sum / count as f64)
        } else {
            Ok(0.0)
        }
    }

    /// Change in a metric relative to its stored value `days_back` days ago.
    ///
    /// Returns `Some(current - historical)` when the historical value exists
    /// and is numeric, `None` otherwise. Missing history is expected early
    /// in the series and is never an error.
    pub fn delta(&self, current: f64, field: &str, days_back: i64) -> Result<Option<f64>> {
        let historical = numeric(self.store.get(self.today - days_back, field)?);
        Ok(historical.map(|historical| current - historical))
    }
}

fn numeric(value: Option<Value>) -> Option<f64> {
    value.as_ref().and_then(Value::as_f64)
}
