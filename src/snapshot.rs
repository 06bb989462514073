//! Daily snapshot computation.

use crate::config::Config;
use crate::feed::Feed;
use crate::record::{aggregate, filter_features, merge};
use crate::series::SeriesView;
use crate::store::{RunClock, Snapshot, SnapshotStore};
use anyhow::{Context, Result};

/// New cases per 100,000 population.
///
/// `None` when the population total is zero; the metric is undefined, not
/// zero, and must be recorded as such.
pub fn case_rate_per_100k(total_cases: f64, total_population: f64) -> Option<f64> {
    if total_population == 0.0 {
        return None;
    }
    Some(total_cases / total_population * 100_000.0)
}

/// Fraction of tests that came back positive.
///
/// `None` when no tests were recorded.
pub fn positivity(positive_tests: f64, total_tests: f64) -> Option<f64> {
    if total_tests == 0.0 {
        return None;
    }
    Some(positive_tests / total_tests)
}

/// Perform one daily run: fetch, reduce, derive, trend, persist.
///
/// The snapshot is persisted as a whole once everything computable has been
/// computed; any feed or aggregation failure aborts before the write, so no
/// partial snapshot ever lands in the store. Returns a short summary string.
///
/// Re-running on the same day replaces that day's snapshot entirely.
pub fn run(
    cfg: &Config,
    feed: &dyn Feed,
    store: &SnapshotStore,
    clock: &RunClock,
) -> Result<String> {
    let case_doc = feed
        .fetch(&cfg.feed.case_url)
        .context("failed to fetch case feed")?;
    let test_doc = feed
        .fetch(&cfg.feed.test_url)
        .context("failed to fetch test feed")?;

    let case_regions = filter_features(&case_doc.features, &cfg.zips);
    let test_regions = filter_features(&test_doc.features, &cfg.zips);
    let merged = merge(&case_regions, &test_regions);

    let total_cases = aggregate(&merged, "Cases").context("failed to aggregate cases")?;
    let total_population =
        aggregate(&merged, "Population").context("failed to aggregate population")?;
    let positive_tests =
        aggregate(&merged, "Positives").context("failed to aggregate positive tests")?;
    let total_tests =
        aggregate(&merged, "NumberOfTests").context("failed to aggregate total tests")?;

    let case_rate = case_rate_per_100k(total_cases, total_population);
    let percentage_positive = positivity(positive_tests, total_tests);

    let mut snapshot = Snapshot::new();
    snapshot.set("date", clock.date.to_string());
    snapshot.set("zips", cfg.zips.clone());
    snapshot.set("total_cases", total_cases);
    snapshot.set("total_population", total_population);
    snapshot.set("case_rate_per_100k", case_rate);
    snapshot.set("positive_tests", positive_tests);
    snapshot.set("total_tests", total_tests);
    snapshot.set("percentage_positive_tests", percentage_positive);

    let series = SeriesView::new(store, clock.day_key);

    // Rolling averages read today's raw metrics from the snapshot built so far.
    let avg_case_rate = series
        .n_day_average(7, &snapshot, "case_rate_per_100k")
        .context("failed to average case rate")?;
    snapshot.set("7_day_avg_case_rate", avg_case_rate);

    let avg_percentage_pos = series
        .n_day_average(7, &snapshot, "percentage_positive_tests")
        .context("failed to average positivity")?;
    snapshot.set("7_day_avg_percentage_pos", avg_percentage_pos);

    // Week-over-week change of the rolling averages.
    snapshot.set(
        "7_day_change_avg_case_rate",
        series.delta(avg_case_rate, "7_day_avg_case_rate", 7)?,
    );
    snapshot.set(
        "7_day_change_avg_percentage_pos",
        series.delta(avg_percentage_pos, "7_day_avg_percentage_pos", 7)?,
    );

    // Month-scale change compares today's raw metric against the value
    // stored four weeks ago; undefined raw metrics leave the delta null.
    snapshot.set(
        "28_day_change_avg_case_rate",
        match case_rate {
            Some(rate) => series.delta(rate, "7_day_avg_case_rate", 28)?,
            None => None,
        },
    );
    snapshot.set(
        "28_day_change_avg_percentage_pos",
        match percentage_positive {
            Some(fraction) => series.delta(fraction, "percentage_positive_tests", 28)?,
            None => None,
        },
    );

    for (field, value) in snapshot.iter() {
        log::info!("{field}: {value}");
    }

    store
        .put(clock.day_key, &snapshot)
        .context("failed to persist snapshot")?;

    let summary = match case_rate {
        Some(rate) => format!("Case Rate per 100k: {rate:.1}"),
        None => "Case Rate per 100k: undefined".to_string(),
    };
    Ok(summary)
}
