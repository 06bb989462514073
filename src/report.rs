//! Plain-text rendering of a persisted snapshot.

use crate::store::Snapshot;
use serde_json::Value;
use std::fmt::Write;

/// Render a day's snapshot as a short human-readable report.
///
/// Metrics stored as null render as "undefined"; trend annotations are
/// omitted when the stored delta is null.
pub fn render(snapshot: &Snapshot) -> String {
    let date = snapshot
        .get("date")
        .and_then(Value::as_str)
        .unwrap_or("unknown date");

    let mut body = String::new();
    let _ = writeln!(body, "Public-health data for {date}");
    let _ = writeln!(body, "Total cases: {}", fmt_count(snapshot.num("total_cases")));
    let _ = writeln!(
        body,
        "Case rate per 100,000 population: {}",
        fmt_rate(snapshot.num("case_rate_per_100k"))
    );
    let _ = writeln!(
        body,
        "Percentage of positive tests: {}",
        fmt_percent(snapshot.num("percentage_positive_tests"))
    );
    let _ = writeln!(body);

    let avg_case_rate = snapshot.num("7_day_avg_case_rate");
    let _ = writeln!(
        body,
        "7-day average case rate per 100,000: {}{}{}",
        fmt_rate(avg_case_rate),
        trend_note(avg_case_rate, snapshot.num("7_day_change_avg_case_rate"), 7),
        trend_note(avg_case_rate, snapshot.num("28_day_change_avg_case_rate"), 28),
    );

    let avg_percentage_pos = snapshot.num("7_day_avg_percentage_pos");
    let _ = writeln!(
        body,
        "7-day average percentage positive: {}{}{}",
        fmt_percent(avg_percentage_pos),
        trend_note(
            avg_percentage_pos,
            snapshot.num("7_day_change_avg_percentage_pos"),
            7
        ),
        trend_note(
            avg_percentage_pos,
            snapshot.num("28_day_change_avg_percentage_pos"),
            28
        ),
    );

    body
}

/// Relative-change annotation for one stored delta.
///
/// The reference value is what the metric was `days` ago, recovered as
/// `current - delta`; a missing delta or a zero reference yields no note.
fn trend_note(current: Option<f64>, delta: Option<f64>, days: i64) -> String {
    let (Some(current), Some(delta)) = (current, delta) else {
        return String::new();
    };
    let reference = current - delta;
    if reference == 0.0 {
        return String::new();
    }
    format!(" ({:+.1}% from {days} days ago)", delta / reference * 100.0)
}

fn fmt_count(value: Option<f64>) -> String {
    match value {
        Some(value) => format!("{value:.0}"),
        None => "undefined".to_string(),
    }
}

fn fmt_rate(value: Option<f64>) -> String {
    match value {
        Some(value) => format!("{value:.1}"),
        None => "undefined".to_string(),
    }
}

fn fmt_percent(value: Option<f64>) -> String {
    match value {
        Some(value) => format!("{:.1}%", value * 100.0),
        None => "undefined".to_string(),
    }
}
