//! Persistent day-indexed snapshot store.

use anyhow::{Context, Result};
use chrono::Local;
use glob::glob;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{
    fs::{self, File},
    io::{BufReader, BufWriter},
    path::{Path, PathBuf},
};

/// Days elapsed since the Unix epoch; primary key of persisted snapshots.
pub type DayKey = i64;

const SECONDS_PER_DAY: i64 = 86_400;

/// Clock sample shared by all day-key arithmetic within one run.
///
/// Taken once at the start of a run so successive store lookups cannot
/// straddle a midnight boundary.
#[derive(Debug, Clone, Copy)]
pub struct RunClock {
    pub day_key: DayKey,
    pub date: chrono::NaiveDate,
}

impl RunClock {
    pub fn now() -> Self {
        let now = Local::now();
        Self {
            day_key: now.timestamp() / SECONDS_PER_DAY,
            date: now.date_naive(),
        }
    }
}

/// One day's computed metrics, keyed by metric name.
///
/// Values are numbers, strings, the tracked zip list, or `null` for metrics
/// that could not be computed that day.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(serde_json::Map<String, Value>);

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, field: &str, value: impl Into<Value>) {
        self.0.insert(field.to_string(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Get a field as a number, or `None` if it is missing or not numeric.
    pub fn num(&self, field: &str) -> Option<f64> {
        self.0.get(field).and_then(Value::as_f64)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

/// Store holding one snapshot file per day key.
///
/// Opened once per invocation and passed into the core; reads of missing
/// days or fields yield `Ok(None)`, the missing-data signal the averaging
/// and trend logic relies on.
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).with_context(|| format!("failed to create {dir:?}"))?;
        Ok(Self { dir })
    }

    /// Persist a snapshot, fully replacing any existing one for `day`.
    pub fn put(&self, day: DayKey, snapshot: &Snapshot) -> Result<()> {
        let file = self.snapshot_file(day);
        let file = File::create(&file).with_context(|| format!("failed to create {file:?}"))?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, snapshot).context("failed to serialize snapshot")?;
        Ok(())
    }

    /// Read one field of the snapshot stored for `day`.
    ///
    /// A missing snapshot or a missing field is `Ok(None)`; only I/O and
    /// parse failures are errors.
    pub fn get(&self, day: DayKey, field: &str) -> Result<Option<Value>> {
        let snapshot = self.get_snapshot(day)?;
        Ok(snapshot.and_then(|snapshot| snapshot.get(field).cloned()))
    }

    /// Read the full snapshot stored for `day`, if any.
    pub fn get_snapshot(&self, day: DayKey) -> Result<Option<Snapshot>> {
        let file = self.snapshot_file(day);
        if !file.exists() {
            return Ok(None);
        }

        let file = File::open(&file).with_context(|| format!("failed to open {file:?}"))?;
        let reader = BufReader::new(file);
        let snapshot =
            serde_json::from_reader(reader).context("failed to deserialize snapshot")?;
        Ok(Some(snapshot))
    }

    /// List all persisted day keys in ascending order.
    pub fn day_keys(&self) -> Result<Vec<DayKey>> {
        let pattern = self.dir.join("*.json");
        let pattern = pattern.to_str().context("pattern is not valid UTF-8")?;

        let mut days: Vec<DayKey> = glob(pattern)
            .context("failed to glob snapshot files")?
            .filter_map(Result::ok)
            .filter_map(|path| {
                path.file_stem()
                    .and_then(|stem| stem.to_str())
                    .and_then(|stem| stem.parse().ok())
            })
            .collect();
        days.sort_unstable();
        Ok(days)
    }

    fn snapshot_file(&self, day: DayKey) -> PathBuf {
        self.dir.join(format!("{day}.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn open_store(dir: &tempfile::TempDir) -> SnapshotStore {
        SnapshotStore::open(dir.path().join("snapshots")).unwrap()
    }

    #[test]
    fn get_on_missing_day_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);

        assert_eq!(store.get(18500, "total_cases").unwrap(), None);
        assert!(store.get_snapshot(18500).unwrap().is_none());
    }

    #[test]
    fn put_then_get_returns_field() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);

        let mut snapshot = Snapshot::new();
        snapshot.set("total_cases", 3487.0);
        snapshot.set("date", "2020-08-26");
        store.put(18500, &snapshot).unwrap();

        assert_eq!(store.get(18500, "total_cases").unwrap(), Some(json!(3487.0)));
        assert_eq!(store.get(18500, "new_cases").unwrap(), None);
    }

    #[test]
    fn put_replaces_whole_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);

        let mut first = Snapshot::new();
        first.set("total_cases", 100.0);
        first.set("stale_field", 1.0);
        store.put(18500, &first).unwrap();

        let mut second = Snapshot::new();
        second.set("total_cases", 120.0);
        store.put(18500, &second).unwrap();

        // Full replace: the stale field from the first write is gone.
        assert_eq!(store.get(18500, "total_cases").unwrap(), Some(json!(120.0)));
        assert_eq!(store.get(18500, "stale_field").unwrap(), None);
        assert_eq!(store.day_keys().unwrap(), vec![18500]);
    }

    #[test]
    fn day_keys_are_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);

        for day in [18502, 18500, 18501] {
            store.put(day, &Snapshot::new()).unwrap();
        }

        assert_eq!(store.day_keys().unwrap(), vec![18500, 18501, 18502]);
    }
}
