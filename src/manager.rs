use crate::config::Config;
use crate::feed::{Feed, FileFeed, HttpFeed};
use crate::report;
use crate::snapshot;
use crate::store::{RunClock, SnapshotStore};
use anyhow::{Context, Result, bail};
use serde_json::Value;
use std::path::{Path, PathBuf};

pub struct Manager {
    cfg: Config,
    store: SnapshotStore,
}

impl Manager {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let data_dir = data_dir.as_ref();

        let cfg =
            Config::from_file(data_dir.join("config.toml")).context("failed to construct cfg")?;
        log::info!("{cfg:#?}");

        let store = SnapshotStore::open(data_dir.join("snapshots"))
            .context("failed to open snapshot store")?;

        Ok(Self { cfg, store })
    }

    /// Run today's snapshot and print the summary.
    ///
    /// With `offline_dir` set, feed documents are read from `cases.json` and
    /// `tests.json` in that directory instead of the configured endpoints.
    pub fn take_snapshot(&self, offline_dir: Option<PathBuf>) -> Result<()> {
        let clock = RunClock::now();
        log::info!("running snapshot for day {}", clock.day_key);

        let (feed, cfg): (Box<dyn Feed>, Config) = match offline_dir {
            Some(dir) => {
                let mut cfg = self.cfg.clone();
                cfg.feed.case_url = path_string(dir.join("cases.json"))?;
                cfg.feed.test_url = path_string(dir.join("tests.json"))?;
                (Box::new(FileFeed), cfg)
            }
            None => {
                let feed = HttpFeed::new().context("failed to construct feed client")?;
                (Box::new(feed), self.cfg.clone())
            }
        };

        let summary = snapshot::run(&cfg, feed.as_ref(), &self.store, &clock)
            .context("failed to run snapshot")?;
        println!("{summary}");

        Ok(())
    }

    /// Print the report for today's persisted snapshot.
    pub fn print_report(&self) -> Result<()> {
        let clock = RunClock::now();

        let Some(snapshot) = self
            .store
            .get_snapshot(clock.day_key)
            .context("failed to read snapshot")?
        else {
            bail!("no snapshot stored for day {}", clock.day_key);
        };

        print!("{}", report::render(&snapshot));
        Ok(())
    }

    /// Print headline metrics of the most recent persisted snapshots.
    pub fn print_history(&self, days: usize) -> Result<()> {
        let day_keys = self.store.day_keys().context("failed to list day keys")?;
        let recent = &day_keys[day_keys.len().saturating_sub(days)..];

        for &day in recent {
            let Some(snapshot) = self
                .store
                .get_snapshot(day)
                .with_context(|| format!("failed to read snapshot for day {day}"))?
            else {
                continue;
            };

            let date = snapshot
                .get("date")
                .and_then(Value::as_str)
                .unwrap_or("unknown date");
            let case_rate = snapshot
                .num("case_rate_per_100k")
                .map_or("undefined".to_string(), |rate| format!("{rate:.1}"));
            println!("{date}  case rate per 100k: {case_rate}");
        }

        Ok(())
    }
}

fn path_string(path: PathBuf) -> Result<String> {
    match path.into_os_string().into_string() {
        Ok(path) => Ok(path),
        Err(path) => bail!("path {path:?} is not valid UTF-8"),
    }
}
