//! Statistics feed documents and clients.

use crate::record::RegionRecord;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs::File, io::BufReader, time::Duration};

/// Parsed feed response.
///
/// The feed returns one entry per region; entries without an `attributes`
/// mapping are kept here and skipped later at the filter stage.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct FeedDocument {
    #[serde(default)]
    pub features: Vec<Feature>,
}

/// One raw feed entry.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<RegionRecord>,
}

/// Source of feed documents.
///
/// `source` is a locator whose meaning depends on the implementation:
/// a URL for [`HttpFeed`], a file path for [`FileFeed`].
pub trait Feed {
    fn fetch(&self, source: &str) -> Result<FeedDocument>;
}

/// Feed client backed by blocking HTTP GET requests.
pub struct HttpFeed {
    client: reqwest::blocking::Client,
}

impl HttpFeed {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed to build http client")?;
        Ok(Self { client })
    }
}

impl Feed for HttpFeed {
    fn fetch(&self, source: &str) -> Result<FeedDocument> {
        let response = self
            .client
            .get(source)
            .send()
            .with_context(|| format!("failed to fetch {source}"))?
            .error_for_status()
            .with_context(|| format!("feed {source} returned an error status"))?;

        let document = response
            .json()
            .with_context(|| format!("failed to parse feed document from {source}"))?;

        Ok(document)
    }
}

/// Feed reading previously saved documents from disk.
///
/// Used to run a snapshot without calling the remote API, e.g. during
/// development or in tests.
pub struct FileFeed;

impl Feed for FileFeed {
    fn fetch(&self, source: &str) -> Result<FeedDocument> {
        let file = File::open(source).with_context(|| format!("failed to open {source}"))?;
        let reader = BufReader::new(file);
        let document = serde_json::from_reader(reader)
            .with_context(|| format!("failed to parse feed document from {source}"))?;
        Ok(document)
    }
}
