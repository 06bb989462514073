use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, fs, ops::RangeBounds, path::Path};

/// Tool configuration.
///
/// Loaded from a TOML file in the data directory and validated before use.
/// See [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Zip codes tracked by the daily snapshot.
    pub zips: Vec<u32>,

    /// Statistics feed endpoints.
    pub feed: FeedConfig,
}

/// Feed endpoint locators.
///
/// Each must return a JSON document with a `features` array.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Source of per-region case and population counts.
    pub case_url: String,
    /// Source of per-region test counts.
    pub test_url: String,
}

impl Config {
    /// Load a [`Config`] from a file.
    ///
    /// The file must be TOML-encoded and contain a serialized [`Config`].
    /// Performs validation on all parameters before returning.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;

        let config: Config =
            toml::from_str(&contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        check_num(self.zips.len(), 1..100).context("invalid number of tracked zips")?;
        for &zip in &self.zips {
            check_num(zip, 1..100_000).with_context(|| format!("invalid zip code {zip}"))?;
        }

        if self.feed.case_url.is_empty() {
            bail!("case feed url must not be empty");
        }
        if self.feed.test_url.is_empty() {
            bail!("test feed url must not be empty");
        }

        Ok(())
    }
}

fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_toml() -> &'static str {
        r#"
zips = [94601, 94602, 94606, 94610, 94619]

[feed]
case_url = "https://example.test/cases?f=json"
test_url = "https://example.test/tests?f=json"
"#
    }

    #[test]
    fn valid_config_parses() {
        let config: Config = toml::from_str(valid_toml()).unwrap();
        config.validate().unwrap();
        assert_eq!(config.zips.len(), 5);
        assert_eq!(config.zips[0], 94601);
    }

    #[test]
    fn empty_zip_list_is_rejected() {
        let mut config: Config = toml::from_str(valid_toml()).unwrap();
        config.zips.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_url_is_rejected() {
        let mut config: Config = toml::from_str(valid_toml()).unwrap();
        config.feed.test_url.clear();
        assert!(config.validate().is_err());
    }
}
