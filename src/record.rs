//! Per-region records: filtering, merging and aggregation.

use crate::feed::Feature;
use anyhow::{Result, bail};
use serde_json::Value;
use std::collections::BTreeMap;

/// Field data for one region on one day.
pub type RegionRecord = serde_json::Map<String, Value>;

/// Region records keyed by zip code.
pub type RegionSet = BTreeMap<u32, RegionRecord>;

/// Attribute naming the region in feed entries.
pub const REGION_CODE_FIELD: &str = "Zip_Number";

/// Reduce raw feed entries to the tracked zip codes.
///
/// Entries without attributes, without a region code, or with a region code
/// outside `zips` are skipped silently. A tracked zip missing from the feed
/// is not an error; it is simply absent from the result.
pub fn filter_features(features: &[Feature], zips: &[u32]) -> RegionSet {
    let mut regions = RegionSet::new();

    for feature in features {
        let Some(attributes) = &feature.attributes else {
            continue;
        };
        let Some(zip) = attributes.get(REGION_CODE_FIELD).and_then(Value::as_u64) else {
            continue;
        };
        let zip = zip as u32;
        if zips.contains(&zip) {
            regions.insert(zip, attributes.clone());
        }
    }

    regions
}

/// Merge two region sets into a new one.
///
/// The result covers the union of both key sets. For a zip present in both,
/// `overlay` fields overwrite `base` fields of the same name; `base` fields
/// absent from `overlay` are preserved. Neither input is modified.
pub fn merge(base: &RegionSet, overlay: &RegionSet) -> RegionSet {
    let mut merged = base.clone();

    for (&zip, record) in overlay {
        let entry = merged.entry(zip).or_default();
        for (field, value) in record {
            entry.insert(field.clone(), value.clone());
        }
    }

    merged
}

/// Sum a numeric field across all regions.
///
/// Regions without the field contribute zero. A present but non-numeric
/// value is an error: it means the feed is broken, not merely sparse.
pub fn aggregate(regions: &RegionSet, field: &str) -> Result<f64> {
    let mut total = 0.0;

    for (zip, record) in regions {
        let Some(value) = record.get(field) else {
            continue;
        };
        match value.as_f64() {
            Some(num) => total += num,
            None => bail!("field {field} for zip {zip} is not numeric, but {value}"),
        }
    }

    Ok(total)
}
