//! Saved sky-query results
//!
//! Every hit of a circular query is written as an STK star file under
//! `<root>/<tag>/`. Without a tag the query itself names the directory.

use crate::Result;
use pulsar_catalog::{PulsarRecord, StarFile};
use std::path::{Path, PathBuf};
use tracing::info;

/// Directory tag built from the query text with everything but ASCII letters and digits removed
pub fn query_tag(ra: &str, dec: &str, radius_deg: f64) -> String {
    format!("{}{}{}", ra, dec, radius_deg)
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect()
}

/// Write one star file per hit into `<root>/<tag>/` and return that directory.
///
/// An empty tag counts as no tag.
pub fn save_query_results(
    root: &Path,
    tag: Option<&str>,
    ra: &str,
    dec: &str,
    radius_deg: f64,
    hits: &[&PulsarRecord],
) -> Result<PathBuf> {
    let tag = match tag.map(str::trim) {
        Some(tag) if !tag.is_empty() => tag.to_string(),
        _ => query_tag(ra, dec, radius_deg),
    };
    let dir = root.join(tag);
    std::fs::create_dir_all(&dir)?;

    for record in hits {
        StarFile::from_record(record).write_to_dir(&dir)?;
    }
    info!("Saved {} query results to {:?}", hits.len(), dir);
    Ok(dir)
}
