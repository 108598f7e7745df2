//! Local catalog loading from ATNF CSV exports and saved JSON

use crate::{sexagesimal, PulsarCatalog, PulsarRecord, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::{debug, info};

/// Raw ATNF row. Missing values show up as empty cells or `*`.
#[derive(Debug, Deserialize)]
struct RawAtnfRow {
    #[serde(rename = "NAME", default)]
    name: Option<String>,
    #[serde(rename = "JNAME", default)]
    jname: Option<String>,
    #[serde(rename = "PSRJ", default)]
    psrj: Option<String>,
    #[serde(rename = "RAJD", default, deserialize_with = "csv::invalid_option")]
    rajd: Option<f64>,
    #[serde(rename = "DECJD", default, deserialize_with = "csv::invalid_option")]
    decjd: Option<f64>,
    #[serde(rename = "RAJ", default)]
    raj: Option<String>,
    #[serde(rename = "DECJ", default)]
    decj: Option<String>,
    #[serde(rename = "DIST", default, deserialize_with = "csv::invalid_option")]
    dist: Option<f64>,
    #[serde(rename = "PEPOCH", default, deserialize_with = "csv::invalid_option")]
    pepoch: Option<f64>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && s != "*")
}

impl RawAtnfRow {
    fn into_record(self) -> Option<PulsarRecord> {
        let name = non_empty(self.jname)
            .or_else(|| non_empty(self.psrj))
            .or_else(|| non_empty(self.name))?;

        // Decimal columns win; fall back to the sexagesimal ones
        let ra = match self.rajd {
            Some(ra) => ra,
            None => sexagesimal::parse_hours(&non_empty(self.raj)?).ok()? * 15.0,
        };
        let dec = match self.decjd {
            Some(dec) => dec,
            None => sexagesimal::parse_degrees(&non_empty(self.decj)?).ok()?,
        };

        let mut record = PulsarRecord::new(name, ra, dec);
        record.distance_kpc = self.dist;
        record.epoch_mjd = self.pepoch;
        Some(record)
    }
}

/// File-backed pulsar catalog
#[derive(Debug, Clone, Default)]
pub struct LocalCatalog {
    records: Vec<PulsarRecord>,
}

impl LocalCatalog {
    /// Build from records, dropping any that fail validation
    pub fn from_records(records: Vec<PulsarRecord>) -> Self {
        let total = records.len();
        let records: Vec<PulsarRecord> = records
            .into_iter()
            .filter(|r| match r.validate() {
                Ok(()) => true,
                Err(e) => {
                    debug!("Dropping record: {}", e);
                    false
                }
            })
            .collect();
        if records.len() < total {
            info!("{} of {} records failed validation", total - records.len(), total);
        }
        Self { records }
    }

    /// Read an ATNF-style CSV export
    pub fn load_atnf_csv(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading ATNF catalog from {:?}", path);
        Self::read_atnf_csv(File::open(path)?)
    }

    pub fn read_atnf_csv(reader: impl Read) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .comment(Some(b'#'))
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let mut records = Vec::new();
        let mut skipped = 0;

        for res in csv_reader.deserialize::<RawAtnfRow>() {
            let raw = match res {
                Ok(raw) => raw,
                Err(e) if e.is_io_error() => return Err(e.into()),
                Err(e) => {
                    debug!("Skipping unreadable row: {}", e);
                    skipped += 1;
                    continue;
                }
            };
            match raw.into_record() {
                Some(record) if record.validate().is_ok() => records.push(record),
                _ => skipped += 1,
            }
        }

        info!(
            "Loaded {} pulsars ({} skipped for missing or invalid fields)",
            records.len(),
            skipped
        );

        Ok(Self { records })
    }

    /// Read a JSON array of records written by [`LocalCatalog::save_json`]
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading pulsar catalog from {:?}", path);

        let reader = BufReader::new(File::open(path)?);
        let records: Vec<PulsarRecord> = serde_json::from_reader(reader)?;
        let catalog = Self::from_records(records);

        info!("Loaded {} pulsars", catalog.len());
        Ok(catalog)
    }

    /// Pick the loader by file extension (`.json` or anything else as CSV)
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::load_json(path),
            _ => Self::load_atnf_csv(path),
        }
    }

    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, &self.records)?;
        writer.flush()?;
        info!("Saved {} pulsars to {:?}", self.records.len(), path);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl PulsarCatalog for LocalCatalog {
    fn records(&self) -> &[PulsarRecord] {
        &self.records
    }
}
