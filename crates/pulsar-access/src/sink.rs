//! Access table export

use crate::access::{AccessInterval, AccessTable, PulsarSummary};
use crate::{AccessError, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Column headers ahead of the per-pulsar columns
pub const STATE_COLUMNS: [&str; 7] = [
    "Time_JDate",
    "Spacecraft_pos_X_km",
    "Spacecraft_pos_Y_km",
    "Spacecraft_pos_Z_km",
    "Spacecraft_vel_X_kmps",
    "Spacecraft_vel_Y_kmps",
    "Spacecraft_vel_Z_kmps",
];

/// Destination for a finished access table
pub trait AccessSink {
    fn write_table(&mut self, table: &AccessTable) -> Result<()>;
}

fn flag(visible: bool) -> &'static str {
    if visible {
        "True"
    } else {
        "False"
    }
}

/// One row per time step: Julian date, spacecraft state, then `True`/`False`
/// per pulsar. Velocity cells are empty when the trajectory carries none.
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
}

impl CsvSink<File> {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            writer: csv::Writer::from_path(path)?,
        })
    }
}

impl<W: Write> CsvSink<W> {
    pub fn from_writer(writer: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(writer),
        }
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| AccessError::Io(e.into_error()))
    }
}

impl<W: Write> AccessSink for CsvSink<W> {
    fn write_table(&mut self, table: &AccessTable) -> Result<()> {
        let mut header: Vec<&str> = STATE_COLUMNS.to_vec();
        header.extend(table.pulsar_names());
        self.writer.write_record(&header)?;

        let velocities = table.velocities_km_s();
        for i in 0..table.len() {
            let p = &table.positions_km()[i];
            let mut row = vec![
                table.julian_dates()[i].to_string(),
                p.x.to_string(),
                p.y.to_string(),
                p.z.to_string(),
            ];
            match velocities {
                Some(v) => row.extend([v[i].x.to_string(), v[i].y.to_string(), v[i].z.to_string()]),
                None => row.extend(std::iter::repeat(String::new()).take(3)),
            }
            row.extend(table.columns().iter().map(|c| flag(c.access[i]).to_string()));
            self.writer.write_record(&row)?;
        }

        self.writer.flush()?;
        info!("Wrote {} access rows x {} pulsars", table.len(), table.columns().len());
        Ok(())
    }
}

/// Full table plus derived intervals and per-pulsar summaries
#[derive(Serialize)]
struct AccessReport<'a> {
    #[serde(flatten)]
    table: &'a AccessTable,
    intervals: Vec<AccessInterval>,
    summary: Vec<PulsarSummary>,
}

pub struct JsonSink<W: Write> {
    writer: W,
    pretty: bool,
}

impl JsonSink<BufWriter<File>> {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::from_writer(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> JsonSink<W> {
    pub fn from_writer(writer: W) -> Self {
        Self { writer, pretty: true }
    }

    pub fn compact(mut self) -> Self {
        self.pretty = false;
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> AccessSink for JsonSink<W> {
    fn write_table(&mut self, table: &AccessTable) -> Result<()> {
        let report = AccessReport {
            table,
            intervals: table.intervals(),
            summary: table.summaries(),
        };
        if self.pretty {
            serde_json::to_writer_pretty(&mut self.writer, &report)?;
        } else {
            serde_json::to_writer(&mut self.writer, &report)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

/// Write just the access intervals as a JSON array
pub fn save_intervals(path: impl AsRef<Path>, table: &AccessTable) -> Result<()> {
    let path = path.as_ref();
    let intervals = table.intervals();
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, &intervals)?;
    writer.flush()?;
    info!("Wrote {} access intervals to {:?}", intervals.len(), path);
    Ok(())
}
