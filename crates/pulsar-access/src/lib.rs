//! Pulsar Access Calculator
//!
//! Runs the line-of-sight test of a spacecraft trajectory against each
//! selected pulsar and collects the results into an [`AccessTable`]:
//!
//! ```text
//! Trajectory + [PulsarRecord] + [Occluder] ──compute_access──> AccessTable
//!                                                                 │
//!                                 ┌───────────────┬───────────────┤
//!                                 v               v               v
//!                             CsvSink         JsonSink      AccessFigure (SVG)
//! ```
//!
//! Each pulsar column is independent; a step is visible only when no
//! occluder blocks it.

use thiserror::Error;

pub mod access;
pub mod figure;
pub mod sink;

pub use access::{compute_access, AccessColumn, AccessInterval, AccessTable, PulsarGeometry, PulsarSummary};
pub use figure::AccessFigure;
pub use sink::{save_intervals, AccessSink, CsvSink, JsonSink};

#[derive(Error, Debug)]
pub enum AccessError {
    #[error("Orbital error: {0}")]
    Orbital(#[from] orbital_mechanics::OrbitalError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AccessError>;
