//! Occluder ephemeris files
//!
//! CSV with a header row `time,x_km,y_km,z_km`, RFC 3339 UTC times in
//! increasing order, positions in the same inertial frame as the spacecraft.
//! Samples are linearly interpolated onto the mission grid.

use crate::{PlannerError, Result};
use chrono::{DateTime, Utc};
use nalgebra::Vector3;
use orbital_mechanics::time::duration_seconds;
use orbital_mechanics::{TimeGrid, Trajectory};
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct RawSample {
    time: DateTime<Utc>,
    x_km: f64,
    y_km: f64,
    z_km: f64,
}

/// Position samples of a body over time
#[derive(Debug, Clone, PartialEq)]
pub struct EphemerisSamples {
    times: Vec<DateTime<Utc>>,
    positions_km: Vec<Vector3<f64>>,
}

impl EphemerisSamples {
    pub fn new(times: Vec<DateTime<Utc>>, positions_km: Vec<Vector3<f64>>) -> Result<Self> {
        if times.is_empty() || times.len() != positions_km.len() {
            return Err(PlannerError::Ephemeris(format!(
                "{} times for {} positions",
                times.len(),
                positions_km.len()
            )));
        }
        if let Some(i) = times.windows(2).position(|w| w[1] <= w[0]) {
            return Err(PlannerError::Ephemeris(format!(
                "sample times not increasing at row {}",
                i + 1
            )));
        }
        if positions_km.iter().any(|p| !p.iter().all(|c| c.is_finite())) {
            return Err(PlannerError::Ephemeris("non-finite position".to_string()));
        }
        Ok(Self { times, positions_km })
    }

    pub fn load_csv(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading ephemeris from {:?}", path);
        Self::read_csv(File::open(path)?)
    }

    pub fn read_csv(reader: impl Read) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .comment(Some(b'#'))
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut times = Vec::new();
        let mut positions = Vec::new();
        for res in csv_reader.deserialize::<RawSample>() {
            let raw = res?;
            times.push(raw.time);
            positions.push(Vector3::new(raw.x_km, raw.y_km, raw.z_km));
        }
        debug!("Read {} ephemeris samples", times.len());
        Self::new(times, positions)
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Position at `t`, linear between the bracketing samples
    pub fn position_at(&self, t: DateTime<Utc>) -> Result<Vector3<f64>> {
        let first = self.times[0];
        let last = self.times[self.times.len() - 1];
        if t < first || t > last {
            return Err(PlannerError::Ephemeris(format!(
                "{} outside ephemeris span {} .. {}",
                t, first, last
            )));
        }

        // First sample strictly after t; exact hits land on the sample itself
        let upper = self.times.partition_point(|s| *s <= t);
        if upper == 0 {
            return Ok(self.positions_km[0]);
        }
        let lower = upper - 1;
        if self.times[lower] == t || upper == self.times.len() {
            return Ok(self.positions_km[lower]);
        }

        let span = duration_seconds(self.times[upper] - self.times[lower]);
        let frac = duration_seconds(t - self.times[lower]) / span;
        Ok(self.positions_km[lower].lerp(&self.positions_km[upper], frac))
    }

    /// Resample onto `grid` as a trajectory the spacecraft can be tested against
    pub fn to_trajectory(&self, grid: &TimeGrid) -> Result<Trajectory> {
        let positions = grid
            .times()
            .iter()
            .map(|&t| self.position_at(t))
            .collect::<Result<Vec<_>>>()?;
        Ok(Trajectory::new(grid.clone(), positions, None)?)
    }
}
