//! Time grid shared by every series in a propagation
//!
//! A `TimeGrid` is non-empty and strictly increasing; its length fixes the
//! length of every derived array.

use crate::{OrbitalError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Julian date of the Unix epoch
const UNIX_EPOCH_JD: f64 = 2440587.5;

/// Julian date of J2000.0
const J2000_JD: f64 = 2451545.0;

const SECONDS_PER_DAY: f64 = 86400.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeGrid {
    times: Vec<DateTime<Utc>>,
}

impl TimeGrid {
    /// Build from explicit timestamps, rejecting empty or non-increasing input
    pub fn new(times: Vec<DateTime<Utc>>) -> Result<Self> {
        if times.is_empty() {
            return Err(OrbitalError::InvalidTimeGrid("grid is empty".to_string()));
        }
        if let Some(i) = times.windows(2).position(|w| w[1] <= w[0]) {
            return Err(OrbitalError::InvalidTimeGrid(format!(
                "not strictly increasing at index {}: {} -> {}",
                i + 1,
                times[i],
                times[i + 1]
            )));
        }
        Ok(Self { times })
    }

    /// `count` samples at `start + k·step`
    pub fn uniform(start: DateTime<Utc>, step: Duration, count: usize) -> Result<Self> {
        if step <= Duration::zero() {
            return Err(OrbitalError::InvalidTimeGrid(format!(
                "step must be positive, got {} s",
                step.num_milliseconds() as f64 / 1000.0
            )));
        }
        let times = (0..count)
            .map(|k| start + step * k as i32)
            .collect::<Vec<_>>();
        Self::new(times)
    }

    /// Samples from `start` to `end` inclusive of `start`, stepping by `step`.
    /// `end` is included when it falls on the step.
    pub fn span(start: DateTime<Utc>, end: DateTime<Utc>, step: Duration) -> Result<Self> {
        if step <= Duration::zero() {
            return Err(OrbitalError::InvalidTimeGrid(
                "step must be positive".to_string(),
            ));
        }
        if end < start {
            return Err(OrbitalError::InvalidTimeGrid(format!(
                "end {} precedes start {}",
                end, start
            )));
        }
        let mut times = Vec::new();
        let mut t = start;
        while t <= end {
            times.push(t);
            t += step;
        }
        Self::new(times)
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.times[0]
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.times[self.times.len() - 1]
    }

    pub fn times(&self) -> &[DateTime<Utc>] {
        &self.times
    }

    /// Seconds elapsed since the first sample, with sub-second precision
    pub fn elapsed_seconds(&self) -> Vec<f64> {
        let t0 = self.start();
        self.times
            .iter()
            .map(|t| duration_seconds(*t - t0))
            .collect()
    }

    pub fn julian_dates(&self) -> Vec<f64> {
        self.times.iter().map(|t| julian_date(*t)).collect()
    }
}

/// Signed length of `d` in seconds, nanosecond resolution
pub fn duration_seconds(d: Duration) -> f64 {
    let whole = d.num_seconds();
    let nanos = (d - Duration::seconds(whole))
        .num_nanoseconds()
        .unwrap_or(0);
    whole as f64 + nanos as f64 * 1e-9
}

/// Julian date (UTC) with fractional-day precision
pub fn julian_date(t: DateTime<Utc>) -> f64 {
    let seconds = t.timestamp() as f64 + t.timestamp_subsec_nanos() as f64 * 1e-9;
    seconds / SECONDS_PER_DAY + UNIX_EPOCH_JD
}

/// Greenwich mean sidereal time (IAU 1982), radians in [0, 2π)
pub fn gmst(t: DateTime<Utc>) -> f64 {
    let jd = julian_date(t);
    let tc = (jd - J2000_JD) / 36525.0;

    let gmst_sec = 67310.54841
        + (876600.0 * 3600.0 + 8640184.812866) * tc
        + 0.093104 * tc * tc
        - 6.2e-6 * tc * tc * tc;

    let gmst_rad = (gmst_sec / 240.0) * (PI / 180.0);
    crate::wrap_two_pi(gmst_rad)
}

/// Mean local sidereal time at an east longitude (radians), in [0, 2π)
pub fn local_sidereal_time(t: DateTime<Utc>, longitude: f64) -> f64 {
    crate::wrap_two_pi(gmst(t) + longitude)
}
