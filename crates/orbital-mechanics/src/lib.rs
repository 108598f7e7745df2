//! Orbital Mechanics Library
//!
//! Two-body Keplerian propagation, 3-1-3 frame rotation and line-of-sight
//! occlusion for X-ray pulsar navigation (XNAV) mission planning.
//!
//! # Pipeline
//!
//! ```text
//! OrbitSpec ──resolve──> ResolvedOrbit ──propagate──> OrbitalStateSeries
//!                                                         │
//!                                  FrameRotation::apply <─┘
//!                                         │
//!                                         v
//!                                    Trajectory ──pulsar_access──> Vec<bool>
//! ```
//!
//! All lengths are km, speeds km/s, angles radians (degree constructors are
//! provided at the input boundary).

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod anomaly;
pub mod elements;
pub mod frame;
pub mod gravity;
pub mod propagation;
pub mod time;
pub mod trajectory;

pub use anomaly::{Fidelity, KeplerSolverSettings};
pub use elements::{OrbitElements, OrbitGeometry, OrbitSpec, ResolvedOrbit};
pub use frame::FrameRotation;
pub use gravity::GravityModel;
pub use propagation::{propagate, propagate_trajectory, OrbitalStateSeries, PropagatedOrbit, PropagationSettings};
pub use time::TimeGrid;
pub use trajectory::{Ephemeris, Occluder, Trajectory};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrbitalError {
    #[error("Invalid orbital elements: {0}")]
    InvalidElements(String),
    #[error("Domain singularity in {parameter} at {value_deg:.6} deg")]
    DomainSingularity { parameter: &'static str, value_deg: f64 },
    #[error("Kepler solve did not converge at index {index} (M = {mean_anomaly:.9} rad)")]
    NonConvergence { index: usize, mean_anomaly: f64 },
    #[error("Invalid time grid: {0}")]
    InvalidTimeGrid(String),
    #[error("Length mismatch for {what}: expected {expected}, got {actual}")]
    LengthMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },
    #[error("Reference frame mismatch: {expected:?} vs {actual:?}")]
    FrameMismatch {
        expected: ReferenceFrame,
        actual: ReferenceFrame,
    },
}

pub type Result<T> = std::result::Result<T, OrbitalError>;

/// Inertial frame a trajectory is expressed in.
///
/// Catalog pulsar directions are given in the ICRS axes, which coincide with
/// the GCRS axes once aberration is ignored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum ReferenceFrame {
    /// Geocentric celestial reference system (Earth-centred inertial)
    #[default]
    Gcrs,
    /// Inertial frame centred on a body other than Earth, ICRS-aligned axes
    BodyCentredInertial,
}

/// Clamp to [-1, 1] before an inverse trig call. Floating overshoot at
/// near-grazing geometry otherwise produces NaN.
#[inline]
pub fn clamp_unit(x: f64) -> f64 {
    x.clamp(-1.0, 1.0)
}

/// Wrap an angle into [0, 2π)
#[inline]
pub fn wrap_two_pi(angle: f64) -> f64 {
    angle.rem_euclid(std::f64::consts::TAU)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_clamp_unit() {
        assert_eq!(clamp_unit(1.000000000001), 1.0);
        assert_eq!(clamp_unit(-1.2), -1.0);
        assert_eq!(clamp_unit(0.25), 0.25);
        assert!((1.0000000001_f64).asin().is_nan());
        assert!((clamp_unit(1.0000000001)).asin().is_finite());
    }

    #[test]
    fn test_wrap_two_pi() {
        assert!((wrap_two_pi(-PI / 2.0) - 1.5 * PI).abs() < 1e-12);
        assert!((wrap_two_pi(5.0 * PI) - PI).abs() < 1e-12);
        assert_eq!(wrap_two_pi(0.0), 0.0);
    }
}
