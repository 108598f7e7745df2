//! Anomaly solver
//!
//! Mean → eccentric → true anomaly conversion for elliptical orbits.
//!
//! Two fidelities are supported:
//! - `Fidelity::Low`: closed-form series `v ≈ M + 2e·sin M + 1.25e²·sin 2M`.
//!   No iteration, never fails. The truncation error grows as `O(e³)`, so
//!   above `LOW_FIDELITY_ADVISORY_ECCENTRICITY` results degrade silently
//!   (a warning is logged by the propagator).
//! - `Fidelity::High`: Newton iteration on Kepler's equation at every
//!   timestep, seeded with the previous timestep's solution. The solve is a
//!   fold over the series; a non-converging step aborts the whole series
//!   since every later seed depends on it.

use crate::{OrbitalError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Eccentricity above which the low-fidelity series is flagged as inaccurate
pub const LOW_FIDELITY_ADVISORY_ECCENTRICITY: f64 = 0.1;

/// Maximum |v_hifi - v_lofi| (rad) expected for e < LOW_FIDELITY_ADVISORY_ECCENTRICITY
pub const LOW_FIDELITY_TOLERANCE_RAD: f64 = 2e-3;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Fidelity {
    #[default]
    Low,
    High,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct KeplerSolverSettings {
    /// Convergence threshold on the Newton step (rad)
    pub tolerance: f64,
    pub max_iterations: u32,
}

impl Default for KeplerSolverSettings {
    fn default() -> Self {
        Self {
            tolerance: 1e-12,
            max_iterations: 50,
        }
    }
}

/// Low-fidelity true anomaly series
pub fn true_anomaly_series_lofi(mean_anomaly: &[f64], e: f64) -> Vec<f64> {
    mean_anomaly
        .iter()
        .map(|&m| m + 2.0 * e * m.sin() + 1.25 * e * e * (2.0 * m).sin())
        .collect()
}

/// Solve `E - e·sin E = M` by Newton iteration from `seed`.
///
/// Returns `None` when the step does not drop below tolerance within the
/// iteration budget, or when the iterate stops being finite.
pub fn solve_kepler(mean_anomaly: f64, e: f64, seed: f64, settings: &KeplerSolverSettings) -> Option<f64> {
    let mut ecc = seed;
    for _ in 0..settings.max_iterations {
        let f = ecc - e * ecc.sin() - mean_anomaly;
        let f_prime = 1.0 - e * ecc.cos();
        let delta = f / f_prime;
        ecc -= delta;

        if !ecc.is_finite() {
            return None;
        }
        if delta.abs() < settings.tolerance {
            return Some(ecc);
        }
    }
    None
}

/// High-fidelity eccentric anomaly series.
///
/// Index 0 is seeded with `e0`; each later index is seeded with the previous
/// solution.
pub fn eccentric_anomaly_series(
    mean_anomaly: &[f64],
    e: f64,
    e0: f64,
    settings: &KeplerSolverSettings,
) -> Result<Vec<f64>> {
    let (_, solved) = mean_anomaly.iter().enumerate().try_fold(
        (e0, Vec::with_capacity(mean_anomaly.len())),
        |(seed, mut acc), (index, &m)| match solve_kepler(m, e, seed, settings) {
            Some(ecc) => {
                acc.push(ecc);
                Ok((ecc, acc))
            }
            None => Err(OrbitalError::NonConvergence {
                index,
                mean_anomaly: m,
            }),
        },
    )?;

    debug!("Solved Kepler's equation at {} timesteps (e={:.6})", solved.len(), e);
    Ok(solved)
}

/// Half-angle coefficient β = e / (1 + √(1-e²))
fn beta(e: f64) -> f64 {
    e / (1.0 + (1.0 - e * e).sqrt())
}

/// Eccentric → true anomaly. Continuous in E: no wrap at ±π, so a
/// monotone E series maps to a monotone v series.
pub fn eccentric_to_true(ecc: f64, e: f64) -> f64 {
    let b = beta(e);
    ecc + 2.0 * (b * ecc.sin() / (1.0 - b * ecc.cos())).atan()
}

/// True → eccentric anomaly, inverse of `eccentric_to_true`
pub fn true_to_eccentric(v: f64, e: f64) -> f64 {
    let b = beta(e);
    v - 2.0 * (b * v.sin() / (1.0 + b * v.cos())).atan()
}

/// Kepler's equation, eccentric → mean anomaly
pub fn eccentric_to_mean(ecc: f64, e: f64) -> f64 {
    ecc - e * ecc.sin()
}
