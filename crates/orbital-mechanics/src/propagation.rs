//! Orbit propagator
//!
//! Two-body propagation of resolved elements over a time grid:
//!
//! 1. `M(t) = n·(t − t0) + M0` with `n = √(μ/a³)`
//! 2. true anomaly via the selected `Fidelity`
//! 3. `r = a(1−e²)/(1 + e·cos v)`, flight-path angle and vis-viva speed
//! 4. perifocal position/velocity, then the 3-1-3 rotation to inertial
//!
//! The circular case is the same pipeline with `e = 0`, where `v(t) = M(t)`.

use crate::anomaly::{
    eccentric_anomaly_series, eccentric_to_true, true_anomaly_series_lofi, true_to_eccentric, Fidelity,
    KeplerSolverSettings, LOW_FIDELITY_ADVISORY_ECCENTRICITY,
};
use crate::elements::{OrbitSpec, ResolvedOrbit};
use crate::frame::FrameRotation;
use crate::gravity::GravityModel;
use crate::time::TimeGrid;
use crate::trajectory::Trajectory;
use crate::{OrbitalError, ReferenceFrame, Result};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct PropagationSettings {
    #[serde(default)]
    pub fidelity: Fidelity,
    #[serde(default)]
    pub solver: KeplerSolverSettings,
    #[serde(default)]
    pub frame: ReferenceFrame,
}

impl PropagationSettings {
    pub fn high_fidelity() -> Self {
        Self {
            fidelity: Fidelity::High,
            ..Default::default()
        }
    }
}

/// Per-timestep anomaly and orbital-plane state, all N long
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrbitalStateSeries {
    pub mean_anomaly: Vec<f64>,
    pub eccentric_anomaly: Vec<f64>,
    pub true_anomaly: Vec<f64>,
    pub radius_km: Vec<f64>,
    pub flight_path_angle: Vec<f64>,
    pub speed_km_s: Vec<f64>,
    pub position_pqw_km: Vec<Vector3<f64>>,
    pub velocity_pqw_km_s: Vec<Vector3<f64>>,
}

impl OrbitalStateSeries {
    pub fn len(&self) -> usize {
        self.mean_anomaly.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean_anomaly.is_empty()
    }
}

/// Propagate resolved elements over `grid` in the orbital plane
pub fn propagate(
    orbit: &ResolvedOrbit,
    grid: &TimeGrid,
    gravity: &GravityModel,
    settings: &PropagationSettings,
) -> Result<OrbitalStateSeries> {
    if !gravity.is_valid() {
        return Err(OrbitalError::InvalidElements(format!(
            "gravity model must be positive and finite: {:?}",
            gravity
        )));
    }
    orbit.elements.validate()?;

    let a = orbit.elements.semi_major_axis_km;
    let e = orbit.elements.eccentricity;
    let mu = gravity.mu_km3_s2();
    let n = gravity.mean_motion(a);

    let mean_anomaly: Vec<f64> = grid
        .elapsed_seconds()
        .into_iter()
        .map(|dt| n * dt + orbit.initial_mean_anomaly)
        .collect();

    let (eccentric_anomaly, true_anomaly) = match settings.fidelity {
        Fidelity::High => {
            let ecc = eccentric_anomaly_series(&mean_anomaly, e, orbit.initial_eccentric_anomaly, &settings.solver)?;
            let v = ecc.iter().map(|&ea| eccentric_to_true(ea, e)).collect();
            (ecc, v)
        }
        Fidelity::Low => {
            if e > LOW_FIDELITY_ADVISORY_ECCENTRICITY {
                warn!(
                    "Low-fidelity anomaly series used at e={:.4} (> {}); expect degraded accuracy",
                    e, LOW_FIDELITY_ADVISORY_ECCENTRICITY
                );
            }
            let v = true_anomaly_series_lofi(&mean_anomaly, e);
            let ecc = v.iter().map(|&tv| true_to_eccentric(tv, e)).collect();
            (ecc, v)
        }
    };

    let elements = &orbit.elements;
    let radius_km: Vec<f64> = true_anomaly.iter().map(|&v| elements.radius_at(v)).collect();

    let flight_path_angle: Vec<f64> = true_anomaly
        .iter()
        .map(|&v| (e * v.sin() / (1.0 + e * v.cos())).atan())
        .collect();

    let speed_km_s: Vec<f64> = radius_km
        .iter()
        .map(|&r| (mu * (2.0 / r - 1.0 / a)).sqrt())
        .collect();

    let position_pqw_km = true_anomaly
        .iter()
        .zip(&radius_km)
        .map(|(&v, &r)| Vector3::new(r * v.cos(), r * v.sin(), 0.0))
        .collect();

    // Radial component V·sin γ, transverse component V·cos γ
    let velocity_pqw_km_s = true_anomaly
        .iter()
        .zip(flight_path_angle.iter().zip(&speed_km_s))
        .map(|(&v, (&gamma, &speed))| {
            let radial = speed * gamma.sin();
            let transverse = speed * gamma.cos();
            Vector3::new(
                radial * v.cos() - transverse * v.sin(),
                radial * v.sin() + transverse * v.cos(),
                0.0,
            )
        })
        .collect();

    debug!(
        "Propagated {} steps ({:?} fidelity, a={:.3} km, e={:.6}, n={:.6e} rad/s)",
        grid.len(),
        settings.fidelity,
        a,
        e,
        n
    );

    Ok(OrbitalStateSeries {
        mean_anomaly,
        eccentric_anomaly,
        true_anomaly,
        radius_km,
        flight_path_angle,
        speed_km_s,
        position_pqw_km,
        velocity_pqw_km_s,
    })
}

/// Output of the full resolve → propagate → rotate pipeline
#[derive(Debug, Clone)]
pub struct PropagatedOrbit {
    pub orbit: ResolvedOrbit,
    pub states: OrbitalStateSeries,
    pub trajectory: Trajectory,
}

/// Resolve `spec` at the first grid epoch, propagate, and rotate into the inertial frame
pub fn propagate_trajectory(
    spec: &OrbitSpec,
    grid: &TimeGrid,
    gravity: &GravityModel,
    settings: &PropagationSettings,
) -> Result<PropagatedOrbit> {
    let orbit = spec.resolve(grid.start())?;
    let states = propagate(&orbit, grid, gravity, settings)?;

    let rotation = FrameRotation::from_elements(&orbit.elements);
    let positions = rotation.apply(&states.position_pqw_km);
    let velocities = rotation.apply(&states.velocity_pqw_km_s);

    let trajectory = Trajectory::new(grid.clone(), positions, Some(velocities))?.with_frame(settings.frame);

    Ok(PropagatedOrbit {
        orbit,
        states,
        trajectory,
    })
}
