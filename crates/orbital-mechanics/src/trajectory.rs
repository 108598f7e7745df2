//! Trajectory and line-of-sight occlusion
//!
//! A `Trajectory` is a time-tagged series of inertial positions (and
//! optionally velocities). It is immutable once built and is the input to
//! every visibility computation.
//!
//! # Occlusion test
//!
//! For a body of radius `R` at separation `s2o` and a target along `s2p`:
//!
//! ```text
//! ang_S  = asin(clamp(R / |s2o|))                      // apparent half-size of the body
//! ang_BP = atan2(|s2o × s2p|, s2o · s2p)               // body-to-target angle
//! visible  ⇔  ang_BP > ang_S
//! ```
//!
//! Visibility over several bodies is the logical AND across all of them.

use crate::elements::OrbitSpec;
use crate::gravity::GravityModel;
use crate::propagation::{propagate_trajectory, PropagationSettings};
use crate::time::TimeGrid;
use crate::{clamp_unit, OrbitalError, ReferenceFrame, Result};
use nalgebra::{Unit, Vector3};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    frame: ReferenceFrame,
    times: TimeGrid,
    positions_km: Vec<Vector3<f64>>,
    velocities_km_s: Option<Vec<Vector3<f64>>>,
}

impl Trajectory {
    /// Build from a grid and per-step inertial state (GCRS by default)
    pub fn new(
        times: TimeGrid,
        positions_km: Vec<Vector3<f64>>,
        velocities_km_s: Option<Vec<Vector3<f64>>>,
    ) -> Result<Self> {
        check_length("trajectory positions", times.len(), positions_km.len())?;
        if let Some(ref v) = velocities_km_s {
            check_length("trajectory velocities", times.len(), v.len())?;
        }
        Ok(Self {
            frame: ReferenceFrame::default(),
            times,
            positions_km,
            velocities_km_s,
        })
    }

    /// Circular equatorial orbit (e = 0, inc = 0) through the general propagator
    pub fn circular(times: &TimeGrid, radius_km: f64, initial_true_anomaly: f64, gravity: &GravityModel) -> Result<Self> {
        let spec = OrbitSpec::circular(radius_km, initial_true_anomaly);
        Ok(propagate_trajectory(&spec, times, gravity, &PropagationSettings::default())?.trajectory)
    }

    pub fn with_frame(mut self, frame: ReferenceFrame) -> Self {
        self.frame = frame;
        self
    }

    pub fn frame(&self) -> ReferenceFrame {
        self.frame
    }

    pub fn len(&self) -> usize {
        self.positions_km.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions_km.is_empty()
    }

    pub fn times(&self) -> &TimeGrid {
        &self.times
    }

    pub fn positions_km(&self) -> &[Vector3<f64>] {
        &self.positions_km
    }

    pub fn velocities_km_s(&self) -> Option<&[Vector3<f64>]> {
        self.velocities_km_s.as_deref()
    }

    /// Per-step vector from this trajectory to `other`
    pub fn separation_vectors(&self, other: &Ephemeris<'_>) -> Result<Vec<Vector3<f64>>> {
        self.check_compatible(other, "separation target")?;
        Ok(match other {
            Ephemeris::Fixed(point) => self.positions_km.iter().map(|p| point - p).collect(),
            Ephemeris::Direction(dir) => vec![dir.into_inner(); self.len()],
            Ephemeris::Moving(traj) => traj
                .positions_km
                .iter()
                .zip(&self.positions_km)
                .map(|(o, p)| o - p)
                .collect(),
        })
    }

    /// Per-step visibility of `pulsar`, AND-ed over all `occluders`.
    ///
    /// All inputs are validated before any geometry is computed. With no
    /// occluders every step is visible.
    pub fn pulsar_access(&self, pulsar: &Ephemeris<'_>, occluders: &[Occluder<'_>]) -> Result<Vec<bool>> {
        self.check_compatible(pulsar, "pulsar")?;
        for occluder in occluders {
            occluder.validate()?;
            self.check_compatible(&occluder.ephemeris, &format!("occluder '{}'", occluder.name))?;
        }

        let s2p = self.separation_vectors(pulsar)?;
        let mut access = vec![true; self.len()];

        for occluder in occluders {
            let s2o = self.separation_vectors(&occluder.ephemeris)?;
            let mut blocked = 0usize;
            for ((visible, to_body), to_pulsar) in access.iter_mut().zip(&s2o).zip(&s2p) {
                if !line_of_sight_clear(to_body, to_pulsar, occluder.radius_km) {
                    *visible = false;
                    blocked += 1;
                }
            }
            debug!("Occluder '{}' blocks {} of {} steps", occluder.name, blocked, self.len());
        }

        Ok(access)
    }

    fn check_compatible(&self, other: &Ephemeris<'_>, what: &str) -> Result<()> {
        if let Ephemeris::Moving(traj) = other {
            check_length(what, self.len(), traj.len())?;
            if traj.frame != self.frame {
                return Err(OrbitalError::FrameMismatch {
                    expected: self.frame,
                    actual: traj.frame,
                });
            }
        }
        Ok(())
    }
}

fn check_length(what: &str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(OrbitalError::LengthMismatch {
            what: what.to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}

/// Position of something relative to which separations are taken
#[derive(Debug, Clone, Copy)]
pub enum Ephemeris<'a> {
    /// A point that does not move over the grid (broadcast to every step)
    Fixed(Vector3<f64>),
    /// A target at effectively infinite distance
    Direction(Unit<Vector3<f64>>),
    /// A time series on the same grid
    Moving(&'a Trajectory),
}

impl<'a> From<&'a Trajectory> for Ephemeris<'a> {
    fn from(traj: &'a Trajectory) -> Self {
        Ephemeris::Moving(traj)
    }
}

/// A finite-radius body that can block line of sight
#[derive(Debug, Clone)]
pub struct Occluder<'a> {
    pub name: String,
    pub ephemeris: Ephemeris<'a>,
    pub radius_km: f64,
}

impl<'a> Occluder<'a> {
    pub fn new(name: impl Into<String>, ephemeris: Ephemeris<'a>, radius_km: f64) -> Self {
        Self {
            name: name.into(),
            ephemeris,
            radius_km,
        }
    }

    /// Body of `radius_km` fixed at the frame origin
    pub fn central_body(name: impl Into<String>, radius_km: f64) -> Self {
        Self::new(name, Ephemeris::Fixed(Vector3::zeros()), radius_km)
    }

    fn validate(&self) -> Result<()> {
        if !self.radius_km.is_finite() || self.radius_km < 0.0 {
            return Err(OrbitalError::InvalidElements(format!(
                "occluder '{}' radius must be finite and non-negative, got {}",
                self.name, self.radius_km
            )));
        }
        if matches!(self.ephemeris, Ephemeris::Direction(_)) {
            return Err(OrbitalError::InvalidElements(format!(
                "occluder '{}' needs a position, not a direction",
                self.name
            )));
        }
        Ok(())
    }
}

/// Apparent angular radius of a body of `radius` seen from `distance` away
pub fn angular_radius(radius: f64, distance: f64) -> f64 {
    clamp_unit(radius / distance).asin()
}

/// Angle between two vectors, robust near 0 and π
pub fn angular_separation(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    a.cross(b).norm().atan2(a.dot(b))
}

/// True when a target along `to_target` clears a body at `to_body` of `radius`
pub fn line_of_sight_clear(to_body: &Vector3<f64>, to_target: &Vector3<f64>, radius: f64) -> bool {
    angular_separation(to_body, to_target) > angular_radius(radius, to_body.norm())
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn component() -> impl Strategy<Value = f64> {
        -50_000.0..50_000.0f64
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(2000))]

        // Growing a body can only hide a target, never reveal it
        #[test]
        fn fuzz_access_monotonic_in_radius(
            bx in component(), by in component(), bz in component(),
            px in -1.0..1.0f64, py in -1.0..1.0f64, pz in -1.0..1.0f64,
            r1 in 0.0..20_000.0f64,
            dr in 0.0..20_000.0f64,
        ) {
            let to_body = Vector3::new(bx, by, bz);
            let to_pulsar = Vector3::new(px, py, pz);
            prop_assume!(to_body.norm() > 1.0 && to_pulsar.norm() > 1e-6);

            let small = line_of_sight_clear(&to_body, &to_pulsar, r1);
            let large = line_of_sight_clear(&to_body, &to_pulsar, r1 + dr);
            prop_assert!(!large || small, "visible with r={} but hidden with r={}", r1 + dr, r1);
        }

        // Angular radius stays within [0, π/2] for any non-negative radius and distance
        #[test]
        fn fuzz_angular_radius_bounded(radius in 0.0..1e7f64, distance in 1e-3..1e7f64) {
            let ang = angular_radius(radius, distance);
            prop_assert!(ang.is_finite());
            prop_assert!((0.0..=std::f64::consts::FRAC_PI_2).contains(&ang));
        }
    }
}
