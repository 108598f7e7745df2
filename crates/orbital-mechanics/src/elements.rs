//! Orbit elements resolver
//!
//! Produces a consistent `{inc, w, Omega}` triple from either direct input or
//! an orbital-insertion description (burnout azimuth, latitude and optional
//! longitude), along with apsis radii and the anomalies at epoch.

use crate::anomaly::{eccentric_to_mean, true_to_eccentric};
use crate::time::local_sidereal_time;
use crate::{clamp_unit, OrbitalError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// |cos| below which a tangent/secant is treated as singular
const SINGULARITY_EPSILON: f64 = 1e-12;

/// Fully resolved Keplerian elements. Angles in radians, lengths in km.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct OrbitElements {
    pub semi_major_axis_km: f64,
    pub eccentricity: f64,
    /// True anomaly at t0
    pub initial_true_anomaly: f64,
    pub inclination: f64,
    pub argument_of_periapsis: f64,
    /// Longitude (right ascension) of the ascending node
    pub ascending_node: f64,
}

impl OrbitElements {
    pub fn validate(&self) -> Result<()> {
        let a = self.semi_major_axis_km;
        let e = self.eccentricity;
        if !a.is_finite() || a <= 0.0 {
            return Err(OrbitalError::InvalidElements(format!(
                "semi-major axis must be positive, got {} km",
                a
            )));
        }
        if !e.is_finite() || !(0.0..1.0).contains(&e) {
            return Err(OrbitalError::InvalidElements(format!(
                "eccentricity must be in [0, 1), got {}",
                e
            )));
        }
        let angles = [
            ("initial true anomaly", self.initial_true_anomaly),
            ("inclination", self.inclination),
            ("argument of periapsis", self.argument_of_periapsis),
            ("ascending node", self.ascending_node),
        ];
        if let Some((name, value)) = angles.iter().find(|(_, v)| !v.is_finite()) {
            return Err(OrbitalError::InvalidElements(format!(
                "{} is not finite ({})",
                name, value
            )));
        }
        Ok(())
    }

    /// Semi-latus rectum p = a(1 - e²)
    pub fn semi_latus_rectum_km(&self) -> f64 {
        self.semi_major_axis_km * (1.0 - self.eccentricity * self.eccentricity)
    }

    /// Orbit equation r = p / (1 + e·cos v)
    pub fn radius_at(&self, true_anomaly: f64) -> f64 {
        self.semi_latus_rectum_km() / (1.0 + self.eccentricity * true_anomaly.cos())
    }
}

/// How the orientation of the orbit is specified
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum OrbitGeometry {
    /// Inclination, argument of periapsis and ascending node given directly
    Direct {
        inclination: f64,
        argument_of_periapsis: f64,
        ascending_node: f64,
    },
    /// Derived from the burnout point at orbital insertion
    Insertion {
        /// Azimuth heading at burnout, clockwise from north
        azimuth: f64,
        /// Geocentric latitude of the burnout point
        burnout_latitude: f64,
        /// Geographic (east) longitude of the burnout point; when present the
        /// ascending node is derived from sidereal time at t0
        burnout_longitude: Option<f64>,
        /// Used when `burnout_longitude` is absent
        ascending_node: f64,
    },
}

impl OrbitGeometry {
    /// Direct geometry from degrees
    pub fn direct_degrees(inclination_deg: f64, argument_of_periapsis_deg: f64, ascending_node_deg: f64) -> Self {
        OrbitGeometry::Direct {
            inclination: inclination_deg.to_radians(),
            argument_of_periapsis: argument_of_periapsis_deg.to_radians(),
            ascending_node: ascending_node_deg.to_radians(),
        }
    }

    /// Insertion geometry from degrees
    pub fn insertion_degrees(
        azimuth_deg: f64,
        burnout_latitude_deg: f64,
        burnout_longitude_deg: Option<f64>,
        ascending_node_deg: f64,
    ) -> Self {
        OrbitGeometry::Insertion {
            azimuth: azimuth_deg.to_radians(),
            burnout_latitude: burnout_latitude_deg.to_radians(),
            burnout_longitude: burnout_longitude_deg.map(f64::to_radians),
            ascending_node: ascending_node_deg.to_radians(),
        }
    }
}

impl Default for OrbitGeometry {
    fn default() -> Self {
        OrbitGeometry::Direct {
            inclination: 0.0,
            argument_of_periapsis: 0.0,
            ascending_node: 0.0,
        }
    }
}

/// Unresolved orbit description: shape plus geometry
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct OrbitSpec {
    pub semi_major_axis_km: f64,
    pub eccentricity: f64,
    pub initial_true_anomaly: f64,
    pub geometry: OrbitGeometry,
}

impl OrbitSpec {
    pub fn new(semi_major_axis_km: f64, eccentricity: f64, initial_true_anomaly: f64, geometry: OrbitGeometry) -> Self {
        Self {
            semi_major_axis_km,
            eccentricity,
            initial_true_anomaly,
            geometry,
        }
    }

    /// Circular, equatorial orbit: e = 0, inc = 0
    pub fn circular(radius_km: f64, initial_true_anomaly: f64) -> Self {
        Self::new(radius_km, 0.0, initial_true_anomaly, OrbitGeometry::default())
    }

    /// Resolve the geometry at epoch `t0`
    pub fn resolve(&self, t0: DateTime<Utc>) -> Result<ResolvedOrbit> {
        let v0 = self.initial_true_anomaly;

        let (inclination, argument_of_periapsis, ascending_node, burnout_arc) = match self.geometry {
            OrbitGeometry::Direct {
                inclination,
                argument_of_periapsis,
                ascending_node,
            } => (inclination, argument_of_periapsis, ascending_node, None),

            OrbitGeometry::Insertion {
                azimuth,
                burnout_latitude,
                burnout_longitude,
                ascending_node,
            } => {
                if azimuth.cos().abs() <= SINGULARITY_EPSILON {
                    return Err(OrbitalError::DomainSingularity {
                        parameter: "azimuth",
                        value_deg: azimuth.to_degrees(),
                    });
                }
                if burnout_latitude.cos().abs() <= SINGULARITY_EPSILON {
                    return Err(OrbitalError::DomainSingularity {
                        parameter: "burnout_latitude",
                        value_deg: burnout_latitude.to_degrees(),
                    });
                }

                // Angle in the orbit plane from the ascending node to burnout
                let l = (burnout_latitude.tan() / azimuth.cos()).atan();
                let w = l - v0;
                let inc = clamp_unit(burnout_latitude.cos() * azimuth.sin()).acos();

                let node = match burnout_longitude {
                    Some(lambda2) => {
                        let delta_lambda = (burnout_latitude.sin() * azimuth.tan()).atan();
                        let lambda1 = lambda2 - delta_lambda;
                        local_sidereal_time(t0, lambda1)
                    }
                    None => ascending_node,
                };

                (inc, w, node, Some(l))
            }
        };

        let elements = OrbitElements {
            semi_major_axis_km: self.semi_major_axis_km,
            eccentricity: self.eccentricity,
            initial_true_anomaly: v0,
            inclination,
            argument_of_periapsis,
            ascending_node,
        };
        elements.validate()?;

        let a = elements.semi_major_axis_km;
        let e = elements.eccentricity;
        let initial_eccentric_anomaly = true_to_eccentric(v0, e);
        let initial_mean_anomaly = eccentric_to_mean(initial_eccentric_anomaly, e);

        debug!(
            "Resolved orbit: a={:.3} km e={:.6} inc={:.4} deg w={:.4} deg Omega={:.4} deg",
            a,
            e,
            inclination.to_degrees(),
            argument_of_periapsis.to_degrees(),
            ascending_node.to_degrees()
        );

        Ok(ResolvedOrbit {
            elements,
            apoapsis_radius_km: a * (1.0 + e),
            periapsis_radius_km: a * (1.0 - e),
            initial_eccentric_anomaly,
            initial_mean_anomaly,
            burnout_arc,
        })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ResolvedOrbit {
    pub elements: OrbitElements,
    pub apoapsis_radius_km: f64,
    pub periapsis_radius_km: f64,
    /// Eccentric anomaly at t0 (rad)
    pub initial_eccentric_anomaly: f64,
    /// Mean anomaly at t0 (rad)
    pub initial_mean_anomaly: f64,
    /// Node-to-burnout arc `l`, insertion geometry only
    pub burnout_arc: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::f64::consts::PI;

    fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 8, 3, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_direct_geometry_passes_through() {
        let spec = OrbitSpec::new(7000.0, 0.01, 0.2, OrbitGeometry::direct_degrees(51.6, 30.0, 120.0));
        let orbit = spec.resolve(epoch()).unwrap();
        assert!((orbit.elements.inclination - 51.6_f64.to_radians()).abs() < 1e-12);
        assert!((orbit.elements.argument_of_periapsis - 30.0_f64.to_radians()).abs() < 1e-12);
        assert!((orbit.elements.ascending_node - 120.0_f64.to_radians()).abs() < 1e-12);
        assert!(orbit.burnout_arc.is_none());
    }

    #[test]
    fn test_apsis_radii() {
        let orbit = OrbitSpec::new(10000.0, 0.2, 0.0, OrbitGeometry::default())
            .resolve(epoch())
            .unwrap();
        assert!((orbit.apoapsis_radius_km - 12000.0).abs() < 1e-9);
        assert!((orbit.periapsis_radius_km - 8000.0).abs() < 1e-9);
    }

    #[test]
    fn test_initial_anomalies_quadrant() {
        // v0 beyond π must give E0 beyond π as well
        let v0 = 1.5 * PI;
        let orbit = OrbitSpec::new(8000.0, 0.3, v0, OrbitGeometry::default())
            .resolve(epoch())
            .unwrap();
        assert!(orbit.initial_eccentric_anomaly > PI);
        let e = 0.3;
        let ecc = orbit.initial_eccentric_anomaly;
        assert!((orbit.initial_mean_anomaly - (ecc - e * ecc.sin())).abs() < 1e-12);
    }

    #[test]
    fn test_insertion_geometry() {
        // Burnout at 28.5 deg latitude heading 90 deg would be singular; use 60 deg
        let azimuth = 60.0_f64.to_radians();
        let dec = 28.5_f64.to_radians();
        let spec = OrbitSpec::new(
            6778.0,
            0.0,
            0.1,
            OrbitGeometry::Insertion {
                azimuth,
                burnout_latitude: dec,
                burnout_longitude: None,
                ascending_node: 0.5,
            },
        );
        let orbit = spec.resolve(epoch()).unwrap();
        let l = (dec.tan() / azimuth.cos()).atan();
        assert!((orbit.elements.argument_of_periapsis - (l - 0.1)).abs() < 1e-12);
        assert!((orbit.elements.inclination - (dec.cos() * azimuth.sin()).acos()).abs() < 1e-12);
        assert_eq!(orbit.elements.ascending_node, 0.5);
        assert_eq!(orbit.burnout_arc, Some(l));
        // Inclination can never be below the burnout latitude
        assert!(orbit.elements.inclination >= dec - 1e-12);
    }

    #[test]
    fn test_insertion_with_burnout_longitude_uses_sidereal_time() {
        let azimuth = 45.0_f64.to_radians();
        let dec = 10.0_f64.to_radians();
        let lambda2 = (-80.0_f64).to_radians();
        let spec = OrbitSpec::new(
            7000.0,
            0.0,
            0.0,
            OrbitGeometry::Insertion {
                azimuth,
                burnout_latitude: dec,
                burnout_longitude: Some(lambda2),
                ascending_node: 0.0,
            },
        );
        let orbit = spec.resolve(epoch()).unwrap();
        let lambda1 = lambda2 - (dec.sin() * azimuth.tan()).atan();
        let expected = local_sidereal_time(epoch(), lambda1);
        assert!((orbit.elements.ascending_node - expected).abs() < 1e-12);
    }

    #[test]
    fn test_due_east_azimuth_is_singular() {
        let spec = OrbitSpec::new(7000.0, 0.0, 0.0, OrbitGeometry::insertion_degrees(90.0, 28.5, None, 0.0));
        let err = spec.resolve(epoch()).unwrap_err();
        assert!(matches!(
            err,
            OrbitalError::DomainSingularity { parameter: "azimuth", .. }
        ));
    }

    #[test]
    fn test_due_west_azimuth_is_singular() {
        let spec = OrbitSpec::new(7000.0, 0.0, 0.0, OrbitGeometry::insertion_degrees(270.0, 5.0, Some(10.0), 0.0));
        assert!(matches!(
            spec.resolve(epoch()),
            Err(OrbitalError::DomainSingularity { parameter: "azimuth", .. })
        ));
    }

    #[test]
    fn test_invalid_shape_rejected() {
        for (a, e) in [(0.0, 0.1), (-7000.0, 0.1), (7000.0, 1.0), (7000.0, -0.1), (f64::NAN, 0.0)] {
            let spec = OrbitSpec::new(a, e, 0.0, OrbitGeometry::default());
            assert!(
                matches!(spec.resolve(epoch()), Err(OrbitalError::InvalidElements(_))),
                "a={} e={}",
                a,
                e
            );
        }
    }

    #[test]
    fn test_orbit_equation() {
        let el = OrbitSpec::new(10000.0, 0.5, 0.0, OrbitGeometry::default())
            .resolve(epoch())
            .unwrap()
            .elements;
        assert!((el.radius_at(0.0) - 5000.0).abs() < 1e-9);
        assert!((el.radius_at(PI) - 15000.0).abs() < 1e-9);
    }
}
