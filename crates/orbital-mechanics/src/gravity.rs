//! Central-body gravity model
//!
//! Passed explicitly into propagation so trajectories about different bodies
//! never share ambient constants.

use serde::{Deserialize, Serialize};

/// Universal gravitational constant (N·m²/kg²)
pub const GRAVITATIONAL_CONSTANT: f64 = 6.67259e-11;

/// Mass of Earth (kg)
pub const EARTH_MASS_KG: f64 = 5.97219e24;

/// Mean radius of Earth (km), used as the default occluder radius
pub const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GravityModel {
    /// Gravitational constant in N·m²/kg²
    pub gravitational_constant: f64,
    /// Mass of the body being orbited in kg
    pub mass_kg: f64,
}

impl Default for GravityModel {
    fn default() -> Self {
        Self::earth()
    }
}

impl GravityModel {
    pub fn new(gravitational_constant: f64, mass_kg: f64) -> Self {
        Self {
            gravitational_constant,
            mass_kg,
        }
    }

    pub fn earth() -> Self {
        Self::new(GRAVITATIONAL_CONSTANT, EARTH_MASS_KG)
    }

    /// Standard gravitational parameter in m³/s²
    pub fn mu_m3_s2(&self) -> f64 {
        self.gravitational_constant * self.mass_kg
    }

    /// Standard gravitational parameter in km³/s²
    pub fn mu_km3_s2(&self) -> f64 {
        self.mu_m3_s2() * 1e-9
    }

    /// Mean motion (rad/s) for a semi-major axis in km
    pub fn mean_motion(&self, semi_major_axis_km: f64) -> f64 {
        (self.mu_km3_s2() / semi_major_axis_km.powi(3)).sqrt()
    }

    /// Orbital period (s) for a semi-major axis in km
    pub fn period_seconds(&self, semi_major_axis_km: f64) -> f64 {
        std::f64::consts::TAU / self.mean_motion(semi_major_axis_km)
    }

    /// Vis-viva speed (km/s) at radius `r_km` on an orbit of semi-major axis `a_km`
    pub fn vis_viva_speed(&self, r_km: f64, a_km: f64) -> f64 {
        (self.mu_km3_s2() * (2.0 / r_km - 1.0 / a_km)).max(0.0).sqrt()
    }

    pub fn is_valid(&self) -> bool {
        self.gravitational_constant.is_finite()
            && self.mass_kg.is_finite()
            && self.gravitational_constant > 0.0
            && self.mass_kg > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_earth_mu() {
        let mu = GravityModel::earth().mu_km3_s2();
        // 6.67259e-11 · 5.97219e24 m³/s², a little under the WGS-84 398 600.4
        assert!((mu - 398_499.8).abs() < 0.1);
        assert_eq!(mu, GRAVITATIONAL_CONSTANT * EARTH_MASS_KG * 1e-9);
    }

    #[test]
    fn test_leo_period() {
        // 7000 km circular orbit: ~97 minutes
        let period = GravityModel::earth().period_seconds(7000.0);
        assert!((period / 60.0 - 97.1).abs() < 0.5);
    }

    #[test]
    fn test_circular_vis_viva() {
        let g = GravityModel::earth();
        let v = g.vis_viva_speed(7000.0, 7000.0);
        assert!((v - (g.mu_km3_s2() / 7000.0).sqrt()).abs() < 1e-12);
    }
}
