//! Frame rotator
//!
//! Orbital-plane (perifocal) → inertial transform via the 3-1-3 sequence
//!
//! ```text
//! R = Rz(Ω) · Rx(i) · Rz(ω)
//! ```
//!
//! The order is fixed: node, then inclination, then periapsis. Any other
//! order is a different (wrong) transform.

use crate::elements::OrbitElements;
use nalgebra::{Rotation3, Vector3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameRotation {
    rotation: Rotation3<f64>,
}

impl FrameRotation {
    pub fn new(ascending_node: f64, inclination: f64, argument_of_periapsis: f64) -> Self {
        let node = Rotation3::from_axis_angle(&Vector3::z_axis(), ascending_node);
        let incline = Rotation3::from_axis_angle(&Vector3::x_axis(), inclination);
        let periapsis = Rotation3::from_axis_angle(&Vector3::z_axis(), argument_of_periapsis);
        Self {
            rotation: node * incline * periapsis,
        }
    }

    pub fn from_elements(elements: &OrbitElements) -> Self {
        Self::new(
            elements.ascending_node,
            elements.inclination,
            elements.argument_of_periapsis,
        )
    }

    pub fn rotation(&self) -> &Rotation3<f64> {
        &self.rotation
    }

    /// Perifocal → inertial
    pub fn apply(&self, vectors: &[Vector3<f64>]) -> Vec<Vector3<f64>> {
        vectors.iter().map(|v| self.rotation * v).collect()
    }

    /// Inertial → perifocal
    pub fn apply_inverse(&self, vectors: &[Vector3<f64>]) -> Vec<Vector3<f64>> {
        let inverse = self.rotation.inverse();
        vectors.iter().map(|v| inverse * v).collect()
    }
}
