//! Pulsar Catalog
//!
//! Local database of XNAV target pulsars. Records come from ATNF catalogue
//! exports (CSV) or a previously saved JSON catalog, and can be queried by
//! name or by a circular region of sky.
//!
//! Positions are J2000 right ascension / declination in degrees. Each record
//! resolves to a unit direction in the ICRS axes, or to a position when a
//! distance is known.

use nalgebra::{Unit, Vector3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod loader;
pub mod sexagesimal;
pub mod stk;

pub use loader::LocalCatalog;
pub use stk::{format_pulsar_name, StarFile};

/// Kiloparsec in km
pub const KPC_KM: f64 = 3.085_677_581_491_367e16;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid pulsar record '{name}': {reason}")]
    InvalidRecord { name: String, reason: String },
    #[error("Invalid sexagesimal value '{0}'")]
    Sexagesimal(String),
    #[error("Pulsar not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, CatalogError>;

/// Point on the celestial sphere (degrees)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SkyPosition {
    pub right_ascension_deg: f64,
    pub declination_deg: f64,
}

impl SkyPosition {
    pub fn new(right_ascension_deg: f64, declination_deg: f64) -> Self {
        Self {
            right_ascension_deg,
            declination_deg,
        }
    }

    /// Parse `hh:mm:ss` right ascension and `±dd:mm:ss` declination
    pub fn from_sexagesimal(ra: &str, dec: &str) -> Result<Self> {
        Ok(Self::new(
            sexagesimal::parse_hours(ra)? * 15.0,
            sexagesimal::parse_degrees(dec)?,
        ))
    }

    /// Great-circle separation in degrees (Vincenty form, stable at all angles)
    pub fn separation_deg(&self, other: &SkyPosition) -> f64 {
        let (ra1, dec1) = (self.right_ascension_deg.to_radians(), self.declination_deg.to_radians());
        let (ra2, dec2) = (other.right_ascension_deg.to_radians(), other.declination_deg.to_radians());
        let dra = ra2 - ra1;

        let num1 = dec2.cos() * dra.sin();
        let num2 = dec1.cos() * dec2.sin() - dec1.sin() * dec2.cos() * dra.cos();
        let denom = dec1.sin() * dec2.sin() + dec1.cos() * dec2.cos() * dra.cos();

        num1.hypot(num2).atan2(denom).to_degrees()
    }

    /// Unit vector in the equatorial (ICRS) axes
    pub fn unit_vector(&self) -> Unit<Vector3<f64>> {
        let ra = self.right_ascension_deg.to_radians();
        let dec = self.declination_deg.to_radians();
        Unit::new_normalize(Vector3::new(dec.cos() * ra.cos(), dec.cos() * ra.sin(), dec.sin()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PulsarRecord {
    pub name: String,
    pub right_ascension_deg: f64,
    pub declination_deg: f64,
    /// Distance in kpc, when the catalogue has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_kpc: Option<f64>,
    /// Period epoch (MJD)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epoch_mjd: Option<f64>,
}

impl PulsarRecord {
    pub fn new(name: impl Into<String>, right_ascension_deg: f64, declination_deg: f64) -> Self {
        Self {
            name: name.into(),
            right_ascension_deg,
            declination_deg,
            distance_kpc: None,
            epoch_mjd: None,
        }
    }

    pub fn with_distance_kpc(mut self, distance_kpc: f64) -> Self {
        self.distance_kpc = Some(distance_kpc);
        self
    }

    pub fn with_epoch_mjd(mut self, epoch_mjd: f64) -> Self {
        self.epoch_mjd = Some(epoch_mjd);
        self
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| CatalogError::InvalidRecord {
            name: self.name.clone(),
            reason,
        };
        if self.name.trim().is_empty() {
            return Err(invalid("empty name".to_string()));
        }
        let ra = self.right_ascension_deg;
        if !ra.is_finite() || !(0.0..360.0).contains(&ra) {
            return Err(invalid(format!("right ascension {} outside [0, 360)", ra)));
        }
        let dec = self.declination_deg;
        if !dec.is_finite() || !(-90.0..=90.0).contains(&dec) {
            return Err(invalid(format!("declination {} outside [-90, 90]", dec)));
        }
        if let Some(d) = self.distance_kpc {
            if !d.is_finite() || d <= 0.0 {
                return Err(invalid(format!("distance {} kpc is not positive", d)));
            }
        }
        Ok(())
    }

    pub fn sky_position(&self) -> SkyPosition {
        SkyPosition::new(self.right_ascension_deg, self.declination_deg)
    }

    /// Direction to the pulsar, treating it as infinitely distant
    pub fn direction(&self) -> Unit<Vector3<f64>> {
        self.sky_position().unit_vector()
    }

    /// Position in km, when the distance is known
    pub fn position_km(&self) -> Option<Vector3<f64>> {
        self.distance_kpc
            .map(|d| self.direction().into_inner() * d * KPC_KM)
    }
}

/// Source of pulsar records
pub trait PulsarCatalog {
    fn records(&self) -> &[PulsarRecord];

    /// Look up by catalogue name or by its file-safe form (`J0437_4715`)
    fn find(&self, name: &str) -> Option<&PulsarRecord> {
        let wanted = name.trim();
        self.records().iter().find(|r| {
            r.name.eq_ignore_ascii_case(wanted) || format_pulsar_name(&r.name).eq_ignore_ascii_case(wanted)
        })
    }

    /// Look up several names, failing on the first missing one
    fn find_all(&self, names: &[String]) -> Result<Vec<PulsarRecord>> {
        names
            .iter()
            .map(|n| self.find(n).cloned().ok_or_else(|| CatalogError::NotFound(n.clone())))
            .collect()
    }

    /// Records within `radius_deg` of `center`, in catalog order
    fn query_circular(&self, center: &SkyPosition, radius_deg: f64) -> Vec<&PulsarRecord> {
        self.records()
            .iter()
            .filter(|r| r.sky_position().separation_deg(center) <= radius_deg)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_separation_known_values() {
        let a = SkyPosition::new(0.0, 0.0);
        assert!((a.separation_deg(&SkyPosition::new(90.0, 0.0)) - 90.0).abs() < 1e-9);
        assert!((a.separation_deg(&SkyPosition::new(0.0, 90.0)) - 90.0).abs() < 1e-9);
        assert!((a.separation_deg(&SkyPosition::new(180.0, 0.0)) - 180.0).abs() < 1e-9);
        assert!(a.separation_deg(&a).abs() < 1e-12);
    }

    #[test]
    fn test_separation_wraps_ra() {
        let a = SkyPosition::new(359.5, 10.0);
        let b = SkyPosition::new(0.5, 10.0);
        assert!((a.separation_deg(&b) - 1.0 * 10.0_f64.to_radians().cos()).abs() < 1e-3);
    }

    #[test]
    fn test_unit_vector_axes() {
        let v = SkyPosition::new(90.0, 0.0).unit_vector();
        assert!((v.into_inner() - Vector3::y()).norm() < 1e-12);
        let pole = SkyPosition::new(123.0, -90.0).unit_vector();
        assert!((pole.into_inner() + Vector3::z()).norm() < 1e-12);
    }

    #[test]
    fn test_record_validation() {
        assert!(PulsarRecord::new("J0437-4715", 69.3166, -47.2525).validate().is_ok());
        assert!(PulsarRecord::new("", 10.0, 0.0).validate().is_err());
        assert!(PulsarRecord::new("X", 360.0, 0.0).validate().is_err());
        assert!(PulsarRecord::new("X", 10.0, 91.0).validate().is_err());
        assert!(PulsarRecord::new("X", f64::NAN, 0.0).validate().is_err());
        assert!(PulsarRecord::new("X", 10.0, 0.0).with_distance_kpc(-1.0).validate().is_err());
    }

    #[test]
    fn test_position_scales_direction() {
        let rec = PulsarRecord::new("J0437-4715", 69.3166, -47.2525).with_distance_kpc(0.157);
        let pos = rec.position_km().unwrap();
        assert!((pos.norm() / KPC_KM - 0.157).abs() < 1e-12);
        assert!((pos.normalize() - rec.direction().into_inner()).norm() < 1e-12);
        assert!(PulsarRecord::new("X", 1.0, 1.0).position_km().is_none());
    }

    struct VecCatalog(Vec<PulsarRecord>);

    impl PulsarCatalog for VecCatalog {
        fn records(&self) -> &[PulsarRecord] {
            &self.0
        }
    }

    #[test]
    fn test_find_by_catalogue_or_file_name() {
        let cat = VecCatalog(vec![
            PulsarRecord::new("J0437-4715", 69.3166, -47.2525),
            PulsarRecord::new("B1937+21", 294.9106, 21.5831),
        ]);
        assert!(cat.find("j0437-4715").is_some());
        assert!(cat.find("B1937_21").is_some());
        assert!(cat.find("J0000+0000").is_none());
        assert!(matches!(
            cat.find_all(&["B1937+21".to_string(), "nope".to_string()]),
            Err(CatalogError::NotFound(n)) if n == "nope"
        ));
    }

    #[test]
    fn test_query_circular() {
        let cat = VecCatalog(vec![
            PulsarRecord::new("near", 266.0, 65.0),
            PulsarRecord::new("far", 83.6, 22.0),
        ]);
        let center = SkyPosition::new(266.86, 65.64);
        let hits = cat.query_circular(&center, 15.0);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "near");
        assert!(cat.query_circular(&center, 0.0).is_empty());
    }
}
