//! Mission file
//!
//! A mission is a single JSON document. Angles are degrees, distances km,
//! timestamps RFC 3339 UTC.
//!
//! ```json
//! {
//!   "name": "LEO polar",
//!   "time": { "start": "2023-08-03T00:00:00Z", "end": "2023-08-03T06:00:00Z", "step_seconds": 30 },
//!   "orbit": {
//!     "semi_major_axis_km": 7000, "eccentricity": 0.001, "initial_true_anomaly_deg": 0,
//!     "geometry": { "type": "direct", "inclination_deg": 98, "argument_of_periapsis_deg": 0, "ascending_node_deg": 40 },
//!     "fidelity": "high"
//!   },
//!   "pulsars": { "names": ["J0437-4715"], "geometry": "direction" },
//!   "occluders": [ { "name": "Earth", "radius_km": 6371, "position_km": [0, 0, 0] } ]
//! }
//! ```

use crate::{PlannerError, Result};
use chrono::{DateTime, Duration, Utc};
use orbital_mechanics::{Fidelity, GravityModel, KeplerSolverSettings, OrbitGeometry, OrbitSpec, PropagationSettings, TimeGrid};
use pulsar_access::PulsarGeometry;
use pulsar_catalog::{PulsarCatalog, PulsarRecord, SkyPosition};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionConfig {
    #[serde(default = "default_name")]
    pub name: String,
    pub time: TimeConfig,
    #[serde(default)]
    pub gravity: GravityModel,
    pub orbit: OrbitConfig,
    pub pulsars: PulsarSelection,
    #[serde(default)]
    pub occluders: Vec<OccluderConfig>,
    /// Catalog file, relative to the mission file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<PathBuf>,
}

fn default_name() -> String {
    "mission".to_string()
}

impl MissionConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading mission from {:?}", path);
        let reader = BufReader::new(File::open(path)?);
        let mission: MissionConfig = serde_json::from_reader(reader)?;
        mission.validate()?;
        Ok(mission)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.gravity.is_valid() {
            return Err(PlannerError::Config(format!(
                "gravity model must have positive G and mass, got {:?}",
                self.gravity
            )));
        }
        if !self.pulsars.has_selection() {
            return Err(PlannerError::Config(
                "pulsar selection needs names or a sky query".to_string(),
            ));
        }
        for occluder in &self.occluders {
            occluder.validate()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeConfig {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub step_seconds: f64,
}

impl TimeConfig {
    pub fn grid(&self) -> Result<TimeGrid> {
        if !self.step_seconds.is_finite() || self.step_seconds <= 0.0 {
            return Err(PlannerError::Config(format!(
                "step_seconds must be positive, got {}",
                self.step_seconds
            )));
        }
        let step = Duration::nanoseconds((self.step_seconds * 1e9).round() as i64);
        Ok(TimeGrid::span(self.start, self.end, step)?)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GeometryConfig {
    Direct {
        inclination_deg: f64,
        #[serde(default)]
        argument_of_periapsis_deg: f64,
        #[serde(default)]
        ascending_node_deg: f64,
    },
    Insertion {
        azimuth_deg: f64,
        burnout_latitude_deg: f64,
        #[serde(default)]
        burnout_longitude_deg: Option<f64>,
        #[serde(default)]
        ascending_node_deg: f64,
    },
}

impl Default for GeometryConfig {
    fn default() -> Self {
        GeometryConfig::Direct {
            inclination_deg: 0.0,
            argument_of_periapsis_deg: 0.0,
            ascending_node_deg: 0.0,
        }
    }
}

impl From<GeometryConfig> for OrbitGeometry {
    fn from(config: GeometryConfig) -> Self {
        match config {
            GeometryConfig::Direct {
                inclination_deg,
                argument_of_periapsis_deg,
                ascending_node_deg,
            } => OrbitGeometry::direct_degrees(inclination_deg, argument_of_periapsis_deg, ascending_node_deg),
            GeometryConfig::Insertion {
                azimuth_deg,
                burnout_latitude_deg,
                burnout_longitude_deg,
                ascending_node_deg,
            } => OrbitGeometry::insertion_degrees(
                azimuth_deg,
                burnout_latitude_deg,
                burnout_longitude_deg,
                ascending_node_deg,
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct OrbitConfig {
    pub semi_major_axis_km: f64,
    #[serde(default)]
    pub eccentricity: f64,
    #[serde(default)]
    pub initial_true_anomaly_deg: f64,
    #[serde(default)]
    pub geometry: GeometryConfig,
    #[serde(default)]
    pub fidelity: Fidelity,
    #[serde(default)]
    pub solver: KeplerSolverSettings,
}

impl OrbitConfig {
    pub fn to_spec(&self) -> OrbitSpec {
        OrbitSpec::new(
            self.semi_major_axis_km,
            self.eccentricity,
            self.initial_true_anomaly_deg.to_radians(),
            self.geometry.into(),
        )
    }

    pub fn settings(&self) -> PropagationSettings {
        PropagationSettings {
            fidelity: self.fidelity,
            solver: self.solver,
            ..Default::default()
        }
    }
}

/// Circular sky region, centre in sexagesimal as in the ATNF query form
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SkyQuery {
    pub ra: String,
    pub dec: String,
    pub radius_deg: f64,
}

impl SkyQuery {
    pub fn center(&self) -> Result<SkyPosition> {
        Ok(SkyPosition::from_sexagesimal(&self.ra, &self.dec)?)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PulsarSelection {
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<SkyQuery>,
    #[serde(default)]
    pub geometry: PulsarGeometry,
}

impl PulsarSelection {
    pub fn has_selection(&self) -> bool {
        !self.names.is_empty() || self.query.is_some()
    }

    /// Named pulsars first, in the order given, then query hits in catalog order
    pub fn resolve(&self, catalog: &impl PulsarCatalog) -> Result<Vec<PulsarRecord>> {
        let mut selected = catalog.find_all(&self.names)?;

        if let Some(query) = &self.query {
            let center = query.center()?;
            let hits = catalog.query_circular(&center, query.radius_deg);
            info!(
                "Sky query ({:.3}, {:.3}) r={} deg matched {} pulsars",
                center.right_ascension_deg,
                center.declination_deg,
                query.radius_deg,
                hits.len()
            );
            for hit in hits {
                if !selected.iter().any(|r| r.name == hit.name) {
                    selected.push(hit.clone());
                }
            }
        }

        if selected.is_empty() {
            warn!("Pulsar selection is empty; the access table will have no columns");
        }
        Ok(selected)
    }
}

/// A body that can block line of sight: fixed position or a CSV ephemeris
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OccluderConfig {
    pub name: String,
    pub radius_km: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_km: Option<[f64; 3]>,
    /// `time,x_km,y_km,z_km` file, relative to the mission file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ephemeris_csv: Option<PathBuf>,
}

impl OccluderConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.radius_km.is_finite() || self.radius_km < 0.0 {
            return Err(PlannerError::Config(format!(
                "occluder '{}' radius must be non-negative, got {}",
                self.name, self.radius_km
            )));
        }
        match (&self.position_km, &self.ephemeris_csv) {
            (Some(_), None) | (None, Some(_)) => Ok(()),
            _ => Err(PlannerError::Config(format!(
                "occluder '{}' needs exactly one of position_km or ephemeris_csv",
                self.name
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulsar_catalog::LocalCatalog;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MISSION: &str = r#"{
        "name": "polar",
        "time": { "start": "2023-08-03T00:00:00Z", "end": "2023-08-03T01:00:00Z", "step_seconds": 60 },
        "orbit": {
            "semi_major_axis_km": 7000,
            "eccentricity": 0.01,
            "geometry": { "type": "direct", "inclination_deg": 98 },
            "fidelity": "high"
        },
        "pulsars": { "names": ["J0437-4715"] },
        "occluders": [ { "name": "Earth", "radius_km": 6371, "position_km": [0, 0, 0] } ]
    }"#;

    fn catalog() -> LocalCatalog {
        LocalCatalog::from_records(vec![
            PulsarRecord::new("J0437-4715", 69.3166, -47.2525),
            PulsarRecord::new("J1939+2134", 294.9106, 21.5831),
            PulsarRecord::new("J1955+2908", 298.8662, 29.1444),
        ])
    }

    #[test]
    fn test_load_mission() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(MISSION.as_bytes()).unwrap();

        let mission = MissionConfig::load(file.path()).unwrap();
        assert_eq!(mission.name, "polar");
        assert_eq!(mission.gravity, GravityModel::earth());
        assert_eq!(mission.orbit.fidelity, Fidelity::High);
        assert_eq!(mission.time.grid().unwrap().len(), 61);

        let spec = mission.orbit.to_spec();
        match spec.geometry {
            OrbitGeometry::Direct { inclination, .. } => assert!((inclination - 98f64.to_radians()).abs() < 1e-12),
            other => panic!("unexpected geometry {:?}", other),
        }
    }

    #[test]
    fn test_insertion_geometry() {
        let json = r#"{ "type": "insertion", "azimuth_deg": 45, "burnout_latitude_deg": 28.5, "burnout_longitude_deg": -80.6 }"#;
        let geometry: GeometryConfig = serde_json::from_str(json).unwrap();
        match OrbitGeometry::from(geometry) {
            OrbitGeometry::Insertion { burnout_longitude, .. } => {
                assert!((burnout_longitude.unwrap() - (-80.6f64).to_radians()).abs() < 1e-12)
            }
            other => panic!("unexpected geometry {:?}", other),
        }
    }

    #[test]
    fn test_validation() {
        let mut mission: MissionConfig = serde_json::from_str(MISSION).unwrap();
        assert!(mission.validate().is_ok());

        mission.occluders[0].ephemeris_csv = Some(PathBuf::from("moon.csv"));
        assert!(matches!(mission.validate(), Err(PlannerError::Config(_))));

        mission.occluders.clear();
        mission.pulsars.names.clear();
        assert!(mission.validate().is_err());
    }

    #[test]
    fn test_bad_step_rejected() {
        let mut mission: MissionConfig = serde_json::from_str(MISSION).unwrap();
        mission.time.step_seconds = 0.0;
        assert!(mission.time.grid().is_err());
        mission.time.step_seconds = 60.0;
        mission.time.end = mission.time.start - Duration::seconds(1);
        assert!(matches!(mission.time.grid(), Err(PlannerError::Orbital(_))));
    }

    #[test]
    fn test_selection_names_then_query() {
        let selection = PulsarSelection {
            names: vec!["J1955+2908".to_string()],
            query: Some(SkyQuery {
                ra: "19:40:00".to_string(),
                dec: "+25:00:00".to_string(),
                radius_deg: 10.0,
            }),
            geometry: PulsarGeometry::Direction,
        };
        let picked = selection.resolve(&catalog()).unwrap();
        let names: Vec<_> = picked.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["J1955+2908", "J1939+2134"]);
    }

    #[test]
    fn test_selection_unknown_name() {
        let selection = PulsarSelection {
            names: vec!["J0000+0000".to_string()],
            ..Default::default()
        };
        assert!(matches!(selection.resolve(&catalog()), Err(PlannerError::Catalog(_))));
    }
}
