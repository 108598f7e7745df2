//! XNAV Mission Planner
//!
//! Drives the access pipeline from a JSON mission file:
//!
//! 1. Build the time grid and resolve the orbit
//! 2. Propagate and rotate into the inertial frame
//! 3. Select pulsars from the local catalog (by name and/or sky region)
//! 4. Load occluders (fixed points or CSV ephemerides)
//! 5. Compute the access table

use nalgebra::Vector3;
use orbital_mechanics::{propagate_trajectory, Ephemeris, Occluder, PropagatedOrbit, TimeGrid, Trajectory};
use pulsar_access::{compute_access, AccessTable};
use pulsar_catalog::{LocalCatalog, PulsarRecord};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub mod config;
pub mod ephemeris;
pub mod query;

pub use config::{MissionConfig, OccluderConfig, PulsarSelection, SkyQuery};
pub use ephemeris::EphemerisSamples;
pub use query::{query_tag, save_query_results};

#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("Orbital error: {0}")]
    Orbital(#[from] orbital_mechanics::OrbitalError),
    #[error("Catalog error: {0}")]
    Catalog(#[from] pulsar_catalog::CatalogError),
    #[error("Access error: {0}")]
    Access(#[from] pulsar_access::AccessError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Mission configuration error: {0}")]
    Config(String),
    #[error("Ephemeris error: {0}")]
    Ephemeris(String),
}

pub type Result<T> = std::result::Result<T, PlannerError>;

/// Everything produced by one mission run
#[derive(Debug, Clone)]
pub struct AccessPlan {
    pub grid: TimeGrid,
    pub propagated: PropagatedOrbit,
    pub pulsars: Vec<PulsarRecord>,
    pub table: AccessTable,
}

/// Occluder position source, owned so the borrowed `Occluder`s can point at it
enum OccluderTrack {
    Fixed(Vector3<f64>),
    Moving(Trajectory),
}

fn resolve_path(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

fn load_tracks(mission: &MissionConfig, grid: &TimeGrid, base_dir: &Path) -> Result<Vec<OccluderTrack>> {
    mission
        .occluders
        .iter()
        .map(|occluder| {
            occluder.validate()?;
            match (&occluder.position_km, &occluder.ephemeris_csv) {
                (Some([x, y, z]), _) => Ok(OccluderTrack::Fixed(Vector3::new(*x, *y, *z))),
                (None, Some(csv_path)) => {
                    let samples = EphemerisSamples::load_csv(resolve_path(base_dir, csv_path))?;
                    Ok(OccluderTrack::Moving(samples.to_trajectory(grid)?))
                }
                (None, None) => Err(PlannerError::Config(format!(
                    "occluder '{}' has no position",
                    occluder.name
                ))),
            }
        })
        .collect()
}

/// The catalog named by the mission file, unless one is given explicitly
pub fn mission_catalog(mission: &MissionConfig, base_dir: &Path) -> Result<LocalCatalog> {
    match &mission.catalog {
        Some(path) => Ok(LocalCatalog::load(resolve_path(base_dir, path))?),
        None => Err(PlannerError::Config(
            "no catalog given on the command line or in the mission file".to_string(),
        )),
    }
}

/// Run the whole pipeline. Relative paths in the mission resolve against `base_dir`.
pub fn run_access(mission: &MissionConfig, catalog: &LocalCatalog, base_dir: &Path) -> Result<AccessPlan> {
    mission.validate()?;
    info!("Mission '{}'", mission.name);

    let grid = mission.time.grid()?;
    info!(
        "Time grid: {} steps from {} to {}",
        grid.len(),
        grid.start(),
        grid.end()
    );

    let spec = mission.orbit.to_spec();
    let propagated = propagate_trajectory(&spec, &grid, &mission.gravity, &mission.orbit.settings())?;
    info!(
        "Orbit: periapsis {:.1} km, apoapsis {:.1} km, period {:.1} s",
        propagated.orbit.periapsis_radius_km,
        propagated.orbit.apoapsis_radius_km,
        mission.gravity.period_seconds(spec.semi_major_axis_km)
    );

    let pulsars = mission.pulsars.resolve(catalog)?;
    info!("Selected {} pulsars", pulsars.len());

    let tracks = load_tracks(mission, &grid, base_dir)?;
    let occluders: Vec<Occluder<'_>> = mission
        .occluders
        .iter()
        .zip(&tracks)
        .map(|(config, track)| {
            let ephemeris = match track {
                OccluderTrack::Fixed(point) => Ephemeris::Fixed(*point),
                OccluderTrack::Moving(traj) => Ephemeris::Moving(traj),
            };
            Occluder::new(config.name.clone(), ephemeris, config.radius_km)
        })
        .collect();

    let table = compute_access(&propagated.trajectory, &pulsars, &occluders, mission.pulsars.geometry)?;

    Ok(AccessPlan {
        grid,
        propagated,
        pulsars,
        table,
    })
}
