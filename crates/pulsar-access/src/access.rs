//! Access table computation and interval extraction

use crate::Result;
use chrono::{DateTime, Utc};
use nalgebra::Vector3;
use orbital_mechanics::time::duration_seconds;
use orbital_mechanics::{Ephemeris, Occluder, OrbitalError, Trajectory};
use pulsar_catalog::PulsarRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// How a pulsar's location is fed to the occlusion test
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PulsarGeometry {
    /// Unit direction, pulsar at infinite distance
    #[default]
    Direction,
    /// Finite position from the catalogue distance; falls back to the
    /// direction when no distance is known
    Position,
}

/// Visibility of one pulsar over the whole grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessColumn {
    pub pulsar: String,
    pub access: Vec<bool>,
}

/// A contiguous run of visible steps (both ends inclusive)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessInterval {
    pub pulsar: String,
    pub start_index: usize,
    pub end_index: usize,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_seconds: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PulsarSummary {
    pub pulsar: String,
    pub visible_steps: usize,
    pub total_steps: usize,
    pub coverage_fraction: f64,
    pub interval_count: usize,
    pub longest_interval_seconds: f64,
}

/// Time-indexed spacecraft state plus one ordered boolean column per pulsar
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccessTable {
    times: Vec<DateTime<Utc>>,
    julian_dates: Vec<f64>,
    positions_km: Vec<Vector3<f64>>,
    velocities_km_s: Option<Vec<Vector3<f64>>>,
    columns: Vec<AccessColumn>,
}

impl AccessTable {
    /// Table over `trajectory` with the given columns, each as long as the grid
    pub fn new(trajectory: &Trajectory, columns: Vec<AccessColumn>) -> Result<Self> {
        for column in &columns {
            if column.access.len() != trajectory.len() {
                return Err(OrbitalError::LengthMismatch {
                    what: format!("access column '{}'", column.pulsar),
                    expected: trajectory.len(),
                    actual: column.access.len(),
                }
                .into());
            }
        }
        Ok(Self {
            times: trajectory.times().times().to_vec(),
            julian_dates: trajectory.times().julian_dates(),
            positions_km: trajectory.positions_km().to_vec(),
            velocities_km_s: trajectory.velocities_km_s().map(<[_]>::to_vec),
            columns,
        })
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn times(&self) -> &[DateTime<Utc>] {
        &self.times
    }

    pub fn julian_dates(&self) -> &[f64] {
        &self.julian_dates
    }

    pub fn positions_km(&self) -> &[Vector3<f64>] {
        &self.positions_km
    }

    pub fn velocities_km_s(&self) -> Option<&[Vector3<f64>]> {
        self.velocities_km_s.as_deref()
    }

    pub fn columns(&self) -> &[AccessColumn] {
        &self.columns
    }

    pub fn pulsar_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.pulsar.as_str())
    }

    pub fn column(&self, pulsar: &str) -> Option<&AccessColumn> {
        self.columns.iter().find(|c| c.pulsar == pulsar)
    }

    /// Visible runs for every pulsar, column order then time order
    pub fn intervals(&self) -> Vec<AccessInterval> {
        self.columns
            .iter()
            .flat_map(|c| self.column_intervals(c))
            .collect()
    }

    fn column_intervals(&self, column: &AccessColumn) -> Vec<AccessInterval> {
        let mut out = Vec::new();
        let mut run_start: Option<usize> = None;

        for (i, &visible) in column.access.iter().enumerate() {
            match (visible, run_start) {
                (true, None) => run_start = Some(i),
                (false, Some(start)) => {
                    out.push(self.interval(&column.pulsar, start, i - 1));
                    run_start = None;
                }
                _ => {}
            }
        }
        if let Some(start) = run_start {
            out.push(self.interval(&column.pulsar, start, column.access.len() - 1));
        }
        out
    }

    fn interval(&self, pulsar: &str, start_index: usize, end_index: usize) -> AccessInterval {
        let start = self.times[start_index];
        let end = self.times[end_index];
        AccessInterval {
            pulsar: pulsar.to_string(),
            start_index,
            end_index,
            start,
            end,
            duration_seconds: duration_seconds(end - start),
        }
    }

    /// Fraction of grid steps with access, per pulsar
    pub fn coverage(&self) -> Vec<(String, f64)> {
        self.columns
            .iter()
            .map(|c| (c.pulsar.clone(), coverage_fraction(&c.access)))
            .collect()
    }

    pub fn summaries(&self) -> Vec<PulsarSummary> {
        self.columns
            .iter()
            .map(|c| {
                let intervals = self.column_intervals(c);
                PulsarSummary {
                    pulsar: c.pulsar.clone(),
                    visible_steps: c.access.iter().filter(|&&v| v).count(),
                    total_steps: c.access.len(),
                    coverage_fraction: coverage_fraction(&c.access),
                    interval_count: intervals.len(),
                    longest_interval_seconds: intervals
                        .iter()
                        .map(|iv| iv.duration_seconds)
                        .fold(0.0, f64::max),
                }
            })
            .collect()
    }
}

fn coverage_fraction(access: &[bool]) -> f64 {
    if access.is_empty() {
        return 0.0;
    }
    access.iter().filter(|&&v| v).count() as f64 / access.len() as f64
}

fn pulsar_ephemeris(record: &PulsarRecord, geometry: PulsarGeometry) -> Ephemeris<'static> {
    match (geometry, record.position_km()) {
        (PulsarGeometry::Position, Some(position)) => Ephemeris::Fixed(position),
        (PulsarGeometry::Position, None) => {
            warn!("No distance for {}, using its direction", record.name);
            Ephemeris::Direction(record.direction())
        }
        (PulsarGeometry::Direction, _) => Ephemeris::Direction(record.direction()),
    }
}

/// Per-step, per-pulsar line-of-sight access of `trajectory`.
///
/// Columns follow the order of `pulsars`; a repeated name keeps only its
/// first occurrence. With no occluders every column is all `true`.
pub fn compute_access(
    trajectory: &Trajectory,
    pulsars: &[PulsarRecord],
    occluders: &[Occluder<'_>],
    geometry: PulsarGeometry,
) -> Result<AccessTable> {
    info!(
        "Computing access for {} pulsars over {} steps ({} occluders)",
        pulsars.len(),
        trajectory.len(),
        occluders.len()
    );

    let mut seen = HashSet::new();
    let mut columns = Vec::with_capacity(pulsars.len());

    for record in pulsars {
        if !seen.insert(record.name.as_str()) {
            warn!("Duplicate pulsar {} ignored", record.name);
            continue;
        }
        let ephemeris = pulsar_ephemeris(record, geometry);
        let access = trajectory.pulsar_access(&ephemeris, occluders)?;
        debug!(
            "{}: {:.1}% coverage",
            record.name,
            coverage_fraction(&access) * 100.0
        );
        columns.push(AccessColumn {
            pulsar: record.name.clone(),
            access,
        });
    }

    AccessTable::new(trajectory, columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use orbital_mechanics::gravity::EARTH_RADIUS_KM;
    use orbital_mechanics::{GravityModel, TimeGrid};

    fn leo(step_s: i64, count: usize) -> Trajectory {
        let t0 = Utc.with_ymd_and_hms(2023, 8, 3, 0, 0, 0).unwrap();
        let grid = TimeGrid::uniform(t0, Duration::seconds(step_s), count).unwrap();
        Trajectory::circular(&grid, 7000.0, 0.0, &GravityModel::earth()).unwrap()
    }

    // RA/Dec of the +Z and -X axes
    fn north_pole_pulsar() -> PulsarRecord {
        PulsarRecord::new("POLE", 0.0, 90.0)
    }

    fn anti_x_pulsar() -> PulsarRecord {
        PulsarRecord::new("ANTI", 180.0, 0.0)
    }

    #[test]
    fn test_empty_pulsar_list_gives_zero_columns() {
        let sc = leo(30, 20);
        let earth = Occluder::central_body("Earth", EARTH_RADIUS_KM);
        let table = compute_access(&sc, &[], &[earth], PulsarGeometry::Direction).unwrap();
        assert_eq!(table.len(), 20);
        assert!(table.columns().is_empty());
        assert!(table.intervals().is_empty());
    }

    #[test]
    fn test_no_occluders_all_visible() {
        let sc = leo(30, 20);
        let table = compute_access(&sc, &[anti_x_pulsar(), north_pole_pulsar()], &[], PulsarGeometry::Direction).unwrap();
        assert_eq!(table.columns().len(), 2);
        for column in table.columns() {
            assert!(column.access.iter().all(|&v| v));
        }
        assert_eq!(table.coverage(), vec![("ANTI".to_string(), 1.0), ("POLE".to_string(), 1.0)]);
    }

    #[test]
    fn test_column_order_and_duplicates() {
        let sc = leo(30, 5);
        let pulsars = vec![north_pole_pulsar(), anti_x_pulsar(), north_pole_pulsar()];
        let table = compute_access(&sc, &pulsars, &[], PulsarGeometry::Direction).unwrap();
        assert_eq!(table.pulsar_names().collect::<Vec<_>>(), vec!["POLE", "ANTI"]);
    }

    #[test]
    fn test_anti_radial_intervals() {
        let sc = leo(30, 240);
        let earth = Occluder::central_body("Earth", EARTH_RADIUS_KM);
        let table = compute_access(&sc, &[anti_x_pulsar(), north_pole_pulsar()], &[earth], PulsarGeometry::Direction)
            .unwrap();

        let anti = table.column("ANTI").unwrap();
        assert!(!anti.access[0]);
        assert!(table.column("POLE").unwrap().access.iter().all(|&v| v));

        let intervals: Vec<_> = table.intervals().into_iter().filter(|iv| iv.pulsar == "ANTI").collect();
        // Just over one orbit: shadowed, visible, shadowed, visible again
        assert_eq!(intervals.len(), 2);
        for iv in &intervals {
            assert!(iv.start_index <= iv.end_index);
            assert!(anti.access[iv.start_index..=iv.end_index].iter().all(|&v| v));
            assert_eq!(iv.duration_seconds, (iv.end_index - iv.start_index) as f64 * 30.0);
        }
        assert!(!anti.access[intervals[0].end_index + 1]);
        assert_eq!(intervals[1].end_index, 239);

        let summary = table.summaries();
        assert_eq!(summary[0].interval_count, 2);
        assert_eq!(summary[1].interval_count, 1);
        assert_eq!(summary[1].coverage_fraction, 1.0);
        assert!(summary[0].coverage_fraction > 0.5 && summary[0].coverage_fraction < 0.8);
    }

    #[test]
    fn test_position_geometry_matches_direction_for_distant_pulsar() {
        let sc = leo(60, 120);
        let earth = Occluder::central_body("Earth", EARTH_RADIUS_KM);
        let far = anti_x_pulsar().with_distance_kpc(1.0);
        let by_dir = compute_access(&sc, &[far.clone()], &[earth.clone()], PulsarGeometry::Direction).unwrap();
        let by_pos = compute_access(&sc, &[far], &[earth], PulsarGeometry::Position).unwrap();
        assert_eq!(by_dir.columns(), by_pos.columns());
    }

    #[test]
    fn test_position_geometry_without_distance_falls_back() {
        let sc = leo(60, 10);
        let table = compute_access(&sc, &[anti_x_pulsar()], &[], PulsarGeometry::Position).unwrap();
        assert_eq!(table.columns().len(), 1);
    }

    #[test]
    fn test_new_rejects_short_column() {
        let sc = leo(60, 10);
        let err = AccessTable::new(
            &sc,
            vec![AccessColumn {
                pulsar: "X".to_string(),
                access: vec![true; 9],
            }],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            crate::AccessError::Orbital(OrbitalError::LengthMismatch { expected: 10, actual: 9, .. })
        ));
    }

    #[test]
    fn test_single_step_run_has_zero_duration() {
        let sc = leo(60, 5);
        let table = AccessTable::new(
            &sc,
            vec![AccessColumn {
                pulsar: "X".to_string(),
                access: vec![false, true, false, true, true],
            }],
        )
        .unwrap();
        let intervals = table.intervals();
        assert_eq!(intervals.len(), 2);
        assert_eq!((intervals[0].start_index, intervals[0].end_index), (1, 1));
        assert_eq!(intervals[0].duration_seconds, 0.0);
        assert_eq!((intervals[1].start_index, intervals[1].end_index), (3, 4));
        assert_eq!(intervals[1].duration_seconds, 60.0);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use orbital_mechanics::{GravityModel, TimeGrid};
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        // Intervals partition exactly the visible steps
        #[test]
        fn intervals_cover_visible_steps(access in proptest::collection::vec(any::<bool>(), 1..64)) {
            let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
            let grid = TimeGrid::uniform(t0, Duration::seconds(10), access.len()).unwrap();
            let sc = Trajectory::circular(&grid, 7000.0, 0.0, &GravityModel::earth()).unwrap();
            let table = AccessTable::new(&sc, vec![AccessColumn { pulsar: "P".into(), access: access.clone() }]).unwrap();

            let mut rebuilt = vec![false; access.len()];
            let intervals = table.intervals();
            for pair in intervals.windows(2) {
                // Separated by at least one hidden step
                prop_assert!(pair[0].end_index + 1 < pair[1].start_index);
            }
            for iv in &intervals {
                for flag in &mut rebuilt[iv.start_index..=iv.end_index] {
                    *flag = true;
                }
            }
            prop_assert_eq!(rebuilt, access);
        }
    }
}
