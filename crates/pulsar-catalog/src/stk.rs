//! STK star-file export
//!
//! Writes one `<name>.st` file per pulsar so the targets can be loaded into
//! STK as `Star` objects with a line-of-sight access constraint.

use crate::{sexagesimal, PulsarRecord, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File-safe pulsar name: the first `+` (or, failing that, `-`) split becomes `_`
///
/// `J0437-4715` → `J0437_4715`, `B1937+21` → `B1937_21`. Anything after a
/// second separator is dropped.
pub fn format_pulsar_name(name: &str) -> String {
    let mut parts: Vec<&str> = name.splitn(3, '+').collect();
    if parts.len() < 2 {
        parts = name.splitn(3, '-').collect();
    }
    if parts.len() < 2 {
        parts[0].to_string()
    } else {
        format!("{}_{}", parts[0], parts[1])
    }
}

/// STK `Star` description for one pulsar
#[derive(Debug, Clone, PartialEq)]
pub struct StarFile {
    pub name: String,
    pub epoch: String,
    pub ref_frame: String,
    pub right_ascension_deg: f64,
    /// `±dd:mm:ss.s`, as ATNF lists `DECJ`
    pub declination: String,
    pub proper_motion_ra_per_yr: f64,
    pub proper_motion_dec_per_yr: f64,
    pub parallax: f64,
    pub magnitude: Option<f64>,
    pub id: u32,
}

impl StarFile {
    pub fn from_record(record: &PulsarRecord) -> Self {
        Self {
            name: format_pulsar_name(&record.name),
            epoch: record
                .epoch_mjd
                .map(|mjd| mjd.to_string())
                .unwrap_or_else(|| "J2000".to_string()),
            ref_frame: "J2000".to_string(),
            right_ascension_deg: record.right_ascension_deg,
            declination: sexagesimal::format_declination(record.declination_deg),
            proper_motion_ra_per_yr: 0.0,
            proper_motion_dec_per_yr: 0.0,
            parallax: 0.0,
            magnitude: None,
            id: 0,
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.st", self.name)
    }

    pub fn render(&self) -> String {
        let magnitude = self
            .magnitude
            .map(|m| m.to_string())
            .unwrap_or_else(|| "None".to_string());

        let mut out = format!(
            "stk.v.12.0\n\
             WrittenBy    XNAV\n\n\
             BEGIN Star\n\n\
             \x20   Name\t\t {name}\n\n\
             \x20   BEGIN PathDescription\n\n\
             \x20       Epoch\t\t  {epoch}\n\
             \x20       RefFrame\t\t {frame}\n\
             \x20       RightAscension\t\t  {ra}\n\
             \x20       Declination\t\t  {dec}\n\
             \x20       ProperMotionRAPerYr\t\t {pm_ra}\n\
             \x20       ProperMotionDecPerYr\t\t {pm_dec}\n\
             \x20       Parallax\t\t  {parallax}\n\
             \x20       RadialVelocity\t\t  0.0000000000000000e+00\n\n\
             \x20   END PathDescription\n\n\
             \x20   BEGIN PhysicalData\n\n\
             \x20       Magnitude\t\t  {magnitude}\n\n\
             \x20   END PhysicalData\n\n\
             \x20   BEGIN IdentityData\n\n\
             \x20       Id\t\t {id}\n\n\
             \x20   END IdentityData\n\n\n",
            name = self.name,
            epoch = self.epoch,
            frame = self.ref_frame,
            ra = self.right_ascension_deg,
            dec = self.declination,
            pm_ra = self.proper_motion_ra_per_yr,
            pm_dec = self.proper_motion_dec_per_yr,
            parallax = self.parallax,
            magnitude = magnitude,
            id = self.id,
        );
        out.push_str(EXTENSIONS);
        out
    }

    /// Write `<dir>/<name>.st`, creating `dir` if needed
    pub fn write_to_dir(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name());
        fs::write(&path, self.render())?;
        debug!("Wrote star file {:?}", path);
        Ok(path)
    }
}

const EXTENSIONS: &str = "    BEGIN Extensions

        BEGIN ExternData
        END ExternData

        BEGIN ADFFileData
        END ADFFileData

        BEGIN AccessConstraints
            LineOfSight IncludeIntervals

            UsePreferredMaxStep No
            PreferredMaxStep 360
        END AccessConstraints

        BEGIN Desc
        END Desc

        BEGIN Crdn
        END Crdn

        BEGIN Graphics

            BEGIN Attributes

                MarkerColor\t\t #00ff00
                LabelColor\t\t #00ff00
                MarkerStyle\t\t 2
                FontStyle\t\t 0

            END Attributes

            BEGIN Graphics

                Show\t\t On
                Inherit\t\t On
                ShowLabel\t\t On
                ShowMarker\t\t On

            END Graphics
        END Graphics

        BEGIN VO
        END VO

    END Extensions

END Star";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_pulsar_name() {
        assert_eq!(format_pulsar_name("J0437-4715"), "J0437_4715");
        assert_eq!(format_pulsar_name("B1937+21"), "B1937_21");
        assert_eq!(format_pulsar_name("J1939+2134+x"), "J1939_2134");
        assert_eq!(format_pulsar_name("J0000-1-2"), "J0000_1");
        assert_eq!(format_pulsar_name("Crab"), "Crab");
    }

    #[test]
    fn test_render_contains_path_description() {
        let rec = PulsarRecord::new("J0437-4715", 69.3166, -47.2525).with_epoch_mjd(55000.0);
        let star = StarFile::from_record(&rec);
        let text = star.render();

        assert!(text.starts_with("stk.v.12.0\n"));
        assert!(text.contains("    Name\t\t J0437_4715\n"));
        assert!(text.contains("        Epoch\t\t  55000\n"));
        assert!(text.contains("        RefFrame\t\t J2000\n"));
        assert!(text.contains("        RightAscension\t\t  69.3166\n"));
        assert!(text.contains("        Declination\t\t  -47:15:09.0\n"));
        assert!(text.contains("            LineOfSight IncludeIntervals\n"));
        assert!(text.ends_with("END Star"));
    }

    #[test]
    fn test_write_to_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("stars");
        let star = StarFile::from_record(&PulsarRecord::new("B1937+21", 294.9106, 21.5831));

        let path = star.write_to_dir(&out).unwrap();
        assert_eq!(path, out.join("B1937_21.st"));
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, star.render());
        assert!(written.contains("Epoch\t\t  J2000"));
    }
}
