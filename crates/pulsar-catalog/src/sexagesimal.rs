//! Sexagesimal angle parsing and formatting
//!
//! `hh:mm:ss.s` right ascension and `±dd:mm:ss.s` declination as used by the
//! ATNF catalogue and by sky-region queries.

use crate::{CatalogError, Result};

/// Which hemisphere letters to use when pretty-printing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hemisphere {
    Latitude,
    Longitude,
}

fn parse_fields(value: &str) -> Result<(bool, f64)> {
    let err = || CatalogError::Sexagesimal(value.to_string());
    let trimmed = value.trim();
    let (negative, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    if body.is_empty() {
        return Err(err());
    }

    let parts: Vec<&str> = body.split(':').collect();
    if parts.len() > 3 {
        return Err(err());
    }

    let mut total = 0.0;
    for (i, part) in parts.iter().enumerate() {
        let field: f64 = part.trim().parse().map_err(|_| err())?;
        if !field.is_finite() || field < 0.0 || (i > 0 && field >= 60.0) {
            return Err(err());
        }
        total += field / 60f64.powi(i as i32);
    }
    Ok((negative, total))
}

/// Parse `hh[:mm[:ss.s]]` into decimal hours
pub fn parse_hours(value: &str) -> Result<f64> {
    let (negative, hours) = parse_fields(value)?;
    if negative || hours >= 24.0 {
        return Err(CatalogError::Sexagesimal(value.to_string()));
    }
    Ok(hours)
}

/// Parse `±dd[:mm[:ss.s]]` into decimal degrees
pub fn parse_degrees(value: &str) -> Result<f64> {
    let (negative, degrees) = parse_fields(value)?;
    Ok(if negative { -degrees } else { degrees })
}

/// Split decimal degrees into (degrees, minutes, seconds), sign on the degrees
pub fn to_dms(deg: f64) -> (i64, i64, f64) {
    let total_seconds = deg.abs() * 3600.0;
    let minutes_total = (total_seconds / 60.0).floor();
    let s = total_seconds - minutes_total * 60.0;
    let d = (minutes_total / 60.0).floor();
    let m = minutes_total - d * 60.0;
    let d = if deg < 0.0 { -(d as i64) } else { d as i64 };
    (d, m as i64, s)
}

/// `d:m:s` form
pub fn format_dms(deg: f64) -> String {
    let (d, m, s) = to_dms(deg);
    // A negative angle under one degree still needs its sign
    let sign = if deg < 0.0 && d == 0 { "-" } else { "" };
    format!("{}{}:{}:{}", sign, d, m, s)
}

/// Signed `±dd:mm:ss.s` form used by ATNF `DECJ`, rounded to a tenth of an arcsecond
pub fn format_declination(deg: f64) -> String {
    let tenths = (deg.abs() * 36_000.0).round() as i64;
    let sign = if deg < 0.0 && tenths > 0 { '-' } else { '+' };
    format!(
        "{}{:02}:{:02}:{:02}.{}",
        sign,
        tenths / 36_000,
        tenths / 600 % 60,
        tenths / 10 % 60,
        tenths % 10
    )
}

/// `12° 34′ 56.7890″ N` form
pub fn format_dms_pretty(deg: f64, hemisphere: Hemisphere, decimals: usize) -> String {
    let (d, m, s) = to_dms(deg);
    let hemi = match (hemisphere, deg >= 0.0) {
        (Hemisphere::Latitude, true) => 'N',
        (Hemisphere::Latitude, false) => 'S',
        (Hemisphere::Longitude, true) => 'E',
        (Hemisphere::Longitude, false) => 'W',
    };
    format!("{}° {}′ {:.*}″ {}", d.abs(), m, decimals, s, hemi)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hours() {
        assert!((parse_hours("17:47:26").unwrap() - (17.0 + 47.0 / 60.0 + 26.0 / 3600.0)).abs() < 1e-12);
        assert_eq!(parse_hours("6").unwrap(), 6.0);
        assert!(parse_hours("24:00:00").is_err());
        assert!(parse_hours("-1:00:00").is_err());
    }

    #[test]
    fn test_parse_degrees() {
        assert!((parse_degrees("65:38:24").unwrap() - 65.64).abs() < 1e-12);
        assert!((parse_degrees("-47:15:09.1").unwrap() + (47.0 + 15.0 / 60.0 + 9.1 / 3600.0)).abs() < 1e-12);
        assert!((parse_degrees("+21:34:59").unwrap() - (21.0 + 34.0 / 60.0 + 59.0 / 3600.0)).abs() < 1e-12);
        assert!((parse_degrees("-00:30:00").unwrap() + 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["", "-", "12:xx:00", "12:60:00", "1:2:3:4", "12:-5:00"] {
            assert!(parse_degrees(bad).is_err(), "{}", bad);
        }
    }

    #[test]
    fn test_dms_round_trip() {
        let (d, m, s) = to_dms(65.64);
        assert_eq!((d, m), (65, 38));
        assert!((s - 24.0).abs() < 1e-6);
        let text = format_dms(-47.2525);
        assert!(text.starts_with("-47:15:"));
        assert!((parse_degrees(&text).unwrap() + 47.2525).abs() < 1e-9);
    }

    #[test]
    fn test_small_negative_keeps_sign() {
        let text = format_dms(-0.5);
        assert!(text.starts_with("-0:30:"));
        assert!((parse_degrees(&text).unwrap() + 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_format_declination() {
        assert_eq!(format_declination(-47.2525), "-47:15:09.0");
        assert_eq!(format_declination(4.8610), "+04:51:39.6");
        assert_eq!(format_declination(-0.5), "-00:30:00.0");
        // 59.99″ rounds up into the next minute
        assert_eq!(format_declination(10.0 + 59.99 / 3600.0), "+10:01:00.0");
        assert!((parse_degrees(&format_declination(-33.9791)).unwrap() + 33.9791).abs() < 1.0 / 36_000.0);
    }

    #[test]
    fn test_pretty_print() {
        assert_eq!(format_dms_pretty(65.64, Hemisphere::Latitude, 1), "65° 38′ 24.0″ N");
        assert_eq!(format_dms_pretty(-118.25, Hemisphere::Longitude, 0), "118° 15′ 0″ W");
    }
}
