//! XNAV Access Planning CLI
//!
//! Usage:
//!   plan-access access --mission data/mission_leo.json --output access.csv \
//!                      --figure access.svg --intervals intervals.json
//!   plan-access query --catalog data/pulsars.csv --ra 17:47:26 --dec -28:00:00 --radius 10 \
//!                     --out-dir query_results --tag galactic-centre
//!   plan-access stars --catalog data/pulsars.csv --names J0437-4715 B1937+21 --out-dir stars/

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use mission_planner::{mission_catalog, run_access, save_query_results, MissionConfig};
use pulsar_access::{save_intervals, AccessFigure, AccessSink, CsvSink, JsonSink};
use pulsar_catalog::sexagesimal::{format_dms, Hemisphere};
use pulsar_catalog::{sexagesimal, LocalCatalog, PulsarCatalog, SkyPosition, StarFile};
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "plan-access", about = "Pulsar line-of-sight access planning for XNAV missions")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Propagate the mission orbit and compute pulsar access
    Access {
        /// Mission JSON file
        #[arg(short, long)]
        mission: PathBuf,

        /// Pulsar catalog (ATNF CSV or JSON); overrides the mission file
        #[arg(short, long)]
        catalog: Option<PathBuf>,

        /// Access table output (.csv, or .json for the full report)
        #[arg(short, long, default_value = "access.csv")]
        output: PathBuf,

        /// Also write an SVG access timeline
        #[arg(long)]
        figure: Option<PathBuf>,

        /// Also write the access intervals as JSON
        #[arg(long)]
        intervals: Option<PathBuf>,
    },

    /// List catalog pulsars inside a circle on the sky
    Query {
        #[arg(short, long)]
        catalog: PathBuf,

        /// Right ascension of the centre, hh:mm:ss
        #[arg(long)]
        ra: String,

        /// Declination of the centre, ±dd:mm:ss
        #[arg(long, allow_hyphen_values = true)]
        dec: String,

        /// Radius in degrees
        #[arg(long, default_value_t = 10.0)]
        radius: f64,

        /// Star files for the hits go to <out-dir>/<tag>/
        #[arg(short, long, default_value = "query_results")]
        out_dir: PathBuf,

        /// Result directory name; built from the query when omitted
        #[arg(short, long)]
        tag: Option<String>,
    },

    /// Write STK star files for catalog pulsars
    Stars {
        #[arg(short, long)]
        catalog: PathBuf,

        /// Pulsar names; all catalog pulsars when omitted
        #[arg(short, long, num_args = 1..)]
        names: Vec<String>,

        #[arg(short, long, default_value = "stars")]
        out_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match args.command {
        Command::Access {
            mission,
            catalog,
            output,
            figure,
            intervals,
        } => access(&mission, catalog.as_deref(), &output, figure.as_deref(), intervals.as_deref()),
        Command::Query {
            catalog,
            ra,
            dec,
            radius,
            out_dir,
            tag,
        } => query(&catalog, &ra, &dec, radius, &out_dir, tag.as_deref()),
        Command::Stars {
            catalog,
            names,
            out_dir,
        } => stars(&catalog, &names, &out_dir),
    }
}

fn access(
    mission_path: &Path,
    catalog_path: Option<&Path>,
    output: &Path,
    figure: Option<&Path>,
    intervals: Option<&Path>,
) -> Result<()> {
    info!("{}", "=".repeat(60));
    info!("XNAV Pulsar Access Planner");
    info!("{}", "=".repeat(60));

    let mission = MissionConfig::load(mission_path)
        .with_context(|| format!("reading mission {}", mission_path.display()))?;
    let base_dir = mission_path.parent().unwrap_or_else(|| Path::new("."));

    let catalog = match catalog_path {
        Some(path) => LocalCatalog::load(path)?,
        None => mission_catalog(&mission, base_dir)?,
    };

    let plan = run_access(&mission, &catalog, base_dir)?;

    let is_json = output
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if is_json {
        JsonSink::create(output)?.write_table(&plan.table)?;
    } else {
        CsvSink::create(output)?.write_table(&plan.table)?;
    }
    info!("Wrote access table to {:?}", output);

    if let Some(path) = figure {
        AccessFigure::default()
            .with_title(format!("Pulsar accesses: {}", mission.name))
            .save(path, &plan.table)?;
    }
    if let Some(path) = intervals {
        save_intervals(path, &plan.table)?;
    }

    // Summary
    info!("{}", "=".repeat(60));
    info!("SUMMARY");
    info!("{}", "=".repeat(60));
    for summary in plan.table.summaries() {
        info!(
            "  {:20} | {:5.1}% | {:3} intervals | longest {:.0} s",
            summary.pulsar,
            summary.coverage_fraction * 100.0,
            summary.interval_count,
            summary.longest_interval_seconds
        );
    }

    Ok(())
}

fn query(catalog_path: &Path, ra: &str, dec: &str, radius: f64, out_dir: &Path, tag: Option<&str>) -> Result<()> {
    if !radius.is_finite() || radius < 0.0 {
        bail!("radius must be a non-negative number of degrees, got {}", radius);
    }
    let catalog = LocalCatalog::load(catalog_path)?;
    let center = SkyPosition::from_sexagesimal(ra, dec)?;

    let hits = catalog.query_circular(&center, radius);
    info!(
        "{} pulsars within {} deg of RA {} Dec {}",
        hits.len(),
        radius,
        ra,
        sexagesimal::format_dms_pretty(center.declination_deg, Hemisphere::Latitude, 1)
    );
    for record in &hits {
        let separation = record.sky_position().separation_deg(&center);
        println!(
            "{:16} RA {:>10.4}  Dec {:>14}  sep {:6.3} deg{}",
            record.name,
            record.right_ascension_deg,
            format_dms(record.declination_deg),
            separation,
            record
                .distance_kpc
                .map(|d| format!("  dist {:.3} kpc", d))
                .unwrap_or_default()
        );
    }

    let saved = save_query_results(out_dir, tag, ra, dec, radius, &hits)?;
    info!("Results saved to {:?}", saved);
    Ok(())
}

fn stars(catalog_path: &Path, names: &[String], out_dir: &Path) -> Result<()> {
    let catalog = LocalCatalog::load(catalog_path)?;
    let records = if names.is_empty() {
        catalog.records().to_vec()
    } else {
        catalog.find_all(names)?
    };

    for record in &records {
        let path = StarFile::from_record(record).write_to_dir(out_dir)?;
        info!("{} -> {:?}", record.name, path);
    }
    info!("Wrote {} star files to {:?}", records.len(), out_dir);
    Ok(())
}
