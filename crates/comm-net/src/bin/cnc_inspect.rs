//! CommNet Session Inspector
//!
//! Runs one session lifecycle against a scene snapshot and prints what the
//! overlay sees: constellations, reconciled ground stations, communicable
//! craft.
//!
//! Usage:
//!   cnc-inspect --scene data/scene.json \
//!               --save persistent.cfg \
//!               --frequency 1 \
//!               --output persistent.out.cfg

use anyhow::{Context, Result};
use cfg_node::{CfgNode, ROOT_NAME};
use clap::Parser;
use comm_model::{Constellation, Frequency, FrequencyList, VesselId};
use comm_net::{CacheStats, CommNetSession, SceneSnapshot, ScenarioSettings, Settings, VesselType};
use ground_stations::{ReconcileReport, StationRecord};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(
    name = "cnc-inspect",
    about = "Inspect CommNet constellation state for a scene snapshot"
)]
struct Args {
    /// Scene snapshot JSON (station templates and live vessels)
    #[arg(short, long)]
    scene: PathBuf,

    /// Saved scenario document to load
    #[arg(long)]
    save: Option<PathBuf>,

    /// Static settings JSON (default constellations and stations)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Only list craft listening on this frequency
    #[arg(short, long)]
    frequency: Option<u16>,

    /// Write the saved scenario document here
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Serialize)]
struct CraftSummary {
    id: VesselId,
    name: String,
    vessel_type: VesselType,
    frequencies: FrequencyList,
}

#[derive(Debug, Serialize)]
struct Report<'a> {
    scenario: ScenarioSettings,
    constellations: &'a [Constellation],
    ground_stations: Vec<StationRecord>,
    reconcile: ReconcileReport,
    craft: Vec<CraftSummary>,
    cache: CacheStats,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // RUST_LOG wins over --verbose
    let level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let settings = match &args.settings {
        Some(path) => Settings::from_path(path)?,
        None => Settings::default(),
    };
    let scene = SceneSnapshot::from_path(&args.scene)?;

    let mut session = CommNetSession::new(settings);
    if let Some(path) = &args.save {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading saved scenario {:?}", path))?;
        let root = CfgNode::parse(&text)?;
        session.load(&root);
    }
    let reconcile = session.start(&scene);

    let frequency = args.frequency.map(Frequency);
    let craft: Vec<CraftSummary> = session
        .get_craft(&scene, frequency)
        .into_iter()
        .map(|c| CraftSummary {
            id: c.vessel_id,
            name: c.name.clone(),
            vessel_type: c.vessel_type,
            frequencies: c.frequencies(),
        })
        .collect();

    let report = Report {
        scenario: *session.scenario(),
        constellations: session.constellations(),
        ground_stations: session.ground_stations().iter().map(|s| s.to_record()).collect(),
        reconcile,
        craft,
        cache: session.cache_stats(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, frequency);
    }

    if let Some(path) = &args.output {
        let mut root = CfgNode::new(ROOT_NAME);
        session.save(&mut root);
        fs::write(path, root.to_document())
            .with_context(|| format!("writing scenario to {:?}", path))?;
        info!("Scenario written to {:?}", path);
    }

    session.teardown();
    Ok(())
}

fn print_report(report: &Report<'_>, frequency: Option<Frequency>) {
    info!("{}", "=".repeat(60));
    info!("CONSTELLATIONS");
    info!("{}", "=".repeat(60));
    for c in report.constellations {
        info!("{}", constellation_line(c));
    }

    info!("{}", "=".repeat(60));
    info!("GROUND STATIONS");
    info!("{}", "=".repeat(60));
    for s in &report.ground_stations {
        info!("{}", station_line(s));
    }
    if !report.reconcile.synthesized.is_empty() {
        info!("  created from reference: {:?}", report.reconcile.synthesized);
    }
    if !report.reconcile.rejected.is_empty() {
        info!("  rejected: {:?}", report.reconcile.rejected);
    }

    info!("{}", "=".repeat(60));
    match frequency {
        Some(f) => info!("CRAFT ON FREQUENCY {}", f),
        None => info!("CRAFT"),
    }
    info!("{}", "=".repeat(60));
    for c in &report.craft {
        info!("{}", craft_line(c));
    }
    info!("Total: {} ({} cache rebuilds)", report.craft.len(), report.cache.rebuilds);
}

fn constellation_line(c: &Constellation) -> String {
    format!("  {:>5} | {:30} | {} | {}", c.id, c.name, c.color, c.frequencies)
}

fn station_line(s: &StationRecord) -> String {
    format!("  {:40} | {}", s.key, s.frequencies)
}

fn craft_line(c: &CraftSummary) -> String {
    format!("  {:30} | {:25} | {}", c.name, c.vessel_type.to_string(), c.frequencies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use comm_model::Color;

    fn freqs(values: &[u16]) -> FrequencyList {
        let mut list = FrequencyList::new();
        for v in values {
            list.insert(Frequency(*v));
        }
        list
    }

    #[test]
    fn test_report_lines_print_frequencies_once() {
        let constellation = Constellation::on_frequency(1, "Relay", Color::WHITE, Frequency(1));
        assert!(constellation_line(&constellation).ends_with("| [1]"));

        let station = StationRecord::new("Kerbin: KSC", freqs(&[0, 1]));
        assert!(station_line(&station).ends_with("| [0, 1]"));

        let craft = CraftSummary {
            id: VesselId::new(),
            name: "Probe 1".to_string(),
            vessel_type: VesselType::Probe,
            frequencies: freqs(&[2]),
        };
        let line = craft_line(&craft);
        assert!(line.ends_with("| [2]"));
        assert!(!line.contains("[["));
    }
}
