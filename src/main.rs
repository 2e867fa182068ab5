//! Arrakis Rules - scenario replay
//!
//! Replays a scripted event sequence against a fresh session and prints
//! the outcome of every event.

use arrakis_rules::core::config::{config, set_config, RulesConfig};
use arrakis_rules::core::error::{EngineError, Result};
use arrakis_rules::event::ScenarioFile;
use arrakis_rules::forces::{ForceSlot, LedgerDelta, LedgerSnapshot};
use arrakis_rules::map::{load_map, MapModel};
use arrakis_rules::session::GameSession;
use arrakis_rules::shipment::ShipmentCost;
use clap::{Parser, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Replay a placement scenario and report every ledger change
#[derive(Parser, Debug)]
#[command(name = "arrakis-rules")]
#[command(about = "Replay a placement scenario against a fresh game session")]
struct Args {
    /// Scenario JSON file
    scenario: PathBuf,

    /// Map TOML file (defaults to the bundled Arrakis map)
    #[arg(long)]
    map: Option<PathBuf>,

    /// Rules TOML file (defaults to the standard faction setup)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Stop at the first rejected event
    #[arg(long)]
    strict: bool,

    /// Log every validation decision
    #[arg(long, short = 'v')]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Serialize)]
struct EventOutcome {
    index: usize,
    kind: String,
    initiator: String,
    applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    cost: Option<ShipmentCost>,
    #[serde(skip_serializing_if = "Option::is_none")]
    delta: Option<LedgerDelta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

#[derive(Serialize)]
struct ReplayReport {
    scenario: Option<String>,
    session: String,
    events: Vec<EventOutcome>,
    conserved: bool,
    ledger: LedgerSnapshot,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.verbose { "arrakis_rules=debug" } else { "arrakis_rules=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with_writer(std::io::stderr)
        .init();

    if let Some(path) = &args.config {
        let rules = RulesConfig::load(path)?;
        if set_config(rules).is_err() {
            tracing::warn!("Rules config already set, ignoring {}", path.display());
        }
    }

    let map = match &args.map {
        Some(path) => load_map(path)?,
        None => MapModel::standard()?,
    };
    let map = Arc::new(map);

    let scenario = ScenarioFile::load(&args.scenario)?;
    let events = scenario.resolve(&map)?;
    let mut session = GameSession::new(map.clone(), config())?;
    tracing::info!("Replaying {} events in session {}", events.len(), session.id());

    let mut outcomes = Vec::with_capacity(events.len());
    for (index, event) in events.iter().enumerate() {
        let mut outcome = EventOutcome {
            index,
            kind: event.kind().to_string(),
            initiator: event.initiator().to_string(),
            applied: false,
            cost: None,
            delta: None,
            reason: None,
        };
        match session.submit(event) {
            Ok(applied) => {
                outcome.applied = true;
                outcome.cost = Some(applied.cost);
                outcome.delta = Some(applied.delta);
            }
            Err(EngineError::Rejected(reason)) => {
                outcome.reason = Some(reason.to_string());
                let stop = args.strict;
                outcomes.push(outcome);
                if stop {
                    break;
                }
                continue;
            }
            Err(e) => return Err(e),
        }
        outcomes.push(outcome);
    }

    let report = ReplayReport {
        scenario: scenario.name.clone(),
        session: session.id().to_string(),
        events: outcomes,
        conserved: session.conservation_holds(),
        ledger: session.ledger().snapshot(),
    };

    match args.format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        Format::Text => print_text(&report, &session),
    }

    Ok(())
}

fn print_text(report: &ReplayReport, session: &GameSession) {
    let map = session.map();

    println!("\n=== {} ===", report.scenario.as_deref().unwrap_or("scenario"));
    println!("Session {}", report.session);
    println!();

    for outcome in &report.events {
        match (&outcome.delta, &outcome.reason) {
            (Some(delta), _) => {
                let cost = outcome
                    .cost
                    .map(|c| format!("{:?} {}", c.tier, c.amount))
                    .unwrap_or_default();
                println!(
                    "[{}] {} by {} -> v{} ({})",
                    outcome.index, outcome.kind, outcome.initiator, delta.version, cost
                );
                for entry in &delta.entries {
                    let slot = match entry.slot {
                        ForceSlot::Reserve => "reserve".to_string(),
                        ForceSlot::Map(location) => map.name_of(location),
                    };
                    println!("      {:<24} {} -> {}", slot, entry.before, entry.after);
                }
            }
            (None, Some(reason)) => {
                println!("[{}] {} by {} REJECTED: {}", outcome.index, outcome.kind, outcome.initiator, reason);
            }
            (None, None) => {}
        }
    }

    println!("\n--- Final positions ---");
    for faction in session.factions() {
        let ledger = session.ledger();
        println!(
            "{:<14} reserve {:>3}  total {:>3}/{}",
            faction.name(),
            ledger.reserve_of(faction).strength(),
            ledger.total_of(faction),
            session.starting_pool(faction)
        );
        for (location, battalion) in ledger.entries_for(faction) {
            println!("      {:<24} {}", map.name_of(location), battalion);
        }
    }
    println!();
    println!("Conservation: {}", if report.conserved { "OK" } else { "BROKEN" });
}
