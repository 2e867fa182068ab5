//! Automated playtester - hammers many sessions with random placements
//!
//! Generates seeded random event batches, runs them through the session
//! host in parallel and checks that every faction's force pool survived.

use ahash::AHashMap;
use arrakis_rules::core::error::{RejectionReason, Result};
use arrakis_rules::core::types::{Faction, LocationId};
use arrakis_rules::event::{Deployment, EventKind, ForceLocations, Movement, PlacementEvent, Shipment};
use arrakis_rules::forces::Battalion;
use arrakis_rules::map::MapModel;
use arrakis_rules::session::SessionHost;
use clap::Parser;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

/// Random placement playtest across many sessions
#[derive(Parser, Debug)]
#[command(name = "playtest")]
#[command(about = "Run seeded random placement batches through the session host")]
struct Args {
    /// Number of sessions to open
    #[arg(long, default_value_t = 64)]
    sessions: usize,

    /// Events submitted per session
    #[arg(long, default_value_t = 200)]
    events: usize,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize, Default)]
struct Summary {
    seed: u64,
    sessions: usize,
    applied: BTreeMap<String, usize>,
    rejected: BTreeMap<String, usize>,
    corrupted: usize,
    conservation_failures: usize,
    elapsed_ms: u128,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "arrakis_rules=error".into()),
        )
        .init();

    let args = Args::parse();
    let seed = args.seed.unwrap_or_else(rand::random);

    let map = Arc::new(MapModel::standard()?);
    let mut host = SessionHost::new(map.clone(), arrakis_rules::core::config::config().clone())?;

    let mut batches = AHashMap::new();
    for index in 0..args.sessions {
        let id = host.open_session()?;
        let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(index as u64));
        let events = (0..args.events).map(|_| random_event(&map, &mut rng)).collect();
        batches.insert(id, events);
    }

    let start = Instant::now();
    let reports = host.process_batches(batches);
    let elapsed = start.elapsed();

    let mut summary = Summary {
        seed,
        sessions: reports.len(),
        elapsed_ms: elapsed.as_millis(),
        ..Default::default()
    };
    for report in &reports {
        for applied in &report.applied {
            *summary.applied.entry(applied.kind.to_string()).or_default() += 1;
        }
        for (_, reason) in &report.rejected {
            *summary.rejected.entry(reason_label(reason).to_string()).or_default() += 1;
        }
        let session = host.session(report.session);
        if session.map_or(true, |s| s.is_corrupted()) {
            summary.corrupted += 1;
        }
        if session.map_or(true, |s| !s.conservation_holds()) {
            summary.conservation_failures += 1;
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("=== Arrakis Rules Playtest ===");
    println!("Seed: {}  Sessions: {}  Events/session: {}", seed, summary.sessions, args.events);
    println!("Elapsed: {} ms", summary.elapsed_ms);
    println!();
    println!("Applied:");
    for (kind, count) in &summary.applied {
        println!("  {:<24} {}", kind, count);
    }
    println!("Rejected:");
    for (reason, count) in &summary.rejected {
        println!("  {:<24} {}", reason, count);
    }
    println!();
    println!("Corrupted sessions:      {}", summary.corrupted);
    println!("Conservation failures:   {}", summary.conservation_failures);

    if summary.corrupted > 0 || summary.conservation_failures > 0 {
        println!("\nFAILED");
        std::process::exit(1);
    }
    println!("\nOK");
    Ok(())
}

fn reason_label(reason: &RejectionReason) -> &'static str {
    match reason {
        RejectionReason::ForceCountMismatch { .. } => "force_count_mismatch",
        RejectionReason::InvalidDestination { .. } => "invalid_destination",
        RejectionReason::PermissionDenied { .. } => "permission_denied",
        RejectionReason::InsufficientForces { .. } => "insufficient_forces",
    }
}

fn random_location(map: &MapModel, rng: &mut ChaCha8Rng) -> LocationId {
    LocationId(rng.gen_range(0..map.len() as u16))
}

fn random_battalion(faction: Faction, rng: &mut ChaCha8Rng) -> Battalion {
    let special = if rng.gen_bool(0.2) { rng.gen_range(0..=2) } else { 0 };
    Battalion::new(faction, rng.gen_range(0..=4), special)
}

/// Random event, mostly well-formed so a fair share gets through
fn random_event(map: &MapModel, rng: &mut ChaCha8Rng) -> PlacementEvent {
    let faction = *Faction::ALL.choose(rng).unwrap_or(&Faction::Atreides);
    let kind = match rng.gen_range(0..10) {
        0..=4 => EventKind::Shipment,
        5..=7 => EventKind::Movement,
        _ => EventKind::Deployment,
    };

    let from = random_location(map, rng);
    let to = match kind {
        EventKind::Movement if rng.gen_bool(0.8) => {
            let neighbors: Vec<_> = map.neighbors(from).collect();
            neighbors.choose(rng).copied().unwrap_or(from)
        }
        _ => random_location(map, rng),
    };

    let mut force_locations = ForceLocations::at(to, random_battalion(faction, rng));
    if rng.gen_bool(0.15) {
        let spill: Vec<_> = map.sectors_of(to).chain(map.neighbors(to)).collect();
        if let Some(extra) = spill.choose(rng) {
            force_locations.insert(*extra, random_battalion(faction, rng));
        }
    }

    let mut total_amount_of_forces = force_locations.total_strength();
    if rng.gen_bool(0.05) {
        total_amount_of_forces += 1;
    }

    match kind {
        EventKind::Shipment => Shipment {
            initiator: faction,
            to,
            force_locations,
            total_amount_of_forces,
        }
        .into(),
        EventKind::Movement => Movement {
            initiator: faction,
            from,
            to,
            force_locations,
            total_amount_of_forces,
        }
        .into(),
        EventKind::Deployment => Deployment {
            initiator: faction,
            to,
            force_locations,
            total_amount_of_forces,
        }
        .into(),
    }
}
