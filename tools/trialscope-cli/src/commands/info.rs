//! Show a trial's attributes and event counts.

use std::collections::BTreeMap;
use std::path::PathBuf;

use trialscope_trial_model::event::EventKind;
use trialscope_trial_model::trial::{EventFilter, Trial};

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    let mut trial = Trial::open(&path, EventFilter::none())
        .map_err(|e| anyhow::anyhow!("Failed to open trial: {e}"))?;

    println!("Trial: {}", trial.path().display());
    println!("  Attributes: {}", trial.attributes().summary());
    if let Some(start) = trial.attributes().start_time() {
        println!("  Started: {start}");
    }

    let events = trial
        .events()
        .map_err(|e| anyhow::anyhow!("Failed to read events: {e}"))?;
    println!("  Events: {}", events.len());
    if let (Some(first), Some(last)) = (events.first(), events.last()) {
        println!(
            "  Span: {}ms to {}ms",
            first.timestamp_ms, last.timestamp_ms
        );
    }

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for event in events {
        *counts.entry(identifier_name(&event.kind)).or_insert(0) += 1;
    }
    println!();
    println!("Event counts:");
    for (identifier, count) in counts {
        println!("  {identifier}: {count}");
    }

    Ok(())
}

fn identifier_name(kind: &EventKind) -> &str {
    match kind {
        EventKind::Startup { .. } => "System.Startup",
        EventKind::DamageTakenChanged { .. } => "Trial.DamageTakenChanged",
        EventKind::WorkspaceInitialized { .. } => "Trial.WorkspaceInitialized",
        EventKind::WorkspaceMoved { .. } => "Trial.WorkspaceMoved",
        EventKind::CursorSpawned { .. } => "Hybrid.CursorSpawned",
        EventKind::CursorMoved { .. } => "Hybrid.CursorMoved",
        EventKind::CursorDespawned { .. } => "Hybrid.CursorDespawned",
        EventKind::BeginBlock => "Trial.BeginBlock",
        EventKind::BeginWave { .. } => "Trial.BeginWave",
        EventKind::EnemySpawned { .. } => "Trial.EnemySpawned",
        EventKind::EnemyMoved { .. } => "Trial.EnemyMoved",
        EventKind::EnemyHit { .. } => "Trial.EnemyHit",
        EventKind::EnemyCollide { .. } => "Trial.EnemyCollide",
        EventKind::RawTouchDown { .. } => "Input.RawTouchDown",
        EventKind::RawTouchMove { .. } => "Input.RawTouchMove",
        EventKind::RawTouchUp { .. } => "Input.RawTouchUp",
        EventKind::Other { identifier } => identifier,
    }
}
