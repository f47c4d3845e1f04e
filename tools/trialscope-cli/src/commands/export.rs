//! Export analysis rows for one trial or a directory of trials.

use std::io::Write;
use std::path::PathBuf;

use trialscope_common::config::AppConfig;
use trialscope_replay_core::{replay_trial, OutputMode, RunContext};
use trialscope_trial_model::trial::Trial;
use trialscope_trial_model::wave::WaveScript;

pub fn run(path: PathBuf, script: PathBuf, mode: OutputMode) -> anyhow::Result<()> {
    let config = AppConfig::load();

    let trial_paths = enumerate_trials(&path)?;
    tracing::info!(count = trial_paths.len(), "found trial logs");

    let waves = WaveScript::open(&script)
        .map_err(|e| anyhow::anyhow!("Failed to load wave script: {e}"))?;
    let mut ctx = RunContext::new(waves);

    let stdout = std::io::stdout();
    let mut out = std::io::BufWriter::new(stdout.lock());
    writeln!(out, "{}", mode.header().join(","))?;

    for (trial_index, trial_path) in trial_paths.iter().enumerate() {
        let mut trial = Trial::open(trial_path, mode.filter())
            .map_err(|e| anyhow::anyhow!("Failed to open trial: {e}"))?;
        replay_trial(
            &mut trial,
            trial_index,
            mode,
            &config.screen,
            &mut ctx,
            &mut out,
        )
        .map_err(|e| anyhow::anyhow!("Replay failed: {e}"))?;
    }

    out.flush()?;
    tracing::info!(rows = ctx.rows_emitted(), "export complete");
    Ok(())
}

/// A single file stands alone; a directory contributes every `*.csv` entry,
/// in file-name order.
fn enumerate_trials(path: &PathBuf) -> anyhow::Result<Vec<PathBuf>> {
    if !path.is_dir() {
        return Ok(vec![path.clone()]);
    }
    let mut trials: Vec<PathBuf> = std::fs::read_dir(path)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| {
            p.is_file() && p.extension().and_then(|e| e.to_str()) == Some("csv")
        })
        .collect();
    trials.sort();
    Ok(trials)
}
