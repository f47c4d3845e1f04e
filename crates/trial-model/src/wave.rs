//! Wave metadata from the stimulus script.
//!
//! The upstream script generator writes `identifier,json` records; the only
//! ones the analysis consumes are `Script.BeginWave`, which name the enemy
//! types assigned to each side of the screen for one wave. Records are
//! consumed strictly in file order, one per `Trial.BeginWave` event, across
//! the whole run.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use trialscope_common::error::{TrialscopeError, TrialscopeResult};

use crate::event::EnemyType;

/// Enemy type assignment for one wave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct WaveContext {
    /// Type spawned primarily from the left side.
    pub left_type: EnemyType,
    /// Type spawned primarily from the right side.
    pub right_type: EnemyType,
    /// The minority third type.
    pub flank_type: EnemyType,
}

/// The run-wide wave-metadata cursor. Opened once per run and advanced one
/// record per wave-begin event; it never rewinds.
#[derive(Debug)]
pub struct WaveScript {
    path: PathBuf,
    waves: Vec<WaveContext>,
    cursor: usize,
}

impl WaveScript {
    /// Parse every `Script.BeginWave` record out of a script file.
    pub fn open(path: impl Into<PathBuf>) -> TrialscopeResult<Self> {
        let path = path.into();
        let contents = std::fs::read_to_string(&path).map_err(|_| {
            TrialscopeError::FileNotFound { path: path.clone() }
        })?;

        let mut waves = Vec::new();
        for (index, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            // Script records have no timestamp field: `identifier,json`.
            let (identifier, payload) = line.split_once(',').ok_or_else(|| {
                TrialscopeError::log_format(&path, index + 1, "expected identifier,json")
            })?;
            if identifier.trim() != "Script.BeginWave" {
                continue;
            }
            let context: WaveContext = serde_json::from_str(payload).map_err(|e| {
                TrialscopeError::log_format(&path, index + 1, format!("Script.BeginWave: {e}"))
            })?;
            waves.push(context);
        }

        tracing::debug!(path = %path.display(), waves = waves.len(), "loaded wave script");
        Ok(Self {
            path,
            waves,
            cursor: 0,
        })
    }

    /// Build a script directly from contexts (tests, synthetic runs).
    pub fn from_waves(waves: Vec<WaveContext>) -> Self {
        Self {
            path: PathBuf::from("<synthetic>"),
            waves,
            cursor: 0,
        }
    }

    /// Path of the backing script file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Consume the next wave record.
    pub fn next_wave(&mut self) -> TrialscopeResult<WaveContext> {
        let Some(context) = self.waves.get(self.cursor).copied() else {
            return Err(TrialscopeError::missing_wave(
                &self.path,
                format!("trial began wave {} but the script has only {} wave records",
                    self.cursor + 1,
                    self.waves.len()),
            ));
        };
        self.cursor += 1;
        Ok(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPT: &str = concat!(
        "Script.Start,{\"enemy_types\":[\"Enemy.Cannon\",\"Enemy.BlackHole\",\"Enemy.Shield\"]}\n",
        "Script.BeginBlock,{\"index\":0}\n",
        "Script.BeginWave,{\"left_type\":\"Enemy.Cannon\",\"right_type\":\"Enemy.BlackHole\",\"flank_type\":\"Enemy.Shield\"}\n",
        "Script.SpawnEnemy,{\"type\":\"Enemy.Cannon\",\"side\":\"left\"}\n",
        "Script.BeginWave,{\"left_type\":\"Enemy.BlackHole\",\"right_type\":\"Enemy.Cannon\",\"flank_type\":\"Enemy.Shield\"}\n",
    );

    fn write_script(name: &str, contents: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("trialscope_test_wave");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_only_begin_wave_records_are_consumed() {
        let path = write_script("script.csv", SCRIPT);
        let mut script = WaveScript::open(&path).unwrap();
        let first = script.next_wave().unwrap();
        assert_eq!(first.left_type, EnemyType::Cannon);
        assert_eq!(first.right_type, EnemyType::BlackHole);
        assert_eq!(first.flank_type, EnemyType::Shield);
        let second = script.next_wave().unwrap();
        assert_eq!(second.left_type, EnemyType::BlackHole);
    }

    #[test]
    fn test_exhaustion_is_missing_wave_metadata() {
        let path = write_script("short.csv", SCRIPT);
        let mut script = WaveScript::open(&path).unwrap();
        script.next_wave().unwrap();
        script.next_wave().unwrap();
        let err = script.next_wave().unwrap_err();
        assert!(matches!(err, TrialscopeError::MissingWaveMetadata { .. }));
    }

    #[test]
    fn test_malformed_wave_record_is_fatal() {
        let path = write_script("bad.csv", "Script.BeginWave,{\"left_type\":\"Enemy.Cannon\"}\n");
        let err = WaveScript::open(&path).unwrap_err();
        assert!(matches!(err, TrialscopeError::LogFormat { line: 1, .. }));
    }
}
