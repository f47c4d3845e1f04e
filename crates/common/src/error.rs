//! Error types shared across trialscope crates.
//!
//! Every failure while replaying a trial is fatal: the run aborts rather than
//! emitting a silently incomplete CSV. Errors that originate from a specific
//! log line carry the file path and one-based line number so the offending
//! record can be found.

use std::path::PathBuf;

/// Top-level error type for trialscope operations.
#[derive(Debug, thiserror::Error)]
pub enum TrialscopeError {
    /// Malformed line, JSON payload, or unparseable timestamp in a trial log.
    #[error("Malformed trial log {path}:{line}: {message}")]
    LogFormat {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// An event sequence the game client should never produce: duplicate
    /// spawns, removal of ids that were never live, timestamps running
    /// backwards.
    #[error("Protocol violation in {path}:{line}: {message}")]
    ProtocolViolation {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// An event referenced an entity that is not live where the transition
    /// table requires one to exist.
    #[error("Unknown entity in {path}:{line}: {message}")]
    UnknownEntity {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// A wave began in the trial but the stimulus script had no record for it.
    #[error("Missing wave metadata in {path}: {message}")]
    MissingWaveMetadata { path: PathBuf, message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using TrialscopeError.
pub type TrialscopeResult<T> = Result<T, TrialscopeError>;

impl TrialscopeError {
    pub fn log_format(path: impl Into<PathBuf>, line: usize, msg: impl Into<String>) -> Self {
        Self::LogFormat {
            path: path.into(),
            line,
            message: msg.into(),
        }
    }

    pub fn protocol(path: impl Into<PathBuf>, line: usize, msg: impl Into<String>) -> Self {
        Self::ProtocolViolation {
            path: path.into(),
            line,
            message: msg.into(),
        }
    }

    pub fn unknown_entity(path: impl Into<PathBuf>, line: usize, msg: impl Into<String>) -> Self {
        Self::UnknownEntity {
            path: path.into(),
            line,
            message: msg.into(),
        }
    }

    pub fn missing_wave(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::MissingWaveMetadata {
            path: path.into(),
            message: msg.into(),
        }
    }
}
