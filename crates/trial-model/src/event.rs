//! Event types for the trial event stream.
//!
//! A trial log stores one event per line as three comma-separated fields:
//! an integer millisecond timestamp, a dotted event identifier, and a JSON
//! object payload. Payload shape varies by identifier, so decoding goes
//! through a closed tagged enum with an explicit field schema per kind;
//! identifiers the analysis does not act on survive as [`EventKind::Other`]
//! with their payload validated but dropped.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Milliseconds since trial start.
pub type TimestampMs = u64;

/// A single decoded trial event.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialEvent {
    /// Milliseconds since trial start.
    pub timestamp_ms: TimestampMs,

    /// The event payload.
    pub kind: EventKind,

    /// One-based line number in the source log, for error reporting.
    pub line: usize,
}

/// The enemy classes the stimulus script spawns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyType {
    #[serde(rename = "Enemy.Cannon")]
    Cannon,
    #[serde(rename = "Enemy.BlackHole")]
    BlackHole,
    #[serde(rename = "Enemy.Shield")]
    Shield,
}

impl fmt::Display for EnemyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EnemyType::Cannon => "Enemy.Cannon",
            EnemyType::BlackHole => "Enemy.BlackHole",
            EnemyType::Shield => "Enemy.Shield",
        };
        f.write_str(name)
    }
}

/// Discriminated union of event kinds, keyed by the dotted identifier.
///
/// Coordinates are raw display pixels exactly as logged; conversion to
/// centimetres happens in the replay layer.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    /// `System.Startup` — first event of every trial. Carries the trial's
    /// external attributes, including the wall-clock `time` field.
    Startup {
        attributes: serde_json::Map<String, serde_json::Value>,
    },

    /// `Trial.DamageTakenChanged`
    DamageTakenChanged { participant: String },

    /// `Trial.WorkspaceInitialized`
    WorkspaceInitialized { participant: String, x: f64, y: f64 },

    /// `Trial.WorkspaceMoved`
    WorkspaceMoved { participant: String, x: f64, y: f64 },

    /// `Hybrid.CursorSpawned`
    CursorSpawned { participant: String, x: f64, y: f64 },

    /// `Hybrid.CursorMoved`
    CursorMoved { participant: String, x: f64, y: f64 },

    /// `Hybrid.CursorDespawned`
    CursorDespawned { participant: String },

    /// `Trial.BeginBlock`
    BeginBlock,

    /// `Trial.BeginWave`
    BeginWave { wave_number: u32 },

    /// `Trial.EnemySpawned`
    EnemySpawned {
        id: i64,
        x: f64,
        y: f64,
        r: f64,
        enemy_type: EnemyType,
    },

    /// `Trial.EnemyMoved`
    EnemyMoved { id: i64, x: f64, y: f64 },

    /// `Trial.EnemyHit`
    EnemyHit {
        id: i64,
        x: f64,
        y: f64,
        participant: String,
        enemy_type: EnemyType,
    },

    /// `Trial.EnemyCollide`
    EnemyCollide { id: i64 },

    /// `Input.RawTouchDown`
    RawTouchDown { id: i64, x: f64, y: f64 },

    /// `Input.RawTouchMove`
    RawTouchMove { id: i64, x: f64, y: f64 },

    /// `Input.RawTouchUp`
    RawTouchUp { id: i64 },

    /// Any identifier the analysis does not act on. The payload still had to
    /// parse as JSON.
    Other { identifier: String },
}

#[derive(Deserialize)]
struct ParticipantPayload {
    participant: String,
}

#[derive(Deserialize)]
struct ParticipantXyPayload {
    participant: String,
    x: f64,
    y: f64,
}

#[derive(Deserialize)]
struct BeginWavePayload {
    #[serde(rename = "waveNumber")]
    wave_number: u32,
}

#[derive(Deserialize)]
struct EnemySpawnPayload {
    id: i64,
    x: f64,
    y: f64,
    r: f64,
    #[serde(rename = "type")]
    enemy_type: EnemyType,
}

#[derive(Deserialize)]
struct EnemyIdXyPayload {
    id: i64,
    x: f64,
    y: f64,
}

#[derive(Deserialize)]
struct EnemyIdPayload {
    id: i64,
}

#[derive(Deserialize)]
struct EnemyHitPayload {
    id: i64,
    x: f64,
    y: f64,
    participant: String,
    #[serde(rename = "type")]
    enemy_type: EnemyType,
}

#[derive(Deserialize)]
struct TouchIdXyPayload {
    id: i64,
    x: f64,
    y: f64,
}

#[derive(Deserialize)]
struct TouchIdPayload {
    id: i64,
}

impl EventKind {
    /// Decode a payload for the given identifier, validating its schema.
    pub fn decode(identifier: &str, payload: &str) -> Result<Self, serde_json::Error> {
        let kind = match identifier {
            "System.Startup" => EventKind::Startup {
                attributes: serde_json::from_str(payload)?,
            },
            "Trial.DamageTakenChanged" => {
                let p: ParticipantPayload = serde_json::from_str(payload)?;
                EventKind::DamageTakenChanged {
                    participant: p.participant,
                }
            }
            "Trial.WorkspaceInitialized" => {
                let p: ParticipantXyPayload = serde_json::from_str(payload)?;
                EventKind::WorkspaceInitialized {
                    participant: p.participant,
                    x: p.x,
                    y: p.y,
                }
            }
            "Trial.WorkspaceMoved" => {
                let p: ParticipantXyPayload = serde_json::from_str(payload)?;
                EventKind::WorkspaceMoved {
                    participant: p.participant,
                    x: p.x,
                    y: p.y,
                }
            }
            "Hybrid.CursorSpawned" => {
                let p: ParticipantXyPayload = serde_json::from_str(payload)?;
                EventKind::CursorSpawned {
                    participant: p.participant,
                    x: p.x,
                    y: p.y,
                }
            }
            "Hybrid.CursorMoved" => {
                let p: ParticipantXyPayload = serde_json::from_str(payload)?;
                EventKind::CursorMoved {
                    participant: p.participant,
                    x: p.x,
                    y: p.y,
                }
            }
            "Hybrid.CursorDespawned" => {
                let p: ParticipantPayload = serde_json::from_str(payload)?;
                EventKind::CursorDespawned {
                    participant: p.participant,
                }
            }
            "Trial.BeginBlock" => {
                let _: serde_json::Value = serde_json::from_str(payload)?;
                EventKind::BeginBlock
            }
            "Trial.BeginWave" => {
                let p: BeginWavePayload = serde_json::from_str(payload)?;
                EventKind::BeginWave {
                    wave_number: p.wave_number,
                }
            }
            "Trial.EnemySpawned" => {
                let p: EnemySpawnPayload = serde_json::from_str(payload)?;
                EventKind::EnemySpawned {
                    id: p.id,
                    x: p.x,
                    y: p.y,
                    r: p.r,
                    enemy_type: p.enemy_type,
                }
            }
            "Trial.EnemyMoved" => {
                let p: EnemyIdXyPayload = serde_json::from_str(payload)?;
                EventKind::EnemyMoved {
                    id: p.id,
                    x: p.x,
                    y: p.y,
                }
            }
            "Trial.EnemyHit" => {
                let p: EnemyHitPayload = serde_json::from_str(payload)?;
                EventKind::EnemyHit {
                    id: p.id,
                    x: p.x,
                    y: p.y,
                    participant: p.participant,
                    enemy_type: p.enemy_type,
                }
            }
            "Trial.EnemyCollide" => {
                let p: EnemyIdPayload = serde_json::from_str(payload)?;
                EventKind::EnemyCollide { id: p.id }
            }
            "Input.RawTouchDown" => {
                let p: TouchIdXyPayload = serde_json::from_str(payload)?;
                EventKind::RawTouchDown {
                    id: p.id,
                    x: p.x,
                    y: p.y,
                }
            }
            "Input.RawTouchMove" => {
                let p: TouchIdXyPayload = serde_json::from_str(payload)?;
                EventKind::RawTouchMove {
                    id: p.id,
                    x: p.x,
                    y: p.y,
                }
            }
            "Input.RawTouchUp" => {
                let p: TouchIdPayload = serde_json::from_str(payload)?;
                EventKind::RawTouchUp { id: p.id }
            }
            other => {
                let _: serde_json::Value = serde_json::from_str(payload)?;
                EventKind::Other {
                    identifier: other.to_string(),
                }
            }
        };
        Ok(kind)
    }
}

/// Split a raw log line into `(timestamp, identifier, payload)` without
/// touching the payload JSON. The identifier comes back trimmed so the
/// ignore-set can be consulted before any JSON parsing happens.
pub fn split_line(line: &str) -> Result<(&str, &str, &str), String> {
    let (timestamp, rest) = line
        .split_once(',')
        .ok_or_else(|| "expected three comma-separated fields".to_string())?;
    let (identifier, payload) = rest
        .split_once(',')
        .ok_or_else(|| "expected an identifier and a JSON payload".to_string())?;
    Ok((timestamp.trim(), identifier.trim(), payload))
}
