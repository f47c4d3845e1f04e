//! Trialscope Replay Core
//!
//! Stateful replay of a trial's event stream into live entity state, plus
//! the derived-metrics computation that turns that state into CSV rows:
//! - Live workspaces, cursors, and enemies (`entities`)
//! - Participant identity recovery (`identity`)
//! - Workspace membership classification (`classify`)
//! - Two-pass touch-contact coding (`touch`)
//! - Typed output rows (`rows`) and the per-trial replay driver (`replay`)

pub mod classify;
pub mod entities;
pub mod identity;
pub mod replay;
pub mod rows;
pub mod touch;

pub use replay::{replay_trial, OutputMode, RunContext};
