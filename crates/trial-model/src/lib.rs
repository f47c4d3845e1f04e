//! Trialscope Trial Model
//!
//! Data model for recorded trials:
//! - Typed event stream decoding (`event`)
//! - Trial files, attributes, and the cached event sequence (`trial`)
//! - Wave metadata consumed from the stimulus script (`wave`)

pub mod event;
pub mod trial;
pub mod wave;

pub use event::{EnemyType, EventKind, TimestampMs, TrialEvent};
pub use trial::{EventFilter, Trial, TrialAttributes};
pub use wave::{WaveContext, WaveScript};
