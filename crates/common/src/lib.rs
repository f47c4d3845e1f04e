//! Trialscope Common Utilities
//!
//! Shared infrastructure for all trialscope crates:
//! - Error types and result aliases
//! - Screen geometry and unit conversion
//! - Tracing/logging initialization
//! - Configuration loading

pub mod config;
pub mod error;
pub mod logging;
pub mod screen;

pub use config::*;
pub use error::*;
pub use screen::*;
