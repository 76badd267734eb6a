//! Showbridge Core - Domain Model and Pure Logic
//!
//! This crate contains the core domain model for Showbridge, including:
//! - Executor records and the scraped show snapshot
//! - Executor runtime state owned by the hub
//! - Executor index arithmetic (console slot layout vs. logical numbers)
//! - Measurement samples emitted by the sound level meter process
//! - Bridge and logging configuration

#![warn(missing_docs)]

use thiserror::Error;

pub mod config;
pub mod executor;
pub mod logging;
pub mod mapping;
pub mod measurement;
pub mod runtime;

// --- Re-exports grouped by category ---

// Configuration
pub use config::{
    BridgeConfig, ConsoleConfig, MeasurementConfig, MidiConfig, OscConfig, ServerConfig,
};
pub use logging::LogConfig;

// Executors & State
pub use executor::{Executor, ExecutorNumber, ExecutorType, ShowSnapshot};
pub use runtime::{ExecutorState, RuntimeState};

// Index arithmetic
pub use mapping::{to_logical, to_physical};

// Measurements
pub use measurement::MeasurementSample;

/// Executors above this number are always driven as faders.
pub const FADER_THRESHOLD: ExecutorNumber = 40;

/// Core error types
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration value out of range or missing
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Filesystem error (log directory handling)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
