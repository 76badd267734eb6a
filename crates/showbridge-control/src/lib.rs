//! ShowBridge Control - console, hardware and client I/O
//!
//! This crate connects a lighting console to web clients and hardware:
//! - **OSC**: executor commands and feedback over UDP
//! - **MIDI**: hardware key input mapped to executors
//! - **Console**: show name and executor table scraped from the console's web pages
//! - **Supervisor**: keeps the sound level measurement process running
//! - **Hub**: the single-writer actor tying it all together
//! - **Web**: WebSocket push channel and a small status API
//!
//! ## Feature Flags
//!
//! - `midi`: Enable hardware MIDI input (requires `midir`)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use showbridge_control::{ConsoleScraper, Hub, OscTransport};
//! use showbridge_core::BridgeConfig;
//! use std::sync::Arc;
//!
//! # async fn example() -> showbridge_control::Result<()> {
//! let config = BridgeConfig::default();
//! let osc = Arc::new(OscTransport::new(&config.console.host, &config.osc));
//! let scraper = Arc::new(ConsoleScraper::new(&config.console)?);
//!
//! let (hub, _task) = Hub::spawn(osc.clone(), scraper, None);
//! osc.start(hub.sender()).await?;
//! # Ok(())
//! # }
//! ```

#![allow(missing_docs)]

/// Error types
pub mod error;

/// Console web page scraping
pub mod console;
/// Realtime hub
pub mod hub;
/// MIDI input and note mapping
pub mod midi;
/// OSC link to the console
pub mod osc;
/// Measurement process supervision
pub mod supervisor;
/// WebSocket and HTTP API
pub mod web;

// Re-exports
pub use console::ConsoleScraper;
pub use error::{ControlError, Result};
pub use hub::{ClientId, CommandSink, Hub, HubEvent, HubHandle, HubPhase, HubStatus, ShowSource};
#[cfg(feature = "midi")]
pub use midi::MidiInputAdapter;
pub use midi::{MidiMessage, MidiNoteEvent};
pub use osc::{ExecutorFeedback, OscTransport};
pub use supervisor::{ProcessSupervisor, RestartPolicy, SupervisorEvent};
pub use web::{ClientCommand, ServerEvent, WebServer};
