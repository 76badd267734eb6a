//! Error types for the control system
use thiserror::Error;

/// Control system errors
#[derive(Error, Debug)]
pub enum ControlError {
    /// MIDI connection error
    #[error("MIDI connection error: {0}")]
    #[cfg(feature = "midi")]
    MidiConnectionError(#[from] midir::ConnectError<midir::MidiInput>),

    /// MIDI initialization error
    #[error("MIDI init error: {0}")]
    #[cfg(feature = "midi")]
    MidiInitError(#[from] midir::InitError),

    /// OSC error
    #[error("OSC error: {0}")]
    OscError(String),

    /// OSC packet encoding/decoding error
    #[error("OSC codec error: {0}")]
    OscCodecError(#[from] rosc::OscError),

    /// Console HTTP error
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Console page could not be interpreted
    #[error("Scrape error: {0}")]
    ScrapeError(String),

    /// Client-facing server error
    #[error("Server error: {0}")]
    ServerError(String),

    /// I/O error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Invalid parameter value
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Invalid message format
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// The component is shutting down and refuses new work
    #[error("Shutting down")]
    ShuttingDown,
}

/// Result type for control operations
pub type Result<T> = std::result::Result<T, ControlError>;
