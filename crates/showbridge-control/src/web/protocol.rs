//! Client wire protocol
//!
//! Server events are sent as `{"type": ..., "data": {...}}`. Client commands
//! carry their fields next to `type`.

use serde::{Deserialize, Serialize};
use showbridge_core::{to_logical, ExecutorNumber, MeasurementSample, ShowSnapshot};

use crate::{error::ControlError, osc::parse_exec_address, Result};

/// Event pushed from the hub to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Sent once right after a client connects
    Connection { status: String },
    /// Freshly scraped show metadata
    ShowSetup(ShowSnapshot),
    /// An executor value changed
    Val { number: ExecutorNumber, value: f32 },
    /// One sound level sample
    Spl(MeasurementSample),
    /// A request from this client failed
    Error { error: String },
}

impl ServerEvent {
    /// Connection acknowledgement
    pub fn connected() -> Self {
        ServerEvent::Connection {
            status: "connected".to_string(),
        }
    }

    /// Error event with the given message
    pub fn error(message: impl Into<String>) -> Self {
        ServerEvent::Error {
            error: message.into(),
        }
    }

    /// Encode as a JSON text frame
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Command sent by a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientCommand {
    /// Scrape the console and broadcast the show setup
    ReloadExecutors,
    /// Set an executor value on the console
    Exec(ExecCommand),
}

impl ClientCommand {
    /// Decode a text frame
    pub fn decode(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| ControlError::InvalidMessage(format!("Undecodable client message: {}", e)))
    }
}

/// Target and value of an `exec` command.
///
/// The executor is given either as a logical `number` or as a console
/// `address` (`/exec/1/{physical}`); `number` wins when both are present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecCommand {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<ExecutorNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Requested level as sent; read it through [`ExecCommand::level`]
    pub value: f64,
}

impl ExecCommand {
    /// Logical executor this command targets
    pub fn executor(&self) -> Result<ExecutorNumber> {
        match (&self.number, &self.address) {
            (Some(number), _) => Ok(*number),
            (None, Some(address)) => parse_exec_address(address).map(to_logical),
            (None, None) => Err(ControlError::InvalidMessage(
                "exec needs a number or an address".to_string(),
            )),
        }
    }

    /// Requested level clamped to `[0, 1]`
    pub fn level(&self) -> f32 {
        self.value.clamp(0.0, 1.0) as f32
    }
}
