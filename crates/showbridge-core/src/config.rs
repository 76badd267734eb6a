//! Bridge configuration
//!
//! All settings have working defaults for a console on the same machine.
//! The binary overlays environment variables and CLI flags on top.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{logging::LogConfig, CoreError, Result};

/// Client-facing WebSocket/HTTP server settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,
    /// Bind port
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
        }
    }
}

/// Lighting console web server settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// Console host, also the OSC destination
    pub host: String,
    /// Port of the console's embedded web server
    pub http_port: u16,
    /// Overrides `host`/`http_port` when set
    #[serde(default)]
    pub base_url: Option<String>,
    /// Prefixes stripped from the reported show path, tried in order
    #[serde(default = "default_show_path_markers")]
    pub show_path_markers: Vec<String>,
}

fn default_show_path_markers() -> Vec<String> {
    // Desktop installs keep shows under MagicQ/show/, Linux consoles under the home directory
    vec!["MagicQ/show/".to_string(), "/home/".to_string()]
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            http_port: 8080,
            base_url: None,
            show_path_markers: default_show_path_markers(),
        }
    }
}

impl ConsoleConfig {
    /// Base URL of the console's embedded web server, without trailing slash
    pub fn base_url(&self) -> String {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://{}:{}", self.host, self.http_port),
        }
    }
}

/// OSC link to the console
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OscConfig {
    /// Local port the console sends feedback to
    pub receive_port: u16,
    /// Console port we send commands to
    pub send_port: u16,
    /// Interval between `/feedback/exec` requests
    #[serde(with = "duration_secs")]
    pub feedback_interval: Duration,
}

impl Default for OscConfig {
    fn default() -> Self {
        Self {
            receive_port: 8000,
            send_port: 9000,
            feedback_interval: Duration::from_secs(60),
        }
    }
}

/// Hardware MIDI input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MidiConfig {
    /// Open a MIDI input at startup
    pub enabled: bool,
    /// Substring matched against input port names
    pub input_name: String,
}

impl Default for MidiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            input_name: "Arduino Leonardo".to_string(),
        }
    }
}

/// Measurement process to supervise
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasurementConfig {
    /// Program to run; the supervisor stays idle when unset
    pub command: Option<String>,
    /// Arguments passed to `command`
    #[serde(default)]
    pub args: Vec<String>,
}

/// Complete bridge configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Client-facing server
    #[serde(default)]
    pub server: ServerConfig,
    /// Console web server
    #[serde(default)]
    pub console: ConsoleConfig,
    /// Console OSC link
    #[serde(default)]
    pub osc: OscConfig,
    /// Hardware MIDI input
    #[serde(default)]
    pub midi: MidiConfig,
    /// Measurement process
    #[serde(default)]
    pub measurement: MeasurementConfig,
    /// Logging
    #[serde(default)]
    pub log: LogConfig,
}

impl BridgeConfig {
    /// Set the client-facing server address
    pub fn with_server(mut self, host: impl Into<String>, port: u16) -> Self {
        self.server.host = host.into();
        self.server.port = port;
        self
    }

    /// Set the console host used for HTTP and OSC
    pub fn with_console_host(mut self, host: impl Into<String>) -> Self {
        self.console.host = host.into();
        self
    }

    /// Set the OSC receive and send ports
    pub fn with_osc_ports(mut self, receive_port: u16, send_port: u16) -> Self {
        self.osc.receive_port = receive_port;
        self.osc.send_port = send_port;
        self
    }

    /// Set the measurement command and its arguments
    pub fn with_measurement(mut self, command: impl Into<String>, args: Vec<String>) -> Self {
        self.measurement.command = Some(command.into());
        self.measurement.args = args;
        self
    }

    /// Disable the MIDI input
    pub fn without_midi(mut self) -> Self {
        self.midi.enabled = false;
        self
    }

    /// Check values that would only fail later at bind/send time
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(CoreError::InvalidConfig(
                "client server port must not be 0".to_string(),
            ));
        }
        if self.osc.send_port == 0 {
            return Err(CoreError::InvalidConfig(
                "OSC send port must not be 0".to_string(),
            ));
        }
        if self.osc.feedback_interval.is_zero() {
            return Err(CoreError::InvalidConfig(
                "OSC feedback interval must be positive".to_string(),
            ));
        }
        if self.midi.enabled && self.midi.input_name.trim().is_empty() {
            return Err(CoreError::InvalidConfig(
                "MIDI input name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
