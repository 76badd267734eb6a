//! Showbridge - MagicQ console bridge
//!
//! Relays executor state between a MagicQ lighting console (OSC and its web
//! pages), a MIDI key controller, a sound level meter process and any number
//! of WebSocket clients.

#![warn(missing_docs)]

mod logging_setup;

use anyhow::{Context, Result};
use clap::Parser;
#[cfg(feature = "midi")]
use showbridge_control::{HubHandle, MidiInputAdapter};
use showbridge_control::{ConsoleScraper, Hub, OscTransport, ProcessSupervisor, WebServer};
#[cfg(feature = "midi")]
use showbridge_core::MidiConfig;
use showbridge_core::{BridgeConfig, LogConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Bridge between a MagicQ console, MIDI hardware and web clients.
#[derive(Parser, Debug)]
#[command(name = "showbridge", version)]
#[command(about = "MagicQ console bridge for web clients, MIDI keys and a sound level meter")]
struct Args {
    /// Client server bind address
    #[arg(long, env = "WS_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Client server port
    #[arg(long, env = "WS_PORT", default_value_t = 3001)]
    port: u16,

    /// Console host, used for HTTP and OSC
    #[arg(long, env = "MAGICQ_IP", default_value = "localhost")]
    console_host: String,

    /// Port of the console's web server
    #[arg(long, env = "MAGICQ_HTTP_PORT", default_value_t = 8080)]
    console_http_port: u16,

    /// Full console web server URL, overrides host and HTTP port
    #[arg(long, env = "MAGICQ_URL")]
    console_url: Option<String>,

    /// Local port the console sends OSC feedback to
    #[arg(long, env = "MAGICQ_OSC_RECEIVE_PORT", default_value_t = 8000)]
    osc_receive_port: u16,

    /// Console port OSC commands are sent to
    #[arg(long, env = "MAGICQ_OSC_SEND_PORT", default_value_t = 9000)]
    osc_send_port: u16,

    /// Substring of the MIDI input port name
    #[arg(long, env = "MIDI_INPUT", default_value = "Arduino Leonardo")]
    midi_input: String,

    /// Do not open a MIDI input
    #[arg(long, env = "MIDI_DISABLED")]
    no_midi: bool,

    /// Sound level measurement program to supervise
    #[arg(long, env = "MEASUREMENT_COMMAND")]
    measurement_command: Option<String>,

    /// Arguments for the measurement program, space separated
    #[arg(
        long,
        env = "MEASUREMENT_ARGS",
        value_delimiter = ' ',
        allow_hyphen_values = true
    )]
    measurement_args: Vec<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Directory for log files
    #[arg(long, env = "LOG_DIR", default_value = "logs")]
    log_dir: PathBuf,

    /// Also write logs to a daily file in the log directory
    #[arg(long, env = "LOG_FILE")]
    log_file: bool,
}

impl Args {
    fn into_config(self) -> BridgeConfig {
        let mut config = BridgeConfig::default()
            .with_server(self.host, self.port)
            .with_console_host(self.console_host)
            .with_osc_ports(self.osc_receive_port, self.osc_send_port);

        config.console.http_port = self.console_http_port;
        config.console.base_url = self.console_url.filter(|url| !url.trim().is_empty());
        config.midi.input_name = self.midi_input;
        if self.no_midi {
            config = config.without_midi();
        }
        if let Some(command) = self.measurement_command {
            let args = self
                .measurement_args
                .into_iter()
                .filter(|arg| !arg.is_empty())
                .collect();
            config = config.with_measurement(command, args);
        }

        let mut log = LogConfig::default().with_level(self.log_level);
        if self.log_file {
            log = log.with_file_output(self.log_dir);
        } else {
            log.log_dir = self.log_dir;
        }
        config.log = log;
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();
    let config = Args::parse().into_config();
    config.validate().context("Invalid configuration")?;

    let _log_guard = logging_setup::init(&config.log)?;

    info!("==========================================");
    info!("===      Showbridge Session Started    ===");
    info!("==========================================");

    run(config).await
}

async fn run(config: BridgeConfig) -> Result<()> {
    let osc = Arc::new(OscTransport::new(
        config.console.host.clone(),
        &config.osc,
    ));
    let scraper = Arc::new(
        ConsoleScraper::new(&config.console).context("Failed to create console HTTP client")?,
    );
    info!("Console web server at {}", scraper.base_url());

    let supervisor = config
        .measurement
        .command
        .as_ref()
        .map(|_| Arc::new(ProcessSupervisor::default()));

    let (hub, hub_task) = Hub::spawn(osc.clone(), scraper, supervisor.clone());

    osc.start(hub.sender())
        .await
        .context("Failed to start OSC transport")?;

    match (&supervisor, &config.measurement.command) {
        (Some(supervisor), Some(command)) => {
            info!("Supervising measurement process {}", command);
            supervisor.start(command.clone(), config.measurement.args.clone(), hub.sender());
        }
        _ => info!("No measurement command configured"),
    }

    #[cfg(feature = "midi")]
    let midi = connect_midi(&config.midi, &hub);

    let server = WebServer::bind(&config.server)
        .await
        .context("Failed to start client server")?;

    let stopping = hub.clone();
    let served = server
        .run(hub.clone(), async move {
            shutdown_signal().await;
            info!("Shutdown requested");
            stopping.stop().await;
        })
        .await;

    // Covers the server failing on its own; a no-op after a signal
    hub.stop().await;
    if let Err(e) = hub_task.await {
        warn!("Hub task ended abnormally: {}", e);
    }

    #[cfg(feature = "midi")]
    if let Some(midi) = midi {
        midi.close();
    }

    served.context("Client server failed")?;
    info!("Showbridge stopped");
    Ok(())
}

#[cfg(feature = "midi")]
fn connect_midi(config: &MidiConfig, hub: &HubHandle) -> Option<MidiInputAdapter> {
    if !config.enabled {
        info!("MIDI input disabled");
        return None;
    }
    match MidiInputAdapter::connect(&config.input_name, hub.sender()) {
        Ok(adapter) => Some(adapter),
        Err(e) => {
            warn!("MIDI input unavailable: {}", e);
            None
        }
    }
}

/// Resolves on the first SIGINT, SIGTERM or SIGQUIT
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    {
        use tokio::signal::unix::SignalKind;
        tokio::select! {
            _ = ctrl_c => {}
            _ = unix_signal(SignalKind::terminate(), "SIGTERM") => {}
            _ = unix_signal(SignalKind::quit(), "SIGQUIT") => {}
        }
    }

    #[cfg(not(unix))]
    ctrl_c.await;
}

#[cfg(unix)]
async fn unix_signal(kind: tokio::signal::unix::SignalKind, name: &str) {
    match tokio::signal::unix::signal(kind) {
        Ok(mut stream) => {
            stream.recv().await;
            info!("Received {}", name);
        }
        Err(e) => {
            warn!("Failed to listen for {}: {}", name, e);
            std::future::pending::<()>().await;
        }
    }
}
