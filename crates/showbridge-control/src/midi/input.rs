//! MIDI input adapter backed by midir

use midir::{MidiInput, MidiInputConnection};
use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use super::{MidiMessage, MidiNoteEvent};
use crate::Result;

/// Client name registered with the system MIDI service
const CLIENT_NAME: &str = "showbridge";

/// Listens to one hardware MIDI input and forwards key events
pub struct MidiInputAdapter {
    port_name: Option<String>,
    connection: Mutex<Option<MidiInputConnection<()>>>,
}

impl MidiInputAdapter {
    /// Open the first input port whose name contains `input_name`.
    ///
    /// When no port matches, the adapter is returned inactive. Key events are
    /// delivered to `events` without blocking the driver thread; events are
    /// dropped with a warning when the receiver is full.
    pub fn connect<E>(input_name: &str, events: mpsc::Sender<E>) -> Result<Self>
    where
        E: From<MidiNoteEvent> + Send + 'static,
    {
        let midi_in = MidiInput::new(CLIENT_NAME)?;

        let mut selected = None;
        info!("Available MIDI inputs:");
        for (i, port) in midi_in.ports().into_iter().enumerate() {
            let name = midi_in
                .port_name(&port)
                .unwrap_or_else(|_| "<unknown>".to_string());
            info!("  [{}] {}", i, name);
            if selected.is_none() && name.contains(input_name) {
                selected = Some((port, name));
            }
        }

        let Some((port, port_name)) = selected else {
            warn!("MIDI input \"{}\" not found, MIDI disabled", input_name);
            return Ok(Self::inactive());
        };

        let connection = midi_in.connect(
            &port,
            "showbridge-input",
            move |_timestamp, bytes, _| {
                let Some(message) = MidiMessage::from_bytes(bytes) else {
                    trace!("Ignoring MIDI bytes {:02X?}", bytes);
                    return;
                };
                let Some(event) = MidiNoteEvent::from_message(&message) else {
                    trace!("Unhandled MIDI message {:?}", message);
                    return;
                };
                debug!(executor = event.executor, velocity = event.velocity, "MIDI key");
                // Driver callback: must not block
                if let Err(e) = events.try_send(event.into()) {
                    warn!("Failed to forward MIDI event: {}", e);
                }
            },
            (),
        )?;

        info!("Connected to MIDI input: {}", port_name);
        Ok(Self {
            port_name: Some(port_name),
            connection: Mutex::new(Some(connection)),
        })
    }

    /// An adapter with no open port
    pub fn inactive() -> Self {
        Self {
            port_name: None,
            connection: Mutex::new(None),
        }
    }

    /// Name of the connected port
    pub fn port_name(&self) -> Option<&str> {
        self.port_name.as_deref()
    }

    /// True while a port is open
    pub fn is_connected(&self) -> bool {
        self.connection
            .lock()
            .map(|connection| connection.is_some())
            .unwrap_or(false)
    }

    /// Close the port. Idempotent.
    pub fn close(&self) {
        let connection = match self.connection.lock() {
            Ok(mut connection) => connection.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(connection) = connection {
            connection.close();
            info!("MIDI input closed");
        }
    }
}

impl Drop for MidiInputAdapter {
    fn drop(&mut self) {
        self.close();
    }
}
