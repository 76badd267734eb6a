//! Messages delivered to the hub's inbox

use showbridge_core::{RuntimeState, ShowSnapshot};
use tokio::sync::{mpsc, oneshot};

use super::HubStatus;
use crate::{
    midi::MidiNoteEvent,
    osc::ExecutorFeedback,
    supervisor::SupervisorEvent,
    web::{ClientCommand, ServerEvent},
};

/// Identifies one connected client
pub type ClientId = u64;

/// Everything the hub reacts to, applied one at a time in arrival order
#[derive(Debug)]
pub enum HubEvent {
    /// A client joined; events for it go to `outbox`
    ClientConnected {
        id: ClientId,
        outbox: mpsc::Sender<ServerEvent>,
    },
    /// A client went away
    ClientDisconnected { id: ClientId },
    /// A decoded command from a client
    ClientMessage { id: ClientId, command: ClientCommand },
    /// Executor value reported by the console
    Osc(ExecutorFeedback),
    /// Key event from the hardware controller
    Midi(MidiNoteEvent),
    /// Measurement process output or lifecycle
    Supervisor(SupervisorEvent),
    /// A reload requested by `requester` finished
    ShowLoaded {
        requester: ClientId,
        result: Result<ShowSnapshot, String>,
    },
    /// Report phase and counters
    Status { reply: oneshot::Sender<HubStatus> },
    /// Report the runtime state
    Executors {
        reply: oneshot::Sender<RuntimeState>,
    },
    /// Shut down; `done` fires once stopped
    Shutdown { done: oneshot::Sender<()> },
}

impl From<ExecutorFeedback> for HubEvent {
    fn from(feedback: ExecutorFeedback) -> Self {
        HubEvent::Osc(feedback)
    }
}

impl From<MidiNoteEvent> for HubEvent {
    fn from(event: MidiNoteEvent) -> Self {
        HubEvent::Midi(event)
    }
}

impl From<SupervisorEvent> for HubEvent {
    fn from(event: SupervisorEvent) -> Self {
        HubEvent::Supervisor(event)
    }
}
