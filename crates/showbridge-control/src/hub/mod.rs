//! Realtime hub
//!
//! A single-writer actor owning the executor runtime state and the set of
//! connected clients. Every source (OSC, MIDI, the measurement process,
//! clients) posts into one inbox, and events are applied one at a time.

mod actor;
mod events;

pub use actor::{Hub, SHUTDOWN_TIMEOUT};
pub use events::{ClientId, HubEvent};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use showbridge_core::{ExecutorNumber, RuntimeState, ShowSnapshot};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

use crate::{
    console::ConsoleScraper,
    error::ControlError,
    osc::OscTransport,
    web::{ClientCommand, ServerEvent},
    Result,
};

/// Where executor commands go
#[async_trait]
pub trait CommandSink: Send + Sync {
    /// Set a logical executor to `value`
    async fn send_executor_command(&self, number: ExecutorNumber, value: f32) -> Result<()>;

    /// Release resources. Idempotent.
    async fn stop(&self);
}

#[async_trait]
impl CommandSink for OscTransport {
    async fn send_executor_command(&self, number: ExecutorNumber, value: f32) -> Result<()> {
        OscTransport::send_executor_command(self, number, value).await
    }

    async fn stop(&self) {
        OscTransport::stop(self).await
    }
}

/// Where show metadata comes from
#[async_trait]
pub trait ShowSource: Send + Sync {
    /// Fetch a complete snapshot
    async fn fetch_data(&self) -> Result<ShowSnapshot>;
}

#[async_trait]
impl ShowSource for ConsoleScraper {
    async fn fetch_data(&self) -> Result<ShowSnapshot> {
        ConsoleScraper::fetch_data(self).await
    }
}

/// Hub lifecycle. Moves forward only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HubPhase {
    Idle,
    Listening,
    ShuttingDown,
    Stopped,
}

/// Snapshot of the hub's counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubStatus {
    pub phase: HubPhase,
    pub clients: usize,
    pub executors: usize,
}

/// Cloneable handle for talking to a running hub
#[derive(Debug, Clone)]
pub struct HubHandle {
    tx: mpsc::Sender<HubEvent>,
    next_client: Arc<AtomicU64>,
}

impl HubHandle {
    fn new(tx: mpsc::Sender<HubEvent>) -> Self {
        Self {
            tx,
            next_client: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Raw inbox sender, for event sources
    pub fn sender(&self) -> mpsc::Sender<HubEvent> {
        self.tx.clone()
    }

    /// Register a client; events for it are delivered to `outbox`
    pub async fn connect(&self, outbox: mpsc::Sender<ServerEvent>) -> Result<ClientId> {
        let id = self.next_client.fetch_add(1, Ordering::Relaxed);
        self.post(HubEvent::ClientConnected { id, outbox }).await?;
        Ok(id)
    }

    /// Remove a client
    pub async fn disconnect(&self, id: ClientId) {
        // Nothing to clean up if the hub is gone
        let _ = self.post(HubEvent::ClientDisconnected { id }).await;
    }

    /// Deliver a command from a client
    pub async fn command(&self, id: ClientId, command: ClientCommand) -> Result<()> {
        self.post(HubEvent::ClientMessage { id, command }).await
    }

    /// Current phase and counters
    pub async fn status(&self) -> Result<HubStatus> {
        let (reply, rx) = oneshot::channel();
        self.post(HubEvent::Status { reply }).await?;
        rx.await.map_err(|_| ControlError::ShuttingDown)
    }

    /// Copy of the runtime state
    pub async fn executors(&self) -> Result<RuntimeState> {
        let (reply, rx) = oneshot::channel();
        self.post(HubEvent::Executors { reply }).await?;
        rx.await.map_err(|_| ControlError::ShuttingDown)
    }

    /// Shut the hub down and wait until it has stopped.
    ///
    /// Safe to call more than once and from several tasks.
    pub async fn stop(&self) {
        let (done, rx) = oneshot::channel();
        if self.post(HubEvent::Shutdown { done }).await.is_ok() {
            // A dropped sender means another stop already finished
            let _ = rx.await;
        }
    }

    /// True once the hub has exited
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    async fn post(&self, event: HubEvent) -> Result<()> {
        self.tx
            .send(event)
            .await
            .map_err(|_| ControlError::ShuttingDown)
    }
}
