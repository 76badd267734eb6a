//! The hub's event loop

use showbridge_core::{ExecutorNumber, MeasurementSample, RuntimeState};
use std::collections::BTreeMap;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use super::{
    ClientId, CommandSink, HubEvent, HubHandle, HubPhase, HubStatus, ShowSource,
};
use crate::{
    midi::{derive_value, MidiNoteEvent},
    osc::ExecutorFeedback,
    supervisor::{ProcessSupervisor, SupervisorEvent},
    web::{ClientCommand, ExecCommand, ServerEvent},
};

/// Upper bound on waiting for collaborators during shutdown
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

const INBOX_CAPACITY: usize = 1024;

/// The hub actor. Build with [`Hub::new`], then drive with [`Hub::run`].
pub struct Hub {
    phase: HubPhase,
    inbox: mpsc::Receiver<HubEvent>,
    inbox_tx: mpsc::WeakSender<HubEvent>,
    clients: BTreeMap<ClientId, mpsc::Sender<ServerEvent>>,
    state: RuntimeState,
    commands: Arc<dyn CommandSink>,
    show: Arc<dyn ShowSource>,
    supervisor: Option<Arc<ProcessSupervisor>>,
}

impl Hub {
    /// Create a hub and the handle used to reach it
    pub fn new(
        commands: Arc<dyn CommandSink>,
        show: Arc<dyn ShowSource>,
        supervisor: Option<Arc<ProcessSupervisor>>,
    ) -> (Self, HubHandle) {
        let (tx, inbox) = mpsc::channel(INBOX_CAPACITY);
        let hub = Self {
            phase: HubPhase::Idle,
            inbox,
            inbox_tx: tx.downgrade(),
            clients: BTreeMap::new(),
            state: RuntimeState::new(),
            commands,
            show,
            supervisor,
        };
        (hub, HubHandle::new(tx))
    }

    /// Create a hub and run it on the current runtime
    pub fn spawn(
        commands: Arc<dyn CommandSink>,
        show: Arc<dyn ShowSource>,
        supervisor: Option<Arc<ProcessSupervisor>>,
    ) -> (HubHandle, JoinHandle<()>) {
        let (hub, handle) = Self::new(commands, show, supervisor);
        (handle, tokio::spawn(hub.run()))
    }

    /// Process events until shut down or every handle is dropped
    pub async fn run(mut self) {
        self.phase = HubPhase::Listening;
        info!("Hub listening");

        while let Some(event) = self.inbox.recv().await {
            if self.handle(event).await.is_break() {
                break;
            }
        }

        if self.phase != HubPhase::Stopped {
            self.shutdown().await;
        }
    }

    async fn handle(&mut self, event: HubEvent) -> ControlFlow<()> {
        match event {
            HubEvent::ClientConnected { id, outbox } => self.on_connect(id, outbox),
            HubEvent::ClientDisconnected { id } => {
                if self.clients.remove(&id).is_some() {
                    info!(client = id, "Client disconnected");
                }
            }
            HubEvent::ClientMessage { id, command } => self.on_command(id, command).await,
            HubEvent::Osc(feedback) => self.on_feedback(feedback),
            HubEvent::Midi(note) => self.on_midi(note).await,
            HubEvent::Supervisor(event) => self.on_supervisor(event),
            HubEvent::ShowLoaded { requester, result } => match result {
                Ok(snapshot) => {
                    info!(
                        "Loaded show {:?} with {} executors",
                        snapshot.show_name,
                        snapshot.executors.len()
                    );
                    self.state.reconcile(&snapshot);
                    self.broadcast(ServerEvent::ShowSetup(snapshot));
                }
                Err(e) => {
                    warn!(client = requester, "Failed to fetch console data: {}", e);
                    self.send_to(requester, ServerEvent::error("Failed to fetch console data"));
                }
            },
            HubEvent::Status { reply } => {
                let _ = reply.send(HubStatus {
                    phase: self.phase,
                    clients: self.clients.len(),
                    executors: self.state.len(),
                });
            }
            HubEvent::Executors { reply } => {
                let _ = reply.send(self.state.clone());
            }
            HubEvent::Shutdown { done } => {
                self.shutdown().await;
                let _ = done.send(());
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    fn accepting(&self) -> bool {
        self.phase == HubPhase::Listening
    }

    fn on_connect(&mut self, id: ClientId, outbox: mpsc::Sender<ServerEvent>) {
        if !self.accepting() {
            // Dropping the outbox closes the client
            return;
        }
        info!(client = id, "Client connected");
        if deliver(id, &outbox, ServerEvent::connected()) {
            self.clients.insert(id, outbox);
        }
    }

    async fn on_command(&mut self, id: ClientId, command: ClientCommand) {
        match command {
            ClientCommand::ReloadExecutors => self.reload(id),
            ClientCommand::Exec(exec) => self.on_exec(id, exec).await,
        }
    }

    /// Scrape in the background; the result comes back as `ShowLoaded`
    fn reload(&self, requester: ClientId) {
        let Some(inbox) = self.inbox_tx.upgrade() else {
            return;
        };
        let show = self.show.clone();
        debug!(client = requester, "Reloading executors");
        tokio::spawn(async move {
            let result = show.fetch_data().await.map_err(|e| e.to_string());
            let _ = inbox.send(HubEvent::ShowLoaded { requester, result }).await;
        });
    }

    async fn on_exec(&mut self, id: ClientId, exec: ExecCommand) {
        let number = match exec.executor() {
            Ok(number) => number,
            Err(e) => {
                warn!(client = id, "Ignoring exec: {}", e);
                self.send_to(id, ServerEvent::error(e.to_string()));
                return;
            }
        };

        if let Err(e) = self.commands.send_executor_command(number, exec.level()).await {
            error!(client = id, executor = number, "Error sending OSC message: {}", e);
            self.send_to(id, ServerEvent::error("Failed to send OSC message"));
        }
    }

    fn on_feedback(&mut self, feedback: ExecutorFeedback) {
        if !self.accepting() {
            return;
        }
        trace!(executor = feedback.number, value = feedback.value, "OSC feedback");
        self.set_and_broadcast(feedback.number, feedback.value);
    }

    async fn on_midi(&mut self, note: MidiNoteEvent) {
        if !self.accepting() {
            return;
        }
        let current = *self.state.entry(note.executor);
        let Some(value) = derive_value(current.kind, current.value, note.velocity) else {
            trace!(executor = note.executor, "Ignoring key release on toggle");
            return;
        };

        if let Err(e) = self.commands.send_executor_command(note.executor, value).await {
            warn!(executor = note.executor, "Failed to forward MIDI command: {}", e);
        }
        self.set_and_broadcast(note.executor, value);
    }

    fn on_supervisor(&mut self, event: SupervisorEvent) {
        match event {
            SupervisorEvent::Line(line) => {
                if !self.accepting() {
                    return;
                }
                match MeasurementSample::from_value(line) {
                    Ok(sample) => self.broadcast(ServerEvent::Spl(sample)),
                    Err(e) => warn!("Dropping malformed measurement sample: {}", e),
                }
            }
            SupervisorEvent::Spawned { pid } => debug!("Measurement process running, pid {:?}", pid),
            SupervisorEvent::Exited { code } => debug!("Measurement process exited, code {:?}", code),
            SupervisorEvent::SpawnFailed { error } => {
                debug!("Measurement process failed to start: {}", error)
            }
            SupervisorEvent::BackoffStarted { duration } => {
                warn!("Measurement process paused for {:?}", duration)
            }
        }
    }

    fn set_and_broadcast(&mut self, number: ExecutorNumber, value: f32) {
        self.state.set_value(number, value);
        self.broadcast(ServerEvent::Val { number, value });
    }

    /// Send to every client; clients whose outbox is closed are dropped
    fn broadcast(&mut self, event: ServerEvent) {
        if !self.accepting() {
            return;
        }
        self.clients
            .retain(|&id, outbox| deliver(id, outbox, event.clone()));
    }

    fn send_to(&mut self, id: ClientId, event: ServerEvent) {
        let Some(outbox) = self.clients.get(&id) else {
            return;
        };
        if !deliver(id, outbox, event) {
            self.clients.remove(&id);
        }
    }

    async fn shutdown(&mut self) {
        if self.phase >= HubPhase::ShuttingDown {
            return;
        }
        self.phase = HubPhase::ShuttingDown;
        info!("Hub shutting down, closing {} clients", self.clients.len());
        self.clients.clear();
        // Senders parked on a full inbox fail now instead of waiting out the timeout
        self.inbox.close();

        let supervisor = self.supervisor.clone();
        let commands = self.commands.clone();
        let stop_supervisor = async move {
            if let Some(supervisor) = supervisor {
                supervisor.stop().await;
            }
        };
        let stop_commands = async move { commands.stop().await };

        if tokio::time::timeout(
            SHUTDOWN_TIMEOUT,
            futures::future::join(stop_supervisor, stop_commands),
        )
        .await
        .is_err()
        {
            warn!("Collaborators did not stop within {:?}", SHUTDOWN_TIMEOUT);
        }

        self.phase = HubPhase::Stopped;
        info!("Hub stopped");
    }
}

/// Queue an event for one client. Returns false when the client is gone.
fn deliver(id: ClientId, outbox: &mpsc::Sender<ServerEvent>, event: ServerEvent) -> bool {
    match outbox.try_send(event) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => {
            warn!(client = id, "Client outbox full, dropping event");
            true
        }
        Err(TrySendError::Closed(_)) => {
            debug!(client = id, "Client gone, removing");
            false
        }
    }
}
