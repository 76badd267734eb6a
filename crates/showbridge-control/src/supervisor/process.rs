//! Child process supervision

use std::process::{ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::process::{Child, ChildStderr, Command};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::lines::{parse_line, LineBuffer};
use super::restart::{RestartDecision, RestartPolicy, RestartTracker};

/// Time a child gets to exit after SIGTERM before it is killed
pub const TERMINATE_GRACE: Duration = Duration::from_secs(2);

const READ_CHUNK_SIZE: usize = 4096;

/// Lifecycle and output of the supervised process
#[derive(Debug, Clone, PartialEq)]
pub enum SupervisorEvent {
    /// The process was started
    Spawned { pid: Option<u32> },
    /// One parsed JSON line from stdout
    Line(serde_json::Value),
    /// The process exited on its own
    Exited { code: Option<i32> },
    /// The process could not be started
    SpawnFailed { error: String },
    /// Too many restarts; nothing is spawned for `duration`
    BackoffStarted { duration: Duration },
}

/// Keeps one line-oriented JSON process alive
pub struct ProcessSupervisor {
    policy: RestartPolicy,
    started: AtomicBool,
    shutdown: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Default for ProcessSupervisor {
    fn default() -> Self {
        Self::new(RestartPolicy::default())
    }
}

impl ProcessSupervisor {
    pub fn new(policy: RestartPolicy) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            policy,
            started: AtomicBool::new(false),
            shutdown,
            task: Mutex::new(None),
        }
    }

    /// Begin spawning and supervising `command`.
    ///
    /// Only the first call has an effect, and none after [`stop`](Self::stop).
    pub fn start<E>(&self, command: impl Into<String>, args: Vec<String>, events: mpsc::Sender<E>)
    where
        E: From<SupervisorEvent> + Send + 'static,
    {
        if *self.shutdown.borrow() {
            warn!("Supervisor already stopped, not starting");
            return;
        }
        if self.started.swap(true, Ordering::SeqCst) {
            debug!("Supervisor already started");
            return;
        }

        let supervise = Supervise {
            command: command.into(),
            args,
            tracker: RestartTracker::new(self.policy),
            shutdown: self.shutdown.subscribe(),
            events,
        };
        let handle = tokio::spawn(supervise.run());
        *self.lock_task() = Some(handle);
    }

    /// Stop supervising for good. Idempotent.
    ///
    /// The running child gets SIGTERM and is killed after
    /// [`TERMINATE_GRACE`]. No restart is scheduled afterwards.
    pub async fn stop(&self) {
        self.shutdown.send_replace(true);
        let task = self.lock_task().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!("Supervisor task ended abnormally: {}", e);
            }
            info!("Process supervisor stopped");
        }
    }

    /// True once `stop` has been called
    pub fn is_stopped(&self) -> bool {
        *self.shutdown.borrow()
    }

    fn lock_task(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

enum ChildOutcome {
    Exited(ExitStatus),
    WaitFailed(std::io::Error),
    Stopped,
}

struct Supervise<E> {
    command: String,
    args: Vec<String>,
    tracker: RestartTracker,
    shutdown: watch::Receiver<bool>,
    events: mpsc::Sender<E>,
}

impl<E> Supervise<E>
where
    E: From<SupervisorEvent> + Send + 'static,
{
    async fn run(mut self) {
        loop {
            if *self.shutdown.borrow() {
                break;
            }

            match self.spawn() {
                Ok(child) => {
                    info!("Started {} (pid {:?})", self.command, child.id());
                    self.emit(SupervisorEvent::Spawned { pid: child.id() }).await;
                    match self.watch_child(child).await {
                        ChildOutcome::Stopped => break,
                        ChildOutcome::Exited(status) => {
                            warn!("{} exited with {}", self.command, status);
                            self.emit(SupervisorEvent::Exited {
                                code: status.code(),
                            })
                            .await;
                        }
                        ChildOutcome::WaitFailed(e) => {
                            warn!("Lost track of {}: {}", self.command, e);
                            self.emit(SupervisorEvent::Exited { code: None }).await;
                        }
                    }
                }
                Err(e) => {
                    warn!("Failed to start {}: {}", self.command, e);
                    self.emit(SupervisorEvent::SpawnFailed {
                        error: e.to_string(),
                    })
                    .await;
                }
            }

            if *self.shutdown.borrow() {
                break;
            }

            let (delay, backoff) = match self.tracker.on_failure(Instant::now()) {
                RestartDecision::RestartAfter(delay) => {
                    info!("Restarting {} in {:?}", self.command, delay);
                    (delay, false)
                }
                RestartDecision::Backoff(duration) => {
                    warn!(
                        "{} restarted too often, backing off for {:?}",
                        self.command, duration
                    );
                    self.emit(SupervisorEvent::BackoffStarted { duration }).await;
                    (duration, true)
                }
            };

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = self.shutdown.changed() => break,
            }

            if backoff {
                self.tracker.reset();
            }
        }
        debug!("Supervision of {} ended", self.command);
    }

    fn spawn(&self) -> std::io::Result<Child> {
        Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
    }

    async fn watch_child(&mut self, mut child: Child) -> ChildOutcome {
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(log_stderr(self.command.clone(), stderr));
        }
        let mut stdout = child.stdout.take();
        let mut buffer = LineBuffer::new();
        let mut chunk = vec![0u8; READ_CHUNK_SIZE];

        loop {
            tokio::select! {
                read = read_some(&mut stdout, &mut chunk), if stdout.is_some() => match read {
                    Some(n) => self.forward_lines(buffer.push(&chunk[..n])).await,
                    None => stdout = None,
                },
                status = child.wait() => {
                    // Drain what the child wrote before exiting
                    let drain = async {
                        while let Some(n) = read_some(&mut stdout, &mut chunk).await {
                            self.forward_lines(buffer.push(&chunk[..n])).await;
                        }
                    };
                    if tokio::time::timeout(TERMINATE_GRACE, drain).await.is_err() {
                        debug!("Output of {} still open after exit", self.command);
                    }
                    if buffer.pending_len() > 0 {
                        debug!("Discarding {} bytes of unterminated output", buffer.pending_len());
                    }
                    return match status {
                        Ok(status) => ChildOutcome::Exited(status),
                        Err(e) => ChildOutcome::WaitFailed(e),
                    };
                }
                _ = self.shutdown.changed() => {
                    terminate(&mut child).await;
                    return ChildOutcome::Stopped;
                }
            }
        }
    }

    async fn forward_lines(&self, lines: Vec<String>) {
        for line in lines {
            match parse_line(&line) {
                None => {}
                Some(Ok(value)) => self.emit(SupervisorEvent::Line(value)).await,
                Some(Err(e)) => warn!("Invalid JSON line from {}: {} ({:?})", self.command, e, line),
            }
        }
    }

    async fn emit(&self, event: SupervisorEvent) {
        if self.events.send(event.into()).await.is_err() {
            debug!("Supervisor event receiver closed");
        }
    }
}

/// Read one chunk. `None` at end of stream, on error, or without a reader.
async fn read_some<R>(reader: &mut Option<R>, chunk: &mut [u8]) -> Option<usize>
where
    R: AsyncRead + Unpin,
{
    let stream = reader.as_mut()?;
    match stream.read(chunk).await {
        Ok(0) => {
            *reader = None;
            None
        }
        Ok(n) => Some(n),
        Err(e) => {
            warn!("Error reading child output: {}", e);
            *reader = None;
            None
        }
    }
}

async fn log_stderr(command: String, stderr: ChildStderr) {
    let mut lines = BufReader::new(stderr).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) if !line.trim().is_empty() => warn!("{} stderr: {}", command, line),
            Ok(Some(_)) => {}
            Ok(None) => break,
            Err(e) => {
                debug!("Error reading {} stderr: {}", command, e);
                break;
            }
        }
    }
}

/// SIGTERM, then kill after [`TERMINATE_GRACE`]
async fn terminate(child: &mut Child) {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        // SAFETY: kill(2) with a pid we own and a valid signal number
        let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
        if rc != 0 {
            debug!("SIGTERM to {} failed: {}", pid, std::io::Error::last_os_error());
        }
    }
    #[cfg(not(unix))]
    if let Err(e) = child.start_kill() {
        debug!("Failed to kill child: {}", e);
    }

    match tokio::time::timeout(TERMINATE_GRACE, child.wait()).await {
        Ok(Ok(status)) => debug!("Child exited with {}", status),
        Ok(Err(e)) => warn!("Failed to wait for child: {}", e),
        Err(_) => {
            warn!("Child ignored SIGTERM, killing");
            if let Err(e) = child.kill().await {
                warn!("Failed to kill child: {}", e);
            }
        }
    }
}
