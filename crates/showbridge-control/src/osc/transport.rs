//! UDP transport for console OSC traffic
//!
//! One socket does both directions: it is bound on the receive port, and
//! commands and feedback requests are sent from it to the console.

use rosc::{decoder, encoder, OscMessage, OscPacket};
use showbridge_core::{to_logical, to_physical, ExecutorNumber, OscConfig};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use super::{
    address::{exec_address, parse_exec_address, FEEDBACK_ADDRESS},
    types::{osc_to_value, value_to_osc},
    ExecutorFeedback,
};
use crate::{error::ControlError, Result};

/// Largest datagram we accept from the console
const MAX_DATAGRAM_SIZE: usize = 65_536;

struct Running {
    socket: Arc<UdpSocket>,
    target: SocketAddr,
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

/// Bidirectional OSC exchange with the console
pub struct OscTransport {
    console_host: String,
    receive_port: u16,
    send_port: u16,
    feedback_interval: Duration,
    running: Mutex<Option<Running>>,
}

impl OscTransport {
    /// Create a transport talking to `console_host`
    pub fn new(console_host: impl Into<String>, config: &OscConfig) -> Self {
        Self {
            console_host: console_host.into(),
            receive_port: config.receive_port,
            send_port: config.send_port,
            feedback_interval: config.feedback_interval,
            running: Mutex::new(None),
        }
    }

    /// Bind the receive socket and start the feedback timer.
    ///
    /// Decoded executor values are delivered to `events`. Calling `start` on a
    /// running transport does nothing.
    pub async fn start<E>(&self, events: mpsc::Sender<E>) -> Result<()>
    where
        E: From<ExecutorFeedback> + Send + 'static,
    {
        if self.is_running() {
            return Ok(());
        }

        let target = tokio::net::lookup_host((self.console_host.as_str(), self.send_port))
            .await?
            .next()
            .ok_or_else(|| {
                ControlError::OscError(format!("Cannot resolve console host {}", self.console_host))
            })?;

        let socket = Arc::new(UdpSocket::bind(("0.0.0.0", self.receive_port)).await?);
        info!(
            "OSC listening on {}, sending to {}",
            socket.local_addr()?,
            target
        );

        let (shutdown, shutdown_rx) = watch::channel(false);
        let tasks = vec![
            tokio::spawn(receive_loop(socket.clone(), shutdown_rx.clone(), events)),
            tokio::spawn(feedback_loop(
                socket.clone(),
                target,
                self.feedback_interval,
                shutdown_rx,
            )),
        ];

        let mut running = self.lock();
        if running.is_some() {
            // Lost a race with a concurrent start
            let _ = shutdown.send(true);
            return Ok(());
        }
        *running = Some(Running {
            socket,
            target,
            shutdown,
            tasks,
        });
        Ok(())
    }

    /// Send a value to a logical executor.
    ///
    /// The value is clamped to `[0, 1]` and addressed to the executor's
    /// physical slot.
    pub async fn send_executor_command(&self, number: ExecutorNumber, value: f32) -> Result<()> {
        if !value.is_finite() {
            return Err(ControlError::InvalidParameter(format!(
                "Executor value must be finite, got {}",
                value
            )));
        }

        let (socket, target) = {
            let running = self.lock();
            let running = running
                .as_ref()
                .ok_or_else(|| ControlError::OscError("OSC transport not started".to_string()))?;
            (running.socket.clone(), running.target)
        };

        let message = OscMessage {
            addr: exec_address(to_physical(number)),
            args: vec![value_to_osc(value)],
        };
        debug!(executor = number, value, "Sending {}", message.addr);
        send_packet(&socket, target, OscPacket::Message(message)).await
    }

    /// Cancel the feedback timer and close the socket. Idempotent.
    pub async fn stop(&self) {
        let running = self.lock().take();
        let Some(running) = running else {
            return;
        };

        let _ = running.shutdown.send(true);
        for task in running.tasks {
            if let Err(e) = task.await {
                warn!("OSC task ended abnormally: {}", e);
            }
        }
        info!("OSC transport stopped");
    }

    /// Address the receive socket is bound to, while running
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.lock()
            .as_ref()
            .and_then(|running| running.socket.local_addr().ok())
    }

    /// True between `start` and `stop`
    pub fn is_running(&self) -> bool {
        self.lock().is_some()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Running>> {
        self.running
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

async fn send_packet(socket: &UdpSocket, target: SocketAddr, packet: OscPacket) -> Result<()> {
    let bytes = encoder::encode(&packet)?;
    socket.send_to(&bytes, target).await?;
    Ok(())
}

async fn feedback_loop(
    socket: Arc<UdpSocket>,
    target: SocketAddr,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    // First tick fires immediately
    let mut interval = tokio::time::interval(period);
    loop {
        tokio::select! {
            _ = interval.tick() => {
                let packet = OscPacket::Message(OscMessage {
                    addr: FEEDBACK_ADDRESS.to_string(),
                    args: vec![],
                });
                match send_packet(&socket, target, packet).await {
                    Ok(()) => trace!("Requested executor feedback"),
                    Err(e) => warn!("Failed to request executor feedback: {}", e),
                }
            }
            _ = shutdown.changed() => break,
        }
    }
}

async fn receive_loop<E>(
    socket: Arc<UdpSocket>,
    mut shutdown: watch::Receiver<bool>,
    events: mpsc::Sender<E>,
) where
    E: From<ExecutorFeedback> + Send + 'static,
{
    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
    loop {
        tokio::select! {
            received = socket.recv_from(&mut buf) => {
                let (size, from) = match received {
                    Ok(received) => received,
                    Err(e) => {
                        warn!("OSC receive error: {}", e);
                        continue;
                    }
                };
                let packet = match decoder::decode_udp(&buf[..size]) {
                    Ok((_, packet)) => packet,
                    Err(e) => {
                        debug!("Dropping undecodable OSC datagram from {}: {}", from, e);
                        continue;
                    }
                };
                let mut feedback = Vec::new();
                collect_feedback(packet, &mut feedback);
                for item in feedback {
                    if events.send(item.into()).await.is_err() {
                        debug!("OSC event receiver closed");
                        return;
                    }
                }
            }
            _ = shutdown.changed() => break,
        }
    }
}

/// Extract executor values from a packet, unpacking bundles recursively
fn collect_feedback(packet: OscPacket, out: &mut Vec<ExecutorFeedback>) {
    match packet {
        OscPacket::Message(message) => {
            let physical = match parse_exec_address(&message.addr) {
                Ok(physical) => physical,
                Err(_) => {
                    trace!("Ignoring OSC message {}", message.addr);
                    return;
                }
            };
            match osc_to_value(&message.args) {
                Ok(value) => out.push(ExecutorFeedback {
                    number: to_logical(physical),
                    value,
                }),
                Err(e) => debug!("Ignoring {}: {}", message.addr, e),
            }
        }
        OscPacket::Bundle(bundle) => {
            for packet in bundle.content {
                collect_feedback(packet, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rosc::{OscBundle, OscTime, OscType};

    fn message(addr: &str, args: Vec<OscType>) -> OscPacket {
        OscPacket::Message(OscMessage {
            addr: addr.to_string(),
            args,
        })
    }

    #[test]
    fn test_collect_folds_physical_index() {
        let mut out = Vec::new();
        collect_feedback(message("/exec/1/31", vec![OscType::Float(0.5)]), &mut out);
        assert_eq!(
            out,
            vec![ExecutorFeedback {
                number: 11,
                value: 0.5
            }]
        );
    }

    #[test]
    fn test_collect_ignores_unmatched() {
        let mut out = Vec::new();
        collect_feedback(message("/feedback/exec", vec![]), &mut out);
        collect_feedback(message("/pb/1", vec![OscType::Float(1.0)]), &mut out);
        collect_feedback(message("/exec/1/3", vec![]), &mut out);
        collect_feedback(
            message("/exec/1/3", vec![OscType::Float(f32::NAN)]),
            &mut out,
        );
        assert!(out.is_empty());
    }

    #[test]
    fn test_collect_unpacks_nested_bundles() {
        let inner = OscPacket::Bundle(OscBundle {
            timetag: OscTime {
                seconds: 0,
                fractional: 1,
            },
            content: vec![message("/exec/1/2", vec![OscType::Int(1)])],
        });
        let outer = OscPacket::Bundle(OscBundle {
            timetag: OscTime {
                seconds: 0,
                fractional: 1,
            },
            content: vec![message("/exec/1/1", vec![OscType::Double(0.25)]), inner],
        });

        let mut out = Vec::new();
        collect_feedback(outer, &mut out);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].number, 1);
        assert_eq!(out[0].value, 0.25);
        assert_eq!(out[1].number, 2);
        assert_eq!(out[1].value, 1.0);
    }

    #[tokio::test]
    async fn test_send_before_start_fails() {
        let transport = OscTransport::new("127.0.0.1", &OscConfig::default());
        assert!(transport.send_executor_command(1, 0.5).await.is_err());
        // Stop without start is a no-op
        transport.stop().await;
        assert!(!transport.is_running());
    }
}
