//! Client session lifecycle.
//!
//! A [`ClientSession`] owns one transport and one pacer and drives the
//! repeated cycle: ensure-connected, build message, send, receive,
//! display, sleep, until stopped or a fatal error. The paired
//! [`SessionHandle`] is the only external surface: `stop()`, `status()`,
//! and the identity.
//!
//! # State machine
//!
//! ```text
//! Disconnected → Connected → (cycling) → Stopping → Stopped
//! ```
//!
//! `Stopped` is terminal; a stopped session never reconnects.
//!
//! # Cancellation
//!
//! Cooperative. `stop()` flips the liveness flag and posts a notify
//! permit; the loop observes the flag at the top of each cycle and the
//! permit cuts short an in-progress pacing sleep or pending receive.
//! An in-flight HTTP round trip cannot be interrupted; stopping during
//! one is best-effort and completes at the next safe point.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use rand::RngCore;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::Notify;
use tracing::{debug, error, info, warn};

use crate::config::{PacingConfig, ServerEndpoint};
use crate::error::Result;
use crate::identity::ClientIdentity;
use crate::pacing::Pacer;
use crate::protocol::{self, CommandMessage, DeviceCommand, cleanup};
use crate::transport::{ServerReply, Transport, TransportKind};

// ============================================================================
// SessionState
// ============================================================================

/// Observable lifecycle state of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No live connection.
    Disconnected,
    /// Holding a live connection and cycling.
    Connected,
    /// Stop requested, not yet observed by the loop.
    Stopping,
    /// Loop exited and connection closed. Terminal.
    Stopped,
}

// ============================================================================
// SessionShared
// ============================================================================

/// State shared between the session loop and its handle.
struct SessionShared {
    /// Cleared exactly once by `stop()` (or by the loop on exit).
    alive: AtomicBool,
    /// Observable lifecycle state.
    state: Mutex<SessionState>,
    /// Wakes the loop out of a pacing sleep or pending receive.
    stop_signal: Notify,
}

impl SessionShared {
    fn new() -> Self {
        Self {
            alive: AtomicBool::new(true),
            state: Mutex::new(SessionState::Disconnected),
            stop_signal: Notify::new(),
        }
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Sets the state unless the session is already terminal.
    fn set_state(&self, next: SessionState) {
        let mut state = self.state.lock();
        if *state != SessionState::Stopped {
            *state = next;
        }
    }

    fn mark_stopped(&self) {
        *self.state.lock() = SessionState::Stopped;
    }
}

// ============================================================================
// SessionHandle
// ============================================================================

/// External handle to a running session.
///
/// Cheap to clone; all clones observe and control the same session.
#[derive(Clone)]
pub struct SessionHandle {
    /// Identity of the controlled session.
    identity: ClientIdentity,
    /// Shared loop state.
    shared: Arc<SessionShared>,
}

impl SessionHandle {
    /// Returns the session's identity.
    #[inline]
    #[must_use]
    pub fn identity(&self) -> &ClientIdentity {
        &self.identity
    }

    /// Returns the session's current lifecycle state.
    #[inline]
    #[must_use]
    pub fn status(&self) -> SessionState {
        *self.shared.state.lock()
    }

    /// Returns `true` until the session stops or is asked to.
    #[inline]
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.shared.is_alive()
    }

    /// Requests a cooperative stop.
    ///
    /// Returns once the request is recorded; the loop transitions to
    /// [`SessionState::Stopped`] at its next safe point.
    pub fn stop(&self) {
        if self.shared.alive.swap(false, Ordering::SeqCst) {
            debug!(client = %self.identity, "stop requested");
        }
        self.shared.set_state(SessionState::Stopping);
        // notify_one stores a permit, so a stop issued between safe
        // points is not lost.
        self.shared.stop_signal.notify_one();
    }
}

// ============================================================================
// ClientSession
// ============================================================================

/// One simulated client: a transport, a pacer, and the session loop.
pub struct ClientSession {
    /// Stable identity, used in logs and the `Sender` wire field.
    identity: ClientIdentity,
    /// Which variant this session runs, for message construction.
    kind: TransportKind,
    /// Exclusively owned connection lifecycle.
    transport: Box<dyn Transport>,
    /// Randomized inter-message delay source.
    pacer: Pacer,
    /// Random source for message body choice.
    rng: Box<dyn RngCore + Send>,
    /// State shared with handles.
    shared: Arc<SessionShared>,
}

impl ClientSession {
    /// Creates a session with entropy-seeded random sources.
    #[must_use]
    pub fn new(
        kind: TransportKind,
        identity: ClientIdentity,
        endpoint: &ServerEndpoint,
        pacing: PacingConfig,
    ) -> Self {
        let transport = kind.build(endpoint, &identity);
        Self {
            identity,
            kind,
            transport,
            pacer: Pacer::new(pacing),
            rng: Box::new(StdRng::from_entropy()),
            shared: Arc::new(SessionShared::new()),
        }
    }

    /// Replaces both random sources with seed-derived ones.
    #[must_use]
    pub fn seeded(mut self, seed: u64) -> Self {
        self.pacer = Pacer::seeded(
            PacingConfig::new().with_max_delay(self.pacer.max_delay_secs()),
            seed,
        );
        self.rng = Box::new(StdRng::seed_from_u64(seed.wrapping_add(1)));
        self
    }

    /// Returns a control handle for this session.
    #[must_use]
    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            identity: self.identity.clone(),
            shared: Arc::clone(&self.shared),
        }
    }

    /// Drives the session until stopped or a fatal error.
    ///
    /// Per-cycle errors never escape this loop: fatal ones are logged
    /// and end the session, tolerated ones are logged and the loop
    /// continues. On exit the connection is closed and the state is
    /// terminal [`SessionState::Stopped`].
    pub async fn run(mut self) {
        loop {
            if !self.shared.is_alive() {
                break;
            }

            if !self.transport.is_connected() {
                match self.transport.connect().await {
                    Ok(()) => self.shared.set_state(SessionState::Connected),
                    Err(e) => {
                        error!(client = %self.identity, error = %e, "connect failed");
                        break;
                    }
                }
            }

            let payload = match self.build_payload() {
                Ok(payload) => payload,
                Err(e) => {
                    error!(client = %self.identity, error = %e, "building message failed");
                    break;
                }
            };

            if let Err(e) = self.transport.send(&payload).await {
                error!(client = %self.identity, error = %e, "send failed");
                break;
            }

            // A pending receive is abandoned when stop is requested; the
            // read timeout bounds the wait regardless.
            let stopper = Arc::clone(&self.shared);
            let reply = tokio::select! {
                reply = self.transport.receive() => Some(reply),
                _ = stopper.stop_signal.notified() => None,
            };

            match reply {
                None => break,
                Some(Ok(reply)) => self.display(&reply),
                Some(Err(e)) => {
                    error!(client = %self.identity, error = %e, "receive failed");
                    break;
                }
            }

            if !self.shared.is_alive() {
                break;
            }

            let delay = self.pacer.next_delay();
            let stopper = Arc::clone(&self.shared);
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = stopper.stop_signal.notified() => break,
            }
        }

        self.transport.close().await;
        self.shared.alive.store(false, Ordering::SeqCst);
        self.shared.mark_stopped();
        info!(client = %self.identity, "session stopped");
    }

    /// Builds the next outbound payload for this session's variant.
    fn build_payload(&mut self) -> Result<String> {
        match self.kind {
            TransportKind::Http => Ok(protocol::PING.to_owned()),
            TransportKind::Socket | TransportKind::WebSocket => {
                let body = DeviceCommand::choose(self.rng.as_mut());
                info!(client = %self.identity, body = %body, "sending command");
                CommandMessage::now(&self.identity, body).to_json()
            }
        }
    }

    /// Reports one reply. Tolerated anomalies are logged here and the
    /// loop continues.
    fn display(&self, reply: &ServerReply) {
        match reply {
            ServerReply::Http { status, body } => {
                if (200..300).contains(status) {
                    info!(client = %self.identity, response = %body, "response received");
                } else {
                    warn!(
                        client = %self.identity,
                        status,
                        body = %body,
                        "server returned non-success status"
                    );
                }
            }
            ServerReply::Bytes(bytes) if bytes.is_empty() => {
                info!(client = %self.identity, "empty response from server");
            }
            ServerReply::Bytes(bytes) => match cleanup::decode_payload(bytes) {
                Ok(value) => {
                    let pretty =
                        serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string());
                    info!(client = %self.identity, response = %pretty, "response received");
                }
                Err(e) => {
                    warn!(client = %self.identity, error = %e, "response was not valid JSON");
                }
            },
            ServerReply::Detached => {}
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::time::sleep;

    fn session(kind: TransportKind, endpoint: &ServerEndpoint, max_delay: u64) -> ClientSession {
        let identity = ClientIdentity::indexed(kind.client_name(), 0);
        let pacing = PacingConfig::new().with_max_delay(max_delay);
        ClientSession::new(kind, identity, endpoint, pacing)
    }

    #[tokio::test]
    async fn test_connect_failure_stops_session_without_retry() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("addr").port();
        drop(listener);

        let endpoint = ServerEndpoint::new("127.0.0.1", port);
        let session = session(TransportKind::Socket, &endpoint, 1);
        let handle = session.handle();

        session.run().await;

        assert_eq!(handle.status(), SessionState::Stopped);
        assert!(!handle.is_alive());
    }

    #[tokio::test]
    async fn test_http_session_survives_non_success_status() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("addr").port();

        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    break;
                };
                tokio::spawn(async move {
                    let mut buf = vec![0u8; 4096];
                    let _ = stream.read(&mut buf).await;
                    let _ = stream
                        .write_all(
                            b"HTTP/1.1 404 Not Found\r\nContent-Length: 9\r\nConnection: close\r\n\r\nnot found",
                        )
                        .await;
                });
            }
        });

        let endpoint = ServerEndpoint::new("127.0.0.1", port);
        let session = session(TransportKind::Http, &endpoint, 0);
        let handle = session.handle();
        let task = tokio::spawn(session.run());

        // Several 404 cycles must leave the session alive.
        sleep(Duration::from_millis(300)).await;
        assert_eq!(handle.status(), SessionState::Connected);
        assert!(handle.is_alive());

        handle.stop();
        task.await.expect("join");
        assert_eq!(handle.status(), SessionState::Stopped);
    }

    #[tokio::test]
    async fn test_socket_session_survives_empty_responses() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("addr").port();

        // Read the request, then end the write direction so every read
        // on the client side sees EOF.
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.expect("accept");
            let mut buf = vec![0u8; 4096];
            let _ = stream.read(&mut buf).await;
            let _ = stream.shutdown().await;
            // Keep the read half open so client sends keep succeeding.
            sleep(Duration::from_secs(30)).await;
        });

        let endpoint = ServerEndpoint::new("127.0.0.1", port);
        let session = session(TransportKind::Socket, &endpoint, 0);
        let handle = session.handle();
        let task = tokio::spawn(session.run());

        sleep(Duration::from_millis(300)).await;
        assert_eq!(handle.status(), SessionState::Connected);
        assert!(handle.is_alive());

        handle.stop();
        task.await.expect("join");
        assert_eq!(handle.status(), SessionState::Stopped);
    }

    #[tokio::test]
    async fn test_stop_interrupts_blocked_receive() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("addr").port();

        // Accept and hold without replying, leaving the client parked in
        // its timed read.
        tokio::spawn(async move {
            let (_stream, _) = listener.accept().await.expect("accept");
            sleep(Duration::from_secs(30)).await;
        });

        let endpoint = ServerEndpoint::new("127.0.0.1", port);
        let session = session(TransportKind::Socket, &endpoint, 5);
        let handle = session.handle();
        let task = tokio::spawn(session.run());

        sleep(Duration::from_millis(200)).await;
        handle.stop();

        // Well within one read-timeout interval.
        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("stopped within bound")
            .expect("join");
        assert_eq!(handle.status(), SessionState::Stopped);
    }

    #[tokio::test]
    async fn test_stop_before_run_prevents_any_cycle() {
        let endpoint = ServerEndpoint::new("127.0.0.1", 9999);
        let session = session(TransportKind::Socket, &endpoint, 1);
        let handle = session.handle();

        handle.stop();
        assert_eq!(handle.status(), SessionState::Stopping);

        session.run().await;
        assert_eq!(handle.status(), SessionState::Stopped);
    }
}
