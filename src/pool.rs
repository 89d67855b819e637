//! Client pool lifecycle.
//!
//! A [`ClientPool`] spawns N sessions concurrently, registers a handle
//! for each before its task starts, and coordinates shutdown: request
//! stop on every session, then join every task — explicitly, with an
//! optional grace timeout, never by guessing a sleep.
//!
//! # Example
//!
//! ```ignore
//! use loadswarm::{ClientPool, PacingConfig, ServerEndpoint, TransportKind};
//!
//! let endpoint = ServerEndpoint::new("127.0.0.1", 9090);
//! let mut pool = ClientPool::spawn(TransportKind::Socket, &endpoint, PacingConfig::new(), 10);
//!
//! pool.shutdown_all();
//! pool.join_all().await;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::{PacingConfig, ServerEndpoint};
use crate::identity::ClientIdentity;
use crate::session::{ClientSession, SessionHandle};
use crate::transport::TransportKind;

// ============================================================================
// ClientPool
// ============================================================================

/// The set of concurrently running sessions spawned for one run.
///
/// The registry is append-only during spawn and iterated, never
/// structurally mutated, during shutdown.
pub struct ClientPool {
    /// Session handles, in spawn order.
    handles: Vec<SessionHandle>,
    /// One task per session.
    tasks: JoinSet<()>,
}

// ============================================================================
// ClientPool - Spawning
// ============================================================================

impl ClientPool {
    /// Spawns `count` sessions of one transport kind.
    ///
    /// Identities are index-derived (`socket_0 … socket_{count-1}`) and
    /// therefore unique within the pool. Every handle is registered
    /// before its task starts, so a shutdown requested immediately
    /// after spawn still reaches every session.
    #[must_use]
    pub fn spawn(
        kind: TransportKind,
        endpoint: &ServerEndpoint,
        pacing: PacingConfig,
        count: usize,
    ) -> Self {
        Self::spawn_inner(kind, endpoint, pacing, count, None)
    }

    /// Spawns `count` sessions with deterministic, seed-derived random
    /// sources (session `i` uses `seed + i`).
    #[must_use]
    pub fn spawn_seeded(
        kind: TransportKind,
        endpoint: &ServerEndpoint,
        pacing: PacingConfig,
        count: usize,
        seed: u64,
    ) -> Self {
        Self::spawn_inner(kind, endpoint, pacing, count, Some(seed))
    }

    fn spawn_inner(
        kind: TransportKind,
        endpoint: &ServerEndpoint,
        pacing: PacingConfig,
        count: usize,
        seed: Option<u64>,
    ) -> Self {
        let mut handles = Vec::with_capacity(count);
        let mut tasks = JoinSet::new();

        for index in 0..count {
            let identity = ClientIdentity::indexed(kind.client_name(), index);
            let mut session = ClientSession::new(kind, identity, endpoint, pacing);
            if let Some(seed) = seed {
                session = session.seeded(seed.wrapping_add(index as u64));
            }

            // Register before starting.
            let handle = session.handle();
            debug!(client = %handle.identity(), "session registered");
            handles.push(handle);

            tasks.spawn(session.run());
        }

        info!(count, transport = %kind, endpoint = %endpoint, "client pool started");

        Self { handles, tasks }
    }
}

// ============================================================================
// ClientPool - Observation
// ============================================================================

impl ClientPool {
    /// Returns the number of sessions spawned.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Returns `true` if the pool spawned no sessions.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Returns the registered session handles, in spawn order.
    #[inline]
    #[must_use]
    pub fn handles(&self) -> &[SessionHandle] {
        &self.handles
    }
}

// ============================================================================
// ClientPool - Shutdown
// ============================================================================

impl ClientPool {
    /// Requests stop on every registered session.
    ///
    /// Returns once the request has been recorded for all of them; it
    /// does not wait for termination — that is [`join_all`].
    ///
    /// [`join_all`]: Self::join_all
    pub fn shutdown_all(&self) {
        info!(count = self.handles.len(), "stopping all sessions");
        for handle in &self.handles {
            handle.stop();
        }
    }

    /// Waits for every session task to finish.
    pub async fn join_all(&mut self) {
        while let Some(result) = self.tasks.join_next().await {
            if let Err(e) = result
                && !e.is_cancelled()
            {
                warn!(error = %e, "session task failed");
            }
        }
    }

    /// Waits for every session task, bounded by a grace period.
    ///
    /// Returns `true` if all tasks finished in time. On timeout the
    /// stragglers are aborted and reaped, and `false` is returned.
    pub async fn join_all_timeout(&mut self, grace: Duration) -> bool {
        if timeout(grace, self.join_all()).await.is_ok() {
            return true;
        }

        warn!(
            grace_secs = grace.as_secs(),
            remaining = self.tasks.len(),
            "grace period elapsed, aborting remaining sessions"
        );
        self.tasks.abort_all();
        while self.tasks.join_next().await.is_some() {}

        false
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;

    use tokio::net::TcpListener;
    use tokio::time::sleep;

    use crate::session::SessionState;

    async fn dead_endpoint() -> ServerEndpoint {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("addr").port();
        drop(listener);
        ServerEndpoint::new("127.0.0.1", port)
    }

    #[tokio::test]
    async fn test_spawn_creates_distinct_identities() {
        let endpoint = dead_endpoint().await;
        let mut pool = ClientPool::spawn(
            TransportKind::Socket,
            &endpoint,
            PacingConfig::new().with_max_delay(1),
            8,
        );

        assert_eq!(pool.len(), 8);
        let ids: HashSet<_> = pool
            .handles()
            .iter()
            .map(|h| h.identity().id().to_owned())
            .collect();
        assert_eq!(ids.len(), 8);

        pool.join_all().await;
    }

    #[tokio::test]
    async fn test_sessions_against_dead_port_all_stop_without_retry() {
        let endpoint = dead_endpoint().await;
        let mut pool = ClientPool::spawn(
            TransportKind::Socket,
            &endpoint,
            PacingConfig::new().with_max_delay(1),
            3,
        );

        // Every session logs its connect failure and stops; the join
        // completes without any external stop request.
        tokio::time::timeout(Duration::from_secs(5), pool.join_all())
            .await
            .expect("all sessions stop on their own");

        for handle in pool.handles() {
            assert_eq!(handle.status(), SessionState::Stopped);
        }
    }

    #[tokio::test]
    async fn test_shutdown_reaches_sessions_blocked_in_read() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("addr").port();

        // Accept every connection and never reply, parking each session
        // in its timed read.
        tokio::spawn(async move {
            let mut held = Vec::new();
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                held.push(stream);
            }
        });

        let endpoint = ServerEndpoint::new("127.0.0.1", port);
        let mut pool = ClientPool::spawn(
            TransportKind::Socket,
            &endpoint,
            PacingConfig::new().with_max_delay(1),
            4,
        );

        sleep(Duration::from_millis(300)).await;
        pool.shutdown_all();

        // One read-timeout interval plus pacing delay bounds the stop.
        assert!(pool.join_all_timeout(Duration::from_secs(4)).await);
        for handle in pool.handles() {
            assert_eq!(handle.status(), SessionState::Stopped);
        }
    }

    #[tokio::test]
    async fn test_shutdown_immediately_after_spawn_reaches_every_session() {
        let endpoint = dead_endpoint().await;
        let mut pool = ClientPool::spawn(
            TransportKind::Socket,
            &endpoint,
            PacingConfig::new().with_max_delay(3),
            8,
        );

        pool.shutdown_all();
        assert!(pool.join_all_timeout(Duration::from_secs(5)).await);

        for handle in pool.handles() {
            assert_eq!(handle.status(), SessionState::Stopped);
        }
    }

    #[tokio::test]
    async fn test_empty_pool_joins_immediately() {
        let endpoint = ServerEndpoint::new("127.0.0.1", 9999);
        let mut pool = ClientPool::spawn(TransportKind::Socket, &endpoint, PacingConfig::new(), 0);

        assert!(pool.is_empty());
        pool.join_all().await;
    }
}
