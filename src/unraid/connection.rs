//! A single pooled SSH session and its health bookkeeping

use crate::error::{ExporterError, Result};
use crate::unraid::transport::{preview, CommandOutput, Session, SshTarget, Transport};
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Errors at which a connection is no longer healthy.
pub const UNHEALTHY_ERROR_COUNT: u64 = 5;

/// Errors at which a connection is no longer handed out for reuse.
pub const REUSE_ERROR_LIMIT: u64 = 3;

/// Age beyond which a connection is no longer handed out for reuse.
pub const REUSE_MAX_AGE: Duration = Duration::from_secs(300);

pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(60);

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Active,
    Error,
    Disconnecting,
    Disconnected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Active => "active",
            ConnectionState::Error => "error",
            ConnectionState::Disconnecting => "disconnecting",
            ConnectionState::Disconnected => "disconnected",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ConnectionMetrics {
    pub created_at: Instant,
    pub last_used: Instant,
    pub command_count: u64,
    pub error_count: u64,
    pub total_command_time: Duration,
}

impl ConnectionMetrics {
    fn new(now: Instant) -> Self {
        Self {
            created_at: now,
            last_used: now,
            command_count: 0,
            error_count: 0,
            total_command_time: Duration::ZERO,
        }
    }

    pub fn age(&self) -> Duration {
        Instant::now().saturating_duration_since(self.created_at)
    }

    pub fn idle_time(&self) -> Duration {
        Instant::now().saturating_duration_since(self.last_used)
    }

    pub fn avg_command_time(&self) -> Duration {
        match u32::try_from(self.command_count) {
            Ok(0) => Duration::ZERO,
            Ok(count) => self.total_command_time / count,
            Err(_) => Duration::from_secs_f64(
                self.total_command_time.as_secs_f64() / self.command_count as f64,
            ),
        }
    }
}

struct Inner {
    state: ConnectionState,
    session: Option<Arc<dyn Session>>,
    metrics: ConnectionMetrics,
}

impl Inner {
    /// Mark the connection failed and hand back the session for closing.
    fn fail(&mut self) -> Option<Arc<dyn Session>> {
        self.metrics.error_count += 1;
        self.state = ConnectionState::Error;
        self.session.take()
    }
}

pub struct SshConnection {
    id: u64,
    target: Arc<SshTarget>,
    transport: Arc<dyn Transport>,
    inner: Mutex<Inner>,
    lifecycle: tokio::sync::Mutex<()>,
    command_timeout: Duration,
}

impl SshConnection {
    pub fn new(target: Arc<SshTarget>, transport: Arc<dyn Transport>) -> Self {
        Self::with_timeout(target, transport, DEFAULT_COMMAND_TIMEOUT)
    }

    pub fn with_timeout(
        target: Arc<SshTarget>,
        transport: Arc<dyn Transport>,
        command_timeout: Duration,
    ) -> Self {
        Self {
            id: NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
            target,
            transport,
            inner: Mutex::new(Inner {
                state: ConnectionState::Idle,
                session: None,
                metrics: ConnectionMetrics::new(Instant::now()),
            }),
            lifecycle: tokio::sync::Mutex::new(()),
            command_timeout,
        }
    }

    /// Process-unique id used in log lines.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn host(&self) -> &str {
        &self.target.host
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.lock().state
    }

    pub fn metrics(&self) -> ConnectionMetrics {
        self.inner.lock().metrics
    }

    pub fn has_session(&self) -> bool {
        self.inner.lock().session.is_some()
    }

    /// Active with a live session and fewer than five errors.
    pub fn is_healthy(&self) -> bool {
        let inner = self.inner.lock();
        inner.state == ConnectionState::Active
            && inner.session.is_some()
            && inner.metrics.error_count < UNHEALTHY_ERROR_COUNT
    }

    /// Healthy, younger than five minutes and fewer than three errors.
    pub fn is_reusable(&self) -> bool {
        self.is_healthy() && {
            let metrics = self.metrics();
            metrics.age() < REUSE_MAX_AGE && metrics.error_count < REUSE_ERROR_LIMIT
        }
    }

    /// Open the session unless one is already active.
    pub async fn connect(&self) -> Result<()> {
        if self.state() == ConnectionState::Active {
            return Ok(());
        }

        let _guard = self.lifecycle.lock().await;
        {
            let mut inner = self.inner.lock();
            if inner.state == ConnectionState::Active {
                return Ok(());
            }
            inner.state = ConnectionState::Connecting;
        }

        debug!(conn_id = self.id, host = %self.target.host, "Connecting");

        match self.transport.open(&self.target).await {
            Ok(session) => {
                let mut inner = self.inner.lock();
                let recovered = inner.metrics.error_count;
                inner.session = Some(Arc::from(session));
                inner.state = ConnectionState::Active;
                inner.metrics.error_count = 0;
                inner.metrics.last_used = Instant::now();
                drop(inner);

                if recovered > 0 {
                    info!(
                        conn_id = self.id,
                        host = %self.target.host,
                        previous_errors = recovered,
                        "Connection recovered"
                    );
                } else {
                    debug!(conn_id = self.id, host = %self.target.host, "Connected");
                }
                Ok(())
            }
            Err(e) => {
                let mut inner = self.inner.lock();
                inner.fail();
                inner.metrics.last_used = Instant::now();
                drop(inner);

                warn!(conn_id = self.id, host = %self.target.host, error = %e, "Connect failed");
                Err(e)
            }
        }
    }

    /// Close the session. Close errors are logged, never returned.
    pub async fn disconnect(&self) {
        let _guard = self.lifecycle.lock().await;
        let session = {
            let mut inner = self.inner.lock();
            if inner.state == ConnectionState::Disconnected || inner.session.is_none() {
                inner.state = ConnectionState::Disconnected;
                return;
            }
            inner.state = ConnectionState::Disconnecting;
            inner.session.take()
        };

        if let Some(session) = session {
            if let Err(e) = session.close().await {
                debug!(conn_id = self.id, error = %e, "Error closing session");
            }
        }

        self.inner.lock().state = ConnectionState::Disconnected;
        debug!(conn_id = self.id, host = %self.target.host, "Disconnected");
    }

    /// Run `command`, connecting first if needed.
    ///
    /// Any failure, timeout included, puts the connection in the error state
    /// and drops its session before the error is returned.
    pub async fn execute_command(
        &self,
        command: &str,
        timeout: Option<Duration>,
    ) -> Result<CommandOutput> {
        if self.state() != ConnectionState::Active {
            self.connect().await?;
        }

        let session = {
            let mut inner = self.inner.lock();
            inner.metrics.last_used = Instant::now();
            inner.session.clone()
        };
        let Some(session) = session else {
            self.invalidate();
            return Err(ExporterError::Connection(format!(
                "connection {} has no session",
                self.id
            )));
        };

        let limit = timeout.unwrap_or(self.command_timeout);
        let started = Instant::now();
        debug!(conn_id = self.id, command = %preview(command), "Executing command");

        let result = match tokio::time::timeout(limit, session.run(command)).await {
            Ok(result) => result,
            Err(_) => Err(ExporterError::Timeout {
                seconds: limit.as_secs_f64(),
            }),
        };

        match result {
            Ok(output) => {
                let elapsed = started.elapsed();
                let mut inner = self.inner.lock();
                inner.metrics.command_count += 1;
                inner.metrics.total_command_time += elapsed;
                inner.metrics.last_used = Instant::now();
                Ok(output)
            }
            Err(e) => {
                // Dropping the last handle to the session tears it down.
                drop(self.inner.lock().fail());
                warn!(
                    conn_id = self.id,
                    command = %preview(command),
                    error = %e,
                    "Command failed"
                );
                Err(e)
            }
        }
    }

    fn invalidate(&self) {
        drop(self.inner.lock().fail());
    }
}

impl fmt::Debug for SshConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("SshConnection")
            .field("id", &self.id)
            .field("host", &self.target.host)
            .field("state", &inner.state)
            .field("has_session", &inner.session.is_some())
            .field("metrics", &inner.metrics)
            .finish()
    }
}
