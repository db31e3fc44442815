//! Connection pool with circuit breaker and retry
//!
//! [`ConnectionManager`] hands out [`SshConnection`]s for one Unraid host:
//!
//! 1. A tripped circuit breaker fails every request immediately
//! 2. Stale, error-prone and failed connections are evicted
//! 3. The first reusable connection is returned
//! 4. Otherwise a new one is opened while the pool has room
//! 5. Otherwise the least-used connection is shared
//!
//! [`ConnectionManager::execute_command`] wraps that with a bounded retry
//! loop using exponential backoff. Every failure feeds the breaker.

use crate::config::PoolConfig;
use crate::error::{ExporterError, Result};
use crate::unraid::circuit::{CircuitBreaker, CircuitBreakerConfig};
use crate::unraid::connection::{
    ConnectionState, SshConnection, DEFAULT_COMMAND_TIMEOUT, UNHEALTHY_ERROR_COUNT,
};
use crate::unraid::executor::CommandExecutor;
use crate::unraid::retry::RetryPolicy;
use crate::unraid::transport::{preview, CommandOutput, SshTarget, Transport};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Pool metrics are logged every this many `get_connection` calls.
const METRICS_LOG_EVERY: u64 = 100;

#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub pool_size: usize,
    pub min_idle: usize,
    /// Connections older than this are evicted
    pub max_lifetime: Duration,
    pub command_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            pool_size: 3,
            min_idle: 1,
            max_lifetime: Duration::from_secs(300),
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }
}

impl From<&PoolConfig> for PoolSettings {
    fn from(pool: &PoolConfig) -> Self {
        Self {
            pool_size: pool.pool_size,
            min_idle: pool.min_idle,
            max_lifetime: Duration::from_secs(pool.max_lifetime_seconds),
            command_timeout: Duration::from_secs(pool.command_timeout_seconds),
        }
    }
}

/// Snapshot of pool health for logging and export.
#[derive(Debug, Clone, PartialEq)]
pub struct PoolMetrics {
    pub pool_size: usize,
    pub active_connections: usize,
    pub error_connections: usize,
    pub total_commands: u64,
    pub total_errors: u64,
    pub error_rate: f64,
    pub circuit_breaker_status: String,
    pub recent_errors: usize,
}

pub struct ConnectionManager {
    transport: Arc<dyn Transport>,
    settings: PoolSettings,
    retry: RetryPolicy,
    target: RwLock<Option<Arc<SshTarget>>>,
    pool: tokio::sync::Mutex<Vec<Arc<SshConnection>>>,
    breaker: Mutex<CircuitBreaker>,
    calls: AtomicU64,
}

impl ConnectionManager {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_settings(
            transport,
            PoolSettings::default(),
            RetryPolicy::default(),
            CircuitBreakerConfig::default(),
        )
    }

    pub fn with_settings(
        transport: Arc<dyn Transport>,
        settings: PoolSettings,
        retry: RetryPolicy,
        breaker: CircuitBreakerConfig,
    ) -> Self {
        Self {
            transport,
            settings,
            retry,
            target: RwLock::new(None),
            pool: tokio::sync::Mutex::new(Vec::new()),
            breaker: Mutex::new(CircuitBreaker::new(breaker)),
            calls: AtomicU64::new(0),
        }
    }

    pub fn from_config(transport: Arc<dyn Transport>, pool: &PoolConfig) -> Self {
        Self::with_settings(
            transport,
            PoolSettings::from(pool),
            RetryPolicy::from(pool),
            CircuitBreakerConfig::from(pool),
        )
    }

    pub fn settings(&self) -> &PoolSettings {
        &self.settings
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Remember the target and seed the pool with one live connection.
    pub async fn initialize(&self, target: SshTarget) -> Result<()> {
        let target = Arc::new(target);
        *self.target.write() = Some(Arc::clone(&target));

        info!(
            host = %target.host,
            port = target.port,
            pool_size = self.settings.pool_size,
            "Initializing connection pool"
        );

        let connection = self.new_connection(Arc::clone(&target));
        if let Err(e) = connection.connect().await {
            self.record_error();
            return Err(e);
        }
        let mut pool = self.pool.lock().await;
        pool.push(connection);

        // Extra idle connections are best effort; the first one proved the target works
        let seed = self.settings.min_idle.clamp(1, self.settings.pool_size.max(1));
        while pool.len() < seed {
            let connection = self.new_connection(Arc::clone(&target));
            match connection.connect().await {
                Ok(()) => pool.push(connection),
                Err(e) => {
                    debug!(error = %e, "Failed to open idle connection");
                    break;
                }
            }
        }
        Ok(())
    }

    fn current_target(&self) -> Result<Arc<SshTarget>> {
        self.target.read().clone().ok_or(ExporterError::NotInitialized)
    }

    fn host(&self) -> String {
        self.target
            .read()
            .as_ref()
            .map(|t| t.host.clone())
            .unwrap_or_default()
    }

    fn new_connection(&self, target: Arc<SshTarget>) -> Arc<SshConnection> {
        Arc::new(SshConnection::with_timeout(
            target,
            Arc::clone(&self.transport),
            self.settings.command_timeout,
        ))
    }

    fn record_error(&self) {
        self.breaker.lock().record_error(Instant::now());
    }

    /// Pick or open a connection for the next command.
    pub async fn get_connection(&self) -> Result<Arc<SshConnection>> {
        let target = self.current_target()?;

        if self.breaker.lock().is_open(&target.host, Instant::now()) {
            return Err(ExporterError::CircuitOpen {
                host: target.host.clone(),
            });
        }

        let mut pool = self.pool.lock().await;
        self.evict_stale(&mut pool).await;

        let calls = self.calls.fetch_add(1, Ordering::Relaxed) + 1;
        if calls % METRICS_LOG_EVERY == 0 {
            let metrics = self.snapshot(&pool);
            debug!(
                pool_size = metrics.pool_size,
                active = metrics.active_connections,
                errors = metrics.error_connections,
                commands = metrics.total_commands,
                error_rate = metrics.error_rate,
                circuit = %metrics.circuit_breaker_status,
                "Connection pool metrics"
            );
        }

        if let Some(connection) = pool.iter().find(|c| c.is_reusable()) {
            debug!(conn_id = connection.id(), "Reusing existing connection");
            return Ok(Arc::clone(connection));
        }

        if pool.len() < self.settings.pool_size {
            let connection = self.new_connection(target);
            if let Err(e) = connection.connect().await {
                self.record_error();
                return Err(e);
            }
            debug!(
                conn_id = connection.id(),
                pool_size = pool.len() + 1,
                "Created new connection"
            );
            pool.push(Arc::clone(&connection));
            return Ok(connection);
        }

        // Pool is full and nothing is reusable: share the least-used one.
        pool.iter()
            .min_by_key(|c| c.metrics().command_count)
            .cloned()
            .ok_or(ExporterError::PoolExhausted)
    }

    async fn evict_stale(&self, pool: &mut Vec<Arc<SshConnection>>) {
        let max_lifetime = self.settings.max_lifetime;
        let (stale, keep): (Vec<_>, Vec<_>) = pool.drain(..).partition(|c| {
            let metrics = c.metrics();
            metrics.age() > max_lifetime
                || metrics.error_count >= UNHEALTHY_ERROR_COUNT
                || c.state() == ConnectionState::Error
        });
        *pool = keep;

        for connection in stale {
            debug!(
                conn_id = connection.id(),
                state = %connection.state(),
                "Evicting connection"
            );
            connection.disconnect().await;
        }
    }

    /// Run a command with the manager's retry policy.
    pub async fn execute_command(
        &self,
        command: &str,
        timeout: Option<Duration>,
    ) -> Result<CommandOutput> {
        self.execute_with_policy(command, timeout, &self.retry).await
    }

    /// Run a command, retrying every failure per `policy`.
    pub async fn execute_with_policy(
        &self,
        command: &str,
        timeout: Option<Duration>,
        policy: &RetryPolicy,
    ) -> Result<CommandOutput> {
        let attempts = policy.attempts();
        let mut last_error = None;

        for attempt in 0..attempts {
            if attempt > 0 {
                let delay = policy.backoff(attempt);
                debug!(
                    attempt = attempt + 1,
                    attempts,
                    delay_secs = delay.as_secs_f64(),
                    "Retrying command"
                );
                tokio::time::sleep(delay).await;
            }

            let result = match self.get_connection().await {
                Ok(connection) => connection.execute_command(command, timeout).await,
                Err(e) => Err(e),
            };

            match result {
                Ok(output) => return Ok(output),
                Err(e) => {
                    self.record_error();
                    if attempt + 1 < attempts {
                        warn!(
                            command = %preview(command),
                            attempt = attempt + 1,
                            attempts,
                            error = %e,
                            "Command attempt failed"
                        );
                    }
                    last_error = Some(e);
                }
            }
        }

        let e = last_error.unwrap_or(ExporterError::PoolExhausted);
        error!(
            command = %preview(command),
            attempts,
            error = %e,
            "Command failed after retries"
        );
        Err(e)
    }

    /// Run `echo` once; any failure reads as unhealthy.
    pub async fn health_check(&self) -> bool {
        let connection = match self.get_connection().await {
            Ok(connection) => connection,
            Err(e) => {
                warn!(error = %e, "Health check could not get a connection");
                return false;
            }
        };
        match connection.execute_command("echo", None).await {
            Ok(output) => output.success(),
            Err(e) => {
                warn!(error = %e, "Health check failed");
                false
            }
        }
    }

    /// Disconnect and drop every pooled connection.
    pub async fn shutdown(&self) {
        let connections: Vec<_> = self.pool.lock().await.drain(..).collect();
        if connections.is_empty() {
            return;
        }
        info!(
            host = %self.host(),
            connections = connections.len(),
            "Shutting down connection pool"
        );
        for connection in connections {
            connection.disconnect().await;
        }
    }

    pub async fn metrics(&self) -> PoolMetrics {
        let pool = self.pool.lock().await;
        self.snapshot(&pool)
    }

    /// Number of pooled connections.
    pub async fn size(&self) -> usize {
        self.pool.lock().await.len()
    }

    /// Current pooled connections, in pool order.
    pub async fn connections(&self) -> Vec<Arc<SshConnection>> {
        self.pool.lock().await.clone()
    }

    fn snapshot(&self, pool: &[Arc<SshConnection>]) -> PoolMetrics {
        let mut metrics = PoolMetrics {
            pool_size: pool.len(),
            active_connections: 0,
            error_connections: 0,
            total_commands: 0,
            total_errors: 0,
            error_rate: 0.0,
            circuit_breaker_status: String::new(),
            recent_errors: 0,
        };
        for connection in pool {
            match connection.state() {
                ConnectionState::Active => metrics.active_connections += 1,
                ConnectionState::Error => metrics.error_connections += 1,
                _ => {}
            }
            let m = connection.metrics();
            metrics.total_commands += m.command_count;
            metrics.total_errors += m.error_count;
        }
        metrics.error_rate = metrics.total_errors as f64 / metrics.total_commands.max(1) as f64;

        let breaker = self.breaker.lock();
        metrics.circuit_breaker_status = breaker.state().to_string();
        metrics.recent_errors = breaker.recent_errors();
        metrics
    }
}

#[async_trait]
impl CommandExecutor for ConnectionManager {
    async fn execute(&self, command: &str) -> Result<CommandOutput> {
        self.execute_command(command, None).await
    }

    async fn execute_with_timeout(
        &self,
        command: &str,
        timeout: Duration,
    ) -> Result<CommandOutput> {
        self.execute_command(command, Some(timeout)).await
    }
}
