use crate::logging::LoggingConfig;
use anyhow::{bail, Context, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub unraid: UnraidConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UnraidConfig {
    pub host: String,
    #[serde(default = "default_ssh_port")]
    pub port: u16,
    #[serde(default = "default_username")]
    pub username: String,
    pub password: SecretString,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_addr")]
    pub addr: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MetricsConfig {
    #[serde(default = "default_scrape_interval")]
    pub scrape_interval_seconds: u64,
    #[serde(default = "default_true")]
    pub collect_smart_metrics: bool,
    #[serde(default = "default_true")]
    pub collect_docker_metrics: bool,
    #[serde(default = "default_true")]
    pub collect_vm_metrics: bool,
    #[serde(default = "default_true")]
    pub collect_ups_metrics: bool,
    #[serde(default = "default_true")]
    pub collect_userscript_metrics: bool,
}

/// Connection pool, retry and circuit breaker tuning.
#[derive(Debug, Deserialize, Clone)]
pub struct PoolConfig {
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
    #[serde(default = "default_min_idle")]
    pub min_idle: usize,
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_seconds: u64,
    #[serde(default = "default_command_timeout")]
    pub command_timeout_seconds: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
    #[serde(default = "default_keepalive_interval")]
    pub keepalive_interval_seconds: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_seconds: f64,
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,
    #[serde(default = "default_max_backoff")]
    pub max_backoff_seconds: f64,
    #[serde(default = "default_circuit_breaker_threshold")]
    pub circuit_breaker_threshold: usize,
    #[serde(default = "default_circuit_breaker_window")]
    pub circuit_breaker_window_seconds: u64,
}

fn default_ssh_port() -> u16 {
    22
}

fn default_username() -> String {
    "root".to_string()
}

fn default_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    9100
}

fn default_scrape_interval() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

fn default_pool_size() -> usize {
    3
}

fn default_min_idle() -> usize {
    1
}

fn default_max_lifetime() -> u64 {
    300
}

fn default_command_timeout() -> u64 {
    60
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_keepalive_interval() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    2
}

fn default_initial_backoff() -> f64 {
    1.0
}

fn default_backoff_factor() -> f64 {
    2.0
}

fn default_max_backoff() -> f64 {
    300.0
}

fn default_circuit_breaker_threshold() -> usize {
    5
}

fn default_circuit_breaker_window() -> u64 {
    60
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            port: default_port(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            scrape_interval_seconds: default_scrape_interval(),
            collect_smart_metrics: true,
            collect_docker_metrics: true,
            collect_vm_metrics: true,
            collect_ups_metrics: true,
            collect_userscript_metrics: true,
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            pool_size: default_pool_size(),
            min_idle: default_min_idle(),
            max_lifetime_seconds: default_max_lifetime(),
            command_timeout_seconds: default_command_timeout(),
            connect_timeout_seconds: default_connect_timeout(),
            keepalive_interval_seconds: default_keepalive_interval(),
            max_retries: default_max_retries(),
            initial_backoff_seconds: default_initial_backoff(),
            backoff_factor: default_backoff_factor(),
            max_backoff_seconds: default_max_backoff(),
            circuit_breaker_threshold: default_circuit_breaker_threshold(),
            circuit_breaker_window_seconds: default_circuit_breaker_window(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        // Load environment variables from .env if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("UNRAID_EXPORTER").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Reject settings the pool and collection loop cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.unraid.host.trim().is_empty() {
            bail!("unraid.host must not be empty");
        }
        if self.unraid.password.expose_secret().is_empty() {
            bail!("unraid.password must be set (UNRAID_PASSWORD)");
        }
        if self.pool.pool_size == 0 {
            bail!("pool.pool_size must be at least 1");
        }
        if self.pool.min_idle > self.pool.pool_size {
            bail!(
                "pool.min_idle ({}) exceeds pool.pool_size ({})",
                self.pool.min_idle,
                self.pool.pool_size
            );
        }
        if self.pool.backoff_factor.is_nan() || self.pool.backoff_factor < 1.0 {
            bail!("pool.backoff_factor must be >= 1.0");
        }
        let (initial, max) = (
            self.pool.initial_backoff_seconds,
            self.pool.max_backoff_seconds,
        );
        if !initial.is_finite() || !max.is_finite() || initial < 0.0 || max < initial {
            bail!("pool backoff bounds must satisfy 0 <= initial <= max");
        }
        if self.pool.circuit_breaker_threshold == 0 {
            bail!("pool.circuit_breaker_threshold must be at least 1");
        }
        if self.metrics.scrape_interval_seconds == 0 {
            bail!("metrics.scrape_interval_seconds must be at least 1");
        }
        Ok(())
    }
}
