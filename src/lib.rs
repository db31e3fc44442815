//! Unraid Prometheus Exporter
//!
//! A Prometheus metrics exporter for Unraid servers, polled over SSH.
//!
//! # Overview
//!
//! Unraid has no metrics API, so the exporter logs in over SSH and runs the
//! same tools an administrator would (`mdcmd`, `df`, `smartctl`, `docker`,
//! `virsh`, `sensors`, `apcaccess`). Output is parsed into typed records and
//! exposed in Prometheus format.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐         SSH          ┌──────────────────┐
//! │   Unraid    │ ◄─────────────────►  │     Exporter     │
//! │             │   pooled sessions    │                  │
//! └─────────────┘                      │  ┌────────────┐  │      HTTP      ┌────────────┐
//!                                      │  │ Conn. pool │  │ ◄────────────► │ Prometheus │
//!                                      │  └────────────┘  │   /metrics     └────────────┘
//!                                      │  ┌────────────┐  │
//!                                      │  │ Collectors │  │
//!                                      │  └────────────┘  │
//!                                      └──────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`unraid`] - SSH pool, circuit breaker, parsers and operations
//! - [`collectors`] - Per-area metric collectors
//! - [`metrics`] - Prometheus metric definitions
//! - [`server`] - HTTP server and collection loop
//! - [`config`] - Configuration management
//! - [`logging`] - Subscriber setup and duplicate suppression
//! - [`error`] - Error types
//!
//! # Quick Start
//!
//! ```no_run
//! use unraid_exporter::{config::Config, server};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/Default.toml")?;
//!     let _logging = config.logging.setup()?;
//!     server::start(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - ✅ Array state, parity sync progress and per-disk status
//! - ✅ SMART health and temperatures without waking spun-down disks
//! - ✅ Docker container and VM states, with start/stop endpoints
//! - ✅ CPU, memory, sensors, network and UPS
//! - ✅ Connection pooling with retry and a circuit breaker

pub mod collectors;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod server;
pub mod unraid;
