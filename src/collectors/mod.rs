//! Metrics Collectors
//!
//! This module contains specialized collectors for different areas of an Unraid host.
//! Each collector runs one group of operations over the shared SSH pool and updates
//! the corresponding Prometheus metrics.
//!
//! # Architecture
//!
//! Collectors follow a consistent pattern:
//! - Accept a `CollectionContext` containing shared state
//! - Run commands through the `UnraidClient` operation components
//! - Update Prometheus metrics from the parsed records
//! - Return `CollectionResult` (`Success` or `Failed`)
//!
//! # Error Handling
//!
//! Individual collector failures are non-fatal - they log warnings and return
//! `CollectionStatus::Failed`. Partial metrics are still exposed when one command
//! is unavailable on the host (no UPS daemon, Docker disabled, and so on).

use crate::config::MetricsConfig;
use crate::metrics::MetricsCollector;
use crate::unraid::UnraidClient;
use tracing::{info, warn};

/// Shared context passed to all collectors
///
/// All fields are immutable references, so no invariants can be violated.
#[derive(Clone, Copy)]
pub struct CollectionContext<'a> {
    /// Unraid client whose operations run over the SSH pool
    pub client: &'a UnraidClient,
    /// Metrics collector for updating Prometheus metrics
    pub metrics: &'a MetricsCollector,
    /// Metrics configuration (feature flags, intervals, etc.)
    pub config: &'a MetricsConfig,
}

/// Status of a metrics collection operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionStatus {
    /// Metrics were successfully collected and updated
    Success,
    /// Collection failed but is non-fatal (already logged as warning)
    Failed,
}

impl CollectionStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, CollectionStatus::Success)
    }
}

/// Result type for collector functions
///
/// - `Ok(CollectionStatus::Success)` = Collection succeeded
/// - `Ok(CollectionStatus::Failed)` = Collection failed but non-fatal (logged as warning)
/// - `Err(_)` = Fatal error (should propagate)
pub type CollectionResult = Result<CollectionStatus, anyhow::Error>;

/// Helper to reduce boilerplate in collectors
///
/// Wraps command runs with consistent error handling:
/// - On success: processes data, logs success, returns `CollectionStatus::Success`
/// - On error: logs warning, returns `CollectionStatus::Failed` (non-fatal)
///
/// # Arguments
///
/// * `name` - Name of the metric group being collected (for logging)
/// * `query_future` - Async operation that returns parsed data
/// * `process` - Function to process the data and update metrics
///
/// # Examples
///
/// ```no_run
/// # use unraid_exporter::collectors::*;
/// async fn example(ctx: &CollectionContext<'_>) -> CollectionResult {
///     collect_with_handler(
///         "load average",
///         ctx.client.system().load_average(),
///         |load| {
///             ctx.metrics
///                 .system_load_average
///                 .with_label_values(&["1m"])
///                 .set(load.one);
///         },
///     ).await
/// }
/// ```
pub async fn collect_with_handler<T, F, P, E>(
    name: &str,
    query_future: F,
    process: P,
) -> CollectionResult
where
    F: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: FnOnce(T),
{
    match query_future.await {
        Ok(data) => {
            process(data);
            info!("Updated {} metrics", name);
            Ok(CollectionStatus::Success)
        }
        Err(e) => {
            warn!("Failed to query {}: {}", name, e);
            Ok(CollectionStatus::Failed)
        }
    }
}

// Collector modules
pub mod array;
pub mod connection;
pub mod docker;
pub mod filesystem;
pub mod network;
pub mod smart;
pub mod system;
pub mod temperature;
pub mod ups;
pub mod userscripts;
pub mod vm;

// Re-export collector functions for convenient access
pub use array::collect_array_metrics;
pub use connection::collect_connection_metrics;
pub use docker::collect_docker_metrics;
pub use filesystem::collect_filesystem_metrics;
pub use network::collect_network_metrics;
pub use smart::collect_smart_metrics;
pub use system::collect_system_metrics;
pub use temperature::collect_temperature_metrics;
pub use ups::collect_ups_metrics;
pub use userscripts::collect_userscript_metrics;
pub use vm::collect_vm_metrics;
