//! SSH Connection Pool Collector
//!
//! Reports the exporter's own pool health. Runs no remote commands, so it
//! always succeeds and does not count towards `unraid_up`.
//!
//! # Metrics Produced
//! - `unraid_ssh_pool_connections` - Labels: state (total, active, error)
//! - `unraid_ssh_pool_commands` - Commands completed by pooled connections
//! - `unraid_ssh_pool_errors` - Errors recorded by pooled connections
//! - `unraid_ssh_pool_error_rate` - Errors per command
//! - `unraid_ssh_pool_circuit_open` - 1 while the circuit breaker is open
//! - `unraid_ssh_pool_recent_errors` - Errors inside the breaker window

use super::{CollectionContext, CollectionResult, CollectionStatus};
use crate::metrics::bool_value;
use tracing::debug;

pub async fn collect_connection_metrics(ctx: &CollectionContext<'_>) -> CollectionResult {
    let pool = ctx.client.pool_metrics().await;
    let m = ctx.metrics;

    m.ssh_pool_connections
        .with_label_values(&["total"])
        .set(pool.pool_size as f64);
    m.ssh_pool_connections
        .with_label_values(&["active"])
        .set(pool.active_connections as f64);
    m.ssh_pool_connections
        .with_label_values(&["error"])
        .set(pool.error_connections as f64);
    m.ssh_pool_commands.set(pool.total_commands as f64);
    m.ssh_pool_errors.set(pool.total_errors as f64);
    m.ssh_pool_error_rate.set(pool.error_rate);
    m.ssh_pool_circuit_open
        .set(bool_value(pool.circuit_breaker_status == "open"));
    m.ssh_pool_recent_errors.set(pool.recent_errors as f64);

    debug!(
        pool_size = pool.pool_size,
        active = pool.active_connections,
        circuit = %pool.circuit_breaker_status,
        "Updated connection pool metrics"
    );
    Ok(CollectionStatus::Success)
}
