//! System Metrics Collector
//!
//! Collects host identity, CPU, memory, uptime and load average. Each
//! reading is its own command; the collector succeeds when any of them do.
//!
//! # Metrics Produced
//! - `unraid_system_info` - System information (value is always 1)
//!   - Labels: hostname, kernel, version
//! - `unraid_system_cpu_usage_percent` - CPU busy percentage from `top`
//! - `unraid_system_memory_bytes` - Memory by type
//!   - Labels: type (total, free, available, used, buffers, cached)
//! - `unraid_system_memory_used_percent` - Memory in use excluding cache
//! - `unraid_system_uptime_seconds` - Seconds since boot
//! - `unraid_system_load_average` - Labels: period (1m, 5m, 15m)

use super::{collect_with_handler, CollectionContext, CollectionResult, CollectionStatus};

/// Collects system metrics from Unraid
///
/// # Arguments
///
/// * `ctx` - Collection context containing the Unraid client and metrics collector
///
/// # Returns
///
/// * `Ok(CollectionStatus::Success)` - At least one system reading was updated
/// * `Ok(CollectionStatus::Failed)` - Every system command failed (logged as warnings)
/// * `Err(_)` - Fatal error that should propagate
pub async fn collect_system_metrics(ctx: &CollectionContext<'_>) -> CollectionResult {
    let system = ctx.client.system();
    let m = ctx.metrics;

    let statuses = [
        collect_with_handler("system info", system.identity(), |identity| {
            m.system_info.reset();
            m.system_info
                .with_label_values(&[
                    identity.hostname.as_str(),
                    identity.kernel.as_str(),
                    identity.unraid_version.as_deref().unwrap_or("unknown"),
                ])
                .set(1);
        })
        .await?,
        collect_with_handler("cpu", system.cpu_usage(), |percent| {
            m.system_cpu_usage_percent.set(percent);
        })
        .await?,
        collect_with_handler("memory", system.memory(), |memory| {
            for (kind, bytes) in [
                ("total", memory.total_bytes),
                ("free", memory.free_bytes),
                ("available", memory.available_bytes),
                ("used", memory.used_bytes()),
                ("buffers", memory.buffers_bytes),
                ("cached", memory.cached_bytes),
            ] {
                m.system_memory_bytes
                    .with_label_values(&[kind])
                    .set(bytes as f64);
            }
            m.system_memory_used_percent.set(memory.used_percent());
        })
        .await?,
        collect_with_handler("uptime", system.uptime(), |seconds| {
            m.system_uptime_seconds.set(seconds);
        })
        .await?,
        collect_with_handler("load average", system.load_average(), |load| {
            m.system_load_average.with_label_values(&["1m"]).set(load.one);
            m.system_load_average.with_label_values(&["5m"]).set(load.five);
            m.system_load_average
                .with_label_values(&["15m"])
                .set(load.fifteen);
        })
        .await?,
    ];

    if statuses.iter().any(CollectionStatus::is_success) {
        Ok(CollectionStatus::Success)
    } else {
        Ok(CollectionStatus::Failed)
    }
}
