//! Array Metrics Collector
//!
//! Collects md array state, parity sync progress and per-slot disk status
//! from `mdcmd status`.
//!
//! # Metrics Produced
//! - `unraid_array_state` - Array state summary (value is always 1)
//!   - Labels: state (`started`, `stopped`, `syncing_check`, ...)
//! - `unraid_array_started` - 1 if the array is started
//! - `unraid_array_disks` - Disk counts
//!   - Labels: kind (total, disabled, invalid, missing)
//! - `unraid_array_sync_active` - 1 while a parity sync or check runs
//! - `unraid_array_sync_progress_percent` - Progress of the running sync
//! - `unraid_array_sync_errors` - Errors found by the current or last sync
//! - `unraid_array_last_sync_timestamp_seconds` - Completion time of the last sync
//! - `unraid_array_disk_status` - Slot status (value is always 1)
//!   - Labels: disk, device, status
//! - `unraid_array_disk_healthy` - 1 if the slot reports DISK_OK
//!   - Labels: disk
//! - `unraid_array_disk_errors` - md driver error count
//!   - Labels: disk
//! - `unraid_array_disk_size_bytes` - Device size
//!   - Labels: disk

use super::{collect_with_handler, CollectionContext, CollectionResult};
use crate::metrics::bool_value;

/// Collects array metrics from Unraid
///
/// # Arguments
///
/// * `ctx` - Collection context containing the Unraid client and metrics collector
///
/// # Returns
///
/// * `Ok(CollectionStatus::Success)` - Successfully collected array metrics
/// * `Ok(CollectionStatus::Failed)` - Failed to collect metrics (non-fatal, logged as warning)
/// * `Err(_)` - Fatal error that should propagate
pub async fn collect_array_metrics(ctx: &CollectionContext<'_>) -> CollectionResult {
    collect_with_handler("array", ctx.client.disk().array_status(), |array| {
        let m = ctx.metrics;

        // Only the current state should carry a series
        m.array_state.reset();
        m.array_state.with_label_values(&[&array.summary()]).set(1);
        m.array_started.set(bool_value(array.is_started()));

        m.array_disks
            .with_label_values(&["total"])
            .set(array.num_disks as f64);
        m.array_disks
            .with_label_values(&["disabled"])
            .set(array.num_disabled as f64);
        m.array_disks
            .with_label_values(&["invalid"])
            .set(array.num_invalid as f64);
        m.array_disks
            .with_label_values(&["missing"])
            .set(array.num_missing as f64);

        m.array_sync_active.set(bool_value(array.sync_active));
        m.array_sync_progress_percent
            .set(array.sync_progress.unwrap_or(0.0));
        m.array_sync_errors.set(array.sync_errors as f64);
        if let Some(last_sync) = array.last_sync {
            m.array_last_sync_timestamp_seconds.set(last_sync as f64);
        }

        m.array_disk_status.reset();
        for disk in &array.disks {
            let device = disk.device.as_deref().unwrap_or("");
            m.array_disk_status
                .with_label_values(&[disk.name.as_str(), device, disk.status.as_str()])
                .set(1);
            m.array_disk_healthy
                .with_label_values(&[&disk.name])
                .set(bool_value(disk.is_ok()));
            m.array_disk_errors
                .with_label_values(&[&disk.name])
                .set(disk.errors as f64);
            m.array_disk_size_bytes
                .with_label_values(&[&disk.name])
                .set(disk.size_bytes as f64);
        }
    })
    .await
}
