//! SMART Metrics Collector
//!
//! Queries `smartctl` for every array slot with a block device. Spun-down
//! disks are not woken; they report `unraid_disk_standby 1` and nothing else
//! until they spin up again. Every series is rebuilt on each run, so disks
//! removed from the array disappear.
//!
//! # Metrics Produced
//! - `unraid_disk_info` - Disk information (value is always 1)
//!   - Labels: disk, device, model, serial
//! - `unraid_disk_smart_healthy` - SMART overall health (1=passed, 0=failed)
//!   - Labels: disk, device
//! - `unraid_disk_temperature_celsius` - Labels: disk, device
//! - `unraid_disk_power_on_hours` - Labels: disk, device
//! - `unraid_disk_standby` - 1 if the disk was spun down
//!   - Labels: disk, device

use super::{CollectionContext, CollectionResult, CollectionStatus};
use crate::metrics::bool_value;
use tracing::{debug, info, warn};

/// Collects SMART metrics for each array disk
///
/// # Arguments
///
/// * `ctx` - Collection context containing the Unraid client and metrics collector
///
/// # Returns
///
/// * `Ok(CollectionStatus::Success)` - At least one disk was queried
/// * `Ok(CollectionStatus::Failed)` - The array listing or every SMART query failed
/// * `Err(_)` - Fatal error that should propagate
///
/// # Note
///
/// A failure on one disk is logged at debug and does not fail the collector.
pub async fn collect_smart_metrics(ctx: &CollectionContext<'_>) -> CollectionResult {
    let array = match ctx.client.disk().array_status().await {
        Ok(array) => array,
        Err(e) => {
            warn!("Failed to query SMART disk list: {}", e);
            return Ok(CollectionStatus::Failed);
        }
    };

    let m = ctx.metrics;
    m.disk_standby.reset();
    m.disk_info.reset();
    m.disk_smart_healthy.reset();
    m.disk_temperature_celsius.reset();
    m.disk_power_on_hours.reset();

    let mut queried = 0usize;
    let mut attempted = 0usize;
    for disk in &array.disks {
        let Some(device) = disk.device.as_deref() else {
            continue;
        };
        attempted += 1;

        let report = match ctx.client.disk().smart_report(device).await {
            Ok(report) => report,
            Err(e) => {
                debug!(disk = %disk.name, device, error = %e, "SMART query failed");
                continue;
            }
        };
        queried += 1;

        let labels = [disk.name.as_str(), device];
        ctx.metrics
            .disk_standby
            .with_label_values(&labels)
            .set(bool_value(report.standby));
        if report.standby {
            continue;
        }

        if let (Some(model), Some(serial)) = (&report.model, &report.serial) {
            ctx.metrics
                .disk_info
                .with_label_values(&[disk.name.as_str(), device, model.as_str(), serial.as_str()])
                .set(1);
        }
        if let Some(passed) = report.passed {
            ctx.metrics
                .disk_smart_healthy
                .with_label_values(&labels)
                .set(bool_value(passed));
        }
        if let Some(temperature) = report.temperature {
            ctx.metrics
                .disk_temperature_celsius
                .with_label_values(&labels)
                .set(temperature as f64);
        }
        if let Some(hours) = report.power_on_hours {
            ctx.metrics
                .disk_power_on_hours
                .with_label_values(&labels)
                .set(hours as f64);
        }
    }

    if attempted > 0 && queried == 0 {
        warn!("Failed to query SMART data for any of {} disks", attempted);
        return Ok(CollectionStatus::Failed);
    }

    info!("Updated SMART metrics for {} disks", queried);
    Ok(CollectionStatus::Success)
}
