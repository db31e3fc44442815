//! Filesystem Usage Collector
//!
//! Collects `df` usage for the standard Unraid mounts (`/mnt/user`,
//! `/mnt/cache`, `/boot`, `/var/log`, `/var/lib/docker`).
//!
//! # Metrics Produced
//! - `unraid_filesystem_size_bytes` - Labels: mount
//! - `unraid_filesystem_used_bytes` - Labels: mount
//! - `unraid_filesystem_available_bytes` - Labels: mount
//! - `unraid_filesystem_used_percent` - Labels: mount

use super::{collect_with_handler, CollectionContext, CollectionResult};

/// Collects filesystem usage metrics from Unraid
///
/// Mounts missing on the host produce no series.
pub async fn collect_filesystem_metrics(ctx: &CollectionContext<'_>) -> CollectionResult {
    collect_with_handler("filesystem", ctx.client.disk().filesystem_usage(), |usage| {
        for fs in usage {
            let labels = [fs.mount_point.as_str()];
            ctx.metrics
                .filesystem_size_bytes
                .with_label_values(&labels)
                .set(fs.total_bytes as f64);
            ctx.metrics
                .filesystem_used_bytes
                .with_label_values(&labels)
                .set(fs.used_bytes as f64);
            ctx.metrics
                .filesystem_available_bytes
                .with_label_values(&labels)
                .set(fs.available_bytes as f64);
            ctx.metrics
                .filesystem_used_percent
                .with_label_values(&labels)
                .set(fs.use_percent);
        }
    })
    .await
}
