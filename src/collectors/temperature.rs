//! Temperature Sensor Collector
//!
//! Reads lm-sensors, falling back to `/sys/class/thermal` zones.
//!
//! # Metrics Produced
//! - `unraid_sensor_temperature_celsius` - Labels: chip, sensor

use super::{collect_with_handler, CollectionContext, CollectionResult};

pub async fn collect_temperature_metrics(ctx: &CollectionContext<'_>) -> CollectionResult {
    collect_with_handler("temperature", ctx.client.system().temperatures(), |readings| {
        for reading in readings {
            ctx.metrics
                .sensor_temperature_celsius
                .with_label_values(&[&reading.chip, &reading.label])
                .set(reading.celsius);
        }
    })
    .await
}
