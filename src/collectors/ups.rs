//! UPS Metrics Collector
//!
//! Reads apcupsd through `apcaccess`. Hosts without a UPS daemon report
//! `unraid_ups_available 0` and nothing else.
//!
//! # Metrics Produced
//! - `unraid_ups_available` - 1 if apcupsd is running
//! - `unraid_ups_info` - UPS information (value is always 1)
//!   - Labels: model, status
//! - `unraid_ups_online` - 1 on line power
//! - `unraid_ups_battery_charge_percent`
//! - `unraid_ups_runtime_minutes`
//! - `unraid_ups_load_percent`
//! - `unraid_ups_load_watts` - Estimated from nominal power and load
//! - `unraid_ups_nominal_power_watts`
//! - `unraid_ups_line_voltage`

use super::{collect_with_handler, CollectionContext, CollectionResult};
use crate::metrics::bool_value;
use prometheus::Gauge;

fn set_optional(gauge: &Gauge, value: Option<f64>) {
    if let Some(value) = value {
        gauge.set(value);
    }
}

/// Collects UPS metrics from Unraid
///
/// # Returns
///
/// * `Ok(CollectionStatus::Success)` - UPS queried, or no UPS present
/// * `Ok(CollectionStatus::Failed)` - The query failed (non-fatal, logged as warning)
pub async fn collect_ups_metrics(ctx: &CollectionContext<'_>) -> CollectionResult {
    collect_with_handler("ups", ctx.client.ups().status(), |status| {
        let m = ctx.metrics;
        m.ups_info.reset();

        let Some(ups) = status else {
            m.ups_available.set(0.0);
            return;
        };

        m.ups_available.set(1.0);
        m.ups_info
            .with_label_values(&[
                ups.model.as_deref().unwrap_or("unknown"),
                ups.status.as_deref().unwrap_or("unknown"),
            ])
            .set(1);
        m.ups_online.set(bool_value(ups.is_online()));
        set_optional(&m.ups_battery_charge_percent, ups.battery_charge_percent);
        set_optional(&m.ups_runtime_minutes, ups.runtime_minutes);
        set_optional(&m.ups_load_percent, ups.load_percent);
        set_optional(&m.ups_load_watts, ups.load_watts());
        set_optional(&m.ups_nominal_power_watts, ups.nominal_power_watts);
        set_optional(&m.ups_line_voltage, ups.line_voltage);
    })
    .await
}
