//! Network Interface Collector
//!
//! Counters from `/proc/net/dev` for `eth*` and `bond*` interfaces.
//!
//! # Metrics Produced
//! - `unraid_network_receive_bytes` - Labels: interface
//! - `unraid_network_transmit_bytes` - Labels: interface
//! - `unraid_network_receive_errors` - Labels: interface
//! - `unraid_network_transmit_errors` - Labels: interface

use super::{collect_with_handler, CollectionContext, CollectionResult};

pub async fn collect_network_metrics(ctx: &CollectionContext<'_>) -> CollectionResult {
    collect_with_handler("network", ctx.client.system().network_counters(), |interfaces| {
        for iface in interfaces {
            let labels = [iface.name.as_str()];
            ctx.metrics
                .network_receive_bytes
                .with_label_values(&labels)
                .set(iface.rx_bytes as f64);
            ctx.metrics
                .network_transmit_bytes
                .with_label_values(&labels)
                .set(iface.tx_bytes as f64);
            ctx.metrics
                .network_receive_errors
                .with_label_values(&labels)
                .set(iface.rx_errors as f64);
            ctx.metrics
                .network_transmit_errors
                .with_label_values(&labels)
                .set(iface.tx_errors as f64);
        }
    })
    .await
}
