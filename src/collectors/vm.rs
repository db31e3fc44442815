//! Virtual Machine Metrics Collector
//!
//! # Metrics Produced
//! - `unraid_vm_service_running` - 1 if libvirt is up
//! - `unraid_vm_state` - VM state (value is always 1)
//!   - Labels: vm, state, os_type
//! - `unraid_vm_running` - 1 if the VM is running or idle
//!   - Labels: vm
//! - `unraid_vm_vcpus` - Labels: vm
//! - `unraid_vm_memory_bytes` - Labels: vm

use super::{collect_with_handler, CollectionContext, CollectionResult};
use crate::error::Result;
use crate::metrics::bool_value;
use crate::unraid::types::VirtualMachine;
use crate::unraid::UnraidClient;

async fn query_vms(client: &UnraidClient) -> Result<(bool, Vec<VirtualMachine>)> {
    if !client.vm().is_running().await? {
        return Ok((false, Vec::new()));
    }
    Ok((true, client.vm().vms().await?))
}

/// Collects libvirt service and VM metrics from Unraid
pub async fn collect_vm_metrics(ctx: &CollectionContext<'_>) -> CollectionResult {
    collect_with_handler("vm", query_vms(ctx.client), |(running, vms)| {
        let m = ctx.metrics;
        m.vm_service_running.set(bool_value(running));

        m.vm_state.reset();
        m.vm_running.reset();
        m.vm_vcpus.reset();
        m.vm_memory_bytes.reset();
        for vm in &vms {
            m.vm_state
                .with_label_values(&[vm.name.as_str(), vm.state.as_str(), vm.os_type.as_str()])
                .set(1);
            m.vm_running
                .with_label_values(&[&vm.name])
                .set(bool_value(vm.state.is_running()));
            if let Some(vcpus) = vm.vcpus {
                m.vm_vcpus.with_label_values(&[&vm.name]).set(vcpus as f64);
            }
            if let Some(memory) = vm.memory_bytes {
                m.vm_memory_bytes
                    .with_label_values(&[&vm.name])
                    .set(memory as f64);
            }
        }
    })
    .await
}
