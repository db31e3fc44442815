//! Prometheus Metrics Definitions
//!
//! This module defines all Prometheus metrics exposed by the Unraid exporter.
//!
//! # Metric Categories
//!
//! ## Storage
//! - Array state, parity/sync progress and per-slot disk status
//! - Filesystem usage of the standard Unraid mounts
//! - SMART health, temperature and power-on hours per disk
//!
//! ## Workloads
//! - Docker service and container states
//! - libvirt service and VM states, vCPUs and memory
//! - Scripts configured in the User Scripts plugin
//!
//! ## System Health
//! - CPU, memory, uptime and load average
//! - Temperature sensors
//! - Network interface counters
//! - UPS status via apcupsd
//!
//! ## Exporter
//! - SSH connection pool health and circuit breaker state
//! - Per-collector success and `unraid_up`
//!
//! All metrics use the `unraid_` namespace prefix.

use prometheus::{Encoder, Gauge, GaugeVec, IntGaugeVec, Opts, Registry, TextEncoder};
use std::sync::Arc;

const NAMESPACE: &str = "unraid";

/// Metrics collector for Unraid
#[derive(Clone)]
pub struct MetricsCollector {
    registry: Arc<Registry>,

    // Array metrics
    pub array_state: Arc<IntGaugeVec>,
    pub array_started: Arc<Gauge>,
    pub array_disks: Arc<GaugeVec>,
    pub array_sync_active: Arc<Gauge>,
    pub array_sync_progress_percent: Arc<Gauge>,
    pub array_sync_errors: Arc<Gauge>,
    pub array_last_sync_timestamp_seconds: Arc<Gauge>,
    pub array_disk_status: Arc<IntGaugeVec>,
    pub array_disk_healthy: Arc<GaugeVec>,
    pub array_disk_errors: Arc<GaugeVec>,
    pub array_disk_size_bytes: Arc<GaugeVec>,

    // Filesystem metrics
    pub filesystem_size_bytes: Arc<GaugeVec>,
    pub filesystem_used_bytes: Arc<GaugeVec>,
    pub filesystem_available_bytes: Arc<GaugeVec>,
    pub filesystem_used_percent: Arc<GaugeVec>,

    // SMART metrics
    pub disk_info: Arc<IntGaugeVec>,
    pub disk_smart_healthy: Arc<GaugeVec>,
    pub disk_temperature_celsius: Arc<GaugeVec>,
    pub disk_power_on_hours: Arc<GaugeVec>,
    pub disk_standby: Arc<GaugeVec>,

    // Docker metrics
    pub docker_service_running: Arc<Gauge>,
    pub container_state: Arc<IntGaugeVec>,
    pub container_running: Arc<GaugeVec>,
    pub containers: Arc<GaugeVec>,

    // VM metrics
    pub vm_service_running: Arc<Gauge>,
    pub vm_state: Arc<IntGaugeVec>,
    pub vm_running: Arc<GaugeVec>,
    pub vm_vcpus: Arc<GaugeVec>,
    pub vm_memory_bytes: Arc<GaugeVec>,
    pub user_scripts: Arc<Gauge>,
    pub user_script_info: Arc<IntGaugeVec>,

    // System metrics
    pub system_info: Arc<IntGaugeVec>,
    pub system_uptime_seconds: Arc<Gauge>,
    pub system_cpu_usage_percent: Arc<Gauge>,
    pub system_memory_bytes: Arc<GaugeVec>,
    pub system_memory_used_percent: Arc<Gauge>,
    pub system_load_average: Arc<GaugeVec>,
    pub sensor_temperature_celsius: Arc<GaugeVec>,

    // Network
    pub network_receive_bytes: Arc<GaugeVec>,
    pub network_transmit_bytes: Arc<GaugeVec>,
    pub network_receive_errors: Arc<GaugeVec>,
    pub network_transmit_errors: Arc<GaugeVec>,

    // UPS
    pub ups_available: Arc<Gauge>,
    pub ups_info: Arc<IntGaugeVec>,
    pub ups_online: Arc<Gauge>,
    pub ups_battery_charge_percent: Arc<Gauge>,
    pub ups_runtime_minutes: Arc<Gauge>,
    pub ups_load_percent: Arc<Gauge>,
    pub ups_load_watts: Arc<Gauge>,
    pub ups_nominal_power_watts: Arc<Gauge>,
    pub ups_line_voltage: Arc<Gauge>,

    // Exporter
    pub ssh_pool_connections: Arc<GaugeVec>,
    pub ssh_pool_commands: Arc<Gauge>,
    pub ssh_pool_errors: Arc<Gauge>,
    pub ssh_pool_error_rate: Arc<Gauge>,
    pub ssh_pool_circuit_open: Arc<Gauge>,
    pub ssh_pool_recent_errors: Arc<Gauge>,
    pub collector_success: Arc<GaugeVec>,
    pub up: Arc<Gauge>,
}

fn gauge(registry: &Registry, name: &str, help: &str) -> anyhow::Result<Arc<Gauge>> {
    let metric = Gauge::with_opts(Opts::new(name, help).namespace(NAMESPACE))?;
    registry.register(Box::new(metric.clone()))?;
    Ok(Arc::new(metric))
}

fn gauge_vec(
    registry: &Registry,
    name: &str,
    help: &str,
    labels: &[&str],
) -> anyhow::Result<Arc<GaugeVec>> {
    let metric = GaugeVec::new(Opts::new(name, help).namespace(NAMESPACE), labels)?;
    registry.register(Box::new(metric.clone()))?;
    Ok(Arc::new(metric))
}

fn int_gauge_vec(
    registry: &Registry,
    name: &str,
    help: &str,
    labels: &[&str],
) -> anyhow::Result<Arc<IntGaugeVec>> {
    let metric = IntGaugeVec::new(Opts::new(name, help).namespace(NAMESPACE), labels)?;
    registry.register(Box::new(metric.clone()))?;
    Ok(Arc::new(metric))
}

impl MetricsCollector {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();
        let r = &registry;

        Ok(Self {
            // Array metrics
            array_state: int_gauge_vec(
                r,
                "array_state",
                "Array state (value is always 1)",
                &["state"],
            )?,
            array_started: gauge(r, "array_started", "Whether the array is started (1=started, 0=not started)")?,
            array_disks: gauge_vec(
                r,
                "array_disks",
                "Array disk counts reported by mdcmd",
                &["kind"],
            )?,
            array_sync_active: gauge(r, "array_sync_active", "Whether a parity sync or check is running")?,
            array_sync_progress_percent: gauge(
                r,
                "array_sync_progress_percent",
                "Progress of the running parity sync or check",
            )?,
            array_sync_errors: gauge(
                r,
                "array_sync_errors",
                "Sync errors corrected or found by the current or last sync",
            )?,
            array_last_sync_timestamp_seconds: gauge(
                r,
                "array_last_sync_timestamp_seconds",
                "Unix time of the last completed parity sync",
            )?,
            array_disk_status: int_gauge_vec(
                r,
                "array_disk_status",
                "Array slot status (value is always 1)",
                &["disk", "device", "status"],
            )?,
            array_disk_healthy: gauge_vec(
                r,
                "array_disk_healthy",
                "Whether the array slot reports DISK_OK (1=ok, 0=not ok)",
                &["disk"],
            )?,
            array_disk_errors: gauge_vec(
                r,
                "array_disk_errors",
                "Read/write errors counted by the md driver",
                &["disk"],
            )?,
            array_disk_size_bytes: gauge_vec(
                r,
                "array_disk_size_bytes",
                "Size of the array slot's device",
                &["disk"],
            )?,

            // Filesystem metrics
            filesystem_size_bytes: gauge_vec(
                r,
                "filesystem_size_bytes",
                "Filesystem size",
                &["mount"],
            )?,
            filesystem_used_bytes: gauge_vec(
                r,
                "filesystem_used_bytes",
                "Filesystem space used",
                &["mount"],
            )?,
            filesystem_available_bytes: gauge_vec(
                r,
                "filesystem_available_bytes",
                "Filesystem space available",
                &["mount"],
            )?,
            filesystem_used_percent: gauge_vec(
                r,
                "filesystem_used_percent",
                "Filesystem usage as reported by df",
                &["mount"],
            )?,

            // SMART metrics
            disk_info: int_gauge_vec(
                r,
                "disk_info",
                "Disk information (value is always 1)",
                &["disk", "device", "model", "serial"],
            )?,
            disk_smart_healthy: gauge_vec(
                r,
                "disk_smart_healthy",
                "SMART overall health (1=passed, 0=failed)",
                &["disk", "device"],
            )?,
            disk_temperature_celsius: gauge_vec(
                r,
                "disk_temperature_celsius",
                "Disk temperature from SMART",
                &["disk", "device"],
            )?,
            disk_power_on_hours: gauge_vec(
                r,
                "disk_power_on_hours",
                "Disk power-on hours from SMART",
                &["disk", "device"],
            )?,
            disk_standby: gauge_vec(
                r,
                "disk_standby",
                "Whether the disk was spun down when polled (1=standby)",
                &["disk", "device"],
            )?,

            // Docker metrics
            docker_service_running: gauge(
                r,
                "docker_service_running",
                "Whether the Docker service is running",
            )?,
            container_state: int_gauge_vec(
                r,
                "container_state",
                "Container state (value is always 1)",
                &["container", "image", "state"],
            )?,
            container_running: gauge_vec(
                r,
                "container_running",
                "Whether the container is running (1=running, 0=not running)",
                &["container"],
            )?,
            containers: gauge_vec(
                r,
                "containers",
                "Number of containers by state",
                &["state"],
            )?,

            // VM metrics
            vm_service_running: gauge(r, "vm_service_running", "Whether libvirt is running")?,
            vm_state: int_gauge_vec(
                r,
                "vm_state",
                "VM state (value is always 1)",
                &["vm", "state", "os_type"],
            )?,
            vm_running: gauge_vec(
                r,
                "vm_running",
                "Whether the VM is running (1=running, 0=not running)",
                &["vm"],
            )?,
            vm_vcpus: gauge_vec(r, "vm_vcpus", "Virtual CPUs assigned to the VM", &["vm"])?,
            vm_memory_bytes: gauge_vec(
                r,
                "vm_memory_bytes",
                "Maximum memory assigned to the VM",
                &["vm"],
            )?,
            user_scripts: gauge(r, "user_scripts", "Scripts configured in the User Scripts plugin")?,
            user_script_info: int_gauge_vec(
                r,
                "user_script_info",
                "User script present (value is always 1)",
                &["script"],
            )?,

            // System metrics
            system_info: int_gauge_vec(
                r,
                "system_info",
                "Unraid system information (value is always 1)",
                &["hostname", "kernel", "version"],
            )?,
            system_uptime_seconds: gauge(r, "system_uptime_seconds", "System uptime in seconds")?,
            system_cpu_usage_percent: gauge(
                r,
                "system_cpu_usage_percent",
                "CPU busy percentage",
            )?,
            system_memory_bytes: gauge_vec(
                r,
                "system_memory_bytes",
                "Memory by type",
                &["type"],
            )?,
            system_memory_used_percent: gauge(
                r,
                "system_memory_used_percent",
                "Memory in use excluding reclaimable cache",
            )?,
            system_load_average: gauge_vec(
                r,
                "system_load_average",
                "System load average",
                &["period"],
            )?,
            sensor_temperature_celsius: gauge_vec(
                r,
                "sensor_temperature_celsius",
                "Hardware sensor temperature",
                &["chip", "sensor"],
            )?,

            // Network
            network_receive_bytes: gauge_vec(
                r,
                "network_receive_bytes",
                "Bytes received since boot",
                &["interface"],
            )?,
            network_transmit_bytes: gauge_vec(
                r,
                "network_transmit_bytes",
                "Bytes transmitted since boot",
                &["interface"],
            )?,
            network_receive_errors: gauge_vec(
                r,
                "network_receive_errors",
                "Receive errors since boot",
                &["interface"],
            )?,
            network_transmit_errors: gauge_vec(
                r,
                "network_transmit_errors",
                "Transmit errors since boot",
                &["interface"],
            )?,

            // UPS
            ups_available: gauge(r, "ups_available", "Whether apcupsd is installed and running")?,
            ups_info: int_gauge_vec(
                r,
                "ups_info",
                "UPS information (value is always 1)",
                &["model", "status"],
            )?,
            ups_online: gauge(r, "ups_online", "Whether the UPS is on line power")?,
            ups_battery_charge_percent: gauge(
                r,
                "ups_battery_charge_percent",
                "UPS battery charge",
            )?,
            ups_runtime_minutes: gauge(r, "ups_runtime_minutes", "Estimated UPS runtime on battery")?,
            ups_load_percent: gauge(r, "ups_load_percent", "UPS load as a share of capacity")?,
            ups_load_watts: gauge(r, "ups_load_watts", "UPS load estimated from nominal power")?,
            ups_nominal_power_watts: gauge(r, "ups_nominal_power_watts", "UPS nominal power")?,
            ups_line_voltage: gauge(r, "ups_line_voltage", "UPS input line voltage")?,

            // Exporter
            ssh_pool_connections: gauge_vec(
                r,
                "ssh_pool_connections",
                "Pooled SSH connections by state",
                &["state"],
            )?,
            ssh_pool_commands: gauge(
                r,
                "ssh_pool_commands",
                "Commands completed by currently pooled connections",
            )?,
            ssh_pool_errors: gauge(
                r,
                "ssh_pool_errors",
                "Errors recorded by currently pooled connections",
            )?,
            ssh_pool_error_rate: gauge(
                r,
                "ssh_pool_error_rate",
                "Errors per command across pooled connections",
            )?,
            ssh_pool_circuit_open: gauge(
                r,
                "ssh_pool_circuit_open",
                "Whether the SSH circuit breaker is open",
            )?,
            ssh_pool_recent_errors: gauge(
                r,
                "ssh_pool_recent_errors",
                "Errors inside the circuit breaker window",
            )?,
            collector_success: gauge_vec(
                r,
                "collector_success",
                "Whether the collector succeeded on the last run",
                &["collector"],
            )?,
            up: gauge(r, "up", "Whether the Unraid host is reachable over SSH (1=up, 0=down)")?,

            registry: Arc::new(registry),
        })
    }

    /// Render metrics in Prometheus text format
    pub fn render(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// 1.0 for true, 0.0 for false.
pub fn bool_value(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}
