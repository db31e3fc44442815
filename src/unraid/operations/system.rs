use crate::error::{ExporterError, Result};
use crate::unraid::executor::CommandExecutor;
use crate::unraid::parsers::{network, sensors, system};
use crate::unraid::types::{InterfaceCounters, LoadAverage, MemoryInfo, SensorReading, SystemIdentity};
use std::sync::Arc;
use tracing::debug;

const IDENTITY_COMMAND: &str = "hostname; uname -r; cat /etc/unraid-version 2>/dev/null || true";
const THERMAL_ZONES_COMMAND: &str =
    "paste <(cat /sys/class/thermal/thermal_zone*/type) <(cat /sys/class/thermal/thermal_zone*/temp)";

#[derive(Clone)]
pub struct SystemOperations {
    executor: Arc<dyn CommandExecutor>,
}

impl SystemOperations {
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self { executor }
    }

    async fn stdout(&self, command: &str) -> Result<String> {
        Ok(self.executor.execute(command).await?.into_success(command)?.stdout)
    }

    pub async fn identity(&self) -> Result<SystemIdentity> {
        let identity = system::parse_system_identity(&self.stdout(IDENTITY_COMMAND).await?);
        if identity.hostname.is_empty() {
            return Err(ExporterError::Parse("empty hostname".to_string()));
        }
        Ok(identity)
    }

    /// Busy CPU percentage from `top`.
    pub async fn cpu_usage(&self) -> Result<f64> {
        let output = self.stdout("top -bn1 | grep 'Cpu(s)'").await?;
        system::parse_top_cpu(&output)
            .ok_or_else(|| ExporterError::Parse(format!("unrecognised top output: {}", output.trim())))
    }

    pub async fn memory(&self) -> Result<MemoryInfo> {
        let memory = system::parse_meminfo(&self.stdout("cat /proc/meminfo").await?);
        if memory.total_bytes == 0 {
            return Err(ExporterError::Parse("MemTotal missing from /proc/meminfo".to_string()));
        }
        Ok(memory)
    }

    pub async fn uptime(&self) -> Result<f64> {
        let output = self.stdout("cat /proc/uptime").await?;
        system::parse_uptime(&output)
            .ok_or_else(|| ExporterError::Parse(format!("unrecognised uptime: {}", output.trim())))
    }

    pub async fn load_average(&self) -> Result<LoadAverage> {
        let output = self.stdout("cat /proc/loadavg").await?;
        system::parse_loadavg(&output)
            .ok_or_else(|| ExporterError::Parse(format!("unrecognised loadavg: {}", output.trim())))
    }

    /// lm-sensors readings, or thermal zones when `sensors` is missing or
    /// reports nothing.
    pub async fn temperatures(&self) -> Result<Vec<SensorReading>> {
        let output = self.executor.execute("sensors").await?;
        if output.success() {
            let readings = sensors::parse_sensors(&output.stdout);
            if !readings.is_empty() {
                return Ok(readings);
            }
        }

        debug!("sensors gave no readings, falling back to thermal zones");
        let output = self.executor.execute(THERMAL_ZONES_COMMAND).await?;
        if !output.success() {
            return Ok(Vec::new());
        }
        Ok(sensors::parse_thermal_zones(&output.stdout))
    }

    /// Counters for `eth*` and `bond*` interfaces.
    pub async fn network_counters(&self) -> Result<Vec<InterfaceCounters>> {
        let output = self.stdout("cat /proc/net/dev").await?;
        Ok(network::parse_proc_net_dev(&output)
            .into_iter()
            .filter(|iface| network::is_monitored_interface(&iface.name))
            .collect())
    }
}
