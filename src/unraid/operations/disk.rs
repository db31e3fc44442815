use super::shell_quote;
use crate::error::{ExporterError, Result};
use crate::unraid::executor::CommandExecutor;
use crate::unraid::parsers::{array, disk, smart};
use crate::unraid::types::{ArrayStatus, FilesystemUsage, SmartReport};
use std::sync::Arc;

/// Mounts reported by [`DiskOperations::filesystem_usage`].
pub const MONITORED_MOUNTS: &[&str] = &["/mnt/user", "/mnt/cache", "/boot", "/var/log", "/var/lib/docker"];

#[derive(Clone)]
pub struct DiskOperations {
    executor: Arc<dyn CommandExecutor>,
}

impl DiskOperations {
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self { executor }
    }

    pub async fn array_status(&self) -> Result<ArrayStatus> {
        let command = "mdcmd status";
        let output = self.executor.execute(command).await?.into_success(command)?;
        let status = array::parse_mdcmd_status(&output.stdout);
        if status.state.is_empty() {
            return Err(ExporterError::Parse("mdcmd status reported no mdState".to_string()));
        }
        Ok(status)
    }

    /// Usage of the standard Unraid mounts. Mounts that don't exist (no
    /// cache pool, docker disabled) are simply absent from the result.
    pub async fn filesystem_usage(&self) -> Result<Vec<FilesystemUsage>> {
        let command = format!("df -kP {} 2>/dev/null", MONITORED_MOUNTS.join(" "));
        let output = self.executor.execute(&command).await?;
        let usage = disk::parse_df(&output.stdout);
        if usage.is_empty() && !output.success() {
            output.into_success(&command)?;
        }
        Ok(usage)
    }

    /// SMART report for `device` (`sdb` or `/dev/sdb`). Spun-down disks are
    /// not woken and come back with `standby` set.
    pub async fn smart_report(&self, device: &str) -> Result<SmartReport> {
        let path = if device.starts_with("/dev/") {
            device.to_string()
        } else {
            format!("/dev/{device}")
        };
        let command = format!("smartctl -n standby -i -H -A {}", shell_quote(&path));
        let output = self.executor.execute(&command).await?;

        // smartctl's exit status is a bitmask of warnings; only an empty
        // answer is a failure.
        if output.stdout.trim().is_empty() {
            output.into_success(&command)?;
            return Err(ExporterError::Parse(format!("smartctl printed nothing for {path}")));
        }
        Ok(smart::parse_smartctl(&output.stdout))
    }
}
