use super::{service_running, shell_quote};
use crate::error::{ExporterError, Result};
use crate::unraid::executor::CommandExecutor;
use crate::unraid::parsers::vm::{self, LIBVIRT_NOT_RUNNING};
use crate::unraid::types::VirtualMachine;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

/// One `name§§§state§§§cpus§§§memory§§§os-xml` line per domain.
const VM_DETAILS_SCRIPT: &str = concat!(
    "if [ -x /etc/rc.d/rc.libvirt ] && /etc/rc.d/rc.libvirt status | grep -q 'is currently running'; then ",
    "virsh list --all --name | while IFS= read -r vm; do ",
    "if [ -n \"$vm\" ]; then ",
    "state=$(virsh domstate \"$vm\" 2>/dev/null || echo 'unknown'); ",
    "info=$(virsh dominfo \"$vm\" 2>/dev/null); ",
    "cpus=$(echo \"$info\" | grep 'CPU(s)' | awk '{print $2}' | head -1); ",
    "mem=$(echo \"$info\" | grep 'Max memory' | sed 's/Max memory://g' | xargs | head -1); ",
    "xml=$(virsh dumpxml \"$vm\" 2>/dev/null | grep -A5 '<os>' | tr '\\n' ' '); ",
    "echo \"$vm§§§$state§§§$cpus§§§$mem§§§$xml\"; ",
    "fi; done; ",
    "else echo 'libvirt_not_running'; fi"
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmAction {
    Start,
    Shutdown,
    Reboot,
    Suspend,
    Resume,
    Destroy,
}

impl VmAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            VmAction::Start => "start",
            VmAction::Shutdown => "shutdown",
            VmAction::Reboot => "reboot",
            VmAction::Suspend => "suspend",
            VmAction::Resume => "resume",
            VmAction::Destroy => "destroy",
        }
    }
}

impl fmt::Display for VmAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VmAction {
    type Err = ExporterError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "start" => Ok(VmAction::Start),
            "shutdown" | "stop" => Ok(VmAction::Shutdown),
            "reboot" | "restart" => Ok(VmAction::Reboot),
            "suspend" | "pause" => Ok(VmAction::Suspend),
            "resume" => Ok(VmAction::Resume),
            "destroy" | "force-stop" => Ok(VmAction::Destroy),
            other => Err(ExporterError::Parse(format!("unknown VM action: {other}"))),
        }
    }
}

#[derive(Clone)]
pub struct VmOperations {
    executor: Arc<dyn CommandExecutor>,
}

impl VmOperations {
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self { executor }
    }

    pub async fn is_running(&self) -> Result<bool> {
        service_running(
            self.executor.as_ref(),
            "/etc/rc.d/rc.libvirt",
            "libvirtd",
            "/var/run/libvirt/libvirt-sock",
        )
        .await
    }

    /// All domains, or none when libvirt is stopped.
    pub async fn vms(&self) -> Result<Vec<VirtualMachine>> {
        if !self.is_running().await? {
            debug!("libvirt is not running");
            return Ok(Vec::new());
        }

        match self.executor.execute(VM_DETAILS_SCRIPT).await {
            Ok(output) if output.success() => {
                if output.stdout.trim() == LIBVIRT_NOT_RUNNING {
                    return Ok(Vec::new());
                }
                return Ok(vm::parse_vm_details(&output.stdout));
            }
            Ok(output) => {
                debug!(exit_status = output.exit_status, "Batched VM listing failed, using virsh list");
            }
            Err(e) => {
                debug!(error = %e, "Batched VM listing failed, using virsh list");
            }
        }

        let command = "virsh list --all";
        let output = self.executor.execute(command).await?.into_success(command)?;
        Ok(vm::parse_virsh_list(&output.stdout))
    }

    pub async fn apply(&self, name: &str, action: VmAction) -> Result<()> {
        if name.trim().is_empty() {
            return Err(ExporterError::Parse("VM name must not be empty".to_string()));
        }
        let command = format!("virsh {} {}", action, shell_quote(name));
        self.executor.execute(&command).await?.into_success(&command)?;
        info!(vm = name, action = %action, "VM action completed");
        Ok(())
    }
}
