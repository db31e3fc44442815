//! Command-issuing components
//!
//! Each component owns an `Arc<dyn CommandExecutor>` and knows which shell
//! commands to run for one area of the host. Output goes through the pure
//! parsers in [`crate::unraid::parsers`].

pub mod disk;
pub mod docker;
pub mod system;
pub mod ups;
pub mod userscripts;
pub mod vm;

pub use disk::DiskOperations;
pub use docker::{ContainerAction, DockerOperations};
pub use system::SystemOperations;
pub use ups::UpsOperations;
pub use userscripts::{UserScriptAction, UserScriptOperations};
pub use vm::{VmAction, VmOperations};

use crate::error::Result;
use crate::unraid::executor::CommandExecutor;

/// Quote `value` for a POSIX shell.
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Shared "is this service up" check: the rc.d script first, then a process
/// plus socket check.
pub(crate) async fn service_running(
    executor: &dyn CommandExecutor,
    rc_script: &str,
    process: &str,
    socket: &str,
) -> Result<bool> {
    let rc = executor.execute(&format!("{rc_script} status")).await?;
    if rc.success() && rc.stdout.contains("is currently running") {
        return Ok(true);
    }

    let pgrep = executor
        .execute(&format!("pgrep -f {}", shell_quote(process)))
        .await?;
    if !pgrep.success() {
        return Ok(false);
    }

    let sock = executor
        .execute(&format!("[ -S {} ]", shell_quote(socket)))
        .await?;
    Ok(sock.success())
}
