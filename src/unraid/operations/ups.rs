use crate::error::Result;
use crate::unraid::executor::CommandExecutor;
use crate::unraid::parsers::ups;
use crate::unraid::types::UpsStatus;
use std::sync::Arc;

const DETECT_COMMAND: &str =
    "command -v apcaccess >/dev/null 2>&1 && pgrep apcupsd >/dev/null 2>&1 && echo 'running'";

#[derive(Clone)]
pub struct UpsOperations {
    executor: Arc<dyn CommandExecutor>,
}

impl UpsOperations {
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self { executor }
    }

    /// `apcaccess` is installed and `apcupsd` is running.
    pub async fn is_available(&self) -> Result<bool> {
        let output = self.executor.execute(DETECT_COMMAND).await?;
        Ok(output.success() && output.stdout.contains("running"))
    }

    /// `None` when no UPS daemon is present.
    pub async fn status(&self) -> Result<Option<UpsStatus>> {
        if !self.is_available().await? {
            return Ok(None);
        }
        let command = "apcaccess -u 2>/dev/null";
        let output = self.executor.execute(command).await?.into_success(command)?;
        Ok(Some(ups::parse_apcaccess(&output.stdout)))
    }
}
