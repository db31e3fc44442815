use crate::error::Result;
use crate::unraid::transport::CommandOutput;
use async_trait::async_trait;

/// Something that can run a shell command on the Unraid host.
///
/// Implemented by [`ConnectionManager`](crate::unraid::pool::ConnectionManager);
/// the operation components only see this trait.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn execute(&self, command: &str) -> Result<CommandOutput>;

    /// Run with an explicit timeout instead of the executor's default.
    async fn execute_with_timeout(
        &self,
        command: &str,
        timeout: std::time::Duration,
    ) -> Result<CommandOutput> {
        let _ = timeout;
        self.execute(command).await
    }
}
