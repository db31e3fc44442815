use super::{service_running, shell_quote};
use crate::error::{ExporterError, Result};
use crate::unraid::executor::CommandExecutor;
use crate::unraid::parsers::docker::{self, DOCKER_PS_FORMAT};
use crate::unraid::types::Container;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub const CONTAINER_ACTION_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerAction {
    Start,
    Stop,
    Pause,
    Unpause,
    Restart,
}

impl ContainerAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerAction::Start => "start",
            ContainerAction::Stop => "stop",
            ContainerAction::Pause => "pause",
            ContainerAction::Unpause => "unpause",
            ContainerAction::Restart => "restart",
        }
    }
}

impl fmt::Display for ContainerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContainerAction {
    type Err = ExporterError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "start" => Ok(ContainerAction::Start),
            "stop" => Ok(ContainerAction::Stop),
            "pause" => Ok(ContainerAction::Pause),
            "unpause" | "resume" => Ok(ContainerAction::Unpause),
            "restart" => Ok(ContainerAction::Restart),
            other => Err(ExporterError::Parse(format!("unknown container action: {other}"))),
        }
    }
}

#[derive(Clone)]
pub struct DockerOperations {
    executor: Arc<dyn CommandExecutor>,
}

impl DockerOperations {
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self { executor }
    }

    pub async fn is_running(&self) -> Result<bool> {
        service_running(
            self.executor.as_ref(),
            "/etc/rc.d/rc.docker",
            "dockerd",
            "/var/run/docker.sock",
        )
        .await
    }

    /// All containers, or none when the Docker service is stopped.
    pub async fn containers(&self) -> Result<Vec<Container>> {
        if !self.is_running().await? {
            debug!("Docker service is not running");
            return Ok(Vec::new());
        }
        self.list_containers().await
    }

    /// `docker ps -a` without checking the service first.
    ///
    /// Callers that already know Docker is up use this to skip a second
    /// status check.
    pub async fn list_containers(&self) -> Result<Vec<Container>> {
        let command = format!("docker ps -a --format '{DOCKER_PS_FORMAT}'");
        let output = self.executor.execute(&command).await?;
        if output.success() {
            return Ok(docker::parse_docker_ps(&output.stdout));
        }

        debug!(stderr = %output.stderr.trim(), "Formatted docker ps failed, trying table output");
        let command = "docker ps -a";
        let output = self.executor.execute(command).await?.into_success(command)?;
        Ok(docker::parse_docker_ps_table(&output.stdout))
    }

    pub async fn apply(&self, container: &str, action: ContainerAction) -> Result<()> {
        if container.trim().is_empty() {
            return Err(ExporterError::Parse("container name must not be empty".to_string()));
        }
        let command = format!("docker {} {}", action, shell_quote(container));
        self.executor
            .execute_with_timeout(&command, CONTAINER_ACTION_TIMEOUT)
            .await?
            .into_success(&command)?;
        info!(container, action = %action, "Container action completed");
        Ok(())
    }
}
