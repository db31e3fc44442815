use crate::config::{PoolConfig, UnraidConfig};
use crate::error::Result;
use crate::unraid::executor::CommandExecutor;
use crate::unraid::operations::{
    DiskOperations, DockerOperations, SystemOperations, UpsOperations, UserScriptOperations,
    VmOperations,
};
use crate::unraid::pool::{ConnectionManager, PoolMetrics};
use crate::unraid::russh::RusshTransport;
use crate::unraid::transport::{SshTarget, Transport};
use std::sync::Arc;
use std::time::Duration;

/// Everything the exporter needs from one Unraid host.
///
/// Owns the [`ConnectionManager`] and hands the same executor to each
/// operation component.
#[derive(Clone)]
pub struct UnraidClient {
    manager: Arc<ConnectionManager>,
    target: SshTarget,
    system: SystemOperations,
    disk: DiskOperations,
    docker: DockerOperations,
    vm: VmOperations,
    ups: UpsOperations,
    userscripts: UserScriptOperations,
}

impl UnraidClient {
    /// Client backed by the russh transport.
    pub fn new(unraid: &UnraidConfig, pool: &PoolConfig) -> Self {
        let transport = RusshTransport::new(
            Duration::from_secs(pool.connect_timeout_seconds),
            Duration::from_secs(pool.keepalive_interval_seconds),
        );
        Self::with_transport(Arc::new(transport), SshTarget::from(unraid), pool)
    }

    pub fn with_transport(transport: Arc<dyn Transport>, target: SshTarget, pool: &PoolConfig) -> Self {
        let manager = Arc::new(ConnectionManager::from_config(transport, pool));
        let executor: Arc<dyn CommandExecutor> = manager.clone();
        Self {
            system: SystemOperations::new(Arc::clone(&executor)),
            disk: DiskOperations::new(Arc::clone(&executor)),
            docker: DockerOperations::new(Arc::clone(&executor)),
            vm: VmOperations::new(Arc::clone(&executor)),
            ups: UpsOperations::new(Arc::clone(&executor)),
            userscripts: UserScriptOperations::new(executor),
            manager,
            target,
        }
    }

    /// Seed the pool; the first connection must succeed.
    pub async fn connect(&self) -> Result<()> {
        self.manager.initialize(self.target.clone()).await
    }

    pub async fn shutdown(&self) {
        self.manager.shutdown().await;
    }

    pub fn host(&self) -> &str {
        &self.target.host
    }

    pub fn manager(&self) -> &Arc<ConnectionManager> {
        &self.manager
    }

    pub async fn pool_metrics(&self) -> PoolMetrics {
        self.manager.metrics().await
    }

    pub fn system(&self) -> &SystemOperations {
        &self.system
    }

    pub fn disk(&self) -> &DiskOperations {
        &self.disk
    }

    pub fn docker(&self) -> &DockerOperations {
        &self.docker
    }

    pub fn vm(&self) -> &VmOperations {
        &self.vm
    }

    pub fn ups(&self) -> &UpsOperations {
        &self.ups
    }

    pub fn userscripts(&self) -> &UserScriptOperations {
        &self.userscripts
    }
}
