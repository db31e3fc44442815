//! SSH transport on top of `russh`

use crate::error::{ExporterError, Result};
use crate::unraid::transport::{CommandOutput, Session, SshTarget, Transport};
use async_trait::async_trait;
use russh::client::{self, Handle, Handler};
use russh::keys::key::PublicKey;
use russh::ChannelMsg;
use secrecy::ExposeSecret;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

/// Accepts any host key. Unraid boxes regenerate keys on reinstall and are
/// reached over the LAN by address.
struct ClientHandler {
    host: String,
}

#[async_trait]
impl Handler for ClientHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        debug!(
            host = %self.host,
            fingerprint = %server_public_key.fingerprint(),
            "Accepting server host key"
        );
        Ok(true)
    }
}

#[derive(Debug, Clone)]
pub struct RusshTransport {
    connect_timeout: Duration,
    keepalive_interval: Duration,
}

impl Default for RusshTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(10), Duration::from_secs(30))
    }
}

impl RusshTransport {
    pub fn new(connect_timeout: Duration, keepalive_interval: Duration) -> Self {
        Self {
            connect_timeout,
            keepalive_interval,
        }
    }

    fn client_config(&self) -> Arc<client::Config> {
        let config = client::Config {
            keepalive_interval: Some(self.keepalive_interval),
            ..Default::default()
        };
        Arc::new(config)
    }

    async fn handshake(&self, target: &SshTarget) -> Result<Handle<ClientHandler>> {
        let addr = (target.host.as_str(), target.port);
        let handler = ClientHandler {
            host: target.host.clone(),
        };

        let mut handle = client::connect(self.client_config(), addr, handler)
            .await
            .map_err(|e| {
                ExporterError::Connection(format!(
                    "SSH handshake with {}:{} failed: {}",
                    target.host, target.port, e
                ))
            })?;

        let authenticated = handle
            .authenticate_password(&target.username, target.password.expose_secret())
            .await?;
        if !authenticated {
            return Err(ExporterError::Auth(format!(
                "password rejected for {}@{}",
                target.username, target.host
            )));
        }
        Ok(handle)
    }
}

#[async_trait]
impl Transport for RusshTransport {
    async fn open(&self, target: &SshTarget) -> Result<Box<dyn Session>> {
        let handle = tokio::time::timeout(self.connect_timeout, self.handshake(target))
            .await
            .map_err(|_| ExporterError::Timeout {
                seconds: self.connect_timeout.as_secs_f64(),
            })??;

        debug!(host = %target.host, user = %target.username, "SSH session established");
        Ok(Box::new(RusshSession { handle }))
    }
}

struct RusshSession {
    handle: Handle<ClientHandler>,
}

#[async_trait]
impl Session for RusshSession {
    async fn run(&self, command: &str) -> Result<CommandOutput> {
        let mut channel = self.handle.channel_open_session().await?;
        channel.exec(true, command).await?;

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let mut exit_status = None;

        while let Some(msg) = channel.wait().await {
            match msg {
                ChannelMsg::Data { ref data } => stdout.extend_from_slice(data),
                // Extended data type 1 is stderr
                ChannelMsg::ExtendedData { ref data, ext } if ext == 1 => {
                    stderr.extend_from_slice(data)
                }
                ChannelMsg::ExitStatus { exit_status: code } => exit_status = Some(code),
                ChannelMsg::Close => break,
                _ => {}
            }
        }

        let Some(exit_status) = exit_status else {
            return Err(ExporterError::Connection(
                "channel closed without an exit status".to_string(),
            ));
        };
        trace!(exit_status, "Command completed");

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            exit_status,
        })
    }

    async fn close(&self) -> Result<()> {
        self.handle
            .disconnect(russh::Disconnect::ByApplication, "", "en")
            .await?;
        Ok(())
    }
}
