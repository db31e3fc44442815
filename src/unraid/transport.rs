//! Remote shell transport abstraction
//!
//! The pool only needs two things from a transport: open an authenticated
//! session to a target, and on that session run a command or close it.
//! [`RusshTransport`](crate::unraid::russh::RusshTransport) is the SSH
//! implementation; tests plug in scripted transports.

use crate::config::UnraidConfig;
use crate::error::{ExporterError, Result};
use async_trait::async_trait;
use secrecy::SecretString;

/// Where and as whom to connect.
#[derive(Debug, Clone)]
pub struct SshTarget {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
}

impl SshTarget {
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        port: u16,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }
}

impl From<&UnraidConfig> for SshTarget {
    fn from(config: &UnraidConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            username: config.username.clone(),
            password: config.password.clone(),
        }
    }
}

/// Result of a remote command.
///
/// A non-zero `exit_status` is still a successful round trip; callers that
/// need the command itself to succeed use [`CommandOutput::into_success`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_status: u32,
}

impl CommandOutput {
    pub fn new(stdout: impl Into<String>, stderr: impl Into<String>, exit_status: u32) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            exit_status,
        }
    }

    pub fn success(&self) -> bool {
        self.exit_status == 0
    }

    /// Convert a non-zero exit into [`ExporterError::Command`].
    pub fn into_success(self, command: &str) -> Result<Self> {
        if self.success() {
            return Ok(self);
        }
        let stderr = self.stderr.trim();
        let message = if stderr.is_empty() {
            format!("`{}` exited with status {}", preview(command), self.exit_status)
        } else {
            format!(
                "`{}` exited with status {}: {}",
                preview(command),
                self.exit_status,
                stderr
            )
        };
        Err(ExporterError::Command {
            message,
            exit_code: Some(self.exit_status),
        })
    }
}

/// An authenticated remote shell session.
#[async_trait]
pub trait Session: Send + Sync {
    async fn run(&self, command: &str) -> Result<CommandOutput>;

    async fn close(&self) -> Result<()>;
}

/// Factory for sessions.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn open(&self, target: &SshTarget) -> Result<Box<dyn Session>>;
}

/// Shorten a command for log lines.
pub(crate) fn preview(command: &str) -> String {
    const MAX: usize = 100;
    match command.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &command[..idx]),
        None => command.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_keeps_short_commands() {
        assert_eq!(preview("mdcmd status"), "mdcmd status");
    }

    #[test]
    fn preview_truncates_on_char_boundary() {
        let long = "é".repeat(150);
        let shortened = preview(&long);
        assert!(shortened.ends_with("..."));
        assert_eq!(shortened.chars().count(), 103);
    }

    #[test]
    fn into_success_reports_exit_code() {
        let output = CommandOutput::new("", "no such container", 1);
        let err = output.into_success("docker start plex").unwrap_err();
        assert_eq!(err.exit_code(), Some(1));
        assert!(err.to_string().contains("no such container"));
    }
}
