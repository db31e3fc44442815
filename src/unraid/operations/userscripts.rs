//! User Scripts plugin
//!
//! The plugin keeps each script in its own directory under
//! [`USER_SCRIPTS_DIR`], with the body in a file called `script`. Scripts are
//! run with `bash` straight from there; a host without the plugin simply has
//! no scripts.

use super::shell_quote;
use crate::error::{ExporterError, Result};
use crate::unraid::executor::CommandExecutor;
use crate::unraid::parsers::userscripts;
use crate::unraid::types::UserScript;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub const USER_SCRIPTS_DIR: &str = "/boot/config/plugins/user.scripts/scripts";

/// Foreground runs get longer than the pool's command timeout.
pub const USER_SCRIPT_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserScriptAction {
    /// Wait for the script and fail on a non-zero exit
    Run,
    /// Detach and return immediately
    Background,
    Stop,
}

impl UserScriptAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserScriptAction::Run => "run",
            UserScriptAction::Background => "background",
            UserScriptAction::Stop => "stop",
        }
    }
}

impl fmt::Display for UserScriptAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserScriptAction {
    type Err = ExporterError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "run" | "start" | "execute" => Ok(UserScriptAction::Run),
            "background" | "run-background" => Ok(UserScriptAction::Background),
            "stop" | "kill" => Ok(UserScriptAction::Stop),
            other => Err(ExporterError::Parse(format!("unknown user script action: {other}"))),
        }
    }
}

/// Path of the script body, rejecting names that would leave the scripts
/// directory.
fn script_path(name: &str) -> Result<String> {
    if name.trim().is_empty() || name.contains('/') || name == "." || name == ".." {
        return Err(ExporterError::Parse(format!("invalid user script name: {name:?}")));
    }
    Ok(format!("{USER_SCRIPTS_DIR}/{name}/script"))
}

/// `pkill -f` pattern for a running script.
///
/// The bracketed first character keeps the pattern from matching the shell
/// that runs `pkill` itself.
fn process_pattern(path: &str) -> String {
    let escaped = regex::escape(path);
    match escaped.strip_prefix('/') {
        Some(rest) => format!("[/]{rest}"),
        None => escaped,
    }
}

#[derive(Clone)]
pub struct UserScriptOperations {
    executor: Arc<dyn CommandExecutor>,
}

impl UserScriptOperations {
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self { executor }
    }

    pub async fn is_installed(&self) -> Result<bool> {
        let command = format!("[ -d {} ] && echo 'exists'", shell_quote(USER_SCRIPTS_DIR));
        let output = self.executor.execute(&command).await?;
        Ok(output.success() && output.stdout.contains("exists"))
    }

    /// Every configured script, or none when the plugin is not installed.
    pub async fn scripts(&self) -> Result<Vec<UserScript>> {
        if !self.is_installed().await? {
            debug!("User Scripts plugin is not installed");
            return Ok(Vec::new());
        }

        let command = format!("ls -1 {} 2>/dev/null", shell_quote(USER_SCRIPTS_DIR));
        let output = self.executor.execute(&command).await?.into_success(&command)?;
        Ok(userscripts::parse_script_list(&output.stdout))
    }

    /// Run `name` to completion and return its stdout.
    pub async fn run(&self, name: &str) -> Result<String> {
        let command = format!("bash {}", shell_quote(&script_path(name)?));
        let output = self
            .executor
            .execute_with_timeout(&command, USER_SCRIPT_TIMEOUT)
            .await?
            .into_success(&command)?;
        info!(script = name, "User script finished");
        Ok(output.stdout)
    }

    /// Start `name` detached from the SSH session.
    pub async fn run_background(&self, name: &str) -> Result<()> {
        let command = format!(
            "nohup bash {} </dev/null >/dev/null 2>&1 &",
            shell_quote(&script_path(name)?)
        );
        self.executor.execute(&command).await?.into_success(&command)?;
        info!(script = name, "User script started in background");
        Ok(())
    }

    /// Kill every running copy of `name`; fails when none was running.
    pub async fn stop(&self, name: &str) -> Result<()> {
        let pattern = process_pattern(&script_path(name)?);
        let command = format!("pkill -f {}", shell_quote(&pattern));
        self.executor.execute(&command).await?.into_success(&command)?;
        info!(script = name, "User script stopped");
        Ok(())
    }

    pub async fn apply(&self, name: &str, action: UserScriptAction) -> Result<()> {
        match action {
            UserScriptAction::Run => self.run(name).await.map(|_| ()),
            UserScriptAction::Background => self.run_background(name).await,
            UserScriptAction::Stop => self.stop(name).await,
        }
    }
}
