use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExporterError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Command failed: {message}")]
    Command {
        message: String,
        exit_code: Option<u32>,
    },

    #[error("Command timed out after {seconds:.1} seconds")]
    Timeout { seconds: f64 },

    #[error("Circuit breaker open for {host}")]
    CircuitOpen { host: String },

    #[error("Connection manager used before initialize()")]
    NotInitialized,

    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP server error: {0}")]
    Server(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExporterError {
    /// Whether the failure is transient (connection trouble, timeouts) rather
    /// than a problem with the command or configuration itself.
    ///
    /// The pool retries every error the same way; this is for callers that
    /// want to word their log lines differently.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ExporterError::Connection(_)
                | ExporterError::Timeout { .. }
                | ExporterError::Ssh(_)
                | ExporterError::Io(_)
        )
    }

    /// Exit code of the remote command, if this error came from one.
    pub fn exit_code(&self) -> Option<u32> {
        match self {
            ExporterError::Command { exit_code, .. } => *exit_code,
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ExporterError>;
