//! Unraid access over SSH
//!
//! - [`transport`] / [`russh`] - session abstraction and its SSH implementation
//! - [`connection`] / [`pool`] - pooled sessions with circuit breaker and retry
//! - [`parsers`] / [`types`] - command output to typed records
//! - [`operations`] / [`client`] - the commands the exporter runs

pub mod circuit;
pub mod client;
pub mod connection;
pub mod executor;
pub mod operations;
pub mod parsers;
pub mod pool;
pub mod retry;
pub mod russh;
pub mod transport;
pub mod types;

pub use client::UnraidClient;
pub use executor::CommandExecutor;
pub use pool::{ConnectionManager, PoolMetrics, PoolSettings};
pub use transport::{CommandOutput, SshTarget};
