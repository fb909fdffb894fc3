//! Server error types
//!
//! Startup and runtime failures that end the process. Request-level failures
//! never reach this type: handlers turn them into HTTP responses.

use std::net::SocketAddr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid address '{addr}': {source}")]
    InvalidAddress {
        addr: String,
        source: std::net::AddrParseError,
    },

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("Failed to open log file: {0}")]
    LogFile(std::io::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
