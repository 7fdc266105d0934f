//! Error types for the bridge
//!
//! Domain errors use thiserror; foreign interpreter status codes are
//! not errors here and pass through the bridge untouched.

use thiserror::Error;

/// Errors raised by process-wide bridge installation and lookup
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum BridgeError {
    /// A process-wide bridge has already been installed
    #[error("bridge is already installed; use Bridge::global()")]
    AlreadyInstalled,

    /// No process-wide bridge has been installed yet
    #[error("bridge has not been installed; call Bridge::install() first")]
    NotInstalled,
}

/// Ways an input wait can end without a satisfied line
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum WaitError {
    /// Another input request is already outstanding
    #[error("an input request is already outstanding")]
    AlreadyPending,

    /// The wait was released by shutdown before satisfying input arrived
    #[error("input wait cancelled by shutdown")]
    Cancelled,

    /// The configured input timeout elapsed
    #[error("input wait timed out")]
    TimedOut,
}

/// Convenience result alias for input waits
pub type WaitResult<T> = std::result::Result<T, WaitError>;
