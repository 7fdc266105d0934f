//! Opaque interpreter capability
//!
//! The real interpreter lives behind a foreign-function boundary; the
//! bridge only needs its lifecycle controls. Modelling them as a trait
//! lets hosts wrap the native runtime and tests inject stubs.

use std::path::Path;

/// Status code returned by the embedded interpreter.
///
/// Zero conventionally denotes success. Any nonzero value is a
/// foreign-side failure whose meaning the bridge does not interpret;
/// it is surfaced verbatim to the caller.
pub type StatusCode = i32;

/// Conventional success status
pub const STATUS_OK: StatusCode = 0;

/// Lifecycle controls of the embedded interpreter.
///
/// Calls may originate from either the host's or the interpreter's
/// threads, so implementations must be `Send + Sync`. The bridge never
/// retries or reinterprets returned codes.
pub trait InterpreterService: Send + Sync {
    /// Initialize the interpreter with the directory holding its
    /// extracted runtime files
    fn initialize(&self, datapath: &Path) -> StatusCode;

    /// Shut the interpreter down
    fn shutdown(&self) -> StatusCode;

    /// Send a payload string to the interpreter for execution
    fn execute(&self, payload: &str) -> StatusCode;
}
