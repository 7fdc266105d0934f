//! Tether – a thread-safe bridge between a host application and an
//! embedded interpreter
//!
//! The interpreter runs on its own thread(s) behind a foreign-function
//! boundary. This crate provides:
//! - A process-wide access point for the interpreter lifecycle
//!   (start, stop, execute)
//! - Relay of interpreter output lines to a host-registered observer
//! - A blocking request/response protocol that lets the interpreter
//!   thread ask the host for a line of input and suspend until a chunk
//!   carrying the completion marker arrives

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

/// Bridge modules: singleton lifecycle, output relay, input rendezvous
pub mod bridge;

// Re-export key types for convenience
pub use bridge::{Bridge, BridgeConfig};

/// Current version of the tether crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
