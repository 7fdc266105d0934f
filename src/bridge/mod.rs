//! Process-wide bridge between the host and the embedded interpreter
//!
//! The [`Bridge`] owns the injected [`InterpreterService`] capability,
//! borrows the host's [`OutputSink`], and coordinates the blocking
//! input rendezvous between the two sides. One bridge serves the whole
//! process once installed via [`Bridge::install`]; standalone instances
//! built with [`Bridge::new`] exist for embedding and tests.

use std::path::Path;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

// Submodules
pub mod error;
pub mod rendezvous;
pub mod service;
pub mod sink;

pub use error::{BridgeError, WaitError, WaitResult};
pub use rendezvous::{InputRendezvous, SupplyOutcome};
pub use service::{InterpreterService, STATUS_OK, StatusCode};
pub use sink::OutputSink;

/// Default completion marker: any supplied chunk containing this token
/// ends the current input wait
pub const DEFAULT_COMPLETION_MARKER: &str = ":ok";

/// Configuration for the bridge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Substring that marks a supplied input chunk as complete
    pub completion_marker: String,

    /// Upper bound on a single input wait. `None` (the default) keeps
    /// the historical behavior of waiting indefinitely.
    pub input_timeout: Option<Duration>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            completion_marker: DEFAULT_COMPLETION_MARKER.to_string(),
            input_timeout: None,
        }
    }
}

/// The host/interpreter bridge
///
/// Owns the rendezvous and the injected interpreter capability; all
/// methods take `&self` and are safe to call from any thread.
pub struct Bridge {
    config: BridgeConfig,
    service: Box<dyn InterpreterService>,
    sink: RwLock<Option<Arc<dyn OutputSink>>>,
    rendezvous: InputRendezvous,
}

/// The process-wide bridge instance
static BRIDGE: OnceLock<Bridge> = OnceLock::new();

impl Bridge {
    /// Create a standalone bridge around an injected interpreter
    /// capability.
    ///
    /// Most embedders call [`Bridge::install`] instead; standalone
    /// instances are for tests and hosts that manage the lifetime
    /// themselves.
    pub fn new(service: Box<dyn InterpreterService>, config: BridgeConfig) -> Self {
        Self {
            rendezvous: InputRendezvous::new(config.completion_marker.clone()),
            config,
            service,
            sink: RwLock::new(None),
        }
    }

    /// Install the process-wide bridge, exactly once.
    ///
    /// The first caller wins and gets the shared instance back; any
    /// later attempt fails with [`BridgeError::AlreadyInstalled`] and
    /// its offered service is dropped. The installed bridge lives for
    /// the rest of the process.
    pub fn install(
        service: Box<dyn InterpreterService>,
        config: BridgeConfig,
    ) -> Result<&'static Bridge, BridgeError> {
        let mut installed = false;
        let bridge = BRIDGE.get_or_init(|| {
            installed = true;
            Bridge::new(service, config)
        });
        if installed {
            Ok(bridge)
        } else {
            Err(BridgeError::AlreadyInstalled)
        }
    }

    /// Access the installed process-wide bridge
    pub fn global() -> Result<&'static Bridge, BridgeError> {
        BRIDGE.get().ok_or(BridgeError::NotInstalled)
    }

    /// Current configuration
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Register, replace, or clear the host's output sink.
    ///
    /// Safe at any time, including while an input wait is outstanding;
    /// the in-flight blocking is unaffected and later notifications go
    /// to the new sink. A notification racing the swap may still reach
    /// the previously installed sink: the reference is snapshotted once
    /// per notification.
    pub fn set_output_sink(&self, sink: Option<Arc<dyn OutputSink>>) {
        *self.sink.write() = sink;
    }

    /// Start the interpreter with the directory holding its runtime
    /// files. The returned status code is the foreign service's,
    /// verbatim.
    pub fn start(&self, datapath: &Path) -> StatusCode {
        self.service.initialize(datapath)
    }

    /// Stop the interpreter.
    ///
    /// Any outstanding input wait is released first with a cancelled
    /// result, so the interpreter thread is never left blocked past
    /// shutdown. The returned status code is the foreign service's,
    /// verbatim.
    pub fn stop(&self) -> StatusCode {
        if self.rendezvous.cancel() {
            tracing::debug!("released outstanding input wait before shutdown");
        }
        self.service.shutdown()
    }

    /// Send a payload to the interpreter. Pure pass-through, no
    /// buffering or queuing.
    pub fn call(&self, payload: &str) -> StatusCode {
        self.service.execute(payload)
    }

    /// Relay one line of interpreter output to the registered sink.
    ///
    /// Output with no observer is dropped with a diagnostic. This is
    /// best-effort by contract; it is never an error for the
    /// interpreter side.
    pub fn emit_line(&self, text: &str) {
        let sink = self.sink.read().clone();
        match sink {
            Some(sink) => sink.on_output_line(text),
            None => tracing::debug!(text, "dropping interpreter output: no sink registered"),
        }
    }

    /// Block the calling interpreter thread until the host supplies a
    /// chunk containing the completion marker.
    ///
    /// Notifies the sink via `on_input_requested` exactly once per
    /// episode. With no sink registered the wait still proceeds; it is
    /// then up to the host to supply input through another channel or
    /// rely on cancellation.
    pub fn request_line(&self) -> WaitResult<String> {
        let sink = self.sink.read().clone();
        self.rendezvous
            .wait_for_line(self.config.input_timeout, move || match sink {
                Some(sink) => sink.on_input_requested(),
                None => tracing::warn!("input requested with no sink registered"),
            })
    }

    /// Feed one chunk of host input toward the outstanding wait.
    /// Never blocks; a chunk with no wait outstanding is dropped.
    pub fn supply_line(&self, text: &str) -> SupplyOutcome {
        self.rendezvous.supply_line(text)
    }

    /// Release the outstanding input wait without shutting the
    /// interpreter down. Returns true if a waiter was released.
    pub fn cancel_input_wait(&self) -> bool {
        self.rendezvous.cancel()
    }

    /// Whether an input wait is currently outstanding
    pub fn awaiting_input(&self) -> bool {
        self.rendezvous.awaiting()
    }

    /// Number of input waits started over this bridge's lifetime
    pub fn input_requests(&self) -> u64 {
        self.rendezvous.requests_started()
    }
}
