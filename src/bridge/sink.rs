//! Host-side observer for interpreter events

/// Receives interpreter output lines and input-wait notifications.
///
/// Callbacks run on whichever thread triggered them, usually one of
/// the interpreter's threads. Hosts must hand off to their own UI or
/// event mechanism; nothing here is guaranteed to run on the host
/// thread.
pub trait OutputSink: Send + Sync {
    /// The interpreter is blocked waiting for a line of input.
    ///
    /// Edge-triggered: delivered exactly once per wait episode, never
    /// re-fired while the same wait is still outstanding.
    fn on_input_requested(&self);

    /// The interpreter emitted one line of output
    fn on_output_line(&self, text: &str);
}
