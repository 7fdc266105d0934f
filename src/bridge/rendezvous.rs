//! Blocking input rendezvous between the interpreter and host threads
//!
//! One monitor (mutex + condvar) coordinates the interpreter thread,
//! which blocks in [`InputRendezvous::wait_for_line`], with the host
//! thread, which feeds chunks through [`InputRendezvous::supply_line`].
//! A chunk containing the completion marker releases the waiter.
//! Shutdown releases it with a distinguished cancellation instead of
//! leaving the thread blocked forever.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use super::error::{WaitError, WaitResult};

/// Outcome of feeding one chunk of host input into the rendezvous
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupplyOutcome {
    /// No wait was outstanding; the chunk was dropped
    Ignored,
    /// The chunk replaced the pending buffer but carried no completion
    /// marker; the waiter stays blocked
    Buffered,
    /// The chunk carried the completion marker and released the waiter
    Completed,
}

#[derive(Debug, Default)]
struct WaitState {
    awaiting: bool,
    pending: String,
    cancel_requested: bool,
    requests_started: u64,
}

/// Monitor coordinating at most one blocking input wait at a time.
///
/// All mutable state lives behind a single mutex so that the wake-up
/// and the state updates are atomic with respect to each other; a
/// supply racing the transition into a wait is never lost because the
/// completion predicate is re-checked under the lock before every
/// block on the condvar.
pub struct InputRendezvous {
    state: Mutex<WaitState>,
    satisfied: Condvar,
    marker: String,
}

impl InputRendezvous {
    /// Create a rendezvous that completes on the given marker substring
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(WaitState::default()),
            satisfied: Condvar::new(),
            marker: marker.into(),
        }
    }

    /// Block the calling thread until a satisfying line arrives.
    ///
    /// Begins a wait episode (at most one may be outstanding; a second
    /// concurrent call is rejected with [`WaitError::AlreadyPending`]
    /// without blocking), invokes `notify` exactly once with no lock
    /// held, then blocks until the pending buffer contains the
    /// completion marker, the wait is cancelled, or `timeout` elapses.
    ///
    /// On success the returned value is the pending buffer truncated at
    /// the first occurrence of the marker; the marker itself and
    /// anything after it are discarded.
    pub fn wait_for_line<F>(&self, timeout: Option<Duration>, notify: F) -> WaitResult<String>
    where
        F: FnOnce(),
    {
        {
            let mut state = self.state.lock();
            if state.awaiting {
                return Err(WaitError::AlreadyPending);
            }
            state.awaiting = true;
            state.pending.clear();
            state.cancel_requested = false;
            state.requests_started += 1;
        }

        // Edge-triggered, once per episode. Runs outside the lock so a
        // sink that supplies input synchronously cannot deadlock; the
        // predicate loop below picks up anything that arrived meanwhile.
        notify();

        let deadline = timeout.map(|limit| Instant::now() + limit);
        let mut state = self.state.lock();
        loop {
            if state.cancel_requested {
                state.awaiting = false;
                state.cancel_requested = false;
                state.pending.clear();
                return Err(WaitError::Cancelled);
            }
            if let Some(pos) = state.pending.find(self.marker.as_str()) {
                state.awaiting = false;
                let mut line = std::mem::take(&mut state.pending);
                line.truncate(pos);
                return Ok(line);
            }
            match deadline {
                Some(deadline) => {
                    if self.satisfied.wait_until(&mut state, deadline).timed_out() {
                        state.awaiting = false;
                        state.pending.clear();
                        return Err(WaitError::TimedOut);
                    }
                }
                None => self.satisfied.wait(&mut state),
            }
        }
    }

    /// Feed one chunk of host input toward the outstanding wait.
    ///
    /// Never blocks. Each chunk replaces the pending buffer; the latest
    /// chunk wins. A chunk supplied while no wait is outstanding is
    /// dropped and must not leak into a later wait.
    pub fn supply_line(&self, text: &str) -> SupplyOutcome {
        let mut state = self.state.lock();
        if !state.awaiting {
            tracing::debug!(text, "ignoring supplied input with no outstanding request");
            return SupplyOutcome::Ignored;
        }
        state.pending.clear();
        state.pending.push_str(text);
        if state.pending.contains(self.marker.as_str()) {
            self.satisfied.notify_all();
            SupplyOutcome::Completed
        } else {
            SupplyOutcome::Buffered
        }
    }

    /// Release the outstanding wait with a cancelled result.
    ///
    /// Returns true if a waiter was released. Cancelling while idle is
    /// a no-op and leaves the next wait unaffected.
    pub fn cancel(&self) -> bool {
        let mut state = self.state.lock();
        if !state.awaiting {
            return false;
        }
        state.cancel_requested = true;
        self.satisfied.notify_all();
        true
    }

    /// Whether a wait episode is currently outstanding
    pub fn awaiting(&self) -> bool {
        self.state.lock().awaiting
    }

    /// Number of wait episodes started since creation
    pub fn requests_started(&self) -> u64 {
        self.state.lock().requests_started
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::thread;

    const MARKER: &str = ":ok";

    fn spin_until(what: &str, predicate: impl Fn() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !predicate() {
            assert!(Instant::now() < deadline, "timed out waiting for {what}");
            thread::yield_now();
        }
    }

    #[test]
    fn test_round_trip_across_threads() {
        let rz = Arc::new(InputRendezvous::new(MARKER));
        let waiter = {
            let rz = Arc::clone(&rz);
            thread::spawn(move || rz.wait_for_line(None, || {}))
        };

        spin_until("wait to start", || rz.awaiting());
        assert_eq!(rz.supply_line("hello:ok"), SupplyOutcome::Completed);
        assert_eq!(waiter.join().expect("join"), Ok("hello".to_string()));
        assert!(!rz.awaiting());
    }

    #[test]
    fn test_partial_supply_keeps_waiter_blocked() {
        let rz = Arc::new(InputRendezvous::new(MARKER));
        let (tx, rx) = mpsc::channel();
        {
            let rz = Arc::clone(&rz);
            thread::spawn(move || {
                let _ = tx.send(rz.wait_for_line(None, || {}));
            });
        }

        spin_until("wait to start", || rz.awaiting());
        assert_eq!(rz.supply_line("partial"), SupplyOutcome::Buffered);
        thread::sleep(Duration::from_millis(50));
        assert!(
            rx.try_recv().is_err(),
            "waiter must stay blocked on a chunk without the marker"
        );

        assert_eq!(rz.supply_line("rest:ok"), SupplyOutcome::Completed);
        let result = rx
            .recv_timeout(Duration::from_secs(5))
            .expect("waiter released");
        // Replace semantics: the second chunk overwrote the first.
        assert_eq!(result, Ok("rest".to_string()));
    }

    #[test]
    fn test_supply_while_idle_is_ignored() {
        let rz = InputRendezvous::new(MARKER);
        assert_eq!(rz.supply_line("stale:ok"), SupplyOutcome::Ignored);
        assert!(!rz.awaiting());
    }

    #[test]
    fn test_orphan_supply_does_not_leak_into_next_wait() {
        let rz = Arc::new(InputRendezvous::new(MARKER));
        assert_eq!(rz.supply_line("stale:ok"), SupplyOutcome::Ignored);

        let waiter = {
            let rz = Arc::clone(&rz);
            thread::spawn(move || rz.wait_for_line(None, || {}))
        };
        spin_until("wait to start", || rz.awaiting());

        // The buffer starts empty, so a bare marker yields an empty line.
        assert_eq!(rz.supply_line(":ok"), SupplyOutcome::Completed);
        assert_eq!(waiter.join().expect("join"), Ok(String::new()));
    }

    #[test]
    fn test_second_wait_rejected_without_renotifying() {
        let rz = Arc::new(InputRendezvous::new(MARKER));
        let notifications = Arc::new(AtomicUsize::new(0));

        let waiter = {
            let rz = Arc::clone(&rz);
            let notifications = Arc::clone(&notifications);
            thread::spawn(move || {
                rz.wait_for_line(None, || {
                    notifications.fetch_add(1, Ordering::SeqCst);
                })
            })
        };
        spin_until("wait to start", || rz.awaiting());

        let second = rz.wait_for_line(None, || {
            notifications.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(second, Err(WaitError::AlreadyPending));
        assert_eq!(notifications.load(Ordering::SeqCst), 1);

        assert!(rz.cancel());
        assert_eq!(waiter.join().expect("join"), Err(WaitError::Cancelled));
    }

    #[test]
    fn test_cancel_releases_waiter() {
        let rz = Arc::new(InputRendezvous::new(MARKER));
        let waiter = {
            let rz = Arc::clone(&rz);
            thread::spawn(move || rz.wait_for_line(None, || {}))
        };

        spin_until("wait to start", || rz.awaiting());
        assert!(rz.cancel());
        assert_eq!(waiter.join().expect("join"), Err(WaitError::Cancelled));
        assert!(!rz.awaiting());
    }

    #[test]
    fn test_cancel_while_idle_is_noop() {
        let rz = Arc::new(InputRendezvous::new(MARKER));
        assert!(!rz.cancel());

        // The next wait must still run to satisfaction, not wake spuriously
        // cancelled.
        let waiter = {
            let rz = Arc::clone(&rz);
            thread::spawn(move || rz.wait_for_line(None, || {}))
        };
        spin_until("wait to start", || rz.awaiting());
        assert_eq!(rz.supply_line("fine:ok"), SupplyOutcome::Completed);
        assert_eq!(waiter.join().expect("join"), Ok("fine".to_string()));
    }

    #[test]
    fn test_timeout_bounds_wait() {
        let rz = InputRendezvous::new(MARKER);
        let started = Instant::now();
        let result = rz.wait_for_line(Some(Duration::from_millis(50)), || {});
        assert_eq!(result, Err(WaitError::TimedOut));
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(!rz.awaiting());
    }

    #[test]
    fn test_marker_truncates_value() {
        let rz = Arc::new(InputRendezvous::new(MARKER));
        let waiter = {
            let rz = Arc::clone(&rz);
            thread::spawn(move || rz.wait_for_line(None, || {}))
        };
        spin_until("wait to start", || rz.awaiting());
        assert_eq!(rz.supply_line("ab:okcd"), SupplyOutcome::Completed);
        assert_eq!(waiter.join().expect("join"), Ok("ab".to_string()));
    }

    #[test]
    fn test_requests_started_counts_episodes() {
        let rz = InputRendezvous::new(MARKER);
        assert_eq!(rz.requests_started(), 0);
        for _ in 0..3 {
            let _ = rz.wait_for_line(Some(Duration::from_millis(1)), || {});
        }
        assert_eq!(rz.requests_started(), 3);
    }
}
