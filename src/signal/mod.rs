//! Interrupt handling (SIGINT/SIGTERM)
//!
//! A verification run can take a long time. On the first interrupt the
//! environment loop stops between iterations (the current build is
//! allowed to finish so its outcome is recorded and the toolchain is
//! restored); a second interrupt exits immediately.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

/// Exit code used for an immediate (double-interrupt) exit
pub const EXIT_CODE_INTERRUPTED: i32 = 130;

/// Shared interrupt state, written by the signal handler thread
#[derive(Debug, Default)]
pub struct SignalState {
    stop_requested: AtomicBool,
    signal_count: AtomicU8,
}

/// Action to take after receiving a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalAction {
    /// First signal: stop after the current environment
    StopAfterCurrent,
    /// Second signal: exit immediately
    ImmediateExit,
    /// Third and later signals: ignore
    Ignore,
}

impl SignalState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the environment loop should stop before its next iteration
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::SeqCst)
    }

    pub fn signal_count(&self) -> u8 {
        self.signal_count.load(Ordering::SeqCst)
    }

    /// Record one delivered signal and decide what to do
    pub fn handle_signal(&self) -> SignalAction {
        let count = self.signal_count.fetch_add(1, Ordering::SeqCst);
        if count == 0 {
            self.stop_requested.store(true, Ordering::SeqCst);
            SignalAction::StopAfterCurrent
        } else if count == 1 {
            SignalAction::ImmediateExit
        } else {
            SignalAction::Ignore
        }
    }
}

/// Installs the process signal handler and exposes its shared state
pub struct SignalHandler {
    state: Arc<SignalState>,
}

impl SignalHandler {
    pub fn new() -> Self {
        Self {
            state: Arc::new(SignalState::new()),
        }
    }

    /// Shared state, for threading into the pipeline
    pub fn state(&self) -> Arc<SignalState> {
        Arc::clone(&self.state)
    }

    /// Install the SIGINT/SIGTERM handler. Call once at startup.
    pub fn install(&self) -> Result<(), ctrlc::Error> {
        let state = Arc::clone(&self.state);
        ctrlc::set_handler(move || match state.handle_signal() {
            SignalAction::StopAfterCurrent => {
                eprintln!("\nInterrupt received: finishing current environment, then stopping...");
            }
            SignalAction::ImmediateExit => {
                eprintln!("\nSecond interrupt received: exiting immediately.");
                std::process::exit(EXIT_CODE_INTERRUPTED);
            }
            SignalAction::Ignore => {}
        })
    }
}

impl Default for SignalHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let state = SignalState::new();
        assert!(!state.is_stop_requested());
        assert_eq!(state.signal_count(), 0);
    }

    #[test]
    fn test_first_signal_requests_stop() {
        let state = SignalState::new();

        assert_eq!(state.handle_signal(), SignalAction::StopAfterCurrent);
        assert!(state.is_stop_requested());
        assert_eq!(state.signal_count(), 1);
    }

    #[test]
    fn test_second_signal_requests_immediate_exit() {
        let state = SignalState::new();

        state.handle_signal();
        assert_eq!(state.handle_signal(), SignalAction::ImmediateExit);
        assert_eq!(state.signal_count(), 2);
    }

    #[test]
    fn test_later_signals_ignored() {
        let state = SignalState::new();

        state.handle_signal();
        state.handle_signal();
        assert_eq!(state.handle_signal(), SignalAction::Ignore);
    }

    #[test]
    fn test_handler_shares_state() {
        let handler = SignalHandler::new();
        let state = handler.state();

        state.handle_signal();
        assert!(handler.state().is_stop_requested());
    }
}
