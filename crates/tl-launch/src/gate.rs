// SPDX-License-Identifier: MIT OR Apache-2.0
//! Readiness handshake between a launch thread and its waiting caller.
//!
//! The launch thread publishes exactly one [`LaunchOutcome`]; the caller
//! blocks on a condition variable until it appears. Publication happens
//! under the mutex, which orders the handle write before the caller's read.

use crate::outcome::{LaunchOutcome, LaunchState};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tl_error::LaunchError;

#[derive(Debug)]
struct GateState {
    outcome: Option<LaunchOutcome>,
    published: bool,
    interrupted: bool,
    state: LaunchState,
}

#[derive(Debug)]
pub(crate) struct StartGate {
    inner: Mutex<GateState>,
    ready: Condvar,
}

impl StartGate {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(GateState {
                outcome: None,
                published: false,
                interrupted: false,
                state: LaunchState::Created,
            }),
            ready: Condvar::new(),
        })
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publish the readiness outcome. Only the first call has an effect.
    pub(crate) fn publish(&self, outcome: LaunchOutcome) -> bool {
        let mut st = self.lock();
        if st.published {
            return false;
        }
        st.state = outcome.state();
        st.outcome = Some(outcome);
        st.published = true;
        drop(st);
        self.ready.notify_all();
        true
    }

    pub(crate) fn set_state(&self, state: LaunchState) {
        self.lock().state = state;
    }

    pub(crate) fn state(&self) -> LaunchState {
        self.lock().state
    }

    pub(crate) fn interrupt(&self) {
        self.lock().interrupted = true;
        self.ready.notify_all();
    }

    pub(crate) fn is_interrupted(&self) -> bool {
        self.lock().interrupted
    }

    /// Block until an outcome is published or the wait is interrupted.
    pub(crate) fn wait(&self) -> LaunchOutcome {
        let mut st = self.lock();
        loop {
            if let Some(outcome) = Self::take_ready(&mut st) {
                return outcome;
            }
            st = self
                .ready
                .wait(st)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Like [`StartGate::wait`], giving up after `timeout`.
    pub(crate) fn wait_timeout(&self, timeout: Duration) -> Option<LaunchOutcome> {
        let deadline = Instant::now() + timeout;
        let mut st = self.lock();
        loop {
            if let Some(outcome) = Self::take_ready(&mut st) {
                return Some(outcome);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return None;
            }
            st = self
                .ready
                .wait_timeout(st, remaining)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    fn take_ready(st: &mut GateState) -> Option<LaunchOutcome> {
        if st.published {
            return Some(
                st.outcome
                    .take()
                    .unwrap_or(LaunchOutcome::Failed(LaunchError::TaskAborted)),
            );
        }
        if st.interrupted {
            return Some(LaunchOutcome::Failed(LaunchError::InterruptedWait));
        }
        None
    }
}

/// Publishes [`LaunchError::TaskAborted`] if the launch thread unwinds
/// before it published anything.
pub(crate) struct PublishGuard {
    gate: Arc<StartGate>,
}

impl PublishGuard {
    pub(crate) fn new(gate: Arc<StartGate>) -> Self {
        Self { gate }
    }
}

impl Drop for PublishGuard {
    fn drop(&mut self) {
        self.gate
            .publish(LaunchOutcome::Failed(LaunchError::TaskAborted));
    }
}

/// Cloneable handle for observing a pending launch and interrupting its waiter.
#[derive(Debug, Clone)]
pub struct WaitInterrupter {
    gate: Arc<StartGate>,
}

impl WaitInterrupter {
    pub(crate) fn new(gate: Arc<StartGate>) -> Self {
        Self { gate }
    }

    /// Wake the waiting caller; its wait returns
    /// [`LaunchError::InterruptedWait`] unless readiness was already
    /// published. The flag stays set.
    pub fn interrupt(&self) {
        self.gate.interrupt();
    }

    /// Returns `true` once [`WaitInterrupter::interrupt`] has been called.
    pub fn is_interrupted(&self) -> bool {
        self.gate.is_interrupted()
    }

    /// Current lifecycle state of the launch.
    pub fn state(&self) -> LaunchState {
        self.gate.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn wait_returns_published_outcome() {
        let gate = StartGate::new();
        let publisher = gate.clone();
        let t = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            publisher.publish(LaunchOutcome::NoOp)
        });
        assert!(gate.wait().is_noop());
        assert!(t.join().unwrap());
        assert_eq!(gate.state(), LaunchState::StartedNoProcess);
    }

    #[test]
    fn only_first_publish_counts() {
        let gate = StartGate::new();
        assert!(gate.publish(LaunchOutcome::NoOp));
        assert!(!gate.publish(LaunchOutcome::Failed(LaunchError::TaskAborted)));
        assert!(gate.wait().is_noop());
    }

    #[test]
    fn interrupt_wakes_waiter_and_stays_set() {
        let gate = StartGate::new();
        let interrupter = WaitInterrupter::new(gate.clone());
        let t = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            interrupter.interrupt();
            interrupter
        });
        let outcome = gate.wait();
        assert!(matches!(
            outcome,
            LaunchOutcome::Failed(LaunchError::InterruptedWait)
        ));
        let interrupter = t.join().unwrap();
        assert!(interrupter.is_interrupted());
    }

    #[test]
    fn published_outcome_wins_over_interrupt() {
        let gate = StartGate::new();
        gate.publish(LaunchOutcome::NoOp);
        gate.interrupt();
        assert!(gate.wait().is_noop());
        assert!(gate.is_interrupted());
    }

    #[test]
    fn wait_timeout_expires_without_publication() {
        let gate = StartGate::new();
        let started = Instant::now();
        assert!(gate.wait_timeout(Duration::from_millis(50)).is_none());
        assert!(started.elapsed() >= Duration::from_millis(50));
        assert_eq!(gate.state(), LaunchState::Created);
    }

    #[test]
    fn guard_publishes_abort_when_dropped_first() {
        let gate = StartGate::new();
        drop(PublishGuard::new(gate.clone()));
        assert!(matches!(
            gate.wait(),
            LaunchOutcome::Failed(LaunchError::TaskAborted)
        ));
    }

    #[test]
    fn guard_is_silent_after_publication() {
        let gate = StartGate::new();
        let guard = PublishGuard::new(gate.clone());
        gate.publish(LaunchOutcome::NoOp);
        drop(guard);
        assert!(gate.wait().is_noop());
    }

    #[test]
    fn panicking_task_does_not_strand_waiter() {
        let gate = StartGate::new();
        let task_gate = gate.clone();
        let t = thread::spawn(move || {
            let _guard = PublishGuard::new(task_gate);
            panic!("launch task blew up");
        });
        assert!(t.join().is_err());
        assert!(matches!(
            gate.wait(),
            LaunchOutcome::Failed(LaunchError::TaskAborted)
        ));
    }
}
