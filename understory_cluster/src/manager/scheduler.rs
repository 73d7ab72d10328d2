// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Single-slot job queue with generation-based cancellation.

use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::trace;

use crate::algorithm::{CancelToken, Generations};

/// Identifies one [`cluster`](crate::ClusterManager::cluster) request.
///
/// Generations increase strictly; a later request always has a larger value.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Generation(u64);

impl Generation {
    /// Raw counter value.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// A recompute request waiting for the worker.
#[derive(Clone, Debug)]
pub(crate) struct Job {
    pub(crate) zoom: f64,
    pub(crate) token: CancelToken,
}

impl Job {
    pub(crate) fn generation(&self) -> Generation {
        Generation(self.token.generation())
    }
}

#[derive(Debug, Default)]
pub(crate) struct State {
    pending: Option<Job>,
    shutdown: bool,
}

impl State {
    pub(crate) fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub(crate) fn is_shutdown(&self) -> bool {
        self.shutdown
    }
}

/// Scheduling state shared between the manager and its worker.
///
/// Submitting advances the generation while holding the state lock, and the
/// worker delivers while holding the same lock, so a result whose token is
/// still live at delivery time belongs to the newest request.
///
/// Background precaching runs on a separate counter that both new requests
/// and item mutations advance.
#[derive(Debug, Default)]
pub(crate) struct Scheduler {
    state: Mutex<State>,
    wake: Condvar,
    generations: Generations,
    precache: Generations,
}

impl Scheduler {
    /// Queue a recompute at `zoom`, cancelling whatever ran or waited before.
    pub(crate) fn submit(&self, zoom: f64) -> Generation {
        let mut state = self.state.lock();
        let token = self.generations.advance();
        self.precache.advance();
        let job = Job { zoom, token };
        let generation = job.generation();
        if let Some(replaced) = state.pending.replace(job) {
            trace!(
                replaced = replaced.generation().get(),
                "dropped pending cluster job"
            );
        }
        drop(state);
        self.wake.notify_one();
        generation
    }

    /// Block until a job is available. `None` once shut down.
    pub(crate) fn next_job(&self) -> Option<Job> {
        let mut state = self.state.lock();
        loop {
            if state.shutdown {
                return None;
            }
            if let Some(job) = state.pending.take() {
                return Some(job);
            }
            self.wake.wait(&mut state);
        }
    }

    /// Hold the state lock, e.g. across delivery.
    pub(crate) fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock()
    }

    /// Token for a precache run, cancelled by the next submit or mutation.
    pub(crate) fn precache_token(&self) -> CancelToken {
        self.precache.advance()
    }

    /// Stop any precache run so a writer does not wait behind it.
    pub(crate) fn cancel_precache(&self) {
        self.precache.advance();
    }

    /// Most recently issued generation.
    pub(crate) fn latest(&self) -> Generation {
        Generation(self.generations.current())
    }

    /// Stop the worker and cancel any running job.
    pub(crate) fn shutdown(&self) {
        let mut state = self.state.lock();
        state.shutdown = true;
        state.pending = None;
        // Cancels the in-flight tokens too.
        self.generations.advance();
        self.precache.advance();
        drop(state);
        self.wake.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn newer_submit_replaces_pending_job() {
        let s = Scheduler::default();
        let first = s.submit(3.0);
        let second = s.submit(7.0);
        assert!(second > first);
        assert_eq!(s.latest(), second);
        let job = s.next_job().unwrap();
        assert_eq!(job.zoom, 7.0);
        assert_eq!(job.generation(), second);
        assert!(!job.token.is_cancelled());
        assert!(!s.lock().has_pending());
    }

    #[test]
    fn submit_cancels_taken_job() {
        let s = Scheduler::default();
        s.submit(1.0);
        let running = s.next_job().unwrap();
        s.submit(2.0);
        assert!(running.token.is_cancelled());
        assert!(s.lock().has_pending());
    }

    #[test]
    fn submit_and_mutation_cancel_precache() {
        let s = Scheduler::default();
        let warm = s.precache_token();
        s.submit(1.0);
        assert!(warm.is_cancelled());

        let warm = s.precache_token();
        assert!(!warm.is_cancelled());
        s.cancel_precache();
        assert!(warm.is_cancelled());
        let job = s.next_job().unwrap();
        assert!(!job.token.is_cancelled(), "precache counter is separate");
    }

    #[test]
    fn shutdown_wakes_waiting_worker() {
        let s = Arc::new(Scheduler::default());
        let worker = {
            let s = Arc::clone(&s);
            thread::spawn(move || s.next_job().is_none())
        };
        s.shutdown();
        assert!(worker.join().unwrap());
        assert!(s.lock().is_shutdown());
        s.submit(4.0);
        assert!(s.next_job().is_none());
    }
}
