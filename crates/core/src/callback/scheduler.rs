//! Callback worker pool
//!
//! Continuations run on a fixed set of named threads. Shutdown waits for
//! every reserved slot, including dispatches still on the network.

use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use rednit_domain::{RednitError, Result};
use tracing::{debug, error, info, warn};

use super::context::{CallbackContext, CallbackOrigin};
use super::continuation::panic_message;
use crate::clock::saturating_millis;

type Job = Box<dyn FnOnce() + Send + 'static>;

struct PoolState {
    jobs: VecDeque<Job>,
    /// Reserved slots not yet finished: queued, running, or still in flight.
    pending: usize,
    closed: bool,
}

struct Shared {
    state: Mutex<PoolState>,
    job_ready: Condvar,
    drained: Condvar,
}

impl Shared {
    fn release(&self, state: &mut PoolState) {
        state.pending = state.pending.saturating_sub(1);
        if state.pending == 0 {
            self.drained.notify_all();
            if state.closed {
                self.job_ready.notify_all();
            }
        }
    }
}

/// Fixed pool of threads running continuations
///
/// Work is accounted for from the moment it is reserved, so
/// [`shutdown`](Self::shutdown) also waits for dispatches whose result has
/// not arrived yet.
pub struct CallbackScheduler {
    shared: Arc<Shared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    size: usize,
}

impl CallbackScheduler {
    /// Start a pool with `workers` threads.
    ///
    /// # Errors
    /// Returns `RednitError::Config` if `workers` is zero or a thread cannot
    /// be spawned.
    pub fn new(workers: usize) -> Result<Self> {
        if workers == 0 {
            return Err(RednitError::Config("callback pool needs at least one worker".into()));
        }

        let shared = Arc::new(Shared {
            state: Mutex::new(PoolState { jobs: VecDeque::new(), pending: 0, closed: false }),
            job_ready: Condvar::new(),
            drained: Condvar::new(),
        });
        let scheduler = Self { shared, workers: Mutex::new(Vec::with_capacity(workers)), size: workers };

        for index in 0..workers {
            let shared = Arc::clone(&scheduler.shared);
            let handle = thread::Builder::new()
                .name(format!("rednit-callback-{index}"))
                .spawn(move || worker_loop(index, &shared))
                .map_err(|e| RednitError::Config(format!("failed to spawn callback worker: {e}")))?;
            scheduler.workers.lock().push(handle);
        }

        debug!(workers, "Callback pool started");
        Ok(scheduler)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Reserved slots not yet finished.
    pub fn pending(&self) -> usize {
        self.shared.state.lock().pending
    }

    pub fn is_shut_down(&self) -> bool {
        self.shared.state.lock().closed
    }

    /// Reserve a slot for a job that will be delivered later.
    ///
    /// # Errors
    /// Returns `RednitError::Shutdown` once shutdown has begun.
    pub fn reserve(&self) -> Result<Ticket> {
        let mut state = self.shared.state.lock();
        if state.closed {
            return Err(RednitError::Shutdown);
        }
        state.pending += 1;
        Ok(Ticket { shared: Arc::clone(&self.shared), delivered: false })
    }

    /// Run `job` on the pool.
    ///
    /// # Errors
    /// Returns `RednitError::Shutdown` once shutdown has begun.
    pub fn execute(&self, job: impl FnOnce() + Send + 'static) -> Result<()> {
        self.reserve()?.deliver(job);
        Ok(())
    }

    /// Stop accepting work and wait up to `timeout` for reserved work to finish.
    ///
    /// Workers are joined when the pool drains in time. On timeout they are
    /// left running detached and will exit once their last job finishes.
    ///
    /// # Errors
    /// - `RednitError::Reentrancy` when called from a continuation
    /// - `RednitError::ShutdownTimeout` when work is still pending at the deadline
    pub fn shutdown(&self, timeout: Duration) -> Result<()> {
        if CallbackContext::is_active() {
            return Err(RednitError::Reentrancy);
        }

        let deadline = Instant::now() + timeout;
        let mut state = self.shared.state.lock();
        state.closed = true;
        self.shared.job_ready.notify_all();

        while state.pending > 0 {
            if self.shared.drained.wait_until(&mut state, deadline).timed_out() && state.pending > 0 {
                let pending = state.pending;
                warn!(
                    pending,
                    timeout_ms = saturating_millis(timeout),
                    "Callback pool did not drain in time"
                );
                return Err(RednitError::ShutdownTimeout { timeout, pending });
            }
        }
        drop(state);
        self.shared.job_ready.notify_all();

        let handles = std::mem::take(&mut *self.workers.lock());
        for handle in handles {
            if handle.join().is_err() {
                warn!("Callback worker exited abnormally");
            }
        }
        info!("Callback pool shut down");
        Ok(())
    }
}

impl Drop for CallbackScheduler {
    fn drop(&mut self) {
        self.shared.state.lock().closed = true;
        self.shared.job_ready.notify_all();
    }
}

/// A reserved slot on the callback pool
///
/// Dropping a ticket without delivering releases the slot.
pub struct Ticket {
    shared: Arc<Shared>,
    delivered: bool,
}

impl Ticket {
    pub fn deliver(mut self, job: impl FnOnce() + Send + 'static) {
        self.shared.state.lock().jobs.push_back(Box::new(job));
        self.delivered = true;
        self.shared.job_ready.notify_one();
    }
}

impl Drop for Ticket {
    fn drop(&mut self) {
        if !self.delivered {
            let mut state = self.shared.state.lock();
            self.shared.release(&mut state);
        }
    }
}

fn worker_loop(index: usize, shared: &Shared) {
    let context = CallbackContext::new(CallbackOrigin::Worker(index));

    loop {
        let job = {
            let mut state = shared.state.lock();
            loop {
                if let Some(job) = state.jobs.pop_front() {
                    break job;
                }
                if state.closed && state.pending == 0 {
                    debug!(worker = index, "Callback worker exiting");
                    return;
                }
                shared.job_ready.wait(&mut state);
            }
        };

        if let Err(payload) = catch_unwind(AssertUnwindSafe(|| context.scope(job))) {
            error!(worker = index, panic = %panic_message(payload.as_ref()), "Callback job panicked");
        }

        let mut state = shared.state.lock();
        shared.release(&mut state);
    }
}
