#![forbid(unsafe_code)]

//! The main context: owner-thread event loop for compute completions.
//!
//! A [`MainContext`] owns a lazily started [`WorkerPool`] and the completion
//! queue. [`spawn`](MainContext::spawn) moves task data to a worker (or to
//! the inline queue) and registers a completion callback. Callbacks run only
//! when the owning thread calls [`dispatch_pending`](MainContext::dispatch_pending),
//! [`iterate`](MainContext::iterate) or
//! [`run_until_idle`](MainContext::run_until_idle), never on a worker.
//!
//! # Inline mode
//!
//! With `workers == 0` (or after a failed pool start) jobs are queued and
//! computed on the owning thread at the next dispatch. Completion is still
//! deferred, so callers observe the same `Running` window in both modes.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use ahash::AHashMap;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use dflow_core::TaskData;
use tracing::{debug, trace, warn};
use web_time::Instant;

use crate::config::RuntimeConfig;
use crate::pool::{Completion, Job, Outcome, WorkerPool, run_job};

type CompletionFn = Box<dyn FnOnce(Box<dyn TaskData>, Outcome)>;

#[derive(Debug)]
enum PoolState {
    NotStarted,
    Running(WorkerPool),
    Inline,
}

struct Inner {
    config: RuntimeConfig,
    pool: RefCell<PoolState>,
    completion_tx: Sender<Completion>,
    completion_rx: Receiver<Completion>,
    pending: RefCell<AHashMap<u64, CompletionFn>>,
    inline: RefCell<VecDeque<Job>>,
    next_id: Cell<u64>,
}

/// Handle to a main context. Clones share the same context.
#[derive(Clone)]
pub struct MainContext {
    inner: Rc<Inner>,
}

impl std::fmt::Debug for MainContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MainContext")
            .field("config", &self.inner.config)
            .field("in_flight", &self.in_flight())
            .finish_non_exhaustive()
    }
}

thread_local! {
    static THREAD_DEFAULT: MainContext = MainContext::new(RuntimeConfig::from_env());
}

impl MainContext {
    #[must_use]
    pub fn new(config: RuntimeConfig) -> Self {
        let (completion_tx, completion_rx) = crossbeam_channel::unbounded();
        Self {
            inner: Rc::new(Inner {
                config,
                pool: RefCell::new(PoolState::NotStarted),
                completion_tx,
                completion_rx,
                pending: RefCell::new(AHashMap::new()),
                inline: RefCell::new(VecDeque::new()),
                next_id: Cell::new(0),
            }),
        }
    }

    /// The calling thread's default context, created on first use from
    /// [`RuntimeConfig::from_env`].
    #[must_use]
    pub fn thread_default() -> Self {
        THREAD_DEFAULT.with(Clone::clone)
    }

    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.inner.config
    }

    /// Whether two handles refer to the same context.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Whether compute runs on the owning thread.
    #[must_use]
    pub fn is_inline(&self) -> bool {
        self.inner.config.workers == 0
            || matches!(*self.inner.pool.borrow(), PoolState::Inline)
    }

    /// Jobs spawned whose completion has not been delivered yet.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.inner.pending.borrow().len()
    }

    /// Compute `task` off the calling thread and deliver it to `on_complete`
    /// on this context. Returns the job id.
    pub fn spawn(
        &self,
        task: Box<dyn TaskData>,
        on_complete: impl FnOnce(Box<dyn TaskData>, Outcome) + 'static,
    ) -> u64 {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id.wrapping_add(1));
        self.inner
            .pending
            .borrow_mut()
            .insert(id, Box::new(on_complete));

        let job = Job { id, task };
        let rejected = {
            let mut pool = self.inner.pool.borrow_mut();
            self.start_pool(&mut *pool);
            match &*pool {
                PoolState::Running(workers) => workers.submit(job).err(),
                PoolState::Inline | PoolState::NotStarted => Some(job),
            }
        };
        if let Some(job) = rejected {
            self.inner.inline.borrow_mut().push_back(job);
        }
        trace!(id, "context.spawn");
        id
    }

    fn start_pool(&self, pool: &mut PoolState) {
        if !matches!(pool, PoolState::NotStarted) {
            return;
        }
        let config = &self.inner.config;
        *pool = if config.workers == 0 {
            PoolState::Inline
        } else {
            match WorkerPool::start(config.workers, &config.thread_name, &self.inner.completion_tx)
            {
                Ok(workers) => {
                    debug!(workers = config.workers, name = %config.thread_name, "context.pool_started");
                    PoolState::Running(workers)
                }
                Err(err) => {
                    warn!(error = %err, "context.pool_spawn_failed; computing inline");
                    PoolState::Inline
                }
            }
        };
    }

    fn deliver(&self, completion: Completion) {
        let Completion { id, task, outcome } = completion;
        let callback = self.inner.pending.borrow_mut().remove(&id);
        match callback {
            Some(callback) => callback(task, outcome),
            None => trace!(id, "context.orphan_completion"),
        }
    }

    /// Deliver every completion that is ready now. Jobs queued for inline
    /// execution before this call are computed first. Returns the number of
    /// completions delivered.
    pub fn dispatch_pending(&self) -> usize {
        let mut delivered = 0;
        let queued: Vec<Job> = self.inner.inline.borrow_mut().drain(..).collect();
        for job in queued {
            self.deliver(run_job(job));
            delivered += 1;
        }
        while let Ok(completion) = self.inner.completion_rx.try_recv() {
            self.deliver(completion);
            delivered += 1;
        }
        delivered
    }

    /// Deliver ready completions, blocking up to `timeout` for one if nothing
    /// is ready but work is in flight. Returns the number delivered.
    pub fn iterate(&self, timeout: Duration) -> usize {
        let delivered = self.dispatch_pending();
        if delivered > 0 || self.in_flight() == 0 {
            return delivered;
        }
        if !self.inner.inline.borrow().is_empty() {
            return self.dispatch_pending();
        }
        match self.inner.completion_rx.recv_timeout(timeout) {
            Ok(completion) => {
                self.deliver(completion);
                1 + self.dispatch_pending()
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => 0,
        }
    }

    /// Dispatch until nothing is in flight or `timeout` elapses. Returns
    /// whether the context went idle.
    pub fn run_until_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.dispatch_pending();
            if self.in_flight() == 0 {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            if !self.inner.inline.borrow().is_empty() {
                continue;
            }
            match self.inner.completion_rx.recv_timeout(deadline - now) {
                Ok(completion) => self.deliver(completion),
                Err(RecvTimeoutError::Timeout) => return self.in_flight() == 0,
                Err(RecvTimeoutError::Disconnected) => return false,
            }
        }
    }
}
