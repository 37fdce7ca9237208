#![forbid(unsafe_code)]

//! Worker threads for thread-safe operation compute.
//!
//! Jobs are task data moved onto a shared multi-consumer queue. A worker runs
//! `TaskData::compute` and sends the task back on the completion channel
//! together with an [`Outcome`]. Workers never touch cells or notifiers.
//!
//! # Failure Modes
//!
//! - **Panicking compute**: caught on the worker and reported as
//!   [`Outcome::Panicked`]; the worker keeps serving jobs.
//! - **Spawn failure**: [`WorkerPool::start`] joins any threads already
//!   started and returns the error.
//! - **Shutdown**: dropping the pool closes the job queue and joins every
//!   worker. Jobs already queued are still computed.

use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};
use dflow_core::TaskData;
use tracing::{trace, warn};

/// A unit of work: task data tagged with its completion id.
pub struct Job {
    pub id: u64,
    pub task: Box<dyn TaskData>,
}

impl std::fmt::Debug for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job").field("id", &self.id).finish_non_exhaustive()
    }
}

/// Result of running a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Compute returned an output.
    Produced,
    /// Compute returned no output.
    Empty,
    /// Compute panicked; the payload message.
    Panicked(String),
}

/// A finished job travelling back to its context.
pub struct Completion {
    pub id: u64,
    pub task: Box<dyn TaskData>,
    pub outcome: Outcome,
}

impl std::fmt::Debug for Completion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Completion")
            .field("id", &self.id)
            .field("outcome", &self.outcome)
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

/// Run `job` on the current thread.
pub fn run_job(job: Job) -> Completion {
    let Job { id, mut task } = job;
    let result = panic::catch_unwind(AssertUnwindSafe(|| task.compute().is_some()));
    let outcome = match result {
        Ok(true) => Outcome::Produced,
        Ok(false) => Outcome::Empty,
        Err(payload) => Outcome::Panicked(panic_message(payload.as_ref())),
    };
    Completion { id, task, outcome }
}

fn worker_loop(name: &str, jobs: Receiver<Job>, completions: Sender<Completion>) {
    while let Ok(job) = jobs.recv() {
        trace!(worker = name, id = job.id, "pool.job_start");
        let completion = run_job(job);
        if let Outcome::Panicked(msg) = &completion.outcome {
            warn!(worker = name, id = completion.id, panic = %msg, "pool.job_panicked");
        }
        if completions.send(completion).is_err() {
            // Context gone; nobody is waiting for results.
            return;
        }
    }
}

/// Fixed-size pool of named worker threads.
#[derive(Debug)]
pub struct WorkerPool {
    jobs: Option<Sender<Job>>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `workers` threads named `{name}-{n}` that send finished jobs to
    /// `completions`.
    pub fn start(workers: usize, name: &str, completions: &Sender<Completion>) -> io::Result<Self> {
        let (tx, rx) = crossbeam_channel::unbounded::<Job>();
        let mut pool = Self {
            jobs: Some(tx),
            handles: Vec::with_capacity(workers),
        };
        for n in 0..workers {
            let thread_name = format!("{name}-{n}");
            let jobs = rx.clone();
            let completions = completions.clone();
            let handle = thread::Builder::new()
                .name(thread_name.clone())
                .spawn(move || worker_loop(&thread_name, jobs, completions))?;
            pool.handles.push(handle);
        }
        Ok(pool)
    }

    /// Queue `job`. Hands the job back if the pool has shut down.
    pub fn submit(&self, job: Job) -> Result<(), Job> {
        match &self.jobs {
            Some(tx) => tx.send(job).map_err(|e| e.into_inner()),
            None => Err(job),
        }
    }

    #[must_use]
    pub fn workers(&self) -> usize {
        self.handles.len()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Closing the queue lets every worker fall out of `recv`.
        self.jobs.take();
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}
