//! Runtime configuration.

use std::env;

/// Default number of worker threads.
pub const DEFAULT_WORKERS: usize = 2;

/// Default worker thread name prefix.
pub const DEFAULT_THREAD_NAME: &str = "dflow-worker";

/// Configuration for a [`MainContext`](crate::MainContext) and the derived
/// cells bound to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Worker threads for thread-safe operations. `0` runs compute inline on
    /// the owning thread at dispatch time.
    pub workers: usize,
    /// Initial autorun flag of derived cells created on the context.
    pub autorun: bool,
    /// Worker thread name prefix; threads are named `{thread_name}-{n}`.
    pub thread_name: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            autorun: false,
            thread_name: DEFAULT_THREAD_NAME.to_owned(),
        }
    }
}

impl RuntimeConfig {
    /// Defaults overridden by `DFLOW_WORKERS`, `DFLOW_AUTORUN` and
    /// `DFLOW_THREAD_NAME`. Unparseable values are ignored.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Defaults overridden by values from `lookup`.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(val) = lookup("DFLOW_WORKERS")
            && let Ok(n) = val.trim().parse()
        {
            config.workers = n;
        }
        if let Some(val) = lookup("DFLOW_AUTORUN") {
            config.autorun = val == "1" || val.eq_ignore_ascii_case("true");
        }
        if let Some(val) = lookup("DFLOW_THREAD_NAME")
            && !val.is_empty()
        {
            config.thread_name = val;
        }
        config
    }

    /// Set the worker count.
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Run compute inline on the owning thread.
    #[must_use]
    pub fn inline(self) -> Self {
        self.with_workers(0)
    }

    /// Set the initial autorun flag of derived cells.
    #[must_use]
    pub fn with_autorun(mut self, autorun: bool) -> Self {
        self.autorun = autorun;
        self
    }

    /// Set the worker thread name prefix.
    #[must_use]
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }
}
