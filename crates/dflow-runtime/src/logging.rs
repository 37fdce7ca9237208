//! JSON log output for applications embedding the runtime.
//!
//! Every crate in the workspace emits `tracing` events; nothing is printed
//! until a subscriber is installed. [`init`] installs a JSON formatter
//! filtered by an `EnvFilter` directive string (falling back to `RUST_LOG`).

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

/// Install a global JSON subscriber.
///
/// `filter` uses `EnvFilter` syntax (`"dflow_runtime=debug,info"`). When it
/// is empty the `RUST_LOG` environment variable is used, defaulting to
/// `info`. Fails if a global subscriber is already set or the directive is
/// malformed.
pub fn init(filter: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = if filter.is_empty() {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    } else {
        EnvFilter::try_new(filter)?
    };
    fmt()
        .json()
        .with_env_filter(filter)
        .with_thread_names(true)
        .try_init()
}
