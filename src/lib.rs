pub mod bounded_queue;
pub mod chain;
pub mod channel;
pub mod config;
pub mod error;
pub mod metrics;
pub mod order;
pub mod source;
pub mod stage;

pub use chain::{SortOutcome, sort, sort_by};
pub use config::PipelineConfig;
pub use error::*;
pub use order::{MergeOrder, SortOrder};

use tracing_subscriber::EnvFilter;

/// Installs a stderr subscriber filtered by `PIPESORT_LOG` (default `warn`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("PIPESORT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_thread_names(true)
        .try_init();
}
