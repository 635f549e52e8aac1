pub mod batch_tracker;
pub mod bloom;
pub mod config;
pub mod error;
pub mod sorted_ids;

pub use batch_tracker::BatchUpdateTracker;
pub use bloom::BloomFilter;
pub use config::SortedIdsConfig;
pub use error::*;
pub use sorted_ids::{BatchMode, SortedIdSet, SortedIdsStats};

/// Installs a `fmt` subscriber filtered by `RUST_LOG` (default `info`).
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing(service_name: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok();
    if installed {
        tracing::debug!(service = service_name, "tracing initialized");
    }
}
