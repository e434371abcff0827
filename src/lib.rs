// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod config;
pub mod delta;
pub mod metrics;
pub mod normalize;
pub mod record;
pub mod state;

// Collaborators: where rows come from and where alerts go
pub mod notify;
pub mod scrape;

// Orchestration
pub mod bootstrap;
pub mod scheduler;
pub mod watcher;

// ---- Re-exports for stable public API ----
pub use crate::delta::{compare, diff, Comparison, Delta, EmptyScrapeWarning};
pub use crate::normalize::{Normalized, Normalizer, TierFilter};
pub use crate::notify::{DispatchError, DispatchFailure, Notifier, NotifierMux};
pub use crate::record::{IdentityKey, KeyStrategy, RawRecord, TournamentRecord};
pub use crate::scrape::{ScrapeError, Scraper};
pub use crate::state::{StateError, StateSnapshot, StateStore};
pub use crate::watcher::{RunError, RunOptions, RunReport, RunStatus, Watcher};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const DEFAULT_LOG_FILTER: &str = "padel_watch=info,run=info,watch=info,notify=info,scrape=info,warn";

/// Install the global tracing subscriber. `RUST_LOG` wins over the default
/// filter; `json` switches to one JSON object per line.
pub fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}
