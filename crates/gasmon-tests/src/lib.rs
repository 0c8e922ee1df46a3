//! Shared fixtures for the gasmon integration tests.

#![forbid(unsafe_code)]

use gas_insight::InsightProvider;
use gas_persist::JsonFileStore;
use gasmon::{Controller, STORE_DOMAIN, Timing};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Millisecond timers so scenarios finish quickly.
pub fn fast_timing() -> Timing {
    Timing {
        refill_delay: Duration::from_millis(15),
        toast_ttl: Duration::from_millis(30),
    }
}

pub fn open_store(dir: &Path) -> JsonFileStore {
    JsonFileStore::open(dir, STORE_DOMAIN)
}

/// A controller over the on-disk store in `dir`, as the binary builds it.
pub fn file_controller(dir: &Path, provider: Arc<dyn InsightProvider>) -> Controller {
    Controller::new(Box::new(open_store(dir)), provider, fast_timing())
}
