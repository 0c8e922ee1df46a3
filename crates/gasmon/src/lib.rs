//! gasmon: gas cylinder monitoring dashboard
//!
//! Wires the reducer in `gas-state`, the key-value mirror in `gas-persist` and
//! the tip provider in `gas-insight` into a [`Controller`], and exposes the
//! command surface used by the `gasmon` binary.

#![forbid(unsafe_code)]

pub mod commands;
pub mod config;
pub mod controller;
pub mod error;

use gas_persist::JsonFileStore;
use std::sync::Arc;

pub use config::GasmonConfig;
pub use controller::{Confirm, Controller, FixedAnswer, Timing};
pub use error::{GasmonError, GasmonResult};

/// Store domain under `state_path/state/`.
pub const STORE_DOMAIN: &str = "dashboard";

/// Build a controller over the on-disk store named by `config`.
pub fn create_controller(config: &GasmonConfig) -> GasmonResult<Controller> {
    let store = JsonFileStore::open(&config.state_path, STORE_DOMAIN);
    let provider = gas_insight::build_provider(&config.insight)?;
    Ok(Controller::new(
        Box::new(store),
        Arc::from(provider),
        Timing {
            refill_delay: config.refill_delay(),
            toast_ttl: config.toast_ttl(),
        },
    ))
}
