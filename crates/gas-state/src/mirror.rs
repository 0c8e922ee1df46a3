//! Storage mirror: rebuilds [`AppState`] from a [`KvStore`] and writes it
//! back after every transition.
//!
//! Unparseable values fall back to their defaults with a warning.

use crate::{AppState, Tank};
use gas_persist::KvStore;
use gas_proto::{DEFAULT_LEVEL, Order, VendorSettings, View, clamp_level, snap_threshold};
use serde::Serialize;
use tracing::{debug, warn};

pub const AUTH_KEY: &str = "gas_monitor_auth";
pub const LEVEL_KEY: &str = "gas_monitor_level";
pub const LEAK_KEY: &str = "gas_monitor_leak";
pub const SETTINGS_KEY: &str = "gas_monitor_settings";
pub const ORDERS_KEY: &str = "gas_monitor_orders";

/// Reconstruct state from the store. Missing keys take the fresh defaults.
pub fn hydrate(store: &dyn KvStore) -> AppState {
    let authenticated = store.get(AUTH_KEY).as_deref() == Some("true");

    let level = match store.get(LEVEL_KEY) {
        Some(raw) => match raw.trim().parse::<i64>() {
            Ok(n) => clamp_level(n),
            Err(e) => {
                warn!(key = LEVEL_KEY, value = %raw, error = %e, "unparseable level, using default");
                DEFAULT_LEVEL
            }
        },
        None => DEFAULT_LEVEL,
    };

    let mut settings: VendorSettings = parse_json(store, SETTINGS_KEY).unwrap_or_default();
    settings.refill_threshold = snap_threshold(i64::from(settings.refill_threshold));

    let orders: Vec<Order> = parse_json(store, ORDERS_KEY).unwrap_or_else(|| vec![Order::seed()]);

    let state = AppState {
        view: if authenticated {
            View::Dashboard
        } else {
            View::Landing
        },
        tank: Tank {
            level,
            leak_detected: store.get(LEAK_KEY).as_deref() == Some("true"),
        },
        settings,
        orders,
        ..AppState::default()
    };
    debug!(view = %state.view, level = state.tank.level, orders = state.orders.len(), "hydrated state");
    state
}

/// Write every persisted field. Failures are logged and skipped.
pub fn mirror(state: &AppState, store: &mut dyn KvStore) {
    write(store, AUTH_KEY, state.authenticated().to_string());
    write(store, LEVEL_KEY, state.tank.level.to_string());
    write(store, LEAK_KEY, state.tank.leak_detected.to_string());
    if let Some(json) = to_json(SETTINGS_KEY, &state.settings) {
        write(store, SETTINGS_KEY, json);
    }
    if let Some(json) = to_json(ORDERS_KEY, &state.orders) {
        write(store, ORDERS_KEY, json);
    }
}

fn parse_json<T: for<'de> serde::Deserialize<'de>>(store: &dyn KvStore, key: &str) -> Option<T> {
    let raw = store.get(key)?;
    serde_json::from_str(&raw)
        .map_err(|e| warn!(key, error = %e, "unparseable record, using default"))
        .ok()
}

fn to_json<T: Serialize>(key: &str, value: &T) -> Option<String> {
    serde_json::to_string(value)
        .map_err(|e| warn!(key, error = %e, "failed to encode record"))
        .ok()
}

fn write(store: &mut dyn KvStore, key: &str, value: String) {
    if let Err(e) = store.set(key, value) {
        warn!(key, error = %e, "failed to persist value");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Action, reduce};
    use gas_persist::{JsonFileStore, MemoryStore};
    use gas_proto::{OrderStatus, Vendor};

    #[test]
    fn test_hydrate_empty_store_gives_fresh_state() {
        let store = MemoryStore::new();
        let state = hydrate(&store);
        assert_eq!(state, AppState::default());
    }

    #[test]
    fn test_threshold_round_trips() {
        let mut store = MemoryStore::new();
        let mut state = hydrate(&store);
        reduce(&mut state, Action::SetThreshold(35));
        mirror(&state, &mut store);

        let reloaded = hydrate(&store);
        assert_eq!(reloaded.settings.refill_threshold, 35);
    }

    #[test]
    fn test_every_field_round_trips_through_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        {
            let mut store = JsonFileStore::open(dir.path(), "dashboard");
            let mut state = hydrate(&store);
            state.view = View::Dashboard;
            state.tank.level = 41;
            state.tank.leak_detected = true;
            state.settings = VendorSettings {
                preferred_vendor: Vendor::IndaneGas,
                refill_threshold: 45,
                auto_pay: true,
                pay_on_delivery: false,
            };
            reduce(
                &mut state,
                Action::PlaceOrder {
                    id: "654321".to_string(),
                    date: "Oct 14, 2026".to_string(),
                },
            );
            mirror(&state, &mut store);
        }

        let store = JsonFileStore::open(dir.path(), "dashboard");
        let state = hydrate(&store);
        assert_eq!(state.view, View::Dashboard);
        assert_eq!(state.tank.level, 41);
        assert!(state.tank.leak_detected);
        assert_eq!(state.settings.preferred_vendor, Vendor::IndaneGas);
        assert_eq!(state.settings.refill_threshold, 45);
        assert!(state.settings.auto_pay);
        assert!(!state.settings.pay_on_delivery);
        assert_eq!(state.orders.len(), 2);
        assert_eq!(state.orders[0].id, "654321");
        assert_eq!(state.orders[0].status, OrderStatus::Pending);
        assert_eq!(state.orders[1].id, "2024001");
    }

    #[test]
    fn test_string_encodings() {
        let mut store = MemoryStore::new();
        let state = AppState::default();
        mirror(&state, &mut store);
        assert_eq!(store.get(AUTH_KEY).as_deref(), Some("false"));
        assert_eq!(store.get(LEVEL_KEY).as_deref(), Some("72"));
        assert_eq!(store.get(LEAK_KEY).as_deref(), Some("false"));
        let settings = store.get(SETTINGS_KEY).expect("settings");
        assert!(settings.contains("\"preferredVendor\":\"Bharat Gas\""));
        let orders = store.get(ORDERS_KEY).expect("orders");
        assert!(orders.starts_with('['));
    }

    #[test]
    fn test_malformed_values_fall_back() {
        let store = MemoryStore::with_entries([
            (LEVEL_KEY, "lots"),
            (SETTINGS_KEY, "{broken"),
            (ORDERS_KEY, "not a list"),
            (AUTH_KEY, "yes"),
        ]);
        let state = hydrate(&store);
        assert_eq!(state.tank.level, DEFAULT_LEVEL);
        assert_eq!(state.settings, VendorSettings::default());
        assert_eq!(state.orders, vec![Order::seed()]);
        assert_eq!(state.view, View::Landing);
    }

    #[test]
    fn test_out_of_range_values_are_constrained() {
        let store = MemoryStore::with_entries([
            (LEVEL_KEY, "180"),
            (
                SETTINGS_KEY,
                r#"{"preferredVendor":"HP Gas","refillThreshold":3,"autoPay":false,"payOnDelivery":true}"#,
            ),
        ]);
        let state = hydrate(&store);
        assert_eq!(state.tank.level, 100);
        assert_eq!(state.settings.refill_threshold, 5);

        let store = MemoryStore::with_entries([(LEVEL_KEY, "-4")]);
        assert_eq!(hydrate(&store).tank.level, 0);
    }

    #[test]
    fn test_persisted_empty_order_list_stays_empty() {
        let store = MemoryStore::with_entries([(ORDERS_KEY, "[]")]);
        assert!(hydrate(&store).orders.is_empty());
    }
}
