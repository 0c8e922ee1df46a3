//! View-state reducer for the gasmon dashboard.
//!
//! All state lives in [`AppState`]. UI events arrive as [`Action`]s and are
//! applied by [`reduce`], which mutates the state and returns the
//! [`Effect`]s the caller must run (timers, insight fetches). Nothing in
//! this crate sleeps or does I/O apart from the storage mirror in
//! [`mirror`].

#![forbid(unsafe_code)]

pub mod mirror;

use gas_proto::{
    CRITICAL_LEVEL, DEFAULT_LEVEL, FULL_LEVEL, Order, Toast, ToastKind, Vendor, VendorSettings,
    View, clamp_level, snap_threshold,
};
use serde::Serialize;
use tracing::{debug, info};

pub use mirror::{hydrate, mirror};

/// Shown while no insight has arrived yet.
pub const INSIGHT_PLACEHOLDER: &str = "Analyzing environment...";

// ─── State ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tank {
    pub level: u8,
    pub leak_detected: bool,
}

impl Default for Tank {
    fn default() -> Self {
        Self {
            level: DEFAULT_LEVEL,
            leak_detected: false,
        }
    }
}

impl Tank {
    pub fn fill_percent(&self) -> u8 {
        clamp_level(i64::from(self.level))
    }

    /// Rough estimate at four days per ten percent.
    pub fn days_left(&self) -> u32 {
        u32::from(self.fill_percent()) / 4
    }

    pub fn is_critical(&self) -> bool {
        self.fill_percent() < CRITICAL_LEVEL
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppState {
    pub view: View,
    pub tank: Tank,
    pub refilling: bool,
    pub settings: VendorSettings,
    pub orders: Vec<Order>,
    pub toast: Option<Toast>,
    pub vendor_dropdown_open: bool,
    pub learn_more_open: bool,
    pub insight: String,
    pub pending_deletion: Option<String>,
    #[serde(skip)]
    insight_seq: u64,
    #[serde(skip)]
    next_toast_id: u64,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            view: View::Landing,
            tank: Tank::default(),
            refilling: false,
            settings: VendorSettings::default(),
            orders: vec![Order::seed()],
            toast: None,
            vendor_dropdown_open: false,
            learn_more_open: false,
            insight: String::new(),
            pending_deletion: None,
            insight_seq: 0,
            next_toast_id: 0,
        }
    }
}

impl AppState {
    pub fn authenticated(&self) -> bool {
        self.view == View::Dashboard
    }

    /// Sequence number of the most recently issued insight fetch.
    pub fn insight_seq(&self) -> u64 {
        self.insight_seq
    }

    pub fn refill_recommended(&self) -> bool {
        self.tank.fill_percent() < self.settings.refill_threshold
    }

    /// Text of the bell-icon preview.
    pub fn level_preview(&self) -> String {
        let verdict = if self.refill_recommended() {
            "Refill recommended."
        } else {
            "Level is healthy."
        };
        format!("Cylinder is at {}%. {verdict}", self.tank.fill_percent())
    }

    pub fn insight_display(&self) -> &str {
        if self.insight.is_empty() {
            INSIGHT_PLACEHOLDER
        } else {
            &self.insight
        }
    }

    fn toast(&mut self, message: impl Into<String>, kind: ToastKind) -> Effect {
        self.next_toast_id += 1;
        let id = self.next_toast_id;
        self.toast = Some(Toast {
            id,
            message: message.into(),
            kind,
        });
        Effect::ScheduleToastDismiss { id }
    }

    fn issue_insight_fetch(&mut self) -> Effect {
        self.insight_seq += 1;
        Effect::FetchInsight {
            seq: self.insight_seq,
            level: self.tank.fill_percent(),
        }
    }
}

// ─── Actions & effects ────────────────────────────────────────────────────────

/// A UI event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Startup hook: fetches an insight when the restored view is the dashboard.
    Resume,
    OpenLanding,
    OpenLogin,
    Login,
    Logout,
    ToggleLearnMore,
    ShowSupport,
    SendSupportMessage,

    RequestRefill,
    RefillCompleted,
    PlaceOrder { id: String, date: String },
    ToggleLeak,
    DismissLeak,

    RequestDeleteOrder { id: String },
    ConfirmDelete { id: String },
    CancelDelete { id: String },

    SelectVendor(Vendor),
    ToggleVendorDropdown,
    SetThreshold(i64),
    ToggleAutoPay,
    TogglePayOnDelivery,

    RefreshInsight,
    InsightResolved { seq: u64, text: String },
    DismissToast { id: u64 },
}

/// Work the reducer hands back to its caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Wait out the simulated refill, then dispatch [`Action::RefillCompleted`].
    StartRefill,
    /// Wait out the toast lifetime, then dispatch [`Action::DismissToast`].
    ScheduleToastDismiss { id: u64 },
    /// Fetch a tip, then dispatch [`Action::InsightResolved`] with `seq`.
    FetchInsight { seq: u64, level: u8 },
}

/// Apply `action` to `state` and return the effects to run.
pub fn reduce(state: &mut AppState, action: Action) -> Vec<Effect> {
    debug!(?action, view = %state.view, "reduce");

    match action {
        // ── Navigation ──────────────────────────────────────────────────
        Action::Resume => {
            if state.view == View::Dashboard {
                vec![state.issue_insight_fetch()]
            } else {
                Vec::new()
            }
        }
        Action::OpenLanding => {
            state.view = View::Landing;
            Vec::new()
        }
        Action::OpenLogin => {
            state.view = View::Login;
            Vec::new()
        }
        Action::Login => {
            let entering = state.view != View::Dashboard;
            state.view = View::Dashboard;
            info!("logged in");
            let mut effects = vec![state.toast("Successfully logged in", ToastKind::Success)];
            if entering {
                effects.push(state.issue_insight_fetch());
            }
            effects
        }
        Action::Logout => {
            state.view = View::Landing;
            state.learn_more_open = false;
            state.vendor_dropdown_open = false;
            state.pending_deletion = None;
            // late responses for the old session are dropped
            state.insight_seq += 1;
            info!("logged out");
            vec![state.toast("Logged out safely", ToastKind::Info)]
        }
        Action::ToggleLearnMore => {
            state.learn_more_open = !state.learn_more_open;
            Vec::new()
        }
        Action::ShowSupport => {
            // the login page's support link leads back to the landing page
            if state.view == View::Login {
                state.view = View::Landing;
            }
            state.learn_more_open = true;
            Vec::new()
        }
        Action::SendSupportMessage => {
            vec![state.toast("Message sent to support!", ToastKind::Info)]
        }

        // ── Tank ────────────────────────────────────────────────────────
        Action::RequestRefill => {
            if state.refilling {
                debug!("refill already in progress");
                return Vec::new();
            }
            state.refilling = true;
            vec![Effect::StartRefill]
        }
        Action::RefillCompleted => {
            let changed = state.tank.level != FULL_LEVEL;
            state.tank.level = FULL_LEVEL;
            state.refilling = false;
            let mut effects = vec![state.toast("Refilled!", ToastKind::Success)];
            if changed && state.view == View::Dashboard {
                effects.push(state.issue_insight_fetch());
            }
            effects
        }
        Action::PlaceOrder { id, date } => {
            let order = Order::pending(id, date, state.settings.preferred_vendor);
            info!(order = %order.id, vendor = %order.vendor, "order placed");
            state.orders.insert(0, order);
            vec![state.toast("Ordered!", ToastKind::Info)]
        }
        Action::ToggleLeak => {
            state.tank.leak_detected = !state.tank.leak_detected;
            let message = if state.tank.leak_detected {
                "EMERGENCY SIM ACTIVE"
            } else {
                "Safety normal"
            };
            vec![state.toast(message, ToastKind::Info)]
        }
        Action::DismissLeak => {
            state.tank.leak_detected = false;
            Vec::new()
        }

        // ── Order deletion ──────────────────────────────────────────────
        Action::RequestDeleteOrder { id } => {
            if state.orders.iter().any(|o| o.id == id) {
                state.pending_deletion = Some(id);
            } else {
                debug!(order = %id, "delete requested for unknown order");
            }
            Vec::new()
        }
        Action::ConfirmDelete { id } => {
            if state.pending_deletion.as_deref() == Some(id.as_str()) {
                state.pending_deletion = None;
                state.orders.retain(|o| o.id != id);
                info!(order = %id, "order deleted");
            } else {
                debug!(
                    order = %id,
                    pending = ?state.pending_deletion,
                    "confirmation does not match pending deletion"
                );
            }
            Vec::new()
        }
        Action::CancelDelete { id } => {
            if state.pending_deletion.as_deref() == Some(id.as_str()) {
                state.pending_deletion = None;
            }
            Vec::new()
        }

        // ── Settings ────────────────────────────────────────────────────
        Action::SelectVendor(vendor) => {
            state.settings.preferred_vendor = vendor;
            state.vendor_dropdown_open = false;
            vec![state.toast(format!("Vendor: {vendor}"), ToastKind::Info)]
        }
        Action::ToggleVendorDropdown => {
            state.vendor_dropdown_open = !state.vendor_dropdown_open;
            Vec::new()
        }
        Action::SetThreshold(requested) => {
            state.settings.refill_threshold = snap_threshold(requested);
            Vec::new()
        }
        Action::ToggleAutoPay => {
            state.settings.auto_pay = !state.settings.auto_pay;
            Vec::new()
        }
        Action::TogglePayOnDelivery => {
            state.settings.pay_on_delivery = !state.settings.pay_on_delivery;
            Vec::new()
        }

        // ── Insight & toasts ────────────────────────────────────────────
        Action::RefreshInsight => {
            if state.view == View::Dashboard {
                vec![state.issue_insight_fetch()]
            } else {
                Vec::new()
            }
        }
        Action::InsightResolved { seq, text } => {
            if seq == state.insight_seq {
                state.insight = text;
            } else {
                debug!(seq, latest = state.insight_seq, "dropping stale insight");
            }
            Vec::new()
        }
        Action::DismissToast { id } => {
            if state.toast.as_ref().is_some_and(|t| t.id == id) {
                state.toast = None;
            }
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gas_proto::OrderStatus;

    fn dashboard() -> AppState {
        AppState {
            view: View::Dashboard,
            ..AppState::default()
        }
    }

    fn place(state: &mut AppState, id: &str) {
        reduce(
            state,
            Action::PlaceOrder {
                id: id.to_string(),
                date: "Oct 14, 2026".to_string(),
            },
        );
    }

    #[test]
    fn test_fresh_state_defaults() {
        let state = AppState::default();
        assert_eq!(state.view, View::Landing);
        assert_eq!(state.tank.level, 72);
        assert_eq!(state.settings.preferred_vendor, Vendor::BharatGas);
        assert_eq!(state.settings.refill_threshold, 20);
        assert_eq!(state.orders.len(), 1);
        assert_eq!(state.orders[0].status, OrderStatus::Delivered);
        assert_eq!(state.insight_display(), INSIGHT_PLACEHOLDER);
    }

    #[test]
    fn test_navigation_flow() {
        let mut state = AppState::default();
        assert!(reduce(&mut state, Action::OpenLogin).is_empty());
        assert_eq!(state.view, View::Login);

        let effects = reduce(&mut state, Action::Login);
        assert_eq!(state.view, View::Dashboard);
        assert!(state.authenticated());
        assert!(matches!(effects[0], Effect::ScheduleToastDismiss { .. }));
        assert_eq!(effects[1], Effect::FetchInsight { seq: 1, level: 72 });
        let toast = state.toast.clone().expect("toast");
        assert_eq!(toast.message, "Successfully logged in");
        assert_eq!(toast.kind, ToastKind::Success);

        state.learn_more_open = true;
        reduce(&mut state, Action::Logout);
        assert_eq!(state.view, View::Landing);
        assert!(!state.learn_more_open);
        assert_eq!(state.toast.as_ref().map(|t| t.message.as_str()), Some("Logged out safely"));
    }

    #[test]
    fn test_show_support_only_opens() {
        let mut state = AppState {
            view: View::Login,
            ..AppState::default()
        };
        reduce(&mut state, Action::ShowSupport);
        assert!(state.learn_more_open);
        assert_eq!(state.view, View::Landing);
        reduce(&mut state, Action::ShowSupport);
        assert!(state.learn_more_open);
        reduce(&mut state, Action::ToggleLearnMore);
        assert!(!state.learn_more_open);
    }

    #[test]
    fn test_refill_is_two_phase() {
        let mut state = dashboard();
        state.tank.level = 8;

        assert_eq!(reduce(&mut state, Action::RequestRefill), vec![Effect::StartRefill]);
        assert!(state.refilling);
        assert_eq!(state.tank.level, 8);

        // trigger is disabled while in flight
        assert!(reduce(&mut state, Action::RequestRefill).is_empty());

        let effects = reduce(&mut state, Action::RefillCompleted);
        assert_eq!(state.tank.level, 100);
        assert!(!state.refilling);
        assert!(effects.contains(&Effect::FetchInsight { seq: 1, level: 100 }));
        assert_eq!(state.toast.as_ref().map(|t| t.message.as_str()), Some("Refilled!"));
    }

    #[test]
    fn test_refill_at_full_does_not_refetch() {
        let mut state = dashboard();
        state.tank.level = 100;
        reduce(&mut state, Action::RequestRefill);
        let effects = reduce(&mut state, Action::RefillCompleted);
        assert_eq!(effects.len(), 1);
        assert_eq!(state.tank.level, 100);
    }

    #[test]
    fn test_order_now_prepends_pending() {
        let mut state = dashboard();
        state.settings.preferred_vendor = Vendor::HpGas;
        let before = state.orders.clone();

        place(&mut state, "123456");

        assert_eq!(state.orders.len(), before.len() + 1);
        let newest = &state.orders[0];
        assert_eq!(newest.id, "123456");
        assert_eq!(newest.status, OrderStatus::Pending);
        assert_eq!(newest.vendor, "HP Gas");
        assert_eq!(&state.orders[1..], &before[..]);
        assert_eq!(state.toast.as_ref().map(|t| t.message.as_str()), Some("Ordered!"));
    }

    #[test]
    fn test_order_ignores_threshold() {
        let mut state = dashboard();
        state.tank.level = 100;
        state.settings.refill_threshold = 5;
        place(&mut state, "000001");
        assert_eq!(state.orders[0].id, "000001");
    }

    #[test]
    fn test_delete_requires_confirmation() {
        let mut state = dashboard();
        place(&mut state, "111111");
        place(&mut state, "222222");
        let before = state.orders.clone();

        reduce(&mut state, Action::RequestDeleteOrder { id: "111111".to_string() });
        assert_eq!(state.orders, before);
        assert_eq!(state.pending_deletion.as_deref(), Some("111111"));

        reduce(&mut state, Action::CancelDelete { id: "111111".to_string() });
        assert_eq!(state.orders, before);
        assert!(state.pending_deletion.is_none());

        reduce(&mut state, Action::RequestDeleteOrder { id: "111111".to_string() });
        reduce(&mut state, Action::ConfirmDelete { id: "111111".to_string() });
        assert_eq!(state.orders.len(), before.len() - 1);
        assert!(state.orders.iter().all(|o| o.id != "111111"));
        assert!(state.orders.iter().any(|o| o.id == "222222"));
        assert!(state.orders.iter().any(|o| o.id == "2024001"));
    }

    #[test]
    fn test_delete_unknown_order_is_noop() {
        let mut state = dashboard();
        reduce(&mut state, Action::RequestDeleteOrder { id: "nope".to_string() });
        assert!(state.pending_deletion.is_none());
        reduce(&mut state, Action::ConfirmDelete { id: "nope".to_string() });
        assert_eq!(state.orders.len(), 1);
    }

    #[test]
    fn test_confirm_for_other_order_deletes_nothing() {
        let mut state = dashboard();
        place(&mut state, "111111");
        place(&mut state, "222222");
        let before = state.orders.clone();

        reduce(&mut state, Action::RequestDeleteOrder { id: "111111".to_string() });
        // a second request replaces the pending id before the first is answered
        reduce(&mut state, Action::RequestDeleteOrder { id: "222222".to_string() });

        reduce(&mut state, Action::ConfirmDelete { id: "111111".to_string() });
        assert_eq!(state.orders, before);
        assert_eq!(state.pending_deletion.as_deref(), Some("222222"));

        reduce(&mut state, Action::CancelDelete { id: "111111".to_string() });
        assert_eq!(state.pending_deletion.as_deref(), Some("222222"));

        reduce(&mut state, Action::ConfirmDelete { id: "222222".to_string() });
        assert!(state.pending_deletion.is_none());
        assert!(state.orders.iter().any(|o| o.id == "111111"));
        assert!(state.orders.iter().all(|o| o.id != "222222"));
    }

    #[test]
    fn test_toggle_leak_twice_restores() {
        for initial in [false, true] {
            let mut state = dashboard();
            state.tank.leak_detected = initial;
            reduce(&mut state, Action::ToggleLeak);
            assert_eq!(state.tank.leak_detected, !initial);
            reduce(&mut state, Action::ToggleLeak);
            assert_eq!(state.tank.leak_detected, initial);
        }
    }

    #[test]
    fn test_leak_toasts() {
        let mut state = dashboard();
        reduce(&mut state, Action::ToggleLeak);
        assert_eq!(state.toast.as_ref().map(|t| t.message.as_str()), Some("EMERGENCY SIM ACTIVE"));
        reduce(&mut state, Action::ToggleLeak);
        assert_eq!(state.toast.as_ref().map(|t| t.message.as_str()), Some("Safety normal"));
    }

    #[test]
    fn test_dismiss_leak_always_clears() {
        for initial in [false, true] {
            let mut state = dashboard();
            state.tank.leak_detected = initial;
            let effects = reduce(&mut state, Action::DismissLeak);
            assert!(effects.is_empty());
            assert!(!state.tank.leak_detected);
            assert!(state.toast.is_none());
        }
    }

    #[test]
    fn test_settings_mutations() {
        let mut state = dashboard();
        reduce(&mut state, Action::ToggleVendorDropdown);
        assert!(state.vendor_dropdown_open);

        reduce(&mut state, Action::SelectVendor(Vendor::SuperGas));
        assert_eq!(state.settings.preferred_vendor, Vendor::SuperGas);
        assert!(!state.vendor_dropdown_open);
        assert_eq!(state.toast.as_ref().map(|t| t.message.as_str()), Some("Vendor: Super Gas"));

        reduce(&mut state, Action::SetThreshold(37));
        assert_eq!(state.settings.refill_threshold, 35);
        reduce(&mut state, Action::SetThreshold(1000));
        assert_eq!(state.settings.refill_threshold, 50);

        reduce(&mut state, Action::ToggleAutoPay);
        assert!(state.settings.auto_pay);
        reduce(&mut state, Action::TogglePayOnDelivery);
        assert!(!state.settings.pay_on_delivery);
    }

    #[test]
    fn test_stale_insight_is_dropped() {
        let mut state = dashboard();
        let first = reduce(&mut state, Action::RefreshInsight);
        let second = reduce(&mut state, Action::RefreshInsight);
        assert_eq!(first, vec![Effect::FetchInsight { seq: 1, level: 72 }]);
        assert_eq!(second, vec![Effect::FetchInsight { seq: 2, level: 72 }]);

        reduce(&mut state, Action::InsightResolved { seq: 2, text: "newer".to_string() });
        reduce(&mut state, Action::InsightResolved { seq: 1, text: "older".to_string() });
        assert_eq!(state.insight, "newer");
    }

    #[test]
    fn test_insight_only_fetched_on_dashboard() {
        let mut state = AppState::default();
        assert!(reduce(&mut state, Action::RefreshInsight).is_empty());
        assert!(reduce(&mut state, Action::Resume).is_empty());

        state.view = View::Dashboard;
        assert_eq!(reduce(&mut state, Action::Resume).len(), 1);
    }

    #[test]
    fn test_logout_invalidates_inflight_insight() {
        let mut state = dashboard();
        reduce(&mut state, Action::RefreshInsight);
        reduce(&mut state, Action::Logout);
        reduce(&mut state, Action::InsightResolved { seq: 1, text: "late".to_string() });
        assert!(state.insight.is_empty());
    }

    #[test]
    fn test_overwritten_toast_survives_old_timer() {
        let mut state = dashboard();
        let first = reduce(&mut state, Action::ToggleLeak);
        let second = reduce(&mut state, Action::SendSupportMessage);
        let (Effect::ScheduleToastDismiss { id: old }, Effect::ScheduleToastDismiss { id: new }) =
            (&first[0], &second[0])
        else {
            panic!("expected toast effects");
        };

        reduce(&mut state, Action::DismissToast { id: *old });
        assert_eq!(
            state.toast.as_ref().map(|t| t.message.as_str()),
            Some("Message sent to support!")
        );
        reduce(&mut state, Action::DismissToast { id: *new });
        assert!(state.toast.is_none());
    }

    #[test]
    fn test_derived_tank_values() {
        let mut state = dashboard();
        state.tank.level = 72;
        assert_eq!(state.tank.days_left(), 18);
        assert!(!state.tank.is_critical());
        assert_eq!(state.level_preview(), "Cylinder is at 72%. Level is healthy.");

        state.tank.level = 15;
        assert_eq!(state.tank.days_left(), 3);
        assert!(state.tank.is_critical());
        assert!(state.refill_recommended());
        assert_eq!(state.level_preview(), "Cylinder is at 15%. Refill recommended.");

        state.tank.level = 200;
        assert_eq!(state.tank.fill_percent(), 100);
    }
}
