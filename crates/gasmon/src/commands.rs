//! Command dispatch for dashboard invocations
//!
//! Maps `exec` / shell command names onto controller actions and renders
//! the resulting view state as JSON.

use crate::controller::{Confirm, Controller};
use gas_proto::{Vendor, View};
use gas_state::{Action, AppState};
use serde_json::{Value, json};
use tracing::debug;

/// Command request from the CLI
#[derive(Debug, Clone)]
pub struct CommandRequest {
    pub command: String,
    pub params: Value,
}

impl CommandRequest {
    pub fn new(command: impl Into<String>, params: Value) -> Self {
        Self {
            command: command.into(),
            params,
        }
    }
}

/// Command error type
pub type CommandError = Box<dyn std::error::Error + Send + Sync>;

/// Every command name [`handle_command`] accepts.
pub const COMMANDS: &[&str] = &[
    "view.landing",
    "view.login",
    "view.learn_more",
    "view.support",
    "support.message",
    "session.login",
    "session.logout",
    "tank.refill",
    "tank.toggle_leak",
    "tank.dismiss_leak",
    "order.create",
    "order.list",
    "order.delete",
    "settings.get",
    "settings.vendor",
    "settings.vendor_dropdown",
    "settings.threshold",
    "settings.auto_pay",
    "settings.pay_on_delivery",
    "insight.get",
    "insight.fetch",
    "state.get",
];

/// Handle one command. Background effects keep running; callers that need
/// their outcome call [`Controller::settle`] afterwards.
pub async fn handle_command(
    ctrl: &Controller,
    request: CommandRequest,
    confirm: &dyn Confirm,
) -> Result<Value, CommandError> {
    debug!(command = %request.command, "handling command");

    let action = match request.command.as_str() {
        // ── Navigation ─────────────────────────────────────────────────────
        "view.landing" => Action::OpenLanding,
        "view.login" => Action::OpenLogin,
        "view.learn_more" => Action::ToggleLearnMore,
        "view.support" => Action::ShowSupport,
        "support.message" => Action::SendSupportMessage,
        "session.login" => Action::Login,
        "session.logout" => Action::Logout,

        // ── Tank ───────────────────────────────────────────────────────────
        "tank.refill" => Action::RequestRefill,
        "tank.toggle_leak" => Action::ToggleLeak,
        "tank.dismiss_leak" => Action::DismissLeak,

        // ── Orders ─────────────────────────────────────────────────────────
        "order.create" => {
            let id = ctrl.place_order().await;
            let state = ctrl.snapshot().await;
            return Ok(json!({ "ok": true, "id": id, "orders": state.orders }));
        }
        "order.list" => {
            let state = ctrl.snapshot().await;
            return Ok(json!({ "ok": true, "orders": state.orders }));
        }
        "order.delete" => {
            let id = request
                .params
                .get("id")
                .and_then(|v| v.as_str())
                .ok_or("missing 'id'")?;
            let deleted = ctrl.delete_order(id, confirm).await;
            let state = ctrl.snapshot().await;
            return Ok(json!({
                "ok": true,
                "id": id,
                "deleted": deleted,
                "orders": state.orders,
            }));
        }

        // ── Settings ───────────────────────────────────────────────────────
        "settings.get" => {
            let state = ctrl.snapshot().await;
            return Ok(json!({
                "ok": true,
                "settings": state.settings,
                "vendors": Vendor::ALL.iter().map(Vendor::name).collect::<Vec<_>>(),
            }));
        }
        "settings.vendor" => {
            let vendor: Vendor = request
                .params
                .get("vendor")
                .and_then(|v| v.as_str())
                .ok_or("missing 'vendor'")?
                .parse()?;
            Action::SelectVendor(vendor)
        }
        "settings.vendor_dropdown" => Action::ToggleVendorDropdown,
        "settings.threshold" => {
            let value = request
                .params
                .get("value")
                .and_then(|v| v.as_i64())
                .ok_or("missing integer 'value'")?;
            Action::SetThreshold(value)
        }
        "settings.auto_pay" => Action::ToggleAutoPay,
        "settings.pay_on_delivery" => Action::TogglePayOnDelivery,

        // ── Insight & state ────────────────────────────────────────────────
        "insight.get" => {
            let state = ctrl.snapshot().await;
            return Ok(json!({ "ok": true, "insight": state.insight_display() }));
        }
        "insight.fetch" => {
            ctrl.dispatch(Action::RefreshInsight).await;
            ctrl.settle().await;
            let state = ctrl.snapshot().await;
            if state.view != View::Dashboard {
                return Ok(json!({ "ok": false, "error": "insight is only fetched on the dashboard" }));
            }
            return Ok(json!({ "ok": true, "insight": state.insight_display() }));
        }
        "state.get" => {
            let state = ctrl.snapshot().await;
            return Ok(json!({ "ok": true, "state": state, "summary": summary(&state) }));
        }

        unknown => return Err(format!("unknown command: {unknown}").into()),
    };

    ctrl.dispatch(action).await;
    Ok(summary(&ctrl.snapshot().await))
}

/// One-shot invocation: restore the session, run `request`, then wait for
/// the background work it started so the reported state is final.
pub async fn exec_once(
    ctrl: &Controller,
    request: CommandRequest,
    confirm: &dyn Confirm,
) -> Result<Value, CommandError> {
    ctrl.resume().await;
    let result = handle_command(ctrl, request, confirm).await?;
    ctrl.settle().await;
    Ok(json!({
        "result": result,
        "after": summary(&ctrl.snapshot().await),
    }))
}

/// The dashboard at a glance.
pub fn summary(state: &AppState) -> Value {
    json!({
        "ok": true,
        "view": state.view,
        "level": state.tank.fill_percent(),
        "days_left": state.tank.days_left(),
        "critical": state.tank.is_critical(),
        "leak_detected": state.tank.leak_detected,
        "refilling": state.refilling,
        "refill_recommended": state.refill_recommended(),
        "preview": state.level_preview(),
        "vendor": state.settings.preferred_vendor,
        "threshold": state.settings.refill_threshold,
        "vendor_dropdown_open": state.vendor_dropdown_open,
        "learn_more_open": state.learn_more_open,
        "orders": state.orders.len(),
        "toast": state.toast,
        "insight": state.insight_display(),
    })
}
