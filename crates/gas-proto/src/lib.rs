//! Domain types for the gasmon dashboard.
//!
//! Shared between the reducer, the storage mirror, the insight client
//! and the command layer.

#![forbid(unsafe_code)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

// ─── Tank level ───────────────────────────────────────────────────────────────

/// Level used when nothing has been persisted yet.
pub const DEFAULT_LEVEL: u8 = 72;

/// Level after a refill completes.
pub const FULL_LEVEL: u8 = 100;

/// Below this the level readout is shown as critical. Independent of the
/// configured refill threshold.
pub const CRITICAL_LEVEL: u8 = 20;

/// Clamp an arbitrary integer into the 0–100 level range.
pub fn clamp_level(level: i64) -> u8 {
    // the clamp guarantees the value fits
    level.clamp(0, i64::from(FULL_LEVEL)) as u8
}

// ─── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown vendor '{0}'")]
    UnknownVendor(String),
}

// ─── View ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum View {
    #[default]
    Landing,
    Login,
    Dashboard,
}

impl std::fmt::Display for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Landing => write!(f, "landing"),
            Self::Login => write!(f, "login"),
            Self::Dashboard => write!(f, "dashboard"),
        }
    }
}

// ─── Vendor ───────────────────────────────────────────────────────────────────

/// Gas-supply providers the dashboard can order from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Vendor {
    #[default]
    #[serde(rename = "Bharat Gas")]
    BharatGas,
    #[serde(rename = "Indane Gas")]
    IndaneGas,
    #[serde(rename = "HP Gas")]
    HpGas,
    #[serde(rename = "Super Gas")]
    SuperGas,
}

impl Vendor {
    /// Display order of the vendor dropdown. The first entry is the default.
    pub const ALL: [Vendor; 4] = [
        Vendor::BharatGas,
        Vendor::IndaneGas,
        Vendor::HpGas,
        Vendor::SuperGas,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::BharatGas => "Bharat Gas",
            Self::IndaneGas => "Indane Gas",
            Self::HpGas => "HP Gas",
            Self::SuperGas => "Super Gas",
        }
    }
}

impl std::fmt::Display for Vendor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Vendor {
    type Err = ParseError;

    /// Accepts the display name ("HP Gas") or a short slug ("hp").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Vendor::ALL
            .into_iter()
            .find(|v| {
                let name = v.name().to_ascii_lowercase();
                name == needle || name.split_whitespace().next() == Some(needle.as_str())
            })
            .ok_or_else(|| ParseError::UnknownVendor(s.to_string()))
    }
}

// ─── Vendor settings ──────────────────────────────────────────────────────────

pub const THRESHOLD_MIN: u8 = 5;
pub const THRESHOLD_MAX: u8 = 50;
pub const THRESHOLD_STEP: u8 = 5;

/// Snap a requested threshold onto the slider: clamp to
/// [`THRESHOLD_MIN`, `THRESHOLD_MAX`] and round to the nearest step.
pub fn snap_threshold(requested: i64) -> u8 {
    let clamped = requested.clamp(i64::from(THRESHOLD_MIN), i64::from(THRESHOLD_MAX));
    let step = i64::from(THRESHOLD_STEP);
    let snapped = ((clamped + step / 2) / step) * step;
    snapped.clamp(i64::from(THRESHOLD_MIN), i64::from(THRESHOLD_MAX)) as u8
}

/// Refill preferences, persisted as a camelCase JSON record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorSettings {
    pub preferred_vendor: Vendor,
    pub refill_threshold: u8,
    pub auto_pay: bool,
    pub pay_on_delivery: bool,
}

impl Default for VendorSettings {
    fn default() -> Self {
        Self {
            preferred_vendor: Vendor::default(),
            refill_threshold: 20,
            auto_pay: false,
            pay_on_delivery: true,
        }
    }
}

// ─── Orders ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Delivered,
    Pending,
    Cancelled,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Delivered => write!(f, "Delivered"),
            Self::Pending => write!(f, "Pending"),
            Self::Cancelled => write!(f, "Cancelled"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub date: String,
    pub status: OrderStatus,
    pub vendor: String,
}

impl Order {
    /// A freshly placed order, waiting for delivery.
    pub fn pending(id: String, date: String, vendor: Vendor) -> Self {
        Self {
            id,
            date,
            status: OrderStatus::Pending,
            vendor: vendor.to_string(),
        }
    }

    /// Historical order shown when no order list has been persisted.
    pub fn seed() -> Self {
        Self {
            id: "2024001".to_string(),
            date: "Jan 10, 2024".to_string(),
            status: OrderStatus::Delivered,
            vendor: Vendor::BharatGas.to_string(),
        }
    }
}

/// Six random decimal digits. Uniqueness is not enforced.
pub fn generate_order_id() -> String {
    format!("{:06}", Uuid::new_v4().as_u128() % 1_000_000)
}

/// Order date as shown in the activity log, e.g. `Jan 10, 2024`.
pub fn format_order_date(at: DateTime<Utc>) -> String {
    at.format("%b %d, %Y").to_string()
}

// ─── Toasts ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    #[default]
    Info,
}

/// A transient notification. `id` ties the toast to its dismiss timer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    pub id: u64,
    pub message: String,
    pub kind: ToastKind,
}
