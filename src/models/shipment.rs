//! The narrow view of the shipment store this subsystem works with.
//!
//! Shipment master data lives outside this subsystem; we read the
//! summary fields aggregates need and write back delivery status only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Shipment lifecycle state, as far as dispatch is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentStatus {
    Pending,
    Received,
    Processing,
    InTransit,
    Delivered,
    Failed,
}

impl ShipmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Received => "received",
            Self::Processing => "processing",
            Self::InTransit => "in_transit",
            Self::Delivered => "delivered",
            Self::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "received" => Some(Self::Received),
            "processing" => Some(Self::Processing),
            "in_transit" => Some(Self::InTransit),
            "delivered" => Some(Self::Delivered),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Statuses in which a shipment may be put on a manifest.
    pub fn is_assignable(&self) -> bool {
        matches!(self, Self::Pending | Self::Received | Self::Processing)
    }

    /// The string forms of the assignable statuses, for queries.
    pub fn assignable_strs() -> [&'static str; 3] {
        ["pending", "received", "processing"]
    }
}

/// Summary fields of a shipment used for stop display and aggregates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentSummary {
    pub id: String,
    pub tenant_id: String,
    pub tracking_number: String,
    pub status: ShipmentStatus,
    pub weight_kg: Option<f64>,
    pub package_count: Option<i32>,
    pub cod_amount: Option<f64>,
    pub delivered_at: Option<DateTime<Utc>>,
}
