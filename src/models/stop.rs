//! Stop models: the link between a manifest and a shipment, carrying
//! the visiting order and per-stop delivery state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::shipment::ShipmentSummary;

/// Delivery state of a single stop on a manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopStatus {
    Pending,
    InTransit,
    Delivered,
    Failed,
    Skipped,
}

impl StopStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InTransit => "in_transit",
            Self::Delivered => "delivered",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "in_transit" => Some(Self::InTransit),
            "delivered" => Some(Self::Delivered),
            "failed" => Some(Self::Failed),
            "skipped" => Some(Self::Skipped),
            _ => None,
        }
    }

    /// Everything that is neither delivered nor failed counts as pending
    /// in manifest aggregates (including skipped stops).
    pub fn counts_as_pending(&self) -> bool {
        !matches!(self, Self::Delivered | Self::Failed)
    }
}

/// A shipment assigned to a manifest at a position in the stop order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestShipment {
    pub id: i32,
    pub manifest_id: String,
    pub shipment_id: String,
    /// 1-based visiting order, unique within the manifest.
    pub stop_sequence: i32,
    pub estimated_arrival_at: Option<DateTime<Utc>>,
    pub status: StopStatus,
    pub arrived_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub failure_reason: Option<String>,
    pub driver_notes: Option<String>,
    /// Distance from the previous stop, when the router supplied it.
    pub distance_km: Option<f64>,
    pub duration_min: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A stop joined to its shipment's summary fields for display.
///
/// The shipment is optional: the shipment store is a collaborator and
/// the row may have been purged independently of the manifest.
#[derive(Debug, Clone)]
pub struct StopDetail {
    pub stop: ManifestShipment,
    pub shipment: Option<ShipmentSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_status_roundtrip() {
        for status in [
            StopStatus::Pending,
            StopStatus::InTransit,
            StopStatus::Delivered,
            StopStatus::Failed,
            StopStatus::Skipped,
        ] {
            assert_eq!(StopStatus::from_str(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_pending_fold() {
        assert!(StopStatus::Pending.counts_as_pending());
        assert!(StopStatus::InTransit.counts_as_pending());
        assert!(StopStatus::Skipped.counts_as_pending());
        assert!(!StopStatus::Delivered.counts_as_pending());
        assert!(!StopStatus::Failed.counts_as_pending());
    }
}
