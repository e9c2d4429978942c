//! Manifest models: one dispatch run grouping shipments for a
//! vehicle/driver/date, with a forward-only status lifecycle and
//! derived aggregate totals.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::stop::StopDetail;

/// Lifecycle state of a manifest.
///
/// Transitions only move forward through `Draft -> Confirmed ->
/// InProgress -> Completed`; `Cancelled` is reachable from any
/// non-terminal state. `Completed` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManifestStatus {
    Draft,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

impl ManifestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Confirmed => "confirmed",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "confirmed" => Some(Self::Confirmed),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Terminal states accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether shipments may still be added to or removed from the manifest.
    pub fn is_mutable(&self) -> bool {
        matches!(self, Self::Draft | Self::Confirmed)
    }

    /// Validate a status transition.
    pub fn can_transition_to(&self, next: ManifestStatus) -> bool {
        match (self, next) {
            (Self::Draft, Self::Confirmed) => true,
            (Self::Confirmed, Self::InProgress) => true,
            (Self::InProgress, Self::Completed) => true,
            (from, Self::Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }
}

/// Kind of dispatch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManifestType {
    Delivery,
    Pickup,
    Transfer,
}

impl ManifestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Delivery => "delivery",
            Self::Pickup => "pickup",
            Self::Transfer => "transfer",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "delivery" => Some(Self::Delivery),
            "pickup" => Some(Self::Pickup),
            "transfer" => Some(Self::Transfer),
            _ => None,
        }
    }
}

/// A dispatch manifest.
///
/// The six aggregate fields are derived: they always equal a
/// recomputation over the currently linked stop rows and are only
/// written by the aggregate recalculator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub id: String,
    pub tenant_id: String,
    pub branch_id: Option<String>,
    /// Human-readable unique number, e.g. `MF-20250620-4KX9`.
    pub manifest_number: String,
    pub manifest_date: NaiveDate,
    pub manifest_type: ManifestType,
    pub carrier_id: Option<String>,
    pub vehicle_id: Option<String>,
    pub driver_id: Option<String>,
    pub route_id: Option<String>,
    pub planned_start_at: Option<DateTime<Utc>>,
    pub planned_end_at: Option<DateTime<Utc>>,
    /// Stamped when the manifest enters `in_progress`.
    pub started_at: Option<DateTime<Utc>>,
    /// Stamped when the manifest enters `completed`.
    pub completed_at: Option<DateTime<Utc>>,
    pub status: ManifestStatus,
    pub notes: Option<String>,
    pub driver_notes: Option<String>,
    pub total_shipments: i32,
    pub total_weight_kg: f64,
    pub total_packages: i32,
    pub total_cod_amount: f64,
    pub delivered_count: i32,
    pub failed_count: i32,
    /// Stops that are neither delivered nor failed (pending, in transit,
    /// and skipped all fold into this for reporting).
    pub pending_count: i32,
    /// Optimistic concurrency counter, bumped on every write.
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A manifest with its stop list joined to shipment summaries.
#[derive(Debug, Clone)]
pub struct ManifestDetail {
    pub manifest: Manifest,
    /// Stops in visiting order.
    pub stops: Vec<StopDetail>,
}

/// Input for creating a manifest.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewManifestInput {
    pub manifest_date: Option<NaiveDate>,
    pub manifest_type: Option<ManifestType>,
    pub branch_id: Option<String>,
    pub carrier_id: Option<String>,
    pub vehicle_id: Option<String>,
    pub driver_id: Option<String>,
    pub route_id: Option<String>,
    pub planned_start_at: Option<DateTime<Utc>>,
    pub planned_end_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// Partial update of a manifest's mutable fields.
///
/// `None` leaves a field untouched. Status and aggregates are not
/// patchable here; use `change_status` and the recalculator.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ManifestPatch {
    pub manifest_date: Option<NaiveDate>,
    pub carrier_id: Option<Option<String>>,
    pub vehicle_id: Option<Option<String>>,
    pub driver_id: Option<Option<String>>,
    pub route_id: Option<Option<String>>,
    pub planned_start_at: Option<Option<DateTime<Utc>>>,
    pub planned_end_at: Option<Option<DateTime<Utc>>>,
    pub notes: Option<Option<String>>,
    pub driver_notes: Option<Option<String>>,
}

/// Filters for listing manifests.
#[derive(Debug, Clone, Default)]
pub struct ManifestFilter {
    pub status: Option<ManifestStatus>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub carrier_id: Option<String>,
    pub vehicle_id: Option<String>,
    /// Substring match on the manifest number.
    pub number_like: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for status in [
            ManifestStatus::Draft,
            ManifestStatus::Confirmed,
            ManifestStatus::InProgress,
            ManifestStatus::Completed,
            ManifestStatus::Cancelled,
        ] {
            assert_eq!(ManifestStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(ManifestStatus::from_str("bogus"), None);
    }

    #[test]
    fn test_forward_transitions() {
        use ManifestStatus::*;
        assert!(Draft.can_transition_to(Confirmed));
        assert!(Confirmed.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Completed));

        // No skipping states.
        assert!(!Draft.can_transition_to(InProgress));
        assert!(!Draft.can_transition_to(Completed));
        assert!(!Confirmed.can_transition_to(Completed));

        // No going backwards.
        assert!(!Confirmed.can_transition_to(Draft));
        assert!(!InProgress.can_transition_to(Confirmed));
    }

    #[test]
    fn test_cancel_from_non_terminal_only() {
        use ManifestStatus::*;
        assert!(Draft.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(InProgress.can_transition_to(Cancelled));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Cancelled));
    }

    #[test]
    fn test_terminal_states_reject_everything() {
        use ManifestStatus::*;
        for next in [Draft, Confirmed, InProgress, Completed, Cancelled] {
            assert!(!Completed.can_transition_to(next));
            assert!(!Cancelled.can_transition_to(next));
        }
    }
}
