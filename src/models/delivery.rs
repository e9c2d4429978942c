//! Delivery history models: the append-only attempt log and the
//! canonical proof-of-delivery record.
//!
//! Both belong to a shipment's delivery history, not to any single
//! manifest, so they survive manifest deletion and cancellation.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of a single delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    Delivered,
    Failed,
    Partial,
}

impl AttemptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Delivered => "delivered",
            Self::Failed => "failed",
            Self::Partial => "partial",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "delivered" => Some(Self::Delivered),
            "failed" => Some(Self::Failed),
            "partial" => Some(Self::Partial),
            _ => None,
        }
    }
}

/// One logged try to deliver a shipment.
///
/// Attempt numbers are 1-based and strictly increasing per shipment,
/// across every manifest the shipment has ever been part of. Rows are
/// never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryAttempt {
    pub id: i32,
    pub shipment_id: String,
    pub attempt_number: i32,
    pub status: AttemptStatus,
    pub failure_code: Option<String>,
    pub failure_reason: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub driver_id: Option<String>,
    pub notes: Option<String>,
    pub reschedule_date: Option<NaiveDate>,
    pub photo_refs: Vec<String>,
    pub attempted_at: DateTime<Utc>,
}

/// The recipient-confirmation record for a successful delivery.
///
/// At most one per shipment; a re-delivery after a prior failure
/// replaces the canonical record while the attempt log keeps history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofOfDelivery {
    pub id: i32,
    pub shipment_id: String,
    pub delivered_at: DateTime<Utc>,
    pub recipient_name: String,
    pub recipient_document: Option<String>,
    pub recipient_relation: Option<String>,
    pub signature_ref: Option<String>,
    pub photo_refs: Vec<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_type: Option<String>,
    pub driver_id: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Evidence supplied when a stop is marked delivered.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PodInput {
    pub recipient_name: String,
    pub recipient_document: Option<String>,
    pub recipient_relation: Option<String>,
    pub signature_ref: Option<String>,
    pub photo_refs: Vec<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_type: Option<String>,
    pub driver_id: Option<String>,
    pub notes: Option<String>,
}

/// Details supplied when a stop is marked failed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FailureInput {
    pub failure_code: Option<String>,
    pub failure_reason: String,
    pub reschedule_date: Option<NaiveDate>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub driver_id: Option<String>,
    pub driver_notes: Option<String>,
    pub photo_refs: Vec<String>,
}
