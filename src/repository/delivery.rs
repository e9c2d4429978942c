//! Delivery history persistence: the append-only attempt log and the
//! canonical proof-of-delivery row per shipment.
//!
//! The write paths borrow a connection so the outcome recorder can run
//! them inside its transaction; attempt numbering (max + 1) is only
//! race-free because the read and the insert share that transaction.

use chrono::{DateTime, Utc};
use diesel::dsl::max;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::pool::{AsyncSqliteConnection, AsyncSqlitePool};
use super::records::{DeliveryAttemptRecord, NewDeliveryAttempt, ProofOfDeliveryRecord};
use crate::error::Result;
use crate::models::{AttemptStatus, DeliveryAttempt, FailureInput, PodInput, ProofOfDelivery};
use crate::schema::{delivery_attempts, proof_of_delivery};

/// Repository for delivery attempts and proof-of-delivery records.
#[derive(Clone)]
pub struct DeliveryRepository {
    pool: AsyncSqlitePool,
}

impl DeliveryRepository {
    pub fn new(pool: AsyncSqlitePool) -> Self {
        Self { pool }
    }

    /// Full attempt history for a shipment, oldest first.
    pub async fn attempts_for(&self, shipment_id: &str) -> Result<Vec<DeliveryAttempt>> {
        let mut conn = self.pool.get().await?;

        let records: Vec<DeliveryAttemptRecord> = delivery_attempts::table
            .filter(delivery_attempts::shipment_id.eq(shipment_id))
            .order(delivery_attempts::attempt_number.asc())
            .load(&mut conn)
            .await?;

        Ok(records.into_iter().map(DeliveryAttempt::from).collect())
    }

    /// The canonical proof of delivery for a shipment, if one exists.
    pub async fn get_pod(&self, shipment_id: &str) -> Result<Option<ProofOfDelivery>> {
        let mut conn = self.pool.get().await?;

        let record: Option<ProofOfDeliveryRecord> = proof_of_delivery::table
            .filter(proof_of_delivery::shipment_id.eq(shipment_id))
            .first(&mut conn)
            .await
            .optional()?;

        Ok(record.map(ProofOfDelivery::from))
    }
}

/// Next attempt number for a shipment: max existing + 1, starting at 1.
pub async fn next_attempt_number_in(
    conn: &mut AsyncSqliteConnection,
    shipment_id: &str,
) -> Result<i32> {
    let current: Option<i32> = delivery_attempts::table
        .filter(delivery_attempts::shipment_id.eq(shipment_id))
        .select(max(delivery_attempts::attempt_number))
        .first(conn)
        .await?;

    Ok(current.unwrap_or(0) + 1)
}

/// Append a `delivered` attempt. Returns the assigned attempt number.
pub async fn record_delivered_attempt_in(
    conn: &mut AsyncSqliteConnection,
    shipment_id: &str,
    pod: &PodInput,
    attempted_at: DateTime<Utc>,
) -> Result<i32> {
    let attempt_number = next_attempt_number_in(conn, shipment_id).await?;
    let photo_refs = serde_json::to_string(&pod.photo_refs).unwrap_or_else(|_| "[]".to_string());
    let attempted = attempted_at.to_rfc3339();

    let row = NewDeliveryAttempt {
        shipment_id,
        attempt_number,
        status: AttemptStatus::Delivered.as_str(),
        failure_code: None,
        failure_reason: None,
        latitude: pod.latitude,
        longitude: pod.longitude,
        driver_id: pod.driver_id.as_deref(),
        notes: pod.notes.as_deref(),
        reschedule_date: None,
        photo_refs: &photo_refs,
        attempted_at: &attempted,
    };

    diesel::insert_into(delivery_attempts::table)
        .values(&row)
        .execute(conn)
        .await?;

    Ok(attempt_number)
}

/// Append a `failed` attempt. Returns the assigned attempt number.
pub async fn record_failed_attempt_in(
    conn: &mut AsyncSqliteConnection,
    shipment_id: &str,
    failure: &FailureInput,
    attempted_at: DateTime<Utc>,
) -> Result<i32> {
    let attempt_number = next_attempt_number_in(conn, shipment_id).await?;
    let photo_refs =
        serde_json::to_string(&failure.photo_refs).unwrap_or_else(|_| "[]".to_string());
    let attempted = attempted_at.to_rfc3339();
    let reschedule = failure
        .reschedule_date
        .map(|d| d.format("%Y-%m-%d").to_string());

    let row = NewDeliveryAttempt {
        shipment_id,
        attempt_number,
        status: AttemptStatus::Failed.as_str(),
        failure_code: failure.failure_code.as_deref(),
        failure_reason: Some(&failure.failure_reason),
        latitude: failure.latitude,
        longitude: failure.longitude,
        driver_id: failure.driver_id.as_deref(),
        notes: failure.driver_notes.as_deref(),
        reschedule_date: reschedule.as_deref(),
        photo_refs: &photo_refs,
        attempted_at: &attempted,
    };

    diesel::insert_into(delivery_attempts::table)
        .values(&row)
        .execute(conn)
        .await?;

    Ok(attempt_number)
}

/// Write the canonical proof of delivery for a shipment.
///
/// `replace_into` rides the UNIQUE(shipment_id) constraint: a
/// re-delivery after a prior failure replaces the old record while the
/// attempt log keeps the full history.
pub async fn upsert_pod_in(
    conn: &mut AsyncSqliteConnection,
    shipment_id: &str,
    pod: &PodInput,
    delivered_at: DateTime<Utc>,
) -> Result<()> {
    let photo_refs = serde_json::to_string(&pod.photo_refs).unwrap_or_else(|_| "[]".to_string());
    let delivered = delivered_at.to_rfc3339();

    diesel::replace_into(proof_of_delivery::table)
        .values((
            proof_of_delivery::shipment_id.eq(shipment_id),
            proof_of_delivery::delivered_at.eq(&delivered),
            proof_of_delivery::recipient_name.eq(&pod.recipient_name),
            proof_of_delivery::recipient_document.eq(pod.recipient_document.as_deref()),
            proof_of_delivery::recipient_relation.eq(pod.recipient_relation.as_deref()),
            proof_of_delivery::signature_ref.eq(pod.signature_ref.as_deref()),
            proof_of_delivery::photo_refs.eq(&photo_refs),
            proof_of_delivery::latitude.eq(pod.latitude),
            proof_of_delivery::longitude.eq(pod.longitude),
            proof_of_delivery::location_type.eq(pod.location_type.as_deref()),
            proof_of_delivery::driver_id.eq(pod.driver_id.as_deref()),
            proof_of_delivery::notes.eq(pod.notes.as_deref()),
            proof_of_delivery::created_at.eq(&delivered),
        ))
        .execute(conn)
        .await?;

    Ok(())
}
