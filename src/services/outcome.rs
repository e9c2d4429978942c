//! Delivery outcome recording.
//!
//! Marking a stop delivered or failed fans out to five writes: the stop
//! row, the shipment row, the proof-of-delivery store, the attempt log,
//! and the event log, followed by an aggregate recomputation. All of it
//! runs in one transaction, so a failure at any step rolls the whole
//! outcome back and surfaces a single error.
//!
//! The lighter stop moves, out for delivery and skip, touch only the
//! stop row and the event log. Neither settles the stop: both states
//! still count toward the pending aggregate.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tracing::info;

use crate::error::{Error, Result};
use crate::models::{
    ActorType, EventContext, EventRef, FailureInput, ManifestStatus, PodInput, StopStatus,
};
use crate::repository::delivery::{
    record_delivered_attempt_in, record_failed_attempt_in, upsert_pod_in,
};
use crate::repository::event::append_in;
use crate::repository::records::{ManifestRecord, ManifestShipmentRecord};
use crate::repository::shipment::mark_delivered_in;
use crate::repository::{AsyncSqliteConnection, AsyncSqlitePool};
use crate::schema::{manifest_shipments, manifests};
use crate::services::aggregates::{self, ManifestTotals};

/// Result of recording an outcome.
#[derive(Debug, Clone)]
pub struct DeliveryOutcome {
    /// 1-based attempt number assigned to this try.
    pub attempt_number: i32,
    /// Manifest aggregates after recomputation.
    pub totals: ManifestTotals,
}

/// Records delivery outcomes for stops on a manifest.
#[derive(Clone)]
pub struct OutcomeRecorder {
    pool: AsyncSqlitePool,
}

impl OutcomeRecorder {
    pub fn new(pool: AsyncSqlitePool) -> Self {
        Self { pool }
    }

    /// Record a successful delivery of a shipment on a manifest.
    pub async fn mark_delivered(
        &self,
        manifest_id: &str,
        shipment_id: &str,
        pod: PodInput,
    ) -> Result<DeliveryOutcome> {
        if pod.recipient_name.trim().is_empty() {
            return Err(Error::Validation("recipient_name is required".to_string()));
        }

        let mut conn = self.pool.get().await?;

        let outcome = conn
            .transaction::<_, Error, _>(|conn| {
                Box::pin(async move {
                    let manifest = load_open_manifest(conn, manifest_id).await?;
                    let now = Utc::now();
                    let stamp = now.to_rfc3339();

                    let stop = update_stop(
                        conn,
                        manifest_id,
                        shipment_id,
                        StopStatus::Delivered,
                        None,
                        pod.notes.as_deref(),
                        &stamp,
                    )
                    .await?;

                    mark_delivered_in(conn, shipment_id, now).await?;
                    upsert_pod_in(conn, shipment_id, &pod, now).await?;
                    let attempt_number =
                        record_delivered_attempt_in(conn, shipment_id, &pod, now).await?;

                    let ctx = EventContext {
                        stop_id: Some(stop.id),
                        latitude: pod.latitude,
                        longitude: pod.longitude,
                        location_text: pod.location_type.clone(),
                        actor_type: Some(actor_for(pod.driver_id.as_deref())),
                        actor_id: pod.driver_id.clone(),
                        description: Some(format!("Delivered to {}", pod.recipient_name)),
                        payload: Some(serde_json::json!({
                            "recipient_name": pod.recipient_name,
                            "attempt_number": attempt_number,
                        })),
                    };
                    append_in(
                        conn,
                        &manifest.tenant_id,
                        &EventRef::Shipment(shipment_id.to_string()),
                        "delivered",
                        ctx,
                    )
                    .await?;

                    let totals = aggregates::recalculate(conn, manifest_id).await?;

                    Ok(DeliveryOutcome {
                        attempt_number,
                        totals,
                    })
                })
            })
            .await?;

        info!(
            "shipment {} delivered on manifest {} (attempt {})",
            shipment_id, manifest_id, outcome.attempt_number
        );
        Ok(outcome)
    }

    /// Record a failed delivery attempt. No proof of delivery is
    /// written; the failure reason and driver notes land on the stop row.
    pub async fn mark_failed(
        &self,
        manifest_id: &str,
        shipment_id: &str,
        failure: FailureInput,
    ) -> Result<DeliveryOutcome> {
        if failure.failure_reason.trim().is_empty() {
            return Err(Error::Validation("failure_reason is required".to_string()));
        }

        let mut conn = self.pool.get().await?;

        let outcome = conn
            .transaction::<_, Error, _>(|conn| {
                Box::pin(async move {
                    let manifest = load_open_manifest(conn, manifest_id).await?;
                    let now = Utc::now();
                    let stamp = now.to_rfc3339();

                    let stop = update_stop(
                        conn,
                        manifest_id,
                        shipment_id,
                        StopStatus::Failed,
                        Some(&failure.failure_reason),
                        failure.driver_notes.as_deref(),
                        &stamp,
                    )
                    .await?;

                    let attempt_number =
                        record_failed_attempt_in(conn, shipment_id, &failure, now).await?;

                    let ctx = EventContext {
                        stop_id: Some(stop.id),
                        latitude: failure.latitude,
                        longitude: failure.longitude,
                        location_text: None,
                        actor_type: Some(actor_for(failure.driver_id.as_deref())),
                        actor_id: failure.driver_id.clone(),
                        description: Some(failure.failure_reason.clone()),
                        payload: Some(serde_json::json!({
                            "failure_code": failure.failure_code,
                            "reschedule_date": failure
                                .reschedule_date
                                .map(|d| d.format("%Y-%m-%d").to_string()),
                            "attempt_number": attempt_number,
                        })),
                    };
                    append_in(
                        conn,
                        &manifest.tenant_id,
                        &EventRef::Shipment(shipment_id.to_string()),
                        "delivery_failed",
                        ctx,
                    )
                    .await?;

                    let totals = aggregates::recalculate(conn, manifest_id).await?;

                    Ok(DeliveryOutcome {
                        attempt_number,
                        totals,
                    })
                })
            })
            .await?;

        info!(
            "shipment {} failed on manifest {} (attempt {})",
            shipment_id, manifest_id, outcome.attempt_number
        );
        Ok(outcome)
    }

    /// Flag a pending stop as out for delivery. No attempt is logged;
    /// the stop still counts toward the pending aggregate.
    pub async fn mark_in_transit(
        &self,
        manifest_id: &str,
        shipment_id: &str,
        driver_id: Option<&str>,
    ) -> Result<()> {
        let mut conn = self.pool.get().await?;

        conn.transaction::<_, Error, _>(|conn| {
            Box::pin(async move {
                let manifest = load_open_manifest(conn, manifest_id).await?;
                let stop = load_stop(conn, manifest_id, shipment_id).await?;

                let status = StopStatus::from_str(&stop.status).unwrap_or(StopStatus::Pending);
                if status != StopStatus::Pending {
                    return Err(Error::InvalidState(format!(
                        "stop for shipment {} is {}, only pending stops can go out for delivery",
                        shipment_id,
                        status.as_str()
                    )));
                }

                let stamp = Utc::now().to_rfc3339();
                diesel::update(manifest_shipments::table.find(stop.id))
                    .set((
                        manifest_shipments::status.eq(StopStatus::InTransit.as_str()),
                        manifest_shipments::updated_at.eq(&stamp),
                    ))
                    .execute(conn)
                    .await?;

                let ctx = EventContext {
                    stop_id: Some(stop.id),
                    actor_type: Some(actor_for(driver_id)),
                    actor_id: driver_id.map(str::to_string),
                    ..Default::default()
                };
                append_in(
                    conn,
                    &manifest.tenant_id,
                    &EventRef::Shipment(shipment_id.to_string()),
                    "out_for_delivery",
                    ctx,
                )
                .await?;

                Ok(())
            })
        })
        .await?;

        info!(
            "shipment {} out for delivery on manifest {}",
            shipment_id, manifest_id
        );
        Ok(())
    }

    /// Skip a stop without recording an attempt. Skipped stops stay in
    /// the pending fold of the aggregates, so the manifest still shows
    /// outstanding work; the stop can be delivered or failed later.
    pub async fn mark_skipped(
        &self,
        manifest_id: &str,
        shipment_id: &str,
        reason: Option<&str>,
        driver_id: Option<&str>,
    ) -> Result<()> {
        let mut conn = self.pool.get().await?;

        conn.transaction::<_, Error, _>(|conn| {
            Box::pin(async move {
                let manifest = load_open_manifest(conn, manifest_id).await?;
                let stop = load_stop(conn, manifest_id, shipment_id).await?;

                let status = StopStatus::from_str(&stop.status).unwrap_or(StopStatus::Pending);
                if !status.counts_as_pending() {
                    return Err(Error::InvalidState(format!(
                        "stop for shipment {} is already {}",
                        shipment_id,
                        status.as_str()
                    )));
                }

                let stamp = Utc::now().to_rfc3339();
                diesel::update(manifest_shipments::table.find(stop.id))
                    .set((
                        manifest_shipments::status.eq(StopStatus::Skipped.as_str()),
                        manifest_shipments::driver_notes.eq(reason),
                        manifest_shipments::updated_at.eq(&stamp),
                    ))
                    .execute(conn)
                    .await?;

                let ctx = EventContext {
                    stop_id: Some(stop.id),
                    actor_type: Some(actor_for(driver_id)),
                    actor_id: driver_id.map(str::to_string),
                    description: reason.map(str::to_string),
                    ..Default::default()
                };
                append_in(
                    conn,
                    &manifest.tenant_id,
                    &EventRef::Shipment(shipment_id.to_string()),
                    "stop_skipped",
                    ctx,
                )
                .await?;

                Ok(())
            })
        })
        .await?;

        info!(
            "shipment {} skipped on manifest {}",
            shipment_id, manifest_id
        );
        Ok(())
    }
}

fn actor_for(driver_id: Option<&str>) -> ActorType {
    if driver_id.is_some() {
        ActorType::Driver
    } else {
        ActorType::System
    }
}

/// Load the manifest and reject outcomes on terminal manifests.
async fn load_open_manifest(
    conn: &mut AsyncSqliteConnection,
    manifest_id: &str,
) -> Result<ManifestRecord> {
    let manifest: ManifestRecord = manifests::table
        .find(manifest_id)
        .first(conn)
        .await
        .optional()?
        .ok_or_else(|| Error::not_found("manifest", manifest_id))?;

    let status = ManifestStatus::from_str(&manifest.status).unwrap_or(ManifestStatus::Draft);
    if status.is_terminal() {
        return Err(Error::InvalidState(format!(
            "cannot record outcomes on a {} manifest",
            status.as_str()
        )));
    }
    Ok(manifest)
}

/// Fetch the stop row linking a shipment to a manifest.
async fn load_stop(
    conn: &mut AsyncSqliteConnection,
    manifest_id: &str,
    shipment_id: &str,
) -> Result<ManifestShipmentRecord> {
    manifest_shipments::table
        .filter(manifest_shipments::manifest_id.eq(manifest_id))
        .filter(manifest_shipments::shipment_id.eq(shipment_id))
        .first(conn)
        .await
        .optional()?
        .ok_or_else(|| Error::not_found("manifest shipment", shipment_id))
}

/// Flip the stop row to its outcome status. Zero rows affected means
/// the shipment is not on this manifest, which is an error here rather
/// than the silent no-op a bare update would be.
async fn update_stop(
    conn: &mut AsyncSqliteConnection,
    manifest_id: &str,
    shipment_id: &str,
    status: StopStatus,
    failure_reason: Option<&str>,
    driver_notes: Option<&str>,
    stamp: &str,
) -> Result<ManifestShipmentRecord> {
    let rows = diesel::update(
        manifest_shipments::table
            .filter(manifest_shipments::manifest_id.eq(manifest_id))
            .filter(manifest_shipments::shipment_id.eq(shipment_id)),
    )
    .set((
        manifest_shipments::status.eq(status.as_str()),
        manifest_shipments::completed_at.eq(Some(stamp)),
        manifest_shipments::failure_reason.eq(failure_reason),
        manifest_shipments::driver_notes.eq(driver_notes),
        manifest_shipments::updated_at.eq(stamp),
    ))
    .execute(conn)
    .await?;

    if rows == 0 {
        return Err(Error::not_found("manifest shipment", shipment_id));
    }

    let stop: ManifestShipmentRecord = manifest_shipments::table
        .filter(manifest_shipments::manifest_id.eq(manifest_id))
        .filter(manifest_shipments::shipment_id.eq(shipment_id))
        .first(conn)
        .await?;
    Ok(stop)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ManifestStatus, NewManifestInput};
    use crate::repository::migrations::run_migrations;
    use crate::repository::{
        AssignmentRepository, DeliveryRepository, EventLog, ManifestRepository, ShipmentStore,
    };
    use chrono::NaiveDate;
    use tempfile::tempdir;

    struct Fixture {
        _dir: tempfile::TempDir,
        manifests: ManifestRepository,
        assignments: AssignmentRepository,
        deliveries: DeliveryRepository,
        events: EventLog,
        shipments: ShipmentStore,
        recorder: OutcomeRecorder,
    }

    async fn setup() -> Fixture {
        let dir = tempdir().unwrap();
        let db_url = dir.path().join("test.db").display().to_string();
        run_migrations(&db_url).await.unwrap();
        let pool = AsyncSqlitePool::new(&db_url);
        Fixture {
            manifests: ManifestRepository::new(pool.clone()),
            assignments: AssignmentRepository::new(pool.clone()),
            deliveries: DeliveryRepository::new(pool.clone()),
            events: EventLog::new(pool.clone()),
            shipments: ShipmentStore::new(pool.clone()),
            recorder: OutcomeRecorder::new(pool),
            _dir: dir,
        }
    }

    async fn seed(fx: &Fixture, shipment_count: usize) -> (String, Vec<String>) {
        let input = NewManifestInput {
            manifest_date: Some(NaiveDate::from_ymd_opt(2025, 6, 20).unwrap()),
            driver_id: Some("drv-1".to_string()),
            ..Default::default()
        };
        let manifest = fx.manifests.create("t1", input).await.unwrap();

        let mut ids = Vec::new();
        for i in 0..shipment_count {
            let shipment = fx
                .shipments
                .create("t1", &format!("TRK-{i}"), Some(2.0), Some(1), Some(25.0))
                .await
                .unwrap();
            ids.push(shipment.id);
        }
        fx.assignments
            .add_shipments(&manifest.id, &ids)
            .await
            .unwrap();
        (manifest.id, ids)
    }

    fn jane() -> PodInput {
        PodInput {
            recipient_name: "Jane Doe".to_string(),
            driver_id: Some("drv-1".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_mark_delivered_fans_out() {
        let fx = setup().await;
        let (manifest_id, ships) = seed(&fx, 2).await;
        let shipment_id = &ships[0];

        let before = fx
            .manifests
            .get_manifest(&manifest_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(before.delivered_count, 0);

        let outcome = fx
            .recorder
            .mark_delivered(&manifest_id, shipment_id, jane())
            .await
            .unwrap();
        assert_eq!(outcome.attempt_number, 1);

        // Stop row flipped.
        let detail = fx.manifests.get(&manifest_id).await.unwrap().unwrap();
        let stop = detail
            .stops
            .iter()
            .find(|s| &s.stop.shipment_id == shipment_id)
            .unwrap();
        assert_eq!(stop.stop.status, StopStatus::Delivered);
        assert!(stop.stop.completed_at.is_some());

        // Shipment row updated cross-entity.
        let shipment = fx.shipments.get(shipment_id).await.unwrap().unwrap();
        assert_eq!(
            shipment.status,
            crate::models::ShipmentStatus::Delivered
        );
        assert!(shipment.delivered_at.is_some());

        // POD written with the recipient.
        let pod = fx.deliveries.get_pod(shipment_id).await.unwrap().unwrap();
        assert_eq!(pod.recipient_name, "Jane Doe");

        // Attempt logged.
        let attempts = fx.deliveries.attempts_for(shipment_id).await.unwrap();
        assert_eq!(attempts.len(), 1);
        assert_eq!(attempts[0].attempt_number, 1);
        assert_eq!(attempts[0].status, crate::models::AttemptStatus::Delivered);

        // Event appended.
        let events = fx
            .events
            .events_for(&EventRef::Shipment(shipment_id.clone()))
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "delivered");
        assert_eq!(events[0].actor_type, ActorType::Driver);

        // Aggregates moved by exactly one delivery.
        let after = fx
            .manifests
            .get_manifest(&manifest_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(after.delivered_count, before.delivered_count + 1);
        assert_eq!(after.pending_count, 1);
        assert_eq!(
            after.delivered_count + after.failed_count + after.pending_count,
            after.total_shipments
        );
    }

    #[tokio::test]
    async fn test_mark_failed_skips_pod() {
        let fx = setup().await;
        let (manifest_id, ships) = seed(&fx, 1).await;
        let shipment_id = &ships[0];

        let failure = FailureInput {
            failure_code: Some("NOBODY_HOME".to_string()),
            failure_reason: "no one answered".to_string(),
            reschedule_date: NaiveDate::from_ymd_opt(2025, 6, 22),
            driver_id: Some("drv-1".to_string()),
            ..Default::default()
        };
        let outcome = fx
            .recorder
            .mark_failed(&manifest_id, shipment_id, failure)
            .await
            .unwrap();
        assert_eq!(outcome.attempt_number, 1);
        assert_eq!(outcome.totals.failed_count, 1);

        assert!(fx.deliveries.get_pod(shipment_id).await.unwrap().is_none());

        let detail = fx.manifests.get(&manifest_id).await.unwrap().unwrap();
        assert_eq!(detail.stops[0].stop.status, StopStatus::Failed);
        assert_eq!(
            detail.stops[0].stop.failure_reason.as_deref(),
            Some("no one answered")
        );

        let events = fx
            .events
            .events_for(&EventRef::Shipment(shipment_id.clone()))
            .await
            .unwrap();
        assert_eq!(events[0].event_type, "delivery_failed");
    }

    #[tokio::test]
    async fn test_attempt_numbers_increase_across_manifests() {
        let fx = setup().await;
        let (first_manifest, ships) = seed(&fx, 1).await;
        let shipment_id = ships[0].clone();

        let failure = FailureInput {
            failure_reason: "address not found".to_string(),
            ..Default::default()
        };
        fx.recorder
            .mark_failed(&first_manifest, &shipment_id, failure)
            .await
            .unwrap();

        // Complete the first manifest so the shipment can be reassigned.
        fx.manifests
            .change_status(&first_manifest, ManifestStatus::Confirmed)
            .await
            .unwrap();
        fx.manifests
            .change_status(&first_manifest, ManifestStatus::InProgress)
            .await
            .unwrap();
        fx.manifests
            .change_status(&first_manifest, ManifestStatus::Completed)
            .await
            .unwrap();

        // Reset the shipment so it is assignable again.
        fx.shipments
            .set_status(&shipment_id, crate::models::ShipmentStatus::Pending)
            .await
            .unwrap();

        let input = NewManifestInput {
            manifest_date: Some(NaiveDate::from_ymd_opt(2025, 6, 22).unwrap()),
            ..Default::default()
        };
        let second = fx.manifests.create("t1", input).await.unwrap();
        fx.assignments
            .add_shipments(&second.id, std::slice::from_ref(&shipment_id))
            .await
            .unwrap();

        let outcome = fx
            .recorder
            .mark_delivered(&second.id, &shipment_id, jane())
            .await
            .unwrap();
        assert_eq!(outcome.attempt_number, 2);

        // Strictly increasing, 1-based, no gaps.
        let attempts = fx.deliveries.attempts_for(&shipment_id).await.unwrap();
        let numbers: Vec<i32> = attempts.iter().map(|a| a.attempt_number).collect();
        assert_eq!(numbers, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_later_failure_keeps_earlier_pod() {
        let fx = setup().await;
        let (first_manifest, ships) = seed(&fx, 1).await;
        let shipment_id = ships[0].clone();

        fx.recorder
            .mark_delivered(&first_manifest, &shipment_id, jane())
            .await
            .unwrap();

        fx.manifests
            .change_status(&first_manifest, ManifestStatus::Confirmed)
            .await
            .unwrap();
        fx.manifests
            .change_status(&first_manifest, ManifestStatus::InProgress)
            .await
            .unwrap();
        fx.manifests
            .change_status(&first_manifest, ManifestStatus::Completed)
            .await
            .unwrap();
        fx.shipments
            .set_status(&shipment_id, crate::models::ShipmentStatus::Pending)
            .await
            .unwrap();

        let input = NewManifestInput {
            manifest_date: Some(NaiveDate::from_ymd_opt(2025, 6, 23).unwrap()),
            ..Default::default()
        };
        let second = fx.manifests.create("t1", input).await.unwrap();
        fx.assignments
            .add_shipments(&second.id, std::slice::from_ref(&shipment_id))
            .await
            .unwrap();

        let failure = FailureInput {
            failure_reason: "refused".to_string(),
            ..Default::default()
        };
        fx.recorder
            .mark_failed(&second.id, &shipment_id, failure)
            .await
            .unwrap();

        // The earlier POD survives the later failure.
        let pod = fx.deliveries.get_pod(&shipment_id).await.unwrap().unwrap();
        assert_eq!(pod.recipient_name, "Jane Doe");

        let attempts = fx.deliveries.attempts_for(&shipment_id).await.unwrap();
        assert_eq!(attempts.len(), 2);
    }

    #[tokio::test]
    async fn test_unlinked_shipment_is_not_found() {
        let fx = setup().await;
        let (manifest_id, _ships) = seed(&fx, 1).await;

        let stray = fx
            .shipments
            .create("t1", "TRK-STRAY", None, None, None)
            .await
            .unwrap();

        let err = fx
            .recorder
            .mark_delivered(&manifest_id, &stray.id, jane())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));

        // Nothing leaked out of the rolled-back transaction.
        assert!(fx.deliveries.get_pod(&stray.id).await.unwrap().is_none());
        assert!(fx.deliveries.attempts_for(&stray.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_outcomes_rejected_on_terminal_manifest() {
        let fx = setup().await;
        let (manifest_id, ships) = seed(&fx, 1).await;

        fx.manifests
            .change_status(&manifest_id, ManifestStatus::Cancelled)
            .await
            .unwrap();

        let err = fx
            .recorder
            .mark_delivered(&manifest_id, &ships[0], jane())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_skipped_stop_stays_pending() {
        let fx = setup().await;
        let (manifest_id, ships) = seed(&fx, 2).await;
        let shipment_id = &ships[0];

        fx.recorder
            .mark_in_transit(&manifest_id, shipment_id, Some("drv-1"))
            .await
            .unwrap();
        let detail = fx.manifests.get(&manifest_id).await.unwrap().unwrap();
        let stop = detail
            .stops
            .iter()
            .find(|s| &s.stop.shipment_id == shipment_id)
            .unwrap();
        assert_eq!(stop.stop.status, StopStatus::InTransit);

        fx.recorder
            .mark_skipped(&manifest_id, shipment_id, Some("gate locked"), Some("drv-1"))
            .await
            .unwrap();
        let detail = fx.manifests.get(&manifest_id).await.unwrap().unwrap();
        let stop = detail
            .stops
            .iter()
            .find(|s| &s.stop.shipment_id == shipment_id)
            .unwrap();
        assert_eq!(stop.stop.status, StopStatus::Skipped);
        assert_eq!(stop.stop.driver_notes.as_deref(), Some("gate locked"));

        // A skipped stop is still outstanding work.
        let manifest = fx
            .manifests
            .get_manifest(&manifest_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(manifest.pending_count, 2);
        assert_eq!(manifest.delivered_count, 0);

        // No attempt was logged, but both moves left events.
        assert!(fx.deliveries.attempts_for(shipment_id).await.unwrap().is_empty());
        let events = fx
            .events
            .events_for(&EventRef::Shipment(shipment_id.clone()))
            .await
            .unwrap();
        let types: Vec<&str> = events.iter().map(|e| e.event_type.as_str()).collect();
        assert_eq!(types, vec!["out_for_delivery", "stop_skipped"]);

        // The driver can still come back to a skipped stop.
        let outcome = fx
            .recorder
            .mark_delivered(&manifest_id, shipment_id, jane())
            .await
            .unwrap();
        assert_eq!(outcome.totals.delivered_count, 1);
        assert_eq!(outcome.totals.pending_count, 1);
    }

    #[tokio::test]
    async fn test_settled_stop_cannot_be_skipped() {
        let fx = setup().await;
        let (manifest_id, ships) = seed(&fx, 1).await;
        let shipment_id = &ships[0];

        fx.recorder
            .mark_delivered(&manifest_id, shipment_id, jane())
            .await
            .unwrap();

        let err = fx
            .recorder
            .mark_skipped(&manifest_id, shipment_id, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));

        let err = fx
            .recorder
            .mark_in_transit(&manifest_id, shipment_id, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_delivered_requires_recipient() {
        let fx = setup().await;
        let (manifest_id, ships) = seed(&fx, 1).await;

        let err = fx
            .recorder
            .mark_delivered(&manifest_id, &ships[0], PodInput::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
