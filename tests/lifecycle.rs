//! End-to-end manifest lifecycle test.
//!
//! Drives a manifest from creation through assignment, dispatch, mixed
//! delivery outcomes, and completion against a real migrated database.

use chrono::NaiveDate;
use tempfile::tempdir;

use manifesto::models::{
    EventRef, FailureInput, ManifestStatus, PodInput, ShipmentStatus, StopStatus,
};
use manifesto::repository::migrations::run_migrations;
use manifesto::repository::{
    AssignmentRepository, AsyncSqlitePool, DeliveryRepository, EventLog, ManifestRepository,
    ShipmentStore,
};
use manifesto::services::OutcomeRecorder;

#[tokio::test]
async fn test_full_manifest_lifecycle() {
    let dir = tempdir().unwrap();
    let db_url = dir.path().join("lifecycle.db").display().to_string();
    run_migrations(&db_url).await.unwrap();
    let pool = AsyncSqlitePool::new(&db_url);

    let manifests = ManifestRepository::new(pool.clone());
    let assignments = AssignmentRepository::new(pool.clone());
    let deliveries = DeliveryRepository::new(pool.clone());
    let events = EventLog::new(pool.clone());
    let shipments = ShipmentStore::new(pool.clone());
    let recorder = OutcomeRecorder::new(pool.clone());

    // Seed three shipments.
    let mut shipment_ids = Vec::new();
    for i in 0..3 {
        let shipment = shipments
            .create("acme", &format!("TRK-{i:03}"), Some(4.0), Some(2), Some(10.0))
            .await
            .unwrap();
        shipment_ids.push(shipment.id);
    }

    // Create a draft manifest and assign all three.
    let manifest = manifests
        .create(
            "acme",
            manifesto::models::NewManifestInput {
                manifest_date: Some(NaiveDate::from_ymd_opt(2025, 7, 1).unwrap()),
                vehicle_id: Some("veh-7".to_string()),
                driver_id: Some("drv-3".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(manifest.status, ManifestStatus::Draft);
    assert!(manifest.manifest_number.starts_with("MF-20250701-"));

    let stops = assignments
        .add_shipments(&manifest.id, &shipment_ids)
        .await
        .unwrap();
    let sequences: Vec<i32> = stops.iter().map(|s| s.stop_sequence).collect();
    assert_eq!(sequences, vec![1, 2, 3]);

    // Assigned shipments disappear from the available pool.
    let available = assignments.available_shipments("acme").await.unwrap();
    assert!(available.is_empty());

    // Aggregates reflect the assignment.
    let current = manifests.get_manifest(&manifest.id).await.unwrap().unwrap();
    assert_eq!(current.total_shipments, 3);
    assert_eq!(current.pending_count, 3);
    assert!((current.total_weight_kg - 12.0).abs() < f64::EPSILON);
    assert_eq!(current.total_packages, 6);

    // Dispatch: draft -> confirmed -> in_progress.
    manifests
        .change_status(&manifest.id, ManifestStatus::Confirmed)
        .await
        .unwrap();
    let dispatched = manifests
        .change_status(&manifest.id, ManifestStatus::InProgress)
        .await
        .unwrap();
    assert!(dispatched.started_at.is_some());

    // Once in progress the stop list is frozen.
    let extra = shipments
        .create("acme", "TRK-EXTRA", None, None, None)
        .await
        .unwrap();
    let err = assignments
        .add_shipments(&manifest.id, std::slice::from_ref(&extra.id))
        .await
        .unwrap_err();
    assert!(matches!(err, manifesto::Error::InvalidState(_)));

    // Two deliveries, one failure.
    for id in &shipment_ids[..2] {
        let outcome = recorder
            .mark_delivered(
                &manifest.id,
                id,
                PodInput {
                    recipient_name: "R. Receiver".to_string(),
                    driver_id: Some("drv-3".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(outcome.attempt_number, 1);
    }
    recorder
        .mark_failed(
            &manifest.id,
            &shipment_ids[2],
            FailureInput {
                failure_reason: "address not found".to_string(),
                failure_code: Some("BAD_ADDRESS".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    // Aggregates add up after the outcomes.
    let current = manifests.get_manifest(&manifest.id).await.unwrap().unwrap();
    assert_eq!(current.delivered_count, 2);
    assert_eq!(current.failed_count, 1);
    assert_eq!(current.pending_count, 0);

    // Delivered shipments carry their status and POD; the failed one
    // has an attempt but no POD.
    for id in &shipment_ids[..2] {
        let shipment = shipments.get(id).await.unwrap().unwrap();
        assert_eq!(shipment.status, ShipmentStatus::Delivered);
        assert!(deliveries.get_pod(id).await.unwrap().is_some());
    }
    assert!(deliveries.get_pod(&shipment_ids[2]).await.unwrap().is_none());
    let attempts = deliveries.attempts_for(&shipment_ids[2]).await.unwrap();
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0].failure_reason.as_deref(), Some("address not found"));

    // Every outcome produced an event.
    for id in &shipment_ids {
        let log = events
            .events_for(&EventRef::Shipment(id.clone()))
            .await
            .unwrap();
        assert_eq!(log.len(), 1);
    }

    // Complete the run.
    let completed = manifests
        .change_status(&manifest.id, ManifestStatus::Completed)
        .await
        .unwrap();
    assert!(completed.completed_at.is_some());

    // Terminal manifests release their shipments; only the undelivered
    // ones are assignable again.
    shipments
        .set_status(&shipment_ids[2], ShipmentStatus::Pending)
        .await
        .unwrap();
    let available = assignments.available_shipments("acme").await.unwrap();
    let ids: Vec<&str> = available.iter().map(|s| s.id.as_str()).collect();
    assert!(ids.contains(&shipment_ids[2].as_str()));
    assert!(ids.contains(&extra.id.as_str()));
    assert!(!ids.contains(&shipment_ids[0].as_str()));

    // A second failed run bumps the attempt number past the first.
    let retry = manifests
        .create(
            "acme",
            manifesto::models::NewManifestInput {
                manifest_date: Some(NaiveDate::from_ymd_opt(2025, 7, 2).unwrap()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assignments
        .add_shipments(&retry.id, std::slice::from_ref(&shipment_ids[2]))
        .await
        .unwrap();
    let outcome = recorder
        .mark_delivered(
            &retry.id,
            &shipment_ids[2],
            PodInput {
                recipient_name: "Neighbor".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(outcome.attempt_number, 2);

    // The retry manifest's stop is delivered while the original
    // manifest keeps its failed stop.
    let retry_detail = manifests.get(&retry.id).await.unwrap().unwrap();
    assert_eq!(retry_detail.stops[0].stop.status, StopStatus::Delivered);
    let original = manifests.get(&manifest.id).await.unwrap().unwrap();
    let failed_stop = original
        .stops
        .iter()
        .find(|s| s.stop.shipment_id == shipment_ids[2])
        .unwrap();
    assert_eq!(failed_stop.stop.status, StopStatus::Failed);
}

#[tokio::test]
async fn test_completed_manifest_rejects_reopening() {
    let dir = tempdir().unwrap();
    let db_url = dir.path().join("terminal.db").display().to_string();
    run_migrations(&db_url).await.unwrap();
    let pool = AsyncSqlitePool::new(&db_url);

    let manifests = ManifestRepository::new(pool);
    let manifest = manifests
        .create(
            "acme",
            manifesto::models::NewManifestInput {
                manifest_date: Some(NaiveDate::from_ymd_opt(2025, 7, 1).unwrap()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    for status in [
        ManifestStatus::Confirmed,
        ManifestStatus::InProgress,
        ManifestStatus::Completed,
    ] {
        manifests.change_status(&manifest.id, status).await.unwrap();
    }

    for status in [
        ManifestStatus::Draft,
        ManifestStatus::InProgress,
        ManifestStatus::Cancelled,
    ] {
        let err = manifests
            .change_status(&manifest.id, status)
            .await
            .unwrap_err();
        assert!(matches!(err, manifesto::Error::InvalidState(_)));
    }
}
