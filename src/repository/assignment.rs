//! Manifest-shipment assignment: linking shipments to a manifest as
//! ordered stops.
//!
//! A shipment may sit on at most one manifest that is not completed or
//! cancelled. The availability query filters committed shipments out,
//! and `add_shipments` re-checks inside its transaction so two
//! dispatchers cannot claim the same shipment concurrently.

use chrono::Utc;
use diesel::dsl::max;
use diesel::prelude::*;
use diesel_async::{AsyncConnection, RunQueryDsl};

use super::pool::AsyncSqlitePool;
use super::records::{ManifestRecord, ManifestShipmentRecord, NewManifestShipment, ShipmentRecord};
use crate::error::{Error, Result};
use crate::models::{ManifestShipment, ManifestStatus, ShipmentStatus, ShipmentSummary, StopStatus};
use crate::schema::{manifest_shipments, manifests, shipments};
use crate::services::aggregates;

const TERMINAL_STATUSES: [&str; 2] = ["completed", "cancelled"];

/// Repository for stop links between manifests and shipments.
#[derive(Clone)]
pub struct AssignmentRepository {
    pool: AsyncSqlitePool,
}

impl AssignmentRepository {
    pub fn new(pool: AsyncSqlitePool) -> Self {
        Self { pool }
    }

    /// Add shipments to a manifest as new stops at the end of the
    /// route, in input order. Recomputes aggregates in the same
    /// transaction.
    pub async fn add_shipments(
        &self,
        manifest_id: &str,
        shipment_ids: &[String],
    ) -> Result<Vec<ManifestShipment>> {
        if shipment_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.pool.get().await?;

        let records = conn
            .transaction::<_, Error, _>(|conn| {
                Box::pin(async move {
                    let manifest: ManifestRecord = manifests::table
                        .find(manifest_id)
                        .first(conn)
                        .await
                        .optional()?
                        .ok_or_else(|| Error::not_found("manifest", manifest_id))?;

                    let status = ManifestStatus::from_str(&manifest.status)
                        .unwrap_or(ManifestStatus::Draft);
                    if !status.is_mutable() {
                        return Err(Error::InvalidState(format!(
                            "cannot add shipments to a {} manifest",
                            status.as_str()
                        )));
                    }

                    // Every id must resolve to a shipment still in an
                    // assignable status; a delivered shipment cannot be
                    // put back on a route.
                    let shipment_records: Vec<ShipmentRecord> = shipments::table
                        .filter(shipments::id.eq_any(shipment_ids))
                        .load(conn)
                        .await?;
                    if shipment_records.len() != shipment_ids.len() {
                        let known: Vec<&str> =
                            shipment_records.iter().map(|s| s.id.as_str()).collect();
                        let missing = shipment_ids
                            .iter()
                            .find(|id| !known.contains(&id.as_str()))
                            .map(String::as_str)
                            .unwrap_or_default();
                        return Err(Error::not_found("shipment", missing));
                    }
                    for record in &shipment_records {
                        let assignable = ShipmentStatus::from_str(&record.status)
                            .map(|s| s.is_assignable())
                            .unwrap_or(false);
                        if !assignable {
                            return Err(Error::InvalidState(format!(
                                "shipment {} is {} and cannot be assigned",
                                record.id, record.status
                            )));
                        }
                    }

                    // Re-check exclusivity inside the transaction: the
                    // availability query the caller used is a point-in-time
                    // read and may be stale by now.
                    let claimed: Vec<String> = manifest_shipments::table
                        .inner_join(manifests::table)
                        .filter(manifest_shipments::shipment_id.eq_any(shipment_ids))
                        .filter(manifests::status.ne_all(TERMINAL_STATUSES))
                        .select(manifest_shipments::shipment_id)
                        .load(conn)
                        .await?;
                    if !claimed.is_empty() {
                        return Err(Error::Conflict(format!(
                            "shipments already on an active manifest: {}",
                            claimed.join(", ")
                        )));
                    }

                    let current_max: Option<i32> = manifest_shipments::table
                        .filter(manifest_shipments::manifest_id.eq(manifest_id))
                        .select(max(manifest_shipments::stop_sequence))
                        .first(conn)
                        .await?;
                    let mut next_sequence = current_max.unwrap_or(0) + 1;

                    let now = Utc::now().to_rfc3339();
                    for shipment_id in shipment_ids {
                        let row = NewManifestShipment {
                            manifest_id,
                            shipment_id,
                            stop_sequence: next_sequence,
                            status: StopStatus::Pending.as_str(),
                            created_at: &now,
                            updated_at: &now,
                        };
                        diesel::insert_into(manifest_shipments::table)
                            .values(&row)
                            .execute(conn)
                            .await?;
                        next_sequence += 1;
                    }

                    aggregates::recalculate(conn, manifest_id).await?;

                    let records: Vec<ManifestShipmentRecord> = manifest_shipments::table
                        .filter(manifest_shipments::manifest_id.eq(manifest_id))
                        .filter(manifest_shipments::shipment_id.eq_any(shipment_ids))
                        .order(manifest_shipments::stop_sequence.asc())
                        .load(conn)
                        .await?;
                    Ok(records)
                })
            })
            .await?;

        Ok(records.into_iter().map(ManifestShipment::from).collect())
    }

    /// Remove stops from a mutable manifest. Returns rows removed.
    pub async fn remove_shipments(
        &self,
        manifest_id: &str,
        shipment_ids: &[String],
    ) -> Result<usize> {
        let mut conn = self.pool.get().await?;

        conn.transaction::<_, Error, _>(|conn| {
            Box::pin(async move {
                let manifest: ManifestRecord = manifests::table
                    .find(manifest_id)
                    .first(conn)
                    .await
                    .optional()?
                    .ok_or_else(|| Error::not_found("manifest", manifest_id))?;

                let status =
                    ManifestStatus::from_str(&manifest.status).unwrap_or(ManifestStatus::Draft);
                if !status.is_mutable() {
                    return Err(Error::InvalidState(format!(
                        "cannot remove shipments from a {} manifest",
                        status.as_str()
                    )));
                }

                let removed = diesel::delete(
                    manifest_shipments::table
                        .filter(manifest_shipments::manifest_id.eq(manifest_id))
                        .filter(manifest_shipments::shipment_id.eq_any(shipment_ids)),
                )
                .execute(conn)
                .await?;

                aggregates::recalculate(conn, manifest_id).await?;

                Ok(removed)
            })
        })
        .await
    }

    /// Rewrite the stop order: each shipment gets its 1-based position
    /// in `ordered_ids`. Applied row by row inside one transaction; a
    /// first pass shifts every sequence out of the way of the
    /// per-manifest uniqueness constraint.
    pub async fn reorder_shipments(
        &self,
        manifest_id: &str,
        ordered_ids: &[String],
    ) -> Result<()> {
        if ordered_ids.is_empty() {
            return Ok(());
        }

        let mut conn = self.pool.get().await?;

        conn.transaction::<_, Error, _>(|conn| {
            Box::pin(async move {
                let current_max: Option<i32> = manifest_shipments::table
                    .filter(manifest_shipments::manifest_id.eq(manifest_id))
                    .select(max(manifest_shipments::stop_sequence))
                    .first(conn)
                    .await?;
                let shift = current_max.unwrap_or(0);

                let now = Utc::now().to_rfc3339();

                diesel::update(
                    manifest_shipments::table
                        .filter(manifest_shipments::manifest_id.eq(manifest_id)),
                )
                .set(manifest_shipments::stop_sequence.eq(manifest_shipments::stop_sequence + shift))
                .execute(conn)
                .await?;

                for (position, shipment_id) in ordered_ids.iter().enumerate() {
                    let rows = diesel::update(
                        manifest_shipments::table
                            .filter(manifest_shipments::manifest_id.eq(manifest_id))
                            .filter(manifest_shipments::shipment_id.eq(shipment_id)),
                    )
                    .set((
                        manifest_shipments::stop_sequence.eq(position as i32 + 1),
                        manifest_shipments::updated_at.eq(&now),
                    ))
                    .execute(conn)
                    .await?;

                    if rows == 0 {
                        return Err(Error::not_found("manifest shipment", shipment_id.clone()));
                    }
                }

                Ok(())
            })
        })
        .await
    }

    /// Shipments in an assignable status that are not committed to any
    /// active manifest. This is the sole guard against double
    /// assignment on the read side; `add_shipments` re-checks on write.
    pub async fn available_shipments(&self, tenant_id: &str) -> Result<Vec<ShipmentSummary>> {
        let mut conn = self.pool.get().await?;

        let committed = manifest_shipments::table
            .inner_join(manifests::table)
            .filter(manifests::status.ne_all(TERMINAL_STATUSES))
            .select(manifest_shipments::shipment_id);

        let records: Vec<ShipmentRecord> = shipments::table
            .filter(shipments::tenant_id.eq(tenant_id))
            .filter(shipments::status.eq_any(ShipmentStatus::assignable_strs()))
            .filter(shipments::id.ne_all(committed))
            .order(shipments::created_at.asc())
            .load(&mut conn)
            .await?;

        Ok(records.into_iter().map(ShipmentSummary::from).collect())
    }

    /// Patch the driver notes on one stop. No aggregate or status effect.
    pub async fn update_stop_notes(
        &self,
        manifest_id: &str,
        shipment_id: &str,
        notes: Option<&str>,
    ) -> Result<()> {
        let mut conn = self.pool.get().await?;

        let rows = diesel::update(
            manifest_shipments::table
                .filter(manifest_shipments::manifest_id.eq(manifest_id))
                .filter(manifest_shipments::shipment_id.eq(shipment_id)),
        )
        .set((
            manifest_shipments::driver_notes.eq(notes),
            manifest_shipments::updated_at.eq(Utc::now().to_rfc3339()),
        ))
        .execute(&mut conn)
        .await?;

        if rows == 0 {
            return Err(Error::not_found("manifest shipment", shipment_id));
        }
        Ok(())
    }

    /// Patch the stop sequence of one stop directly.
    pub async fn update_stop_sequence(
        &self,
        manifest_id: &str,
        shipment_id: &str,
        stop_sequence: i32,
    ) -> Result<()> {
        if stop_sequence < 1 {
            return Err(Error::Validation(
                "stop_sequence must be positive".to_string(),
            ));
        }

        let mut conn = self.pool.get().await?;

        let rows = diesel::update(
            manifest_shipments::table
                .filter(manifest_shipments::manifest_id.eq(manifest_id))
                .filter(manifest_shipments::shipment_id.eq(shipment_id)),
        )
        .set((
            manifest_shipments::stop_sequence.eq(stop_sequence),
            manifest_shipments::updated_at.eq(Utc::now().to_rfc3339()),
        ))
        .execute(&mut conn)
        .await?;

        if rows == 0 {
            return Err(Error::not_found("manifest shipment", shipment_id));
        }
        Ok(())
    }
}
