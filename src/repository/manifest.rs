//! Diesel-based manifest repository for SQLite.
//!
//! Owns the manifest lifecycle: creation with a generated manifest
//! number, filtered listing, partial updates, validated status
//! transitions, and draft-only deletion with cascade to stop links.

use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncConnection, RunQueryDsl};
use rand::Rng;
use tracing::debug;
use uuid::Uuid;

use super::pool::AsyncSqlitePool;
use super::records::{ManifestRecord, ManifestShipmentRecord, NewManifest, NewManifestShipment};
use super::shipment::summaries_in;
use crate::error::{Error, Result};
use crate::models::{
    Manifest, ManifestDetail, ManifestFilter, ManifestPatch, ManifestShipment, ManifestStatus,
    ManifestType, NewManifestInput, StopDetail, StopStatus,
};
use crate::schema::{manifest_shipments, manifests};
use crate::services::aggregates;

// No lookalike characters in manifest numbers (0/O, 1/I/L).
const NUMBER_SUFFIX_CHARS: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

/// Generate a human-readable manifest number: date prefix plus a random
/// 4-character suffix. Collision risk is accepted and not re-checked;
/// the per-tenant unique constraint catches the pathological case.
pub fn generate_manifest_number(date: NaiveDate) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..4)
        .map(|_| {
            let idx = rng.gen_range(0..NUMBER_SUFFIX_CHARS.len());
            NUMBER_SUFFIX_CHARS[idx] as char
        })
        .collect();
    format!("MF-{}-{}", date.format("%Y%m%d"), suffix)
}

/// Diesel-based manifest repository with compile-time query checking.
#[derive(Clone)]
pub struct ManifestRepository {
    pool: AsyncSqlitePool,
}

impl ManifestRepository {
    pub fn new(pool: AsyncSqlitePool) -> Self {
        Self { pool }
    }

    /// List a tenant's manifests, newest date first.
    pub async fn list(&self, tenant_id: &str, filter: &ManifestFilter) -> Result<Vec<Manifest>> {
        let mut conn = self.pool.get().await?;

        let mut query = manifests::table
            .filter(manifests::tenant_id.eq(tenant_id))
            .order((manifests::manifest_date.desc(), manifests::created_at.desc()))
            .into_boxed();

        if let Some(status) = filter.status {
            query = query.filter(manifests::status.eq(status.as_str()));
        }
        if let Some(from) = filter.date_from {
            query = query.filter(manifests::manifest_date.ge(from.format("%Y-%m-%d").to_string()));
        }
        if let Some(to) = filter.date_to {
            query = query.filter(manifests::manifest_date.le(to.format("%Y-%m-%d").to_string()));
        }
        if let Some(carrier) = &filter.carrier_id {
            query = query.filter(manifests::carrier_id.eq(carrier.clone()));
        }
        if let Some(vehicle) = &filter.vehicle_id {
            query = query.filter(manifests::vehicle_id.eq(vehicle.clone()));
        }
        if let Some(number) = &filter.number_like {
            query = query.filter(manifests::manifest_number.like(format!("%{number}%")));
        }

        let records: Vec<ManifestRecord> = query.load(&mut conn).await?;
        Ok(records.into_iter().map(Manifest::from).collect())
    }

    /// Get a manifest without its stop list.
    pub async fn get_manifest(&self, id: &str) -> Result<Option<Manifest>> {
        let mut conn = self.pool.get().await?;

        let record: Option<ManifestRecord> = manifests::table
            .find(id)
            .first(&mut conn)
            .await
            .optional()?;

        Ok(record.map(Manifest::from))
    }

    /// Get a manifest with its stops joined to shipment summaries.
    /// Absent id is `Ok(None)`, never an error.
    pub async fn get(&self, id: &str) -> Result<Option<ManifestDetail>> {
        let mut conn = self.pool.get().await?;

        let record: Option<ManifestRecord> = manifests::table
            .find(id)
            .first(&mut conn)
            .await
            .optional()?;
        let Some(record) = record else {
            return Ok(None);
        };

        let stop_records: Vec<ManifestShipmentRecord> = manifest_shipments::table
            .filter(manifest_shipments::manifest_id.eq(id))
            .order(manifest_shipments::stop_sequence.asc())
            .load(&mut conn)
            .await?;

        let ids: Vec<String> = stop_records.iter().map(|s| s.shipment_id.clone()).collect();
        let mut shipments: std::collections::HashMap<_, _> = summaries_in(&mut conn, &ids)
            .await?
            .into_iter()
            .map(|s| (s.id.clone(), s))
            .collect();

        let stops = stop_records
            .into_iter()
            .map(|record| {
                let stop = ManifestShipment::from(record);
                let shipment = shipments.remove(&stop.shipment_id);
                StopDetail { stop, shipment }
            })
            .collect();

        Ok(Some(ManifestDetail {
            manifest: Manifest::from(record),
            stops,
        }))
    }

    /// Create a manifest in `draft` with zeroed aggregates.
    pub async fn create(&self, tenant_id: &str, input: NewManifestInput) -> Result<Manifest> {
        let manifest_date = input
            .manifest_date
            .ok_or_else(|| Error::Validation("manifest_date is required".to_string()))?;

        let mut conn = self.pool.get().await?;

        let id = Uuid::new_v4().to_string();
        let number = generate_manifest_number(manifest_date);
        let date = manifest_date.format("%Y-%m-%d").to_string();
        let manifest_type = input.manifest_type.unwrap_or(ManifestType::Delivery);
        let planned_start = input.planned_start_at.map(|dt| dt.to_rfc3339());
        let planned_end = input.planned_end_at.map(|dt| dt.to_rfc3339());
        let now = Utc::now().to_rfc3339();

        let row = NewManifest {
            id: &id,
            tenant_id,
            branch_id: input.branch_id.as_deref(),
            manifest_number: &number,
            manifest_date: &date,
            manifest_type: manifest_type.as_str(),
            carrier_id: input.carrier_id.as_deref(),
            vehicle_id: input.vehicle_id.as_deref(),
            driver_id: input.driver_id.as_deref(),
            route_id: input.route_id.as_deref(),
            planned_start_at: planned_start.as_deref(),
            planned_end_at: planned_end.as_deref(),
            status: ManifestStatus::Draft.as_str(),
            notes: input.notes.as_deref(),
            created_at: &now,
            updated_at: &now,
        };

        diesel::insert_into(manifests::table)
            .values(&row)
            .execute(&mut conn)
            .await?;

        debug!("created manifest {} ({})", number, id);

        let record: ManifestRecord = manifests::table.find(&id).first(&mut conn).await?;
        Ok(Manifest::from(record))
    }

    /// Patch mutable fields. Aggregates and status are out of reach here.
    ///
    /// The write is fenced on the version read at the start, so a patch
    /// built against a stale snapshot surfaces as `Conflict` instead of
    /// silently overwriting a concurrent edit.
    pub async fn update(&self, id: &str, patch: ManifestPatch) -> Result<Manifest> {
        let current = self
            .get_manifest(id)
            .await?
            .ok_or_else(|| Error::not_found("manifest", id))?;

        let manifest_date = patch.manifest_date.unwrap_or(current.manifest_date);
        let carrier_id = patch.carrier_id.unwrap_or(current.carrier_id);
        let vehicle_id = patch.vehicle_id.unwrap_or(current.vehicle_id);
        let driver_id = patch.driver_id.unwrap_or(current.driver_id);
        let route_id = patch.route_id.unwrap_or(current.route_id);
        let planned_start_at = patch.planned_start_at.unwrap_or(current.planned_start_at);
        let planned_end_at = patch.planned_end_at.unwrap_or(current.planned_end_at);
        let notes = patch.notes.unwrap_or(current.notes);
        let driver_notes = patch.driver_notes.unwrap_or(current.driver_notes);

        let mut conn = self.pool.get().await?;

        let rows = diesel::update(
            manifests::table
                .find(id)
                .filter(manifests::version.eq(current.version)),
        )
        .set((
            manifests::manifest_date.eq(manifest_date.format("%Y-%m-%d").to_string()),
            manifests::carrier_id.eq(carrier_id),
            manifests::vehicle_id.eq(vehicle_id),
            manifests::driver_id.eq(driver_id),
            manifests::route_id.eq(route_id),
            manifests::planned_start_at.eq(planned_start_at.map(|dt| dt.to_rfc3339())),
            manifests::planned_end_at.eq(planned_end_at.map(|dt| dt.to_rfc3339())),
            manifests::notes.eq(notes),
            manifests::driver_notes.eq(driver_notes),
            manifests::version.eq(manifests::version + 1),
            manifests::updated_at.eq(Utc::now().to_rfc3339()),
        ))
        .execute(&mut conn)
        .await?;

        if rows == 0 {
            return Err(Error::Conflict(format!(
                "manifest {} was modified concurrently",
                id
            )));
        }

        let record: ManifestRecord = manifests::table.find(id).first(&mut conn).await?;
        Ok(Manifest::from(record))
    }

    /// Advance the manifest lifecycle.
    ///
    /// Illegal transitions are rejected with `InvalidState`; `started_at`
    /// and `completed_at` are stamped on entry to `in_progress` and
    /// `completed`. The write is a compare-and-swap on the old status, so
    /// a concurrent transition surfaces as `Conflict`.
    pub async fn change_status(&self, id: &str, new_status: ManifestStatus) -> Result<Manifest> {
        let current = self
            .get_manifest(id)
            .await?
            .ok_or_else(|| Error::not_found("manifest", id))?;

        if !current.status.can_transition_to(new_status) {
            return Err(Error::InvalidState(format!(
                "manifest {} cannot move from {} to {}",
                id,
                current.status.as_str(),
                new_status.as_str()
            )));
        }

        let mut conn = self.pool.get().await?;
        let now = Utc::now().to_rfc3339();
        let guard = manifests::table
            .find(id)
            .filter(manifests::status.eq(current.status.as_str()));

        let rows = match new_status {
            ManifestStatus::InProgress => {
                diesel::update(guard)
                    .set((
                        manifests::status.eq(new_status.as_str()),
                        manifests::started_at.eq(Some(&now)),
                        manifests::version.eq(manifests::version + 1),
                        manifests::updated_at.eq(&now),
                    ))
                    .execute(&mut conn)
                    .await?
            }
            ManifestStatus::Completed => {
                diesel::update(guard)
                    .set((
                        manifests::status.eq(new_status.as_str()),
                        manifests::completed_at.eq(Some(&now)),
                        manifests::version.eq(manifests::version + 1),
                        manifests::updated_at.eq(&now),
                    ))
                    .execute(&mut conn)
                    .await?
            }
            _ => {
                diesel::update(guard)
                    .set((
                        manifests::status.eq(new_status.as_str()),
                        manifests::version.eq(manifests::version + 1),
                        manifests::updated_at.eq(&now),
                    ))
                    .execute(&mut conn)
                    .await?
            }
        };

        if rows == 0 {
            return Err(Error::Conflict(format!(
                "manifest {} was modified concurrently",
                id
            )));
        }

        let record: ManifestRecord = manifests::table.find(id).first(&mut conn).await?;
        Ok(Manifest::from(record))
    }

    /// Delete a draft manifest, cascading its stop links.
    ///
    /// The status check and both deletes run in one transaction, and
    /// the manifest delete is conditional on the row still being a
    /// draft, so a concurrent confirmation cannot lose the manifest.
    /// Delivery attempts, proof of delivery, and events reference the
    /// shipment, not the manifest, and are left untouched.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let mut conn = self.pool.get().await?;

        conn.transaction::<_, Error, _>(|conn| {
            Box::pin(async move {
                let current: ManifestRecord = manifests::table
                    .find(id)
                    .first(conn)
                    .await
                    .optional()?
                    .ok_or_else(|| Error::not_found("manifest", id))?;

                if current.status != ManifestStatus::Draft.as_str() {
                    return Err(Error::InvalidState(format!(
                        "only draft manifests can be deleted, manifest {} is {}",
                        id, current.status
                    )));
                }

                diesel::delete(
                    manifest_shipments::table.filter(manifest_shipments::manifest_id.eq(id)),
                )
                .execute(conn)
                .await?;

                let rows = diesel::delete(
                    manifests::table
                        .find(id)
                        .filter(manifests::status.eq(ManifestStatus::Draft.as_str())),
                )
                .execute(conn)
                .await?;

                if rows == 0 {
                    return Err(Error::Conflict(format!(
                        "manifest {} was modified concurrently",
                        id
                    )));
                }

                Ok(())
            })
        })
        .await
    }

    /// Clone a manifest into a fresh draft: schedule and reference
    /// fields copied, a new number generated, the same shipments
    /// re-linked with statuses reset to pending.
    pub async fn duplicate(&self, source_id: &str) -> Result<Manifest> {
        let mut conn = self.pool.get().await?;

        let new_id = Uuid::new_v4().to_string();

        let record = conn
            .transaction::<_, Error, _>(|conn| {
                let new_id = new_id.clone();
                Box::pin(async move {
                    let source: ManifestRecord = manifests::table
                        .find(source_id)
                        .first(conn)
                        .await
                        .optional()?
                        .ok_or_else(|| Error::not_found("manifest", source_id))?;

                    let stops: Vec<ManifestShipmentRecord> = manifest_shipments::table
                        .filter(manifest_shipments::manifest_id.eq(source_id))
                        .order(manifest_shipments::stop_sequence.asc())
                        .load(conn)
                        .await?;

                    let number = generate_manifest_number(super::parse_date(&source.manifest_date));
                    let now = Utc::now().to_rfc3339();

                    let row = NewManifest {
                        id: &new_id,
                        tenant_id: &source.tenant_id,
                        branch_id: source.branch_id.as_deref(),
                        manifest_number: &number,
                        manifest_date: &source.manifest_date,
                        manifest_type: &source.manifest_type,
                        carrier_id: source.carrier_id.as_deref(),
                        vehicle_id: source.vehicle_id.as_deref(),
                        driver_id: source.driver_id.as_deref(),
                        route_id: source.route_id.as_deref(),
                        planned_start_at: source.planned_start_at.as_deref(),
                        planned_end_at: source.planned_end_at.as_deref(),
                        status: ManifestStatus::Draft.as_str(),
                        notes: source.notes.as_deref(),
                        created_at: &now,
                        updated_at: &now,
                    };

                    diesel::insert_into(manifests::table)
                        .values(&row)
                        .execute(conn)
                        .await?;

                    for stop in &stops {
                        let link = NewManifestShipment {
                            manifest_id: &new_id,
                            shipment_id: &stop.shipment_id,
                            stop_sequence: stop.stop_sequence,
                            status: StopStatus::Pending.as_str(),
                            created_at: &now,
                            updated_at: &now,
                        };
                        diesel::insert_into(manifest_shipments::table)
                            .values(&link)
                            .execute(conn)
                            .await?;
                    }

                    if !stops.is_empty() {
                        aggregates::recalculate(conn, &new_id).await?;
                    }

                    let record: ManifestRecord =
                        manifests::table.find(&new_id).first(conn).await?;
                    Ok(record)
                })
            })
            .await?;

        Ok(Manifest::from(record))
    }
}
