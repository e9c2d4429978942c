//! The shipment store collaborator.
//!
//! Shipment master data is owned elsewhere; this subsystem reads the
//! summary fields it needs and writes back delivery status only.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use super::pool::{AsyncSqliteConnection, AsyncSqlitePool};
use super::records::{NewShipment, ShipmentRecord};
use crate::error::Result;
use crate::models::{ShipmentStatus, ShipmentSummary};
use crate::schema::shipments;

/// Narrow read/write access to shipment rows.
#[derive(Clone)]
pub struct ShipmentStore {
    pool: AsyncSqlitePool,
}

impl ShipmentStore {
    pub fn new(pool: AsyncSqlitePool) -> Self {
        Self { pool }
    }

    /// Get a shipment summary by ID.
    pub async fn get(&self, id: &str) -> Result<Option<ShipmentSummary>> {
        let mut conn = self.pool.get().await?;

        let record: Option<ShipmentRecord> = shipments::table
            .find(id)
            .first(&mut conn)
            .await
            .optional()?;

        Ok(record.map(ShipmentSummary::from))
    }

    /// Look a shipment up by its tracking number within a tenant.
    pub async fn find_by_tracking(
        &self,
        tenant_id: &str,
        tracking_number: &str,
    ) -> Result<Option<ShipmentSummary>> {
        let mut conn = self.pool.get().await?;

        let record: Option<ShipmentRecord> = shipments::table
            .filter(shipments::tenant_id.eq(tenant_id))
            .filter(shipments::tracking_number.eq(tracking_number))
            .first(&mut conn)
            .await
            .optional()?;

        Ok(record.map(ShipmentSummary::from))
    }

    /// Register a shipment (seeding path for the CLI and tests).
    pub async fn create(
        &self,
        tenant_id: &str,
        tracking_number: &str,
        weight_kg: Option<f64>,
        package_count: Option<i32>,
        cod_amount: Option<f64>,
    ) -> Result<ShipmentSummary> {
        let mut conn = self.pool.get().await?;

        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let row = NewShipment {
            id: &id,
            tenant_id,
            tracking_number,
            status: ShipmentStatus::Pending.as_str(),
            weight_kg,
            package_count,
            cod_amount,
            created_at: &now,
            updated_at: &now,
        };

        diesel::insert_into(shipments::table)
            .values(&row)
            .execute(&mut conn)
            .await?;

        let record: ShipmentRecord = shipments::table.find(&id).first(&mut conn).await?;
        Ok(ShipmentSummary::from(record))
    }

    /// Update a shipment's status outside any larger transaction.
    pub async fn set_status(&self, id: &str, status: ShipmentStatus) -> Result<()> {
        let mut conn = self.pool.get().await?;

        diesel::update(shipments::table.find(id))
            .set((
                shipments::status.eq(status.as_str()),
                shipments::updated_at.eq(Utc::now().to_rfc3339()),
            ))
            .execute(&mut conn)
            .await?;

        Ok(())
    }
}

/// Mark a shipment delivered on a borrowed connection (outcome
/// recorder's cross-entity write). Returns rows affected.
pub async fn mark_delivered_in(
    conn: &mut AsyncSqliteConnection,
    shipment_id: &str,
    delivered_at: DateTime<Utc>,
) -> Result<usize> {
    let stamp = delivered_at.to_rfc3339();

    let rows = diesel::update(shipments::table.find(shipment_id))
        .set((
            shipments::status.eq(ShipmentStatus::Delivered.as_str()),
            shipments::delivered_at.eq(&stamp),
            shipments::updated_at.eq(&stamp),
        ))
        .execute(conn)
        .await?;

    Ok(rows)
}

/// Load summaries for a set of shipment ids on a borrowed connection.
pub async fn summaries_in(
    conn: &mut AsyncSqliteConnection,
    ids: &[String],
) -> Result<Vec<ShipmentSummary>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let records: Vec<ShipmentRecord> = shipments::table
        .filter(shipments::id.eq_any(ids))
        .load(conn)
        .await?;

    Ok(records.into_iter().map(ShipmentSummary::from).collect())
}
