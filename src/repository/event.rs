//! Transport event log: append-only, timestamped audit entries keyed by
//! a typed reference to a manifest, shipment, or trip.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::warn;

use super::pool::{AsyncSqliteConnection, AsyncSqlitePool};
use super::records::{NewTransportEvent, TransportEventRecord};
use crate::error::Result;
use crate::models::{ActorType, EventContext, EventRef, TransportEvent};
use crate::schema::transport_events;

/// Source tag stamped on every event this crate writes.
const EVENT_SOURCE: &str = "manifesto";

/// Read side of the transport event log. Writes happen through
/// [`append_in`] inside the writer's transaction, so an event commits
/// or rolls back with the business change it describes.
#[derive(Clone)]
pub struct EventLog {
    pool: AsyncSqlitePool,
}

impl EventLog {
    pub fn new(pool: AsyncSqlitePool) -> Self {
        Self { pool }
    }

    /// Events for one reference, oldest first.
    pub async fn events_for(&self, reference: &EventRef) -> Result<Vec<TransportEvent>> {
        let mut conn = self.pool.get().await?;

        let records: Vec<TransportEventRecord> = transport_events::table
            .filter(transport_events::reference_type.eq(reference.type_str()))
            .filter(transport_events::reference_id.eq(reference.id()))
            .order(transport_events::occurred_at.asc())
            .load(&mut conn)
            .await?;

        let mut events = Vec::with_capacity(records.len());
        for record in records {
            let id = record.id;
            match record.into_model() {
                Some(event) => events.push(event),
                None => warn!("skipping transport event {} with unknown reference type", id),
            }
        }
        Ok(events)
    }
}

/// Append an event on a borrowed connection, inside the caller's
/// transaction: the audit entry commits or rolls back together with the
/// business change it describes.
pub async fn append_in(
    conn: &mut AsyncSqliteConnection,
    tenant_id: &str,
    reference: &EventRef,
    event_type: &str,
    ctx: EventContext,
) -> Result<()> {
    let occurred_at = Utc::now().to_rfc3339();
    let payload = ctx
        .payload
        .map(|p| p.to_string())
        .unwrap_or_else(|| "{}".to_string());
    let actor_type = ctx.actor_type.unwrap_or(ActorType::System);

    let row = NewTransportEvent {
        tenant_id,
        reference_type: reference.type_str(),
        reference_id: reference.id(),
        event_type,
        occurred_at: &occurred_at,
        stop_id: ctx.stop_id,
        latitude: ctx.latitude,
        longitude: ctx.longitude,
        location_text: ctx.location_text.as_deref(),
        actor_type: actor_type.as_str(),
        actor_id: ctx.actor_id.as_deref(),
        description: ctx.description.as_deref(),
        payload: &payload,
        source: EVENT_SOURCE,
    };

    diesel::insert_into(transport_events::table)
        .values(&row)
        .execute(conn)
        .await?;

    Ok(())
}
