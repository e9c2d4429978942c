//! Diesel ORM models for database tables.
//!
//! Record structs mirror the table layouts; domain models are built
//! from them via the `From` impls below. Datetimes are stored as
//! RFC 3339 text, dates as `YYYY-MM-DD`.

use diesel::prelude::*;

use super::{parse_date, parse_date_opt, parse_datetime, parse_datetime_opt};
use crate::models::{
    ActorType, AttemptStatus, DeliveryAttempt, EventRef, Manifest, ManifestShipment,
    ManifestStatus, ManifestType, ProofOfDelivery, ShipmentStatus, ShipmentSummary, StopStatus,
    TransportEvent,
};
use crate::schema;

/// Manifest record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::manifests)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ManifestRecord {
    pub id: String,
    pub tenant_id: String,
    pub branch_id: Option<String>,
    pub manifest_number: String,
    pub manifest_date: String,
    pub manifest_type: String,
    pub carrier_id: Option<String>,
    pub vehicle_id: Option<String>,
    pub driver_id: Option<String>,
    pub route_id: Option<String>,
    pub planned_start_at: Option<String>,
    pub planned_end_at: Option<String>,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub status: String,
    pub notes: Option<String>,
    pub driver_notes: Option<String>,
    pub total_shipments: i32,
    pub total_weight_kg: f64,
    pub total_packages: i32,
    pub total_cod_amount: f64,
    pub delivered_count: i32,
    pub failed_count: i32,
    pub pending_count: i32,
    pub version: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ManifestRecord> for Manifest {
    fn from(record: ManifestRecord) -> Self {
        Manifest {
            id: record.id,
            tenant_id: record.tenant_id,
            branch_id: record.branch_id,
            manifest_number: record.manifest_number,
            manifest_date: parse_date(&record.manifest_date),
            manifest_type: ManifestType::from_str(&record.manifest_type)
                .unwrap_or(ManifestType::Delivery),
            carrier_id: record.carrier_id,
            vehicle_id: record.vehicle_id,
            driver_id: record.driver_id,
            route_id: record.route_id,
            planned_start_at: parse_datetime_opt(record.planned_start_at),
            planned_end_at: parse_datetime_opt(record.planned_end_at),
            started_at: parse_datetime_opt(record.started_at),
            completed_at: parse_datetime_opt(record.completed_at),
            status: ManifestStatus::from_str(&record.status).unwrap_or(ManifestStatus::Draft),
            notes: record.notes,
            driver_notes: record.driver_notes,
            total_shipments: record.total_shipments,
            total_weight_kg: record.total_weight_kg,
            total_packages: record.total_packages,
            total_cod_amount: record.total_cod_amount,
            delivered_count: record.delivered_count,
            failed_count: record.failed_count,
            pending_count: record.pending_count,
            version: record.version,
            created_at: parse_datetime(&record.created_at),
            updated_at: parse_datetime(&record.updated_at),
        }
    }
}

/// New manifest for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::manifests)]
pub struct NewManifest<'a> {
    pub id: &'a str,
    pub tenant_id: &'a str,
    pub branch_id: Option<&'a str>,
    pub manifest_number: &'a str,
    pub manifest_date: &'a str,
    pub manifest_type: &'a str,
    pub carrier_id: Option<&'a str>,
    pub vehicle_id: Option<&'a str>,
    pub driver_id: Option<&'a str>,
    pub route_id: Option<&'a str>,
    pub planned_start_at: Option<&'a str>,
    pub planned_end_at: Option<&'a str>,
    pub status: &'a str,
    pub notes: Option<&'a str>,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

/// Stop record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::manifest_shipments)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ManifestShipmentRecord {
    pub id: i32,
    pub manifest_id: String,
    pub shipment_id: String,
    pub stop_sequence: i32,
    pub estimated_arrival_at: Option<String>,
    pub status: String,
    pub arrived_at: Option<String>,
    pub completed_at: Option<String>,
    pub failure_reason: Option<String>,
    pub driver_notes: Option<String>,
    pub distance_km: Option<f64>,
    pub duration_min: Option<i32>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ManifestShipmentRecord> for ManifestShipment {
    fn from(record: ManifestShipmentRecord) -> Self {
        ManifestShipment {
            id: record.id,
            manifest_id: record.manifest_id,
            shipment_id: record.shipment_id,
            stop_sequence: record.stop_sequence,
            estimated_arrival_at: parse_datetime_opt(record.estimated_arrival_at),
            status: StopStatus::from_str(&record.status).unwrap_or(StopStatus::Pending),
            arrived_at: parse_datetime_opt(record.arrived_at),
            completed_at: parse_datetime_opt(record.completed_at),
            failure_reason: record.failure_reason,
            driver_notes: record.driver_notes,
            distance_km: record.distance_km,
            duration_min: record.duration_min,
            created_at: parse_datetime(&record.created_at),
            updated_at: parse_datetime(&record.updated_at),
        }
    }
}

/// New stop link for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::manifest_shipments)]
pub struct NewManifestShipment<'a> {
    pub manifest_id: &'a str,
    pub shipment_id: &'a str,
    pub stop_sequence: i32,
    pub status: &'a str,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

/// Delivery attempt record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::delivery_attempts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DeliveryAttemptRecord {
    pub id: i32,
    pub shipment_id: String,
    pub attempt_number: i32,
    pub status: String,
    pub failure_code: Option<String>,
    pub failure_reason: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub driver_id: Option<String>,
    pub notes: Option<String>,
    pub reschedule_date: Option<String>,
    pub photo_refs: String,
    pub attempted_at: String,
}

impl From<DeliveryAttemptRecord> for DeliveryAttempt {
    fn from(record: DeliveryAttemptRecord) -> Self {
        DeliveryAttempt {
            id: record.id,
            shipment_id: record.shipment_id,
            attempt_number: record.attempt_number,
            status: AttemptStatus::from_str(&record.status).unwrap_or(AttemptStatus::Failed),
            failure_code: record.failure_code,
            failure_reason: record.failure_reason,
            latitude: record.latitude,
            longitude: record.longitude,
            driver_id: record.driver_id,
            notes: record.notes,
            reschedule_date: parse_date_opt(record.reschedule_date),
            photo_refs: serde_json::from_str(&record.photo_refs).unwrap_or_default(),
            attempted_at: parse_datetime(&record.attempted_at),
        }
    }
}

/// New delivery attempt for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::delivery_attempts)]
pub struct NewDeliveryAttempt<'a> {
    pub shipment_id: &'a str,
    pub attempt_number: i32,
    pub status: &'a str,
    pub failure_code: Option<&'a str>,
    pub failure_reason: Option<&'a str>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub driver_id: Option<&'a str>,
    pub notes: Option<&'a str>,
    pub reschedule_date: Option<&'a str>,
    pub photo_refs: &'a str,
    pub attempted_at: &'a str,
}

/// Proof-of-delivery record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::proof_of_delivery)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ProofOfDeliveryRecord {
    pub id: i32,
    pub shipment_id: String,
    pub delivered_at: String,
    pub recipient_name: String,
    pub recipient_document: Option<String>,
    pub recipient_relation: Option<String>,
    pub signature_ref: Option<String>,
    pub photo_refs: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_type: Option<String>,
    pub driver_id: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
}

impl From<ProofOfDeliveryRecord> for ProofOfDelivery {
    fn from(record: ProofOfDeliveryRecord) -> Self {
        ProofOfDelivery {
            id: record.id,
            shipment_id: record.shipment_id,
            delivered_at: parse_datetime(&record.delivered_at),
            recipient_name: record.recipient_name,
            recipient_document: record.recipient_document,
            recipient_relation: record.recipient_relation,
            signature_ref: record.signature_ref,
            photo_refs: serde_json::from_str(&record.photo_refs).unwrap_or_default(),
            latitude: record.latitude,
            longitude: record.longitude,
            location_type: record.location_type,
            driver_id: record.driver_id,
            notes: record.notes,
            created_at: parse_datetime(&record.created_at),
        }
    }
}

/// Transport event record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::transport_events)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TransportEventRecord {
    pub id: i32,
    pub tenant_id: String,
    pub reference_type: String,
    pub reference_id: String,
    pub event_type: String,
    pub occurred_at: String,
    pub stop_id: Option<i32>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_text: Option<String>,
    pub actor_type: String,
    pub actor_id: Option<String>,
    pub description: Option<String>,
    pub payload: String,
    pub source: String,
}

impl TransportEventRecord {
    /// Build the domain model; `None` if the stored reference type is
    /// not one we know (rows like that are skipped with a warning).
    pub fn into_model(self) -> Option<TransportEvent> {
        let reference = EventRef::from_parts(&self.reference_type, self.reference_id)?;
        Some(TransportEvent {
            id: self.id,
            tenant_id: self.tenant_id,
            reference,
            event_type: self.event_type,
            occurred_at: parse_datetime(&self.occurred_at),
            stop_id: self.stop_id,
            latitude: self.latitude,
            longitude: self.longitude,
            location_text: self.location_text,
            actor_type: ActorType::from_str(&self.actor_type).unwrap_or(ActorType::System),
            actor_id: self.actor_id,
            description: self.description,
            payload: serde_json::from_str(&self.payload)
                .unwrap_or(serde_json::Value::Object(Default::default())),
            source: self.source,
        })
    }
}

/// New transport event for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::transport_events)]
pub struct NewTransportEvent<'a> {
    pub tenant_id: &'a str,
    pub reference_type: &'a str,
    pub reference_id: &'a str,
    pub event_type: &'a str,
    pub occurred_at: &'a str,
    pub stop_id: Option<i32>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_text: Option<&'a str>,
    pub actor_type: &'a str,
    pub actor_id: Option<&'a str>,
    pub description: Option<&'a str>,
    pub payload: &'a str,
    pub source: &'a str,
}

/// Shipment record from the database (collaborator-owned table).
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::shipments)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ShipmentRecord {
    pub id: String,
    pub tenant_id: String,
    pub tracking_number: String,
    pub status: String,
    pub weight_kg: Option<f64>,
    pub package_count: Option<i32>,
    pub cod_amount: Option<f64>,
    pub delivered_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ShipmentRecord> for ShipmentSummary {
    fn from(record: ShipmentRecord) -> Self {
        ShipmentSummary {
            id: record.id,
            tenant_id: record.tenant_id,
            tracking_number: record.tracking_number,
            status: ShipmentStatus::from_str(&record.status).unwrap_or(ShipmentStatus::Pending),
            weight_kg: record.weight_kg,
            package_count: record.package_count,
            cod_amount: record.cod_amount,
            delivered_at: parse_datetime_opt(record.delivered_at),
        }
    }
}

/// New shipment for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::shipments)]
pub struct NewShipment<'a> {
    pub id: &'a str,
    pub tenant_id: &'a str,
    pub tracking_number: &'a str,
    pub status: &'a str,
    pub weight_kg: Option<f64>,
    pub package_count: Option<i32>,
    pub cod_amount: Option<f64>,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}
