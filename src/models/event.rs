//! Transport event models: the append-only audit trail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What an event refers to.
///
/// A typed reference per variant instead of a loose (type, id) pair,
/// so an event can never point at the wrong kind of entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reference_type", content = "reference_id", rename_all = "snake_case")]
pub enum EventRef {
    Manifest(String),
    Shipment(String),
    Trip(String),
}

impl EventRef {
    pub fn type_str(&self) -> &'static str {
        match self {
            Self::Manifest(_) => "manifest",
            Self::Shipment(_) => "shipment",
            Self::Trip(_) => "trip",
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Manifest(id) | Self::Shipment(id) | Self::Trip(id) => id,
        }
    }

    pub fn from_parts(reference_type: &str, reference_id: String) -> Option<Self> {
        match reference_type {
            "manifest" => Some(Self::Manifest(reference_id)),
            "shipment" => Some(Self::Shipment(reference_id)),
            "trip" => Some(Self::Trip(reference_id)),
            _ => None,
        }
    }
}

/// Who caused an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorType {
    Driver,
    System,
    User,
}

impl ActorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Driver => "driver",
            Self::System => "system",
            Self::User => "user",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "driver" => Some(Self::Driver),
            "system" => Some(Self::System),
            "user" => Some(Self::User),
            _ => None,
        }
    }
}

/// One immutable audit entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportEvent {
    pub id: i32,
    pub tenant_id: String,
    pub reference: EventRef,
    /// Free-form event kind, e.g. `delivered`, `delivery_failed`.
    pub event_type: String,
    pub occurred_at: DateTime<Utc>,
    pub stop_id: Option<i32>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_text: Option<String>,
    pub actor_type: ActorType,
    pub actor_id: Option<String>,
    pub description: Option<String>,
    pub payload: serde_json::Value,
    pub source: String,
}

/// Optional context attached when appending an event.
#[derive(Debug, Clone, Default)]
pub struct EventContext {
    pub stop_id: Option<i32>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_text: Option<String>,
    pub actor_type: Option<ActorType>,
    pub actor_id: Option<String>,
    pub description: Option<String>,
    pub payload: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_ref_parts() {
        let r = EventRef::Shipment("shp-1".to_string());
        assert_eq!(r.type_str(), "shipment");
        assert_eq!(r.id(), "shp-1");

        let back = EventRef::from_parts("shipment", "shp-1".to_string());
        assert_eq!(back, Some(r));
        assert_eq!(EventRef::from_parts("warehouse", "x".to_string()), None);
    }
}
