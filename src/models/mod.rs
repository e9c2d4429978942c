//! Domain models for manifests, stops, delivery history, and audit events.

mod delivery;
mod event;
mod manifest;
mod shipment;
mod stop;

pub use delivery::{AttemptStatus, DeliveryAttempt, FailureInput, PodInput, ProofOfDelivery};
pub use event::{ActorType, EventContext, EventRef, TransportEvent};
pub use manifest::{
    Manifest, ManifestDetail, ManifestFilter, ManifestPatch, ManifestStatus, ManifestType,
    NewManifestInput,
};
pub use shipment::{ShipmentStatus, ShipmentSummary};
pub use stop::{ManifestShipment, StopDetail, StopStatus};
