//! Services that compose repository operations into larger workflows.

pub mod aggregates;
pub mod import;
pub mod outcome;

pub use aggregates::ManifestTotals;
pub use import::{ImportReport, ManifestImportRow, ManifestImporter};
pub use outcome::{DeliveryOutcome, OutcomeRecorder};
