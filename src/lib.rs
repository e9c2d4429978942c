//! Manifesto - dispatch manifest and delivery execution service.
//!
//! Groups shipments into dated manifests for a vehicle and driver,
//! tracks each stop through delivery or failure, and keeps manifest
//! aggregates and the shipment event log consistent.

pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod schema;
pub mod services;

pub use error::{Error, Result};
