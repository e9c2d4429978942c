//! Repository layer for database persistence.
//!
//! All database access uses Diesel ORM with compile-time query checking
//! over an async SQLite connection. Multi-write operations run inside a
//! single transaction; repositories expose `*_in` variants that borrow a
//! connection so services can compose them transactionally.

pub mod assignment;
pub mod delivery;
pub mod event;
pub mod manifest;
pub mod migrations;
pub mod pool;
pub mod records;
pub mod shipment;
pub mod util;

pub use assignment::AssignmentRepository;
pub use delivery::DeliveryRepository;
pub use event::EventLog;
pub use manifest::ManifestRepository;
pub use pool::{AsyncSqliteConnection, AsyncSqlitePool, DieselError};
pub use shipment::ShipmentStore;

use chrono::{DateTime, NaiveDate, Utc};

/// Parse a datetime string from the database, defaulting to Unix epoch on error.
pub fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::UNIX_EPOCH)
}

/// Parse an optional datetime string from the database.
pub fn parse_datetime_opt(s: Option<String>) -> Option<DateTime<Utc>> {
    s.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    })
}

/// Parse a date column (`YYYY-MM-DD`), defaulting to the epoch date on error.
pub fn parse_date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap_or(NaiveDate::MIN)
}

/// Parse an optional date column.
pub fn parse_date_opt(s: Option<String>) -> Option<NaiveDate> {
    s.and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok())
}
