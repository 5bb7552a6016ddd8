//! SQLite queries for verdant-api
//!
//! Ids are stored as hyphenated UUID text and timestamps as RFC 3339 text.

pub mod garden_entries;
pub mod gardens;
pub mod master_plants;

use chrono::{DateTime, Utc};
use uuid::Uuid;
use verdant_common::{Error, Result};

fn parse_uuid(value: &str) -> Result<Uuid> {
    Uuid::parse_str(value).map_err(|e| Error::Internal(format!("Corrupt id '{}': {}", value, e)))
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Corrupt timestamp '{}': {}", value, e)))
}
