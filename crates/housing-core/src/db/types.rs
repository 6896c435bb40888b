use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Invalid timestamp format: {0}")]
    InvalidTimestamp(String),
}

/// A UTC timestamp stored as RFC 3339 text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DbTimestamp(DateTime<Utc>);

impl DbTimestamp {
    pub fn now() -> Self {
        Self(Utc::now())
    }

    pub fn from_rfc3339(s: &str) -> Result<Self, DbError> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| Self(dt.with_timezone(&Utc)))
            .map_err(|_| DbError::InvalidTimestamp(s.to_string()))
    }

    pub fn datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Fixed-width microsecond form so that text ordering matches time ordering.
    pub fn to_sql(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Micros, true)
    }
}

impl From<DateTime<Utc>> for DbTimestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}
