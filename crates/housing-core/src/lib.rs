use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Row};
use std::str::FromStr;

pub mod db;
mod display;
mod error;

pub use db::{Database, ListingFilter, ScrapeMetadata};
pub use display::{create_listing_table, format_metadata, ListingTableRow};
pub use error::{FailureKind, HousingError, Result};

use db::types::DbTimestamp;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Category {
    #[default]
    Residential,
    Commercial,
    Storage,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Residential => "Residential",
            Category::Commercial => "Commercial",
            Category::Storage => "Storage",
        }
    }
}

impl sqlx::Type<sqlx::Sqlite> for Category {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <String as sqlx::Type<sqlx::Sqlite>>::type_info()
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for Category {
    fn decode(value: sqlx::sqlite::SqliteValueRef<'r>) -> std::result::Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let text = <&str as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
        Ok(text.parse::<Category>()?)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for Category {
    fn encode_by_ref(&self, args: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>) -> sqlx::encode::IsNull {
        args.push(sqlx::sqlite::SqliteArgumentValue::Text(self.as_str().into()));
        sqlx::encode::IsNull::No
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = HousingError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "residential" => Ok(Category::Residential),
            "commercial" | "office" => Ok(Category::Commercial),
            "storage" => Ok(Category::Storage),
            _ => Err(HousingError::InvalidCategory(s.to_string())),
        }
    }
}

/// A listing candidate as produced by one extractor run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Listing {
    pub address: String,
    pub source: String,
    pub price: Option<i64>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<f64>,
    #[serde(default)]
    pub category: Category,
    pub square_feet: Option<i64>,
    pub move_in_date: Option<String>,
    pub listing_link: Option<String>,
    pub scraped_at: DateTime<Utc>,
}

impl Listing {
    pub fn new(address: impl Into<String>, source: impl Into<String>, scraped_at: DateTime<Utc>) -> Self {
        Self {
            address: address.into(),
            source: source.into(),
            price: None,
            bedrooms: None,
            bathrooms: None,
            category: Category::Residential,
            square_feet: None,
            move_in_date: None,
            listing_link: None,
            scraped_at,
        }
    }
}

/// A persisted listing row. `listing_link` is published as `url`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredListing {
    #[serde(skip_serializing, default)]
    pub id: i64,
    pub address: String,
    pub source: String,
    pub price: Option<i64>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<f64>,
    pub category: Category,
    pub square_feet: Option<i64>,
    pub move_in_date: Option<String>,
    #[serde(rename = "url")]
    pub listing_link: Option<String>,
    pub scraped_at: DateTime<Utc>,
    pub first_seen_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn timestamp_column(row: &sqlx::sqlite::SqliteRow, column: &str) -> std::result::Result<DateTime<Utc>, sqlx::Error> {
    let text: String = row.try_get(column)?;
    DbTimestamp::from_rfc3339(&text)
        .map(|ts| *ts.datetime())
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

impl<'r> FromRow<'r, sqlx::sqlite::SqliteRow> for StoredListing {
    fn from_row(row: &'r sqlx::sqlite::SqliteRow) -> std::result::Result<Self, sqlx::Error> {
        Ok(StoredListing {
            id: row.try_get("id")?,
            address: row.try_get("address")?,
            source: row.try_get("source")?,
            price: row.try_get("price")?,
            bedrooms: row.try_get("bedrooms")?,
            bathrooms: row.try_get("bathrooms")?,
            category: row.try_get("category")?,
            square_feet: row.try_get("square_feet")?,
            move_in_date: row.try_get("move_in_date")?,
            listing_link: row.try_get("url")?,
            scraped_at: timestamp_column(row, "scraped_at")?,
            first_seen_at: timestamp_column(row, "first_seen_at")?,
            updated_at: timestamp_column(row, "updated_at")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_listing_serialization() {
        let mut listing = Listing::new(
            "6500 Del Playa Dr",
            "wolfe",
            Utc.with_ymd_and_hms(2024, 3, 21, 0, 0, 0).unwrap(),
        );
        listing.price = Some(4200);
        listing.bedrooms = Some(0);
        listing.bathrooms = Some(1.5);

        let json = serde_json::to_string(&listing).unwrap();
        let deserialized: Listing = serde_json::from_str(&json).unwrap();
        assert_eq!(listing, deserialized);
        assert!(json.contains("\"category\":\"Residential\""));
    }

    #[test]
    fn test_missing_category_defaults_to_residential() {
        let json = r#"{"address":"1 A St","source":"koto","price":null,"bedrooms":null,
            "bathrooms":null,"square_feet":null,"move_in_date":null,"listing_link":null,
            "scraped_at":"2024-03-21T00:00:00Z"}"#;
        let listing: Listing = serde_json::from_str(json).unwrap();
        assert_eq!(listing.category, Category::Residential);
    }

    #[test]
    fn test_category_parsing() {
        assert_eq!("commercial".parse::<Category>().unwrap(), Category::Commercial);
        assert_eq!(" Storage ".parse::<Category>().unwrap(), Category::Storage);
        assert_eq!("RESIDENTIAL".parse::<Category>().unwrap(), Category::Residential);
        assert!("parking".parse::<Category>().is_err());
        assert_eq!(Category::Storage.to_string(), "Storage");
    }

    #[test]
    fn test_stored_listing_exposes_link_as_url() {
        let now = Utc.with_ymd_and_hms(2024, 3, 21, 0, 0, 0).unwrap();
        let stored = StoredListing {
            id: 7,
            address: "412 State Street".to_string(),
            source: "koto".to_string(),
            price: Some(2200),
            bedrooms: Some(2),
            bathrooms: Some(1.0),
            category: Category::Residential,
            square_feet: None,
            move_in_date: None,
            listing_link: Some("https://www.kotogroup.com/listings/412-state".to_string()),
            scraped_at: now,
            first_seen_at: now,
            updated_at: now,
        };

        let value = serde_json::to_value(&stored).unwrap();
        assert_eq!(value["url"], "https://www.kotogroup.com/listings/412-state");
        assert!(value.get("listing_link").is_none());
        assert!(value.get("id").is_none());
    }
}
