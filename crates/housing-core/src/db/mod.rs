pub mod queries;
pub mod types;

pub use queries::{ListingFilter, ListingQueryBuilder};

use crate::{HousingError, Listing, Result, StoredListing};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use tracing::{debug, info, warn};
use types::DbTimestamp;

pub(crate) const LISTING_COLUMNS: &str = "id, address, source, price, bedrooms, bathrooms, category, \
     square_feet, move_in_date, listing_link AS url, scraped_at, first_seen_at, updated_at";

/// Row count and freshness of the listings table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScrapeMetadata {
    pub total_listings: i64,
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        info!(path = %db_path.display(), "Listing store ready");

        Ok(db)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<()> {
        debug!("Running database migrations");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS listings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                address TEXT NOT NULL,
                source TEXT NOT NULL,
                price INTEGER,
                bedrooms INTEGER,
                bathrooms REAL,
                category TEXT NOT NULL DEFAULT 'Residential',
                square_feet INTEGER,
                move_in_date TEXT,
                listing_link TEXT,
                scraped_at TEXT NOT NULL,
                first_seen_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE(address, source)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Databases written before first-seen tracking lack the column.
        let has_first_seen: i32 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM pragma_table_info('listings')
            WHERE name='first_seen_at'
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        if has_first_seen == 0 {
            debug!("Adding first_seen_at column to listings table");
            sqlx::query(
                r#"
                ALTER TABLE listings
                ADD COLUMN first_seen_at TEXT NOT NULL DEFAULT ''
                "#,
            )
            .execute(&self.pool)
            .await?;

            sqlx::query(
                r#"
                UPDATE listings
                SET first_seen_at = scraped_at
                WHERE first_seen_at = ''
                "#,
            )
            .execute(&self.pool)
            .await?;
        }

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_listings_updated_at ON listings(updated_at)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Insert or overwrite every listing under `source`, stamped with the current time.
    pub async fn upsert_listings(&self, listings: &[Listing], source: &str) -> Result<usize> {
        self.upsert_listings_at(listings, source, Utc::now()).await
    }

    pub async fn upsert_listings_at(
        &self,
        listings: &[Listing],
        source: &str,
        now: DateTime<Utc>,
    ) -> Result<usize> {
        let now = DbTimestamp::from(now).to_sql();
        let (storable, blank): (Vec<&Listing>, Vec<&Listing>) = listings
            .iter()
            .partition(|listing| !listing.address.trim().is_empty());
        if !blank.is_empty() {
            warn!(source, skipped = blank.len(), "Skipping listings without an address");
        }

        let mut tx = self.pool.begin().await?;

        for listing in &storable {

            sqlx::query(
                r#"
                INSERT INTO listings (
                    address, source, price, bedrooms, bathrooms,
                    category, square_feet, move_in_date, listing_link,
                    scraped_at, first_seen_at, updated_at
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(address, source) DO UPDATE SET
                    price = excluded.price,
                    bedrooms = excluded.bedrooms,
                    bathrooms = excluded.bathrooms,
                    category = excluded.category,
                    square_feet = excluded.square_feet,
                    move_in_date = excluded.move_in_date,
                    listing_link = excluded.listing_link,
                    scraped_at = excluded.scraped_at,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(&listing.address)
            .bind(source)
            .bind(listing.price)
            .bind(listing.bedrooms)
            .bind(listing.bathrooms)
            .bind(listing.category)
            .bind(listing.square_feet)
            .bind(&listing.move_in_date)
            .bind(&listing.listing_link)
            .bind(DbTimestamp::from(listing.scraped_at).to_sql())
            .bind(&now)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!(source, count = storable.len(), "Upserted listings");

        Ok(storable.len())
    }

    /// Every stored listing, most recently updated first.
    pub async fn get_all_listings(&self) -> Result<Vec<StoredListing>> {
        let listings = sqlx::query_as::<_, StoredListing>(&format!(
            "SELECT {} FROM listings ORDER BY updated_at DESC, id DESC",
            LISTING_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(listings)
    }

    pub async fn list_listings(&self, filter: &ListingFilter) -> Result<Vec<StoredListing>> {
        ListingQueryBuilder::new()
            .with_source(filter.source.as_deref())
            .with_price_range(filter.min_price, filter.max_price)
            .with_min_bedrooms(filter.min_bedrooms)
            .with_category(filter.category)
            .order_by_recent()
            .with_limit(filter.limit)
            .execute(&self.pool)
            .await
    }

    pub async fn get_metadata(&self) -> Result<ScrapeMetadata> {
        let (total_listings, last_updated): (i64, Option<String>) =
            sqlx::query_as("SELECT COUNT(*), MAX(updated_at) FROM listings")
                .fetch_one(&self.pool)
                .await?;

        let last_updated = last_updated
            .map(|text| {
                DbTimestamp::from_rfc3339(&text)
                    .map(|ts| *ts.datetime())
                    .map_err(|e| HousingError::Database(sqlx::Error::Decode(Box::new(e))))
            })
            .transpose()?;

        Ok(ScrapeMetadata {
            total_listings,
            last_updated,
        })
    }

    /// Check database integrity
    pub async fn check_integrity(&self) -> Result<Vec<String>> {
        let mut issues = Vec::new();

        let integrity_check: Vec<String> = sqlx::query_scalar("PRAGMA integrity_check")
            .fetch_all(&self.pool)
            .await?;

        if integrity_check.len() != 1 || integrity_check[0] != "ok" {
            issues.extend(integrity_check);
        }

        let duplicates: Vec<(String, String, i64)> = sqlx::query_as(
            "SELECT address, source, COUNT(*) as count
             FROM listings
             GROUP BY address, source
             HAVING count > 1",
        )
        .fetch_all(&self.pool)
        .await?;

        for (address, source, count) in duplicates {
            issues.push(format!(
                "Found {} duplicate entries for {} from {}",
                count, address, source
            ));
        }

        Ok(issues)
    }
}
