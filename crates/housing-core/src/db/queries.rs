use super::LISTING_COLUMNS;
use crate::{Category, Result, StoredListing};
use sqlx::{sqlite::Sqlite, sqlite::SqlitePool, QueryBuilder};

/// Optional constraints for [`crate::Database::list_listings`].
#[derive(Debug, Clone, Default)]
pub struct ListingFilter {
    pub source: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub min_bedrooms: Option<i32>,
    pub category: Option<Category>,
    pub limit: Option<i64>,
}

pub struct ListingQueryBuilder<'a> {
    builder: QueryBuilder<'a, Sqlite>,
}

impl<'a> ListingQueryBuilder<'a> {
    pub fn new() -> Self {
        let mut builder = QueryBuilder::new("SELECT ");
        builder.push(LISTING_COLUMNS);
        builder.push(" FROM listings WHERE 1=1");
        Self { builder }
    }

    pub fn with_source(mut self, source: Option<&'a str>) -> Self {
        if let Some(source) = source {
            self.builder.push(" AND source = ");
            self.builder.push_bind(source);
        }
        self
    }

    pub fn with_price_range(mut self, min: Option<i64>, max: Option<i64>) -> Self {
        if let Some(min_price) = min {
            self.builder.push(" AND price >= ");
            self.builder.push_bind(min_price);
        }
        if let Some(max_price) = max {
            self.builder.push(" AND price <= ");
            self.builder.push_bind(max_price);
        }
        self
    }

    pub fn with_min_bedrooms(mut self, min_bedrooms: Option<i32>) -> Self {
        if let Some(min) = min_bedrooms {
            self.builder.push(" AND bedrooms >= ");
            self.builder.push_bind(min);
        }
        self
    }

    pub fn with_category(mut self, category: Option<Category>) -> Self {
        if let Some(category) = category {
            self.builder.push(" AND category = ");
            self.builder.push_bind(category);
        }
        self
    }

    pub fn order_by_recent(mut self) -> Self {
        self.builder.push(" ORDER BY updated_at DESC, id DESC");
        self
    }

    pub fn with_limit(mut self, limit: Option<i64>) -> Self {
        if let Some(limit) = limit {
            self.builder.push(" LIMIT ");
            self.builder.push_bind(limit);
        }
        self
    }

    pub async fn execute(mut self, pool: &SqlitePool) -> Result<Vec<StoredListing>> {
        let query = self.builder.build_query_as::<StoredListing>();
        let rows = query.fetch_all(pool).await?;
        Ok(rows)
    }
}

impl Default for ListingQueryBuilder<'_> {
    fn default() -> Self {
        Self::new()
    }
}
