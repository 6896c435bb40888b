use colored::Colorize;
use tabled::settings::{object::Columns, Modify, Style, Width};
use tabled::{Table, Tabled};

use crate::{ScrapeMetadata, StoredListing};

#[derive(Tabled)]
pub struct ListingTableRow {
    #[tabled(rename = "Address")]
    pub address: String,
    #[tabled(rename = "Source")]
    pub source: String,
    #[tabled(rename = "Rent", display_with = "display_right_8")]
    pub price: String,
    #[tabled(rename = "Bd/Ba", display_with = "display_right_7")]
    pub rooms: String,
    #[tabled(rename = "Sq ft", display_with = "display_right_6")]
    pub square_feet: String,
    #[tabled(rename = "Available")]
    pub move_in_date: String,
    #[tabled(rename = "Updated")]
    pub updated_at: String,
}

fn display_right_8(s: &str) -> String {
    format!("{:>8}", s)
}

fn display_right_7(s: &str) -> String {
    format!("{:>7}", s)
}

fn display_right_6(s: &str) -> String {
    format!("{:>6}", s)
}

impl ListingTableRow {
    pub fn from_listing(listing: &StoredListing) -> Self {
        let price = listing
            .price
            .map(|p| format!("${}", p))
            .unwrap_or_else(|| "N/A".to_string());

        let beds = match listing.bedrooms {
            Some(0) => "S".to_string(),
            Some(b) => b.to_string(),
            None => "?".to_string(),
        };
        let baths = listing
            .bathrooms
            .map(|b| b.to_string())
            .unwrap_or_else(|| "?".to_string());

        let square_feet = listing
            .square_feet
            .map(|s| s.to_string())
            .unwrap_or_else(|| "N/A".to_string());

        Self {
            address: listing.address.clone(),
            source: listing.source.clone(),
            price,
            rooms: format!("{}/{}", beds, baths),
            square_feet,
            move_in_date: listing.move_in_date.clone().unwrap_or_default(),
            updated_at: listing.updated_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

pub fn create_listing_table(listings: &[StoredListing]) -> String {
    let table_rows: Vec<ListingTableRow> = listings.iter().map(ListingTableRow::from_listing).collect();

    let mut table = Table::new(&table_rows);

    table
        .with(Style::modern())
        .with(Modify::new(Columns::single(0)).with(Width::wrap(40)))     // Address column
        .with(Modify::new(Columns::single(5)).with(Width::truncate(16))); // Available column

    table.to_string()
}

/// One-line footer for listing output.
pub fn format_metadata(meta: &ScrapeMetadata) -> String {
    let updated = meta
        .last_updated
        .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| "never".to_string());

    format!(
        "{} listings, last updated {}",
        meta.total_listings.to_string().bold(),
        updated.bold()
    )
}
