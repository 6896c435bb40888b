use crate::temp_database;
use chrono::{Duration, TimeZone, Utc};
use housing_core::{Category, Database, Listing};

fn candidate(address: &str, price: i64) -> Listing {
    let mut listing = Listing::new(address, "koto", Utc.with_ymd_and_hms(2024, 3, 1, 6, 0, 0).unwrap());
    listing.price = Some(price);
    listing.bedrooms = Some(2);
    listing.bathrooms = Some(1.0);
    listing.listing_link = Some("https://www.kotogroup.com/listings/412-state".to_string());
    listing
}

#[tokio::test]
async fn test_upsert_keeps_first_seen_and_tracks_last_seen() {
    let (_dir, db) = temp_database().await;
    let first = Utc.with_ymd_and_hms(2024, 3, 1, 6, 0, 0).unwrap();
    let second = first + Duration::hours(12);

    db.upsert_listings_at(&[candidate("412 State Street", 2200)], "koto", first)
        .await
        .unwrap();

    let mut relisted = candidate("412 State Street", 2350);
    relisted.scraped_at = second;
    relisted.category = Category::Commercial;
    db.upsert_listings_at(&[relisted], "koto", second)
        .await
        .unwrap();

    let rows = db.get_all_listings().await.unwrap();
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.price, Some(2350));
    assert_eq!(row.category, Category::Commercial);
    assert_eq!(row.first_seen_at, first);
    assert_eq!(row.scraped_at, second);
    assert_eq!(row.updated_at, second);

    let meta = db.get_metadata().await.unwrap();
    assert_eq!(meta.total_listings, 1);
    assert_eq!(meta.last_updated, Some(second));
}

#[tokio::test]
async fn test_row_source_comes_from_argument() {
    let (_dir, db) = temp_database().await;
    let mut listing = candidate("6512 Segovia Rd", 4800);
    listing.source = String::new();

    db.upsert_listings(&[listing], "playalife").await.unwrap();
    let rows = db.get_all_listings().await.unwrap();
    assert_eq!(rows[0].source, "playalife");
}

#[tokio::test]
async fn test_stored_listing_json_shape() {
    let (_dir, db) = temp_database().await;
    db.upsert_listings(&[candidate("412 State Street", 2200)], "koto")
        .await
        .unwrap();

    let rows = db.get_all_listings().await.unwrap();
    let json = serde_json::to_value(&rows[0]).unwrap();
    assert_eq!(json["url"], "https://www.kotogroup.com/listings/412-state");
    assert_eq!(json["category"], "Residential");
    assert!(json.get("listing_link").is_none());
    assert!(json.get("id").is_none());
}

#[tokio::test]
async fn test_reopen_after_crash_sees_committed_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("listings.db");

    let db = Database::new(&path).await.unwrap();
    db.upsert_listings(&[candidate("412 State Street", 2200)], "koto")
        .await
        .unwrap();
    // Second handle while the first is still open, as a restarted process would.
    let other = Database::new(&path).await.unwrap();
    assert_eq!(other.get_metadata().await.unwrap().total_listings, 1);
    assert!(other.check_integrity().await.unwrap().is_empty());
}
