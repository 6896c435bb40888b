use crate::{all_pages, temp_database, KOTO_URL, WOLFE_URL};
use housing_core::{Category, ListingFilter};
use housing_scrapers::{FixtureRenderer, Orchestrator, ScrapeSettings};
use std::sync::Arc;

fn orchestrator(renderer: FixtureRenderer) -> Orchestrator {
    Orchestrator::new(Arc::new(renderer), ScrapeSettings::immediate())
}

#[tokio::test]
async fn test_refresh_stores_every_source() {
    let (_dir, db) = temp_database().await;
    let orchestrator = orchestrator(all_pages());

    let summary = orchestrator.run_all_to_db(&db).await.unwrap();
    assert_eq!(summary.failures().count(), 0);

    let stored: Vec<(String, usize)> = summary
        .outcomes
        .iter()
        .map(|o| (o.source.clone(), o.stored))
        .collect();
    assert_eq!(
        stored,
        vec![
            ("meridian".to_string(), 2),
            ("playalife".to_string(), 1),
            ("koto".to_string(), 1),
            ("solis".to_string(), 1),
            ("wolfe".to_string(), 1),
        ]
    );

    let meta = db.get_metadata().await.unwrap();
    assert_eq!(meta.total_listings, 6);
    assert!(meta.last_updated.is_some());

    let wolfe = db
        .list_listings(&ListingFilter {
            source: Some("wolfe".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(wolfe.len(), 1);
    assert_eq!(wolfe[0].address, "6565 Del Playa Dr Unit B, Isla Vista, CA 93117");
    assert_eq!(wolfe[0].bedrooms, Some(4));

    let studios = db
        .list_listings(&ListingFilter {
            source: Some("solis".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(studios[0].bedrooms, Some(0));
    assert_eq!(studios[0].square_feet, Some(480));

    let commercial = db
        .list_listings(&ListingFilter {
            category: Some(Category::Commercial),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(commercial.len(), 1);
    assert_eq!(commercial[0].address, "5 W Anapamu St, Santa Barbara, CA");
}

#[tokio::test]
async fn test_repeated_refresh_is_idempotent() {
    let (_dir, db) = temp_database().await;
    let orchestrator = orchestrator(all_pages());

    orchestrator.run_all_to_db(&db).await.unwrap();
    let first = db.get_all_listings().await.unwrap();

    orchestrator.run_all_to_db(&db).await.unwrap();
    let second = db.get_all_listings().await.unwrap();

    assert_eq!(first.len(), second.len());
    for row in &second {
        let before = first
            .iter()
            .find(|r| r.address == row.address && r.source == row.source)
            .unwrap();
        assert_eq!(row.first_seen_at, before.first_seen_at);
        assert!(row.updated_at >= before.updated_at);
    }
    assert!(db.check_integrity().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_refresh_continues_past_failing_source() {
    let (_dir, db) = temp_database().await;
    let renderer = all_pages().with_failure(KOTO_URL, "net::ERR_CONNECTION_RESET");
    let orchestrator = orchestrator(renderer);

    let summary = orchestrator.run_all_to_db(&db).await.unwrap();
    let failed: Vec<_> = summary.failures().map(|o| o.source.as_str()).collect();
    assert_eq!(failed, vec!["koto"]);
    assert_eq!(db.get_metadata().await.unwrap().total_listings, 5);
}

#[tokio::test]
async fn test_scrape_all_merges_sources() {
    let renderer = all_pages().with_failure(WOLFE_URL, "Load failed");
    let merged = orchestrator(renderer).scrape_all().await;

    assert_eq!(
        merged.sources,
        vec!["meridian", "playalife", "koto", "solis", "wolfe"]
    );
    assert_eq!(merged.listings.len(), 5);
    assert!(merged.listings.iter().all(|l| !l.source.is_empty()));
    assert!(merged.listings.iter().all(|l| l.source != "wolfe"));

    let json = serde_json::to_value(&merged).unwrap();
    assert_eq!(json["listings"].as_array().unwrap().len(), 5);
    assert!(json["scraped_at"].is_string());
    assert!(json.get("results").is_none());
}

#[tokio::test]
async fn test_on_demand_scrape_reports_load_failure() {
    let renderer = all_pages().with_failure(WOLFE_URL, "Load failed");
    let err = orchestrator(renderer).scrape_source("wolfe").await.unwrap_err();
    assert!(err.user_message().contains("failed to load"));
}
