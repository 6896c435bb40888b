use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use housing_core::{Database, Listing};
use housing_scrapers::{dedup_listings, Koto, RenderedPage, Source, Wolfe};
use std::time::Duration;
use tokio::runtime::Runtime;
use url::Url;

fn candidates(count: usize) -> Vec<Listing> {
    (0..count)
        .map(|i| {
            // Every third candidate repeats an earlier one.
            let n = if i % 3 == 2 { i - 1 } else { i };
            let mut listing = Listing::new(format!("{} Del Playa Dr", 6500 + n), "koto", Utc::now());
            if n % 2 == 0 {
                listing.listing_link = Some(format!("https://www.kotogroup.com/listings/{}", n));
            }
            listing.price = Some(1500 + n as i64);
            listing
        })
        .collect()
}

fn koto_page(cards: usize) -> RenderedPage {
    let body: String = (0..cards)
        .map(|i| {
            format!(
                r#"<div class="property-card"><a href="/listings/{i}">{n} Sabado Tarde Road, ${p}/mo, 2 bed, 1 bath</a></div>"#,
                n = 6500 + i,
                p = 1800 + i
            )
        })
        .collect();
    RenderedPage::new(
        Url::parse("https://www.kotogroup.com/vacancies").unwrap(),
        format!("<html><body>{}</body></html>", body),
    )
}

fn wolfe_page(cards: usize) -> RenderedPage {
    let body: String = (0..cards)
        .map(|i| {
            let zip = if i % 4 == 0 { "93101" } else { "93117" };
            format!(
                r#"<div class="listing-item">
                    <a href="/listings/detail/{n}-trigo-rd-isla-vista-ca-{zip}">View</a>
                    <h3 class="rent">$3,{i:03}</h3>
                    <div class="amenities">3 beds, 2 baths</div>
                </div>"#,
                n = 6500 + i
            )
        })
        .collect();
    RenderedPage::new(Url::parse("https://www.rlwa.com/isla-vista-listings").unwrap(), body)
}

fn bench_dedup(c: &mut Criterion) {
    let mut group = c.benchmark_group("dedup");
    for size in [100, 1000, 10_000].iter() {
        let input = candidates(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &input, |b, input| {
            b.iter(|| black_box(dedup_listings(input.clone())));
        });
    }
    group.finish();
}

fn bench_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("extraction");
    let scraped_at = Utc::now();

    for size in [10, 100, 500].iter() {
        let koto = koto_page(*size);
        group.bench_with_input(BenchmarkId::new("koto", size), &koto, |b, page| {
            b.iter(|| black_box(Koto.extract(page, scraped_at).unwrap()));
        });

        let wolfe = wolfe_page(*size);
        group.bench_with_input(BenchmarkId::new("wolfe", size), &wolfe, |b, page| {
            b.iter(|| black_box(Wolfe.extract(page, scraped_at).unwrap()));
        });
    }
    group.finish();
}

fn bench_upsert(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let db = rt
        .block_on(Database::new(dir.path().join("bench.db")))
        .unwrap();

    let mut group = c.benchmark_group("database");
    group.sample_size(10);
    group.measurement_time(Duration::from_secs(10));

    for size in [10, 100, 1000].iter() {
        let listings = dedup_listings(candidates(*size));
        group.bench_with_input(BenchmarkId::new("upsert", size), &listings, |b, listings| {
            b.to_async(&rt)
                .iter(|| async { black_box(db.upsert_listings(listings, "koto").await.unwrap()) });
        });
    }

    group.bench_function("get_all_listings", |b| {
        b.to_async(&rt)
            .iter(|| async { black_box(db.get_all_listings().await.unwrap()) });
    });

    group.finish();
}

criterion_group!(benches, bench_dedup, bench_extraction, bench_upsert);
criterion_main!(benches);
