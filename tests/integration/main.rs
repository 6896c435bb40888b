mod pipeline;
mod store;

use housing_core::Database;
use housing_scrapers::{FixtureRenderer, RenderedPage};
use tempfile::{tempdir, TempDir};
use url::Url;

pub const MERIDIAN_URL: &str = "https://meridiangrouprem.com/available-rentals/";
pub const PLAYALIFE_URL: &str = "https://www.playalifeiv.com/vacancies";
pub const KOTO_URL: &str = "https://www.kotogroup.com/vacancies";
pub const SOLIS_URL: &str = "https://solisislavista.com/all-floor-plans";
pub const WOLFE_URL: &str = "https://www.rlwa.com/isla-vista-listings";

pub const MERIDIAN_HTML: &str = r#"
<html><body>
  <div class="prop-list">
    <a href="/listing/6681-abrego"><img src="a.jpg"></a>
    <div class="prop-details">
      <h3>6681 Abrego Rd #4</h3>
      <p>Isla Vista, CA</p>
      <div class="two-item-wrap"><p>$2,150</p><p>1 Bed / 1 Bath</p></div>
    </div>
  </div>
  <div class="prop-list">
    <a href="/listing/5-anapamu"><img src="b.jpg"></a>
    <div class="prop-details">
      <h3>5 W Anapamu St</h3>
      <p>Santa Barbara, CA</p>
      <div class="two-item-wrap"><p>$3,900</p><p>Commercial office, 1 Bath</p></div>
    </div>
  </div>
</body></html>
"#;

pub const PLAYALIFE_HTML: &str = r#"
<div class="listing-item">
  <div class="photo"><a href="/vacancies/6512-segovia" aria-label="6512 Segovia Rd"></a></div>
  <h3 class="rent">$4,800</h3>
  <span class="feature beds">3 Beds</span>
  <span class="feature baths">2 Baths</span>
</div>
"#;

pub const KOTO_HTML: &str = r#"
<div class="property-card"><a href="/listings/412-state">412 State Street, $2200/mo, 2 bed, 1 bath</a></div>
<div class="property-card"><a href="/listings/412-state">412 State Street, $2200/mo, 2 bed, 1 bath</a></div>
"#;

pub const SOLIS_WIDGET: &str = r#"
<div class="ll-floor-plan-card">
  <h2>Solis B1</h2>
  <span class="text-xs">Studio</span>
  <span class="text-xs">1 Bath</span>
  <span class="text-xs">480 sq ft</span>
  <span class="text-xl">$2,350</span>
  <span class="bg-ll-background-light">Now</span>
</div>
"#;

pub const WOLFE_HTML: &str = r#"
<div class="listing-item">
  <a href="/listings/detail/6565-del-playa-dr-unit-b-isla-vista-ca-93117">Details</a>
  <h3 class="rent">$6,200</h3>
  <div class="amenities">4 beds, 2 baths</div>
  <div class="available">Available 9/1/2025</div>
</div>
<div class="listing-item">
  <a href="/listings/detail/1200-state-st-santa-barbara-ca-93101">Details</a>
  <h2 class="address">1200 State St</h2>
  <h3 class="rent">$2,000</h3>
</div>
"#;

/// Canned pages for every source.
pub fn all_pages() -> FixtureRenderer {
    let solis = RenderedPage::new(
        Url::parse(SOLIS_URL).unwrap(),
        r#"<iframe src="https://widgets.example.com/floorplans"></iframe>"#,
    )
    .with_frame(Some(Url::parse("https://widgets.example.com/floorplans").unwrap()), SOLIS_WIDGET);

    FixtureRenderer::new()
        .with_html(MERIDIAN_URL, MERIDIAN_HTML)
        .unwrap()
        .with_html(PLAYALIFE_URL, PLAYALIFE_HTML)
        .unwrap()
        .with_html(KOTO_URL, KOTO_HTML)
        .unwrap()
        .with_page(solis)
        .with_html(WOLFE_URL, WOLFE_HTML)
        .unwrap()
}

pub async fn temp_database() -> (TempDir, Database) {
    let dir = tempdir().unwrap();
    let db = Database::new(dir.path().join("data").join("listings.db"))
        .await
        .unwrap();
    (dir, db)
}
