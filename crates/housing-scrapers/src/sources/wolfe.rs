use chrono::{DateTime, Utc};
use housing_core::{Listing, Result};
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::{debug, info};

use crate::dedup::dedup_listings;
use crate::settings::ScrapeSettings;
use crate::text::{
    absolute_link, inner_text, parse_address_slug, parse_bathrooms, parse_bedrooms,
    parse_first_number, select_text, selector, starts_with_street_number,
};
use crate::{RenderOptions, RenderedPage, Source};

const SERVICE_ZIP: &str = "93117";
const SERVICE_CITY: &str = "Isla Vista";
const SERVICE_STATE: &str = "CA";

#[derive(Debug, Clone, Copy, Default)]
pub struct Wolfe;

struct Selectors {
    card: Selector,
    detail_link: Selector,
    address: Selector,
    rent: Selector,
    amenities: Selector,
    available: Selector,
}

impl Selectors {
    fn new() -> Result<Self> {
        Ok(Self {
            card: selector(".listing-item, .js-listing-card, [data-listingid]")?,
            detail_link: selector("a[href*='/listings/detail/']")?,
            address: selector("h2.address")?,
            rent: selector("h3.rent")?,
            amenities: selector(".amenities")?,
            available: selector("div.available")?,
        })
    }
}

/// `"<street line>, Isla Vista, CA 93117"`, the one address form every card gets.
fn service_address(street_line: &str) -> String {
    format!(
        "{}, {}, {} {}",
        street_line.trim(),
        SERVICE_CITY,
        SERVICE_STATE,
        SERVICE_ZIP
    )
}

fn address_from_heading(heading: &str) -> Option<String> {
    let street_line = heading.split(',').next()?.trim();
    starts_with_street_number(street_line).then(|| service_address(street_line))
}

fn address_from_link(link: &str) -> Option<String> {
    let slug = parse_address_slug(link, Some(SERVICE_CITY))?;
    Some(service_address(&slug.street_line()))
}

impl Wolfe {
    fn extract_card(
        &self,
        card: ElementRef<'_>,
        selectors: &Selectors,
        page: &RenderedPage,
        scraped_at: DateTime<Utc>,
    ) -> Option<Listing> {
        let link = card
            .select(&selectors.detail_link)
            .next()
            .and_then(|a| a.value().attr("href"))
            .and_then(|href| absolute_link(&page.url, href));

        let text = inner_text(card);
        let in_area = text.contains(SERVICE_ZIP)
            || link.as_deref().is_some_and(|l| l.contains(SERVICE_ZIP));
        if !in_area {
            debug!(link = ?link, "Skipping wolfe listing outside {}", SERVICE_ZIP);
            return None;
        }

        let address = select_text(card, &selectors.address)
            .as_deref()
            .and_then(address_from_heading)
            .or_else(|| link.as_deref().and_then(address_from_link));
        let Some(address) = address else {
            debug!(link = ?link, "Skipping wolfe listing without a usable address");
            return None;
        };

        let amenities = select_text(card, &selectors.amenities).unwrap_or_default();

        let mut listing = Listing::new(address, self.id(), scraped_at);
        listing.listing_link = link;
        listing.price = select_text(card, &selectors.rent).and_then(|t| parse_first_number(&t));
        listing.bedrooms = parse_bedrooms(&amenities);
        listing.bathrooms = parse_bathrooms(&amenities);
        listing.move_in_date = select_text(card, &selectors.available);
        Some(listing)
    }
}

impl Source for Wolfe {
    fn id(&self) -> &'static str {
        "wolfe"
    }

    fn name(&self) -> &'static str {
        "Wolfe & Associates"
    }

    fn homepage(&self) -> &'static str {
        "https://www.rlwa.com"
    }

    fn urls(&self) -> &'static [&'static str] {
        &["https://www.rlwa.com/isla-vista-listings"]
    }

    fn render_options(&self, settings: &ScrapeSettings) -> RenderOptions {
        RenderOptions {
            timeout: settings.navigation_timeout.max(Duration::from_secs(60)),
            settle_delay: Duration::from_secs(3),
        }
    }

    fn extract(&self, page: &RenderedPage, scraped_at: DateTime<Utc>) -> Result<Vec<Listing>> {
        let selectors = Selectors::new()?;
        let document = Html::parse_document(&page.html);

        let listings: Vec<Listing> = document
            .select(&selectors.card)
            .filter_map(|card| self.extract_card(card, &selectors, page, scraped_at))
            .collect();

        info!(source = self.id(), count = listings.len(), "Extracted listings");
        Ok(dedup_listings(listings))
    }
}
