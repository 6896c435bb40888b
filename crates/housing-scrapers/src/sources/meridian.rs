use chrono::{DateTime, Utc};
use housing_core::{Listing, Result};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info};

use crate::dedup::dedup_listings;
use crate::text::{
    absolute_link, infer_category, parse_bathrooms, parse_bedrooms, parse_first_number,
    select_text, selector,
};
use crate::{RenderedPage, Source};

#[derive(Debug, Clone, Copy, Default)]
pub struct Meridian;

struct Selectors {
    card: Selector,
    link: Selector,
    street: Selector,
    location: Selector,
    price: Selector,
    details: Selector,
}

impl Selectors {
    fn new() -> Result<Self> {
        Ok(Self {
            card: selector(".prop-list")?,
            link: selector("a[href]")?,
            street: selector(".prop-details h3")?,
            location: selector(".prop-details > p")?,
            price: selector(".two-item-wrap p:first-child")?,
            details: selector(".two-item-wrap p:last-child")?,
        })
    }
}

impl Meridian {
    fn extract_card(
        &self,
        card: ElementRef<'_>,
        selectors: &Selectors,
        page: &RenderedPage,
        scraped_at: DateTime<Utc>,
    ) -> Option<Listing> {
        let Some(street) = select_text(card, &selectors.street) else {
            debug!("Skipping meridian card without a street line");
            return None;
        };
        let address = match select_text(card, &selectors.location) {
            Some(location) => format!("{}, {}", street, location),
            None => street,
        };

        let details = select_text(card, &selectors.details).unwrap_or_default();

        let mut listing = Listing::new(address, self.id(), scraped_at);
        listing.listing_link = card
            .select(&selectors.link)
            .next()
            .and_then(|a| a.value().attr("href"))
            .and_then(|href| absolute_link(&page.url, href));
        listing.price = select_text(card, &selectors.price).and_then(|t| parse_first_number(&t));
        listing.bedrooms = parse_bedrooms(&details);
        listing.bathrooms = parse_bathrooms(&details);
        listing.category = infer_category(&details);
        Some(listing)
    }
}

impl Source for Meridian {
    fn id(&self) -> &'static str {
        "meridian"
    }

    fn name(&self) -> &'static str {
        "Meridian Group Real Estate"
    }

    fn homepage(&self) -> &'static str {
        "https://meridiangrouprem.com"
    }

    fn urls(&self) -> &'static [&'static str] {
        &["https://meridiangrouprem.com/available-rentals/"]
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
