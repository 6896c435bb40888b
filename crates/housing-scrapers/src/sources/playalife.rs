use chrono::{DateTime, Utc};
use housing_core::{Listing, Result};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info};

use crate::dedup::dedup_listings;
use crate::text::{
    absolute_link, parse_bedroom_field, parse_first_decimal, parse_first_number, select_text,
    selector,
};
use crate::{RenderedPage, Source};

#[derive(Debug, Clone, Copy, Default)]
pub struct PlayaLife;

struct Selectors {
    card: Selector,
    photo_link: Selector,
    rent: Selector,
    beds: Selector,
    baths: Selector,
}

impl Selectors {
    fn new() -> Result<Self> {
        Ok(Self {
            card: selector(".listing-item")?,
            photo_link: selector(".photo a[aria-label]")?,
            rent: selector("h3.rent")?,
            beds: selector(".feature.beds")?,
            baths: selector(".feature.baths")?,
        })
    }
}

impl PlayaLife {
    fn extract_card(
        &self,
        card: ElementRef<'_>,
        selectors: &Selectors,
        page: &RenderedPage,
        scraped_at: DateTime<Utc>,
    ) -> Option<Listing> {
        // The street address only appears as the photo link's accessible label.
        let photo = card.select(&selectors.photo_link).next();
        let address = photo
            .and_then(|a| a.value().attr("aria-label"))
            .map(str::trim)
            .filter(|label| !label.is_empty());
        let Some(address) = address else {
            debug!("Skipping playalife card without an aria-label address");
            return None;
        };

        let mut listing = Listing::new(address, self.id(), scraped_at);
        listing.listing_link = photo
            .and_then(|a| a.value().attr("href"))
            .and_then(|href| absolute_link(&page.url, href));
        listing.price = select_text(card, &selectors.rent).and_then(|t| parse_first_number(&t));
        listing.bedrooms = select_text(card, &selectors.beds).and_then(|t| parse_bedroom_field(&t));
        listing.bathrooms = select_text(card, &selectors.baths).and_then(|t| parse_first_decimal(&t));
        Some(listing)
    }
}

impl Source for PlayaLife {
    fn id(&self) -> &'static str {
        "playalife"
    }

    fn name(&self) -> &'static str {
        "PlayaLife IV"
    }

    fn homepage(&self) -> &'static str {
        "https://www.playalifeiv.com"
    }

    fn urls(&self) -> &'static [&'static str] {
        &["https://www.playalifeiv.com/vacancies"]
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
