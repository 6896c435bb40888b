use chrono::{DateTime, Utc};
use housing_core::{Listing, Result};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};

use crate::dedup::dedup_listings;
use crate::text::{
    inner_text, parse_bedroom_field, parse_first_decimal, parse_first_number, select_text, selector,
};
use crate::{RenderedPage, Source};

/// Marker of the embedded floor-plan widget.
const FRAME_SIGNATURE: &str = "ll-floor-plan-card";
const DEFAULT_BATHROOMS: f64 = 1.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct Solis;

struct Selectors {
    card: Selector,
    facts: Selector,
    name: Selector,
    price: Selector,
    move_in: Selector,
}

impl Selectors {
    fn new() -> Result<Self> {
        Ok(Self {
            card: selector(".ll-floor-plan-card")?,
            facts: selector("span.text-xs")?,
            name: selector("h2")?,
            price: selector("span.text-xl")?,
            move_in: selector("span.bg-ll-background-light")?,
        })
    }
}

impl Solis {
    fn extract_card(&self, card: ElementRef<'_>, selectors: &Selectors, scraped_at: DateTime<Utc>) -> Option<Listing> {
        let Some(address) = select_text(card, &selectors.name) else {
            debug!("Skipping solis floor plan without a heading");
            return None;
        };

        // Fact chips are, in order: unit type, bathrooms, square footage.
        let facts: Vec<String> = card.select(&selectors.facts).map(inner_text).collect();
        let fact = |i: usize| facts.get(i).map(String::as_str).unwrap_or_default();

        let baths = fact(1);
        let bathrooms = if baths.to_lowercase().contains("bath") {
            parse_first_decimal(baths).unwrap_or(DEFAULT_BATHROOMS)
        } else {
            DEFAULT_BATHROOMS
        };

        let mut listing = Listing::new(address, self.id(), scraped_at);
        listing.price = select_text(card, &selectors.price).and_then(|t| parse_first_number(&t));
        listing.bedrooms = parse_bedroom_field(fact(0));
        listing.bathrooms = Some(bathrooms);
        listing.square_feet = parse_first_number(fact(2));
        listing.move_in_date = select_text(card, &selectors.move_in);
        Some(listing)
    }
}

impl Source for Solis {
    fn id(&self) -> &'static str {
        "solis"
    }

    fn name(&self) -> &'static str {
        "Solis Isla Vista"
    }

    fn homepage(&self) -> &'static str {
        "https://solisislavista.com"
    }

    fn urls(&self) -> &'static [&'static str] {
        &["https://solisislavista.com/all-floor-plans"]
    }

    fn extract(&self, page: &RenderedPage, scraped_at: DateTime<Utc>) -> Result<Vec<Listing>> {
        let selectors = Selectors::new()?;

        let Some(markup) = page.find_document(FRAME_SIGNATURE) else {
            warn!(source = self.id(), frames = page.frames.len(), "Floor plan widget not found");
            return Ok(Vec::new());
        };
        let document = Html::parse_document(markup);

        let listings: Vec<Listing> = document
            .select(&selectors.card)
            .filter_map(|card| self.extract_card(card, &selectors, scraped_at))
            .collect();

        info!(source = self.id(), count = listings.len(), "Extracted listings");
        Ok(dedup_listings(listings))
    }
}
