//! Koto Group publishes vacancies through a page builder whose markup
//! changes between deploys, so nothing here relies on fixed class names.
//! Containers are found by trying progressively looser selectors and fields
//! are read out of the container's text.

use chrono::{DateTime, Utc};
use housing_core::{Listing, Result};
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::{debug, info};

use crate::dedup::dedup_listings;
use crate::settings::ScrapeSettings;
use crate::text::{
    absolute_link, find_street_address, has_number_then_capital, infer_category, inner_text,
    looks_like_listing, parse_address_slug, parse_bathrooms, parse_bedrooms, parse_dollar_price,
    selector, strongly_looks_like_listing,
};
use crate::{RenderOptions, RenderedPage, Source};

const CONTAINER_CASCADE: &[&str] = &[
    "[class*='property']",
    "[class*='listing']",
    "[class*='vacancy']",
    "[class*='unit']",
    "[class*='result']",
    ".property-card",
    ".listing-card",
    ".card",
    "article",
    "[data-property]",
    "[data-listing]",
    "div[class*='Property']",
    "div[class*='Listing']",
    "div[class*='Result']",
];

const DIV_SCAN_LIMIT: usize = 200;
const DIV_MATCH_CAP: usize = 50;
const MIN_ADDRESS_LEN: usize = 5;

#[derive(Debug, Clone, Copy, Default)]
pub struct Koto;

struct Selectors {
    link: Selector,
    headings: [Selector; 4],
    div: Selector,
}

impl Selectors {
    fn new() -> Result<Self> {
        Ok(Self {
            link: selector("a[href]")?,
            headings: [selector("h1")?, selector("h2")?, selector("h3")?, selector("h4")?],
            div: selector("div")?,
        })
    }
}

impl Koto {
    /// Listing containers in document order.
    fn find_containers<'a>(&self, document: &'a Html, selectors: &Selectors) -> Result<Vec<ElementRef<'a>>> {
        for pattern in CONTAINER_CASCADE {
            let candidate = selector(pattern)?;
            let matches: Vec<ElementRef<'a>> = document
                .select(&candidate)
                .filter(|el| looks_like_listing(&inner_text(*el)))
                .collect();
            if !matches.is_empty() {
                debug!(selector = *pattern, count = matches.len(), "Matched listing containers");
                return Ok(matches);
            }
        }

        debug!("No structured containers, scanning divs");
        Ok(document
            .select(&selectors.div)
            .take(DIV_SCAN_LIMIT)
            .filter(|el| strongly_looks_like_listing(&inner_text(*el)))
            .take(DIV_MATCH_CAP)
            .collect())
    }

    fn heading_address(&self, container: ElementRef<'_>, selectors: &Selectors) -> Option<String> {
        selectors.headings.iter().find_map(|heading| {
            container
                .select(heading)
                .next()
                .map(inner_text)
                .filter(|text| has_number_then_capital(text))
        })
    }

    fn extract_container(
        &self,
        container: ElementRef<'_>,
        selectors: &Selectors,
        page: &RenderedPage,
        scraped_at: DateTime<Utc>,
    ) -> Option<Listing> {
        let text = inner_text(container);
        let link = container
            .select(&selectors.link)
            .next()
            .and_then(|a| a.value().attr("href"))
            .and_then(|href| absolute_link(&page.url, href));

        let address = find_street_address(&text)
            .or_else(|| self.heading_address(container, selectors))
            .or_else(|| {
                link.as_deref()
                    .and_then(|l| parse_address_slug(l, None))
                    .map(|slug| slug.full())
            })
            .filter(|address| address.chars().count() >= MIN_ADDRESS_LEN);
        let Some(address) = address else {
            debug!(text = %text.chars().take(80).collect::<String>(), "Skipping koto container without an address");
            return None;
        };

        let mut listing = Listing::new(address, self.id(), scraped_at);
        listing.listing_link = link;
        listing.price = parse_dollar_price(&text);
        listing.bedrooms = parse_bedrooms(&text);
        listing.bathrooms = parse_bathrooms(&text);
        listing.category = infer_category(&text);
        Some(listing)
    }
}

impl Source for Koto {
    fn id(&self) -> &'static str {
        "koto"
    }

    fn name(&self) -> &'static str {
        "Koto Group"
    }

    fn homepage(&self) -> &'static str {
        "https://www.kotogroup.com"
    }

    fn urls(&self) -> &'static [&'static str] {
        &["https://www.kotogroup.com/vacancies"]
    }

    fn render_options(&self, settings: &ScrapeSettings) -> RenderOptions {
        RenderOptions {
            settle_delay: Duration::from_secs(3),
            ..settings.render_options()
        }
    }

    fn extract(&self, page: &RenderedPage, scraped_at: DateTime<Utc>) -> Result<Vec<Listing>> {
        let selectors = Selectors::new()?;
        let document = Html::parse_document(&page.html);

        let listings: Vec<Listing> = self
            .find_containers(&document, &selectors)?
            .into_iter()
            .filter_map(|container| self.extract_container(container, &selectors, page, scraped_at))
            .collect();

        info!(source = self.id(), count = listings.len(), "Extracted listings");
        Ok(dedup_listings(listings))
    }
}
