//! Free-text heuristics shared by the extractors.
//!
//! Listing markup is not under our control, so numeric fields are pulled out
//! of whatever text a node happens to contain.

use housing_core::{Category, HousingError, Result};
use regex::Regex;
use scraper::{ElementRef, Selector};
use std::sync::LazyLock;
use url::Url;

static DOLLAR_PRICE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\s?(\d[\d,]*)").unwrap());
static FIRST_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d[\d,]*").unwrap());
static FIRST_DECIMAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").unwrap());
static STUDIO: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)studio").unwrap());
static BEDROOMS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*(?:bedroom|bed|br|bd)").unwrap());
static BATHROOMS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(?:bathroom|bath|ba)").unwrap());
static COMMERCIAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)office|commercial").unwrap());
static STORAGE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)storage").unwrap());
static STREET_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\d+\s+[A-Z][a-z]+(?:\s+[A-Z][a-z]+)?\s+(?:Street|St|Avenue|Ave|Road|Rd|Drive|Dr|Lane|Ln|Boulevard|Blvd|Way|Court|Ct)\b",
    )
    .unwrap()
});
static NUMBER_THEN_CAPITAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+\s+[A-Z]").unwrap());
static STREET_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+[A-Za-z]?\s+[A-Za-z]").unwrap());
static DOLLAR_AMOUNT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\d+").unwrap());
static ROOM_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)bedroom|bathroom|bed|bath").unwrap());
static ROOM_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)bedroom|bathroom").unwrap());
static AREA_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)sq\s*ft|square\s*feet").unwrap());

const STREET_SUFFIXES: &[&str] = &[
    "st", "street", "ave", "avenue", "rd", "road", "dr", "drive", "ln", "lane", "blvd",
    "boulevard", "way", "ct", "court", "pl", "place", "cir", "circle", "ter", "terrace",
];

pub fn selector(pattern: &str) -> Result<Selector> {
    Selector::parse(pattern).map_err(|e| HousingError::Selector(format!("{}: {}", pattern, e)))
}

/// Rendered text of an element with whitespace collapsed.
pub fn inner_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn select_text(element: ElementRef<'_>, selector: &Selector) -> Option<String> {
    element
        .select(selector)
        .next()
        .map(inner_text)
        .filter(|text| !text.is_empty())
}

pub fn absolute_link(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
        return None;
    }
    base.join(href).ok().map(String::from)
}

fn parse_grouped(digits: &str) -> Option<i64> {
    digits.replace(',', "").parse().ok()
}

/// First `$`-prefixed amount, commas stripped.
pub fn parse_dollar_price(text: &str) -> Option<i64> {
    DOLLAR_PRICE
        .captures(text)
        .and_then(|caps| parse_grouped(&caps[1]))
}

/// First digit group in the text, for nodes that only hold one quantity.
pub fn parse_first_number(text: &str) -> Option<i64> {
    FIRST_NUMBER.find(text).and_then(|m| parse_grouped(m.as_str()))
}

pub fn parse_first_decimal(text: &str) -> Option<f64> {
    FIRST_DECIMAL.find(text).and_then(|m| m.as_str().parse().ok())
}

pub fn is_studio(text: &str) -> bool {
    STUDIO.is_match(text)
}

/// Bedroom count from free text; "studio" anywhere means 0.
pub fn parse_bedrooms(text: &str) -> Option<i32> {
    if is_studio(text) {
        return Some(0);
    }
    BEDROOMS
        .captures(text)
        .and_then(|caps| caps[1].parse().ok())
}

/// Bedroom count from a node that holds only the bedroom figure.
pub fn parse_bedroom_field(text: &str) -> Option<i32> {
    if is_studio(text) {
        return Some(0);
    }
    parse_first_number(text).and_then(|n| i32::try_from(n).ok())
}

pub fn parse_bathrooms(text: &str) -> Option<f64> {
    BATHROOMS
        .captures(text)
        .and_then(|caps| caps[1].parse().ok())
}

pub fn infer_category(text: &str) -> Category {
    if COMMERCIAL.is_match(text) {
        Category::Commercial
    } else if STORAGE.is_match(text) {
        Category::Storage
    } else {
        Category::Residential
    }
}

pub fn find_street_address(text: &str) -> Option<String> {
    STREET_ADDRESS.find(text).map(|m| m.as_str().trim().to_string())
}

pub fn starts_with_street_number(text: &str) -> bool {
    STREET_LINE.is_match(text.trim())
}

pub fn has_number_then_capital(text: &str) -> bool {
    NUMBER_THEN_CAPITAL.is_match(text)
}

/// Weak signal: any one listing-ish token.
pub fn looks_like_listing(text: &str) -> bool {
    NUMBER_THEN_CAPITAL.is_match(text)
        || DOLLAR_AMOUNT.is_match(text)
        || ROOM_KEYWORD.is_match(text)
        || AREA_KEYWORD.is_match(text)
}

/// Strong signal: a street address plus a price or room count.
pub fn strongly_looks_like_listing(text: &str) -> bool {
    STREET_ADDRESS.is_match(text) && (DOLLAR_AMOUNT.is_match(text) || ROOM_WORD.is_match(text))
}

/// Address fields recovered from a listing URL slug such as
/// `6565-del-playa-dr-unit-b-isla-vista-ca-93117`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlugAddress {
    pub number: String,
    pub street: String,
    pub unit: Option<String>,
    pub city: String,
    pub state: String,
    pub zip: String,
}

impl SlugAddress {
    pub fn street_line(&self) -> String {
        match &self.unit {
            Some(unit) => format!("{} {} Unit {}", self.number, self.street, unit),
            None => format!("{} {}", self.number, self.street),
        }
    }

    pub fn full(&self) -> String {
        format!("{}, {}, {} {}", self.street_line(), self.city, self.state, self.zip)
    }
}

fn title_case(words: &[&str]) -> String {
    words
        .iter()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse `<number>-<street-words>[-unit-<unit>]-<city>-<state>-<zip>` out of
/// the last path segment of `link`. `known_city` disambiguates where the
/// street ends and the city begins; without it the last street suffix wins.
pub fn parse_address_slug(link: &str, known_city: Option<&str>) -> Option<SlugAddress> {
    let url = Url::parse(link).ok()?;
    let slug = url
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .last()?
        .to_lowercase();
    let tokens: Vec<&str> = slug.split('-').filter(|t| !t.is_empty()).collect();
    if tokens.len() < 5 {
        return None;
    }

    let zip = tokens[tokens.len() - 1];
    let state = tokens[tokens.len() - 2];
    let number = tokens[0];
    if zip.len() != 5 || !zip.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if state.len() != 2 || !state.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    if !number.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }

    let before_state = &tokens[1..tokens.len() - 2];
    let city_start = match known_city {
        Some(city) => {
            let city = city.to_lowercase();
            let city_tokens: Vec<&str> = city.split_whitespace().collect();
            if before_state.len() > city_tokens.len() && before_state.ends_with(&city_tokens) {
                before_state.len() - city_tokens.len()
            } else {
                return None;
            }
        }
        None => {
            let last_suffix = before_state
                .iter()
                .rposition(|t| STREET_SUFFIXES.contains(t))?;
            let unit_end = (last_suffix + 1).max(unit_boundary(before_state).unwrap_or(0));
            if unit_end >= before_state.len() {
                return None;
            }
            unit_end
        }
    };

    let street_tokens = &before_state[..city_start];
    let city_tokens = &before_state[city_start..];
    let (street, unit) = match street_tokens.iter().rposition(|t| *t == "unit") {
        Some(pos) if pos > 0 && pos + 1 < street_tokens.len() => (
            &street_tokens[..pos],
            Some(street_tokens[pos + 1..].join("-").to_uppercase()),
        ),
        _ => (street_tokens, None),
    };
    if street.is_empty() || city_tokens.is_empty() {
        return None;
    }

    Some(SlugAddress {
        number: number.to_uppercase(),
        street: title_case(street),
        unit,
        city: title_case(city_tokens),
        state: state.to_uppercase(),
        zip: zip.to_string(),
    })
}

/// Index just past a `unit-<u>` pair, if the slug has one.
fn unit_boundary(tokens: &[&str]) -> Option<usize> {
    tokens
        .iter()
        .rposition(|t| *t == "unit")
        .filter(|pos| pos + 1 < tokens.len())
        .map(|pos| pos + 2)
}
