//! Field extraction from the rendered text of a search-result card.
//!
//! Each extractor takes the card's text content and returns `None` when its
//! marker is missing or the token after it is not a finite, non-negative
//! number. Only the price is required for a card to be kept.

use crate::models::Card;
use scraper::{Html, Selector};
use tracing::{debug, info};

/// Href prefix of links to a listing's detail page
pub const LISTING_PATH_PREFIX: &str = "/rooms/";

const RATING_MARKER: &str = "breakdown";
const REVIEWS_MARKER: &str = "rating, ";

/// Text following the last occurrence of `marker`
fn after_last<'a>(text: &'a str, marker: &str) -> Option<&'a str> {
    text.rsplit_once(marker).map(|(_, rest)| rest)
}

/// `f64::from_str` also accepts "NaN", "inf" and signs; none of those is a price or rating
fn plain_number(token: &str) -> Option<f64> {
    let value: f64 = token.parse().ok()?;
    (value.is_finite() && value >= 0.0).then_some(value)
}

/// Total stay price: the token right after the last `price_marker` (e.g. `total₪`)
pub fn extract_price(text: &str, price_marker: &str) -> Option<f64> {
    let token = after_last(text, price_marker)?.split(' ').next()?;
    plain_number(&token.replace(',', ""))
}

/// Average rating: the token after the last "breakdown" marker
pub fn extract_rating(text: &str) -> Option<f64> {
    if !text.to_lowercase().contains("rating") {
        return None;
    }
    let token = after_last(text, RATING_MARKER)?.split(' ').next()?;
    plain_number(&token.replace('\'', ""))
}

/// Review count: second space-separated token after the last "rating, " marker
pub fn extract_reviews(text: &str) -> Option<u32> {
    if !text.to_lowercase().contains("review") {
        return None;
    }
    after_last(text, REVIEWS_MARKER)?.split(' ').nth(1)?.parse().ok()
}

/// Absolute URL of the first listing link in the card markup
pub fn extract_url(fragment: &Html, base_url: &str) -> Option<String> {
    let selector = Selector::parse(&format!(r#"a[href^="{}"]"#, LISTING_PATH_PREFIX)).ok()?;
    let href = fragment.select(&selector).next()?.value().attr("href")?;
    Some(absolute_url(href, base_url))
}

pub fn absolute_url(href: &str, base_url: &str) -> String {
    if href.starts_with("http") {
        href.to_string()
    } else {
        format!("{}{}", base_url.trim_end_matches('/'), href)
    }
}

/// Concatenated text of a card's markup, the way `textContent` reports it,
/// with non-breaking spaces turned into plain ones
pub fn card_text(fragment: &Html) -> String {
    fragment
        .root_element()
        .text()
        .collect::<String>()
        .replace('\u{a0}', " ")
}

/// Parses result cards for one site configuration
#[derive(Debug, Clone)]
pub struct CardParser {
    price_marker: String,
    base_url: String,
}

impl CardParser {
    pub fn new(price_marker: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            price_marker: price_marker.into(),
            base_url: base_url.into(),
        }
    }

    /// Parse one card from its outer HTML; `None` means the card is skipped
    pub fn parse(&self, card_html: &str) -> Option<Card> {
        let fragment = Html::parse_fragment(card_html);
        let text = card_text(&fragment);
        debug!("Raw card text: {}", text);

        let card = self.parse_text(&text, extract_url(&fragment, &self.base_url));
        if card.is_none() {
            debug!("Bad card - no price after {:?}", self.price_marker);
        }
        card
    }

    /// Build a card from already-extracted text and link
    pub fn parse_text(&self, text: &str, url: Option<String>) -> Option<Card> {
        let price = extract_price(text, &self.price_marker)?;

        let rating = extract_rating(text);
        if rating.is_none() {
            debug!("Could not parse rating");
        }

        // A review count is only meaningful next to a rating
        let reviews = rating.and_then(|_| extract_reviews(text));
        if rating.is_some() && reviews.is_none() {
            debug!("Could not parse reviews");
        }
        if url.is_none() {
            debug!("Could not get URL");
        }

        info!(
            "Card loaded with rating: {:?} price: {} reviews: {:?} url: {:?}",
            rating, price, reviews, url
        );
        Some(Card {
            rating,
            price,
            reviews,
            url,
        })
    }
}
