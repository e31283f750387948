use anyhow::{ensure, Context, Result};
use chrono::{Duration as Days, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Guest counts entered in the search bar
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Guests {
    pub adults: u32,
    pub children: u32,
    pub infants: u32,
    pub pets: u32,
}

impl Guests {
    pub fn adults(adults: u32) -> Self {
        Self {
            adults,
            ..Self::default()
        }
    }

    pub fn with_children(mut self, children: u32) -> Self {
        self.children = children;
        self
    }

    /// Count shown as "N guests" by the site; infants and pets are listed separately
    pub fn total(&self) -> u32 {
        self.adults + self.children
    }
}

impl Default for Guests {
    fn default() -> Self {
        Self {
            adults: 1,
            children: 0,
            infants: 0,
            pets: 0,
        }
    }
}

/// Search parameters and site settings for one end-to-end run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    /// City typed into the location field
    pub location: String,
    pub checkin: NaiveDate,
    pub checkout: NaiveDate,
    pub guests: Guests,
    /// Site root used for navigation and for resolving relative listing links
    pub base_url: String,
    /// Currency symbol that follows "total" in a card's price text
    pub currency: String,
    /// Upper bound on result pages visited in one pass
    pub max_pages: usize,
    /// Timeout for result cards to appear, in milliseconds
    pub card_timeout_ms: u64,
    /// Timeout for ordinary UI waits and assertions, in milliseconds
    pub action_timeout_ms: u64,
    /// Number typed when checkout asks for a phone
    pub phone_number: String,
}

impl Default for SearchParams {
    fn default() -> Self {
        let today = Local::now().date_naive();
        Self {
            location: "Tel Aviv".to_string(),
            checkin: today,
            checkout: today + Days::days(1),
            guests: Guests::adults(2),
            base_url: "https://www.airbnb.com".to_string(),
            currency: "₪".to_string(),
            max_pages: 50,
            card_timeout_ms: 10_000,
            action_timeout_ms: 5_000,
            phone_number: "521231122".to_string(),
        }
    }
}

impl SearchParams {
    /// Load parameters from a JSON file; absent fields keep their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let params: Self = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(!self.location.trim().is_empty(), "location must not be empty");
        ensure!(
            self.checkout > self.checkin,
            "checkout {} must be after checkin {}",
            self.checkout,
            self.checkin
        );
        ensure!(self.guests.adults > 0, "at least one adult is required");
        ensure!(self.max_pages > 0, "max_pages must be positive");
        Ok(())
    }

    pub fn with_guests(mut self, guests: Guests) -> Self {
        self.guests = guests;
        self
    }

    pub fn card_timeout(&self) -> Duration {
        Duration::from_millis(self.card_timeout_ms)
    }

    pub fn action_timeout(&self) -> Duration {
        Duration::from_millis(self.action_timeout_ms)
    }

    /// Marker preceding the total stay price in card text
    pub fn price_marker(&self) -> String {
        format!("total{}", self.currency)
    }
}
