use serde::{Deserialize, Serialize};

/// One parsed search-result listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Card {
    /// Absent for listings without reviews yet
    pub rating: Option<f64>,
    /// Total price for the whole stay
    pub price: f64,
    pub reviews: Option<u32>,
    pub url: Option<String>,
}

impl Card {
    pub fn new(price: f64) -> Self {
        Self {
            rating: None,
            price,
            reviews: None,
            url: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// How an aggregation pass over the result pages ended
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PassOutcome {
    /// The "next" control was disabled on the last visited page
    Exhausted { pages: usize },
    /// Stopped at the configured page cap while "next" was still enabled
    PageLimit { pages: usize },
    /// A page-level failure ended the pass; earlier pages are kept
    Truncated { page: usize, reason: String },
}

impl PassOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, PassOutcome::Exhausted { .. })
    }
}

/// Values read from the booking sidebar of a listing page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingSummary {
    pub price_per_night: u64,
    pub checkin: String,
    pub checkout: String,
    pub guests: String,
}

/// Whether the checkout page offered a phone-number field
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PhoneBranch {
    Entered,
    NotOffered,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReservationOutcome {
    /// False when no visible Reserve button was found on the listing
    pub reserve_clicked: bool,
    pub phone: PhoneBranch,
}
