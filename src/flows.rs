use crate::browser::PageDriver;
use crate::models::{BookingSummary, Card, ReservationOutcome};
use crate::pages::{log_cards, Aggregation, HomePage, ReservationPage, ResultsPage, SearchParams};
use anyhow::{ensure, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Result of searching and walking every result page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchReport {
    pub location: String,
    pub checkin: NaiveDate,
    pub checkout: NaiveDate,
    pub guests: u32,
    pub searched_at: DateTime<Utc>,
    #[serde(flatten)]
    pub aggregation: Aggregation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationReport {
    pub search: SearchReport,
    pub selected: Card,
    pub summary: BookingSummary,
    pub outcome: ReservationOutcome,
}

fn search_and_collect<D: PageDriver + ?Sized>(driver: &D, params: &SearchParams) -> Result<SearchReport> {
    params.validate()?;

    let home = HomePage::new(driver, params);
    home.search().context("Search failed")?;
    home.validate_little_search()
        .context("Search bar does not reflect the search")?;

    let aggregation = ResultsPage::new(driver, params).loop_over_results()?;
    if !aggregation.outcome.is_complete() {
        warn!("Result pages not fully visited: {:?}", aggregation.outcome);
    }
    ensure!(
        !aggregation.all_cards.is_empty(),
        "No result card could be parsed"
    );

    Ok(SearchReport {
        location: params.location.clone(),
        checkin: params.checkin,
        checkout: params.checkout,
        guests: params.guests.total(),
        searched_at: Utc::now(),
        aggregation,
    })
}

/// Search, then report the highest-rated and cheapest listings
pub fn rank_listings<D: PageDriver + ?Sized>(driver: &D, params: &SearchParams) -> Result<SearchReport> {
    let report = search_and_collect(driver, params)?;
    let ranking = &report.aggregation.ranking;

    match ranking.max_rating {
        Some(rating) => info!("max rating card found with rating of: {}", rating),
        None => warn!("No rated listing in the results"),
    }
    info!("Highest rating cards:");
    log_cards(&ranking.highest_rated);

    if let Some(price) = ranking.min_price {
        info!("minimum price card found with price of: {}", price);
    }
    info!("Cheapest cards:");
    log_cards(&ranking.cheapest);

    Ok(report)
}

/// Search, open the most-reviewed of the highest-rated listings and go
/// through its reservation step
pub fn reserve_best<D: PageDriver + ?Sized>(driver: &D, params: &SearchParams) -> Result<ReservationReport> {
    let search = search_and_collect(driver, params)?;

    let selected = search
        .aggregation
        .ranking
        .best_overall
        .clone()
        .context("No reviewed listing among the highest rated")?;
    info!(
        "Amongst the highest rating options, selected highest review count option with rating of {:?} and review count of: {:?}",
        selected.rating, selected.reviews
    );
    let url = selected
        .url
        .clone()
        .context("Selected listing has no link")?;

    info!("Navigating to best selected card");
    driver.goto(&url)?;

    let reservation = ReservationPage::new(driver, params);
    let summary = reservation.parse_and_validate_summary()?;
    let outcome = reservation.do_reservation()?;

    Ok(ReservationReport {
        search,
        selected,
        summary,
        outcome,
    })
}
