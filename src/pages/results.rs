use super::parser::CardParser;
use super::ranking::Ranking;
use super::types::SearchParams;
use crate::browser::{wait_until, ElementState, PageDriver, Target};
use crate::models::{Card, PassOutcome};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};

pub const CARD_SELECTOR: &str = r#"[itemprop="itemListElement"]"#;
pub const NEXT_SELECTOR: &str = r#"a[aria-label="Next"]"#;
pub const NEXT_DISABLED_SELECTOR: &str = r#"button[aria-disabled="true"][aria-label="Next"]"#;

/// Everything collected by one pass over the result pages
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Aggregation {
    pub all_cards: Vec<Card>,
    pub ranking: Ranking,
    pub outcome: PassOutcome,
}

enum PageStep {
    Advanced,
    LastPage,
    LimitReached,
}

/// Search results list
pub struct ResultsPage<'a, D: PageDriver + ?Sized> {
    driver: &'a D,
    parser: CardParser,
    max_pages: usize,
    card_timeout: Duration,
}

impl<'a, D: PageDriver + ?Sized> ResultsPage<'a, D> {
    pub fn new(driver: &'a D, params: &SearchParams) -> Self {
        Self {
            driver,
            parser: CardParser::new(params.price_marker(), params.base_url.clone()),
            max_pages: params.max_pages,
            card_timeout: params.card_timeout(),
        }
    }

    fn cards() -> Target {
        Target::css(CARD_SELECTOR)
    }

    fn wait_for_cards(&self) -> Result<()> {
        self.driver
            .wait_for(&Self::cards(), ElementState::Visible, self.card_timeout)?;
        self.driver
            .wait_for(&Self::cards().last(), ElementState::Visible, self.card_timeout)
    }

    /// Walk every result page once, ranking cards as they are parsed.
    ///
    /// Only the initial wait for the first page's cards is fatal. Any failure
    /// on a later step ends the pass with [`PassOutcome::Truncated`] and keeps
    /// what was collected so far.
    pub fn loop_over_results(&self) -> Result<Aggregation> {
        self.wait_for_cards()
            .context("Search results did not appear")?;

        let mut all_cards = Vec::new();
        let mut ranking = Ranking::new();
        let mut page = 1;

        let outcome = loop {
            info!("Processing page {}", page);
            match self.process_page(page, &mut all_cards, &mut ranking) {
                Ok(PageStep::Advanced) => page += 1,
                Ok(PageStep::LastPage) => {
                    info!("Reached last page");
                    break PassOutcome::Exhausted { pages: page };
                }
                Ok(PageStep::LimitReached) => {
                    info!("Stopping at page limit of {}", self.max_pages);
                    break PassOutcome::PageLimit { pages: page };
                }
                Err(e) => {
                    error!("Error processing page {}: {:#}", page, e);
                    break PassOutcome::Truncated {
                        page,
                        reason: format!("{:#}", e),
                    };
                }
            }
        };

        info!("Total cards collected: {}", all_cards.len());
        Ok(Aggregation {
            all_cards,
            ranking,
            outcome,
        })
    }

    fn process_page(&self, page: usize, all_cards: &mut Vec<Card>, ranking: &mut Ranking) -> Result<PageStep> {
        self.wait_for_cards()?;

        let markup = self.driver.outer_html_all(&Self::cards())?;
        info!("Found {} cards on page {}", markup.len(), page);

        for (idx, html) in markup.iter().enumerate() {
            debug!("Processing card {} of {}", idx + 1, markup.len());
            match self.parser.parse(html) {
                Some(card) => {
                    ranking.push(&card);
                    all_cards.push(card);
                }
                None => error!("Bad card {} on page {} - skipped", idx + 1, page),
            }
        }

        debug!("Checking for next page...");
        if !self.driver.is_hidden(&Target::css(NEXT_DISABLED_SELECTOR))? {
            return Ok(PageStep::LastPage);
        }
        // Single-page results render no pagination bar at all
        if self.driver.count(&Target::css(NEXT_SELECTOR))? == 0 {
            debug!("No next link on page {}", page);
            return Ok(PageStep::LastPage);
        }
        if page >= self.max_pages {
            return Ok(PageStep::LimitReached);
        }

        info!("Moving to page {}", page + 1);
        let first_before = markup.first().cloned();
        self.driver.click(&Target::css(NEXT_SELECTOR))?;
        wait_until(self.card_timeout, || {
            let first_now = self.driver.outer_html_all(&Self::cards())?.into_iter().next();
            Ok(first_now != first_before)
        })
        .with_context(|| format!("Page {} never replaced the previous results", page + 1))?;

        Ok(PageStep::Advanced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fake::FakePage;

    fn card_html(id: u32, price: &str, rating: Option<(&str, u32)>) -> String {
        let rating = match rating {
            Some((r, reviews)) => {
                format!("<span>Show price breakdown{} out of 5 average rating,  {} reviews</span>", r, reviews)
            }
            None => "<span>New</span>".to_string(),
        };
        format!(
            r#"<div itemprop="itemListElement"><a href="/rooms/{id}">Listing {id}</a><span>₪{price} total₪{price} total</span>{rating}</div>"#,
            id = id,
            price = price,
            rating = rating
        )
    }

    fn params() -> SearchParams {
        SearchParams {
            card_timeout_ms: 300,
            ..SearchParams::default()
        }
    }

    fn two_pages() -> Vec<Vec<String>> {
        vec![
            vec![
                card_html(1, "1,000", Some(("4.5", 10))),
                "<div itemprop=\"itemListElement\">Sold out</div>".to_string(),
                card_html(2, "800", Some(("4.5", 30))),
            ],
            vec![card_html(3, "800", Some(("4.0", 50))), card_html(4, "1,200", None)],
        ]
    }

    #[test]
    fn walks_all_pages_in_order() {
        let page = FakePage::new().with_result_pages(two_pages());
        let agg = ResultsPage::new(&page, &params()).loop_over_results().unwrap();

        assert_eq!(agg.outcome, PassOutcome::Exhausted { pages: 2 });
        let prices: Vec<f64> = agg.all_cards.iter().map(|c| c.price).collect();
        assert_eq!(prices, vec![1000.0, 800.0, 800.0, 1200.0]);

        let urls: Vec<&str> = agg.ranking.highest_rated.iter().filter_map(|c| c.url.as_deref()).collect();
        assert_eq!(urls, vec!["https://www.airbnb.com/rooms/1", "https://www.airbnb.com/rooms/2"]);
        assert_eq!(agg.ranking.cheapest.len(), 2);
        assert_eq!(agg.ranking.best_overall.as_ref().and_then(|c| c.reviews), Some(30));
        assert_eq!(agg.ranking, Ranking::from_cards(&agg.all_cards));
    }

    #[test]
    fn rerunning_gives_identical_results() {
        let first = ResultsPage::new(&FakePage::new().with_result_pages(two_pages()), &params())
            .loop_over_results()
            .unwrap();
        let second = ResultsPage::new(&FakePage::new().with_result_pages(two_pages()), &params())
            .loop_over_results()
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn failed_pagination_keeps_partial_results() {
        let page = FakePage::new().with_result_pages(two_pages()).failing_next_on(0);
        let agg = ResultsPage::new(&page, &params()).loop_over_results().unwrap();

        assert_eq!(agg.all_cards.len(), 2);
        match agg.outcome {
            PassOutcome::Truncated { page, ref reason } => {
                assert_eq!(page, 1);
                assert!(reason.contains("next button detached"));
            }
            ref other => panic!("unexpected outcome {:?}", other),
        }
        assert!(!agg.outcome.is_complete());
    }

    #[test]
    fn page_limit_bounds_endless_pagination() {
        let page = FakePage::new().with_result_pages(two_pages()).never_disabling_next();
        let params = SearchParams {
            max_pages: 5,
            ..params()
        };
        let agg = ResultsPage::new(&page, &params).loop_over_results().unwrap();

        assert_eq!(agg.outcome, PassOutcome::PageLimit { pages: 5 });
        assert_eq!(agg.all_cards.len(), 2 + 2 + 2 + 2 + 2);
    }

    #[test]
    fn single_page_without_pagination_is_exhausted() {
        let page = FakePage::new()
            .with_result_pages(vec![vec![card_html(1, "900", Some(("4.8", 12)))]])
            .without_pagination();
        let agg = ResultsPage::new(&page, &params()).loop_over_results().unwrap();

        assert_eq!(agg.outcome, PassOutcome::Exhausted { pages: 1 });
        assert!(agg.outcome.is_complete());
        assert_eq!(agg.all_cards.len(), 1);
        assert!(page.actions().iter().all(|a| !a.contains("Next")));
    }

    #[test]
    fn no_results_is_fatal() {
        let page = FakePage::new();
        let err = ResultsPage::new(&page, &params()).loop_over_results().unwrap_err();
        assert!(err.to_string().contains("Search results did not appear"));
    }
}
