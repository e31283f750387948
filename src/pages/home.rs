use super::types::{Guests, SearchParams};
use crate::browser::{expect_text, ElementState, PageDriver, Target, TextMatch};
use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use tracing::info;

/// Landing page with the structured search bar
pub struct HomePage<'a, D: PageDriver + ?Sized> {
    driver: &'a D,
    params: &'a SearchParams,
}

impl<'a, D: PageDriver + ?Sized> HomePage<'a, D> {
    pub fn new(driver: &'a D, params: &'a SearchParams) -> Self {
        Self { driver, params }
    }

    pub fn goto_home(&self) -> Result<()> {
        let url = format!("{}/homes", self.params.base_url.trim_end_matches('/'));
        self.driver.goto(&url)
    }

    /// Turn off auto translation; with it on, a translation pop-up covers the reservation flow
    pub fn disable_auto_translation(&self) -> Result<()> {
        self.driver
            .click(&Target::role("button", "Choose a language and currency"))?;
        self.driver.click(&Target::css(
            r#"button[role="switch"][aria-labelledby="auto_translate_switch"]"#,
        ))?;
        self.driver
            .wait_for(
                &Target::css(r#"[role="dialog"][aria-label="Languages"]"#),
                ElementState::Hidden,
                self.params.action_timeout(),
            )
            .context("Language dialog did not close")?;
        info!("Disabled auto translation feature to avoid reservation pop-up");
        Ok(())
    }

    pub fn set_location(&self, location: &str) -> Result<()> {
        let search_input = Target::test_id("structured-search-input-field-query");
        self.driver.click(&search_input)?;
        info!("Typing {} into search field", location);
        self.driver.fill(&search_input, location)
    }

    pub fn set_date(&self, checkin: NaiveDate, checkout: NaiveDate) -> Result<()> {
        self.driver
            .click(&Target::xpath("//div[@role='button'][contains(., 'Check in')]"))?;
        info!("Opening date selector");

        for (label, date) in [("check-in", checkin), ("check-out", checkout)] {
            let day = date.format("%Y-%m-%d").to_string();
            self.driver
                .click(&Target::css(format!(r#"button[data-state--date-string="{}"]"#, day)))
                .with_context(|| format!("No {} day {} in the calendar", label, day))?;
            info!("Clicked {} date: {}", label, day);
        }
        Ok(())
    }

    pub fn set_guests(&self, guests: &Guests) -> Result<()> {
        self.driver.click(&Target::role("button", "Who Add guests"))?;

        info!("Setting guests");
        let steppers = [
            ("adults", guests.adults),
            ("children", guests.children),
            ("infants", guests.infants),
            ("pets", guests.pets),
        ];
        for (kind, count) in steppers {
            let increase = Target::test_id(format!("stepper-{}-increase-button", kind));
            for _ in 0..count {
                self.driver.click(&increase)?;
            }
        }
        Ok(())
    }

    pub fn submit_search(&self) -> Result<()> {
        info!("Clicking on submit search");
        self.driver
            .click(&Target::test_id("structured-search-input-search-button"))
    }

    /// Run a full search with the configured location, dates and guests
    pub fn search(&self) -> Result<()> {
        let p = self.params;
        self.goto_home()?;
        self.disable_auto_translation()?;
        self.set_location(&p.location)?;
        self.set_date(p.checkin, p.checkout)?;
        self.set_guests(&p.guests)?;
        self.submit_search()
    }

    /// Check the condensed search bar on the results page echoes the search
    pub fn validate_little_search(&self) -> Result<()> {
        let p = self.params;
        let timeout = p.action_timeout();

        expect_text(
            self.driver,
            &Target::test_id("little-search-location"),
            TextMatch::Contains(&p.location),
            timeout,
        )?;

        let duration = format_date_range(p.checkin, p.checkout);
        expect_text(
            self.driver,
            &Target::test_id("little-search-anytime"),
            TextMatch::Contains(&duration),
            timeout,
        )?;

        let guests = p.guests.total().to_string();
        expect_text(
            self.driver,
            &Target::test_id("little-search-guests"),
            TextMatch::Word(&guests),
            timeout,
        )?;
        info!("Search bar shows {} / {} / {} guests", p.location, duration, guests);
        Ok(())
    }
}

/// Date range as the search bar renders it: "October 19 – 20" within a month,
/// "October 31 – November 1" across months
pub fn format_date_range(checkin: NaiveDate, checkout: NaiveDate) -> String {
    if checkin.year() == checkout.year() && checkin.month() == checkout.month() {
        format!("{} – {}", checkin.format("%B %-d"), checkout.format("%-d"))
    } else {
        format!("{} – {}", checkin.format("%B %-d"), checkout.format("%B %-d"))
    }
}
