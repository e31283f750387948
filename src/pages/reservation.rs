use super::types::SearchParams;
use crate::browser::{expect_any_visible, expect_text, ElementState, PageDriver, Target, TextMatch};
use crate::models::{BookingSummary, PhoneBranch, ReservationOutcome};
use anyhow::{ensure, Context, Result};
use tracing::info;

const SIDEBAR_SELECTOR: &str = r#"[data-plugin-in-point-id="BOOK_IT_SIDEBAR"]"#;

/// Text between the first `start` marker and the next `end` marker
fn between<'t>(text: &'t str, start: &str, end: &str) -> Option<&'t str> {
    let (_, rest) = text.split_once(start)?;
    Some(rest.split(end).next().unwrap_or(rest))
}

/// Parse the booking sidebar's text content.
///
/// The nightly price is the last token before the first "night"; dates and
/// guests sit between their labels ("Check-in", "Checkout", "Guests", "Reserve").
pub fn parse_summary_text(text: &str, currency: &str) -> Result<BookingSummary> {
    let text = text.replace('\u{a0}', " ");

    let (before_night, _) = text
        .split_once("night")
        .context("Summary has no nightly price")?;
    let price_token = before_night
        .split_whitespace()
        .last()
        .context("Summary has no nightly price")?;
    let price_per_night = price_token
        .replace(currency, "")
        .replace(',', "")
        .parse::<u64>()
        .with_context(|| format!("Bad nightly price {:?}", price_token))?;

    let checkin = between(&text, "Check-in", "Checkout").context("Summary has no check-in date")?;
    let checkout = between(&text, "Checkout", "Guests").context("Summary has no checkout date")?;
    let guests = between(&text, "Guests", "Reserve").context("Summary has no guest count")?;

    Ok(BookingSummary {
        price_per_night,
        checkin: checkin.trim().to_string(),
        checkout: checkout.trim().to_string(),
        guests: guests.trim().to_string(),
    })
}

/// Listing detail page with the booking sidebar
pub struct ReservationPage<'a, D: PageDriver + ?Sized> {
    driver: &'a D,
    params: &'a SearchParams,
}

impl<'a, D: PageDriver + ?Sized> ReservationPage<'a, D> {
    pub fn new(driver: &'a D, params: &'a SearchParams) -> Self {
        Self { driver, params }
    }

    /// Read the booking sidebar and check it agrees with the page's date and
    /// guest widgets and with the searched guest count
    pub fn parse_and_validate_summary(&self) -> Result<BookingSummary> {
        let sidebar = Target::css(SIDEBAR_SELECTOR);
        let load_timeout = self.params.card_timeout();
        self.driver
            .wait_for(&sidebar, ElementState::Visible, load_timeout)
            .context("Booking sidebar did not appear")?;
        // Sidebar renders before its price is filled in
        expect_text(self.driver, &sidebar, TextMatch::Contains("night"), load_timeout)?;

        let text = self.driver.text_content(&sidebar)?;
        let summary = parse_summary_text(&text, &self.params.currency)?;
        info!("extracted price: {} from reservation card", summary.price_per_night);

        let timeout = self.params.action_timeout();
        expect_text(
            self.driver,
            &Target::test_id("change-dates-checkIn"),
            TextMatch::Exact(&summary.checkin),
            timeout,
        )?;
        info!("extracted check in date: {} from reservation card", summary.checkin);

        expect_text(
            self.driver,
            &Target::test_id("change-dates-checkOut"),
            TextMatch::Exact(&summary.checkout),
            timeout,
        )?;
        info!("extracted check out date: {} from reservation card", summary.checkout);

        expect_text(
            self.driver,
            &Target::css("#GuestPicker-book_it-trigger"),
            TextMatch::Exact(&summary.guests),
            timeout,
        )?;
        let expected_guests = self.params.guests.total().to_string();
        ensure!(
            summary.guests.split_whitespace().any(|t| t == expected_guests),
            "sidebar shows {:?}, expected {} guests",
            summary.guests,
            expected_guests
        );
        info!("extracted guests: {} from reservation card", summary.guests);

        Ok(summary)
    }

    /// Press Reserve and fill the phone number when checkout asks for one
    pub fn do_reservation(&self) -> Result<ReservationOutcome> {
        let reserve_btn =
            Target::xpath("//button[.//*[@data-button-content='true'][contains(., 'Reserve')]]").last();

        let reserve_clicked = self.driver.is_visible(&reserve_btn)?;
        if reserve_clicked {
            info!("Clicking on Reserve button");
            self.driver.click(&reserve_btn)?;
            expect_any_visible(
                self.driver,
                &[
                    Target::role("heading", "Request to book"),
                    Target::role("heading", "Confirm and pay"),
                ],
                self.params.card_timeout(),
            )
            .context("Checkout page did not open")?;
        } else {
            info!("No Reserve button on the listing");
        }

        let input_phone = Target::test_id("login-signup-phonenumber");
        let phone = if self.driver.is_visible(&input_phone)? {
            info!("'A' Page, can input phone, inputting..");
            self.driver.type_text(&input_phone, &self.params.phone_number)?;
            PhoneBranch::Entered
        } else {
            info!("'B' page, can't input phone");
            PhoneBranch::NotOffered
        };

        Ok(ReservationOutcome {
            reserve_clicked,
            phone,
        })
    }
}
