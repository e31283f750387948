//! End-to-end search-and-reserve checks for a vacation-rental site, driven
//! through a headless browser.

pub mod browser;
pub mod flows;
pub mod models;
pub mod pages;
