pub mod chrome;
#[cfg(test)]
pub mod fake;
pub mod traits;

pub use chrome::ChromePage;
pub use traits::{ElementState, Locator, PageDriver, Pick, Target};

use anyhow::{bail, Result};
use std::thread;
use std::time::{Duration, Instant};

/// Delay between polls of a condition wait
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Poll `condition` until it returns true or `timeout` elapses.
///
/// Errors from the condition are treated as "not yet" until the deadline; the
/// last one is reported if the wait times out.
pub fn wait_until<F>(timeout: Duration, mut condition: F) -> Result<()>
where
    F: FnMut() -> Result<bool>,
{
    let deadline = Instant::now() + timeout;
    loop {
        let last_error = match condition() {
            Ok(true) => return Ok(()),
            Ok(false) => None,
            Err(e) => Some(e),
        };
        if Instant::now() >= deadline {
            match last_error {
                Some(e) => return Err(e.context(format!("condition not met within {:?}", timeout))),
                None => bail!("condition not met within {:?}", timeout),
            }
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Collapse runs of whitespace (including non-breaking spaces) into single spaces
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Expected text of an element, compared after whitespace normalisation
#[derive(Debug, Clone, Copy)]
pub enum TextMatch<'a> {
    Exact(&'a str),
    Contains(&'a str),
    /// One whitespace-separated token equals the expected value
    Word(&'a str),
}

impl TextMatch<'_> {
    pub fn matches(&self, actual: &str) -> bool {
        let actual = normalize_whitespace(actual);
        match self {
            TextMatch::Exact(expected) => actual == normalize_whitespace(expected),
            TextMatch::Contains(expected) => actual.contains(&normalize_whitespace(expected)),
            TextMatch::Word(expected) => actual.split(' ').any(|token| token == expected.trim()),
        }
    }
}

/// Retrying text assertion: passes as soon as the element's text matches
pub fn expect_text<D>(driver: &D, target: &Target, expected: TextMatch<'_>, timeout: Duration) -> Result<()>
where
    D: PageDriver + ?Sized,
{
    let mut last_seen = None;
    let result = wait_until(timeout, || {
        let text = driver.text_content(target)?;
        let ok = expected.matches(&text);
        last_seen = Some(text);
        Ok(ok)
    });
    if result.is_err() {
        bail!(
            "expected {} to have text {:?}, last seen {:?}",
            target,
            expected,
            last_seen.map(|t| normalize_whitespace(&t))
        );
    }
    Ok(())
}

/// Wait until any one of `targets` is visible; returns its index
pub fn expect_any_visible<D>(driver: &D, targets: &[Target], timeout: Duration) -> Result<usize>
where
    D: PageDriver + ?Sized,
{
    let mut found = None;
    wait_until(timeout, || {
        for (idx, target) in targets.iter().enumerate() {
            if driver.is_visible(target)? {
                found = Some(idx);
                return Ok(true);
            }
        }
        Ok(false)
    })
    .map_err(|e| {
        let names: Vec<String> = targets.iter().map(|t| t.to_string()).collect();
        e.context(format!("none of [{}] became visible", names.join(", ")))
    })?;
    match found {
        Some(idx) => Ok(idx),
        None => bail!("visibility wait finished without a match"),
    }
}
