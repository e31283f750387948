use super::wait_until;
use anyhow::{Context, Result};
use std::time::Duration;

/// How an element is looked up on the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Css(String),
    /// Matches `[data-testid="..."]`
    TestId(String),
    XPath(String),
    /// Element with an ARIA role (implicit for `<button>`/headings) and accessible name
    Role { role: String, name: String },
}

/// Which of several matches an action applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pick {
    First,
    Last,
}

/// An element reference used by page objects
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub locator: Locator,
    pub pick: Pick,
}

impl Target {
    pub fn css(selector: impl Into<String>) -> Self {
        Self::from(Locator::Css(selector.into()))
    }

    pub fn test_id(id: impl Into<String>) -> Self {
        Self::from(Locator::TestId(id.into()))
    }

    pub fn xpath(query: impl Into<String>) -> Self {
        Self::from(Locator::XPath(query.into()))
    }

    pub fn role(role: impl Into<String>, name: impl Into<String>) -> Self {
        Self::from(Locator::Role {
            role: role.into(),
            name: name.into(),
        })
    }

    pub fn last(mut self) -> Self {
        self.pick = Pick::Last;
        self
    }

    /// CSS selector for this target, if it has one
    pub fn css_selector(&self) -> Option<String> {
        match &self.locator {
            Locator::Css(sel) => Some(sel.clone()),
            Locator::TestId(id) => Some(format!("[data-testid=\"{}\"]", id)),
            _ => None,
        }
    }

    /// XPath query for this target; every locator kind can be expressed this way
    pub fn xpath_query(&self) -> Option<String> {
        match &self.locator {
            Locator::XPath(query) => Some(query.clone()),
            Locator::Role { role, name } => {
                let name = xpath_literal(name);
                let implicit = match role.as_str() {
                    "button" => "self::button or ",
                    "heading" => "self::h1 or self::h2 or self::h3 or self::h4 or ",
                    "link" => "self::a or ",
                    _ => "",
                };
                Some(format!(
                    "//*[{implicit}@role={role}][normalize-space(string(.))={name} or @aria-label={name}]",
                    implicit = implicit,
                    role = xpath_literal(role),
                    name = name,
                ))
            }
            _ => None,
        }
    }
}

impl From<Locator> for Target {
    fn from(locator: Locator) -> Self {
        Self {
            locator,
            pick: Pick::First,
        }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pick = match self.pick {
            Pick::First => "first",
            Pick::Last => "last",
        };
        match &self.locator {
            Locator::Css(sel) => write!(f, "css={} ({})", sel, pick),
            Locator::TestId(id) => write!(f, "test-id={} ({})", id, pick),
            Locator::XPath(q) => write!(f, "xpath={} ({})", q, pick),
            Locator::Role { role, name } => write!(f, "role={}[name=\"{}\"] ({})", role, name, pick),
        }
    }
}

/// Quote a string for use inside an XPath expression
pub fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        format!("'{}'", value)
    } else if !value.contains('"') {
        format!("\"{}\"", value)
    } else {
        let parts: Vec<String> = value.split('\'').map(|p| format!("'{}'", p)).collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

/// Element state a page object can wait for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementState {
    Visible,
    Hidden,
}

/// Blocking browser collaborator the page objects drive.
///
/// Implementations resolve a [`Target`] to a single element for actions (using
/// its [`Pick`]) and to every match for [`PageDriver::outer_html_all`].
/// Actions (`click`, `fill`, `type_text`) wait up to the driver's action
/// timeout for their target to be attached, then fail. Reads do not wait.
pub trait PageDriver {
    /// Navigate and wait for the load event
    fn goto(&self, url: &str) -> Result<()>;

    fn click(&self, target: &Target) -> Result<()>;

    /// Replace the value of an input
    fn fill(&self, target: &Target, text: &str) -> Result<()>;

    /// Type into an input without clearing it first
    fn type_text(&self, target: &Target, text: &str) -> Result<()>;

    fn text_content(&self, target: &Target) -> Result<String>;

    /// Outer HTML of every element matching the target, in document order
    fn outer_html_all(&self, target: &Target) -> Result<Vec<String>>;

    fn count(&self, target: &Target) -> Result<usize>;

    /// False when nothing matches
    fn is_visible(&self, target: &Target) -> Result<bool>;

    fn is_hidden(&self, target: &Target) -> Result<bool> {
        Ok(!self.is_visible(target)?)
    }

    /// Block until the target reaches `state`, failing after `timeout`
    fn wait_for(&self, target: &Target, state: ElementState, timeout: Duration) -> Result<()> {
        wait_until(timeout, || match state {
            ElementState::Visible => self.is_visible(target),
            ElementState::Hidden => self.is_hidden(target),
        })
        .with_context(|| format!("Timed out waiting for {} to be {:?}", target, state))
    }
}
