use super::traits::{PageDriver, Pick, Target};
use anyhow::{anyhow, Context, Result};
use headless_chrome::{Browser, Element, LaunchOptions, Tab};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// [`PageDriver`] backed by a headless Chrome tab
pub struct ChromePage {
    // Dropping the browser closes the tab
    _browser: Browser,
    tab: Arc<Tab>,
}

impl ChromePage {
    /// Launch Chrome and open a fresh tab.
    ///
    /// `action_timeout` bounds how long click/fill/type wait for their target
    /// to be attached.
    pub fn launch(headless: bool, action_timeout: Duration) -> Result<Self> {
        info!("Launching Chrome (headless: {})...", headless);

        let options = LaunchOptions::default_builder()
            .headless(headless)
            .window_size(Some((1440, 900)))
            .build()
            .context("Failed to build launch options")?;

        let browser = Browser::new(options).context("Failed to launch Chrome browser")?;
        let tab = browser.new_tab().context("Failed to open a browser tab")?;
        tab.set_default_timeout(action_timeout);

        Ok(Self {
            _browser: browser,
            tab,
        })
    }

    /// JS expression evaluating to the array of nodes matching `target`
    fn nodes_expression(target: &Target) -> Result<String> {
        if let Some(css) = target.css_selector() {
            return Ok(format!(
                "Array.from(document.querySelectorAll({}))",
                serde_json::to_string(&css)?
            ));
        }
        let query = target
            .xpath_query()
            .ok_or_else(|| anyhow!("No selector for {}", target))?;
        Ok(format!(
            "(() => {{ const r = document.evaluate({}, document, null, \
             XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); const out = []; \
             for (let i = 0; i < r.snapshotLength; i++) out.push(r.snapshotItem(i)); \
             return out; }})()",
            serde_json::to_string(&query)?
        ))
    }

    /// Run `body` in the page with `nodes` (all matches) and `el` (the picked one)
    /// in scope; `body` must `return` a JSON-serialisable value.
    fn query<T: DeserializeOwned>(&self, target: &Target, body: &str) -> Result<T> {
        let index = match target.pick {
            Pick::First => "0",
            Pick::Last => "nodes.length - 1",
        };
        let script = format!(
            "(() => {{ const nodes = {nodes}; const el = nodes.length ? nodes[{index}] : null; \
             return JSON.stringify((() => {{ {body} }})()); }})()",
            nodes = Self::nodes_expression(target)?,
            index = index,
            body = body,
        );

        let result = self
            .tab
            .evaluate(&script, false)
            .with_context(|| format!("Failed to query {}", target))?;
        let raw = result
            .value
            .as_ref()
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow!("Query for {} returned no value", target))?;
        serde_json::from_str(raw).with_context(|| format!("Unexpected query result for {}: {}", target, raw))
    }

    /// Wait (up to the tab's default timeout) for `target` and pick one match
    fn element(&self, target: &Target) -> Result<Element<'_>> {
        let mut elements = if let Some(css) = target.css_selector() {
            self.tab.wait_for_elements(&css)
        } else {
            let query = target
                .xpath_query()
                .ok_or_else(|| anyhow!("No selector for {}", target))?;
            self.tab.wait_for_elements_by_xpath(&query)
        }
        .with_context(|| format!("Timed out waiting for {}", target))?;

        let picked = match target.pick {
            Pick::First => {
                if elements.is_empty() {
                    None
                } else {
                    Some(elements.remove(0))
                }
            }
            Pick::Last => elements.pop(),
        };
        picked.ok_or_else(|| anyhow!("No element matches {}", target))
    }
}

impl PageDriver for ChromePage {
    fn goto(&self, url: &str) -> Result<()> {
        debug!("Navigating to {}", url);
        self.tab
            .navigate_to(url)
            .with_context(|| format!("Failed to navigate to {}", url))?;
        self.tab
            .wait_until_navigated()
            .with_context(|| format!("Page {} did not finish loading", url))?;
        Ok(())
    }

    fn click(&self, target: &Target) -> Result<()> {
        debug!("Clicking {}", target);
        self.element(target)?
            .click()
            .with_context(|| format!("Failed to click {}", target))?;
        Ok(())
    }

    fn fill(&self, target: &Target, text: &str) -> Result<()> {
        let element = self.element(target)?;
        element
            .call_js_fn(
                "function() { this.value = ''; this.dispatchEvent(new Event('input', { bubbles: true })); }",
                vec![],
                false,
            )
            .with_context(|| format!("Failed to clear {}", target))?;
        element
            .type_into(text)
            .with_context(|| format!("Failed to fill {}", target))?;
        Ok(())
    }

    fn type_text(&self, target: &Target, text: &str) -> Result<()> {
        self.element(target)?
            .type_into(text)
            .with_context(|| format!("Failed to type into {}", target))?;
        Ok(())
    }

    fn text_content(&self, target: &Target) -> Result<String> {
        let text: Option<String> = self.query(target, "return el ? el.textContent : null;")?;
        text.ok_or_else(|| anyhow!("No element matches {}", target))
    }

    fn outer_html_all(&self, target: &Target) -> Result<Vec<String>> {
        self.query(target, "return nodes.map(n => n.outerHTML);")
    }

    fn count(&self, target: &Target) -> Result<usize> {
        self.query(target, "return nodes.length;")
    }

    fn is_visible(&self, target: &Target) -> Result<bool> {
        self.query(
            target,
            "if (!el) return false; \
             const r = el.getBoundingClientRect(); const s = getComputedStyle(el); \
             return r.width > 0 && r.height > 0 && s.visibility !== 'hidden' && s.display !== 'none';",
        )
    }
}
