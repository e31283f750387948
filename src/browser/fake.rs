//! Scripted in-memory page used by unit tests

use super::traits::{PageDriver, Target};
use super::wait_until;
use crate::pages::results::{CARD_SELECTOR, NEXT_DISABLED_SELECTOR, NEXT_SELECTOR};
use anyhow::{anyhow, bail, Result};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::time::Duration;

/// How long fake actions wait for a late target
const ACTION_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Default)]
pub struct FakePage {
    /// Card markup per result page
    result_pages: Vec<Vec<String>>,
    current: Cell<usize>,
    /// Clicking "next" on this page index fails
    next_fails_on: Option<usize>,
    /// "Next" stays enabled and wraps around to the first page
    next_never_disabled: bool,
    /// Neither the "next" link nor its disabled variant is rendered
    no_pagination: bool,
    /// Targets that only attach after this many lookups
    attach_after: RefCell<HashMap<String, usize>>,
    texts: RefCell<HashMap<String, String>>,
    visible: RefCell<HashMap<String, bool>>,
    /// Visibility changes applied after clicking a target
    on_click: HashMap<String, Vec<(String, bool)>>,
    actions: RefCell<Vec<String>>,
}

fn key(target: &Target) -> String {
    target.to_string()
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_result_pages(mut self, pages: Vec<Vec<String>>) -> Self {
        self.result_pages = pages;
        self
    }

    pub fn failing_next_on(mut self, page_index: usize) -> Self {
        self.next_fails_on = Some(page_index);
        self
    }

    pub fn never_disabling_next(mut self) -> Self {
        self.next_never_disabled = true;
        self
    }

    pub fn without_pagination(mut self) -> Self {
        self.no_pagination = true;
        self
    }

    /// `target` is missing for the first `lookups` checks, like a control that
    /// renders after an animation
    pub fn attaching_after(self, target: &Target, lookups: usize) -> Self {
        self.attach_after.borrow_mut().insert(key(target), lookups);
        self
    }

    pub fn with_text(self, target: &Target, text: &str) -> Self {
        self.texts.borrow_mut().insert(key(target), text.to_string());
        self
    }

    pub fn with_visible(self, target: &Target) -> Self {
        self.visible.borrow_mut().insert(key(target), true);
        self
    }

    pub fn showing_after_click(mut self, clicked: &Target, shown: &Target) -> Self {
        self.on_click
            .entry(key(clicked))
            .or_default()
            .push((key(shown), true));
        self
    }

    pub fn actions(&self) -> Vec<String> {
        self.actions.borrow().clone()
    }

    fn record(&self, action: String) {
        self.actions.borrow_mut().push(action);
    }

    fn current_cards(&self) -> Vec<String> {
        self.result_pages
            .get(self.current.get())
            .cloned()
            .unwrap_or_default()
    }

    fn is_card_target(target: &Target) -> bool {
        target.css_selector().as_deref() == Some(CARD_SELECTOR)
    }

    fn is_attached(&self, target: &Target) -> bool {
        let mut pending = self.attach_after.borrow_mut();
        match pending.get_mut(&key(target)) {
            Some(left) if *left > 0 => {
                *left -= 1;
                false
            }
            _ => true,
        }
    }

    /// Wait for an action's target the way a real driver does
    fn resolve(&self, target: &Target) -> Result<()> {
        wait_until(ACTION_TIMEOUT, || Ok(self.is_attached(target)))
            .map_err(|e| e.context(format!("Timed out waiting for {}", target)))
    }
}

impl PageDriver for FakePage {
    fn goto(&self, url: &str) -> Result<()> {
        self.record(format!("goto {}", url));
        Ok(())
    }

    fn click(&self, target: &Target) -> Result<()> {
        if target.css_selector().as_deref() == Some(NEXT_SELECTOR) && self.no_pagination {
            bail!("No element matches {}", target);
        }
        self.resolve(target)?;
        if target.css_selector().as_deref() == Some(NEXT_SELECTOR) {
            let page = self.current.get();
            if self.next_fails_on == Some(page) {
                bail!("next button detached");
            }
            let next = page + 1;
            self.current.set(if next >= self.result_pages.len() { 0 } else { next });
        }
        self.record(format!("click {}", target));
        if let Some(effects) = self.on_click.get(&key(target)) {
            let mut visible = self.visible.borrow_mut();
            for (shown, state) in effects {
                visible.insert(shown.clone(), *state);
            }
        }
        Ok(())
    }

    fn fill(&self, target: &Target, text: &str) -> Result<()> {
        self.resolve(target)?;
        self.record(format!("fill {} {}", target, text));
        Ok(())
    }

    fn type_text(&self, target: &Target, text: &str) -> Result<()> {
        self.resolve(target)?;
        self.record(format!("type {} {}", target, text));
        Ok(())
    }

    fn text_content(&self, target: &Target) -> Result<String> {
        self.texts
            .borrow()
            .get(&key(target))
            .cloned()
            .ok_or_else(|| anyhow!("No element matches {}", target))
    }

    fn outer_html_all(&self, target: &Target) -> Result<Vec<String>> {
        if Self::is_card_target(target) {
            return Ok(self.current_cards());
        }
        Ok(Vec::new())
    }

    fn count(&self, target: &Target) -> Result<usize> {
        if target.css_selector().as_deref() == Some(NEXT_SELECTOR) {
            return Ok(if self.no_pagination { 0 } else { 1 });
        }
        Ok(self.outer_html_all(target)?.len())
    }

    fn is_visible(&self, target: &Target) -> Result<bool> {
        if Self::is_card_target(target) {
            return Ok(!self.current_cards().is_empty());
        }
        if target.css_selector().as_deref() == Some(NEXT_DISABLED_SELECTOR) {
            let last = self.current.get() + 1 >= self.result_pages.len();
            return Ok(last && !self.next_never_disabled && !self.no_pagination);
        }
        Ok(self.visible.borrow().get(&key(target)).copied().unwrap_or(false))
    }
}
