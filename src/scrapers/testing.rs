//! Fixture-backed sessions for tests. No network, no browser.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use scraper::Html;

use crate::error::{Result, ScrapeError};
use crate::scrapers::selectors::parse_selector;
use crate::scrapers::traits::{PageSession, SessionSource};

/// A fixture page. `frames` are what the page shows, one per read, after a
/// click; the last frame then sticks.
#[derive(Debug, Clone, Default)]
pub struct FakePage {
    html: String,
    frames: Vec<String>,
}

impl FakePage {
    pub fn new(html: &str) -> Self {
        Self {
            html: html.to_string(),
            frames: Vec::new(),
        }
    }

    pub fn with_frames(mut self, frames: &[&str]) -> Self {
        self.frames = frames.iter().map(|f| f.to_string()).collect();
        self
    }
}

#[derive(Default)]
struct SiteState {
    pages: Mutex<HashMap<String, FakePage>>,
    visited: Mutex<Vec<String>>,
    clicks: Mutex<Vec<String>>,
    opened: AtomicUsize,
    live: AtomicUsize,
    wait_calls: AtomicUsize,
}

#[derive(Clone, Default)]
pub struct FakeSite {
    state: Arc<SiteState>,
}

impl FakeSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, url: &str, page: FakePage) -> Self {
        self.state.pages.lock().unwrap().insert(url.to_string(), page);
        self
    }

    pub fn visited(&self) -> Vec<String> {
        self.state.visited.lock().unwrap().clone()
    }

    pub fn clicks(&self) -> Vec<String> {
        self.state.clicks.lock().unwrap().clone()
    }

    pub fn sessions_opened(&self) -> usize {
        self.state.opened.load(Ordering::SeqCst)
    }

    /// Sessions handed out and not yet dropped
    pub fn live_sessions(&self) -> usize {
        self.state.live.load(Ordering::SeqCst)
    }

    pub fn wait_calls(&self) -> usize {
        self.state.wait_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionSource for FakeSite {
    type Session = FakeSession;

    async fn session(&self) -> Result<FakeSession> {
        self.state.opened.fetch_add(1, Ordering::SeqCst);
        self.state.live.fetch_add(1, Ordering::SeqCst);
        Ok(FakeSession {
            state: Arc::clone(&self.state),
            page: Mutex::new(FakePage::default()),
            pending: Mutex::new(VecDeque::new()),
        })
    }

    fn source_name(&self) -> &'static str {
        "fake"
    }
}

pub struct FakeSession {
    state: Arc<SiteState>,
    page: Mutex<FakePage>,
    pending: Mutex<VecDeque<String>>,
}

impl FakeSession {
    fn current(&self) -> String {
        let pending = self.pending.lock().unwrap();
        match pending.front() {
            Some(frame) => frame.clone(),
            None => self.page.lock().unwrap().html.clone(),
        }
    }

    fn has(&self, selector: &str) -> Result<bool> {
        let selector = parse_selector(selector)?;
        let document = Html::parse_document(&self.current());
        let found = document.select(&selector).next().is_some();
        Ok(found)
    }
}

#[async_trait]
impl PageSession for FakeSession {
    async fn open(&self, url: &str) -> Result<()> {
        self.state.visited.lock().unwrap().push(url.to_string());
        let page = self
            .state
            .pages
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| ScrapeError::Browser(format!("no fixture for {}", url)))?;
        *self.page.lock().unwrap() = page;
        self.pending.lock().unwrap().clear();
        Ok(())
    }

    async fn wait_for(&self, selector: &str, _timeout: Duration) -> Result<bool> {
        self.state.wait_calls.fetch_add(1, Ordering::SeqCst);
        self.has(selector)
    }

    async fn click(&self, selector: &str) -> Result<()> {
        if !self.has(selector)? {
            return Err(ScrapeError::Browser(format!("no element matches {}", selector)));
        }
        self.state.clicks.lock().unwrap().push(selector.to_string());
        let frames = self.page.lock().unwrap().frames.clone();
        *self.pending.lock().unwrap() = frames.into();
        Ok(())
    }

    async fn scroll_to(&self, _y: u32) -> Result<()> {
        Ok(())
    }

    async fn content(&self) -> Result<String> {
        let mut pending = self.pending.lock().unwrap();
        if pending.len() > 1 {
            if let Some(frame) = pending.pop_front() {
                return Ok(frame);
            }
        }
        match pending.front() {
            Some(frame) => Ok(frame.clone()),
            None => Ok(self.page.lock().unwrap().html.clone()),
        }
    }
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        self.state.live.fetch_sub(1, Ordering::SeqCst);
    }
}
