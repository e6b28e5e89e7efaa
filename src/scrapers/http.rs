use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::Html;
use tracing::{debug, warn};

use crate::error::{Result, ScrapeError};
use crate::scrapers::selectors::parse_selector;
use crate::scrapers::traits::{PageSession, SessionSource};

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Plain HTTP fetching: no script execution, so lazy-loaded and clicked-in
/// content never appears. Good enough for server-rendered detail pages.
pub struct HttpSessions {
    client: Client,
}

impl HttpSessions {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl SessionSource for HttpSessions {
    type Session = HttpSession;

    async fn session(&self) -> Result<HttpSession> {
        Ok(HttpSession {
            client: self.client.clone(),
            body: Mutex::new(None),
        })
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}

pub struct HttpSession {
    client: Client,
    body: Mutex<Option<String>>,
}

impl HttpSession {
    fn body(&self) -> String {
        match self.body.lock() {
            Ok(body) => body.clone().unwrap_or_default(),
            Err(poisoned) => poisoned.into_inner().clone().unwrap_or_default(),
        }
    }
}

#[async_trait]
impl PageSession for HttpSession {
    async fn open(&self, url: &str) -> Result<()> {
        debug!("Fetching URL: {}", url);

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            warn!("{} returned status: {}", url, response.status());
        }
        let html = response.error_for_status()?.text().await?;
        debug!("Downloaded {} bytes of HTML", html.len());

        match self.body.lock() {
            Ok(mut body) => *body = Some(html),
            Err(poisoned) => *poisoned.into_inner() = Some(html),
        }
        Ok(())
    }

    async fn wait_for(&self, selector: &str, _timeout: Duration) -> Result<bool> {
        // Nothing will load later, so one look decides it
        let selector = parse_selector(selector)?;
        let document = Html::parse_document(&self.body());
        let found = document.select(&selector).next().is_some();
        Ok(found)
    }

    async fn click(&self, _selector: &str) -> Result<()> {
        Err(ScrapeError::Unsupported("click over plain HTTP"))
    }

    async fn scroll_to(&self, _y: u32) -> Result<()> {
        Ok(())
    }

    async fn content(&self) -> Result<String> {
        Ok(self.body())
    }
}
