use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use headless_chrome::browser::tab::NoElementFound;
use headless_chrome::util::Timeout;
use headless_chrome::{Browser, LaunchOptions, Tab};
use tracing::{debug, info};

use crate::error::{Result, ScrapeError};
use crate::scrapers::traits::{PageSession, SessionSource};

/// Headless Chrome, one tab per session
pub struct ChromeSessions {
    browser: Browser,
}

impl ChromeSessions {
    /// Launch Chrome. `headless = false` shows the window, handy when a selector stops matching.
    pub fn launch(headless: bool) -> Result<Self> {
        info!("Launching {} Chrome...", if headless { "headless" } else { "headed" });

        // Wide window so the detail-page sidebar renders
        let options = LaunchOptions::default_builder()
            .headless(headless)
            .window_size(Some((1920, 1080)))
            .build()
            .map_err(ScrapeError::browser)?;

        let browser = Browser::new(options).map_err(ScrapeError::browser)?;

        Ok(Self { browser })
    }
}

#[async_trait]
impl SessionSource for ChromeSessions {
    type Session = ChromeSession;

    async fn session(&self) -> Result<ChromeSession> {
        let tab = self.browser.new_tab().map_err(ScrapeError::browser)?;
        Ok(ChromeSession { tab })
    }

    fn source_name(&self) -> &'static str {
        "chrome"
    }
}

pub struct ChromeSession {
    tab: Arc<Tab>,
}

/// Whether a wait error only means the element never showed up
fn is_absent(err: &anyhow::Error) -> bool {
    err.downcast_ref::<Timeout>().is_some() || err.downcast_ref::<NoElementFound>().is_some()
}

#[async_trait]
impl PageSession for ChromeSession {
    async fn open(&self, url: &str) -> Result<()> {
        debug!("Navigating to {}", url);
        self.tab
            .navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(ScrapeError::browser)?;
        Ok(())
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<bool> {
        match self.tab.wait_for_element_with_custom_timeout(selector, timeout) {
            Ok(_) => Ok(true),
            Err(err) if is_absent(&err) => {
                debug!("'{}' did not appear within {:?}: {}", selector, timeout, err);
                Ok(false)
            }
            Err(err) => Err(ScrapeError::browser(err)),
        }
    }

    async fn click(&self, selector: &str) -> Result<()> {
        let element = self.tab.find_element(selector).map_err(ScrapeError::browser)?;
        element.click().map_err(ScrapeError::browser)?;
        Ok(())
    }

    async fn scroll_to(&self, y: u32) -> Result<()> {
        self.tab
            .evaluate(&format!("window.scrollTo(0, {})", y), false)
            .map_err(ScrapeError::browser)?;
        Ok(())
    }

    async fn content(&self) -> Result<String> {
        self.tab.get_content().map_err(ScrapeError::browser)
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        if let Err(err) = self.tab.close(true) {
            debug!("Tab was already gone on close: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_timeouts_count_as_absent() {
        assert!(is_absent(&anyhow::Error::new(Timeout)));
        assert!(is_absent(&anyhow::Error::new(NoElementFound {})));
        assert!(!is_absent(&anyhow::anyhow!("Unable to make method calls because underlying connection is closed")));
    }
}
