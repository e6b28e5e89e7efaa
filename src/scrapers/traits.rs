use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// One live page: a browser tab, or a fetched document for plain HTTP.
///
/// Implementations release their resources on drop, so a session going out
/// of scope on any path (including `?` and timeouts) closes it.
#[async_trait]
pub trait PageSession: Send + Sync {
    /// Navigate to `url` and wait for the initial load
    async fn open(&self, url: &str) -> Result<()>;

    /// Wait up to `timeout` for `selector` to match.
    /// `Ok(false)` means it never appeared; `Err` is reserved for transport failures.
    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<bool>;

    /// Click the first element matching `selector`
    async fn click(&self, selector: &str) -> Result<()>;

    /// Scroll the viewport to vertical offset `y`
    async fn scroll_to(&self, y: u32) -> Result<()>;

    /// Current rendered markup
    async fn content(&self) -> Result<String>;
}

/// Hands out fresh sessions, one per unit of work
#[async_trait]
pub trait SessionSource: Send + Sync {
    type Session: PageSession;

    async fn session(&self) -> Result<Self::Session>;

    /// Name of the fetching strategy, for logs
    fn source_name(&self) -> &'static str;

    /// Open a new session already navigated to `url`
    async fn open_page(&self, url: &str) -> Result<Self::Session> {
        let session = self.session().await?;
        session.open(url).await?;
        Ok(session)
    }
}
