use reqwest::Url;
use scraper::Html;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::error::{Result, ScrapeError};
use crate::scrapers::extract::{first_number, listing_blocks, ListingBlock};
use crate::scrapers::selectors::CompiledLayout;
use crate::scrapers::traits::{PageSession, SessionSource};
use crate::scrapers::types::{ScrapeSettings, ScrollPolicy, SearchParams};
use crate::scrapers::wait::{settle, wait_with_retry, Settled};

/// The site shows this many restaurants per results page
pub const RESULTS_PER_PAGE: u64 = 100;

/// Number of results pages for `total` restaurants
pub fn page_count(total: u64) -> u64 {
    total.div_ceil(RESULTS_PER_PAGE)
}

/// Search-results URL for one page (1-based)
pub fn search_url(params: &SearchParams, page: u64) -> Result<String> {
    let root = format!("{}/s", params.base_url);
    let mut url = Url::parse(&root).map_err(|e| ScrapeError::InvalidUrl {
        url: root.clone(),
        reason: e.to_string(),
    })?;

    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("dateTime", &format!("{}T{}:00", params.date.format("%Y-%m-%d"), params.time))
            .append_pair("covers", &params.covers.to_string())
            .append_pair("metroId", &params.metro_id.to_string())
            .append_pair("regionIds[]", &params.region.region_id().to_string())
            .append_pair("term", "");
        if let Some(sort_by) = &params.sort_by {
            query.append_pair("sortBy", sort_by);
        }
        query.append_pair("page", &page.to_string());
    }

    Ok(url.into())
}

/// Resolve a possibly relative link against the site root
pub fn absolute_url(base_url: &str, href: &str) -> String {
    Url::parse(base_url)
        .and_then(|base| base.join(href))
        .map(String::from)
        .unwrap_or_else(|_| href.to_string())
}

/// Read the total result count from the results header.
///
/// A missing or numberless header means the page layout moved, not that
/// there are zero results.
pub fn parse_total_count(html: &str, layout: &CompiledLayout, url: &str) -> Result<u64> {
    let document = Html::parse_document(html);
    let anchor = &layout.layout.total_count;

    let header = document
        .select(&layout.total_count)
        .next()
        .ok_or_else(|| ScrapeError::PageStructureChanged {
            url: url.to_string(),
            anchor: anchor.clone(),
        })?;

    let text = header.text().collect::<String>();
    first_number(&text).ok_or_else(|| ScrapeError::PageStructureChanged {
        url: url.to_string(),
        anchor: format!("{} (no count in '{}')", anchor, text.trim()),
    })
}

/// Scroll down in fixed steps so lazily rendered cards get loaded
pub async fn scroll_to_load<S>(session: &S, policy: &ScrollPolicy) -> Result<()>
where
    S: PageSession + ?Sized,
{
    let mut y = policy.step_px;
    for _ in 0..policy.steps {
        session.scroll_to(y).await?;
        y = y.saturating_add(policy.step_px);
        sleep(std::time::Duration::from_millis(policy.delay_ms)).await;
    }
    Ok(())
}

/// Walks the results pages of one search
pub struct ResultsPaginator<'a, S> {
    source: &'a S,
    params: SearchParams,
    settings: &'a ScrapeSettings,
    layout: &'a CompiledLayout,
}

impl<'a, S: SessionSource> ResultsPaginator<'a, S> {
    pub fn new(
        source: &'a S,
        params: SearchParams,
        settings: &'a ScrapeSettings,
        layout: &'a CompiledLayout,
    ) -> Self {
        Self {
            source,
            params,
            settings,
            layout,
        }
    }

    /// Open the first page and work out how many pages there are
    pub async fn page_count(&self) -> Result<u64> {
        let url = search_url(&self.params, 1)?;
        info!("Opening results front page for {}...", self.params.region);
        let session = self.source.open_page(&url).await?;

        if !wait_with_retry(&session, &self.layout.layout.total_count, self.settings).await? {
            warn!("Results header never appeared on {}", url);
        }
        let html = session.content().await?;
        let total = parse_total_count(&html, self.layout, &url)?;
        let pages = page_count(total);

        info!("{} restaurants over {} results pages", total, pages);
        Ok(pages)
    }

    /// Load one results page and return its cards in page order
    pub async fn fetch_page(&self, page: u64) -> Result<Vec<ListingBlock>> {
        let url = search_url(&self.params, page)?;
        debug!("Results page {}: {}", page, url);
        let session = self.source.open_page(&url).await?;

        scroll_to_load(&session, &self.settings.scroll).await?;

        let layout = self.layout;
        let count = |html: &str| {
            let document = Html::parse_document(html);
            document.select(&layout.listing_block).count()
        };
        match settle(&session, &self.settings.quiescence, count, |_| true).await? {
            Settled::Stable(n) => debug!("{} cards settled on page {}", n, page),
            Settled::Unsettled(n) => warn!("Page {} still loading cards ({} so far); reading anyway", page, n),
        }

        let html = session.content().await?;
        let blocks = listing_blocks(&html, self.layout);
        info!("Found {} restaurants on results page {}", blocks.len(), page);
        Ok(blocks)
    }
}
