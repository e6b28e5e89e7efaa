use std::path::PathBuf;

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::error::Result;
use crate::models::{Region, RestaurantRecord, RESTAURANT_COLUMNS};
use crate::output::write_csv_file;
use crate::scrapers::context::ScrapeContext;
use crate::scrapers::extract::{detail_fields, ListingBlock};
use crate::scrapers::results::absolute_url;
use crate::scrapers::traits::{PageSession, SessionSource};
use crate::scrapers::wait::settle;

pub fn listing_file_name(date: NaiveDate, region: Region, page: u64) -> String {
    format!("{}_{}_page{}.csv", date.format("%Y-%m-%d"), region, page)
}

/// Scrape every restaurant listed for `region` on `date`, one CSV per results page.
///
/// `starting_page` resumes an interrupted run; earlier pages are not revisited.
pub async fn scrape_listings<S>(
    source: &S,
    ctx: &ScrapeContext,
    region: Region,
    date: NaiveDate,
    starting_page: u64,
) -> Result<Vec<PathBuf>>
where
    S: SessionSource,
{
    let params = ctx.search(region, date).at("20:00").sorted_by("newest_arrivals");
    let paginator = ctx.paginator(source, params);

    let pages = paginator.page_count().await?;
    let first = starting_page.max(1);
    if first > pages {
        warn!("Starting page {} is past the last page ({})", first, pages);
    }

    let mut written = Vec::new();
    for page in first..=pages {
        let blocks = paginator.fetch_page(page).await?;

        let mut records = Vec::with_capacity(blocks.len());
        for block in &blocks {
            let record = scrape_restaurant(source, ctx, block).await;
            info!("  {}", record.name.as_deref().unwrap_or("(unnamed)"));
            records.push(record);
        }

        let path = ctx.output_dir.join(listing_file_name(date, region, page));
        write_csv_file(&path, &RESTAURANT_COLUMNS, &records)?;
        info!("📄 Exported page {} of {}", page, pages);
        written.push(path);
    }

    Ok(written)
}

/// Build the full record for one card, visiting its detail page when the
/// restaurant is bookable on the site. A detail page that fails to load
/// leaves the detail fields absent.
pub async fn scrape_restaurant<S>(source: &S, ctx: &ScrapeContext, block: &ListingBlock) -> RestaurantRecord
where
    S: SessionSource,
{
    let mut record = block.record();
    record.url = block.url.as_deref().map(|href| absolute_url(&ctx.base_url, href));

    let Some(url) = record.url.clone().filter(|_| block.is_member) else {
        return record;
    };

    match detail_page(source, ctx, &url).await {
        Ok(html) => record.with_details(detail_fields(&html, &ctx.layout)),
        Err(err) => {
            warn!("Could not load detail page {}: {}", url, err);
            record
        }
    }
}

async fn detail_page<S: SessionSource>(source: &S, ctx: &ScrapeContext, url: &str) -> Result<String> {
    let session = source.open_page(url).await?;
    settle(&session, &ctx.settings.quiescence, |html| html.len(), |_| true).await?;
    session.content().await
}
