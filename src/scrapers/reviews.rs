use chrono::NaiveDate;
use scraper::Html;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::models::EarliestReview;
use crate::scrapers::selectors::CompiledLayout;
use crate::scrapers::traits::{PageSession, SessionSource};
use crate::scrapers::types::ScrapeSettings;
use crate::scrapers::wait::{settle, wait_with_retry, Settled};

/// Date strings of every review entry currently rendered, in feed order
pub fn review_dates(html: &str, layout: &CompiledLayout) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(&layout.review_entry)
        .filter_map(|entry| entry.select(&layout.review_date).next())
        .map(|date| date.text().collect::<String>().trim().to_string())
        .filter(|date| !date.is_empty())
        .collect()
}

/// Calendar date out of "Dined on March 3, 2021" and similar
pub fn parse_review_date(text: &str) -> Option<NaiveDate> {
    let date = text.rsplit_once(" on ").map_or(text, |(_, date)| date).trim();
    ["%B %d, %Y", "%b %d, %Y"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(date, format).ok())
}

/// The oldest entry: smallest parseable date, else the last entry of a newest-first feed
pub fn earliest_entry(dates: &[String]) -> Option<String> {
    let oldest = dates
        .iter()
        .filter_map(|text| parse_review_date(text).map(|date| (date, text)))
        .fold(None, |oldest: Option<(NaiveDate, &String)>, (date, text)| match oldest {
            Some((best, _)) if best < date => oldest,
            _ => Some((date, text)),
        });

    oldest
        .map(|(_, text)| text.clone())
        .or_else(|| dates.last().cloned())
}

fn outcome(dates: &[String], settled: bool) -> EarliestReview {
    match earliest_entry(dates) {
        None => EarliestReview::Empty,
        Some(date) if settled => EarliestReview::Found(date),
        Some(date) => EarliestReview::Uncertain(date),
    }
}

/// Find the date of a restaurant's first ever review.
///
/// Goes to the last page of the review feed and reads its oldest entry. The
/// feed is only trusted once it has changed from what was shown before the
/// click and then held still across two samples; otherwise the answer comes
/// back as [`EarliestReview::Uncertain`].
pub async fn earliest_review<S>(
    source: &S,
    url: &str,
    settings: &ScrapeSettings,
    layout: &CompiledLayout,
) -> Result<EarliestReview>
where
    S: SessionSource,
{
    info!("Looking up earliest review on {}", url);
    let session = source.open_page(url).await?;
    let selectors = &layout.layout;

    if !wait_with_retry(&session, &selectors.reviews_section, settings).await? {
        info!("No reviews section on page");
        return Ok(EarliestReview::NotFound);
    }

    let dates = |html: &str| review_dates(html, layout);

    if !wait_with_retry(&session, &selectors.review_pagination, settings).await? {
        debug!("Single page of reviews");
        let feed = settle(&session, &settings.quiescence, dates, |_| true).await?;
        let settled = feed.is_stable();
        return Ok(outcome(&feed.into_inner(), settled));
    }

    let before = dates(&session.content().await?);

    if let Err(err) = session.click(&selectors.last_page_button).await {
        warn!("Could not jump to the last review page: {}", err);
        return Ok(outcome(&before, false));
    }

    let feed = settle(&session, &settings.quiescence, dates, |current: &Vec<String>| {
        !current.is_empty() && *current != before
    })
    .await?;

    match feed {
        Settled::Stable(last_page) => Ok(outcome(&last_page, true)),
        Settled::Unsettled(last_seen) => {
            warn!("Review feed did not settle on a new page; result may be from the wrong page");
            Ok(outcome(&last_seen, false))
        }
    }
}
