use std::path::PathBuf;

use chrono::{Duration, NaiveDate};
use tracing::{debug, info};

use crate::error::Result;
use crate::models::{BookingRecord, Region};
use crate::output::write_csv_file;
use crate::scrapers::context::ScrapeContext;
use crate::scrapers::results::absolute_url;
use crate::scrapers::traits::SessionSource;

pub fn bookings_file_name(region: Region, today: NaiveDate) -> String {
    format!("bookings_{}_{}.csv", region, today.format("%Y-%m-%d"))
}

/// Tally today's "Booked N times" badges for every restaurant in `region`.
///
/// Searches tomorrow evening, when every listed restaurant shows its
/// counter, and writes `bookings_<region>_<today>.csv`.
pub async fn collect_bookings<S>(
    source: &S,
    ctx: &ScrapeContext,
    region: Region,
    today: NaiveDate,
) -> Result<PathBuf>
where
    S: SessionSource,
{
    let tomorrow = today + Duration::days(1);
    let params = ctx.search(region, tomorrow).at("22:00");
    let paginator = ctx.paginator(source, params);

    info!("📅 Collecting {} bookings for {} via {}", region, today, source.source_name());
    let pages = paginator.page_count().await?;

    let mut records = Vec::new();
    for page in 1..=pages {
        for block in paginator.fetch_page(page).await? {
            let Some(href) = block.url else {
                debug!("Skipping card without a link on page {}", page);
                continue;
            };
            records.push(BookingRecord {
                url: absolute_url(&ctx.base_url, &href),
                date: today,
                booked: block.booked_today,
            });
        }
    }

    let path = ctx.output_dir.join(bookings_file_name(region, today));
    write_csv_file(&path, &BookingRecord::columns(today), &records)?;
    info!("✅ {} restaurants tallied for {}", records.len(), region);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::parse_date;
    use crate::scrapers::extract::fixtures::{listing, non_member_listing, results_page};
    use crate::scrapers::results::search_url;
    use crate::scrapers::testing::{FakePage, FakeSite};

    fn temp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("table-scout-{}-{}", name, std::process::id()))
    }

    #[test]
    fn file_name_uses_region_and_today() {
        let today = parse_date("2026-10-16").unwrap();
        assert_eq!(bookings_file_name(Region::StatenIsland, today), "bookings_staten_island_2026-10-16.csv");
    }

    #[tokio::test]
    async fn writes_one_row_per_restaurant_across_pages() {
        let dir = temp_dir("bookings");
        let ctx = ScrapeContext::for_tests(dir.clone());
        let today = parse_date("2026-10-16").unwrap();
        let params = ctx.search(Region::Queens, parse_date("2026-10-17").unwrap()).at("22:00");

        let page_one = results_page(
            Some("101 restaurants"),
            &[
                listing("Dhamaka", "/r/dhamaka", false, Some(12)),
                non_member_listing("Corner Deli", "/r/deli"),
            ],
        );
        let page_two = results_page(Some("101 restaurants"), &[listing("Adda", "/r/adda", true, Some(3))]);
        let site = FakeSite::new()
            .with_page(&search_url(&params, 1).unwrap(), FakePage::new(&page_one))
            .with_page(&search_url(&params, 2).unwrap(), FakePage::new(&page_two));

        let path = collect_bookings(&site, &ctx, Region::Queens, today).await.unwrap();

        assert_eq!(path, dir.join("bookings_queens_2026-10-16.csv"));
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text.lines().collect::<Vec<_>>(),
            vec![
                "url,2026-10-16",
                "https://example.com/r/dhamaka,12",
                "https://example.com/r/deli,0",
                "https://example.com/r/adda,3",
            ]
        );
        assert_eq!(site.live_sessions(), 0);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
