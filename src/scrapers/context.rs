use std::path::PathBuf;

use chrono::NaiveDate;

use crate::models::Region;
use crate::scrapers::results::ResultsPaginator;
use crate::scrapers::selectors::CompiledLayout;
use crate::scrapers::traits::SessionSource;
use crate::scrapers::types::{ScrapeSettings, SearchParams};

/// What every workflow needs besides its own arguments
pub struct ScrapeContext {
    pub base_url: String,
    pub metro_id: u32,
    pub output_dir: PathBuf,
    pub settings: ScrapeSettings,
    pub layout: CompiledLayout,
}

impl ScrapeContext {
    pub fn search(&self, region: Region, date: NaiveDate) -> SearchParams {
        SearchParams::new(&self.base_url, self.metro_id, region, date)
    }

    pub fn paginator<'a, S: SessionSource>(
        &'a self,
        source: &'a S,
        params: SearchParams,
    ) -> ResultsPaginator<'a, S> {
        ResultsPaginator::new(source, params, &self.settings, &self.layout)
    }
}

#[cfg(test)]
impl ScrapeContext {
    pub fn for_tests(output_dir: PathBuf) -> Self {
        use crate::scrapers::selectors::SiteLayout;

        Self {
            base_url: "https://example.com".to_string(),
            metro_id: 8,
            output_dir,
            settings: ScrapeSettings::instant(),
            layout: CompiledLayout::compile(SiteLayout::default()).unwrap(),
        }
    }
}
