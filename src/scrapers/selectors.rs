//! Where each field lives on the site.
//!
//! Everything here is data: CSS selectors, sidebar label rules and marker
//! strings. When the site reshuffles its markup, override the affected
//! entries in the config file instead of touching the extractors.

use scraper::Selector;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScrapeError};

pub fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| ScrapeError::Selector {
        selector: selector.to_string(),
        reason: format!("{:?}", e),
    })
}

/// How a sidebar label is recognised
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelMatch {
    Contains(String),
    ContainsIgnoreCase(String),
}

impl LabelMatch {
    pub fn matches(&self, label: &str) -> bool {
        match self {
            LabelMatch::Contains(needle) => label.contains(needle.as_str()),
            LabelMatch::ContainsIgnoreCase(needle) => {
                label.to_lowercase().contains(&needle.to_lowercase())
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SidebarField {
    Neighborhood,
    Cuisines,
    DiningStyle,
    DressCode,
    Chef,
    Tags,
}

/// Maps a sidebar label to a record field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidebarRule {
    pub label: LabelMatch,
    pub field: SidebarField,
}

impl SidebarRule {
    fn new(label: LabelMatch, field: SidebarField) -> Self {
        Self { label, field }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyFlag {
    Sanitizing,
    Distancing,
    Ppe,
    Screening,
}

/// Maps a safety-panel category label to a flag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyRule {
    pub category: String,
    pub flag: SafetyFlag,
}

/// CSS selectors and marker strings for the reservation site
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteLayout {
    // search results
    pub total_count: String,
    pub listing_block: String,
    pub listing_link: String,
    pub non_member_marker: String,
    pub booking_badge: String,
    pub booking_marker: String,

    // detail page
    pub overview_item: String,
    pub no_reviews_marker: String,
    pub overall_rating: String,
    pub sub_rating: String,
    pub noise_level: String,
    pub recommend_label: String,
    pub recommend_label_text: String,
    pub recommend_value: String,
    /// Index of the recommendation block among `recommend_value` matches
    pub recommend_value_index: usize,
    pub sidebar: String,
    pub sidebar_item: String,
    pub sidebar_label: String,
    pub sidebar_value: String,
    pub sidebar_rules: Vec<SidebarRule>,
    pub safety_panel: String,
    pub safety_item: String,
    pub safety_rules: Vec<SafetyRule>,

    // review feed
    pub reviews_section: String,
    pub review_pagination: String,
    pub last_page_button: String,
    pub review_entry: String,
    /// Relative to a review entry
    pub review_date: String,
}

impl Default for SiteLayout {
    fn default() -> Self {
        use LabelMatch::{Contains, ContainsIgnoreCase};
        use SidebarField::*;

        let safety = |category: &str, flag| SafetyRule {
            category: category.to_string(),
            flag,
        };

        Self {
            total_count: r#"h3[data-test="multi-search-total-count"]"#.to_string(),
            listing_block: "div._3uVfVbI1iLfMbszbU6KoOL".to_string(),
            listing_link: "a._1e9PcCDb012hY4BcGfraQB".to_string(),
            non_member_marker: "p._1RzTbFM0hmdDgWfT_RmXel".to_string(),
            booking_badge: "span._2VIffaVUDxw_-tEh-6XOB_._2EluNCOTdgGq9H4SxGZwUg".to_string(),
            booking_marker: "Booked".to_string(),

            overview_item: "div.c3981cf8._965a91d5 span".to_string(),
            no_reviews_marker: "No Reviews".to_string(),
            overall_rating: "div.oc-reviews-491257d8 span".to_string(),
            sub_rating: "div.oc-reviews-15d38b07".to_string(),
            noise_level: "span.oc-reviews-624ebf8b".to_string(),
            recommend_label: "div.oc-reviews-8c8e52a0 span.oc-reviews-624ebf8b".to_string(),
            recommend_label_text: "would recommend it to a friend".to_string(),
            recommend_value: "div.oc-reviews-dfc07aec".to_string(),
            recommend_value_index: 1,
            sidebar: "div._1e466fbf".to_string(),
            sidebar_item: "div.df8add00".to_string(),
            sidebar_label: "div.c3981cf8._965a91d5".to_string(),
            sidebar_value: "div.e7ff71b6.b2f6d1a4".to_string(),
            sidebar_rules: vec![
                SidebarRule::new(Contains("Neighborhood".into()), Neighborhood),
                SidebarRule::new(Contains("Cuisines".into()), Cuisines),
                SidebarRule::new(Contains("Dining Style".into()), DiningStyle),
                SidebarRule::new(Contains("Dress code".into()), DressCode),
                SidebarRule::new(ContainsIgnoreCase("chef".into()), Chef),
                SidebarRule::new(Contains("Additional".into()), Tags),
            ],
            safety_panel: "#safety-precautions".to_string(),
            safety_item: "div._77b505d0._965a91d5".to_string(),
            safety_rules: vec![
                safety("Cleaning & Sanitizing", SafetyFlag::Sanitizing),
                safety("Physical Distancing", SafetyFlag::Distancing),
                safety("Protective Equipment", SafetyFlag::Ppe),
                safety("Screening", SafetyFlag::Screening),
            ],

            reviews_section: "#reviews-results".to_string(),
            review_pagination: "#review-feed-pagination".to_string(),
            last_page_button: "#review-feed-pagination > div > button:last-child".to_string(),
            review_entry: "#reviews-results > div".to_string(),
            review_date: "div > div:nth-of-type(2) > div:nth-of-type(1) > div:nth-of-type(1) > div:nth-of-type(2) > span"
                .to_string(),
        }
    }
}

/// [`SiteLayout`] with every selector parsed once up front
pub struct CompiledLayout {
    pub layout: SiteLayout,
    pub total_count: Selector,
    pub listing_block: Selector,
    pub listing_link: Selector,
    pub non_member_marker: Selector,
    pub booking_badge: Selector,
    pub overview_item: Selector,
    pub overall_rating: Selector,
    pub sub_rating: Selector,
    pub noise_level: Selector,
    pub recommend_label: Selector,
    pub recommend_value: Selector,
    pub sidebar: Selector,
    pub sidebar_item: Selector,
    pub sidebar_label: Selector,
    pub sidebar_value: Selector,
    pub safety_panel: Selector,
    pub safety_item: Selector,
    pub span: Selector,
    pub review_entry: Selector,
    pub review_date: Selector,
}

impl CompiledLayout {
    /// Parse every selector, failing on the first malformed one
    pub fn compile(layout: SiteLayout) -> Result<Self> {
        Ok(Self {
            total_count: parse_selector(&layout.total_count)?,
            listing_block: parse_selector(&layout.listing_block)?,
            listing_link: parse_selector(&layout.listing_link)?,
            non_member_marker: parse_selector(&layout.non_member_marker)?,
            booking_badge: parse_selector(&layout.booking_badge)?,
            overview_item: parse_selector(&layout.overview_item)?,
            overall_rating: parse_selector(&layout.overall_rating)?,
            sub_rating: parse_selector(&layout.sub_rating)?,
            noise_level: parse_selector(&layout.noise_level)?,
            recommend_label: parse_selector(&layout.recommend_label)?,
            recommend_value: parse_selector(&layout.recommend_value)?,
            sidebar: parse_selector(&layout.sidebar)?,
            sidebar_item: parse_selector(&layout.sidebar_item)?,
            sidebar_label: parse_selector(&layout.sidebar_label)?,
            sidebar_value: parse_selector(&layout.sidebar_value)?,
            safety_panel: parse_selector(&layout.safety_panel)?,
            safety_item: parse_selector(&layout.safety_item)?,
            span: parse_selector("span")?,
            review_entry: parse_selector(&layout.review_entry)?,
            review_date: parse_selector(&layout.review_date)?,
            layout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_compiles() {
        assert!(CompiledLayout::compile(SiteLayout::default()).is_ok());
    }

    #[test]
    fn malformed_override_is_reported() {
        let layout = SiteLayout {
            sidebar: "div[[".to_string(),
            ..Default::default()
        };
        let err = CompiledLayout::compile(layout).err().unwrap();
        assert!(matches!(err, ScrapeError::Selector { ref selector, .. } if selector == "div[["));
    }

    #[test]
    fn chef_rule_ignores_case() {
        let rule = LabelMatch::ContainsIgnoreCase("chef".to_string());
        assert!(rule.matches("Executive Chef"));
        assert!(rule.matches("Pastry chef"));
        assert!(!rule.matches("Cuisines"));
    }

    #[test]
    fn layout_overrides_merge_with_defaults() {
        let layout: SiteLayout = serde_json::from_str(
            r#"{"listing_block": "li.card", "sidebar_rules": [{"label": {"contains": "Area"}, "field": "neighborhood"}]}"#,
        )
        .unwrap();
        assert_eq!(layout.listing_block, "li.card");
        assert_eq!(layout.sidebar_rules.len(), 1);
        assert_eq!(layout.total_count, SiteLayout::default().total_count);
    }
}
