//! Field extraction from rendered markup.
//!
//! Every lookup here is independent: a missing element leaves its field
//! `None` and never stops the other fields from being read.

use scraper::{ElementRef, Html};
use tracing::debug;

use crate::models::{DetailFields, Ratings, RestaurantRecord, SafetyMeasures};
use crate::scrapers::selectors::{CompiledLayout, SafetyFlag, SidebarField};

/// One restaurant card from a search-results page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingBlock {
    pub name: Option<String>,
    pub url: Option<String>,
    /// False when the card says the restaurant isn't bookable on the site
    pub is_member: bool,
    pub promoted: Option<bool>,
    pub booked_today: u32,
}

impl ListingBlock {
    /// Record carrying only what the card shows
    pub fn record(&self) -> RestaurantRecord {
        RestaurantRecord {
            name: self.name.clone(),
            url: self.url.clone(),
            is_member: Some(self.is_member),
            promoted: self.promoted,
            details: DetailFields::default(),
        }
    }
}

fn element_text(element: ElementRef<'_>) -> Option<String> {
    let text = element.text().collect::<String>();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// First run of digits in `text`, thousands separators allowed
pub fn first_number(text: &str) -> Option<u64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == ',')
        .filter(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

/// The number directly in front of the first `%` sign
pub fn percentage(text: &str) -> Option<u8> {
    let percent = text.find('%')?;
    let before = &text[..percent];
    let digits = &before[before.trim_end_matches(|c: char| c.is_ascii_digit()).len()..];
    let value: u8 = digits.parse().ok()?;
    (value <= 100).then_some(value)
}

fn rating(text: &str) -> Option<f64> {
    let value: f64 = text.trim().parse().ok()?;
    if (0.0..=5.0).contains(&value) {
        Some(value)
    } else {
        debug!("Ignoring out-of-range rating {}", value);
        None
    }
}

/// All restaurant cards on a results page, in page order
pub fn listing_blocks(html: &str, layout: &CompiledLayout) -> Vec<ListingBlock> {
    let document = Html::parse_document(html);
    document
        .select(&layout.listing_block)
        .map(|block| listing_block(block, layout))
        .collect()
}

fn listing_block(block: ElementRef<'_>, layout: &CompiledLayout) -> ListingBlock {
    let link = block.select(&layout.listing_link).next();
    let name = link
        .and_then(|a| a.value().attr("aria-label"))
        .map(|s| s.trim().to_string());
    let url = link
        .and_then(|a| a.value().attr("href"))
        .map(|s| s.trim().to_string());

    let is_member = block.select(&layout.non_member_marker).next().is_none();
    let promoted = is_member.then(|| block.value().attr("data-promoted") == Some("true"));

    if link.is_none() {
        debug!("Listing block without a restaurant link");
    }

    ListingBlock {
        name,
        url,
        is_member,
        promoted,
        booked_today: booked_today(block, layout),
    }
}

fn booked_today(block: ElementRef<'_>, layout: &CompiledLayout) -> u32 {
    let marker = layout.layout.booking_marker.as_str();
    block
        .select(&layout.booking_badge)
        .filter_map(element_text)
        .filter(|text| text.contains(marker))
        .filter_map(|text| first_number(&text))
        .last()
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(0)
}

/// Everything read from a restaurant's detail page
pub fn detail_fields(html: &str, layout: &CompiledLayout) -> DetailFields {
    let document = Html::parse_document(html);

    let (review_count, price_tier) = overview(&document, layout);
    let has_reviews = review_count
        .as_deref()
        .map_or(true, |count| !count.eq_ignore_ascii_case(&layout.layout.no_reviews_marker));

    let mut details = DetailFields {
        price_tier,
        review_count,
        noise: document.select(&layout.noise_level).find_map(element_text),
        safety: safety_measures(&document, layout),
        ..Default::default()
    };

    if has_reviews {
        details.ratings = ratings(&document, layout);
        details.pct_recommended = pct_recommended(&document, layout);
    }

    for (field, value) in sidebar_entries(&document, layout) {
        let slot = match field {
            SidebarField::Neighborhood => &mut details.neighborhood,
            SidebarField::Cuisines => &mut details.cuisines,
            SidebarField::DiningStyle => &mut details.dining_style,
            SidebarField::DressCode => &mut details.dress_code,
            SidebarField::Chef => &mut details.chef,
            SidebarField::Tags => &mut details.tags,
        };
        *slot = Some(value);
    }

    details
}

/// Review count and price tier from the overview strip
fn overview(document: &Html, layout: &CompiledLayout) -> (Option<String>, Option<String>) {
    let mut review_count = None;
    let mut price_tier = None;

    for text in document.select(&layout.overview_item).filter_map(element_text) {
        if text.contains("Reviews") {
            review_count = Some(text.clone());
        }
        if text.contains('$') {
            price_tier = Some(text);
        }
    }

    (review_count, price_tier)
}

fn ratings(document: &Html, layout: &CompiledLayout) -> Ratings {
    let overall = document
        .select(&layout.overall_rating)
        .next()
        .and_then(element_text)
        .and_then(|text| rating(&text));

    let subs: Vec<Option<f64>> = document
        .select(&layout.sub_rating)
        .take(4)
        .map(|el| element_text(el).and_then(|text| rating(&text)))
        .collect();
    let sub = |i: usize| subs.get(i).copied().flatten();

    Ratings {
        overall,
        food: sub(0),
        service: sub(1),
        ambience: sub(2),
        value: sub(3),
    }
}

fn pct_recommended(document: &Html, layout: &CompiledLayout) -> Option<u8> {
    let label = layout.layout.recommend_label_text.as_str();
    let labelled = document
        .select(&layout.recommend_label)
        .filter_map(element_text)
        .any(|text| text == label);
    if !labelled {
        return None;
    }

    document
        .select(&layout.recommend_value)
        .nth(layout.layout.recommend_value_index)
        .map(|el| el.text().collect::<String>())
        .and_then(|text| percentage(&text))
}

/// `(field, value)` pairs from the sidebar, in rule order; later matches win
fn sidebar_entries(document: &Html, layout: &CompiledLayout) -> Vec<(SidebarField, String)> {
    let Some(sidebar) = document.select(&layout.sidebar).next() else {
        debug!("No details sidebar on page");
        return Vec::new();
    };

    let pairs: Vec<(String, String)> = sidebar
        .select(&layout.sidebar_item)
        .flat_map(|item| {
            let labels = item.select(&layout.sidebar_label).filter_map(element_text);
            let values = item.select(&layout.sidebar_value).filter_map(element_text);
            labels.zip(values).collect::<Vec<_>>()
        })
        .collect();

    let mut entries = Vec::new();
    for rule in &layout.layout.sidebar_rules {
        for (label, value) in &pairs {
            if rule.label.matches(label) {
                entries.push((rule.field, value.clone()));
            }
        }
    }
    entries
}

fn safety_measures(document: &Html, layout: &CompiledLayout) -> SafetyMeasures {
    if document.select(&layout.safety_panel).next().is_none() {
        return SafetyMeasures::default();
    }

    let listed: Vec<String> = document
        .select(&layout.safety_item)
        .filter_map(|item| item.select(&layout.span).next())
        .filter_map(element_text)
        .collect();

    let mut safety = SafetyMeasures::reported_none();
    for rule in &layout.layout.safety_rules {
        if listed.iter().any(|category| *category == rule.category) {
            let slot = match rule.flag {
                SafetyFlag::Sanitizing => &mut safety.sanitizing,
                SafetyFlag::Distancing => &mut safety.distancing,
                SafetyFlag::Ppe => &mut safety.ppe,
                SafetyFlag::Screening => &mut safety.screening,
            };
            *slot = Some(true);
        }
    }
    safety
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::scrapers::selectors::SiteLayout;

    fn layout() -> CompiledLayout {
        CompiledLayout::compile(SiteLayout::default()).unwrap()
    }

    #[test]
    fn numbers_in_free_text() {
        assert_eq!(first_number("Booked 37 times today"), Some(37));
        assert_eq!(first_number("1,204 restaurants available"), Some(1204));
        assert_eq!(first_number("none"), None);
        assert_eq!(percentage("94% of diners"), Some(94));
        assert_eq!(percentage("no figure"), None);
        assert_eq!(percentage("140%"), None);
        assert_eq!(percentage("Noise\u{a0}94% of diners"), Some(94));
        assert_eq!(percentage("Recommend\u{a0}94%"), Some(94));
        assert_eq!(percentage("très 7%"), Some(7));
    }

    #[test]
    fn non_breaking_space_before_percentage() {
        let html = REVIEWED_DETAIL.replace("<span>94%</span>", "<span>Recommend&nbsp;94%</span>");
        let details = detail_fields(&html, &layout());

        assert_eq!(details.pct_recommended, Some(94));
        assert_eq!(details.chef.as_deref(), Some("Mario Carbone"));
    }

    #[test]
    fn card_without_link_keeps_other_fields() {
        let html = results_page(
            Some("2 restaurants"),
            &[
                listing("Carbone", "/r/carbone", true, Some(37)).replace(
                    r#"<a class="_1e9PcCDb012hY4BcGfraQB" aria-label="Carbone" href="/r/carbone">Carbone</a>"#,
                    "",
                ),
                non_member_listing("Corner Deli", "/r/deli").replace(
                    r#"<a class="_1e9PcCDb012hY4BcGfraQB" aria-label="Corner Deli" href="/r/deli">Corner Deli</a>"#,
                    "",
                ),
            ],
        );
        let blocks = listing_blocks(&html, &layout());

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].name, None);
        assert_eq!(blocks[0].url, None);
        assert!(blocks[0].is_member);
        assert_eq!(blocks[0].promoted, Some(true));
        assert_eq!(blocks[0].booked_today, 37);
        assert_eq!(blocks[1].name, None);
        assert!(!blocks[1].is_member);
    }

    #[test]
    fn listing_blocks_keep_page_order() {
        let html = results_page(
            Some("3 restaurants"),
            &[
                listing("Carbone", "https://example.com/r/carbone", true, Some(37)),
                non_member_listing("Corner Deli", "https://example.com/r/deli"),
                listing("Via Carota", "https://example.com/r/via-carota", false, None),
            ],
        );
        let blocks = listing_blocks(&html, &layout());

        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].name.as_deref(), Some("Carbone"));
        assert_eq!(blocks[0].promoted, Some(true));
        assert_eq!(blocks[0].booked_today, 37);
        assert!(!blocks[1].is_member);
        assert_eq!(blocks[1].promoted, None);
        assert_eq!(blocks[2].url.as_deref(), Some("https://example.com/r/via-carota"));
        assert_eq!(blocks[2].booked_today, 0);
    }

    #[test]
    fn full_detail_page() {
        let details = detail_fields(REVIEWED_DETAIL, &layout());

        assert_eq!(details.review_count.as_deref(), Some("4,817 Reviews"));
        assert_eq!(details.price_tier.as_deref(), Some("$50 and over"));
        assert_eq!(
            details.ratings,
            Ratings {
                overall: Some(4.7),
                food: Some(4.8),
                service: Some(4.6),
                ambience: Some(4.5),
                value: Some(4.1),
            }
        );
        assert_eq!(details.noise.as_deref(), Some("Energetic"));
        assert_eq!(details.pct_recommended, Some(94));
        assert_eq!(details.neighborhood.as_deref(), Some("Greenwich Village"));
        assert_eq!(details.cuisines.as_deref(), Some("Italian, Contemporary American"));
        assert_eq!(details.primary_cuisine().as_deref(), Some("Italian"));
        assert_eq!(details.dining_style.as_deref(), Some("Fine Dining"));
        assert_eq!(details.dress_code.as_deref(), Some("Business Casual"));
        assert_eq!(details.chef.as_deref(), Some("Mario Carbone"));
        assert_eq!(details.tags.as_deref(), Some("Bar Dining, Wine"));
        assert_eq!(
            details.safety,
            SafetyMeasures {
                sanitizing: Some(true),
                distancing: Some(false),
                ppe: Some(false),
                screening: Some(true),
            }
        );
    }

    #[test]
    fn one_missing_field_leaves_the_rest() {
        let html = REVIEWED_DETAIL.replace(
            r#"<div class="df8add00"><div class="c3981cf8 _965a91d5">Dress code</div><div class="e7ff71b6 b2f6d1a4">Business Casual</div></div>"#,
            "",
        );
        let details = detail_fields(&html, &layout());

        assert_eq!(details.dress_code, None);
        assert_eq!(details.neighborhood.as_deref(), Some("Greenwich Village"));
        assert_eq!(details.chef.as_deref(), Some("Mario Carbone"));
        assert_eq!(details.ratings.overall, Some(4.7));
        assert_eq!(details.pct_recommended, Some(94));
    }

    #[test]
    fn no_reviews_skips_ratings_even_with_rating_markup() {
        let html = REVIEWED_DETAIL.replace("4,817 Reviews", "No Reviews");
        let details = detail_fields(&html, &layout());

        assert_eq!(details.review_count.as_deref(), Some("No Reviews"));
        assert_eq!(details.ratings, Ratings::default());
        assert_eq!(details.pct_recommended, None);
        assert_eq!(details.neighborhood.as_deref(), Some("Greenwich Village"));
    }

    #[test]
    fn unparsable_rating_is_absent() {
        let html = REVIEWED_DETAIL.replace("<span>4.7</span>", "<span>New</span>");
        let details = detail_fields(&html, &layout());
        assert_eq!(details.ratings.overall, None);
        assert_eq!(details.ratings.food, Some(4.8));
    }

    #[test]
    fn safety_panel_absent_versus_empty() {
        let layout = layout();

        let absent = detail_fields("<html><body><p>menu</p></body></html>", &layout);
        assert_eq!(absent.safety, SafetyMeasures::default());

        let empty = detail_fields(r#"<html><body><div id="safety-precautions"></div></body></html>"#, &layout);
        assert_eq!(empty.safety, SafetyMeasures::reported_none());
    }

    #[test]
    fn empty_page_yields_all_absent() {
        let details = detail_fields("<html></html>", &layout());
        assert_eq!(details, DetailFields::default());
    }

    #[test]
    fn sidebar_rules_come_from_layout() {
        let mut custom = SiteLayout::default();
        custom.sidebar_rules = vec![crate::scrapers::selectors::SidebarRule {
            label: crate::scrapers::selectors::LabelMatch::Contains("Area".to_string()),
            field: SidebarField::Neighborhood,
        }];
        let layout = CompiledLayout::compile(custom).unwrap();
        let html = format!(
            r#"<div class="_1e466fbf">{}{}</div>"#,
            sidebar_entry("Area", "Tribeca"),
            sidebar_entry("Neighborhood", "SoHo")
        );

        let details = detail_fields(&html, &layout);
        assert_eq!(details.neighborhood.as_deref(), Some("Tribeca"));
        assert_eq!(details.cuisines, None);
    }
}
