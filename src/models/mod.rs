use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ScrapeError;
use crate::output::CsvRow;

/// Geographic search area understood by the reservation site
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    Manhattan,
    Bronx,
    Queens,
    StatenIsland,
    Brooklyn,
}

impl Region {
    pub const ALL: [Region; 5] = [
        Region::Manhattan,
        Region::Bronx,
        Region::Queens,
        Region::StatenIsland,
        Region::Brooklyn,
    ];

    /// Region id used in the search-results query string
    pub fn region_id(self) -> u32 {
        match self {
            Region::Manhattan => 16,
            Region::Bronx => 324,
            Region::Queens => 17,
            Region::StatenIsland => 18,
            Region::Brooklyn => 24,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Region::Manhattan => "manhattan",
            Region::Bronx => "bronx",
            Region::Queens => "queens",
            Region::StatenIsland => "staten_island",
            Region::Brooklyn => "brooklyn",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = ScrapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Region::ALL
            .into_iter()
            .find(|region| region.as_str() == s)
            .ok_or_else(|| ScrapeError::InvalidRegion(s.to_string()))
    }
}

/// Parse a `YYYY-MM-DD` date string
pub fn parse_date(s: &str) -> Result<NaiveDate, ScrapeError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| ScrapeError::InvalidDate(s.to_string()))
}

/// Column order of the per-page listing files
pub const RESTAURANT_COLUMNS: [&str; 24] = [
    "name",
    "url",
    "is_member",
    "promoted",
    "price_tier",
    "review_count",
    "overall",
    "food",
    "service",
    "ambience",
    "value",
    "noise",
    "pct_recommended",
    "neighborhood",
    "cuisines",
    "dining_style",
    "dress_code",
    "chef",
    "tags",
    "primary_cuisine",
    "sanitizing",
    "distancing",
    "ppe",
    "screening",
];

/// Aggregate ratings, each out of 5.0
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ratings {
    pub overall: Option<f64>,
    pub food: Option<f64>,
    pub service: Option<f64>,
    pub ambience: Option<f64>,
    pub value: Option<f64>,
}

/// Safety-measure flags.
///
/// `None` means the page has no safety panel at all; `Some(false)` means the
/// panel exists but does not list the category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyMeasures {
    pub sanitizing: Option<bool>,
    pub distancing: Option<bool>,
    pub ppe: Option<bool>,
    pub screening: Option<bool>,
}

impl SafetyMeasures {
    /// Flags for a page that shows a safety panel listing nothing
    pub fn reported_none() -> Self {
        Self {
            sanitizing: Some(false),
            distancing: Some(false),
            ppe: Some(false),
            screening: Some(false),
        }
    }
}

/// Fields read from a restaurant's detail page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetailFields {
    pub price_tier: Option<String>,
    pub review_count: Option<String>,
    pub ratings: Ratings,
    pub noise: Option<String>,
    pub pct_recommended: Option<u8>,
    pub neighborhood: Option<String>,
    pub cuisines: Option<String>,
    pub dining_style: Option<String>,
    pub dress_code: Option<String>,
    pub chef: Option<String>,
    pub tags: Option<String>,
    pub safety: SafetyMeasures,
}

impl DetailFields {
    /// First entry of the comma-separated cuisines field
    pub fn primary_cuisine(&self) -> Option<String> {
        self.cuisines
            .as_deref()
            .and_then(|cuisines| cuisines.split(',').next())
            .map(|first| first.trim().to_string())
            .filter(|first| !first.is_empty())
    }
}

/// One restaurant as it appears in a listing file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RestaurantRecord {
    pub name: Option<String>,
    pub url: Option<String>,
    pub is_member: Option<bool>,
    pub promoted: Option<bool>,
    pub details: DetailFields,
}

impl RestaurantRecord {
    /// Attach detail-page fields, returning the completed record
    pub fn with_details(self, details: DetailFields) -> Self {
        Self { details, ..self }
    }

    pub fn primary_cuisine(&self) -> Option<String> {
        self.details.primary_cuisine()
    }
}

fn flag(value: Option<bool>) -> String {
    match value {
        Some(true) => "1".to_string(),
        Some(false) => "0".to_string(),
        None => String::new(),
    }
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn number<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl CsvRow for RestaurantRecord {
    fn cell(&self, column: &str) -> Option<String> {
        let d = &self.details;
        let value = match column {
            "name" => text(&self.name),
            "url" => text(&self.url),
            "is_member" => flag(self.is_member),
            "promoted" => flag(self.promoted),
            "price_tier" => text(&d.price_tier),
            "review_count" => text(&d.review_count),
            "overall" => number(d.ratings.overall),
            "food" => number(d.ratings.food),
            "service" => number(d.ratings.service),
            "ambience" => number(d.ratings.ambience),
            "value" => number(d.ratings.value),
            "noise" => text(&d.noise),
            "pct_recommended" => number(d.pct_recommended),
            "neighborhood" => text(&d.neighborhood),
            "cuisines" => text(&d.cuisines),
            "dining_style" => text(&d.dining_style),
            "dress_code" => text(&d.dress_code),
            "chef" => text(&d.chef),
            "tags" => text(&d.tags),
            "primary_cuisine" => self.primary_cuisine().unwrap_or_default(),
            "sanitizing" => flag(d.safety.sanitizing),
            "distancing" => flag(d.safety.distancing),
            "ppe" => flag(d.safety.ppe),
            "screening" => flag(d.safety.screening),
            _ => return None,
        };
        Some(value)
    }
}

/// Bookings counted for one restaurant on one day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRecord {
    pub url: String,
    pub date: NaiveDate,
    pub booked: u32,
}

impl BookingRecord {
    /// Header row for a bookings file: `url` and the date itself
    pub fn columns(date: NaiveDate) -> Vec<String> {
        vec!["url".to_string(), date.format("%Y-%m-%d").to_string()]
    }
}

impl CsvRow for BookingRecord {
    fn cell(&self, column: &str) -> Option<String> {
        if column == "url" {
            return Some(self.url.clone());
        }
        (column == self.date.format("%Y-%m-%d").to_string()).then(|| self.booked.to_string())
    }
}

/// Result of looking up a restaurant's earliest review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EarliestReview {
    /// The page has no reviews section
    NotFound,
    /// The reviews section exists but no entry could be read from it
    Empty,
    /// Read from a settled last page
    Found(String),
    /// Best read available, but the feed may not have finished loading
    Uncertain(String),
}

impl EarliestReview {
    pub const NO_REVIEWS: &'static str = "No reviews";
}

impl fmt::Display for EarliestReview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EarliestReview::NotFound => f.write_str(Self::NO_REVIEWS),
            EarliestReview::Empty => f.write_str("(reviews section is empty)"),
            EarliestReview::Found(date) => f.write_str(date),
            EarliestReview::Uncertain(date) => write!(f, "{} (uncertain)", date),
        }
    }
}
