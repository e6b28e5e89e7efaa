use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::Region;

/// Parameters of one search-results query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchParams {
    /// Site root, e.g. `https://www.opentable.com`
    pub base_url: String,
    /// Metro area id; 8 is New York
    pub metro_id: u32,
    pub region: Region,
    pub date: NaiveDate,
    /// Reservation time as `HH:MM`
    pub time: String,
    pub covers: u32,
    /// Optional `sortBy` value, e.g. `newest_arrivals`
    pub sort_by: Option<String>,
}

impl SearchParams {
    pub fn new(base_url: &str, metro_id: u32, region: Region, date: NaiveDate) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            metro_id,
            region,
            date,
            time: "20:00".to_string(),
            covers: 1,
            sort_by: None,
        }
    }

    pub fn at(mut self, time: &str) -> Self {
        self.time = time.to_string();
        self
    }

    pub fn sorted_by(mut self, sort_by: &str) -> Self {
        self.sort_by = Some(sort_by.to_string());
        self
    }
}

/// Bounded retries with exponential backoff around wait-for-element
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub attempts: u32,
    pub initial_backoff_ms: u64,
    pub multiplier: u32,
}

impl RetryPolicy {
    /// Delay to sleep after the given (zero-based) failed attempt
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = u64::from(self.multiplier.max(1)).saturating_pow(attempt);
        Duration::from_millis(self.initial_backoff_ms.saturating_mul(factor))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            initial_backoff_ms: 500,
            multiplier: 2,
        }
    }
}

/// How to decide a dynamically loaded region has stopped changing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuiescencePolicy {
    /// Gap between the two samples that must agree
    pub interval_ms: u64,
    /// Sample pairs to try before giving up
    pub max_samples: u32,
}

impl QuiescencePolicy {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for QuiescencePolicy {
    fn default() -> Self {
        Self {
            interval_ms: 750,
            max_samples: 12,
        }
    }
}

/// Incremental scrolling used to trigger lazy-loaded result cards
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollPolicy {
    pub steps: u32,
    pub step_px: u32,
    pub delay_ms: u64,
}

impl Default for ScrollPolicy {
    fn default() -> Self {
        Self {
            steps: 70,
            step_px: 500,
            delay_ms: 50,
        }
    }
}

/// Timing knobs shared by every workflow
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeSettings {
    /// Per-attempt wait for an element to appear
    pub element_timeout_ms: u64,
    pub retry: RetryPolicy,
    pub quiescence: QuiescencePolicy,
    pub scroll: ScrollPolicy,
}

impl ScrapeSettings {
    pub fn element_timeout(&self) -> Duration {
        Duration::from_millis(self.element_timeout_ms)
    }
}

impl Default for ScrapeSettings {
    fn default() -> Self {
        Self {
            element_timeout_ms: 5_000,
            retry: RetryPolicy::default(),
            quiescence: QuiescencePolicy::default(),
            scroll: ScrollPolicy::default(),
        }
    }
}

#[cfg(test)]
impl ScrapeSettings {
    /// Settings with near-zero delays for fixture-driven tests
    pub fn instant() -> Self {
        Self {
            element_timeout_ms: 1,
            retry: RetryPolicy {
                attempts: 2,
                initial_backoff_ms: 1,
                multiplier: 2,
            },
            quiescence: QuiescencePolicy {
                interval_ms: 1,
                max_samples: 5,
            },
            scroll: ScrollPolicy {
                steps: 3,
                step_px: 500,
                delay_ms: 0,
            },
        }
    }
}
