use thiserror::Error;

/// Errors raised while driving the site or writing output
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Region code outside the fixed set
    #[error("unknown region '{0}' (expected one of: manhattan, bronx, queens, staten_island, brooklyn)")]
    InvalidRegion(String),

    #[error("invalid date '{0}' (expected YYYY-MM-DD)")]
    InvalidDate(String),

    /// A structural anchor the scraper cannot work without is missing
    #[error("page structure changed: '{anchor}' not found on {url}")]
    PageStructureChanged { url: String, anchor: String },

    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("browser error: {0}")]
    Browser(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The page session cannot perform this action (e.g. clicks over plain HTTP)
    #[error("operation not supported by this session: {0}")]
    Unsupported(&'static str),

    #[error("invalid CSS selector '{selector}': {reason}")]
    Selector { selector: String, reason: String },

    #[error("record has no value for column '{column}'")]
    MissingColumn { column: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScrapeError {
    pub fn browser(err: impl std::fmt::Display) -> Self {
        ScrapeError::Browser(err.to_string())
    }
}

pub type Result<T, E = ScrapeError> = std::result::Result<T, E>;
