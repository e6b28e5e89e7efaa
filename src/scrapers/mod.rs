pub mod bookings;
pub mod browser;
pub mod context;
pub mod extract;
pub mod http;
pub mod listings;
pub mod results;
pub mod reviews;
pub mod selectors;
pub mod traits;
pub mod types;
pub mod wait;

#[cfg(test)]
pub mod testing;

pub use bookings::collect_bookings;
pub use browser::ChromeSessions;
pub use context::ScrapeContext;
pub use http::HttpSessions;
pub use listings::scrape_listings;
pub use reviews::earliest_review;
pub use traits::SessionSource;
