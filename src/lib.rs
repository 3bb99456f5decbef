//! # Bailiwick News
//!
//! Scrapes Channel Islands news, weather, tides and family notices into
//! structured bulletin records.
//!
//! ## Sources
//!
//! - Bailiwick Express, Jersey and Guernsey editions
//! - Jersey Evening Post (news and premium sections)
//! - BBC Weather forecasts and tide tables for St Helier and St Peter Port
//! - Jersey Evening Post family notices (deaths)
//!
//! ## Architecture
//!
//! 1. **Fetching**: every GET goes through one [`Fetcher`](fetcher::Fetcher)
//!    sharing one [`RateLimiter`](rate_limiter::RateLimiter)
//!    (5 requests per 2 seconds by default)
//! 2. **Indexing**: a [`NewsSource`](scrapers::NewsSource) finds story URLs
//!    on a section's listing page
//! 3. **Parsing**: the same source turns each page into a
//!    [`Story`](models::Story); pages that fail to parse are dropped
//! 4. **Assembly**: [`editions`] and [`radio`] combine stories, weather and
//!    notices into newsletter and bulletin records, and [`cache`] carries
//!    editors' changes between runs
//!
//! ```no_run
//! use std::sync::Arc;
//! use bailiwick_news::{config::ScraperConfig, fetcher::Fetcher, orchestrator::StoryScraper};
//! use bailiwick_news::scrapers::BailiwickExpress;
//!
//! # async fn example() -> bailiwick_news::error::Result<()> {
//! let config = ScraperConfig::default();
//! let fetcher = Fetcher::new(&config, Arc::new(config.rate_limit.build()))?;
//! let scraper = StoryScraper::from_config(BailiwickExpress::jersey(), fetcher, &config);
//! let stories = scraper.fetch_n_stories("news", Some(5)).await?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod editions;
pub mod error;
pub mod fetcher;
pub mod models;
pub mod orchestrator;
pub mod radio;
pub mod rate_limiter;
pub mod scrapers;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{Result, ScrapeError};
pub use models::{FamilyNotice, StoriesBySection, Story, WeatherReport};
