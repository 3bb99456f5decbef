//! Section → URLs → documents → stories pipeline.
//!
//! [`StoryScraper`] composes a [`NewsSource`] strategy with the shared
//! [`Fetcher`]. Listing pages and story pages are fetched through the same
//! rate limiter; story pages of one batch are fetched concurrently.
//!
//! # Failure handling
//!
//! | Failure | [`FetchFailurePolicy::Abort`] | [`FetchFailurePolicy::Skip`] |
//! |---------|-------------------------------|------------------------------|
//! | Listing page fetch | batch fails | batch fails |
//! | Story page fetch | batch fails | story dropped, logged |
//! | Story parse | story dropped, logged | story dropped, logged |
//! | Batch deadline | [`ScrapeError::Timeout`] | [`ScrapeError::Timeout`] |

use std::time::Duration;

use futures::future::join_all;
use tracing::{error, info, instrument, warn};

use crate::config::{FetchFailurePolicy, ScraperConfig};
use crate::error::{Result, ScrapeError};
use crate::fetcher::Fetcher;
use crate::models::{Document, StoriesBySection, Story};
use crate::scrapers::{AnySource, NewsSource};

/// Scrapes stories from one source.
#[derive(Debug, Clone)]
pub struct StoryScraper<S = AnySource> {
    source: S,
    fetcher: Fetcher,
    policy: FetchFailurePolicy,
    batch_timeout: Option<Duration>,
}

impl<S: NewsSource> StoryScraper<S> {
    pub fn new(source: S, fetcher: Fetcher) -> Self {
        Self {
            source,
            fetcher,
            policy: FetchFailurePolicy::default(),
            batch_timeout: None,
        }
    }

    /// Applies the failure policy and batch deadline from `config`.
    pub fn from_config(source: S, fetcher: Fetcher, config: &ScraperConfig) -> Self {
        Self::new(source, fetcher)
            .with_policy(config.fetch_failure_policy)
            .with_batch_timeout(config.batch_timeout())
    }

    pub fn with_policy(mut self, policy: FetchFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_batch_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.batch_timeout = timeout;
        self
    }

    /// Section ids in configured order.
    pub fn available_sections(&self) -> Vec<String> {
        self.source.sections().ids()
    }

    /// Unique story URLs of `section`, in listing order, at most `limit`.
    ///
    /// # Errors
    ///
    /// [`ScrapeError::UnknownSection`] when `section` is not configured, or
    /// the listing page's fetch error.
    #[instrument(level = "info", skip(self), fields(source = self.source.id()))]
    pub async fn list_story_urls(&self, section: &str, limit: Option<usize>) -> Result<Vec<String>> {
        let listing_url = self.source.sections().get(section).ok_or_else(|| {
            ScrapeError::UnknownSection {
                section: section.to_string(),
                available: self.available_sections(),
            }
        })?;

        let listing = self.fetcher.fetch(listing_url).await?;
        let urls = self.source.extract_story_urls(&listing, limit);
        info!(count = urls.len(), "Indexed story URLs");
        Ok(urls)
    }

    /// Fetches and parses one story page with this scraper's source.
    #[instrument(level = "info", skip(self), fields(source = self.source.id()))]
    pub async fn fetch_story(&self, url: &str) -> Result<Story> {
        let document = self.fetcher.fetch(url).await?;
        self.source.parse(&document)
    }

    /// Up to `limit` stories from `section`.
    ///
    /// Stories whose pages fail to parse are logged and left out, so the
    /// result may be shorter than the number of URLs found.
    #[instrument(level = "info", skip(self), fields(source = self.source.id()))]
    pub async fn fetch_n_stories(&self, section: &str, limit: Option<usize>) -> Result<Vec<Story>> {
        let batch = self.collect_stories(section, limit);
        let stories = match self.batch_timeout {
            Some(deadline) => tokio::time::timeout(deadline, batch).await.map_err(|_| {
                warn!(section, secs = deadline.as_secs(), "Story batch timed out");
                ScrapeError::Timeout {
                    operation: format!("fetching section '{section}' from {}", self.source.id()),
                    secs: deadline.as_secs(),
                }
            })??,
            None => batch.await?,
        };
        info!(count = stories.len(), "Parsed stories");
        Ok(stories)
    }

    /// Every configured section, each capped at `limit_per_section`.
    ///
    /// Sections are scraped concurrently. The result holds every section id
    /// in configured order, with an empty list for sections that yielded no
    /// stories.
    #[instrument(level = "info", skip(self), fields(source = self.source.id()))]
    pub async fn fetch_all_sections(&self, limit_per_section: Option<usize>) -> Result<StoriesBySection> {
        let sections = self.available_sections();
        let results = join_all(
            sections
                .iter()
                .map(|section| self.fetch_n_stories(section, limit_per_section)),
        )
        .await;

        let by_section = sections
            .into_iter()
            .zip(results)
            .map(|(section, stories)| stories.map(|s| (section, s)))
            .collect::<Result<StoriesBySection>>()?;

        info!(
            sections = by_section.len(),
            stories = by_section.total_stories(),
            "Scraped all sections"
        );
        Ok(by_section)
    }

    async fn collect_stories(&self, section: &str, limit: Option<usize>) -> Result<Vec<Story>> {
        let urls = self.list_story_urls(section, limit).await?;
        let documents = self.fetch_documents(&urls).await?;
        Ok(self.parse_documents(&documents))
    }

    async fn fetch_documents(&self, urls: &[String]) -> Result<Vec<Document>> {
        match self.policy {
            FetchFailurePolicy::Abort => self.fetcher.fetch_all(urls).await,
            FetchFailurePolicy::Skip => Ok(self
                .fetcher
                .fetch_each(urls)
                .await
                .into_iter()
                .filter_map(|outcome| {
                    outcome
                        .map_err(|e| error!(error = %e, "Dropping story that failed to fetch"))
                        .ok()
                })
                .collect()),
        }
    }

    fn parse_documents(&self, documents: &[Document]) -> Vec<Story> {
        documents
            .iter()
            .filter_map(|document| match self.source.parse(document) {
                Ok(story) => Some(story),
                Err(e) => {
                    error!(url = %document.url, error = %e, "Dropping story that failed to parse");
                    None
                }
            })
            .collect()
    }
}

/// Fetches a single story, choosing the parser from the URL's host.
///
/// # Errors
///
/// [`ScrapeError::Parse`] when no source recognises the host, otherwise
/// the fetch or parse error for that page.
#[instrument(level = "info", skip(fetcher))]
pub async fn fetch_story_by_url(fetcher: &Fetcher, url: &str) -> Result<Story> {
    let source = source_for_url(url)
        .ok_or_else(|| ScrapeError::parse(url, "no parser recognises this host"))?;
    StoryScraper::new(source, fetcher.clone()).fetch_story(url).await
}

/// The source whose parser handles `url`.
pub fn source_for_url(url: &str) -> Option<AnySource> {
    AnySource::for_url(url)
}
