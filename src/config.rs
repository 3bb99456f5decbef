//! Scraper configuration loaded from an optional YAML file.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working configuration:
//!
//! ```yaml
//! user_agent: "Mozilla/5.0 ..."
//! request_timeout_secs: 20
//! batch_timeout_secs: 120
//! fetch_failure_policy: skip
//! rate_limit:
//!   max_requests: 5
//!   period_ms: 2000
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::error::{Result, ScrapeError};
use crate::rate_limiter::{DEFAULT_MAX_REQUESTS, DEFAULT_PERIOD, RateLimiter};

/// Browser-like User-Agent; several target sites refuse bare client strings.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// What the orchestrator does when fetching one story URL fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchFailurePolicy {
    /// Fail the whole batch (historical behaviour).
    #[default]
    Abort,
    /// Log the failure and drop that story, like a parse failure.
    Skip,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub max_requests: usize,
    pub period_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_MAX_REQUESTS,
            period_ms: DEFAULT_PERIOD.as_millis() as u64,
        }
    }
}

impl RateLimitConfig {
    pub fn build(&self) -> RateLimiter {
        RateLimiter::new(self.max_requests, Duration::from_millis(self.period_ms))
    }
}

/// Top-level scraper settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub user_agent: String,
    /// Per-request timeout.
    pub request_timeout_secs: u64,
    /// Deadline for a whole "fetch N stories" batch; unbounded when absent.
    pub batch_timeout_secs: Option<u64>,
    pub fetch_failure_policy: FetchFailurePolicy,
    pub rate_limit: RateLimitConfig,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout_secs: 20,
            batch_timeout_secs: None,
            fetch_failure_policy: FetchFailurePolicy::Abort,
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl ScraperConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn batch_timeout(&self) -> Option<Duration> {
        self.batch_timeout_secs.map(Duration::from_secs)
    }

    /// Parses a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(|e| ScrapeError::Config(e.to_string()))
    }

    /// Loads from `path`, or returns defaults when no path is given.
    #[instrument(level = "info", skip_all)]
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let yaml = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ScrapeError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let config = Self::from_yaml(&yaml)?;
        info!(path = %path.display(), ?config.fetch_failure_policy, "Loaded scraper configuration");
        Ok(config)
    }
}
