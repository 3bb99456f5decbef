//! Error taxonomy for the scraping layer.
//!
//! Failures are split by how far they reach:
//!
//! - [`ScrapeError::Fetch`] and [`ScrapeError::Timeout`] concern the network and
//!   propagate to the caller of a batch (unless the orchestrator is told to skip them).
//! - [`ScrapeError::Parse`] is fatal to a single story only; the orchestrator
//!   logs it and drops that story.
//! - [`ScrapeError::UnknownSection`] is a caller mistake and is never retried.
//!
//! Soft-degraded weather and tide extraction never produce an error at all;
//! those fields come back as empty strings instead.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while fetching and extracting third-party content.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// HTTP status failure or network-level error for a single URL.
    #[error("failed to fetch {url}: {reason}")]
    Fetch {
        /// The original (not cache-busted) URL.
        url: String,
        /// Status line or transport error description.
        reason: String,
    },

    /// A batch did not finish before its deadline.
    #[error("timed out after {secs}s while {operation}")]
    Timeout {
        /// What was running when the deadline hit.
        operation: String,
        /// The configured deadline in seconds.
        secs: u64,
    },

    /// A required structural element was missing from a document.
    #[error("failed to parse {url}: {reason}")]
    Parse {
        /// The document's source URL.
        url: String,
        /// Which anchor was missing or empty.
        reason: String,
    },

    /// The section is not configured for this source.
    #[error("section '{section}' not recognised, available sections are {available:?}")]
    UnknownSection {
        /// The requested section id.
        section: String,
        /// Every section id the source does know about.
        available: Vec<String>,
    },

    /// A JSON envelope could not be decoded.
    #[error("failed to decode response from {url}: {reason}")]
    Decode {
        /// The original URL.
        url: String,
        /// The decoder's message.
        reason: String,
    },

    /// Configuration file missing or malformed.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Cache file system error.
    #[error("IO error at {path}: {source}")]
    Io {
        /// The file the cache was touching.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ScrapeError {
    pub(crate) fn fetch(url: &str, reason: impl ToString) -> Self {
        Self::Fetch {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn parse(url: &str, reason: impl ToString) -> Self {
        Self::Parse {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    /// True for failures that only concern a single story.
    pub fn is_per_story(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }

    /// True when the caller asked for something that does not exist.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::UnknownSection { .. })
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, ScrapeError>;
