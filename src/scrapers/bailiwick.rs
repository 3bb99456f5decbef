//! Bailiwick Express scraper (Jersey and Guernsey editions).
//!
//! Both editions share one WordPress theme, so they differ only in their
//! section tables. Listing pages wrap each story in an `<article>` block;
//! story pages carry the headline in the first `<h1>` and the body in
//! `div.entry-content`.

use once_cell::sync::Lazy;
use scraper::Selector;
use tracing::{debug, instrument};

use crate::error::{Result, ScrapeError};
use crate::models::{Document, SectionMap, Story};
use crate::scrapers::{
    NewsSource, build_story, first_text, paragraph_text, published_at, thumbnail_url,
};

/// Byline used when a story has no author link.
pub const DEFAULT_AUTHOR: &str = "Bailiwick Express";

const JERSEY_SECTIONS: &[(&str, &str)] = &[
    ("news", "https://www.bailiwickexpress.com/news/"),
    ("business", "https://www.bailiwickexpress.com/jsy-business/"),
    ("sport", "https://www.bailiwickexpress.com/jsy-sport/"),
    ("opinion", "https://www.bailiwickexpress.com/opinion-jersey/"),
    ("community", "https://www.bailiwickexpress.com/jsy-community/"),
    ("podcasts", "https://www.bailiwickexpress.com/jsy-radio-podcasts/"),
];

const GUERNSEY_SECTIONS: &[(&str, &str)] = &[
    ("news", "https://www.bailiwickexpress.com/bailiwickexpress-guernsey-edition/"),
    ("business", "https://www.bailiwickexpress.com/gsy-business/"),
    ("sport", "https://www.bailiwickexpress.com/gsy-sport/"),
    ("opinion", "https://www.bailiwickexpress.com/opinion-guernsey/"),
    ("community", "https://www.bailiwickexpress.com/gsy-community/"),
    ("podcasts", "https://www.bailiwickexpress.com/jsy-radio-podcasts/"),
];

static ARTICLE: Lazy<Selector> = Lazy::new(|| Selector::parse("article").expect("static selector"));
static HEADLINE: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").expect("static selector"));
static CONTENT: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.entry-content").expect("static selector"));
static TIME: Lazy<Selector> = Lazy::new(|| Selector::parse("time").expect("static selector"));
static AUTHOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a.url, a.fn, a.a").expect("static selector"));
static THUMBNAIL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("figure.post-thumbnail").expect("static selector"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edition {
    Jersey,
    Guernsey,
}

/// Bailiwick Express, one edition.
#[derive(Debug, Clone)]
pub struct BailiwickExpress {
    edition: Edition,
    sections: SectionMap,
}

impl BailiwickExpress {
    pub fn jersey() -> Self {
        Self {
            edition: Edition::Jersey,
            sections: SectionMap::from_static(JERSEY_SECTIONS),
        }
    }

    pub fn guernsey() -> Self {
        Self {
            edition: Edition::Guernsey,
            sections: SectionMap::from_static(GUERNSEY_SECTIONS),
        }
    }

    /// Replaces the section table (e.g. to point at a mirror).
    pub fn with_sections(mut self, sections: SectionMap) -> Self {
        self.sections = sections;
        self
    }

    pub fn edition(&self) -> Edition {
        self.edition
    }
}

impl NewsSource for BailiwickExpress {
    fn id(&self) -> &'static str {
        match self.edition {
            Edition::Jersey => "be",
            Edition::Guernsey => "ge",
        }
    }

    fn sections(&self) -> &SectionMap {
        &self.sections
    }

    fn listing_entry_selector(&self) -> &Selector {
        &ARTICLE
    }

    #[instrument(level = "debug", skip_all, fields(url = %document.url))]
    fn parse(&self, document: &Document) -> Result<Story> {
        let html = &document.html;

        let headline = first_text(html, &HEADLINE)
            .ok_or_else(|| ScrapeError::parse(&document.url, "missing headline <h1>"))?;
        debug!(%headline, "Found headline");

        let content = html
            .select(&CONTENT)
            .next()
            .ok_or_else(|| ScrapeError::parse(&document.url, "missing div.entry-content"))?;
        let body_text = paragraph_text(content);

        let author = first_text(html, &AUTHOR)
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| DEFAULT_AUTHOR.to_string());

        build_story(
            document,
            headline,
            body_text,
            published_at(document, &TIME),
            author,
            thumbnail_url(document, &THUMBNAIL),
        )
    }
}
