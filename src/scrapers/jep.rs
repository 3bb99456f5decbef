//! Jersey Evening Post scraper.
//!
//! Listing pages title each story with an `h2.entry-title` heading that
//! wraps the link. Story pages print the first word of the body in
//! capitals and prefix the byline with "By ", both of which are normalized
//! here.

use once_cell::sync::Lazy;
use scraper::Selector;
use tracing::instrument;

use crate::error::{Result, ScrapeError};
use crate::models::{Document, SectionMap, Story};
use crate::scrapers::{
    NewsSource, build_story, first_text, paragraph_text, published_at, thumbnail_url,
};
use crate::utils::{collapse_whitespace, recapitalize_lead};

pub const DEFAULT_AUTHOR: &str = "Jersey Evening Post";

const SECTIONS: &[(&str, &str)] = &[
    ("news", "https://jerseyeveningpost.com/category/news/"),
    ("premium", "https://jerseyeveningpost.com/tag/premium/"),
];

static ENTRY_TITLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h2.entry-title").expect("static selector"));
static HEADLINE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h1.entry-title").expect("static selector"));
static CONTENT: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.entry-content").expect("static selector"));
static TIME: Lazy<Selector> = Lazy::new(|| Selector::parse("time").expect("static selector"));
static BYLINE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("span.byline").expect("static selector"));
static THUMBNAIL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("figure.post-thumbnail").expect("static selector"));

#[derive(Debug, Clone)]
pub struct JerseyEveningPost {
    sections: SectionMap,
}

impl JerseyEveningPost {
    pub fn new() -> Self {
        Self {
            sections: SectionMap::from_static(SECTIONS),
        }
    }

    pub fn with_sections(mut self, sections: SectionMap) -> Self {
        self.sections = sections;
        self
    }
}

impl Default for JerseyEveningPost {
    fn default() -> Self {
        Self::new()
    }
}

/// "By Jane\nDoe" → "Jane Doe"; empty bylines fall back to the paper's name.
fn normalize_byline(raw: &str) -> String {
    let byline = collapse_whitespace(raw);
    let byline = match byline.get(..3) {
        Some(prefix) if prefix.eq_ignore_ascii_case("by ") => byline[3..].trim().to_string(),
        _ => byline,
    };
    if byline.is_empty() {
        DEFAULT_AUTHOR.to_string()
    } else {
        byline
    }
}

impl NewsSource for JerseyEveningPost {
    fn id(&self) -> &'static str {
        "jep"
    }

    fn sections(&self) -> &SectionMap {
        &self.sections
    }

    fn listing_entry_selector(&self) -> &Selector {
        &ENTRY_TITLE
    }

    #[instrument(level = "debug", skip_all, fields(url = %document.url))]
    fn parse(&self, document: &Document) -> Result<Story> {
        let html = &document.html;

        let headline = first_text(html, &HEADLINE)
            .ok_or_else(|| ScrapeError::parse(&document.url, "missing headline h1.entry-title"))?;

        let content = html
            .select(&CONTENT)
            .next()
            .ok_or_else(|| ScrapeError::parse(&document.url, "missing div.entry-content"))?;
        let body_text = recapitalize_lead(&paragraph_text(content));

        let author = first_text(html, &BYLINE)
            .map(|b| normalize_byline(&b))
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
