//! Site-specific extractors.
//!
//! News sources implement [`NewsSource`]: a self-contained strategy that
//! knows its section table, how to find story links on a listing page, and
//! how to turn a story page into a [`Story`]. None of that involves I/O; the
//! [`StoryScraper`](crate::orchestrator::StoryScraper) does the fetching.
//!
//! # Supported Sources
//!
//! | Source | Module | Listing entries | Default author |
//! |--------|--------|-----------------|----------------|
//! | Bailiwick Express (Jersey) | [`bailiwick`] | `<article>` blocks | Bailiwick Express |
//! | Bailiwick Express (Guernsey) | [`bailiwick`] | `<article>` blocks | Bailiwick Express |
//! | Jersey Evening Post | [`jep`] | `h2.entry-title` headings | Jersey Evening Post |
//!
//! The [`weather`] and [`family_notices`] modules are single-purpose
//! extractors with their own record shapes.

pub mod bailiwick;
pub mod family_notices;
pub mod jep;
pub mod weather;

use chrono::NaiveDateTime;
use itertools::Itertools;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};
use url::Url;

use crate::error::{Result, ScrapeError};
use crate::models::{Document, SectionMap, Story};
use crate::utils::{parse_loose_date, strip_query};

pub use bailiwick::BailiwickExpress;
pub use jep::JerseyEveningPost;

static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").expect("static selector"));
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").expect("static selector"));
static IMAGE: Lazy<Selector> = Lazy::new(|| Selector::parse("img[src]").expect("static selector"));

/// A news site the orchestrator can scrape.
pub trait NewsSource: Send + Sync {
    /// Short identifier ("be", "ge", "jep").
    fn id(&self) -> &'static str;

    /// The site's section → listing page table.
    fn sections(&self) -> &SectionMap;

    /// Selector matching one listing entry; the first link inside each
    /// entry is the story URL.
    fn listing_entry_selector(&self) -> &Selector;

    /// Unique story URLs from a listing page, in document order.
    fn extract_story_urls(&self, listing: &Document, limit: Option<usize>) -> Vec<String> {
        collect_listing_links(listing, self.listing_entry_selector(), limit)
    }

    /// Extracts a story from a fetched page.
    fn parse(&self, document: &Document) -> Result<Story>;
}

/// Every known source, for dispatch by id or URL.
#[derive(Debug, Clone)]
pub enum AnySource {
    BailiwickJersey(BailiwickExpress),
    BailiwickGuernsey(BailiwickExpress),
    EveningPost(JerseyEveningPost),
}

impl AnySource {
    pub const IDS: [&'static str; 3] = ["be", "ge", "jep"];

    pub fn from_id(id: &str) -> Option<Self> {
        match id.to_ascii_lowercase().as_str() {
            "be" => Some(Self::BailiwickJersey(BailiwickExpress::jersey())),
            "ge" => Some(Self::BailiwickGuernsey(BailiwickExpress::guernsey())),
            "jep" => Some(Self::EveningPost(JerseyEveningPost::new())),
            _ => None,
        }
    }

    /// Picks the parser for a story URL by its host.
    pub fn for_url(url: &str) -> Option<Self> {
        let host = Url::parse(url).ok()?.host_str()?.to_ascii_lowercase();
        if host.ends_with("bailiwickexpress.com") {
            Some(Self::BailiwickJersey(BailiwickExpress::jersey()))
        } else if host.ends_with("jerseyeveningpost.com") {
            Some(Self::EveningPost(JerseyEveningPost::new()))
        } else {
            None
        }
    }

    fn inner(&self) -> &dyn NewsSource {
        match self {
            Self::BailiwickJersey(s) | Self::BailiwickGuernsey(s) => s as &dyn NewsSource,
            Self::EveningPost(s) => s as &dyn NewsSource,
        }
    }
}

impl NewsSource for AnySource {
    fn id(&self) -> &'static str {
        self.inner().id()
    }

    fn sections(&self) -> &SectionMap {
        self.inner().sections()
    }

    fn listing_entry_selector(&self) -> &Selector {
        self.inner().listing_entry_selector()
    }

    fn extract_story_urls(&self, listing: &Document, limit: Option<usize>) -> Vec<String> {
        self.inner().extract_story_urls(listing, limit)
    }

    fn parse(&self, document: &Document) -> Result<Story> {
        self.inner().parse(document)
    }
}

/// First link of each listing entry, resolved against the page URL,
/// stripped of any `#fragment`, de-duplicated and truncated to `limit`.
pub fn collect_listing_links(
    listing: &Document,
    entry: &Selector,
    limit: Option<usize>,
) -> Vec<String> {
    let base = Url::parse(&listing.url).ok();
    let urls: Vec<String> = listing
        .html
        .select(entry)
        .filter_map(|el| el.select(&LINK).next())
        .filter_map(|a| a.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty() && !href.starts_with('#'))
        .filter_map(|href| match &base {
            Some(base) => base.join(href).ok().map(|mut url| {
                url.set_fragment(None);
                String::from(url)
            }),
            None => href.split('#').next().map(str::to_string),
        })
        .unique()
        .take(limit.unwrap_or(usize::MAX))
        .collect();

    debug!(count = urls.len(), listing = %listing.url, "Extracted story URLs");
    urls
}

/// Whitespace-trimmed text of an element.
pub fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Trimmed text of the first element matching `selector`, if any.
pub fn first_text(html: &Html, selector: &Selector) -> Option<String> {
    html.select(selector).next().map(element_text)
}

/// Non-empty paragraphs of `container`, trimmed and joined with newlines.
pub fn paragraph_text(container: ElementRef<'_>) -> String {
    container
        .select(&PARAGRAPH)
        .map(element_text)
        .filter(|p| !p.is_empty())
        .join("\n")
}

/// Publication date from the first `time` element.
///
/// The visible text is tried first, then the `datetime` attribute. Failure
/// is logged and yields `None`; it never fails the story.
pub fn published_at(document: &Document, time: &Selector) -> Option<NaiveDateTime> {
    let Some(el) = document.html.select(time).next() else {
        debug!(url = %document.url, "No time element");
        return None;
    };
    let text = element_text(el);
    let parsed = parse_loose_date(&text)
        .or_else(|| el.value().attr("datetime").and_then(parse_loose_date));
    if parsed.is_none() {
        warn!(url = %document.url, date = %text, "Failed to parse publication date");
    }
    parsed
}

/// Thumbnail `src` inside the first match of `figure`, without query string.
pub fn thumbnail_url(document: &Document, figure: &Selector) -> Option<String> {
    let src = document
        .html
        .select(figure)
        .next()
        .and_then(|fig| {
            if fig.value().name() == "img" {
                Some(fig)
            } else {
                fig.select(&IMAGE).next()
            }
        })
        .and_then(|img| img.value().attr("src"))
        .map(str::trim)
        .filter(|src| !src.is_empty());

    match src {
        Some(src) => Some(strip_query(src).to_string()),
        None => {
            debug!(url = %document.url, "No thumbnail image");
            None
        }
    }
}

/// Assembles a [`Story`], enforcing that headline and body are present.
pub fn build_story(
    document: &Document,
    headline: String,
    body_text: String,
    published_at: Option<NaiveDateTime>,
    author: String,
    image_url: Option<String>,
) -> Result<Story> {
    if headline.is_empty() {
        return Err(ScrapeError::parse(&document.url, "headline is empty"));
    }
    if body_text.is_empty() {
        return Err(ScrapeError::parse(&document.url, "story body is empty"));
    }
    Ok(Story {
        headline,
        body_text,
        published_at,
        author,
        source_url: document.url.clone(),
        image_url,
    })
}
