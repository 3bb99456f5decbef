//! Shared helpers for unit tests.

use std::sync::Arc;

use crate::config::ScraperConfig;
use crate::fetcher::Fetcher;
use crate::rate_limiter::RateLimiter;

/// A fetcher with rate limiting switched off.
pub(crate) fn test_fetcher() -> Fetcher {
    Fetcher::new(&ScraperConfig::default(), Arc::new(RateLimiter::disabled()))
        .expect("default config builds a client")
}

/// A Bailiwick Express style story page.
pub(crate) fn be_story_page(headline: &str, paragraphs: &[&str]) -> String {
    let body: String = paragraphs.iter().map(|p| format!("<p>{p}</p>")).collect();
    format!(
        r#"<html><body>
        <header><h1> {headline} </h1></header>
        <time datetime="2026-10-17T09:00:00+01:00">17 October 2026</time>
        <span class="author vcard"><a class="url fn n" href="/author/jane">Jane Doe</a></span>
        <figure class="post-thumbnail"><img src="https://cdn.example.com/thumb.jpg?resize=300,200"></figure>
        <div class="entry-content">{body}</div>
        </body></html>"#
    )
}

/// A listing page with one `<article>` per href.
pub(crate) fn be_listing_page(hrefs: &[&str]) -> String {
    let articles: String = hrefs
        .iter()
        .map(|href| {
            format!(r#"<article><a href="{href}"><img src="x.jpg"></a><h2><a href="{href}">Title</a></h2></article>"#)
        })
        .collect();
    format!("<html><body><main>{articles}</main></body></html>")
}
