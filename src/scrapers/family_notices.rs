//! Jersey Evening Post family notices (deaths) scraper.
//!
//! The notices site exposes its search through a WordPress AJAX endpoint
//! that answers with a JSON envelope whose `html` field holds rendered
//! `div.notice-card` elements.

use chrono::{Duration, Local, NaiveDate};
use once_cell::sync::Lazy;
use scraper::Selector;
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::error::Result;
use crate::fetcher::Fetcher;
use crate::models::{Document, FamilyNotice};
use crate::scrapers::element_text;
use crate::utils::format_name;

pub const NOTICES_ENDPOINT: &str =
    "https://familynotices.jerseyeveningpost.com/wp-admin/admin-ajax.php";

/// Days covered when no start date is given.
pub const DEFAULT_WINDOW_DAYS: i64 = 5;

static CARD: Lazy<Selector> = Lazy::new(|| Selector::parse("div.notice-card").expect("static selector"));
static NAME: Lazy<Selector> = Lazy::new(|| Selector::parse("h3").expect("static selector"));
static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").expect("static selector"));

/// Known funeral directors: text to look for, the lowercase form that marks
/// the name as the deceased's own, and the display name.
const FUNERAL_DIRECTORS: &[(&str, &str, &str)] = &[
    ("Pitcher & Le Quesne", "pitcher & le quesne", "Pitcher & Le Quesne Funeral Directors"),
    ("Maillards", "maillard", "Maillards Funeral Directors"),
    ("De Gruchy", "de gruchy", "De Gruchy's Funeral Care"),
];

#[derive(Debug, Deserialize)]
struct NoticesEnvelope {
    #[serde(default)]
    html: String,
}

#[derive(Debug, Clone)]
pub struct FamilyNoticesScraper {
    fetcher: Fetcher,
    endpoint: String,
}

impl FamilyNoticesScraper {
    pub fn new(fetcher: Fetcher) -> Self {
        Self {
            fetcher,
            endpoint: NOTICES_ENDPOINT.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Death notices published between `start` and `end` inclusive.
    ///
    /// # Arguments
    ///
    /// * `start` - First day of the window; five days before `end` when `None`.
    /// * `end` - Last day of the window; today when `None`.
    ///
    /// # Returns
    ///
    /// One [`FamilyNotice`] per distinct name, in page order. An empty
    /// result page gives an empty list.
    ///
    /// # Errors
    ///
    /// Fails when the search endpoint cannot be fetched or its response is
    /// not the expected JSON envelope.
    #[instrument(level = "info", skip(self))]
    pub async fn get_notices(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<FamilyNotice>> {
        let (start, end) = date_window(start, end, Local::now().date_naive());
        let query = search_query(start, end);

        let envelope: NoticesEnvelope = self.fetcher.fetch_json(&self.endpoint, &query).await?;
        let fragment = Document::parse_fragment(&self.endpoint, &envelope.html);
        let notices = parse_notices(&fragment);

        info!(count = notices.len(), %start, %end, "Fetched family notices");
        Ok(notices)
    }
}

/// Resolves the optional bounds of a search against `today`.
pub fn date_window(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    today: NaiveDate,
) -> (NaiveDate, NaiveDate) {
    let end = end.unwrap_or(today);
    let start = start.unwrap_or(end - Duration::days(DEFAULT_WINDOW_DAYS));
    (start, end)
}

fn search_query(start: NaiveDate, end: NaiveDate) -> Vec<(&'static str, String)> {
    let fixed = [
        ("action", "alm_get_posts"),
        ("query_type", "standard"),
        ("id", "alm_search"),
        ("post_id", "0"),
        ("slug", "home"),
        ("canonical_url", "https://familynotices.jerseyeveningpost.com/"),
        ("posts_per_page", "40"),
        ("page", "0"),
        ("offset", "0"),
        ("post_type", "notice"),
        ("repeater", "default"),
        ("filters", "true"),
        ("filters_startpage", "0"),
        ("filters_target", "search"),
        ("facets", "false"),
        ("theme_repeater", "notice-card.php"),
        ("taxonomy", "notice-category"),
        ("taxonomy_terms", "deaths"),
        ("order", "DESC"),
        ("orderby", "date"),
    ];
    let mut query: Vec<(&'static str, String)> =
        fixed.iter().map(|(k, v)| (*k, v.to_string())).collect();
    query.push((
        "day",
        format!("{} to {}", start.format("%Y-%m-%d"), end.format("%Y-%m-%d")),
    ));
    query
}

/// Notices from a rendered search fragment, deduplicated by raw name.
pub fn parse_notices(fragment: &Document) -> Vec<FamilyNotice> {
    let mut seen = std::collections::HashSet::new();
    let mut notices = Vec::new();

    for card in fragment.html.select(&CARD) {
        let Some(raw_name) = card.select(&NAME).next().map(element_text) else {
            debug!("Notice card without a name; skipping");
            continue;
        };
        if raw_name.is_empty() || !seen.insert(raw_name.clone()) {
            continue;
        }

        let source_url = card
            .select(&LINK)
            .next()
            .and_then(|a| a.value().attr("href"))
            .unwrap_or_default()
            .to_string();
        let text = card.text().collect::<String>();

        notices.push(FamilyNotice {
            display_name: format_name(&raw_name),
            source_url,
            funeral_director: funeral_director(&text, &raw_name),
            extra_text: None,
        });
    }
    notices
}

/// The funeral director named in a notice's text, unless that name is part
/// of the deceased's own name.
pub fn funeral_director(text: &str, name: &str) -> Option<String> {
    let name = name.to_lowercase();
    FUNERAL_DIRECTORS
        .iter()
        .find(|(needle, own_name, _)| text.contains(needle) && !name.contains(own_name))
        .map(|(_, _, display)| display.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_fetcher;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const FRAGMENT: &str = r#"
        <div class="notice-card"><a href="https://familynotices.jerseyeveningpost.com/notice/1/">
          <h3>SMITH, John (né Jones)</h3><p>Arrangements by Pitcher &amp; Le Quesne.</p></a></div>
        <div class="notice-card"><a href="https://familynotices.jerseyeveningpost.com/notice/2/">
          <h3>Maillard, Anne</h3><p>Enquiries to Maillards.</p></a></div>
        <div class="notice-card"><a href="https://familynotices.jerseyeveningpost.com/notice/1b/">
          <h3>SMITH, John (né Jones)</h3></a></div>
        <div class="notice-card"><a href="https://familynotices.jerseyeveningpost.com/notice/3/">
          <h3>Le Brun, Mary (née Renouf)</h3><p>De Gruchy care.</p></a></div>
        <div class="notice-card"><p>No name here</p></div>
    "#;

    fn fragment() -> Document {
        Document::parse_fragment(NOTICES_ENDPOINT, FRAGMENT)
    }

    #[test]
    fn test_parse_notices_formats_and_dedupes() {
        let notices = parse_notices(&fragment());
        let names: Vec<&str> = notices.iter().map(|n| n.display_name.as_str()).collect();
        assert_eq!(names, vec!["John Smith (né Jones)", "Anne Maillard", "Mary Le Brun (née Renouf)"]);
        assert_eq!(notices[0].source_url, "https://familynotices.jerseyeveningpost.com/notice/1/");
    }

    #[test]
    fn test_parse_notices_funeral_directors() {
        let notices = parse_notices(&fragment());
        assert_eq!(
            notices[0].funeral_director.as_deref(),
            Some("Pitcher & Le Quesne Funeral Directors")
        );
        // The deceased's own surname is not a funeral director reference.
        assert_eq!(notices[1].funeral_director, None);
        assert_eq!(notices[2].funeral_director.as_deref(), Some("De Gruchy's Funeral Care"));
    }

    #[test]
    fn test_funeral_director_none_when_absent() {
        assert_eq!(funeral_director("Private service", "Doe, Jane"), None);
    }

    #[test]
    fn test_date_window_defaults() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let (start, end) = date_window(None, None, today);
        assert_eq!(end, today);
        assert_eq!(start, NaiveDate::from_ymd_opt(2026, 10, 13).unwrap());

        let explicit_end = NaiveDate::from_ymd_opt(2026, 10, 1).unwrap();
        let (start, end) = date_window(None, Some(explicit_end), today);
        assert_eq!(end, explicit_end);
        assert_eq!(start, NaiveDate::from_ymd_opt(2026, 9, 26).unwrap());
    }

    #[test]
    fn test_search_query_carries_range_and_category() {
        let start = NaiveDate::from_ymd_opt(2026, 10, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 10, 5).unwrap();
        let query = search_query(start, end);
        assert!(query.contains(&("taxonomy_terms", "deaths".to_string())));
        assert!(query.contains(&("day", "2026-10-01 to 2026-10-05".to_string())));
    }

    #[tokio::test]
    async fn test_get_notices_from_mock_endpoint() {
        let server = MockServer::start().await;
        let envelope = serde_json::json!({ "html": FRAGMENT });
        Mock::given(method("GET"))
            .and(path("/admin-ajax.php"))
            .and(query_param("action", "alm_get_posts"))
            .and(query_param("day", "2026-10-01 to 2026-10-05"))
            .respond_with(ResponseTemplate::new(200).set_body_json(envelope))
            .mount(&server)
            .await;

        let scraper = FamilyNoticesScraper::new(test_fetcher())
            .with_endpoint(format!("{}/admin-ajax.php", server.uri()));
        let notices = scraper
            .get_notices(
                NaiveDate::from_ymd_opt(2026, 10, 1),
                NaiveDate::from_ymd_opt(2026, 10, 5),
            )
            .await
            .unwrap();
        assert_eq!(notices.len(), 3);
    }
}
