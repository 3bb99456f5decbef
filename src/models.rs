//! Data models produced by the scraping layer.
//!
//! This module defines the value objects handed to callers:
//! - [`Document`]: a parsed page bound to the URL it was requested from
//! - [`Story`]: a normalized news story
//! - [`WeatherReport`]: weather and tide descriptions for one region
//! - [`FamilyNotice`]: a death notice listing
//! - [`SectionMap`]: the fixed section → listing page table of a source
//! - [`StoriesBySection`]: ordered results of a whole-source scrape
//!
//! All of them are created per request and discarded once the caller has
//! rendered or cached them.

use chrono::NaiveDateTime;
use scraper::Html;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// A parsed HTML page.
///
/// `url` is always the URL the caller asked for, never the cache-busted
/// variant that actually went over the wire.
#[derive(Debug, Clone)]
pub struct Document {
    pub url: String,
    pub html: Html,
}

impl Document {
    pub fn new(url: impl Into<String>, html: Html) -> Self {
        Self {
            url: url.into(),
            html,
        }
    }

    /// Parses a full HTML page.
    pub fn parse(url: impl Into<String>, body: &str) -> Self {
        Self::new(url, Html::parse_document(body))
    }

    /// Parses an HTML fragment (e.g. the `html` field of a JSON envelope).
    pub fn parse_fragment(url: impl Into<String>, body: &str) -> Self {
        Self::new(url, Html::parse_fragment(body))
    }
}

/// A single parsed article.
///
/// `headline` and `body_text` are never empty on a `Story` returned by a
/// parser; a page without them fails with
/// [`ScrapeError::Parse`](crate::error::ScrapeError::Parse) instead.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Story {
    pub headline: String,
    pub body_text: String,
    pub published_at: Option<NaiveDateTime>,
    /// Byline, or the source's own name when no byline exists.
    pub author: String,
    /// Canonical fetch URL.
    pub source_url: String,
    /// Thumbnail URL without query string.
    pub image_url: Option<String>,
}

/// Weather and tide descriptions for one region.
///
/// Either field may be empty, meaning "unavailable"; extraction failures
/// degrade to an empty string rather than an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct WeatherReport {
    pub weather_description: String,
    pub tides_description: String,
}

/// A family (death) notice.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FamilyNotice {
    /// Name reformatted as "First Last (Extra)".
    pub display_name: String,
    pub source_url: String,
    pub funeral_director: Option<String>,
    pub extra_text: Option<String>,
}

/// Fixed, ordered mapping from section id to listing page URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionMap {
    entries: Vec<(String, String)>,
}

impl SectionMap {
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Builds a map from a static table.
    pub fn from_static(entries: &[(&str, &str)]) -> Self {
        Self::new(entries.iter().copied())
    }

    /// Listing page URL for `section`.
    pub fn get(&self, section: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(id, _)| id == section)
            .map(|(_, url)| url.as_str())
    }

    /// Section ids in configured order.
    pub fn ids(&self) -> Vec<String> {
        self.entries.iter().map(|(id, _)| id.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Stories for every section of a source, in [`SectionMap`] order.
///
/// Serializes as a JSON object whose keys keep that order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoriesBySection {
    sections: Vec<(String, Vec<Story>)>,
}

impl StoriesBySection {
    pub fn get(&self, section: &str) -> Option<&[Story]> {
        self.sections
            .iter()
            .find(|(id, _)| id == section)
            .map(|(_, stories)| stories.as_slice())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|(id, _)| id.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Story])> {
        self.sections
            .iter()
            .map(|(id, stories)| (id.as_str(), stories.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn total_stories(&self) -> usize {
        self.sections.iter().map(|(_, s)| s.len()).sum()
    }
}

impl FromIterator<(String, Vec<Story>)> for StoriesBySection {
    fn from_iter<T: IntoIterator<Item = (String, Vec<Story>)>>(iter: T) -> Self {
        Self {
            sections: iter.into_iter().collect(),
        }
    }
}

impl Serialize for StoriesBySection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.sections.len()))?;
        for (id, stories) in &self.sections {
            map.serialize_entry(id, stories)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn story(headline: &str) -> Story {
        Story {
            headline: headline.to_string(),
            body_text: "Islanders gathered. More followed.".to_string(),
            published_at: None,
            author: "Bailiwick Express".to_string(),
            source_url: "https://www.bailiwickexpress.com/news/a".to_string(),
            image_url: None,
        }
    }

    #[test]
    fn test_section_map_preserves_order() {
        let map = SectionMap::from_static(&[
            ("news", "https://example.com/news/"),
            ("sport", "https://example.com/sport/"),
            ("business", "https://example.com/business/"),
        ]);
        assert_eq!(map.ids(), vec!["news", "sport", "business"]);
        assert_eq!(map.get("sport"), Some("https://example.com/sport/"));
        assert_eq!(map.get("weather"), None);
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_stories_by_section_serializes_in_order() {
        let by_section: StoriesBySection = vec![
            ("sport".to_string(), vec![story("Match report")]),
            ("news".to_string(), vec![]),
        ]
        .into_iter()
        .collect();

        let json = serde_json::to_string(&by_section).unwrap();
        let sport = json.find("\"sport\"").unwrap();
        let news = json.find("\"news\"").unwrap();
        assert!(sport < news);
        assert!(json.contains("\"news\":[]"));
        assert_eq!(by_section.total_stories(), 1);
    }

    #[test]
    fn test_weather_report_default_is_unavailable() {
        let report = WeatherReport::default();
        assert!(report.weather_description.is_empty());
        assert!(report.tides_description.is_empty());
    }
}
