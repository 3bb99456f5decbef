//! BBC Weather forecast and tide-table scraper.
//!
//! Each region has a forecast page and a tide-table page. Extraction
//! problems never fail the call: a missing forecast block or an unreadable
//! tide table degrade to an empty string, which callers treat as
//! "unavailable". Only HTTP failures propagate.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::error::Result;
use crate::fetcher::Fetcher;
use crate::models::WeatherReport;
use crate::scrapers::element_text;
use crate::utils::to_twelve_hour;

/// Only the first few rows of a tide table cover today.
const TIDE_ROWS: usize = 5;

static FORECAST_PARAGRAPHS: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("div.ssrcss-1cxacys-TextContent p").expect("static selector")
});
static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").expect("static selector"));
static ROW_HEADER: Lazy<Selector> = Lazy::new(|| Selector::parse("th").expect("static selector"));
static CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("td").expect("static selector"));

/// Page pair scraped for one region.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct WeatherUrls {
    pub weather_url: String,
    pub tides_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherRegion {
    /// St Helier forecast, St Helier tides.
    Jersey,
    /// St Peter Port forecast, St Peter Port tides.
    Guernsey,
}

impl WeatherRegion {
    pub fn urls(self) -> WeatherUrls {
        let (weather, tides) = match self {
            Self::Jersey => (
                "https://www.bbc.co.uk/weather/3042091",
                "https://www.bbc.co.uk/weather/coast-and-sea/tide-tables/10/1605",
            ),
            Self::Guernsey => (
                "https://www.bbc.co.uk/weather/6296594",
                "https://www.bbc.co.uk/weather/coast-and-sea/tide-tables/10/1604",
            ),
        };
        WeatherUrls {
            weather_url: weather.to_string(),
            tides_url: tides.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WeatherScraper {
    fetcher: Fetcher,
}

impl WeatherScraper {
    pub fn new(fetcher: Fetcher) -> Self {
        Self { fetcher }
    }

    /// Forecast and tides for a fixed region.
    ///
    /// # Arguments
    ///
    /// * `region` - Jersey (St Helier) or Guernsey (St Peter Port).
    ///
    /// # Returns
    ///
    /// A [`WeatherReport`]. A description that cannot be extracted from its
    /// page is left empty.
    ///
    /// # Errors
    ///
    /// [`ScrapeError::Fetch`](crate::error::ScrapeError::Fetch) when either
    /// page cannot be fetched.
    #[instrument(level = "info", skip(self))]
    pub async fn get_weather(&self, region: WeatherRegion) -> Result<WeatherReport> {
        self.get_weather_from(&region.urls()).await
    }

    /// Forecast and tides from an explicit page pair. The two pages are
    /// fetched one after the other.
    #[instrument(level = "info", skip_all, fields(weather_url = %urls.weather_url, tides_url = %urls.tides_url))]
    pub async fn get_weather_from(&self, urls: &WeatherUrls) -> Result<WeatherReport> {
        // Parsed pages are dropped before the next await.
        let weather_description = {
            let page = self.fetcher.fetch(&urls.weather_url).await?;
            describe_weather(&page.html)
        };
        let tides_description = {
            let page = self.fetcher.fetch(&urls.tides_url).await?;
            describe_tides(&page.html)
        };

        info!(
            weather_chars = weather_description.len(),
            tides_chars = tides_description.len(),
            "Fetched weather report"
        );
        Ok(WeatherReport {
            weather_description,
            tides_description,
        })
    }
}

/// The forecast summary: the second paragraph of the forecast text block.
pub fn describe_weather(html: &Html) -> String {
    match html.select(&FORECAST_PARAGRAPHS).nth(1) {
        Some(p) => element_text(p),
        None => {
            warn!("Forecast text block not found; weather unavailable");
            String::new()
        }
    }
}

/// "Low tides at 06:15 AM, 06:40 PM, with high tides at 12:30 PM".
///
/// Rows are classified by the word "low" or "high" in their header cell.
/// Rows without a header, without a time cell, or with an unreadable time
/// are skipped.
pub fn describe_tides(html: &Html) -> String {
    let mut low = Vec::new();
    let mut high = Vec::new();

    for row in html.select(&ROW).take(TIDE_ROWS) {
        let Some(header) = row.select(&ROW_HEADER).next() else {
            continue;
        };
        let label = element_text(header).to_lowercase();
        let bucket = if label.contains("low") {
            &mut low
        } else if label.contains("high") {
            &mut high
        } else {
            continue;
        };

        let Some(cell) = row.select(&CELL).next() else {
            debug!(%label, "Tide row without a time cell");
            continue;
        };
        let raw = element_text(cell);
        match to_twelve_hour(&raw) {
            Some(time) => bucket.push(time),
            None => debug!(%label, time = %raw, "Skipping unreadable tide time"),
        }
    }

    if low.is_empty() && high.is_empty() {
        warn!("No tide times found; tides unavailable");
        return String::new();
    }
    format!(
        "Low tides at {}, with high tides at {}",
        low.join(", "),
        high.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_fetcher;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const FORECAST: &str = r#"<html><body>
        <div class="ssrcss-1cxacys-TextContent e18m38lv2">
          <p>Forecast for Jersey</p>
          <p>Bright spells and a light breeze, turning cloudy later.</p>
        </div></body></html>"#;

    const TIDES: &str = r#"<html><body><table>
        <tr><th>Tide</th><td>Time</td></tr>
        <tr><th>Low Tide</th><td>06:15 1.2m</td></tr>
        <tr><th>High Tide</th><td>12:30 10.9m</td></tr>
        <tr><th>Low Tide</th><td>18:40 1.4m</td></tr>
        <tr><th>High Tide</th><td>--:--</td></tr>
        <tr><th>High Tide</th><td>23:59 Tomorrow</td></tr>
        </table></body></html>"#;

    #[test]
    fn test_describe_weather_takes_second_paragraph() {
        let html = Html::parse_document(FORECAST);
        assert_eq!(
            describe_weather(&html),
            "Bright spells and a light breeze, turning cloudy later."
        );
    }

    #[test]
    fn test_describe_weather_degrades_to_empty() {
        let html = Html::parse_document("<div class=\"other\"><p>a</p><p>b</p></div>");
        assert_eq!(describe_weather(&html), "");
    }

    #[test]
    fn test_describe_tides_composes_sentence() {
        let html = Html::parse_document(TIDES);
        assert_eq!(
            describe_tides(&html),
            "Low tides at 06:15 AM, 06:40 PM, with high tides at 12:30 PM"
        );
    }

    #[test]
    fn test_describe_tides_without_table_is_empty() {
        let html = Html::parse_document("<p>No table today</p>");
        assert_eq!(describe_tides(&html), "");
    }

    #[test]
    fn test_region_urls_differ() {
        assert_ne!(WeatherRegion::Jersey.urls(), WeatherRegion::Guernsey.urls());
    }

    #[tokio::test]
    async fn test_get_weather_from_mock_pages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_string(FORECAST))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/tides"))
            .respond_with(ResponseTemplate::new(200).set_body_string(TIDES))
            .mount(&server)
            .await;

        let urls = WeatherUrls {
            weather_url: format!("{}/weather", server.uri()),
            tides_url: format!("{}/tides", server.uri()),
        };
        let report = WeatherScraper::new(test_fetcher())
            .get_weather_from(&urls)
            .await
            .unwrap();
        assert!(report.weather_description.starts_with("Bright spells"));
        assert!(report.tides_description.contains("06:15 AM"));
    }

    #[tokio::test]
    async fn test_get_weather_propagates_http_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let urls = WeatherUrls {
            weather_url: format!("{}/weather", server.uri()),
            tides_url: format!("{}/tides", server.uri()),
        };
        assert!(WeatherScraper::new(test_fetcher()).get_weather_from(&urls).await.is_err());
    }
}
