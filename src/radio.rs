//! Radio news bulletin script.
//!
//! The bulletin reads the top two Jersey stories, the top two Guernsey
//! stories and the Jersey forecast. Only the script text is produced here;
//! presenters edit it before it is voiced.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::config::ScraperConfig;
use crate::error::Result;
use crate::fetcher::Fetcher;
use crate::models::Story;
use crate::orchestrator::StoryScraper;
use crate::scrapers::BailiwickExpress;
use crate::scrapers::weather::{WeatherRegion, WeatherScraper, WeatherUrls};
use crate::utils::{collapse_whitespace, first_sentences};

/// Stories read per island.
pub const STORIES_PER_ISLAND: usize = 2;

const SENTENCES_PER_STORY: usize = 2;

/// Lead-in for the second, third and fourth stories.
const CONNECTIVES: [&str; 3] = ["In other news, ", "Meanwhile in Guernsey, ", "Also in Guernsey, "];

/// Script text of one bulletin.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct RadioScript(String);

impl RadioScript {
    /// The default script for `stories` (Jersey first, then Guernsey).
    pub fn generate(speaker: &str, stories: &[Story], weather: &str) -> Self {
        let mut script =
            format!("Bailiwick Radio News, I'm {speaker}. Here are today's top stories.\n\n");

        for (i, story) in stories.iter().enumerate() {
            if let Some(connective) = i.checked_sub(1).and_then(|c| CONNECTIVES.get(c)) {
                script.push_str(connective);
            }
            let lead = collapse_whitespace(first_sentences(&story.body_text, SENTENCES_PER_STORY));
            script.push_str(lead.trim_end_matches('.'));
            script.push_str(".\n\n");
        }

        script.push_str("For more on all these stories, visit Bailiwick Express dot com.\n\n");
        script.push_str(&format!("Now for the weather. {weather}\n\n"));
        script.push_str("You're up to date with Bailiwick Radio News.");
        Self(script)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RadioScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything a presenter needs for one bulletin.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RadioBulletin {
    pub speaker: String,
    pub stories: Vec<Story>,
    pub weather: String,
    pub script: RadioScript,
}

/// Gathers bulletin content from both Bailiwick Express editions.
#[derive(Debug, Clone)]
pub struct RadioNews {
    fetcher: Fetcher,
    config: ScraperConfig,
    jersey: BailiwickExpress,
    guernsey: BailiwickExpress,
    weather_urls: WeatherUrls,
}

impl RadioNews {
    pub fn new(fetcher: Fetcher, config: &ScraperConfig) -> Self {
        Self {
            fetcher,
            config: config.clone(),
            jersey: BailiwickExpress::jersey(),
            guernsey: BailiwickExpress::guernsey(),
            weather_urls: WeatherRegion::Jersey.urls(),
        }
    }

    pub fn with_sources(mut self, jersey: BailiwickExpress, guernsey: BailiwickExpress) -> Self {
        self.jersey = jersey;
        self.guernsey = guernsey;
        self
    }

    pub fn with_weather_urls(mut self, urls: WeatherUrls) -> Self {
        self.weather_urls = urls;
        self
    }

    /// Fetches both islands' news and the Jersey weather concurrently.
    #[instrument(level = "info", skip(self))]
    pub async fn bulletin(&self, speaker: &str) -> Result<RadioBulletin> {
        let jersey = StoryScraper::from_config(self.jersey.clone(), self.fetcher.clone(), &self.config);
        let guernsey =
            StoryScraper::from_config(self.guernsey.clone(), self.fetcher.clone(), &self.config);
        let weather = WeatherScraper::new(self.fetcher.clone());

        let (jersey, guernsey, report) = tokio::join!(
            jersey.fetch_n_stories("news", Some(STORIES_PER_ISLAND)),
            guernsey.fetch_n_stories("news", Some(STORIES_PER_ISLAND)),
            weather.get_weather_from(&self.weather_urls),
        );

        let mut stories = jersey?;
        stories.extend(guernsey?);
        let weather = report?.weather_description;
        let script = RadioScript::generate(speaker, &stories, &weather);

        info!(stories = stories.len(), "Generated radio script");
        Ok(RadioBulletin {
            speaker: speaker.to_string(),
            stories,
            weather,
            script,
        })
    }
}
