//! Bulletin edition assembly.
//!
//! An edition is the structured record a newsletter template is rendered
//! from. Scraped content (stories, weather, notices) is gathered
//! concurrently; the hand-curated parts (top image, adverts, covers,
//! foreword) start empty and are filled from the
//! [`EditionCache`](crate::cache::EditionCache) by the caller.
//!
//! | Kind | Source | Content |
//! |------|--------|---------|
//! | `be` | Bailiwick Express (Jersey) | six sections, Jersey weather, family notices |
//! | `ge` | Bailiwick Express (Guernsey) | six sections, Guernsey weather |
//! | `jep` | Jersey Evening Post | news |
//! | `aimpremium` | Jersey Evening Post | premium |

use std::fmt;
use std::str::FromStr;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::config::ScraperConfig;
use crate::error::{Result, ScrapeError};
use crate::fetcher::Fetcher;
use crate::models::{FamilyNotice, Story};
use crate::orchestrator::StoryScraper;
use crate::scrapers::bailiwick::Edition as Island;
use crate::scrapers::family_notices::{FamilyNoticesScraper, NOTICES_ENDPOINT};
use crate::scrapers::weather::{WeatherRegion, WeatherScraper, WeatherUrls};
use crate::scrapers::{BailiwickExpress, JerseyEveningPost};

/// Lead section size.
const LEAD_STORIES: usize = 10;
/// Size of every secondary section.
const SECONDARY_STORIES: usize = 2;

/// Newsletter flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditionKind {
    Be,
    Ge,
    Jep,
    AimPremium,
}

impl EditionKind {
    pub const ALL: [EditionKind; 4] = [Self::Be, Self::Ge, Self::Jep, Self::AimPremium];

    /// Identifier used for cache files and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Be => "be",
            Self::Ge => "ge",
            Self::Jep => "jep",
            Self::AimPremium => "aimpremium",
        }
    }
}

impl fmt::Display for EditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EditionKind {
    type Err = ScrapeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                ScrapeError::Config(format!(
                    "unknown edition '{s}', expected one of {:?}",
                    Self::ALL.map(Self::as_str)
                ))
            })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Advert {
    pub url: String,
    pub image_url: String,
}

/// Lead picture at the top of a Bailiwick Express edition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct TopImage {
    pub url: String,
    pub image_url: String,
    pub author: Option<String>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Foreword {
    pub title: String,
    pub author: String,
    pub job_title: String,
    pub image_url: String,
    pub text: String,
}

/// Bailiwick Express daily edition (Jersey or Guernsey).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BailiwickEdition {
    pub top_image: TopImage,
    pub tides: String,
    pub weather: String,
    pub date: String,
    pub news_stories: Vec<Story>,
    pub horizontal_adverts: Vec<Advert>,
    pub vertical_adverts: Vec<Advert>,
    pub opinion_stories: Vec<Story>,
    pub sports_stories: Vec<Story>,
    pub business_stories: Vec<Story>,
    pub connect_image_url: String,
    pub community_stories: Vec<Story>,
    pub podcast_stories: Vec<Story>,
    /// Jersey only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_notices: Option<Vec<FamilyNotice>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EveningPostEdition {
    pub jep_cover_url: String,
    pub publication_cover_url: String,
    pub date: String,
    pub news_stories: Vec<Story>,
    pub adverts: Vec<Advert>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PremiumEdition {
    pub title: String,
    pub news_stories: Vec<Story>,
    pub foreword: Foreword,
}

/// Any assembled edition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EditionRecord {
    Bailiwick(BailiwickEdition),
    EveningPost(EveningPostEdition),
    Premium(PremiumEdition),
}

impl EditionRecord {
    pub fn to_value(&self) -> Result<serde_json::Value> {
        serde_json::to_value(self).map_err(|e| ScrapeError::Decode {
            url: "edition record".to_string(),
            reason: e.to_string(),
        })
    }
}

/// "18 October 2026".
pub fn edition_date(day: NaiveDate) -> String {
    day.format("%-d %B %Y").to_string()
}

/// Builds editions from the live sites.
///
/// Every site location can be overridden, which is how the assembler is
/// pointed at mirrors or mock servers.
#[derive(Debug, Clone)]
pub struct EditionAssembler {
    fetcher: Fetcher,
    config: ScraperConfig,
    jersey: BailiwickExpress,
    guernsey: BailiwickExpress,
    evening_post: JerseyEveningPost,
    jersey_weather: WeatherUrls,
    guernsey_weather: WeatherUrls,
    notices_endpoint: String,
}

impl EditionAssembler {
    pub fn new(fetcher: Fetcher, config: &ScraperConfig) -> Self {
        Self {
            fetcher,
            config: config.clone(),
            jersey: BailiwickExpress::jersey(),
            guernsey: BailiwickExpress::guernsey(),
            evening_post: JerseyEveningPost::new(),
            jersey_weather: WeatherRegion::Jersey.urls(),
            guernsey_weather: WeatherRegion::Guernsey.urls(),
            notices_endpoint: NOTICES_ENDPOINT.to_string(),
        }
    }

    /// Replaces the Bailiwick Express source for its own island.
    pub fn with_bailiwick(mut self, source: BailiwickExpress) -> Self {
        match source.edition() {
            Island::Jersey => self.jersey = source,
            Island::Guernsey => self.guernsey = source,
        }
        self
    }

    pub fn with_evening_post(mut self, source: JerseyEveningPost) -> Self {
        self.evening_post = source;
        self
    }

    pub fn with_weather_urls(mut self, region: WeatherRegion, urls: WeatherUrls) -> Self {
        match region {
            WeatherRegion::Jersey => self.jersey_weather = urls,
            WeatherRegion::Guernsey => self.guernsey_weather = urls,
        }
        self
    }

    pub fn with_notices_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.notices_endpoint = endpoint.into();
        self
    }

    /// Assembles `kind` dated today.
    pub async fn assemble(&self, kind: EditionKind) -> Result<EditionRecord> {
        self.assemble_on(kind, Local::now().date_naive()).await
    }

    #[instrument(level = "info", skip(self))]
    pub async fn assemble_on(&self, kind: EditionKind, day: NaiveDate) -> Result<EditionRecord> {
        let record = match kind {
            EditionKind::Be => EditionRecord::Bailiwick(self.bailiwick(Island::Jersey, day).await?),
            EditionKind::Ge => EditionRecord::Bailiwick(self.bailiwick(Island::Guernsey, day).await?),
            EditionKind::Jep => EditionRecord::EveningPost(self.evening_post(day).await?),
            EditionKind::AimPremium => EditionRecord::Premium(self.premium().await?),
        };
        info!(%kind, "Assembled edition");
        Ok(record)
    }

    /// Six sections, the island's weather and (Jersey only) family notices,
    /// all fetched concurrently.
    pub async fn bailiwick(&self, island: Island, day: NaiveDate) -> Result<BailiwickEdition> {
        let (source, weather_urls) = match island {
            Island::Jersey => (self.jersey.clone(), &self.jersey_weather),
            Island::Guernsey => (self.guernsey.clone(), &self.guernsey_weather),
        };
        let scraper = StoryScraper::from_config(source, self.fetcher.clone(), &self.config);
        let weather = WeatherScraper::new(self.fetcher.clone());
        let notices = async {
            match island {
                Island::Jersey => FamilyNoticesScraper::new(self.fetcher.clone())
                    .with_endpoint(self.notices_endpoint.clone())
                    .get_notices(None, Some(day))
                    .await
                    .map(Some),
                Island::Guernsey => Ok(None),
            }
        };

        let (news, sport, business, opinion, community, podcasts, report, family_notices) = tokio::join!(
            scraper.fetch_n_stories("news", Some(LEAD_STORIES)),
            scraper.fetch_n_stories("sport", Some(SECONDARY_STORIES)),
            scraper.fetch_n_stories("business", Some(SECONDARY_STORIES)),
            scraper.fetch_n_stories("opinion", Some(SECONDARY_STORIES)),
            scraper.fetch_n_stories("community", Some(SECONDARY_STORIES)),
            scraper.fetch_n_stories("podcasts", Some(SECONDARY_STORIES)),
            weather.get_weather_from(weather_urls),
            notices,
        );
        let report = report?;

        Ok(BailiwickEdition {
            top_image: TopImage::default(),
            tides: report.tides_description,
            weather: report.weather_description,
            date: edition_date(day),
            news_stories: news?,
            horizontal_adverts: Vec::new(),
            vertical_adverts: Vec::new(),
            opinion_stories: opinion?,
            sports_stories: sport?,
            business_stories: business?,
            connect_image_url: String::new(),
            community_stories: community?,
            podcast_stories: podcasts?,
            family_notices: family_notices?,
        })
    }

    pub async fn evening_post(&self, day: NaiveDate) -> Result<EveningPostEdition> {
        let scraper =
            StoryScraper::from_config(self.evening_post.clone(), self.fetcher.clone(), &self.config);
        Ok(EveningPostEdition {
            jep_cover_url: String::new(),
            publication_cover_url: String::new(),
            date: edition_date(day),
            news_stories: scraper.fetch_n_stories("news", Some(LEAD_STORIES)).await?,
            adverts: Vec::new(),
        })
    }

    pub async fn premium(&self) -> Result<PremiumEdition> {
        let scraper =
            StoryScraper::from_config(self.evening_post.clone(), self.fetcher.clone(), &self.config);
        Ok(PremiumEdition {
            title: String::new(),
            news_stories: scraper.fetch_n_stories("premium", Some(LEAD_STORIES)).await?,
            foreword: Foreword::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SectionMap;
    use crate::test_support::{be_listing_page, be_story_page, test_fetcher};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SECTIONS: [&str; 6] = ["news", "business", "sport", "opinion", "community", "podcasts"];

    async fn mount_page(server: &MockServer, route: &str, body: String) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    #[test]
    fn test_edition_date_format() {
        assert_eq!(edition_date(day()), "18 October 2026");
        assert_eq!(edition_date(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()), "1 March 2026");
    }

    #[test]
    fn test_edition_kind_round_trip_names() {
        for kind in EditionKind::ALL {
            assert_eq!(kind.as_str().parse::<EditionKind>().unwrap(), kind);
        }
        assert_eq!("AIMPremium".parse::<EditionKind>().unwrap(), EditionKind::AimPremium);
        assert!("daily".parse::<EditionKind>().is_err());
    }

    #[tokio::test]
    async fn test_guernsey_edition_has_no_notices() {
        let server = MockServer::start().await;
        for section in SECTIONS {
            let story = format!("/{section}/1");
            mount_page(&server, &format!("/{section}/"), be_listing_page(&[story.as_str()])).await;
            mount_page(&server, &story, be_story_page(section, &["Body."])).await;
        }
        mount_page(
            &server,
            "/weather",
            r#"<div class="ssrcss-1cxacys-TextContent"><p>Title</p><p>Sunny.</p></div>"#.to_string(),
        )
        .await;
        mount_page(&server, "/tides", "<table></table>".to_string()).await;

        let sections = SectionMap::new(
            SECTIONS
                .iter()
                .map(|s| (s.to_string(), format!("{}/{s}/", server.uri()))),
        );
        let assembler = EditionAssembler::new(test_fetcher(), &ScraperConfig::default())
            .with_bailiwick(BailiwickExpress::guernsey().with_sections(sections))
            .with_weather_urls(
                WeatherRegion::Guernsey,
                WeatherUrls {
                    weather_url: format!("{}/weather", server.uri()),
                    tides_url: format!("{}/tides", server.uri()),
                },
            );

        let record = assembler.assemble_on(EditionKind::Ge, day()).await.unwrap();
        let EditionRecord::Bailiwick(edition) = &record else {
            panic!("expected a Bailiwick edition");
        };
        assert_eq!(edition.date, "18 October 2026");
        assert_eq!(edition.weather, "Sunny.");
        assert_eq!(edition.tides, "");
        assert_eq!(edition.news_stories[0].headline, "news");
        assert_eq!(edition.sports_stories[0].headline, "sport");
        assert_eq!(edition.podcast_stories.len(), 1);
        assert!(edition.family_notices.is_none());

        let value = record.to_value().unwrap();
        assert!(value.get("family_notices").is_none());
        assert_eq!(value["top_image"]["url"], "");
    }

    #[tokio::test]
    async fn test_premium_edition_uses_premium_section() {
        let server = MockServer::start().await;
        mount_page(
            &server,
            "/premium/",
            r#"<h2 class="entry-title"><a href="/p/1">P</a></h2>"#.to_string(),
        )
        .await;
        mount_page(
            &server,
            "/p/1",
            r#"<h1 class="entry-title">Premium read</h1><div class="entry-content"><p>EXCLUSIVE analysis.</p></div>"#
                .to_string(),
        )
        .await;

        let source = JerseyEveningPost::new().with_sections(SectionMap::new([
            ("news", format!("{}/news/", server.uri())),
            ("premium", format!("{}/premium/", server.uri())),
        ]));
        let record = EditionAssembler::new(test_fetcher(), &ScraperConfig::default())
            .with_evening_post(source)
            .assemble_on(EditionKind::AimPremium, day())
            .await
            .unwrap();

        let EditionRecord::Premium(edition) = record else {
            panic!("expected a premium edition");
        };
        assert_eq!(edition.title, "");
        assert_eq!(edition.news_stories.len(), 1);
        assert_eq!(edition.news_stories[0].body_text, "Exclusive analysis.");
        assert_eq!(edition.foreword, Foreword::default());
    }
}
