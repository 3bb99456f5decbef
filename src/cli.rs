//! Command-line interface definitions for Bailiwick News.
//!
//! Every subcommand prints its result as JSON on stdout. Global options can
//! also come from environment variables.

use std::path::PathBuf;

use bailiwick_news::editions::EditionKind;
use bailiwick_news::scrapers::AnySource;
use bailiwick_news::scrapers::weather::WeatherRegion;
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for Bailiwick News.
///
/// # Examples
///
/// ```sh
/// # Five Jersey news stories
/// bailiwick_news stories --source be --section news --limit 5
///
/// # Guernsey weather and tides
/// bailiwick_news weather --region guernsey
///
/// # Jersey edition, keeping editors' changes from ./cache
/// bailiwick_news --cache-dir ./cache edition be
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML scraper configuration file
    #[arg(short, long, env = "BULLETIN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding cached editions
    #[arg(long, env = "BULLETIN_CACHE_DIR", default_value = "cache")]
    pub cache_dir: PathBuf,

    /// Pretty-print JSON output
    #[arg(short, long)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Stories from one section of a news source
    Stories {
        #[arg(short, long, value_enum, default_value_t = Source::Be)]
        source: Source,
        #[arg(long, default_value = "news")]
        section: String,
        /// Maximum number of stories (all listed stories when omitted)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Stories from every section of a news source
    Sections {
        #[arg(short, long, value_enum, default_value_t = Source::Be)]
        source: Source,
        #[arg(short, long)]
        limit_per_section: Option<usize>,
        /// Only list the section ids
        #[arg(long)]
        list: bool,
    },

    /// A single story, parsed with the parser matching its host
    Story { url: String },

    /// Weather forecast and tides
    Weather {
        #[arg(short, long, value_enum, default_value_t = Region::Jersey)]
        region: Region,
    },

    /// Family (death) notices; defaults to the last five days
    Notices {
        /// First day, as YYYY-MM-DD
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Last day, as YYYY-MM-DD
        #[arg(long)]
        to: Option<NaiveDate>,
    },

    /// A newsletter edition (be, ge, jep, aimpremium)
    Edition {
        kind: EditionKind,
        /// Ignore cached editor changes
        #[arg(long)]
        no_cache: bool,
        /// Save the merged edition back to the cache
        #[arg(long)]
        save: bool,
        /// Delete the cached edition instead of assembling one
        #[arg(long, conflicts_with_all = ["no_cache", "save"])]
        clear: bool,
    },

    /// Radio bulletin data and default script
    Radio {
        #[arg(long, default_value = "Bailiwick Radio")]
        speaker: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Source {
    /// Bailiwick Express, Jersey edition
    Be,
    /// Bailiwick Express, Guernsey edition
    Ge,
    /// Jersey Evening Post
    Jep,
}

impl Source {
    pub fn id(self) -> &'static str {
        match self {
            Self::Be => "be",
            Self::Ge => "ge",
            Self::Jep => "jep",
        }
    }

    pub fn build(self) -> Option<AnySource> {
        AnySource::from_id(self.id())
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Region {
    Jersey,
    Guernsey,
}

impl From<Region> for WeatherRegion {
    fn from(region: Region) -> Self {
        match region {
            Region::Jersey => WeatherRegion::Jersey,
            Region::Guernsey => WeatherRegion::Guernsey,
        }
    }
}
