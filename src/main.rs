//! # Bailiwick News
//!
//! Command-line front end for the Channel Islands news scraper. Each
//! subcommand runs one scrape and prints the result as JSON.
//!
//! ## Usage
//!
//! ```sh
//! bailiwick_news stories --source be --section news --limit 5
//! bailiwick_news edition be --save
//! RUST_LOG=debug bailiwick_news weather --region guernsey
//! ```

use std::error::Error;
use std::process::ExitCode;
use std::sync::Arc;

use bailiwick_news::ScrapeError;
use bailiwick_news::cache::{EditionCache, merge_with_cache};
use bailiwick_news::config::ScraperConfig;
use bailiwick_news::editions::{EditionAssembler, EditionKind};
use bailiwick_news::fetcher::Fetcher;
use bailiwick_news::orchestrator::{StoryScraper, fetch_story_by_url};
use bailiwick_news::radio::RadioNews;
use bailiwick_news::scrapers::family_notices::FamilyNoticesScraper;
use bailiwick_news::scrapers::weather::WeatherScraper;
use clap::Parser;
use serde::Serialize;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;

use cli::{Cli, Command, Source};

/// Exit status for a missing section or other bad request.
const EXIT_CLIENT_ERROR: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    let args = Cli::parse();
    debug!(?args.config, ?args.cache_dir, "Parsed CLI arguments");

    match run(args).await {
        Ok(()) => {
            info!(elapsed_ms = start_time.elapsed().as_millis() as u64, "Done");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, elapsed_ms = start_time.elapsed().as_millis() as u64, "Failed");
            ExitCode::from(exit_status(e.as_ref()))
        }
    }
}

#[instrument(skip_all, fields(command = ?args.command))]
async fn run(args: Cli) -> Result<(), Box<dyn Error>> {
    let config = ScraperConfig::load(args.config.as_deref()).await?;
    let limiter = Arc::new(config.rate_limit.build());
    let fetcher = Fetcher::new(&config, limiter)?;

    match args.command {
        Command::Stories { source, section, limit } => {
            let scraper = StoryScraper::from_config(resolve(source)?, fetcher, &config);
            let stories = scraper.fetch_n_stories(&section, limit).await?;
            print_json(&stories, args.pretty)?;
        }
        Command::Sections { source, limit_per_section, list } => {
            let scraper = StoryScraper::from_config(resolve(source)?, fetcher, &config);
            if list {
                print_json(&scraper.available_sections(), args.pretty)?;
            } else {
                let by_section = scraper.fetch_all_sections(limit_per_section).await?;
                print_json(&by_section, args.pretty)?;
            }
        }
        Command::Story { url } => {
            let story = fetch_story_by_url(&fetcher, &url).await?;
            print_json(&story, args.pretty)?;
        }
        Command::Weather { region } => {
            let report = WeatherScraper::new(fetcher).get_weather(region.into()).await?;
            print_json(&report, args.pretty)?;
        }
        Command::Notices { from, to } => {
            let notices = FamilyNoticesScraper::new(fetcher).get_notices(from, to).await?;
            print_json(&notices, args.pretty)?;
        }
        Command::Edition { kind, no_cache, save, clear } => {
            let cache = EditionCache::new(&args.cache_dir);
            if clear {
                cache.clear(kind.as_str()).await?;
            } else {
                let edition = build_edition(kind, fetcher, &config, &cache, !no_cache, save).await?;
                print_json(&edition, args.pretty)?;
            }
        }
        Command::Radio { speaker } => {
            let bulletin = RadioNews::new(fetcher, &config).bulletin(&speaker).await?;
            print_json(&bulletin, args.pretty)?;
        }
    }
    Ok(())
}

/// Process exit status for a failed run: 2 when the request itself was
/// wrong (e.g. an unknown section), 1 otherwise.
fn exit_status(err: &(dyn Error + 'static)) -> u8 {
    match err.downcast_ref::<ScrapeError>() {
        Some(e) if e.is_client_error() => EXIT_CLIENT_ERROR,
        _ => 1,
    }
}

fn resolve(source: Source) -> Result<bailiwick_news::scrapers::AnySource, Box<dyn Error>> {
    source
        .build()
        .ok_or_else(|| format!("no scraper registered for source '{}'", source.id()).into())
}

/// Assembles an edition and merges cached editor changes into it.
#[instrument(level = "info", skip(fetcher, config, cache))]
async fn build_edition(
    kind: EditionKind,
    fetcher: Fetcher,
    config: &ScraperConfig,
    cache: &EditionCache,
    use_cache: bool,
    save: bool,
) -> Result<serde_json::Value, Box<dyn Error>> {
    let fresh = EditionAssembler::new(fetcher, config)
        .assemble(kind)
        .await?
        .to_value()?;

    let cached = if use_cache {
        cache.load(kind.as_str()).await?
    } else {
        None
    };
    let merged = merge_with_cache(kind.as_str(), fresh, cached.as_ref());

    if save {
        cache.save(kind.as_str(), &merged).await?;
    }
    Ok(merged)
}

fn print_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<(), Box<dyn Error>> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{json}");
    Ok(())
}
