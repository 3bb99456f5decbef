//! Rate-limited, cache-busted HTTP fetching.
//!
//! Every outbound GET goes through [`Fetcher`], which:
//!
//! 1. waits on the shared [`RateLimiter`],
//! 2. appends `_t={unix seconds}&_r={random}` so CDNs and proxies cannot
//!    answer from a stale cache,
//! 3. fails with [`ScrapeError::Fetch`] on any non-2xx status, timeout or
//!    transport error.
//!
//! No retries happen here.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use futures::future::join_all;
use rand::{Rng, rng};
use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, USER_AGENT};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::ScraperConfig;
use crate::error::{Result, ScrapeError};
use crate::models::Document;
use crate::rate_limiter::RateLimiter;
use crate::utils::truncate_for_log;

/// HTTP client bound to a shared rate limiter.
///
/// Cheap to clone: the underlying `reqwest::Client` and the limiter are both
/// reference counted.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    limiter: Arc<RateLimiter>,
}

impl Fetcher {
    /// Builds a fetcher from configuration and an injected limiter.
    pub fn new(config: &ScraperConfig, limiter: Arc<RateLimiter>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let agent = HeaderValue::from_str(&config.user_agent)
            .map_err(|e| ScrapeError::Config(format!("invalid user agent: {e}")))?;
        headers.insert(USER_AGENT, agent);
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/json;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-GB,en;q=0.9"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ScrapeError::Config(format!("failed to build HTTP client: {e}")))?;

        debug!(
            max_requests = limiter.max_requests(),
            period_ms = limiter.period().as_millis() as u64,
            disabled = limiter.is_disabled(),
            "Fetcher ready"
        );
        Ok(Self { client, limiter })
    }

    /// Fetches and parses one HTML page.
    #[instrument(level = "debug", skip_all, fields(%url))]
    pub async fn fetch(&self, url: &str) -> Result<Document> {
        let body = self.get_text(url, &[]).await?;
        debug!(bytes = body.len(), "Fetched page");
        Ok(Document::parse(url, &body))
    }

    /// Fetches every URL concurrently and returns the documents in input
    /// order.
    ///
    /// # Arguments
    ///
    /// * `urls` - Absolute page URLs. Each one waits on the shared limiter
    ///   before its request goes out.
    ///
    /// # Returns
    ///
    /// One [`Document`] per URL, in the order given.
    ///
    /// # Errors
    ///
    /// All fetches run to completion even when one fails; the first failure
    /// (in input order) is then returned.
    #[instrument(level = "info", skip_all, fields(count = urls.len()))]
    pub async fn fetch_all(&self, urls: &[String]) -> Result<Vec<Document>> {
        self.fetch_each(urls).await.into_iter().collect()
    }

    /// Fetches every URL concurrently, keeping each outcome, in input order.
    pub async fn fetch_each(&self, urls: &[String]) -> Vec<Result<Document>> {
        join_all(urls.iter().map(|url| self.fetch(url))).await
    }

    /// Fetches a JSON document with extra query parameters.
    #[instrument(level = "debug", skip_all, fields(%url))]
    pub async fn fetch_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let body = self.get_text(url, query).await?;
        serde_json::from_str(&body).map_err(|e| {
            warn!(%url, body = %truncate_for_log(&body, 200), "Response is not valid JSON");
            ScrapeError::Decode {
                url: url.to_string(),
                reason: e.to_string(),
            }
        })
    }

    async fn get_text(&self, url: &str, query: &[(&str, String)]) -> Result<String> {
        let busted = cache_busted(url);

        self.limiter.acquire().await;

        let response = self
            .client
            .get(&busted)
            .query(query)
            .send()
            .await
            .map_err(|e| {
                let reason = if e.is_timeout() {
                    "request timed out".to_string()
                } else {
                    e.to_string()
                };
                warn!(%url, %reason, "Request failed");
                ScrapeError::fetch(url, reason)
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(%url, %status, "Non-success status");
            return Err(ScrapeError::fetch(url, format!("HTTP {status}")));
        }

        response
            .text()
            .await
            .map_err(|e| ScrapeError::fetch(url, e))
    }
}

/// Appends throwaway `_t` and `_r` query parameters to `url`.
///
/// Any `#fragment` is dropped; it is never sent and would otherwise swallow
/// the parameters.
pub fn cache_busted(url: &str) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
        .to_string();
    let nonce = rng().random_range(1000..=9999u32).to_string();

    match Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_fragment(None);
            parsed
                .query_pairs_mut()
                .append_pair("_t", &now)
                .append_pair("_r", &nonce);
            parsed.into()
        }
        Err(_) => {
            let url = url.split('#').next().unwrap_or_default();
            let separator = if url.contains('?') { '&' } else { '?' };
            format!("{url}{separator}_t={now}&_r={nonce}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_fetcher;
    use std::time::{Duration, Instant};
    use wiremock::matchers::{method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    #[test]
    fn test_cache_busted_appends_params() {
        let busted = cache_busted("https://example.com/news/");
        assert!(busted.starts_with("https://example.com/news/?_t="));
        assert!(busted.contains("&_r="));

        let busted = cache_busted("https://example.com/search?q=x");
        assert!(busted.starts_with("https://example.com/search?q=x&_t="));
    }

    #[test]
    fn test_cache_busted_drops_fragment() {
        let busted = cache_busted("https://example.com/story/#comments");
        assert!(!busted.contains('#'));
        assert!(busted.starts_with("https://example.com/story/?_t="));

        let parsed = Url::parse(&busted).unwrap();
        let keys: Vec<String> = parsed.query_pairs().map(|(k, _)| k.into_owned()).collect();
        assert_eq!(keys, ["_t", "_r"]);
    }

    #[test]
    fn test_cache_busted_nonce_range() {
        let busted = cache_busted("https://example.com/");
        let nonce: u32 = busted.rsplit("_r=").next().unwrap().parse().unwrap();
        assert!((1000..=9999).contains(&nonce));
    }

    #[tokio::test]
    async fn test_fetch_records_original_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/story"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<h1>Hi</h1>"))
            .mount(&server)
            .await;

        let url = format!("{}/story", server.uri());
        let doc = test_fetcher().fetch(&url).await.unwrap();
        assert_eq!(doc.url, url);

        let requests: Vec<Request> = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        let query = requests[0].url.query().unwrap_or_default();
        assert!(query.contains("_t="));
        assert!(query.contains("_r="));
    }

    #[tokio::test]
    async fn test_fetch_with_fragment_still_sends_cache_buster() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/story/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<h1>Hi</h1>"))
            .mount(&server)
            .await;

        let url = format!("{}/story/#comments", server.uri());
        let doc = test_fetcher().fetch(&url).await.unwrap();
        assert_eq!(doc.url, url);

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        let query = requests[0].url.query().unwrap_or_default();
        assert!(query.contains("_t="), "query was {query:?}");
        assert!(query.contains("_r="), "query was {query:?}");
    }

    #[tokio::test]
    async fn test_fetch_non_success_is_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let url = format!("{}/missing", server.uri());
        let err = test_fetcher().fetch(&url).await.unwrap_err();
        match err {
            ScrapeError::Fetch { url: failed, reason } => {
                assert_eq!(failed, url);
                assert!(reason.contains("404"));
            }
            other => panic!("expected fetch error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_all_preserves_order_and_finishes_siblings() {
        let server = MockServer::start().await;
        for name in ["a", "b", "c"] {
            Mock::given(method("GET"))
                .and(path(format!("/{name}")))
                .respond_with(
                    ResponseTemplate::new(200).set_body_string(format!("<h1>{name}</h1>")),
                )
                .mount(&server)
                .await;
        }
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let fetcher = test_fetcher();
        let urls: Vec<String> = ["c", "a", "b"]
            .iter()
            .map(|n| format!("{}/{n}", server.uri()))
            .collect();
        let docs = fetcher.fetch_all(&urls).await.unwrap();
        let fetched: Vec<&str> = docs.iter().map(|d| d.url.as_str()).collect();
        assert_eq!(fetched, urls.iter().map(String::as_str).collect::<Vec<_>>());

        let mut with_broken = urls.clone();
        with_broken.insert(1, format!("{}/broken", server.uri()));
        let outcomes = fetcher.fetch_each(&with_broken).await;
        assert_eq!(outcomes.len(), 4);
        assert!(outcomes[0].is_ok());
        assert!(outcomes[1].is_err());
        assert!(outcomes[2].is_ok() && outcomes[3].is_ok());
        assert!(fetcher.fetch_all(&with_broken).await.is_err());
    }

    #[tokio::test]
    async fn test_fetch_json_sends_query_and_decodes() {
        #[derive(serde::Deserialize)]
        struct Envelope {
            html: String,
        }

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ajax"))
            .and(query_param("action", "list"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"html":"<p>x</p>"}"#))
            .mount(&server)
            .await;

        let url = format!("{}/ajax", server.uri());
        let envelope: Envelope = test_fetcher()
            .fetch_json(&url, &[("action", "list".to_string())])
            .await
            .unwrap();
        assert_eq!(envelope.html, "<p>x</p>");
    }

    #[tokio::test]
    async fn test_fetch_json_decode_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param_is_missing("action"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let url = format!("{}/ajax", server.uri());
        let result: Result<serde_json::Value> = test_fetcher().fetch_json(&url, &[]).await;
        assert!(matches!(result, Err(ScrapeError::Decode { .. })));
    }

    #[tokio::test]
    async fn test_fetch_all_waits_on_shared_limiter() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<p>ok</p>"))
            .mount(&server)
            .await;

        let limiter = Arc::new(RateLimiter::new(2, Duration::from_millis(300)));
        let fetcher = Fetcher::new(&ScraperConfig::default(), Arc::clone(&limiter)).unwrap();
        let urls: Vec<String> = (0..5).map(|i| format!("{}/page/{i}", server.uri())).collect();

        let started = Instant::now();
        let docs = fetcher.fetch_all(&urls).await.unwrap();
        let elapsed = started.elapsed();

        assert_eq!(docs.len(), 5);
        // 2 + 2 + 1 slots span two full windows.
        assert!(elapsed >= Duration::from_millis(600), "finished in {elapsed:?}");
        assert_eq!(server.received_requests().await.unwrap().len(), 5);

        // A second fetcher on the same limiter shares the budget.
        let other = Fetcher::new(&ScraperConfig::default(), limiter).unwrap();
        let started = Instant::now();
        other.fetch(&urls[0]).await.unwrap();
        fetcher.fetch(&urls[1]).await.unwrap();
        other.fetch(&urls[2]).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(200));
    }

    #[tokio::test]
    async fn test_fetch_all_runs_requests_concurrently() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<p>slow</p>")
                    .set_delay(Duration::from_millis(300)),
            )
            .mount(&server)
            .await;

        let urls: Vec<String> = (0..6).map(|i| format!("{}/slow/{i}", server.uri())).collect();
        let started = Instant::now();
        let docs = test_fetcher().fetch_all(&urls).await.unwrap();
        let elapsed = started.elapsed();

        assert_eq!(docs.len(), 6);
        assert!(elapsed < Duration::from_millis(1200), "finished in {elapsed:?}");
    }
}
