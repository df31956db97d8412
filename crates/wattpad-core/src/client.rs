// Wattpad API client: transport, response caching and the public fetch
// operations for stories, parts, search and browse.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt, TryStreamExt};
use reqwest::header::USER_AGENT;
use reqwest::{StatusCode, Url};
use serde_json::Value;
use tracing::{debug, info};

use crate::cache::ResponseCache;
use crate::config::ClientConfig;
use crate::constants::{
    DEFAULT_CACHE_DIR, DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT, DEFAULT_USER_AGENT,
};
use crate::error::{Result, WattpadError};
use crate::models::{
    Part, RenderedPage, Story, StorySearchResults, Topic, UserSearchResults,
};
use crate::{render, urls};

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Issues a GET and returns the response body.
///
/// Implementations map a 404 to `WattpadError::NotFound` and any other
/// unsuccessful status to `WattpadError::Api`.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn get(&self, url: &Url, user_agent: &str) -> Result<String>;
}

/// reqwest-backed `Fetcher`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    pub fn with_timeouts(connect_timeout: Duration, read_timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .read_timeout(read_timeout)
            .build()
            .map_err(WattpadError::ClientBuild)?;
        Ok(Self { http })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, url: &Url, user_agent: &str) -> Result<String> {
        let network = |source| WattpadError::Network {
            url: url.to_string(),
            source,
        };

        let response = self
            .http
            .get(url.clone())
            .header(USER_AGENT, user_agent)
            .send()
            .await
            .map_err(network)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(WattpadError::NotFound {
                url: url.to_string(),
            });
        }
        if !status.is_success() {
            return Err(WattpadError::api(format!(
                "HTTP Error: {} {} for URL: {url}",
                status.as_u16(),
                status.canonical_reason().unwrap_or(""),
            )));
        }

        response.text().await.map_err(network)
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

pub struct WattpadClientBuilder {
    user_agent: String,
    use_cache: bool,
    cache_dir: PathBuf,
    cache_max_age: Option<Duration>,
    cache: Option<ResponseCache>,
    connect_timeout: Duration,
    read_timeout: Duration,
    http_client: Option<reqwest::Client>,
    fetcher: Option<Arc<dyn Fetcher>>,
    base_url: Option<Url>,
}

impl Default for WattpadClientBuilder {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            use_cache: true,
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            cache_max_age: None,
            cache: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            http_client: None,
            fetcher: None,
            base_url: None,
        }
    }
}

impl WattpadClientBuilder {
    /// Builder seeded from a loaded configuration file.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::default()
            .user_agent(config.user_agent.clone())
            .use_cache(config.cache.enabled)
            .cache_directory(config.cache.directory.clone())
            .cache_max_age(config.cache.max_age)
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn use_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    pub fn cache_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    pub fn cache_max_age(mut self, max_age: Option<Duration>) -> Self {
        self.cache_max_age = max_age;
        self
    }

    /// Use an already opened cache instead of opening one in the cache
    /// directory. Ignored when caching is disabled.
    pub fn cache(mut self, cache: ResponseCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Pre-configured reqwest client. Timeout settings are ignored when set.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Replace the HTTP transport entirely. Takes precedence over
    /// `http_client` and the timeout settings.
    pub fn fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Point the client at a different host, e.g. a local test server.
    pub fn base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    pub fn build(self) -> Result<WattpadClient> {
        let fetcher: Arc<dyn Fetcher> = match (self.fetcher, self.http_client) {
            (Some(fetcher), _) => fetcher,
            (None, Some(http)) => Arc::new(HttpFetcher::new(http)),
            (None, None) => Arc::new(HttpFetcher::with_timeouts(
                self.connect_timeout,
                self.read_timeout,
            )?),
        };

        let cache = if self.use_cache {
            let cache = match self.cache {
                Some(cache) => cache,
                None => ResponseCache::open(&self.cache_dir)?,
            };
            Some(Arc::new(cache.with_max_age(self.cache_max_age)))
        } else {
            None
        };

        Ok(WattpadClient {
            fetcher,
            user_agent: self.user_agent,
            cache,
            base_url: self.base_url.unwrap_or_else(urls::default_base),
        })
    }
}

// ---------------------------------------------------------------------------
// WattpadClient
// ---------------------------------------------------------------------------

/// Client for the Wattpad API. Cheap to clone; clones share the transport
/// and the response cache.
#[derive(Clone)]
pub struct WattpadClient {
    fetcher: Arc<dyn Fetcher>,
    user_agent: String,
    cache: Option<Arc<ResponseCache>>,
    base_url: Url,
}

impl std::fmt::Debug for WattpadClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WattpadClient")
            .field("user_agent", &self.user_agent)
            .field("cache", &self.cache)
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

impl WattpadClient {
    pub fn builder() -> WattpadClientBuilder {
        WattpadClientBuilder::default()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// The response cache, if caching is enabled.
    pub fn cache(&self) -> Option<&ResponseCache> {
        self.cache.as_deref()
    }

    // -- Core fetch logic --

    /// Fetch `url` as text, consulting the cache first when both the client
    /// and the caller allow it. Successful bodies are stored.
    pub async fn fetch_raw(&self, url: &Url, use_cache: bool) -> Result<String> {
        let key = url.as_str();
        let cache = self.cache.as_deref().filter(|_| use_cache);

        if let Some(cache) = cache {
            if let Some(body) = cache.get(key) {
                debug!(url = key, "cache hit");
                return Ok(body);
            }
            debug!(url = key, "cache miss");
        }

        let body = self.fetcher.get(url, &self.user_agent).await?;

        if let Some(cache) = cache {
            cache.put(key, &body);
        }
        Ok(body)
    }

    /// Fetch `url` and parse it as a JSON object, surfacing API error
    /// payloads as `WattpadError::Api`. Error responses are evicted from the
    /// cache so a retry reaches the server.
    pub async fn fetch_json(&self, url: &Url) -> Result<Value> {
        let raw = self.fetch_raw(url, true).await?;
        check_json(url, raw).inspect_err(|_| self.evict(url))
    }

    fn evict(&self, url: &Url) {
        if let Some(cache) = &self.cache {
            cache.remove(url.as_str());
        }
    }

    // -- Stories --

    pub async fn get_story_by_id(&self, story_id: u64) -> Result<Story> {
        let url = urls::story_by_id(&self.base_url, story_id);
        let json = self.fetch_json(&url).await?;
        Story::from_json(&json)
    }

    /// Look up the story that owns `part_id`.
    pub async fn get_story_by_part_id(&self, part_id: u64) -> Result<Story> {
        let url = urls::part_by_id(&self.base_url, part_id);
        let json = self.fetch_json(&url).await?;
        Story::from_part_response(&json)
    }

    // -- Part text --

    /// Fetch and render the text of `part`.
    pub async fn render_part(&self, part: &Part) -> Result<RenderedPage> {
        let text_url = part
            .text_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or(WattpadError::MissingTextUrl { part_id: part.id })?;

        let url = urls::part_text(&self.base_url, text_url).map_err(|_| {
            WattpadError::InvalidUrl {
                part_id: Some(part.id),
                url: text_url.to_string(),
            }
        })?;

        let html = self.fetch_raw(&url, true).await?;
        render::render_html(&html, &part.title, &url)
    }

    /// Render every part of `story`, at most `concurrency` at a time. Pages
    /// come back in part order; the first failure aborts the rest.
    pub async fn render_story(&self, story: &Story, concurrency: usize) -> Result<Vec<RenderedPage>> {
        info!(story_id = story.id, parts = story.parts.len(), "rendering story");
        stream::iter(story.parts.iter().map(|part| self.render_part(part)))
            .buffered(concurrency.max(1))
            .try_collect()
            .await
    }

    // -- Search & browse --

    pub async fn search_stories(
        &self,
        query: &str,
        mature: bool,
        limit: u32,
    ) -> Result<StorySearchResults> {
        let url = urls::search_stories(&self.base_url, query, mature, limit);
        let json = self.fetch_json(&url).await?;
        StorySearchResults::from_json(&json)
    }

    pub async fn search_users(&self, query: &str, limit: u32, offset: u32) -> Result<UserSearchResults> {
        let url = urls::search_users(&self.base_url, query, limit, offset);
        let raw = self.fetch_raw(&url, true).await?;
        // This endpoint may answer with a bare array, which `fetch_json`
        // would reject.
        let json: Value = match serde_json::from_str(&raw) {
            Ok(Value::Array(items)) => Value::Array(items),
            _ => check_json(&url, raw).inspect_err(|_| self.evict(&url))?,
        };
        UserSearchResults::from_json(&json)
    }

    pub async fn browse_topics(&self, language_id: u32) -> Result<Vec<Topic>> {
        let url = urls::browse_topics(&self.base_url, language_id);
        let json = self.fetch_json(&url).await?;
        Topic::list_from_json(&json)
    }

    // -- Cache management --

    /// Drop every cached response. No-op when caching is disabled.
    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
            info!("response cache cleared");
        }
    }
}

/// Parse `raw` as a JSON object and reject API error payloads.
fn check_json(url: &Url, raw: String) -> Result<Value> {
    let parsed: Value = match serde_json::from_str(&raw) {
        Ok(v) => v,
        Err(_) => {
            return Err(WattpadError::NotJson {
                message: format!("Failed to parse response as JSON for URL: {url}"),
                body: raw,
            })
        }
    };

    if !parsed.is_object() {
        return Err(WattpadError::NotJson {
            message: format!("Expected JSON object but got different structure for URL: {url}"),
            body: raw,
        });
    }

    if let Some(error) = parsed.get("error").filter(|e| !e.is_object() && !e.is_array() && !e.is_null()) {
        let message = match error {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let code = parsed.get("code").and_then(error_code).unwrap_or(-1);
        return Err(WattpadError::Api {
            message: format!("API returned an error: {message} (Code: {code})"),
            response: Some(parsed),
        });
    }

    if parsed.get("error_code").is_some() {
        return Err(WattpadError::Api {
            message: "API returned an error".to_string(),
            response: Some(parsed),
        });
    }

    Ok(parsed)
}

/// Numeric error code; the API sometimes sends it as a string.
fn error_code(code: &Value) -> Option<i64> {
    match code {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Model conveniences
// ---------------------------------------------------------------------------

impl Story {
    pub async fn from_id(story_id: u64, client: &WattpadClient) -> Result<Story> {
        client.get_story_by_id(story_id).await
    }

    pub async fn from_part_id(part_id: u64, client: &WattpadClient) -> Result<Story> {
        client.get_story_by_part_id(part_id).await
    }
}

impl Part {
    pub async fn render_with(&self, client: &WattpadClient) -> Result<RenderedPage> {
        client.render_part(self).await
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
