//! Google Custom Search provider - web search and image retrieval
//!
//! Talks to the Custom Search JSON API (`q`, `cx`, `key`, optionally
//! `searchType=image` and `num`) and downloads image results into memory.

use crate::config::{Settings, MAX_IMAGE_COUNT, NOT_AVAILABLE};
use crate::search::http_utils::{create_http_client, ensure_success, get_json, network_error};
use crate::search::{ImageAsset, SearchApi, SearchError, SearchResult};
use async_trait::async_trait;
use bytes::BytesMut;
use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client as HttpClient;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

/// Fallback when an image server does not say what it sent
const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// Raw Custom Search response; `items` is absent when nothing matched
#[derive(Debug, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    title: Option<String>,
    snippet: Option<String>,
    link: Option<String>,
    pagemap: Option<PageMap>,
}

#[derive(Debug, Deserialize)]
struct PageMap {
    #[serde(default)]
    metatags: Value,
}

impl PageMap {
    /// Look up a meta tag. The API returns `metatags` as a list of objects;
    /// a bare object is accepted too.
    fn meta(&self, key: &str) -> Option<&str> {
        match &self.metatags {
            Value::Array(tags) => tags.iter().find_map(|tag| meta_value(tag, key)),
            obj @ Value::Object(_) => meta_value(obj, key),
            _ => None,
        }
    }
}

fn meta_value<'a>(tags: &'a Value, key: &str) -> Option<&'a str> {
    tags.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn or_not_available(value: Option<&str>) -> String {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(NOT_AVAILABLE)
        .to_string()
}

impl SearchResponse {
    /// Normalize raw items into [`SearchResult`]s, preserving API order.
    #[must_use]
    pub fn into_results(self) -> Vec<SearchResult> {
        self.items
            .into_iter()
            .map(|item| {
                let meta = |key| item.pagemap.as_ref().and_then(|p| p.meta(key));
                SearchResult {
                    title: or_not_available(item.title.as_deref()),
                    description: or_not_available(item.snippet.as_deref()),
                    published_date: or_not_available(meta("article:published_time")),
                    category: or_not_available(meta("article:section")),
                    link: or_not_available(item.link.as_deref()),
                }
            })
            .collect()
    }

    /// Extract image URLs, preserving API order.
    #[must_use]
    pub fn into_image_urls(self) -> Vec<String> {
        self.items
            .into_iter()
            .filter_map(|item| item.link)
            .filter(|link| !link.trim().is_empty())
            .collect()
    }
}

/// Resolve the MIME type of a download from its `Content-Type` header.
///
/// # Errors
///
/// Returns `SearchError::NotAnImage` for explicit non-image types.
pub fn image_mime_type(content_type: Option<&str>) -> Result<String, SearchError> {
    let Some(raw) = content_type else {
        return Ok(DEFAULT_IMAGE_MIME.to_string());
    };

    let essence = raw
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if essence.starts_with("image/") {
        Ok(essence)
    } else if essence.is_empty() || essence == "application/octet-stream" {
        Ok(DEFAULT_IMAGE_MIME.to_string())
    } else {
        Err(SearchError::NotAnImage(essence))
    }
}

/// Search client for the Google Custom Search JSON API
pub struct GoogleSearchClient {
    http: HttpClient,
    endpoint: String,
    api_key: String,
    engine_id: String,
    max_image_bytes: usize,
}

impl GoogleSearchClient {
    /// Create a client from loaded settings
    #[must_use]
    pub fn new(settings: &Settings) -> Self {
        Self {
            http: create_http_client(settings.http_timeout_secs),
            endpoint: settings.search_api_url.clone(),
            api_key: settings.google_api_key.clone(),
            engine_id: settings.google_search_engine_id.clone(),
            max_image_bytes: settings.max_image_bytes,
        }
    }

    fn base_query(&self, term: &str) -> Vec<(&'static str, String)> {
        vec![
            ("q", term.to_string()),
            ("cx", self.engine_id.clone()),
            ("key", self.api_key.clone()),
        ]
    }

    async fn query(&self, params: &[(&str, String)]) -> Result<SearchResponse, SearchError> {
        get_json(&self.http, &self.endpoint, params).await
    }
}

#[async_trait]
impl SearchApi for GoogleSearchClient {
    async fn search(&self, term: &str) -> Vec<SearchResult> {
        debug!(term = %term, "Custom Search web query");

        match self.query(&self.base_query(term)).await {
            Ok(response) => response.into_results(),
            Err(e) => {
                warn!(term = %term, error = %e, "Error fetching search results");
                Vec::new()
            }
        }
    }

    async fn search_images(&self, term: &str, count: u32) -> Vec<String> {
        let count = count.clamp(1, MAX_IMAGE_COUNT);
        debug!(term = %term, count = count, "Custom Search image query");

        let mut params = self.base_query(term);
        params.push(("searchType", "image".to_string()));
        params.push(("num", count.to_string()));

        match self.query(&params).await {
            Ok(response) => {
                let mut urls = response.into_image_urls();
                urls.truncate(count as usize);
                urls
            }
            Err(e) => {
                warn!(term = %term, error = %e, "Error fetching image URLs");
                Vec::new()
            }
        }
    }

    async fn fetch_image(&self, url: &str) -> Result<ImageAsset, SearchError> {
        debug!(url = %url, "Downloading image");

        let response = self.http.get(url).send().await.map_err(network_error)?;
        let response = ensure_success(response).await?;

        let mime_type = image_mime_type(
            response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
        )?;

        let limit = self.max_image_bytes;
        if response
            .content_length()
            .is_some_and(|len| len > limit as u64)
        {
            return Err(SearchError::TooLarge { limit });
        }

        let mut buffer = BytesMut::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(network_error)?;
            if buffer.len() + chunk.len() > limit {
                return Err(SearchError::TooLarge { limit });
            }
            buffer.extend_from_slice(&chunk);
        }

        if buffer.is_empty() {
            return Err(SearchError::Api("empty image body".to_string()));
        }

        debug!(url = %url, bytes = buffer.len(), mime = %mime_type, "Image downloaded");
        Ok(ImageAsset {
            bytes: buffer.freeze(),
            mime_type,
        })
    }
}
