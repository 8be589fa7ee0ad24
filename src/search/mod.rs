//! Web and image search
//!
//! Normalized result types and the [`SearchApi`] seam the dispatcher talks to.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Google Custom Search JSON API client.
pub mod google;
/// Shared HTTP helpers for search requests.
pub mod http_utils;

pub use google::GoogleSearchClient;

/// Errors that can occur while talking to the search service or downloading images
#[derive(Error, Debug)]
pub enum SearchError {
    /// Error during network communication
    #[error("Network error: {0}")]
    Network(String),
    /// Error returned by the remote API (non-success status)
    #[error("API error: {0}")]
    Api(String),
    /// Error during JSON deserialization
    #[error("JSON error: {0}")]
    Json(String),
    /// Downloaded resource is not an image
    #[error("Not an image: content type {0}")]
    NotAnImage(String),
    /// Downloaded resource exceeds the configured size cap
    #[error("Image too large: more than {limit} bytes")]
    TooLarge {
        /// Configured cap in bytes
        limit: usize,
    },
}

/// One web search hit, with every field populated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    /// Page title
    pub title: String,
    /// Snippet shown by the search engine
    pub description: String,
    /// `article:published_time` or [`crate::config::NOT_AVAILABLE`]
    pub published_date: String,
    /// `article:section` or [`crate::config::NOT_AVAILABLE`]
    pub category: String,
    /// Target URL
    pub link: String,
}

/// A downloaded image, held in memory for the duration of one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    /// Raw image payload
    pub bytes: Bytes,
    /// MIME type, always `image/*`
    pub mime_type: String,
}

impl ImageAsset {
    /// Filename used when sending the asset as media.
    #[must_use]
    pub fn file_name(&self) -> String {
        let ext = match self.mime_type.as_str() {
            "image/png" => "png",
            "image/gif" => "gif",
            "image/webp" => "webp",
            "image/bmp" => "bmp",
            "image/svg+xml" => "svg",
            _ => "jpg",
        };
        format!("image.{ext}")
    }
}

/// Interface for the external search service
///
/// `search` and `search_images` never fail: transport and API errors are
/// logged and reduce to an empty list. `fetch_image` surfaces its errors.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchApi: Send + Sync {
    /// Run a web search for `term`
    async fn search(&self, term: &str) -> Vec<SearchResult>;
    /// Find up to `count` image URLs for `term`, in API order
    async fn search_images(&self, term: &str, count: u32) -> Vec<String>;
    /// Download one image into memory
    async fn fetch_image(&self, url: &str) -> Result<ImageAsset, SearchError>;
}
