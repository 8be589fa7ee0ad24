//! HTTP utilities for the search client
//!
//! Common request/response handling for the Custom Search API and image
//! downloads. Query strings carry the API key, so request URLs are stripped
//! from every error before it leaves this module.

use crate::search::SearchError;
use crate::utils::truncate_str;
use reqwest::{Client as HttpClient, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Longest slice of an error body kept in `SearchError::Api`
const ERROR_BODY_LIMIT: usize = 500;

/// Creates an HTTP client with the given request timeout.
///
/// The timeout bounds every search and download call so a stalled server
/// cannot hold a handling pipeline forever.
#[must_use]
pub fn create_http_client(timeout_secs: u64) -> HttpClient {
    HttpClient::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .unwrap_or_else(|_| HttpClient::new())
}

/// Maps a reqwest error to `SearchError::Network` without its URL.
#[must_use]
pub fn network_error(e: reqwest::Error) -> SearchError {
    SearchError::Network(e.without_url().to_string())
}

/// Sends a GET request with query parameters and parses the JSON response.
///
/// # Errors
///
/// Returns `SearchError::Network` on connectivity issues, `SearchError::Api` on
/// non-success status codes, or `SearchError::Json` if parsing fails.
pub async fn get_json<T: DeserializeOwned>(
    client: &HttpClient,
    url: &str,
    query: &[(&str, String)],
) -> Result<T, SearchError> {
    let response = client
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(network_error)?;

    let response = ensure_success(response).await?;

    response
        .json()
        .await
        .map_err(|e| SearchError::Json(e.without_url().to_string()))
}

/// Turns a non-success response into `SearchError::Api`.
///
/// # Errors
///
/// Returns `SearchError::Api` when the status is not 2xx.
pub async fn ensure_success(response: Response) -> Result<Response, SearchError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(SearchError::Api(describe_error_body(status, &body)))
}

/// Builds a log-friendly description of an error response body.
#[must_use]
pub fn describe_error_body(status: reqwest::StatusCode, body: &str) -> String {
    let trimmed = body.trim_start();

    // Proxies and CDNs answer with HTML error pages
    let is_html = trimmed.starts_with("<!DOCTYPE")
        || trimmed.starts_with("<html")
        || trimmed.starts_with("<HTML");

    if is_html {
        return format!("{status} (Server returned HTML error page)");
    }

    if body.chars().count() > ERROR_BODY_LIMIT {
        format!(
            "{status} - {}... (truncated)",
            truncate_str(body, ERROR_BODY_LIMIT)
        )
    } else {
        format!("{status} - {body}")
    }
}
