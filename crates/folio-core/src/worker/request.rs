//! Request and response values exchanged between the worker, its fetchers
//! and cache storage.

use reqwest::{Method, Url};
use serde::{Deserialize, Serialize};

use super::WorkerError;

/// A request as seen by the worker. Identity is URL + method.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Request {
    pub method: Method,
    pub url: Url,
}

impl Request {
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
        }
    }

    /// Parse an absolute URL into a GET request.
    pub fn parse(url: &str) -> Result<Self, WorkerError> {
        let url = Url::parse(url).map_err(|e| WorkerError::InvalidUrl(format!("{url}: {e}")))?;
        Ok(Self::get(url))
    }

    /// Stable string used as the storage key for this request.
    /// Fragments never reach the network, so they do not take part in matching.
    pub fn cache_key(&self) -> String {
        let mut url = self.url.clone();
        url.set_fragment(None);
        format!("{} {}", self.method, url)
    }
}

/// A captured response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub url: Url,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(url: Url, status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            url,
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Mirrors the Fetch API `ok` flag (status in 200..=299).
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub async fn from_reqwest(response: reqwest::Response) -> Result<Self, WorkerError> {
        let url = response.url().clone();
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect();
        let body = response.bytes().await?.to_vec();
        Ok(Self {
            url,
            status,
            headers,
            body,
        })
    }
}

/// Serializable request identity, used by disk storage metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRequest {
    pub method: String,
    pub url: String,
}

impl From<&Request> for StoredRequest {
    fn from(request: &Request) -> Self {
        Self {
            method: request.method.to_string(),
            url: request.url.to_string(),
        }
    }
}
