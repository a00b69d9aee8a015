//! Fetch Port: retrieve a URL as text or raw bytes.
//!
//! The domain clients only see the [`Fetcher`] trait. [`HttpFetcher`] is the
//! production implementation on top of one pooled `reqwest::Client`. There is
//! no retry here; a failed fetch is retried on the next poll cycle.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{ItsError, Result};

// ---

#[async_trait]
pub trait Fetcher: Send + Sync {
    /// GET `url` and return the body as text.
    async fn fetch_text(&self, url: &str) -> Result<String>;

    /// GET `url` and return the raw body.
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>>;
}

/// `reqwest` backed [`Fetcher`].
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a client with the given transport timeout.
    pub fn new(timeout: Duration) -> Result<Self> {
        // ---
        let client = reqwest::Client::builder()
            .user_agent(concat!("ktw-its/", env!("CARGO_PKG_VERSION")))
            .pool_max_idle_per_host(4)
            .timeout(timeout)
            .build()
            .map_err(|e| ItsError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response> {
        // ---
        debug!("Starting request GET {}", url);

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ItsError::Network(format!("HTTP error for {}: {}", url, e)))?;

        let status = resp.status();
        debug!("Ending request GET {} ({})", url, status.as_u16());

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let end = body
                .char_indices()
                .nth(500)
                .map(|(i, _)| i)
                .unwrap_or(body.len());
            return Err(ItsError::Network(format!(
                "{} returned {}: {}",
                url,
                status.as_u16(),
                &body[..end]
            )));
        }

        Ok(resp)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        let resp = self.get(url).await?;
        Ok(resp.text().await?)
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let resp = self.get(url).await?;
        Ok(resp.bytes().await?.to_vec())
    }
}

/// Every remote endpoint consumed, derived from one base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base_url: String,
}

impl Endpoints {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn weather(&self) -> String {
        format!("{}/api/v1/weather/air", self.base_url)
    }

    pub fn traffic(&self) -> String {
        format!("{}/api/traffic", self.base_url)
    }

    pub fn cameras(&self) -> String {
        format!("{}/api/cameras", self.base_url)
    }

    pub fn camera_images(&self, camera_id: u32) -> String {
        format!("{}/api/cameras/{}/images", self.base_url, camera_id)
    }

    pub fn camera_image(&self, camera_id: u32, filename: &str) -> String {
        format!("{}/api/camera/image/{}/{}", self.base_url, camera_id, filename)
    }

    pub fn parking_zones(&self) -> String {
        format!("{}/api/parkingZones", self.base_url)
    }
}
