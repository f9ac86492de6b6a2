//! Analytics API fetch capability
//!
//! The pipeline only needs one operation from the remote API: fetch page `n`
//! of an entity listing and learn the total number of hits. [`AnalyticsApi`]
//! is that capability; [`client::AnalyticsClient`] implements it over HTTP.

pub mod client;
pub mod types;

use async_trait::async_trait;
use ccsync_common::EntityKind;
use serde_json::Value;
use thiserror::Error;

use crate::config::Settings;
use crate::window::FetchWindow;

pub use client::AnalyticsClient;

/// One page of records returned by a single fetch call
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub entity: EntityKind,
    /// 1-based, as the API numbers pages
    pub page_number: u32,
    pub page_size: u32,
    pub records: Vec<Value>,
    /// Size of the whole result set, repeated on every page
    pub total_hits: u64,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Token request rejected with status {status}: {body}")]
    Unauthorized { status: u16, body: String },

    #[error("{0} queries require a fetch window")]
    MissingWindow(EntityKind),
}

#[async_trait]
pub trait AnalyticsApi: Send + Sync {
    /// Fetch one page. `window` bounds conversation queries and is ignored
    /// for directory listings.
    async fn fetch_page(
        &self,
        entity: EntityKind,
        page_number: u32,
        page_size: u32,
        window: Option<&FetchWindow>,
    ) -> Result<Page, ApiError>;
}

/// Connection settings for the analytics API
#[derive(Clone)]
pub struct ApiConfig {
    pub region: String,
    pub client_id: String,
    pub client_secret: String,
    /// Defaults to `https://api.{region}`
    pub api_base_url: String,
    /// Defaults to `https://login.{region}`
    pub login_base_url: String,
}

impl ApiConfig {
    pub fn new(
        region: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        let region = region.into();
        Self {
            api_base_url: format!("https://api.{}", region),
            login_base_url: format!("https://login.{}", region),
            region,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Point both the API and the token endpoint at `base_url`.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.login_base_url = base_url.clone();
        self.api_base_url = base_url;
        self
    }

    pub(crate) fn from_settings<F>(
        settings: &Settings<F>,
        region: String,
        client_id: String,
        client_secret: String,
    ) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new(region, client_id, client_secret);
        if let Some(url) = settings.optional("API_BASE_URL") {
            config.api_base_url = url;
        }
        if let Some(url) = settings.optional("LOGIN_BASE_URL") {
            config.login_base_url = url;
        }
        config
    }
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("region", &self.region)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("api_base_url", &self.api_base_url)
            .field("login_base_url", &self.login_base_url)
            .finish()
    }
}
