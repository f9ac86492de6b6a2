//! HTTP client for the analytics API
//!
//! Authorizes with the client-credentials grant, then serves the three page
//! fetches the pipeline uses:
//!
//! - conversations: `POST /api/v2/analytics/conversations/details/query`
//! - users: `GET /api/v2/users`
//! - queues: `GET /api/v2/routing/queues`

use async_trait::async_trait;
use ccsync_common::EntityKind;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::{info, instrument};

use super::types::{ConversationQuery, ConversationQueryResponse, EntityListing, TokenResponse};
use super::{AnalyticsApi, ApiConfig, ApiError, Page};
use crate::window::FetchWindow;

/// Header carrying the API's request correlation id.
pub const CORRELATION_ID_HEADER: &str = "inin-correlation-id";

const USER_AGENT: &str = concat!("ccsync/", env!("CARGO_PKG_VERSION"));

const CONVERSATION_DETAILS_PATH: &str = "/api/v2/analytics/conversations/details/query";
const USERS_PATH: &str = "/api/v2/users";
const QUEUES_PATH: &str = "/api/v2/routing/queues";

/// Authorized analytics API client
pub struct AnalyticsClient {
    client: Client,
    base_url: String,
    access_token: String,
}

impl AnalyticsClient {
    /// Exchange the configured client credentials for a bearer token.
    #[instrument(skip(config), fields(region = %config.region))]
    pub async fn authorize(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        let url = format!("{}/oauth/token", config.login_base_url.trim_end_matches('/'));

        let response = client
            .post(&url)
            .basic_auth(&config.client_id, Some(&config.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Unauthorized {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = response.json().await?;
        info!(expires_in = ?token.expires_in, "Authorized against analytics API");

        Ok(Self::with_token(client, &config.api_base_url, token.access_token))
    }

    /// Build a client around an already issued token.
    pub fn with_token(client: Client, base_url: &str, access_token: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        }
    }

    async fn fetch_conversations(
        &self,
        page_number: u32,
        page_size: u32,
        window: Option<&FetchWindow>,
    ) -> Result<Page, ApiError> {
        let window = window.ok_or(ApiError::MissingWindow(EntityKind::Conversation))?;
        let query = ConversationQuery::with_talk_time(window.interval(), page_number, page_size);

        let response = self
            .client
            .post(format!("{}{}", self.base_url, CONVERSATION_DETAILS_PATH))
            .bearer_auth(&self.access_token)
            .json(&query)
            .send()
            .await?;
        let body: ConversationQueryResponse = read_json(response).await?;

        Ok(Page {
            entity: EntityKind::Conversation,
            page_number,
            page_size,
            records: body.conversations,
            total_hits: body.total_hits,
        })
    }

    async fn fetch_listing(
        &self,
        entity: EntityKind,
        path: &str,
        page_number: u32,
        page_size: u32,
    ) -> Result<Page, ApiError> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.access_token)
            .query(&[("pageSize", page_size), ("pageNumber", page_number)])
            .send()
            .await?;
        let body: EntityListing = read_json(response).await?;

        Ok(Page {
            entity,
            page_number,
            page_size,
            records: body.entities,
            total_hits: body.total,
        })
    }
}

#[async_trait]
impl AnalyticsApi for AnalyticsClient {
    #[instrument(skip(self, window), fields(entity = %entity))]
    async fn fetch_page(
        &self,
        entity: EntityKind,
        page_number: u32,
        page_size: u32,
        window: Option<&FetchWindow>,
    ) -> Result<Page, ApiError> {
        match entity {
            EntityKind::Conversation => {
                self.fetch_conversations(page_number, page_size, window)
                    .await
            },
            EntityKind::User => {
                self.fetch_listing(entity, USERS_PATH, page_number, page_size)
                    .await
            },
            EntityKind::Queue => {
                self.fetch_listing(entity, QUEUES_PATH, page_number, page_size)
                    .await
            },
        }
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    let correlation_id = response
        .headers()
        .get(CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    info!(
        status = status.as_u16(),
        correlation_id = correlation_id.as_deref().unwrap_or("-"),
        "Analytics API response"
    );

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::Status {
            status: status.as_u16(),
            body,
        });
    }

    Ok(response.json().await?)
}
