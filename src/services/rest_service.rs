//! Remote data service over a PostgREST-style HTTP API.
//!
//! Talks to `{base_url}/rest/v1/bookmarks` with the project API key. There is
//! no push channel over plain HTTP, so [`RestDataService::subscribe`] reports
//! an error status and closes; sessions then stay in sync through polling.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::services::remote_service::{RemoteDataService, Subscription};
use crate::types::bookmark::Bookmark;
use crate::types::errors::{DeleteError, InsertError, LoadError};
use crate::types::event::{SubscriptionMessage, SubscriptionStatus};

const TABLE_PATH: &str = "/rest/v1/bookmarks";

/// HTTP client for a hosted bookmarks table.
pub struct RestDataService {
    client: Client,
    endpoint: String,
    api_key: String,
    access_token: Option<String>,
}

impl RestDataService {
    /// Builds a client with the given request timeout.
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), TABLE_PATH),
            api_key: api_key.to_string(),
            access_token: None,
        })
    }

    /// Uses a signed-in user's token instead of the anonymous key for
    /// row-level security.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let bearer = self.access_token.as_deref().unwrap_or(&self.api_key);
        request
            .header("apikey", &self.api_key)
            .bearer_auth(bearer)
    }

    async fn error_body(response: reqwest::Response) -> String {
        let status = response.status();
        match response.text().await {
            Ok(body) if !body.is_empty() => format!("{}: {}", status, body),
            _ => status.to_string(),
        }
    }
}

#[async_trait]
impl RemoteDataService for RestDataService {
    async fn list(&self, user_id: &str) -> Result<Vec<Bookmark>, LoadError> {
        let request = self.client.get(&self.endpoint).query(&[
            ("select", "*".to_string()),
            ("user_id", format!("eq.{}", user_id)),
            ("order", "created_at.desc".to_string()),
        ]);

        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| LoadError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LoadError::Backend(Self::error_body(response).await));
        }

        response
            .json::<Vec<Bookmark>>()
            .await
            .map_err(|e| LoadError::Decode(e.to_string()))
    }

    async fn insert(&self, user_id: &str, title: &str, url: &str) -> Result<Bookmark, InsertError> {
        let request = self
            .client
            .post(&self.endpoint)
            .header("Prefer", "return=representation")
            .json(&json!({ "user_id": user_id, "url": url, "title": title }));

        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| InsertError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(InsertError::Backend(Self::error_body(response).await));
        }

        let mut rows = response
            .json::<Vec<Bookmark>>()
            .await
            .map_err(|e| InsertError::Decode(e.to_string()))?;

        if rows.is_empty() {
            return Err(InsertError::Decode("insert returned no row".to_string()));
        }
        Ok(rows.swap_remove(0))
    }

    async fn delete(&self, id: &str, user_id: &str) -> Result<(), DeleteError> {
        let request = self
            .client
            .delete(&self.endpoint)
            .header("Prefer", "return=representation")
            .query(&[
                ("id", format!("eq.{}", id)),
                ("user_id", format!("eq.{}", user_id)),
            ]);

        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| DeleteError::Network(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(DeleteError::NotFound(id.to_string())),
            // The server ignored the representation preference.
            StatusCode::NO_CONTENT => Ok(()),
            status if status.is_success() => {
                let removed = response
                    .json::<Vec<serde_json::Value>>()
                    .await
                    .map_err(|e| {
                        warn!(id = %id, error = %e, "unreadable delete response");
                        DeleteError::Backend(format!("unreadable delete response: {}", e))
                    })?;
                if removed.is_empty() {
                    return Err(DeleteError::NotFound(id.to_string()));
                }
                Ok(())
            }
            _ => Err(DeleteError::Backend(Self::error_body(response).await)),
        }
    }

    async fn subscribe(&self, user_id: &str) -> Subscription {
        let (tx, rx) = mpsc::channel(2);
        warn!(
            user_id = %user_id,
            endpoint = %self.endpoint,
            "no realtime channel over REST, relying on polling"
        );
        if tx
            .send(SubscriptionMessage::Status(SubscriptionStatus::Error))
            .await
            .is_err()
        {
            debug!("subscription dropped before status was delivered");
        }
        rx
    }
}
