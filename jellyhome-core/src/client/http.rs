use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jellyhome_model::{
    BaseItem, ItemId, ItemsQuery, LatestMediaQuery, LibraryView, NextUpQuery,
    QueryResult, ResumeItemsQuery, UserDto, UserId, UserItemData,
};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;

use super::RemoteClient;
use crate::error::{RemoteError, RemoteResult};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// How this client introduces itself in the `Authorization` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    pub client_name: String,
    pub client_version: String,
    pub device_name: String,
    pub device_id: String,
}

impl Default for ClientIdentity {
    fn default() -> Self {
        Self {
            client_name: "jellyhome".to_string(),
            client_version: env!("CARGO_PKG_VERSION").to_string(),
            device_name: "jellyhome".to_string(),
            device_id: uuid::Uuid::new_v4().simple().to_string(),
        }
    }
}

impl ClientIdentity {
    /// `MediaBrowser` authorization value, with the token when one is set.
    pub fn authorization(&self, token: Option<&str>) -> String {
        let mut header = format!(
            "MediaBrowser Client=\"{}\", Device=\"{}\", DeviceId=\"{}\", Version=\"{}\"",
            self.client_name, self.device_name, self.device_id, self.client_version
        );
        if let Some(token) = token {
            header.push_str(&format!(", Token=\"{token}\""));
        }
        header
    }
}

/// HTTP client for the Jellyfin REST API
#[derive(Clone)]
pub struct JellyfinClient {
    http: Client,
    base_url: String,
    identity: ClientIdentity,
    token_store: Arc<RwLock<Option<String>>>,
}

impl fmt::Debug for JellyfinClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JellyfinClient")
            .field("base_url", &self.base_url)
            .field("identity", &self.identity)
            .field(
                "has_token",
                &self
                    .token_store
                    .try_read()
                    .map(|t| t.is_some())
                    .unwrap_or(false),
            )
            .finish()
    }
}

impl JellyfinClient {
    /// Create a client with the default request timeout
    pub fn new(base_url: &str, identity: ClientIdentity) -> RemoteResult<Self> {
        Self::with_timeout(base_url, identity, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        base_url: &str,
        identity: ClientIdentity,
        timeout: Duration,
    ) -> RemoteResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(RemoteError::Transport)?;
        Self::with_http_client(base_url, identity, http)
    }

    /// Wrap an already configured reqwest client
    pub fn with_http_client(
        base_url: &str,
        identity: ClientIdentity,
        http: Client,
    ) -> RemoteResult<Self> {
        let parsed =
            Url::parse(base_url).map_err(|err| RemoteError::InvalidUrl(format!("{base_url}: {err}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(RemoteError::InvalidUrl(format!(
                "{base_url}: unsupported scheme {}",
                parsed.scheme()
            )));
        }

        let base_url = base_url.trim_end_matches('/').to_string();
        info!("[JellyfinClient] Creating API client with base URL: {}", base_url);

        Ok(Self {
            http,
            base_url,
            identity,
            token_store: Arc::new(RwLock::new(None)),
        })
    }

    /// Build an absolute URL for a server path
    pub fn build_url(&self, path: impl AsRef<str>) -> String {
        let path = path.as_ref();
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn identity(&self) -> &ClientIdentity {
        &self.identity
    }

    /// Set the access token
    pub async fn set_token(&self, token: Option<String>) {
        *self.token_store.write().await = token;
    }

    /// Get the current access token
    pub async fn get_token(&self) -> Option<String> {
        self.token_store.read().await.clone()
    }

    async fn build_request(&self, method: Method, path: &str) -> RequestBuilder {
        let token = self.token_store.read().await.clone();
        self.http
            .request(method, self.build_url(path))
            .header(
                reqwest::header::AUTHORIZATION,
                self.identity.authorization(token.as_deref()),
            )
            .header(reqwest::header::ACCEPT, "application/json")
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> RemoteResult<T> {
        let request = self.build_request(Method::GET, path).await.query(query);
        self.execute_request(request).await
    }

    /// Execute a request and map common failures
    async fn execute_request<T: DeserializeOwned>(&self, request: RequestBuilder) -> RemoteResult<T> {
        let response = request.send().await.map_err(RemoteError::Transport)?;
        let status = response.status();
        debug!(target: "client::http", status = %status, url = %response.url(), "response received");

        match status {
            StatusCode::UNAUTHORIZED => {
                warn!("[JellyfinClient] Server rejected credentials");
                Err(RemoteError::Unauthorized)
            }
            status if status.is_success() => {
                let body = response.bytes().await.map_err(RemoteError::Transport)?;
                Ok(serde_json::from_slice(&body)?)
            }
            status => {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                Err(RemoteError::Status {
                    status: status.as_u16(),
                    message: error_text,
                })
            }
        }
    }
}

#[async_trait]
impl RemoteClient for JellyfinClient {
    async fn resume_items(
        &self,
        user_id: &UserId,
        query: &ResumeItemsQuery,
    ) -> RemoteResult<QueryResult<BaseItem>> {
        self.get_json(&format!("Users/{user_id}/Items/Resume"), &query.to_query_pairs())
            .await
    }

    async fn user_views(&self, user_id: &UserId) -> RemoteResult<QueryResult<LibraryView>> {
        self.get_json(&format!("Users/{user_id}/Views"), &[]).await
    }

    async fn latest_media(
        &self,
        user_id: &UserId,
        query: &LatestMediaQuery,
    ) -> RemoteResult<Vec<BaseItem>> {
        self.get_json(&format!("Users/{user_id}/Items/Latest"), &query.to_query_pairs())
            .await
    }

    async fn current_user(&self) -> RemoteResult<UserDto> {
        self.get_json("Users/Me", &[]).await
    }

    async fn mark_played(&self, user_id: &UserId, item_id: &ItemId) -> RemoteResult<UserItemData> {
        let request = self
            .build_request(Method::POST, &format!("Users/{user_id}/PlayedItems/{item_id}"))
            .await;
        self.execute_request(request).await
    }

    async fn mark_unplayed(
        &self,
        user_id: &UserId,
        item_id: &ItemId,
    ) -> RemoteResult<UserItemData> {
        let request = self
            .build_request(Method::DELETE, &format!("Users/{user_id}/PlayedItems/{item_id}"))
            .await;
        self.execute_request(request).await
    }

    async fn next_up(
        &self,
        user_id: &UserId,
        query: &NextUpQuery,
    ) -> RemoteResult<QueryResult<BaseItem>> {
        let mut pairs = vec![("UserId", user_id.to_string())];
        pairs.extend(query.to_query_pairs());
        self.get_json("Shows/NextUp", &pairs).await
    }

    async fn items(&self, user_id: &UserId, query: &ItemsQuery) -> RemoteResult<QueryResult<BaseItem>> {
        self.get_json(&format!("Users/{user_id}/Items"), &query.to_query_pairs())
            .await
    }
}
