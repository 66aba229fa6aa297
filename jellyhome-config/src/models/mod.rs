use std::time::Duration;

use jellyhome_core::favorites::DEFAULT_FAVORITES_LIMIT;
use jellyhome_core::model::UserId;
use jellyhome_core::{BackgroundErrorPolicy, ClientIdentity, FeaturingPolicy, HomeSettings};
use serde::{Deserialize, Serialize};

const REDACTED: &str = "********";

/// Complete client configuration. Every section falls back to its defaults
/// when omitted.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct JellyhomeConfig {
    pub server: ServerConfig,
    pub session: SessionConfig,
    pub home: HomeConfig,
    pub favorites: FavoritesConfig,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the media server, including any reverse-proxy prefix
    /// (for example `https://media.example.com/jellyfin`).
    pub url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8096".to_string(),
        }
    }
}

/// Who the client is and which user it acts for.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// API key or session token sent with every request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// User to act as. When unset the user owning the token is looked up
    /// through `/Users/Me`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub client_name: String,
    pub device_name: String,
    /// Stable device identifier. The server keys sessions by it, so set it
    /// to avoid a new device entry on every run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            user_id: None,
            client_name: "jellyhome".to_string(),
            device_name: "jellyhomectl".to_string(),
            device_id: None,
        }
    }
}

/// Home screen tuning.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct HomeConfig {
    /// Upper bound on continue-watching items.
    pub resume_limit: u32,
    /// Items requested per rail.
    pub page_size: u32,
    /// `report` keeps content on screen when a background refresh fails;
    /// `surface` replaces it with the error.
    pub background_errors: BackgroundErrorPolicy,
    /// Titles admitted to the featuring rail. Empty admits everything.
    pub featuring_titles: Vec<String>,
}

impl Default for HomeConfig {
    fn default() -> Self {
        let settings = HomeSettings::default();
        Self {
            resume_limit: settings.resume_limit,
            page_size: settings.page_size,
            background_errors: settings.background_errors,
            featuring_titles: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct FavoritesConfig {
    pub limit: u32,
}

impl Default for FavoritesConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_FAVORITES_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

impl JellyhomeConfig {
    pub fn home_settings(&self) -> HomeSettings {
        HomeSettings {
            resume_limit: self.home.resume_limit,
            page_size: self.home.page_size,
            background_errors: self.home.background_errors,
            featuring: FeaturingPolicy::allow_titles(&self.home.featuring_titles),
        }
    }

    /// Identity for the `Authorization` header. A random device id is
    /// generated when none is configured.
    pub fn client_identity(&self) -> ClientIdentity {
        let generated = ClientIdentity::default();
        ClientIdentity {
            client_name: self.session.client_name.clone(),
            client_version: generated.client_version,
            device_name: self.session.device_name.clone(),
            device_id: self.session.device_id.clone().unwrap_or(generated.device_id),
        }
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.session
            .user_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(UserId::from)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }

    pub fn favorites_limit(&self) -> u32 {
        self.favorites.limit
    }

    /// Copy with secrets masked, for display.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.session.access_token.is_some() {
            copy.session.access_token = Some(REDACTED.to_string());
        }
        copy
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
