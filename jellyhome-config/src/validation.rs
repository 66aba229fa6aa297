use std::fmt;

use url::Url;

use crate::models::JellyhomeConfig;

const LARGE_PAGE_SIZE: u32 = 200;

/// Settings that make the client unusable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigGuardRailError {
    #[error("server.url `{url}` is not a valid URL: {reason}")]
    InvalidServerUrl { url: String, reason: String },

    #[error("server.url must use http or https, got `{0}`")]
    UnsupportedScheme(String),

    #[error("{0} must be greater than zero")]
    ZeroLimit(&'static str),

    #[error("http.timeout_secs must be greater than zero")]
    ZeroTimeout,
}

/// Settings that work but are probably not what was meant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    MissingAccessToken,
    LargePageSize(u32),
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigWarning::MissingAccessToken => {
                f.write_str("no access token configured; the server will reject most requests")
            }
            ConfigWarning::LargePageSize(size) => write!(
                f,
                "home.page_size {size} is above {LARGE_PAGE_SIZE}; rails will be slow to load"
            ),
        }
    }
}

impl JellyhomeConfig {
    /// Check the guard rails and return the non-fatal warnings.
    pub fn validate(&self) -> Result<Vec<ConfigWarning>, ConfigGuardRailError> {
        let url = Url::parse(&self.server.url).map_err(|err| {
            ConfigGuardRailError::InvalidServerUrl {
                url: self.server.url.clone(),
                reason: err.to_string(),
            }
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigGuardRailError::UnsupportedScheme(url.scheme().to_string()));
        }

        for (name, value) in [
            ("home.resume_limit", self.home.resume_limit),
            ("home.page_size", self.home.page_size),
            ("favorites.limit", self.favorites.limit),
        ] {
            if value == 0 {
                return Err(ConfigGuardRailError::ZeroLimit(name));
            }
        }
        if self.http.timeout_secs == 0 {
            return Err(ConfigGuardRailError::ZeroTimeout);
        }

        let mut warnings = Vec::new();
        if self.session.access_token.is_none() {
            warnings.push(ConfigWarning::MissingAccessToken);
        }
        if self.home.page_size > LARGE_PAGE_SIZE {
            warnings.push(ConfigWarning::LargePageSize(self.home.page_size));
        }
        Ok(warnings)
    }
}
