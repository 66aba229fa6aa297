use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};

use crate::models::JellyhomeConfig;

/// Environment variables that override individual fields after loading.
pub const ENV_OVERRIDE_KEYS: &[&str] = &[
    "JELLYHOME_SERVER_URL",
    "JELLYHOME_ACCESS_TOKEN",
    "JELLYHOME_USER_ID",
    "JELLYHOME_DEVICE_ID",
];

const CANDIDATES: &[&str] = &[
    "jellyhome.toml",
    "jellyhome.json",
    "config/jellyhome.toml",
    "config/jellyhome.json",
];

/// Where the configuration came from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConfigSource {
    #[default]
    Default,
    EnvPath(PathBuf),
    EnvInline,
    File(PathBuf),
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => f.write_str("built-in defaults"),
            ConfigSource::EnvPath(path) => write!(f, "$JELLYHOME_CONFIG_PATH ({})", path.display()),
            ConfigSource::EnvInline => f.write_str("$JELLYHOME_CONFIG_JSON"),
            ConfigSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|raw| !raw.trim().is_empty())
}

impl JellyhomeConfig {
    /// Load configuration for the current process.
    ///
    /// `.env` in the working directory is read first. Evaluation order:
    /// 1) `$JELLYHOME_CONFIG_PATH` (TOML or JSON file),
    /// 2) `$JELLYHOME_CONFIG_JSON` (inline JSON),
    /// 3) the first of `jellyhome.{toml,json}` or `config/jellyhome.{toml,json}`,
    /// 4) defaults.
    ///
    /// [`ENV_OVERRIDE_KEYS`] are applied on top of whichever source won.
    pub fn load_from_env() -> anyhow::Result<(Self, ConfigSource)> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
            Err(err) if err.not_found() => {}
            Err(err) => return Err(err).context("failed to read .env"),
        }
        Self::load(Path::new("."), |key| env::var(key).ok())
    }

    /// [`load_from_env`](Self::load_from_env) with an explicit base
    /// directory and variable lookup.
    pub fn load(
        base_dir: &Path,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<(Self, ConfigSource)> {
        let (mut config, source) = Self::load_base(base_dir, &lookup)?;
        let applied = config.apply_env_overrides(&lookup);
        if !applied.is_empty() {
            tracing::debug!(?applied, "applied environment overrides");
        }
        Ok((config, source))
    }

    fn load_base(
        base_dir: &Path,
        lookup: &impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<(Self, ConfigSource)> {
        if let Some(path_str) = non_empty(lookup("JELLYHOME_CONFIG_PATH")) {
            let path = base_dir.join(path_str.trim());
            let config = Self::load_from_file(&path)?;
            return Ok((config, ConfigSource::EnvPath(path)));
        }

        if let Some(raw) = non_empty(lookup("JELLYHOME_CONFIG_JSON")) {
            let parsed = Self::parse_json(&raw).context("failed to parse JELLYHOME_CONFIG_JSON")?;
            return Ok((parsed, ConfigSource::EnvInline));
        }

        if let Some(path) = Self::find_default_file(base_dir) {
            let config = Self::load_from_file(&path)?;
            return Ok((config, ConfigSource::File(path)));
        }

        Ok((Self::default(), ConfigSource::Default))
    }

    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::parse_json(&contents)
                .with_context(|| format!("invalid config {}", path.display())),
            Some("toml") => toml::from_str(&contents)
                .map_err(|err| anyhow!("invalid config {}: {}", path.display(), err)),
            _ => Self::parse_from_str(&contents, &path.display().to_string()),
        }
    }

    pub fn parse_from_str(contents: &str, origin: &str) -> anyhow::Result<Self> {
        // Try TOML first, then JSON.
        toml::from_str(contents).or_else(|toml_err| {
            serde_json::from_str(contents).map_err(|json_err| {
                anyhow!(
                    "failed to parse config {}: toml error: {}; json error: {}",
                    origin,
                    toml_err,
                    json_err
                )
            })
        })
    }

    pub fn parse_json(raw: &str) -> anyhow::Result<Self> {
        serde_json::from_str(raw).map_err(|err| anyhow!("invalid config json: {err}"))
    }

    /// Apply [`ENV_OVERRIDE_KEYS`] and return the keys that were set.
    /// Blank values are ignored.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Vec<&'static str> {
        let mut applied = Vec::new();
        for &key in ENV_OVERRIDE_KEYS {
            let Some(value) = non_empty(lookup(key)) else {
                continue;
            };
            let value = value.trim().to_string();
            match key {
                "JELLYHOME_SERVER_URL" => self.server.url = value,
                "JELLYHOME_ACCESS_TOKEN" => self.session.access_token = Some(value),
                "JELLYHOME_USER_ID" => self.session.user_id = Some(value),
                "JELLYHOME_DEVICE_ID" => self.session.device_id = Some(value),
                _ => continue,
            }
            applied.push(key);
        }
        applied
    }

    fn find_default_file(base_dir: &Path) -> Option<PathBuf> {
        CANDIDATES
            .iter()
            .map(|candidate| base_dir.join(candidate))
            .find(|path| path.exists())
    }
}
