//! Configuration for the jellyhome client.
//!
//! One [`JellyhomeConfig`] describes which server to talk to, the session to
//! talk as, and how the home and favourites screens are tuned. It is loaded
//! from a TOML or JSON file (or inline JSON), then narrowed by environment
//! overrides and checked by [`JellyhomeConfig::validate`] before use.

pub mod loader;
pub mod models;
pub mod validation;

pub use loader::{ConfigSource, ENV_OVERRIDE_KEYS};
pub use models::{
    FavoritesConfig, HomeConfig, HttpConfig, JellyhomeConfig, ServerConfig, SessionConfig,
};
pub use validation::{ConfigGuardRailError, ConfigWarning};
