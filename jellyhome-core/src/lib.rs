//! Home-screen data layer for Jellyfin-compatible media servers.
//!
//! The crate is layered bottom-up:
//!
//! - [`client`]: the [`RemoteClient`] boundary plus the reqwest-backed
//!   [`JellyfinClient`].
//! - [`paging`]: single-page fetchers bound to one parent collection.
//! - [`feed`]: [`SubFeedCoordinator`], which owns one paging source and its
//!   most recently fetched page.
//! - [`home`]: [`HomeAggregator`], the refresh state machine observers
//!   subscribe to.
//! - [`favorites`]: [`FavoritesAggregator`] for the favourites screen.
//!
//! All asynchronous work is cancellable through
//! [`tokio_util::sync::CancellationToken`]; superseded work never publishes.

pub mod cancel;
pub mod client;
pub mod error;
pub mod favorites;
pub mod feed;
pub mod home;
pub mod libraries;
pub mod paging;

pub use client::http::{ClientIdentity, JellyfinClient};
pub use client::{RemoteClient, Session};
pub use error::{ErrorCause, HomeError, HomeResult, RemoteError, RemoteResult};
pub use favorites::{FavoritesAggregator, FavoritesSnapshot, FavoritesState};
pub use feed::{FeaturingPolicy, FeedKind, SubFeedCoordinator};
pub use home::{
    BackgroundErrorPolicy, BackgroundState, HomeAction, HomeAggregator,
    HomeNotification, HomeSettings, HomeSnapshot, RefreshState,
};
pub use libraries::eligible_libraries;
pub use paging::PagingSource;

pub use jellyhome_model as model;
