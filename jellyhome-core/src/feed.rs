use std::fmt;
use std::sync::Arc;

use jellyhome_model::{BaseItem, LibraryView};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::cancel::guarded;
use crate::client::Session;
use crate::error::HomeResult;
use crate::paging::{
    FeaturingSource, LatestMediaSource, NextUpSource, PagingSource, RecentlyAddedSource,
};

/// Which home-screen rail a coordinator feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedKind {
    Latest,
    Trending,
    Featuring,
    NextUp,
    RecentlyAdded,
}

impl FeedKind {
    pub fn label(self) -> &'static str {
        match self {
            FeedKind::Latest => "latest",
            FeedKind::Trending => "trending",
            FeedKind::Featuring => "featuring",
            FeedKind::NextUp => "next up",
            FeedKind::RecentlyAdded => "recently added",
        }
    }

    /// Per-library rails get one coordinator per eligible library.
    pub fn is_per_library(self) -> bool {
        matches!(self, FeedKind::Latest | FeedKind::Trending | FeedKind::Featuring)
    }
}

impl fmt::Display for FeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Optional title allow-list for the featuring rail.
///
/// Empty means every item is featured. Matching is case-insensitive on the
/// full item name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeaturingPolicy {
    titles: Vec<String>,
}

impl FeaturingPolicy {
    pub fn allow_titles<I, S>(titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            titles: titles
                .into_iter()
                .map(|title| title.as_ref().trim().to_lowercase())
                .filter(|title| !title.is_empty())
                .collect(),
        }
    }

    pub fn is_unrestricted(&self) -> bool {
        self.titles.is_empty()
    }

    pub fn admits(&self, item: &BaseItem) -> bool {
        if self.is_unrestricted() {
            return true;
        }
        item.name
            .as_deref()
            .map(str::to_lowercase)
            .is_some_and(|name| self.titles.iter().any(|title| *title == name))
    }

    pub fn apply(&self, items: Vec<BaseItem>) -> Vec<BaseItem> {
        if self.is_unrestricted() {
            return items;
        }
        items.into_iter().filter(|item| self.admits(item)).collect()
    }
}

/// One rail: a paging source plus the page it last fetched.
///
/// Cloning is cheap apart from the item list; published snapshots hold
/// clones, so a coordinator is never mutated after it has been published.
#[derive(Clone)]
pub struct SubFeedCoordinator {
    kind: FeedKind,
    library: Option<LibraryView>,
    source: Arc<dyn PagingSource>,
    items: Vec<BaseItem>,
    loaded: bool,
}

impl fmt::Debug for SubFeedCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubFeedCoordinator")
            .field("kind", &self.kind)
            .field("library", &self.library.as_ref().map(|l| &l.id))
            .field("page_size", &self.source.page_size())
            .field("items", &self.items.len())
            .field("loaded", &self.loaded)
            .finish()
    }
}

impl SubFeedCoordinator {
    pub fn new(kind: FeedKind, library: Option<LibraryView>, source: Arc<dyn PagingSource>) -> Self {
        Self {
            kind,
            library,
            source,
            items: Vec::new(),
            loaded: false,
        }
    }

    /// Build the coordinator for a per-library rail.
    pub fn for_library(
        kind: FeedKind,
        library: LibraryView,
        session: &Session,
        page_size: u32,
        featuring: &FeaturingPolicy,
    ) -> Self {
        let latest = LatestMediaSource::new(session.clone(), Some(library.id.clone()), page_size);
        let source: Arc<dyn PagingSource> = match kind {
            FeedKind::Featuring => Arc::new(FeaturingSource::new(latest, featuring.clone())),
            _ => Arc::new(latest),
        };
        Self::new(kind, Some(library), source)
    }

    pub fn next_up(session: &Session, page_size: u32) -> Self {
        Self::new(
            FeedKind::NextUp,
            None,
            Arc::new(NextUpSource::new(session.clone(), page_size)),
        )
    }

    pub fn recently_added(session: &Session, page_size: u32) -> Self {
        Self::new(
            FeedKind::RecentlyAdded,
            None,
            Arc::new(RecentlyAddedSource::new(session.clone(), page_size)),
        )
    }

    /// Fetch the first page and swap it in.
    ///
    /// The previous items stay in place when the fetch fails or the token
    /// fires; there is never a partially updated list.
    pub async fn refresh(&mut self, cancel: &CancellationToken) -> HomeResult<()> {
        let items = guarded(cancel, self.source.fetch(0)).await?;
        tracing::trace!(
            target: "home::feed",
            kind = %self.kind,
            library = ?self.library.as_ref().map(|l| l.id.as_str()),
            count = items.len(),
            "sub-feed refreshed"
        );
        self.items = items;
        self.loaded = true;
        Ok(())
    }

    pub fn kind(&self) -> FeedKind {
        self.kind
    }

    pub fn library(&self) -> Option<&LibraryView> {
        self.library.as_ref()
    }

    pub fn items(&self) -> &[BaseItem] {
        &self.items
    }

    /// False until the first successful refresh.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn page_size(&self) -> u32 {
        self.source.page_size()
    }
}
