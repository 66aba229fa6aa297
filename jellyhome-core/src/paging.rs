//! Single-page fetchers bound to one parent collection.
//!
//! A source holds nothing but its session, parent and page size. Every
//! `fetch` goes to the server; there is no caching and no retry.

use std::fmt;

use async_trait::async_trait;
use jellyhome_model::{
    BaseItem, ItemsQuery, LatestMediaQuery, LibraryId, NextUpQuery,
};

use crate::client::Session;
use crate::error::RemoteResult;
use crate::feed::FeaturingPolicy;

/// Fetches one page of items for a parent collection.
#[async_trait]
pub trait PagingSource: Send + Sync {
    /// Fixed at construction.
    fn page_size(&self) -> u32;

    /// Fetch page `page` (zero-based). Never returns more than
    /// [`page_size`](Self::page_size) items.
    async fn fetch(&self, page: u32) -> RemoteResult<Vec<BaseItem>>;
}

fn cap(mut items: Vec<BaseItem>, page_size: u32) -> Vec<BaseItem> {
    let limit = page_size as usize;
    if items.len() > limit {
        tracing::debug!(
            target: "paging",
            received = items.len(),
            limit,
            "server returned more items than requested; truncating"
        );
        items.truncate(limit);
    }
    items
}

/// Newest items in one library.
///
/// The latest-media endpoint is not paginated, so every page index yields
/// the same head of the collection. Latest and trending rails share it.
#[derive(Clone)]
pub struct LatestMediaSource {
    session: Session,
    parent: Option<LibraryId>,
    page_size: u32,
}

impl fmt::Debug for LatestMediaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LatestMediaSource")
            .field("parent", &self.parent)
            .field("page_size", &self.page_size)
            .finish()
    }
}

impl LatestMediaSource {
    pub fn new(session: Session, parent: Option<LibraryId>, page_size: u32) -> Self {
        Self {
            session,
            parent,
            page_size,
        }
    }
}

#[async_trait]
impl PagingSource for LatestMediaSource {
    fn page_size(&self) -> u32 {
        self.page_size
    }

    async fn fetch(&self, _page: u32) -> RemoteResult<Vec<BaseItem>> {
        let query = LatestMediaQuery::for_parent(self.parent.clone().map(Into::into), self.page_size);
        let items = self
            .session
            .client()
            .latest_media(self.session.user_id(), &query)
            .await?;
        Ok(cap(items, self.page_size))
    }
}

/// Latest items narrowed by the configured [`FeaturingPolicy`].
#[derive(Debug, Clone)]
pub struct FeaturingSource {
    inner: LatestMediaSource,
    policy: FeaturingPolicy,
}

impl FeaturingSource {
    pub fn new(inner: LatestMediaSource, policy: FeaturingPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl PagingSource for FeaturingSource {
    fn page_size(&self) -> u32 {
        self.inner.page_size()
    }

    async fn fetch(&self, page: u32) -> RemoteResult<Vec<BaseItem>> {
        let items = self.inner.fetch(page).await?;
        Ok(self.policy.apply(items))
    }
}

/// Next unwatched episode per in-progress series.
#[derive(Clone)]
pub struct NextUpSource {
    session: Session,
    page_size: u32,
}

impl fmt::Debug for NextUpSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NextUpSource")
            .field("page_size", &self.page_size)
            .finish()
    }
}

impl NextUpSource {
    pub fn new(session: Session, page_size: u32) -> Self {
        Self { session, page_size }
    }
}

#[async_trait]
impl PagingSource for NextUpSource {
    fn page_size(&self) -> u32 {
        self.page_size
    }

    async fn fetch(&self, page: u32) -> RemoteResult<Vec<BaseItem>> {
        let query = NextUpQuery::page(page, self.page_size);
        let result = self
            .session
            .client()
            .next_up(self.session.user_id(), &query)
            .await?;
        Ok(cap(result.items, self.page_size))
    }
}

/// Newest movies and series across every library.
#[derive(Clone)]
pub struct RecentlyAddedSource {
    session: Session,
    page_size: u32,
}

impl fmt::Debug for RecentlyAddedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecentlyAddedSource")
            .field("page_size", &self.page_size)
            .finish()
    }
}

impl RecentlyAddedSource {
    pub fn new(session: Session, page_size: u32) -> Self {
        Self { session, page_size }
    }
}

#[async_trait]
impl PagingSource for RecentlyAddedSource {
    fn page_size(&self) -> u32 {
        self.page_size
    }

    async fn fetch(&self, page: u32) -> RemoteResult<Vec<BaseItem>> {
        let query = ItemsQuery::recently_added(page, self.page_size);
        let result = self
            .session
            .client()
            .items(self.session.user_id(), &query)
            .await?;
        Ok(cap(result.items, self.page_size))
    }
}
