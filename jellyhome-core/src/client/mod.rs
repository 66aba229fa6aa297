//! Media-server API boundary.
//!
//! [`RemoteClient`] is the only seam the orchestration layer talks through;
//! tests substitute scripted or mocked implementations.

pub mod http;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use jellyhome_model::{
    BaseItem, ItemId, ItemsQuery, LatestMediaQuery, LibraryView, NextUpQuery,
    QueryResult, ResumeItemsQuery, UserDto, UserId, UserItemData,
};

use crate::error::RemoteResult;

/// Typed request/response pairs for the subset of the server API the home
/// screen needs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Items the user started but has not finished.
    async fn resume_items(
        &self,
        user_id: &UserId,
        query: &ResumeItemsQuery,
    ) -> RemoteResult<QueryResult<BaseItem>>;

    /// Top-level views (libraries) visible to the user.
    async fn user_views(&self, user_id: &UserId) -> RemoteResult<QueryResult<LibraryView>>;

    /// Newest items below a parent. The endpoint is not paginated.
    async fn latest_media(
        &self,
        user_id: &UserId,
        query: &LatestMediaQuery,
    ) -> RemoteResult<Vec<BaseItem>>;

    /// The authenticated user, including server-side configuration.
    async fn current_user(&self) -> RemoteResult<UserDto>;

    async fn mark_played(&self, user_id: &UserId, item_id: &ItemId) -> RemoteResult<UserItemData>;

    async fn mark_unplayed(
        &self,
        user_id: &UserId,
        item_id: &ItemId,
    ) -> RemoteResult<UserItemData>;

    /// Next unwatched episode for each series in progress.
    async fn next_up(
        &self,
        user_id: &UserId,
        query: &NextUpQuery,
    ) -> RemoteResult<QueryResult<BaseItem>>;

    /// General item search.
    async fn items(&self, user_id: &UserId, query: &ItemsQuery) -> RemoteResult<QueryResult<BaseItem>>;
}

/// An authenticated user bound to the client that talks on their behalf.
#[derive(Clone)]
pub struct Session {
    user_id: UserId,
    client: Arc<dyn RemoteClient>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("client_type", &std::any::type_name_of_val(self.client.as_ref()))
            .finish()
    }
}

impl Session {
    pub fn new(user_id: UserId, client: Arc<dyn RemoteClient>) -> Self {
        Self { user_id, client }
    }

    /// Resolves the user id by asking the server who the token belongs to.
    pub async fn for_current_user(client: Arc<dyn RemoteClient>) -> RemoteResult<Self> {
        let user = client.current_user().await?;
        tracing::debug!(target: "session", user_id = %user.id, "resolved current user");
        Ok(Self::new(user.id, client))
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn client(&self) -> &dyn RemoteClient {
        self.client.as_ref()
    }
}
