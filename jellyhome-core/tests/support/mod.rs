//! Scripted `RemoteClient` for orchestration tests.
//!
//! Responses are captured when a request arrives; gated endpoints then park
//! the request until the test releases them.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use jellyhome_core::model::{
    BaseItem, CollectionType, ItemFilter, ItemId, ItemKind, ItemsQuery, LatestMediaQuery,
    LibraryId, LibraryView, NextUpQuery, QueryResult, ResumeItemsQuery, UserConfiguration,
    UserDto, UserId, UserItemData,
};
use jellyhome_core::{RemoteClient, RemoteError, RemoteResult, Session};
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Resume,
    Views,
    Latest,
    CurrentUser,
    MarkPlayed,
    MarkUnplayed,
    NextUp,
    Items,
}

#[derive(Debug, Default)]
struct ServerState {
    views: Vec<LibraryView>,
    excluded: Vec<LibraryId>,
    resume: Vec<BaseItem>,
    latest: HashMap<String, Vec<BaseItem>>,
    next_up: Vec<BaseItem>,
    recently_added: Vec<BaseItem>,
    favorites: Vec<BaseItem>,
    played: HashSet<ItemId>,
    failing: HashSet<Endpoint>,
    calls: HashMap<Endpoint, usize>,
    latest_parents: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ScriptedClient {
    state: Arc<Mutex<ServerState>>,
    gates: Arc<Mutex<HashMap<Endpoint, watch::Sender<bool>>>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> Session {
        Session::new(UserId::new("viewer"), Arc::new(self.clone()))
    }

    pub fn set_views(&self, views: Vec<LibraryView>) {
        self.state.lock().unwrap().views = views;
    }

    pub fn set_excluded(&self, excluded: &[&str]) {
        self.state.lock().unwrap().excluded = excluded.iter().map(|id| LibraryId::new(*id)).collect();
    }

    pub fn set_resume(&self, items: Vec<BaseItem>) {
        self.state.lock().unwrap().resume = items;
    }

    pub fn set_latest(&self, library: &str, items: Vec<BaseItem>) {
        self.state.lock().unwrap().latest.insert(library.to_owned(), items);
    }

    pub fn set_next_up(&self, items: Vec<BaseItem>) {
        self.state.lock().unwrap().next_up = items;
    }

    pub fn set_recently_added(&self, items: Vec<BaseItem>) {
        self.state.lock().unwrap().recently_added = items;
    }

    pub fn set_favorites(&self, items: Vec<BaseItem>) {
        self.state.lock().unwrap().favorites = items;
    }

    pub fn fail(&self, endpoint: Endpoint) {
        self.state.lock().unwrap().failing.insert(endpoint);
    }

    pub fn recover(&self, endpoint: Endpoint) {
        self.state.lock().unwrap().failing.remove(&endpoint);
    }

    pub fn calls(&self, endpoint: Endpoint) -> usize {
        self.state.lock().unwrap().calls.get(&endpoint).copied().unwrap_or(0)
    }

    /// Parent ids requested from the latest-media endpoint, in call order.
    pub fn latest_parents(&self) -> Vec<String> {
        self.state.lock().unwrap().latest_parents.clone()
    }

    /// Park every request to `endpoint` until [`release`](Self::release).
    pub fn hold(&self, endpoint: Endpoint) {
        let (tx, _) = watch::channel(false);
        self.gates.lock().unwrap().insert(endpoint, tx);
    }

    pub fn release(&self, endpoint: Endpoint) {
        if let Some(gate) = self.gates.lock().unwrap().remove(&endpoint) {
            gate.send_replace(true);
        }
    }

    /// Wait until `endpoint` has been called at least `count` times.
    pub async fn wait_for_calls(&self, endpoint: Endpoint, count: usize) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while self.calls(endpoint) < count {
            assert!(
                tokio::time::Instant::now() < deadline,
                "timed out waiting for {count} call(s) to {endpoint:?}"
            );
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    }

    fn record<T>(&self, endpoint: Endpoint, respond: impl FnOnce(&mut ServerState) -> T) -> (bool, T) {
        let mut state = self.state.lock().unwrap();
        *state.calls.entry(endpoint).or_default() += 1;
        let failing = state.failing.contains(&endpoint);
        (failing, respond(&mut *state))
    }

    async fn pass(&self, endpoint: Endpoint) {
        let gate = self.gates.lock().unwrap().get(&endpoint).map(|tx| tx.subscribe());
        if let Some(mut gate) = gate {
            let _ = gate.wait_for(|open| *open).await;
        }
    }

    async fn respond<T>(
        &self,
        endpoint: Endpoint,
        respond: impl FnOnce(&mut ServerState) -> T,
    ) -> RemoteResult<T> {
        let (failing, value) = self.record(endpoint, respond);
        self.pass(endpoint).await;
        if failing {
            return Err(RemoteError::Status {
                status: 500,
                message: format!("{endpoint:?} unavailable"),
            });
        }
        Ok(value)
    }
}

fn with_played(mut item: BaseItem, played: &HashSet<ItemId>) -> BaseItem {
    let data = item.user_data.get_or_insert_with(UserItemData::default);
    data.played = played.contains(&item.id);
    item
}

#[async_trait]
impl RemoteClient for ScriptedClient {
    async fn resume_items(
        &self,
        _user_id: &UserId,
        _query: &ResumeItemsQuery,
    ) -> RemoteResult<QueryResult<BaseItem>> {
        self.respond(Endpoint::Resume, |state| {
            let items = state
                .resume
                .iter()
                .cloned()
                .map(|item| with_played(item, &state.played))
                .collect();
            QueryResult::from_items(items)
        })
        .await
    }

    async fn user_views(&self, _user_id: &UserId) -> RemoteResult<QueryResult<LibraryView>> {
        self.respond(Endpoint::Views, |state| QueryResult::from_items(state.views.clone()))
            .await
    }

    async fn latest_media(
        &self,
        _user_id: &UserId,
        query: &LatestMediaQuery,
    ) -> RemoteResult<Vec<BaseItem>> {
        let parent = query
            .parent_id
            .as_ref()
            .map(|id| id.as_str().to_owned())
            .unwrap_or_default();
        self.respond(Endpoint::Latest, move |state| {
            state.latest_parents.push(parent.clone());
            state.latest.get(&parent).cloned().unwrap_or_default()
        })
        .await
    }

    async fn current_user(&self) -> RemoteResult<UserDto> {
        self.respond(Endpoint::CurrentUser, |state| UserDto {
            id: UserId::new("viewer"),
            name: Some("Viewer".into()),
            server_id: None,
            configuration: Some(UserConfiguration {
                latest_items_excludes: state.excluded.clone(),
                ..UserConfiguration::default()
            }),
        })
        .await
    }

    async fn mark_played(&self, _user_id: &UserId, item_id: &ItemId) -> RemoteResult<UserItemData> {
        let item_id = item_id.clone();
        self.respond(Endpoint::MarkPlayed, move |state| {
            if !state.failing.contains(&Endpoint::MarkPlayed) {
                state.played.insert(item_id);
            }
            UserItemData {
                played: true,
                ..UserItemData::default()
            }
        })
        .await
    }

    async fn mark_unplayed(
        &self,
        _user_id: &UserId,
        item_id: &ItemId,
    ) -> RemoteResult<UserItemData> {
        let item_id = item_id.clone();
        self.respond(Endpoint::MarkUnplayed, move |state| {
            if !state.failing.contains(&Endpoint::MarkUnplayed) {
                state.played.remove(&item_id);
            }
            UserItemData::default()
        })
        .await
    }

    async fn next_up(
        &self,
        _user_id: &UserId,
        _query: &NextUpQuery,
    ) -> RemoteResult<QueryResult<BaseItem>> {
        self.respond(Endpoint::NextUp, |state| QueryResult::from_items(state.next_up.clone()))
            .await
    }

    async fn items(&self, _user_id: &UserId, query: &ItemsQuery) -> RemoteResult<QueryResult<BaseItem>> {
        let favorites = query.filters.contains(&ItemFilter::IsFavorite);
        self.respond(Endpoint::Items, move |state| {
            let items = if favorites {
                state.favorites.clone()
            } else {
                state.recently_added.clone()
            };
            QueryResult::from_items(items)
        })
        .await
    }
}

pub fn movie(id: &str) -> BaseItem {
    BaseItem::new(id, format!("Movie {id}"), ItemKind::Movie)
}

pub fn episode(id: &str) -> BaseItem {
    BaseItem::new(id, format!("Episode {id}"), ItemKind::Episode)
}

pub fn item(id: &str, kind: ItemKind) -> BaseItem {
    BaseItem::new(id, id, kind)
}

pub fn library(id: &str, kind: CollectionType) -> LibraryView {
    LibraryView::new(id, id.to_uppercase(), Some(kind))
}

pub fn ids(items: &[BaseItem]) -> Vec<&str> {
    items.iter().map(|item| item.id.as_str()).collect()
}
