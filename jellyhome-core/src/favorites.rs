//! Favourites screen: one search for everything the user starred, split by
//! kind.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use jellyhome_model::{BaseItem, ItemKind, ItemsQuery};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cancel::guarded;
use crate::client::Session;
use crate::error::{ErrorCause, HomeError, HomeResult};

pub const DEFAULT_FAVORITES_LIMIT: u32 = 100;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FavoritesState {
    #[default]
    Initial,
    Loading,
    Content,
    Error(ErrorCause),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FavoritesSnapshot {
    pub state: FavoritesState,
    pub movies: Vec<BaseItem>,
    pub series: Vec<BaseItem>,
    pub episodes: Vec<BaseItem>,
    pub collections: Vec<BaseItem>,
    pub people: Vec<BaseItem>,
}

impl FavoritesSnapshot {
    /// True once loaded and nothing was starred.
    pub fn has_no_favorites(&self) -> bool {
        self.state == FavoritesState::Content && self.len() == 0
    }

    pub fn len(&self) -> usize {
        self.movies.len()
            + self.series.len()
            + self.episodes.len()
            + self.collections.len()
            + self.people.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn clear_items(&mut self) {
        self.movies.clear();
        self.series.clear();
        self.episodes.clear();
        self.collections.clear();
        self.people.clear();
    }

    /// Sort `items` into their lists. Kinds with no list are dropped.
    fn fill(&mut self, items: Vec<BaseItem>) {
        for item in items {
            let list = match item.kind.as_ref() {
                Some(ItemKind::Movie) => &mut self.movies,
                Some(ItemKind::Series) => &mut self.series,
                Some(ItemKind::Episode) => &mut self.episodes,
                Some(ItemKind::BoxSet) => &mut self.collections,
                Some(ItemKind::Person) => &mut self.people,
                _ => continue,
            };
            list.push(item);
        }
    }
}

#[derive(Debug)]
struct PendingLoad {
    id: u64,
    token: CancellationToken,
    /// Published again if the load is cancelled.
    previous: FavoritesSnapshot,
}

#[derive(Debug, Default)]
struct LoadSlot {
    next_id: u64,
    current: Option<PendingLoad>,
}

struct Inner {
    session: Session,
    limit: u32,
    snapshot: watch::Sender<FavoritesSnapshot>,
    slot: Mutex<LoadSlot>,
}

/// Loads and publishes the user's favourites.
#[derive(Clone)]
pub struct FavoritesAggregator {
    inner: Arc<Inner>,
}

impl fmt::Debug for FavoritesAggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FavoritesAggregator")
            .field("session", &self.inner.session)
            .field("limit", &self.inner.limit)
            .field("state", &self.inner.snapshot.borrow().state)
            .finish()
    }
}

impl FavoritesAggregator {
    pub fn new(session: Session) -> Self {
        Self::with_limit(session, DEFAULT_FAVORITES_LIMIT)
    }

    pub fn with_limit(session: Session, limit: u32) -> Self {
        let (snapshot, _) = watch::channel(FavoritesSnapshot::default());
        Self {
            inner: Arc::new(Inner {
                session,
                limit,
                snapshot,
                slot: Mutex::new(LoadSlot::default()),
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<FavoritesSnapshot> {
        self.inner.snapshot.subscribe()
    }

    pub fn snapshot(&self) -> FavoritesSnapshot {
        self.inner.snapshot.borrow().clone()
    }

    /// Clear the lists and fetch favourites again.
    ///
    /// Returns `None` while a load is already running.
    pub fn load(&self) -> Option<JoinHandle<()>> {
        let (id, token) = {
            let mut slot = self.inner.lock_slot();
            if slot.current.is_some() {
                debug!(target: "favorites", "load already in flight");
                return None;
            }

            slot.next_id += 1;
            let id = slot.next_id;
            let token = CancellationToken::new();
            slot.current = Some(PendingLoad {
                id,
                token: token.clone(),
                previous: self.inner.snapshot.borrow().clone(),
            });

            self.inner.snapshot.send_modify(|snapshot| {
                snapshot.clear_items();
                snapshot.state = FavoritesState::Loading;
            });
            (id, token)
        };

        let inner = Arc::clone(&self.inner);
        Some(tokio::spawn(async move { inner.run_load(id, token).await }))
    }

    pub fn refresh(&self) -> Option<JoinHandle<()>> {
        self.load()
    }

    /// Abandon the running load and republish what was shown before it.
    pub fn cancel(&self) {
        let mut slot = self.inner.lock_slot();
        if let Some(pending) = slot.current.take() {
            pending.token.cancel();
            debug!(target: "favorites", task = pending.id, "favourites load cancelled");
            self.inner.snapshot.send_replace(pending.previous);
        }
    }
}

impl Inner {
    fn lock_slot(&self) -> MutexGuard<'_, LoadSlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn fetch(&self, token: &CancellationToken) -> HomeResult<Vec<BaseItem>> {
        let query = ItemsQuery::favorites(self.limit);
        let result = guarded(
            token,
            self.session.client().items(self.session.user_id(), &query),
        )
        .await?;
        Ok(result.items)
    }

    async fn run_load(self: Arc<Self>, id: u64, token: CancellationToken) {
        let outcome = self.fetch(&token).await;

        let mut slot = self.lock_slot();
        let current = slot
            .current
            .as_ref()
            .is_some_and(|pending| pending.id == id && !pending.token.is_cancelled());
        if !current {
            debug!(target: "favorites", task = id, "favourites load abandoned");
            return;
        }
        slot.current = None;

        match outcome {
            Ok(items) => {
                let count = items.len();
                self.snapshot.send_modify(|snapshot| {
                    snapshot.fill(items);
                    snapshot.state = FavoritesState::Content;
                });
                info!(target: "favorites", count, "favourites loaded");
            }
            Err(HomeError::Cancelled) => {}
            Err(HomeError::Remote(err)) => {
                warn!(target: "favorites", error = %err, "failed to load favourites");
                let cause = ErrorCause::from(&err);
                self.snapshot.send_modify(|snapshot| {
                    snapshot.state = FavoritesState::Error(cause);
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, kind: ItemKind) -> BaseItem {
        BaseItem::new(id, id, kind)
    }

    #[test]
    fn fill_partitions_by_kind_and_drops_the_rest() {
        let mut snapshot = FavoritesSnapshot::default();
        snapshot.fill(vec![
            item("m", ItemKind::Movie),
            item("s", ItemKind::Series),
            item("e", ItemKind::Episode),
            item("b", ItemKind::BoxSet),
            item("p", ItemKind::Person),
            item("f", ItemKind::Folder),
            item("m2", ItemKind::Movie),
        ]);

        assert_eq!(snapshot.movies.len(), 2);
        assert_eq!(snapshot.series.len(), 1);
        assert_eq!(snapshot.episodes.len(), 1);
        assert_eq!(snapshot.collections.len(), 1);
        assert_eq!(snapshot.people.len(), 1);
        assert_eq!(snapshot.len(), 6);
    }

    #[test]
    fn no_favorites_only_after_content() {
        let mut snapshot = FavoritesSnapshot::default();
        assert!(!snapshot.has_no_favorites());
        snapshot.state = FavoritesState::Content;
        assert!(snapshot.has_no_favorites());
    }
}
