use std::collections::HashSet;
use std::fmt;
use std::pin::pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use futures::future::try_join_all;
use jellyhome_model::{BaseItem, LibraryView, ResumeItemsQuery};
use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::state::{
    BackgroundErrorPolicy, BackgroundState, HomeAction, HomeNotification, HomeSettings,
    HomeSnapshot, RefreshState,
};
use crate::cancel::{ensure_live, guarded};
use crate::client::Session;
use crate::error::{ErrorCause, HomeError, HomeResult};
use crate::feed::{FeedKind, SubFeedCoordinator};
use crate::libraries::eligible_libraries;

/// Handle of one spawned refresh, identified so a finished task can tell
/// whether it is still the current one.
#[derive(Debug)]
struct InFlight {
    id: u64,
    token: CancellationToken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Foreground,
    Background,
}

#[derive(Debug, Default)]
struct TaskSlots {
    next_id: u64,
    foreground: Option<InFlight>,
    background: Option<InFlight>,
    /// State published before the current run of foreground refreshes.
    prior_state: Option<RefreshState>,
}

impl TaskSlots {
    fn slot_mut(&mut self, slot: Slot) -> &mut Option<InFlight> {
        match slot {
            Slot::Foreground => &mut self.foreground,
            Slot::Background => &mut self.background,
        }
    }

    /// Cancel whatever occupies `slot` and leave it empty.
    fn cancel(&mut self, slot: Slot) -> bool {
        match self.slot_mut(slot).take() {
            Some(task) => {
                task.token.cancel();
                debug!(target: "home::refresh", ?slot, task = task.id, "cancelled in-flight task");
                true
            }
            None => false,
        }
    }

    fn occupy(&mut self, slot: Slot) -> (u64, CancellationToken) {
        self.next_id += 1;
        let id = self.next_id;
        let token = CancellationToken::new();
        *self.slot_mut(slot) = Some(InFlight {
            id,
            token: token.clone(),
        });
        (id, token)
    }

    /// Vacate `slot` if task `id` still owns it and was not cancelled.
    fn release(&mut self, slot: Slot, id: u64) -> bool {
        let entry = self.slot_mut(slot);
        let current = entry
            .as_ref()
            .is_some_and(|task| task.id == id && !task.token.is_cancelled());
        if current {
            *entry = None;
        }
        current
    }
}

struct HomeContent {
    resume_items: Vec<BaseItem>,
    latest: Vec<SubFeedCoordinator>,
    trending: Vec<SubFeedCoordinator>,
    featuring: Vec<SubFeedCoordinator>,
    next_up: SubFeedCoordinator,
    recently_added: SubFeedCoordinator,
}

struct BackgroundContent {
    resume_items: Vec<BaseItem>,
    next_up: SubFeedCoordinator,
    recently_added: SubFeedCoordinator,
}

struct Inner {
    session: Session,
    settings: HomeSettings,
    snapshot: watch::Sender<HomeSnapshot>,
    tasks: Mutex<TaskSlots>,
    /// Woken whenever a slot is vacated.
    settled: Notify,
}

/// Coordinates home-screen refreshes and publishes [`HomeSnapshot`]s.
///
/// Cloning yields another handle to the same aggregator. Methods that start
/// work spawn onto the current tokio runtime and return the task handle so
/// callers may await completion; dropping the handle does not cancel.
#[derive(Clone)]
pub struct HomeAggregator {
    inner: Arc<Inner>,
}

impl fmt::Debug for HomeAggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (foreground, background) = self
            .inner
            .tasks
            .try_lock()
            .map(|slots| (slots.foreground.is_some(), slots.background.is_some()))
            .unwrap_or_default();

        f.debug_struct("HomeAggregator")
            .field("session", &self.inner.session)
            .field("settings", &self.inner.settings)
            .field("state", &self.inner.snapshot.borrow().state)
            .field("foreground_in_flight", &foreground)
            .field("background_in_flight", &background)
            .finish()
    }
}

impl HomeAggregator {
    pub fn new(session: Session, settings: HomeSettings) -> Self {
        let (snapshot, _) = watch::channel(HomeSnapshot::default());
        Self {
            inner: Arc::new(Inner {
                session,
                settings,
                snapshot,
                tasks: Mutex::new(TaskSlots::default()),
                settled: Notify::new(),
            }),
        }
    }

    /// Receive every snapshot published from now on.
    pub fn subscribe(&self) -> watch::Receiver<HomeSnapshot> {
        self.inner.snapshot.subscribe()
    }

    pub fn snapshot(&self) -> HomeSnapshot {
        self.inner.snapshot.borrow().clone()
    }

    pub fn state(&self) -> RefreshState {
        self.inner.snapshot.borrow().state.clone()
    }

    pub fn settings(&self) -> &HomeSettings {
        &self.inner.settings
    }

    /// Dispatch an action from the presentation layer.
    pub fn send(&self, action: HomeAction) -> Option<JoinHandle<()>> {
        match action {
            HomeAction::Refresh => Some(self.refresh()),
            HomeAction::BackgroundRefresh => self.background_refresh(),
            HomeAction::SetIsPlayed { played, item } => Some(self.set_is_played(played, &item)),
            HomeAction::Error(cause) => {
                self.report_error(cause);
                None
            }
        }
    }

    /// Reload every rail, superseding any in-flight refresh.
    pub fn refresh(&self) -> JoinHandle<()> {
        let (id, token) = {
            let mut slots = self.inner.lock_tasks();
            if !slots.cancel(Slot::Foreground) {
                slots.prior_state = Some(self.inner.snapshot.borrow().state.clone());
            }
            slots.cancel(Slot::Background);
            let started = slots.occupy(Slot::Foreground);

            self.inner.snapshot.send_modify(|snapshot| {
                snapshot.background.remove(&BackgroundState::Refresh);
                snapshot.state = RefreshState::Refreshing;
            });
            started
        };

        info!(target: "home::refresh", task = id, "starting home refresh");
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.run_refresh(id, token).await })
    }

    /// Refresh continue-watching, next up and recently added without
    /// leaving the current state.
    ///
    /// Returns `None` when a background refresh is already in flight or a
    /// foreground refresh is running; neither is restarted.
    pub fn background_refresh(&self) -> Option<JoinHandle<()>> {
        let (id, token) = {
            let mut slots = self.inner.lock_tasks();
            if self.inner.snapshot.borrow().is_background_refreshing() {
                debug!(target: "home::background", "background refresh already in flight");
                return None;
            }
            if slots.foreground.is_some() {
                debug!(target: "home::background", "foreground refresh in flight; skipping");
                return None;
            }

            let started = slots.occupy(Slot::Background);
            self.inner.snapshot.send_modify(|snapshot| {
                snapshot.background.insert(BackgroundState::Refresh);
            });
            started
        };

        debug!(target: "home::background", task = id, "starting background refresh");
        let inner = Arc::clone(&self.inner);
        Some(tokio::spawn(async move { inner.run_background(id, token).await }))
    }

    /// Mark `item` played or unplayed, then reconcile with a background
    /// refresh. The returned task completes after that refresh does.
    ///
    /// A refresh already in flight may have read the server before the
    /// change, so the reconciling refresh starts once it settles.
    pub fn set_is_played(&self, played: bool, item: &BaseItem) -> JoinHandle<()> {
        let this = self.clone();
        let item_id = item.id.clone();

        tokio::spawn(async move {
            let session = &this.inner.session;
            let result = if played {
                session.client().mark_played(session.user_id(), &item_id).await
            } else {
                session.client().mark_unplayed(session.user_id(), &item_id).await
            };

            match result {
                Ok(_) => {
                    debug!(target: "home::played", item = %item_id, played, "played state updated");
                    this.reconcile().await;
                }
                Err(err) => {
                    warn!(target: "home::played", item = %item_id, error = %err, "failed to update played state");
                    this.report_error(ErrorCause::from(&err));
                }
            }
        })
    }

    /// Replace the displayed content with an error.
    pub fn report_error(&self, cause: ErrorCause) {
        self.inner.snapshot.send_modify(|snapshot| {
            snapshot.state = RefreshState::Error(cause);
        });
    }

    pub fn record_notification(&self, notification: HomeNotification) {
        self.inner
            .snapshot
            .send_if_modified(|snapshot| snapshot.notifications.insert(notification));
    }

    pub fn clear_notifications(&self) {
        self.inner.snapshot.send_if_modified(|snapshot| {
            let had_any = !snapshot.notifications.is_empty();
            snapshot.notifications.clear();
            had_any
        });
    }

    /// Cancel all in-flight refresh work.
    ///
    /// A cancelled foreground refresh puts back the state published before
    /// it started; the background marker is cleared.
    pub fn cancel_all(&self) {
        {
            let mut slots = self.inner.lock_tasks();
            let foreground = slots.cancel(Slot::Foreground);
            let background = slots.cancel(Slot::Background);
            let prior = if foreground {
                slots.prior_state.take()
            } else {
                None
            };

            if foreground || background {
                self.inner.snapshot.send_modify(|snapshot| {
                    if let Some(state) = prior {
                        snapshot.state = state;
                    }
                    snapshot.background.remove(&BackgroundState::Refresh);
                });
            }
        }
        self.inner.settled.notify_waiters();
    }

    /// Start a background refresh, first waiting out any refresh that is
    /// already running.
    async fn reconcile(&self) {
        loop {
            let mut settled = pin!(self.inner.settled.notified());
            settled.as_mut().enable();

            if let Some(handle) = self.background_refresh() {
                if let Err(err) = handle.await {
                    warn!(target: "home::played", error = %err, "background refresh task aborted");
                }
                return;
            }

            debug!(target: "home::played", "refresh in flight; reconciling once it settles");
            settled.await;
        }
    }
}

impl Inner {
    fn lock_tasks(&self) -> MutexGuard<'_, TaskSlots> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `publish` only if task `id` still owns `slot`.
    ///
    /// Cancellation also happens under the task lock, so once a token has
    /// fired its task can no longer reach the snapshot.
    fn publish(&self, slot: Slot, id: u64, publish: impl FnOnce(&mut HomeSnapshot)) -> bool {
        {
            let mut slots = self.lock_tasks();
            if !slots.release(slot, id) {
                return false;
            }
            self.snapshot.send_modify(publish);
        }
        self.settled.notify_waiters();
        true
    }

    async fn run_refresh(self: Arc<Self>, id: u64, token: CancellationToken) {
        let started = Instant::now();

        match self.load_home(&token).await {
            Ok(content) => {
                let libraries = content.latest.len();
                let resume = content.resume_items.len();
                let published = self.publish(Slot::Foreground, id, |snapshot| {
                    snapshot.resume_items = content.resume_items;
                    snapshot.latest = content.latest;
                    snapshot.trending = content.trending;
                    snapshot.featuring = content.featuring;
                    snapshot.next_up = Some(content.next_up);
                    snapshot.recently_added = Some(content.recently_added);
                    snapshot.state = RefreshState::Content;
                });
                if published {
                    info!(
                        target: "home::refresh",
                        task = id,
                        libraries,
                        resume,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "home refresh published"
                    );
                } else {
                    debug!(target: "home::refresh", task = id, "superseded before publish");
                }
            }
            Err(HomeError::Cancelled) => {
                debug!(target: "home::refresh", task = id, "home refresh cancelled");
            }
            Err(HomeError::Remote(err)) => {
                warn!(target: "home::refresh", task = id, error = %err, "home refresh failed");
                let cause = ErrorCause::from(&err);
                self.publish(Slot::Foreground, id, |snapshot| {
                    snapshot.state = RefreshState::Error(cause);
                });
            }
        }
    }

    async fn run_background(self: Arc<Self>, id: u64, token: CancellationToken) {
        match self.load_background(&token).await {
            Ok(content) => {
                self.publish(Slot::Background, id, |snapshot| {
                    snapshot.resume_items = content.resume_items;
                    snapshot.next_up = Some(content.next_up);
                    snapshot.recently_added = Some(content.recently_added);
                    snapshot.last_background_error = None;
                    snapshot.background.remove(&BackgroundState::Refresh);
                });
            }
            Err(HomeError::Cancelled) => {
                // Whoever cancelled us already cleared the marker.
                debug!(target: "home::background", task = id, "background refresh cancelled");
            }
            Err(HomeError::Remote(err)) => {
                warn!(target: "home::background", task = id, error = %err, "background refresh failed");
                let cause = ErrorCause::from(&err);
                let policy = self.settings.background_errors;
                self.publish(Slot::Background, id, |snapshot| {
                    snapshot.background.remove(&BackgroundState::Refresh);
                    if policy == BackgroundErrorPolicy::Surface {
                        snapshot.state = RefreshState::Error(cause.clone());
                    }
                    snapshot.last_background_error = Some(cause);
                });
            }
        }
    }

    async fn load_home(&self, token: &CancellationToken) -> HomeResult<HomeContent> {
        let page_size = self.settings.page_size;

        // Phase one: resume items and the rail layout.
        let (resume_items, libraries) =
            tokio::try_join!(self.fetch_resume_items(token), self.fetch_libraries(token))?;

        let build = |kind: FeedKind| -> Vec<SubFeedCoordinator> {
            libraries
                .iter()
                .cloned()
                .map(|library| {
                    SubFeedCoordinator::for_library(
                        kind,
                        library,
                        &self.session,
                        page_size,
                        &self.settings.featuring,
                    )
                })
                .collect()
        };
        let mut latest = build(FeedKind::Latest);
        let mut trending = build(FeedKind::Trending);
        let mut featuring = build(FeedKind::Featuring);
        let mut next_up = SubFeedCoordinator::next_up(&self.session, page_size);
        let mut recently_added = SubFeedCoordinator::recently_added(&self.session, page_size);

        // Phase two: populate every rail.
        let feeds = latest
            .iter_mut()
            .chain(trending.iter_mut())
            .chain(featuring.iter_mut())
            .chain([&mut next_up, &mut recently_added]);
        try_join_all(feeds.map(|feed| feed.refresh(token))).await?;

        ensure_live(token)?;
        Ok(HomeContent {
            resume_items,
            latest,
            trending,
            featuring,
            next_up,
            recently_added,
        })
    }

    async fn load_background(&self, token: &CancellationToken) -> HomeResult<BackgroundContent> {
        let page_size = self.settings.page_size;
        let mut next_up = SubFeedCoordinator::next_up(&self.session, page_size);
        let mut recently_added = SubFeedCoordinator::recently_added(&self.session, page_size);

        let (resume_items, (), ()) = tokio::try_join!(
            self.fetch_resume_items(token),
            next_up.refresh(token),
            recently_added.refresh(token),
        )?;

        ensure_live(token)?;
        Ok(BackgroundContent {
            resume_items,
            next_up,
            recently_added,
        })
    }

    async fn fetch_resume_items(&self, token: &CancellationToken) -> HomeResult<Vec<BaseItem>> {
        let limit = self.settings.resume_limit;
        let query = ResumeItemsQuery::continue_watching(limit);
        let result = guarded(
            token,
            self.session
                .client()
                .resume_items(self.session.user_id(), &query),
        )
        .await?;
        Ok(dedupe_and_cap(result.items, limit))
    }

    /// User views narrowed to eligible libraries. Exclusions are read fresh
    /// from the user's configuration on every call.
    async fn fetch_libraries(&self, token: &CancellationToken) -> HomeResult<Vec<LibraryView>> {
        let client = self.session.client();
        let (views, user) = tokio::try_join!(
            guarded(token, client.user_views(self.session.user_id())),
            guarded(token, client.current_user()),
        )?;

        let libraries = eligible_libraries(views.items, user.excluded_libraries());
        debug!(target: "home::refresh", eligible = libraries.len(), "resolved home libraries");
        Ok(libraries)
    }
}

/// Keep the first occurrence of each item, in server order, up to `limit`.
fn dedupe_and_cap(items: Vec<BaseItem>, limit: u32) -> Vec<BaseItem> {
    let received = items.len();
    let mut seen = HashSet::new();
    let mut items: Vec<BaseItem> = items
        .into_iter()
        .filter(|item| seen.insert(item.id.clone()))
        .collect();
    items.truncate(limit as usize);
    if items.len() < received {
        debug!(target: "home::refresh", received, kept = items.len(), "trimmed resume items");
    }
    items
}
