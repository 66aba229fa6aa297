use std::collections::BTreeSet;

use jellyhome_model::BaseItem;
use serde::{Deserialize, Serialize};

use crate::error::ErrorCause;
use crate::feed::{FeaturingPolicy, SubFeedCoordinator};

/// Primary state the home screen renders from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RefreshState {
    #[default]
    Initial,
    Refreshing,
    Content,
    Error(ErrorCause),
}

impl RefreshState {
    pub fn is_refreshing(&self) -> bool {
        matches!(self, RefreshState::Refreshing)
    }

    pub fn error(&self) -> Option<&ErrorCause> {
        match self {
            RefreshState::Error(cause) => Some(cause),
            _ => None,
        }
    }
}

/// Low-visibility activity shown as a progress hint, not a state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BackgroundState {
    Refresh,
}

/// Events received while the home screen was not visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HomeNotification {
    ItemMetadataDidChange,
}

/// What a failed background refresh does to the displayed state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundErrorPolicy {
    /// Record the failure in [`HomeSnapshot::last_background_error`] and keep
    /// showing the current content.
    #[default]
    Report,
    /// Replace the content with [`RefreshState::Error`].
    Surface,
}

/// Everything the presentation layer can ask the aggregator to do.
#[derive(Debug, Clone, PartialEq)]
pub enum HomeAction {
    Refresh,
    BackgroundRefresh,
    SetIsPlayed { played: bool, item: BaseItem },
    Error(ErrorCause),
}

/// Tuning for a [`HomeAggregator`](super::HomeAggregator).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomeSettings {
    /// Upper bound on continue-watching items.
    pub resume_limit: u32,
    /// Items per rail.
    pub page_size: u32,
    pub background_errors: BackgroundErrorPolicy,
    pub featuring: FeaturingPolicy,
}

impl Default for HomeSettings {
    fn default() -> Self {
        Self {
            resume_limit: 20,
            page_size: 50,
            background_errors: BackgroundErrorPolicy::default(),
            featuring: FeaturingPolicy::default(),
        }
    }
}

/// Immutable view of the home screen published to observers.
#[derive(Debug, Clone, Default)]
pub struct HomeSnapshot {
    pub state: RefreshState,
    pub background: BTreeSet<BackgroundState>,
    pub resume_items: Vec<BaseItem>,
    pub latest: Vec<SubFeedCoordinator>,
    pub trending: Vec<SubFeedCoordinator>,
    pub featuring: Vec<SubFeedCoordinator>,
    pub next_up: Option<SubFeedCoordinator>,
    pub recently_added: Option<SubFeedCoordinator>,
    pub notifications: BTreeSet<HomeNotification>,
    pub last_background_error: Option<ErrorCause>,
}

impl HomeSnapshot {
    pub fn is_background_refreshing(&self) -> bool {
        self.background.contains(&BackgroundState::Refresh)
    }

    /// True once content has been published and every rail came back empty.
    pub fn is_empty(&self) -> bool {
        let rails_empty = self
            .latest
            .iter()
            .chain(&self.trending)
            .chain(&self.featuring)
            .chain(&self.next_up)
            .chain(&self.recently_added)
            .all(|feed| feed.items().is_empty());
        self.state == RefreshState::Content && self.resume_items.is_empty() && rails_empty
    }
}
