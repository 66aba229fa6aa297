//! Home-screen refresh orchestration.
//!
//! [`HomeAggregator`] owns the published [`HomeSnapshot`] and the handles of
//! in-flight refresh work. Observers subscribe to snapshots and dispatch
//! [`HomeAction`]s; they never mutate state directly.

mod aggregator;
mod state;

pub use aggregator::HomeAggregator;
pub use state::{
    BackgroundErrorPolicy, BackgroundState, HomeAction, HomeNotification, HomeSettings,
    HomeSnapshot, RefreshState,
};
