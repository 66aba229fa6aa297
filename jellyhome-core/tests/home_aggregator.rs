//! Home refresh state machine tests
//!
//! These exercise supersession, background deduplication, played-state
//! reconciliation and error handling against a scripted server.

mod support;

use jellyhome_core::model::CollectionType;
use jellyhome_core::{
    BackgroundErrorPolicy, BackgroundState, HomeAction, HomeAggregator, HomeSettings,
    RefreshState,
};
use support::{Endpoint, ScriptedClient, episode, ids, library, movie};

fn scripted_server() -> ScriptedClient {
    let server = ScriptedClient::new();
    server.set_views(vec![
        library("a", CollectionType::Movies),
        library("b", CollectionType::Music),
        library("c", CollectionType::TvShows),
    ]);
    server.set_resume(vec![movie("r1"), episode("r2")]);
    server.set_latest("a", vec![movie("a1"), movie("a2")]);
    server.set_latest("c", vec![episode("c1")]);
    server.set_next_up(vec![episode("n1")]);
    server.set_recently_added(vec![movie("ra1")]);
    server
}

fn aggregator(server: &ScriptedClient) -> HomeAggregator {
    HomeAggregator::new(server.session(), HomeSettings::default())
}

#[tokio::test]
async fn refresh_publishes_every_rail() {
    let server = scripted_server();
    let home = aggregator(&server);
    assert_eq!(home.state(), RefreshState::Initial);

    home.refresh().await.unwrap();

    let snapshot = home.snapshot();
    assert_eq!(snapshot.state, RefreshState::Content);
    assert_eq!(ids(&snapshot.resume_items), ["r1", "r2"]);

    let rail_libraries: Vec<&str> = snapshot
        .latest
        .iter()
        .filter_map(|feed| feed.library().map(|l| l.id.as_str()))
        .collect();
    assert_eq!(rail_libraries, ["a", "c"]);
    assert_eq!(ids(snapshot.latest[0].items()), ["a1", "a2"]);
    assert_eq!(snapshot.trending.len(), 2);
    assert_eq!(snapshot.featuring.len(), 2);

    let next_up = snapshot.next_up.as_ref().unwrap();
    assert_eq!(ids(next_up.items()), ["n1"]);
    let recently_added = snapshot.recently_added.as_ref().unwrap();
    assert_eq!(ids(recently_added.items()), ["ra1"]);

    assert_eq!(server.calls(Endpoint::Views), 1);
    assert_eq!(server.calls(Endpoint::CurrentUser), 1);
    assert_eq!(server.calls(Endpoint::Latest), 6);
    assert!(!server.latest_parents().iter().any(|parent| parent == "b"));
}

#[tokio::test]
async fn excluded_libraries_are_read_on_every_refresh() {
    let server = scripted_server();
    server.set_excluded(&["a"]);
    let home = aggregator(&server);

    home.refresh().await.unwrap();
    let snapshot = home.snapshot();
    assert_eq!(snapshot.latest.len(), 1);
    assert_eq!(snapshot.latest[0].library().unwrap().id.as_str(), "c");

    server.set_excluded(&[]);
    home.refresh().await.unwrap();
    assert_eq!(home.snapshot().latest.len(), 2);
}

#[tokio::test]
async fn newest_refresh_wins() {
    let server = scripted_server();
    let home = aggregator(&server);

    server.hold(Endpoint::Resume);
    let first = home.refresh();
    server.wait_for_calls(Endpoint::Resume, 1).await;

    server.set_resume(vec![movie("fresh")]);
    let second = home.refresh();
    server.wait_for_calls(Endpoint::Resume, 2).await;

    // The superseded task exits without waiting for its response.
    first.await.unwrap();
    assert_eq!(home.state(), RefreshState::Refreshing);
    assert!(home.snapshot().resume_items.is_empty());

    server.release(Endpoint::Resume);
    second.await.unwrap();

    let snapshot = home.snapshot();
    assert_eq!(snapshot.state, RefreshState::Content);
    assert_eq!(ids(&snapshot.resume_items), ["fresh"]);
}

#[tokio::test]
async fn cancelled_refresh_publishes_nothing() {
    let server = scripted_server();
    let home = aggregator(&server);
    home.refresh().await.unwrap();
    let before = home.snapshot();

    server.set_resume(vec![movie("late")]);
    server.hold(Endpoint::Resume);
    let handle = home.refresh();
    server.wait_for_calls(Endpoint::Resume, 2).await;
    assert_eq!(home.state(), RefreshState::Refreshing);

    home.cancel_all();
    assert_eq!(home.state(), RefreshState::Content);
    server.release(Endpoint::Resume);
    handle.await.unwrap();

    let after = home.snapshot();
    assert_eq!(after.state, before.state);
    assert_eq!(ids(&after.resume_items), ids(&before.resume_items));
    assert_eq!(after.latest.len(), before.latest.len());
}

#[tokio::test]
async fn cancel_restores_state_from_before_superseded_refreshes() {
    let server = scripted_server();
    let home = aggregator(&server);

    server.hold(Endpoint::Resume);
    let first = home.refresh();
    let second = home.refresh();
    server.wait_for_calls(Endpoint::Resume, 1).await;

    home.cancel_all();
    assert_eq!(home.state(), RefreshState::Initial);

    server.release(Endpoint::Resume);
    first.await.unwrap();
    second.await.unwrap();
    assert_eq!(home.state(), RefreshState::Initial);
    assert!(home.snapshot().resume_items.is_empty());
}

#[tokio::test]
async fn background_refresh_is_deduplicated() {
    let server = scripted_server();
    let home = aggregator(&server);
    home.refresh().await.unwrap();

    server.hold(Endpoint::Resume);
    let handle = home.background_refresh().expect("first background refresh starts");
    assert!(home.background_refresh().is_none());
    assert!(home.send(HomeAction::BackgroundRefresh).is_none());

    let snapshot = home.snapshot();
    assert_eq!(snapshot.background.len(), 1);
    assert!(snapshot.background.contains(&BackgroundState::Refresh));
    assert_eq!(snapshot.state, RefreshState::Content);

    server.release(Endpoint::Resume);
    handle.await.unwrap();

    assert!(!home.snapshot().is_background_refreshing());
    assert_eq!(server.calls(Endpoint::Resume), 2);
    assert_eq!(home.state(), RefreshState::Content);
}

#[tokio::test]
async fn background_refresh_does_not_touch_library_rails() {
    let server = scripted_server();
    let home = aggregator(&server);
    home.refresh().await.unwrap();
    let latest_calls = server.calls(Endpoint::Latest);

    server.set_next_up(vec![episode("n2"), episode("n3")]);
    home.background_refresh().unwrap().await.unwrap();

    let snapshot = home.snapshot();
    assert_eq!(server.calls(Endpoint::Latest), latest_calls);
    assert_eq!(server.calls(Endpoint::Views), 1);
    assert_eq!(ids(snapshot.next_up.as_ref().unwrap().items()), ["n2", "n3"]);
}

#[tokio::test]
async fn refresh_cancels_background_and_clears_marker() {
    let server = scripted_server();
    let home = aggregator(&server);
    home.refresh().await.unwrap();

    server.hold(Endpoint::NextUp);
    let background = home.background_refresh().unwrap();
    server.wait_for_calls(Endpoint::NextUp, 2).await;
    assert!(home.snapshot().is_background_refreshing());

    let foreground = home.refresh();
    let snapshot = home.snapshot();
    assert!(!snapshot.is_background_refreshing());
    assert_eq!(snapshot.state, RefreshState::Refreshing);

    background.await.unwrap();
    server.release(Endpoint::NextUp);
    foreground.await.unwrap();

    let snapshot = home.snapshot();
    assert_eq!(snapshot.state, RefreshState::Content);
    assert!(snapshot.background.is_empty());
    assert!(snapshot.last_background_error.is_none());
}

#[tokio::test]
async fn background_refresh_waits_for_foreground() {
    let server = scripted_server();
    let home = aggregator(&server);

    server.hold(Endpoint::Resume);
    let foreground = home.refresh();
    assert!(home.background_refresh().is_none());
    assert!(home.snapshot().background.is_empty());

    server.release(Endpoint::Resume);
    foreground.await.unwrap();
    assert!(home.background_refresh().is_some());
}

#[tokio::test]
async fn resume_items_are_deduplicated_and_capped() {
    let server = scripted_server();
    let mut resume: Vec<_> = (0..30).map(|i| movie(&format!("m{i}"))).collect();
    resume.insert(1, movie("m0"));
    server.set_resume(resume);
    let home = aggregator(&server);

    home.refresh().await.unwrap();

    let snapshot = home.snapshot();
    assert_eq!(snapshot.resume_items.len(), 20);
    assert_eq!(ids(&snapshot.resume_items[..3]), ["m0", "m1", "m2"]);

    home.background_refresh().unwrap().await.unwrap();
    assert_eq!(home.snapshot().resume_items.len(), 20);
}

#[tokio::test]
async fn set_is_played_is_visible_after_reconciliation() {
    let server = scripted_server();
    let home = aggregator(&server);
    home.refresh().await.unwrap();

    let item = home.snapshot().resume_items[1].clone();
    assert!(!item.is_played());

    home.set_is_played(true, &item).await.unwrap();

    let snapshot = home.snapshot();
    let updated = snapshot
        .resume_items
        .iter()
        .find(|candidate| candidate.id == item.id)
        .unwrap();
    assert!(updated.is_played());
    assert_eq!(server.calls(Endpoint::MarkPlayed), 1);
    assert!(!snapshot.is_background_refreshing());

    home.send(HomeAction::SetIsPlayed {
        played: false,
        item: updated.clone(),
    })
    .unwrap()
    .await
    .unwrap();
    assert_eq!(server.calls(Endpoint::MarkUnplayed), 1);
    assert!(!home.snapshot().resume_items[1].is_played());
}

#[tokio::test]
async fn set_is_played_during_foreground_refresh_is_reconciled() {
    let server = scripted_server();
    let home = aggregator(&server);

    // Resume items are fetched before the rails, so this refresh has
    // already read r1 as unplayed.
    server.hold(Endpoint::Latest);
    let foreground = home.refresh();
    server.wait_for_calls(Endpoint::Latest, 6).await;
    assert_eq!(server.calls(Endpoint::Resume), 1);

    let played = home.set_is_played(true, &movie("r1"));
    server.wait_for_calls(Endpoint::MarkPlayed, 1).await;
    assert!(home.snapshot().background.is_empty());

    server.release(Endpoint::Latest);
    foreground.await.unwrap();
    played.await.unwrap();

    let snapshot = home.snapshot();
    assert_eq!(snapshot.state, RefreshState::Content);
    assert_eq!(server.calls(Endpoint::Resume), 2);
    assert_eq!(ids(&snapshot.resume_items), ["r1", "r2"]);
    assert!(snapshot.resume_items[0].is_played());
    assert!(!snapshot.is_background_refreshing());
}

#[tokio::test]
async fn set_is_played_during_background_refresh_is_reconciled() {
    let server = scripted_server();
    let home = aggregator(&server);
    home.refresh().await.unwrap();

    server.hold(Endpoint::Resume);
    let background = home.background_refresh().unwrap();
    server.wait_for_calls(Endpoint::Resume, 2).await;

    let played = home.set_is_played(true, &movie("r1"));
    server.wait_for_calls(Endpoint::MarkPlayed, 1).await;

    server.release(Endpoint::Resume);
    background.await.unwrap();
    played.await.unwrap();

    let snapshot = home.snapshot();
    assert_eq!(server.calls(Endpoint::Resume), 3);
    assert!(snapshot.resume_items[0].is_played());
    assert!(!snapshot.is_background_refreshing());
}

#[tokio::test]
async fn failed_mark_played_surfaces_error() {
    let server = scripted_server();
    let home = aggregator(&server);
    home.refresh().await.unwrap();
    server.fail(Endpoint::MarkPlayed);

    let item = movie("r1");
    home.set_is_played(true, &item).await.unwrap();

    let state = home.state();
    assert!(state.error().unwrap().message().contains("MarkPlayed unavailable"));
    assert_eq!(server.calls(Endpoint::Resume), 1);
}

#[tokio::test]
async fn failed_refresh_can_be_retried() {
    let server = scripted_server();
    server.fail(Endpoint::Views);
    let home = aggregator(&server);

    home.refresh().await.unwrap();
    assert!(matches!(home.state(), RefreshState::Error(_)));

    server.recover(Endpoint::Views);
    home.send(HomeAction::Refresh).unwrap().await.unwrap();
    assert_eq!(home.state(), RefreshState::Content);
}

#[tokio::test]
async fn background_failure_is_reported_without_hiding_content() {
    let server = scripted_server();
    let home = aggregator(&server);
    home.refresh().await.unwrap();

    server.fail(Endpoint::NextUp);
    home.background_refresh().unwrap().await.unwrap();

    let snapshot = home.snapshot();
    assert_eq!(snapshot.state, RefreshState::Content);
    assert!(snapshot.background.is_empty());
    let cause = snapshot.last_background_error.unwrap();
    assert!(cause.message().contains("NextUp"));

    server.recover(Endpoint::NextUp);
    home.background_refresh().unwrap().await.unwrap();
    assert!(home.snapshot().last_background_error.is_none());
}

#[tokio::test]
async fn background_failure_can_surface_as_error_state() {
    let server = scripted_server();
    let settings = HomeSettings {
        background_errors: BackgroundErrorPolicy::Surface,
        ..HomeSettings::default()
    };
    let home = HomeAggregator::new(server.session(), settings);
    home.refresh().await.unwrap();

    server.fail(Endpoint::Resume);
    home.background_refresh().unwrap().await.unwrap();

    let snapshot = home.snapshot();
    assert!(matches!(snapshot.state, RefreshState::Error(_)));
    assert!(snapshot.background.is_empty());
}

#[tokio::test]
async fn observers_only_see_complete_snapshots() {
    let server = scripted_server();
    let home = aggregator(&server);
    let mut rx = home.subscribe();

    let handle = home.refresh();
    rx.changed().await.unwrap();
    assert_eq!(rx.borrow_and_update().state, RefreshState::Refreshing);

    handle.await.unwrap();
    rx.changed().await.unwrap();
    let snapshot = rx.borrow_and_update().clone();
    assert_eq!(snapshot.state, RefreshState::Content);
    assert_eq!(snapshot.latest.len(), 2);
    assert!(snapshot.next_up.is_some());
}
