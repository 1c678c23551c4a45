use std::sync::Arc;

use adapters::{
    ChannelPositionSource, LatLng, LocalStorage, MemoryConnection, MemoryRealtimeHub, MemoryStorage,
    PositionFeed,
    RealtimeStore, RecordingCanvas, ScriptedConfirm, SensorErrorCode, UserId, UserUpdate,
};
use chrono::Utc;
use nethelp::auth::{ValidationError, LOGOUT_PROMPT};
use nethelp::services::map_view::{PEER_COLOR, SELF_COLOR};
use nethelp::services::TrackerState;
use nethelp::storage::{PersistedPosition, LAST_POSITION_KEY, SESSION_KEY};
use nethelp::ui::{Screen, OFFLINE_BANNER};
use nethelp::{Adapters, App, AppConfig, AppError, Flow, UiEvent};

struct Board {
    app: App,
    hub: MemoryRealtimeHub,
    conn: Arc<MemoryConnection>,
    feed: PositionFeed,
    canvas: RecordingCanvas,
    storage: Arc<MemoryStorage>,
    confirm: ScriptedConfirm,
}

fn board_with(source: ChannelPositionSource, storage: Arc<MemoryStorage>) -> Board {
    let hub = MemoryRealtimeHub::new();
    let conn = Arc::new(hub.connect());
    let canvas = RecordingCanvas::new();
    let confirm = ScriptedConfirm::always(true);
    let feed = source.feed();

    let app = App::new(
        AppConfig::default(),
        Adapters {
            store: conn.clone(),
            storage: storage.clone(),
            position_source: Box::new(source),
            canvas: Box::new(canvas.clone()),
            confirm: Box::new(confirm.clone()),
        },
    );

    Board {
        app,
        hub,
        conn,
        feed,
        canvas,
        storage,
        confirm,
    }
}

fn board() -> Board {
    board_with(ChannelPositionSource::new(), Arc::new(MemoryStorage::new()))
}

fn at(lat: f64, lng: f64) -> LatLng {
    LatLng::new(lat, lng).unwrap()
}

#[tokio::test]
async fn participants_see_each_other_come_and_go() {
    let mut b = board();
    let ana = b.app.login("Ana").await.unwrap();
    assert_eq!(b.app.ui().screen(), Screen::Map);
    assert_eq!(b.app.ui().current_user_name(), Some("Ana"));

    b.feed.push_fix(at(40.0, -3.0));
    b.app.pump().await;

    let record = b.hub.user(&ana).expect("own record published");
    assert_eq!(record.name, "Ana");
    assert_eq!(record.position(), at(40.0, -3.0));
    assert!(record.last_updated.is_some());

    let own = b.canvas.marker_labelled("Ana").unwrap();
    assert_eq!(own.style.fill_color, SELF_COLOR);
    assert_eq!(b.canvas.markers().len(), 1);
    assert_eq!(b.canvas.view(), Some((at(40.0, -3.0), 15)));
    assert_eq!(b.app.ui().roster.count(), 1);

    let luis_id = UserId::from("user_luis");
    let luis = b.hub.connect();
    luis.remove_on_disconnect(&luis_id).await.unwrap();
    luis.update_user(&luis_id, UserUpdate::new("Luis", at(10.0, 20.0)))
        .await
        .unwrap();
    b.app.pump().await;

    assert_eq!(b.canvas.markers().len(), 2);
    let peer = b.canvas.marker_labelled("Luis").unwrap();
    assert_eq!(peer.style.fill_color, PEER_COLOR);
    assert_eq!(b.app.ui().roster.count(), 2);
    let current: Vec<&str> = b
        .app
        .ui()
        .roster
        .members()
        .iter()
        .filter(|tag| tag.is_current_user)
        .map(|tag| tag.name.as_str())
        .collect();
    assert_eq!(current, ["Ana"]);

    luis.update_user(&luis_id, UserUpdate::new("Luis", at(11.0, 21.0)))
        .await
        .unwrap();
    b.app.pump().await;
    assert_eq!(b.app.map().marker_position(&luis_id), Some(at(11.0, 21.0)));
    assert_eq!(b.canvas.markers().len(), 2);

    luis.disconnect();
    b.app.pump().await;

    assert!(b.hub.user(&luis_id).is_none());
    assert_eq!(b.canvas.markers().len(), 1);
    assert_eq!(b.app.ui().roster.count(), 1);
}

#[tokio::test]
async fn short_names_are_rejected_without_side_effects() {
    let mut b = board();

    let err = b.app.login("  A  ").await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Validation(ValidationError::NameTooShort { .. })
    ));

    assert_eq!(b.app.ui().screen(), Screen::Login);
    assert!(b.app.session().is_none());
    assert!(!b.canvas.is_created());
    assert!(b.hub.users().is_empty());
    assert_eq!(b.storage.get_item(SESSION_KEY).unwrap(), None);
    assert_eq!(b.feed.active_watches(), 0);

    b.app.handle_ui(UiEvent::Login(String::new())).await;
    assert!(b.app.ui().notice().is_some());
    assert_eq!(b.app.ui().screen(), Screen::Login);
}

#[tokio::test]
async fn names_are_trimmed_and_session_persisted() {
    let mut b = board();
    let id = b.app.login("  Ana María ").await.unwrap();

    assert!(id.as_str().starts_with("user_"));
    assert_eq!(b.app.ui().current_user_name(), Some("Ana María"));

    let raw = b.storage.get_item(SESSION_KEY).unwrap().unwrap();
    let saved: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(saved["userId"], id.as_str());
    assert_eq!(saved["userName"], "Ana María");
}

#[tokio::test]
async fn every_login_gets_a_fresh_id() {
    let mut b = board();
    let first = b.app.login("Ana").await.unwrap();
    assert!(b.app.logout().await);

    let second = b.app.login("Ana").await.unwrap();
    assert_ne!(first, second);
}

#[tokio::test]
async fn offline_fixes_flush_only_the_latest_on_reconnect() {
    let mut b = board();
    let ana = b.app.login("Ana").await.unwrap();

    b.app.handle_ui(UiEvent::Offline).await;
    assert_eq!(b.app.ui().banner(), Some(OFFLINE_BANNER));

    for lat in [1.0, 2.0, 3.0] {
        b.feed.push_fix(at(lat, 0.0));
    }
    b.app.pump().await;

    assert!(b.hub.user(&ana).is_none());
    assert_eq!(b.app.tracker().pending().len(), 3);
    assert_eq!(b.app.map().marker_position(&ana), Some(at(3.0, 0.0)));

    b.app.handle_ui(UiEvent::Online).await;
    b.app.pump().await;

    assert_eq!(b.app.ui().banner(), None);
    assert!(b.app.tracker().pending().is_empty());
    assert_eq!(b.hub.user(&ana).unwrap().position(), at(3.0, 0.0));
}

#[tokio::test]
async fn reconnecting_keeps_a_single_subscription() {
    let mut b = board();
    b.app.login("Ana").await.unwrap();
    assert_eq!(b.hub.subscriber_count(), 1);

    for _ in 0..2 {
        b.app.handle_ui(UiEvent::Offline).await;
        b.app.handle_ui(UiEvent::Online).await;
    }
    b.app.pump().await;

    assert_eq!(b.hub.subscriber_count(), 1);
    assert!(b.app.sync().is_subscribed());
}

#[tokio::test]
async fn repeated_connectivity_signals_are_ignored() {
    let mut b = board();
    b.app.handle_ui(UiEvent::Online).await;
    assert!(b.app.is_online());
    assert_eq!(b.app.ui().banner(), None);

    b.app.handle_ui(UiEvent::Offline).await;
    b.app.handle_ui(UiEvent::Offline).await;
    assert!(!b.app.is_online());
    assert_eq!(b.app.ui().banner(), Some(OFFLINE_BANNER));
}

#[tokio::test]
async fn confirmed_logout_clears_everything() {
    let mut b = board();
    let ana = b.app.login("Ana").await.unwrap();
    b.feed.push_fix(at(40.0, -3.0));

    let luis_id = UserId::from("user_luis");
    let luis = b.hub.connect();
    luis.update_user(&luis_id, UserUpdate::new("Luis", at(10.0, 20.0)))
        .await
        .unwrap();
    b.app.pump().await;
    assert_eq!(b.canvas.markers().len(), 2);
    assert!(b.storage.get_item(LAST_POSITION_KEY).unwrap().is_some());

    assert!(b.app.logout().await);

    assert!(b.hub.user(&ana).is_none());
    assert!(b.hub.user(&luis_id).is_some());
    assert_eq!(b.hub.subscriber_count(), 0);
    assert!(b.canvas.markers().is_empty());
    assert_eq!(b.app.map().marker_count(), 0);
    assert_eq!(b.storage.get_item(SESSION_KEY).unwrap(), None);
    assert_eq!(b.storage.get_item(LAST_POSITION_KEY).unwrap(), None);
    assert_eq!(b.app.tracker().state(), TrackerState::Stopped);
    assert_eq!(b.app.tracker().last_known(), None);
    assert_eq!(b.feed.active_watches(), 0);
    assert!(b.app.session().is_none());
    assert_eq!(b.app.ui().screen(), Screen::Login);
    assert_eq!(b.app.ui().name_field(), "");
    assert_eq!(b.app.ui().roster.count(), 0);
}

#[tokio::test]
async fn declined_logout_keeps_the_session() {
    let mut b = board();
    b.confirm.push_answer(false);

    let ana = b.app.login("Ana").await.unwrap();
    b.feed.push_fix(at(40.0, -3.0));
    b.app.pump().await;

    assert!(!b.app.logout().await);

    assert_eq!(b.app.session().map(|s| s.user_id.clone()), Some(ana.clone()));
    assert!(b.hub.user(&ana).is_some());
    assert_eq!(b.app.ui().screen(), Screen::Map);
    assert_eq!(b.feed.active_watches(), 1);
}

#[tokio::test]
async fn logout_prompts_only_with_a_session() {
    let mut b = board();

    assert!(!b.app.logout().await);
    assert!(b.confirm.prompts().is_empty());

    b.app.login("Ana").await.unwrap();
    b.app.handle_ui(UiEvent::Logout).await;
    assert_eq!(b.confirm.prompts(), [LOGOUT_PROMPT]);
}

#[tokio::test]
async fn sensor_errors_show_a_notice_and_keep_watching() {
    let mut b = board();
    let ana = b.app.login("Ana").await.unwrap();

    b.feed.push_error(SensorErrorCode::Timeout);
    b.app.pump().await;

    assert_eq!(
        b.app.ui().notice(),
        Some("Timed out while getting your location.")
    );
    assert!(matches!(b.app.tracker().state(), TrackerState::Watching(_)));

    b.feed.push_fix(at(5.0, 5.0));
    b.app.pump().await;
    assert!(b.hub.user(&ana).is_some());
}

#[tokio::test]
async fn missing_geolocation_is_reported_but_login_succeeds() {
    let mut b = board_with(
        ChannelPositionSource::unsupported(),
        Arc::new(MemoryStorage::new()),
    );

    b.app.login("Ana").await.unwrap();

    assert_eq!(b.app.ui().screen(), Screen::Map);
    assert_eq!(
        b.app.ui().notice(),
        Some("Geolocation is not supported on this device.")
    );
    assert_eq!(b.app.tracker().state(), TrackerState::Stopped);
}

#[tokio::test]
async fn recent_cached_position_centers_the_map() {
    let storage = Arc::new(MemoryStorage::new());
    let cached = PersistedPosition::new(at(48.85, 2.35), Utc::now());
    storage
        .set_item(LAST_POSITION_KEY, &serde_json::to_string(&cached).unwrap())
        .unwrap();

    let mut b = board_with(ChannelPositionSource::new(), storage);
    b.app.login("Ana").await.unwrap();

    assert_eq!(b.canvas.options().unwrap().center, at(48.85, 2.35));
}

#[tokio::test]
async fn stale_cached_position_is_ignored() {
    let storage = Arc::new(MemoryStorage::new());
    let cached = PersistedPosition::new(at(48.85, 2.35), Utc::now() - chrono::Duration::hours(2));
    storage
        .set_item(LAST_POSITION_KEY, &serde_json::to_string(&cached).unwrap())
        .unwrap();

    let mut b = board_with(ChannelPositionSource::new(), storage);
    b.app.login("Ana").await.unwrap();

    let options = b.canvas.options().unwrap();
    assert_eq!(options.center, at(0.0, 0.0));
    assert_eq!(options.zoom, 15);
}

#[tokio::test]
async fn shutdown_removes_the_own_record() {
    let mut b = board();
    let ana = b.app.login("Ana").await.unwrap();
    b.feed.push_fix(at(1.0, 1.0));
    b.app.pump().await;
    assert!(b.hub.user(&ana).is_some());

    assert_eq!(b.app.handle_ui(UiEvent::Shutdown).await, Flow::Exit);
    assert!(b.hub.user(&ana).is_none());
}

#[tokio::test]
async fn events_are_ignored_while_logged_out() {
    let mut b = board();
    let luis = b.hub.connect();
    luis.update_user(&UserId::from("user_luis"), UserUpdate::new("Luis", at(1.0, 1.0)))
        .await
        .unwrap();
    b.app.pump().await;

    assert!(!b.canvas.is_created());
    assert_eq!(b.app.map().marker_count(), 0);
    assert_eq!(b.app.ui().roster.count(), 0);
}

#[tokio::test]
async fn reconnect_re_arms_disconnect_cleanup() {
    let mut b = board();
    let ana = b.app.login("Ana").await.unwrap();
    b.feed.push_fix(at(1.0, 1.0));
    b.app.pump().await;

    b.app.handle_ui(UiEvent::Offline).await;
    b.conn.disconnect();
    assert!(b.hub.user(&ana).is_none());

    b.feed.push_fix(at(2.0, 2.0));
    b.app.pump().await;
    b.app.handle_ui(UiEvent::Online).await;
    b.app.pump().await;
    assert_eq!(b.hub.user(&ana).unwrap().position(), at(2.0, 2.0));

    b.conn.disconnect();
    assert!(b.hub.user(&ana).is_none());
}

#[tokio::test]
async fn changes_queued_before_logout_do_not_reach_the_next_session() {
    let mut b = board();
    b.app.login("Ana").await.unwrap();

    let luis_id = UserId::from("user_luis");
    let luis = b.hub.connect();
    luis.update_user(&luis_id, UserUpdate::new("Luis", at(10.0, 20.0)))
        .await
        .unwrap();
    b.feed.push_fix(at(5.0, 5.0));

    assert!(b.app.logout().await);
    luis.remove_user(&luis_id).await.unwrap();

    let second = b.app.login("Ana").await.unwrap();
    b.app.pump().await;

    assert!(!b.app.map().has_marker(&luis_id));
    assert!(b.canvas.marker_labelled("Luis").is_none());
    assert_eq!(b.app.ui().roster.count(), 0);
    assert!(b.hub.user(&second).is_none());
}

#[tokio::test]
async fn unclassified_sensor_failures_get_the_generic_notice() {
    let mut b = board();
    b.app.login("Ana").await.unwrap();

    b.feed.push_error(SensorErrorCode::Unknown);
    b.app.pump().await;

    assert_eq!(b.app.ui().notice(), Some("Could not get your location."));
}
