use nethelp_adapters::{
    AdapterError, LatLng, MemoryRealtimeHub, RealtimeStore, RemoteChange, UserId, UserUpdate,
};
use tokio::sync::mpsc;

fn at(lat: f64, lng: f64) -> LatLng {
    LatLng::new(lat, lng).unwrap()
}

#[tokio::test]
async fn subscribe_replays_existing_users_as_added() {
    let hub = MemoryRealtimeHub::new();
    let writer = hub.connect();
    writer
        .update_user(&UserId::from("user_a"), UserUpdate::new("Ana", at(1.0, 2.0)))
        .await
        .unwrap();

    let reader = hub.connect();
    let (tx, mut rx) = mpsc::unbounded_channel();
    reader.subscribe_users(tx).await.unwrap();

    match rx.try_recv().unwrap() {
        RemoteChange::Added { id, record } => {
            assert_eq!(id.as_str(), "user_a");
            assert_eq!(record.name, "Ana");
            assert!(record.last_updated.is_some());
        }
        other => panic!("unexpected change {other:?}"),
    }
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn updates_report_added_then_changed() {
    let hub = MemoryRealtimeHub::new();
    let conn = hub.connect();
    let (tx, mut rx) = mpsc::unbounded_channel();
    conn.subscribe_users(tx).await.unwrap();

    let id = UserId::from("user_l");
    conn.update_user(&id, UserUpdate::new("Luis", at(10.0, 20.0)))
        .await
        .unwrap();
    conn.update_user(&id, UserUpdate::new("Luis", at(11.0, 21.0)))
        .await
        .unwrap();
    conn.remove_user(&id).await.unwrap();

    assert!(matches!(rx.try_recv(), Ok(RemoteChange::Added { .. })));
    match rx.try_recv().unwrap() {
        RemoteChange::Changed { record, .. } => assert_eq!(record.position(), at(11.0, 21.0)),
        other => panic!("unexpected change {other:?}"),
    }
    assert_eq!(rx.try_recv().unwrap(), RemoteChange::Removed { id });
}

#[tokio::test]
async fn disconnect_runs_registered_cleanup_for_other_subscribers() {
    let hub = MemoryRealtimeHub::new();
    let leaving = hub.connect();
    let staying = hub.connect();
    let id = UserId::from("user_gone");

    leaving
        .update_user(&id, UserUpdate::new("Gone", at(0.5, 0.5)))
        .await
        .unwrap();
    leaving.remove_on_disconnect(&id).await.unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel();
    staying.subscribe_users(tx).await.unwrap();
    let _replayed = rx.try_recv().unwrap();

    leaving.disconnect();

    assert_eq!(rx.try_recv().unwrap(), RemoteChange::Removed { id: id.clone() });
    assert!(hub.user(&id).is_none());
}

#[tokio::test]
async fn unsubscribe_all_only_drops_own_subscriptions() {
    let hub = MemoryRealtimeHub::new();
    let first = hub.connect();
    let second = hub.connect();
    let (tx, _rx) = mpsc::unbounded_channel();
    first.subscribe_users(tx.clone()).await.unwrap();
    second.subscribe_users(tx).await.unwrap();

    first.unsubscribe_all().await.unwrap();

    assert_eq!(hub.subscriber_count(), 1);
}

#[tokio::test]
async fn unreachable_backend_fails_writes() {
    let hub = MemoryRealtimeHub::new();
    let conn = hub.connect();
    hub.set_reachable(false);

    let result = conn
        .update_user(&UserId::from("user_x"), UserUpdate::new("X", at(0.0, 0.0)))
        .await;
    assert!(matches!(result, Err(AdapterError::Transport(_))));
    assert!(matches!(conn.fetch_users().await, Err(AdapterError::Transport(_))));

    hub.set_reachable(true);
    assert!(conn.fetch_users().await.unwrap().is_empty());
}
