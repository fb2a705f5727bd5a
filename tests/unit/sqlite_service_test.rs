//! Unit tests for `SqliteDataService`, the local remote-data-service.

use std::time::Duration;

use bookmark_sync::services::remote_service::RemoteDataService;
use bookmark_sync::services::sqlite_service::SqliteDataService;
use bookmark_sync::types::bookmark::Bookmark;
use bookmark_sync::types::errors::{BookmarkError, DeleteError};
use bookmark_sync::types::event::{ChangeEvent, SubscriptionMessage, SubscriptionStatus};
use chrono::{TimeZone, Utc};
use tokio::time::timeout;

fn service() -> SqliteDataService {
    SqliteDataService::open_in_memory().expect("Failed to open in-memory store")
}

async fn next_message(sub: &mut tokio::sync::mpsc::Receiver<SubscriptionMessage>) -> SubscriptionMessage {
    timeout(Duration::from_secs(1), sub.recv())
        .await
        .expect("subscription message should arrive")
        .expect("subscription should stay open")
}

#[tokio::test]
async fn test_insert_assigns_id_and_timestamp() {
    let svc = service();
    let a = svc.insert("u1", "Rust", "https://rust-lang.org").await.unwrap();
    let b = svc.insert("u1", "Docs", "https://docs.rs").await.unwrap();

    assert!(!a.id.is_empty());
    assert_ne!(a.id, b.id);
    assert_eq!(a.user_id, "u1");
    assert!(b.created_at > a.created_at, "later inserts must sort newer");
}

#[tokio::test]
async fn test_list_is_scoped_and_newest_first() {
    let svc = service();
    let first = svc.insert("u1", "First", "https://one.io").await.unwrap();
    svc.insert("u2", "Other", "https://other.io").await.unwrap();
    let second = svc.insert("u1", "Second", "https://two.io").await.unwrap();

    let listed = svc.list("u1").await.unwrap();
    let ids: Vec<&str> = listed.iter().map(|b| b.id.as_str()).collect();
    assert_eq!(ids, vec![second.id.as_str(), first.id.as_str()]);
    assert_eq!(listed[0], second, "listed rows must equal the inserted records");
}

#[tokio::test]
async fn test_delete_requires_matching_user() {
    let svc = service();
    let bm = svc.insert("u1", "Mine", "https://mine.io").await.unwrap();

    let err = svc.delete(&bm.id, "u2").await.unwrap_err();
    assert_eq!(err, DeleteError::NotFound(bm.id.clone()));
    assert_eq!(svc.list("u1").await.unwrap().len(), 1);

    svc.delete(&bm.id, "u1").await.unwrap();
    assert!(svc.list("u1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_subscription_reports_status_then_events() {
    let svc = service();
    let mut sub = svc.subscribe("u1").await;

    assert_eq!(next_message(&mut sub).await, SubscriptionMessage::Status(SubscriptionStatus::Connecting));
    assert_eq!(next_message(&mut sub).await, SubscriptionMessage::Status(SubscriptionStatus::Connected));

    let bm = svc.insert("u1", "Pushed", "https://push.io").await.unwrap();
    assert_eq!(
        next_message(&mut sub).await,
        SubscriptionMessage::Event(ChangeEvent::Insert { record: bm.clone() })
    );

    svc.delete(&bm.id, "u1").await.unwrap();
    assert_eq!(
        next_message(&mut sub).await,
        SubscriptionMessage::Event(ChangeEvent::Delete {
            id: bm.id.clone(),
            user_id: "u1".to_string()
        })
    );
}

#[tokio::test]
async fn test_subscription_forwards_other_users_events() {
    let svc = service();
    let mut sub = svc.subscribe("u1").await;
    next_message(&mut sub).await;
    next_message(&mut sub).await;

    let other = svc.insert("u2", "Theirs", "https://theirs.io").await.unwrap();
    match next_message(&mut sub).await {
        SubscriptionMessage::Event(event) => assert_eq!(event.user_id(), "u2"),
        other => panic!("expected event, got {:?}", other),
    }
    assert_eq!(other.user_id, "u2");
}

#[tokio::test]
async fn test_update_broadcasts_and_persists() {
    let svc = service();
    let bm = svc.insert("u1", "Old", "https://old.io").await.unwrap();
    let mut sub = svc.subscribe("u1").await;
    next_message(&mut sub).await;
    next_message(&mut sub).await;

    let updated = svc.update(&bm.id, "u1", None, Some("New")).unwrap();
    assert_eq!(updated.title, "New");
    assert_eq!(updated.url, "https://old.io");
    assert_eq!(updated.created_at, bm.created_at);

    assert_eq!(
        next_message(&mut sub).await,
        SubscriptionMessage::Event(ChangeEvent::Update { record: updated.clone() })
    );
    assert_eq!(svc.list("u1").await.unwrap()[0].title, "New");
}

#[tokio::test]
async fn test_update_unknown_bookmark_fails() {
    let svc = service();
    let err = svc.update("missing", "u1", Some("https://x.io"), None).unwrap_err();
    assert!(matches!(err, BookmarkError::NotFound(id) if id == "missing"));
}

#[tokio::test]
async fn test_restore_writes_without_broadcast() {
    let svc = service();
    let mut sub = svc.subscribe("u1").await;
    next_message(&mut sub).await;
    next_message(&mut sub).await;

    let imported = Bookmark {
        id: "imported".to_string(),
        user_id: "u1".to_string(),
        url: "https://imported.io".to_string(),
        title: "Imported".to_string(),
        created_at: Utc.timestamp_millis_opt(1_700_000_000_000).unwrap(),
    };
    svc.restore(&imported).unwrap();

    assert_eq!(svc.list("u1").await.unwrap(), vec![imported]);
    assert!(
        timeout(Duration::from_millis(50), sub.recv()).await.is_err(),
        "restore must not emit a change event"
    );
}

#[tokio::test]
async fn test_dropping_subscription_releases_feed() {
    let svc = service();
    let mut sub = svc.subscribe("u1").await;
    next_message(&mut sub).await;
    assert_eq!(svc.subscriber_count(), 1);

    drop(sub);
    for _ in 0..50 {
        if svc.subscriber_count() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(svc.subscriber_count(), 0);
}
