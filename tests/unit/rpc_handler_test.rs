//! Unit tests for the RPC handler: every JSON-RPC method dispatched by `handle_method`.
//!
//! These tests go through the same code path as the `bookmark-sync-rpc`
//! binary, over an in-memory SQLite store.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::Mutex;

use bookmark_sync::app::App;
use bookmark_sync::rpc_handler::handle_method;
use bookmark_sync::services::sqlite_service::SqliteDataService;
use bookmark_sync::types::settings::SyncSettings;

fn setup() -> Mutex<App> {
    let service = Arc::new(SqliteDataService::open_in_memory().expect("Failed to open store"));
    Mutex::new(App::with_service(SyncSettings::default(), service))
}

async fn started(user_id: &str) -> Mutex<App> {
    let app = setup();
    handle_method(&app, "session.start", &json!({"user_id": user_id}))
        .await
        .expect("session.start failed");
    app
}

// ─── Ping ───

#[tokio::test]
async fn test_ping() {
    let app = setup();
    let res = handle_method(&app, "ping", &json!({})).await.unwrap();
    assert_eq!(res, json!({"pong": true}));
}

// ─── Unknown method ───

#[tokio::test]
async fn test_unknown_method_returns_error() {
    let app = setup();
    let err = handle_method(&app, "nonexistent.method", &json!({})).await.unwrap_err();
    assert!(err.contains("unknown method"));
}

// ─── Session ───

#[tokio::test]
async fn test_list_without_session_is_inactive() {
    let app = setup();
    let res = handle_method(&app, "bookmark.list", &json!({})).await.unwrap();
    assert_eq!(res, json!({"view": "inactive"}));
}

#[tokio::test]
async fn test_session_start_returns_empty_view() {
    let app = setup();
    let res = handle_method(&app, "session.start", &json!({"user_id": "u1"}))
        .await
        .unwrap();
    assert_eq!(res["user_id"], "u1");
    assert_eq!(res["list"], json!({"view": "empty"}));
}

#[tokio::test]
async fn test_session_start_requires_user_id() {
    let app = setup();
    assert!(handle_method(&app, "session.start", &json!({})).await.is_err());
    assert!(handle_method(&app, "session.start", &json!({"user_id": "  "}))
        .await
        .is_err());
}

#[tokio::test]
async fn test_session_status_and_stop() {
    let app = started("u1").await;

    let status = handle_method(&app, "session.status", &json!({})).await.unwrap();
    assert_eq!(status["active"], true);
    assert_eq!(status["user_id"], "u1");
    assert_eq!(status["visible"], true);
    assert_eq!(status["load_state"], json!({"state": "ready"}));

    handle_method(&app, "session.stop", &json!({})).await.unwrap();
    let status = handle_method(&app, "session.status", &json!({})).await.unwrap();
    assert_eq!(status["active"], false);
    assert_eq!(status["subscription"], "closed");
}

#[tokio::test]
async fn test_session_visibility() {
    let app = started("u1").await;
    let res = handle_method(&app, "session.visibility", &json!({"visible": false}))
        .await
        .unwrap();
    assert_eq!(res, json!({"visible": false}));
    assert!(handle_method(&app, "session.visibility", &json!({})).await.is_err());
}

// ─── Bookmarks ───

#[tokio::test]
async fn test_bookmark_add_and_list() {
    let app = started("u1").await;

    let res = handle_method(&app, "bookmark.add", &json!({
        "url": "example.com",
        "title": "Example"
    }))
    .await
    .unwrap();
    assert!(res.get("id").is_some());
    assert_eq!(res["url"], "https://example.com");

    let list = handle_method(&app, "bookmark.list", &json!({})).await.unwrap();
    assert_eq!(list["view"], "ready");
    assert_eq!(list["headline"], "Your Bookmarks (1)");
    let items = list["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["title"], "Example");
    assert!(items[0]["date"].is_string());
}

#[tokio::test]
async fn test_bookmark_add_success_resets_form() {
    let app = started("u1").await;
    handle_method(&app, "bookmark.add", &json!({"url": "a.io", "title": "A"}))
        .await
        .unwrap();

    let form = handle_method(&app, "form.get", &json!({})).await.unwrap();
    assert_eq!(form["title"], "");
    assert_eq!(form["success"], true);
    assert_eq!(form["submitting"], false);

    let form = handle_method(&app, "form.dismiss_success", &json!({})).await.unwrap();
    assert_eq!(form["success"], false);
}

#[tokio::test(start_paused = true)]
async fn test_form_success_clears_itself_after_three_seconds() {
    let app = started("u1").await;
    handle_method(&app, "bookmark.add", &json!({"url": "a.io", "title": "A"}))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(2_900)).await;
    let form = handle_method(&app, "form.get", &json!({})).await.unwrap();
    assert_eq!(form["success"], true);

    tokio::time::sleep(Duration::from_millis(100)).await;
    let form = handle_method(&app, "form.get", &json!({})).await.unwrap();
    assert_eq!(form["success"], false);
}

#[tokio::test]
async fn test_bookmark_add_failure_keeps_form_input() {
    let app = started("u1").await;
    let err = handle_method(&app, "bookmark.add", &json!({"url": "a.io", "title": "  "}))
        .await
        .unwrap_err();
    assert!(err.contains("title is required"));

    let form = handle_method(&app, "form.get", &json!({})).await.unwrap();
    assert_eq!(form["url"], "a.io");
    assert_eq!(form["error"], err);
}

#[tokio::test]
async fn test_bookmark_add_without_session_fails() {
    let app = setup();
    let err = handle_method(&app, "bookmark.add", &json!({"url": "a.io", "title": "A"}))
        .await
        .unwrap_err();
    assert_eq!(err, "No active bookmark session");
}

#[tokio::test]
async fn test_bookmark_add_missing_params() {
    let app = started("u1").await;
    assert!(handle_method(&app, "bookmark.add", &json!({"title": "A"})).await.is_err());
    assert!(handle_method(&app, "bookmark.add", &json!({"url": "a.io"})).await.is_err());
}

#[tokio::test]
async fn test_bookmark_delete() {
    let app = started("u1").await;
    let added = handle_method(&app, "bookmark.add", &json!({"url": "a.io", "title": "A"}))
        .await
        .unwrap();
    let id = added["id"].as_str().unwrap();

    let res = handle_method(&app, "bookmark.delete", &json!({"id": id})).await.unwrap();
    assert_eq!(res, json!({"ok": true}));

    let list = handle_method(&app, "bookmark.list", &json!({})).await.unwrap();
    assert_eq!(list, json!({"view": "empty"}));
}

#[tokio::test]
async fn test_bookmark_refresh() {
    let app = started("u1").await;
    let list = handle_method(&app, "bookmark.refresh", &json!({})).await.unwrap();
    assert_eq!(list["view"], "empty");

    handle_method(&app, "session.stop", &json!({})).await.unwrap();
    assert!(handle_method(&app, "bookmark.refresh", &json!({})).await.is_err());
}
