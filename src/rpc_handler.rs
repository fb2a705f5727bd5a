//! RPC method handler for the bookmark-sync JSON-RPC protocol.
//!
//! Extracted from `rpc_server.rs` so it can be unit-tested independently.
//! `handle_method` dispatches each call to the sync session held by `App`.

use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::app::App;
use crate::types::view::{format_date, ListView};

/// Renders the list area, adding a display date to each row.
pub fn render_list(view: &ListView) -> Value {
    match view {
        ListView::Ready { count, items } => {
            let rows: Vec<Value> = items
                .iter()
                .map(|b| {
                    json!({
                        "id": b.id,
                        "url": b.url,
                        "title": b.title,
                        "created_at": b.created_at,
                        "date": format_date(&b.created_at),
                    })
                })
                .collect();
            json!({"view": "ready", "count": count, "headline": view.headline(), "items": rows})
        }
        other => json!(other),
    }
}

fn current_view(a: &App) -> Value {
    match a.session.list_view() {
        Some(view) => render_list(&view),
        None => json!({"view": "inactive"}),
    }
}

/// Dispatch a JSON-RPC method call.
///
/// Returns `Ok(Value)` on success or `Err(String)` with an error message.
pub async fn handle_method(app: &Mutex<App>, method: &str, params: &Value) -> Result<Value, String> {
    match method {
        // ─── Session ───
        "session.start" => {
            let user_id = params.get("user_id").and_then(|v| v.as_str()).ok_or("missing user_id")?;
            if user_id.trim().is_empty() {
                return Err("user_id must not be empty".to_string());
            }
            let mut a = app.lock().await;
            a.form = Default::default();
            // A failed first load is part of the returned view, not an RPC error.
            let _ = a.session.start(user_id).await;
            Ok(json!({"user_id": user_id, "list": current_view(&a)}))
        }
        "session.stop" => {
            let mut a = app.lock().await;
            a.session.stop();
            Ok(json!({"ok": true}))
        }
        "session.visibility" => {
            let visible = params.get("visible").and_then(|v| v.as_bool()).ok_or("missing visible")?;
            let a = app.lock().await;
            a.session.set_visible(visible).await;
            Ok(json!({"visible": a.session.is_visible()}))
        }
        "session.status" => {
            let a = app.lock().await;
            Ok(json!({
                "active": a.session.is_active(),
                "user_id": a.session.user_id(),
                "visible": a.session.is_visible(),
                "subscription": a.session.subscription_status(),
                "load_state": a.session.load_state(),
            }))
        }

        // ─── Bookmarks ───
        "bookmark.list" => {
            let a = app.lock().await;
            Ok(current_view(&a))
        }
        "bookmark.refresh" => {
            let a = app.lock().await;
            a.session.refresh().await.map_err(|e| e.to_string())?;
            Ok(current_view(&a))
        }
        "bookmark.add" => {
            let title = params.get("title").and_then(|v| v.as_str()).ok_or("missing title")?;
            let url = params.get("url").and_then(|v| v.as_str()).ok_or("missing url")?;
            let mut a = app.lock().await;
            a.form.title = title.to_string();
            a.form.url = url.to_string();
            a.form.begin_submit();
            match a.session.add_bookmark(title, url).await {
                Ok(bookmark) => {
                    a.form.finish_success();
                    Ok(json!(bookmark))
                }
                Err(e) => {
                    let message = e.to_string();
                    a.form.finish_failure(message.clone());
                    Err(message)
                }
            }
        }
        "bookmark.delete" => {
            let id = params.get("id").and_then(|v| v.as_str()).ok_or("missing id")?;
            let a = app.lock().await;
            a.session.delete_bookmark(id).await.map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }

        // ─── Add form ───
        "form.get" => {
            let mut a = app.lock().await;
            a.form.expire_success();
            Ok(json!(a.form))
        }
        "form.dismiss_success" => {
            let mut a = app.lock().await;
            a.form.dismiss_success();
            Ok(json!(a.form))
        }

        "ping" => Ok(json!({"pong": true})),

        _ => Err(format!("unknown method: {}", method)),
    }
}
