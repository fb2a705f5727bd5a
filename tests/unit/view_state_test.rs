//! Unit tests for the UI-facing state models.

use bookmark_sync::types::bookmark::Bookmark;
use bookmark_sync::types::view::{format_date, AddFormState, ListView, LoadState, SUCCESS_DISPLAY};
use chrono::{TimeZone, Utc};
use rstest::rstest;
use serde_json::json;

fn bookmark(id: &str) -> Bookmark {
    Bookmark {
        id: id.to_string(),
        user_id: "u1".to_string(),
        url: "https://example.com".to_string(),
        title: "Example".to_string(),
        created_at: Utc.with_ymd_and_hms(2026, 10, 19, 8, 30, 0).unwrap(),
    }
}

// === ListView ===

#[test]
fn test_list_view_per_load_state() {
    let items = vec![bookmark("a"), bookmark("b")];

    assert_eq!(ListView::new(&LoadState::Loading, &items), ListView::Loading);
    assert_eq!(
        ListView::new(&LoadState::Failed("boom".to_string()), &items),
        ListView::Error { message: "boom".to_string() }
    );
    assert_eq!(ListView::new(&LoadState::Ready, &[]), ListView::Empty);
    assert_eq!(
        ListView::new(&LoadState::Ready, &items),
        ListView::Ready { count: 2, items: items.clone() }
    );
}

#[test]
fn test_headline_only_for_ready_list() {
    let ready = ListView::new(&LoadState::Ready, &[bookmark("a")]);
    assert_eq!(ready.headline().as_deref(), Some("Your Bookmarks (1)"));
    assert_eq!(ListView::Empty.headline(), None);
    assert_eq!(ListView::Loading.headline(), None);
}

#[test]
fn test_list_view_serializes_with_view_tag() {
    assert_eq!(serde_json::to_value(ListView::Empty).unwrap(), json!({"view": "empty"}));
    assert_eq!(
        serde_json::to_value(ListView::Error { message: "x".to_string() }).unwrap(),
        json!({"view": "error", "message": "x"})
    );
}

#[test]
fn test_load_state_serialization() {
    assert_eq!(serde_json::to_value(LoadState::Ready).unwrap(), json!({"state": "ready"}));
    assert_eq!(
        serde_json::to_value(LoadState::Failed("down".to_string())).unwrap(),
        json!({"state": "failed", "message": "down"})
    );
}

// === AddFormState ===

#[test]
fn test_form_success_clears_inputs() {
    let mut form = AddFormState::new();
    form.title = "Rust".to_string();
    form.url = "rust-lang.org".to_string();

    form.begin_submit();
    assert!(form.submitting);

    form.finish_success();
    assert!(!form.submitting);
    assert!(form.success);
    assert!(form.title.is_empty());
    assert!(form.url.is_empty());

    form.dismiss_success();
    assert!(!form.success);
}

#[test]
fn test_form_failure_keeps_inputs_for_retry() {
    let mut form = AddFormState::new();
    form.title = "Rust".to_string();
    form.url = "rust-lang.org".to_string();

    form.begin_submit();
    form.finish_failure("Failed to add bookmark: offline");

    assert!(!form.submitting);
    assert!(!form.success);
    assert_eq!(form.title, "Rust");
    assert_eq!(form.url, "rust-lang.org");
    assert_eq!(form.error.as_deref(), Some("Failed to add bookmark: offline"));
}

#[test]
fn test_resubmit_clears_previous_error() {
    let mut form = AddFormState::new();
    form.finish_failure("boom");
    form.begin_submit();
    assert_eq!(form.error, None);
}

#[tokio::test(start_paused = true)]
async fn test_form_success_expires_after_display_period() {
    let mut form = AddFormState::new();
    form.begin_submit();
    form.finish_success();

    tokio::time::sleep(SUCCESS_DISPLAY - std::time::Duration::from_millis(1)).await;
    form.expire_success();
    assert!(form.success);

    tokio::time::sleep(std::time::Duration::from_millis(1)).await;
    form.expire_success();
    assert!(!form.success);
}

#[test]
fn test_expire_without_success_is_noop() {
    let mut form = AddFormState::new();
    form.finish_failure("boom");
    form.expire_success();
    assert!(!form.success);
    assert_eq!(form.error.as_deref(), Some("boom"));
}

// === format_date ===

#[rstest]
#[case(2026, 1, 5, "Jan 5, 2026")]
#[case(2025, 12, 31, "Dec 31, 2025")]
#[case(2024, 2, 29, "Feb 29, 2024")]
fn test_format_date(#[case] y: i32, #[case] m: u32, #[case] d: u32, #[case] expected: &str) {
    let date = Utc.with_ymd_and_hms(y, m, d, 23, 59, 59).unwrap();
    assert_eq!(format_date(&date), expected);
}
