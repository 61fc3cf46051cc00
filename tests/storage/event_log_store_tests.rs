//! EventLogStore interface tests.
//!
//! The event log is read-only through the trait, so each implementation
//! appends [`sample_events`] with its own writer before running these.

use alarm_registry::model::EventRecord;
use alarm_registry::pagination::for_each_page;
use alarm_registry::storage::EventLogStore;
use serde_json::json;

/// Number of `set` events in [`sample_events`].
pub const SET_EVENTS: usize = 12;

pub fn make_event(alarm_state: &str, seq: usize) -> EventRecord {
    let value = json!({
        "alarm_state": alarm_state,
        "alarm_id": format!("test_event_{}", seq),
        "timestamp": 1622548800 + seq as i64,
        "detail": {"severity": "high", "tags": ["pipeline", "input"]},
    });
    match value {
        serde_json::Value::Object(map) => EventRecord(map),
        _ => unreachable!("json! object literal"),
    }
}

/// Events to append before running the tests: `SET_EVENTS` in `set`, two in
/// `clear`.
pub fn sample_events() -> Vec<EventRecord> {
    let mut events: Vec<EventRecord> = (0..SET_EVENTS).map(|i| make_event("set", i)).collect();
    events.push(make_event("clear", 100));
    events.push(make_event("clear", 101));
    events
}

async fn drain<S: EventLogStore>(store: &S, alarm_state: &str) -> Vec<EventRecord> {
    let mut events = Vec::new();
    for_each_page(
        move |token| store.query_by_alarm_state(alarm_state, token),
        |event| events.push(event),
    )
    .await
    .expect("query_by_alarm_state should succeed");
    events
}

pub async fn test_query_returns_matching_state<S: EventLogStore>(store: &S) {
    let events = drain(store, "clear").await;
    assert_eq!(events.len(), 2);
    assert!(events
        .iter()
        .all(|e| e.get("alarm_state").and_then(|v| v.as_str()) == Some("clear")));
}

pub async fn test_query_spans_pages<S: EventLogStore>(store: &S) {
    let events = drain(store, "set").await;
    let mut ids: Vec<&str> = events
        .iter()
        .filter_map(|e| e.get("alarm_id").and_then(|v| v.as_str()))
        .collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(events.len(), SET_EVENTS);
    assert_eq!(ids.len(), SET_EVENTS, "no event should be returned twice");
}

pub async fn test_events_returned_verbatim<S: EventLogStore>(store: &S) {
    let events = drain(store, "clear").await;
    assert!(events.contains(&make_event("clear", 100)));
    assert!(events.contains(&make_event("clear", 101)));
}

pub async fn test_unknown_state_is_empty<S: EventLogStore>(store: &S) {
    assert!(drain(store, "test_no_such_state").await.is_empty());
}

// =============================================================================
// Test runner macro
// =============================================================================

/// Run all EventLogStore interface tests against a store seeded with
/// `sample_events()` and a page size below `SET_EVENTS`.
#[macro_export]
macro_rules! run_event_log_store_tests {
    ($store:expr) => {
        use $crate::storage::event_log_store_tests::*;

        test_query_returns_matching_state($store).await;
        println!("  test_query_returns_matching_state: PASSED");

        test_query_spans_pages($store).await;
        println!("  test_query_spans_pages: PASSED");

        test_events_returned_verbatim($store).await;
        println!("  test_events_returned_verbatim: PASSED");

        test_unknown_state_is_empty($store).await;
        println!("  test_unknown_state_is_empty: PASSED");
    };
}
