//! SubscriptionStore interface tests.
//!
//! These tests verify the contract of the SubscriptionStore trait.
//! Each storage implementation should run these tests against a fresh store
//! with a small page size, so that multi-page results are exercised.

use std::collections::BTreeSet;

use alarm_registry::model::{RegionAlarmName, SubscriptionRecord};
use alarm_registry::pagination::{for_each_page, PageToken};
use alarm_registry::storage::{StorageError, SubscriptionStore};

/// Number of records used by the pagination tests. Larger than any page size
/// the runners configure.
pub const MANY: usize = 23;

pub fn make_record(region: &str, alarm: &str, resource: &str) -> SubscriptionRecord {
    SubscriptionRecord::new(RegionAlarmName::new(region, alarm), resource)
}

pub fn make_state_record(alarm: &str, resource: &str, state: &str) -> SubscriptionRecord {
    SubscriptionRecord {
        state_value: Some(state.to_string()),
        namespace: Some("AWS/EC2".to_string()),
        state_updated: Some(1622548800),
        updated: Some(1622548900),
        ..make_record("us-east-1", alarm, resource)
    }
}

async fn drain_alarm<S: SubscriptionStore>(store: &S, key: &RegionAlarmName) -> Vec<SubscriptionRecord> {
    let mut records = Vec::new();
    for_each_page(
        move |token| store.query_by_region_alarm_name(key, token),
        |record| records.push(record),
    )
    .await
    .expect("query_by_region_alarm_name should succeed");
    records
}

async fn drain_resource<S: SubscriptionStore>(store: &S, resource_arn: &str) -> Vec<SubscriptionRecord> {
    let mut records = Vec::new();
    for_each_page(
        move |token| store.query_by_resource(resource_arn, token),
        |record| records.push(record),
    )
    .await
    .expect("query_by_resource should succeed");
    records
}

async fn drain_state<S: SubscriptionStore>(store: &S, state: &str) -> Vec<SubscriptionRecord> {
    let mut records = Vec::new();
    for_each_page(
        move |token| store.query_by_state(state, token),
        |record| records.push(record),
    )
    .await
    .expect("query_by_state should succeed");
    records
}

// =============================================================================
// put / delete tests
// =============================================================================

pub async fn test_put_then_query<S: SubscriptionStore>(store: &S) {
    let record = make_record("us-east-1", "test_put_query", "arn:test:r1");
    store.put(&record).await.expect("put should succeed");

    let found = drain_alarm(store, &record.region_alarm_name).await;
    assert_eq!(found, vec![record]);
}

pub async fn test_put_overwrites_all_attributes<S: SubscriptionStore>(store: &S) {
    let with_state = make_state_record("test_overwrite", "arn:test:r1", "ALARM");
    store.put(&with_state).await.expect("put should succeed");

    let fresh = make_record("us-east-1", "test_overwrite", "arn:test:r1");
    store.put(&fresh).await.expect("put should succeed");

    let found = drain_alarm(store, &fresh.region_alarm_name).await;
    assert_eq!(found.len(), 1, "overwrite should not duplicate");
    assert_eq!(found[0], fresh, "state fields should be cleared");
}

pub async fn test_put_preserves_state_fields<S: SubscriptionStore>(store: &S) {
    let record = make_state_record("test_state_fields", "arn:test:r1", "OK");
    store.put(&record).await.expect("put should succeed");

    let found = drain_alarm(store, &record.region_alarm_name).await;
    assert_eq!(found, vec![record]);
}

pub async fn test_alarm_name_with_colons<S: SubscriptionStore>(store: &S) {
    let record = make_record("eu-west-1", "test:colon:name", "arn:test:r1");
    store.put(&record).await.expect("put should succeed");

    let found = drain_alarm(store, &record.region_alarm_name).await;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].region_alarm_name.region(), "eu-west-1");
    assert_eq!(found[0].region_alarm_name.alarm_name(), "test:colon:name");
}

pub async fn test_delete_removes_only_target<S: SubscriptionStore>(store: &S) {
    let keep = make_record("us-east-1", "test_delete", "arn:test:keep");
    let remove = make_record("us-east-1", "test_delete", "arn:test:remove");
    store.put(&keep).await.expect("put should succeed");
    store.put(&remove).await.expect("put should succeed");

    store.delete(&remove.key()).await.expect("delete should succeed");

    let found = drain_alarm(store, &keep.region_alarm_name).await;
    assert_eq!(found, vec![keep]);
}

pub async fn test_delete_missing_succeeds<S: SubscriptionStore>(store: &S) {
    let never_stored = make_record("us-east-1", "test_delete_missing", "arn:test:none");
    store
        .delete(&never_stored.key())
        .await
        .expect("deleting a missing record should succeed");
}

// =============================================================================
// secondary access tests
// =============================================================================

pub async fn test_query_by_resource<S: SubscriptionStore>(store: &S) {
    let resource = "arn:test:by_resource";
    for alarm in ["test_res_a", "test_res_b"] {
        store
            .put(&make_record("us-east-1", alarm, resource))
            .await
            .expect("put should succeed");
    }
    store
        .put(&make_record("us-east-1", "test_res_a", "arn:test:other"))
        .await
        .expect("put should succeed");

    let found = drain_resource(store, resource).await;
    let alarms: BTreeSet<String> = found
        .iter()
        .map(|r| r.region_alarm_name.alarm_name().to_string())
        .collect();
    assert_eq!(found.len(), 2);
    assert!(alarms.contains("test_res_a"));
    assert!(alarms.contains("test_res_b"));
}

pub async fn test_query_by_state_excludes_stateless<S: SubscriptionStore>(store: &S) {
    let resource = "arn:test:by_state";
    store
        .put(&make_state_record("test_state_alarm", resource, "INSUFFICIENT_DATA"))
        .await
        .expect("put should succeed");
    store
        .put(&make_record("us-east-1", "test_state_none", resource))
        .await
        .expect("put should succeed");

    let found: Vec<_> = drain_state(store, "INSUFFICIENT_DATA")
        .await
        .into_iter()
        .filter(|r| r.resource_arn == resource)
        .collect();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].region_alarm_name.alarm_name(), "test_state_alarm");
}

pub async fn test_scan_sees_every_alarm<S: SubscriptionStore>(store: &S) {
    for alarm in ["test_scan_a", "test_scan_b"] {
        store
            .put(&make_record("ap-south-1", alarm, "arn:test:scan"))
            .await
            .expect("put should succeed");
    }

    let mut alarms = BTreeSet::new();
    for_each_page(
        move |token| store.scan(token),
        |record| {
            if record.region_alarm_name.region() == "ap-south-1" {
                alarms.insert(record.region_alarm_name.alarm_name().to_string());
            }
        },
    )
    .await
    .expect("scan should succeed");

    assert_eq!(
        alarms.into_iter().collect::<Vec<_>>(),
        vec!["test_scan_a".to_string(), "test_scan_b".to_string()]
    );
}

// =============================================================================
// pagination tests
// =============================================================================

pub async fn test_pagination_returns_each_record_once<S: SubscriptionStore>(store: &S) {
    let key = RegionAlarmName::new("us-west-2", "test_paged");
    for i in 0..MANY {
        store
            .put(&SubscriptionRecord::new(key.clone(), format!("arn:test:paged:{:02}", i)))
            .await
            .expect("put should succeed");
    }

    let found = drain_alarm(store, &key).await;
    let distinct: BTreeSet<_> = found.iter().map(|r| r.resource_arn.clone()).collect();
    assert_eq!(found.len(), MANY, "every record should be returned");
    assert_eq!(distinct.len(), MANY, "no record should be returned twice");
}

pub async fn test_first_page_has_continuation<S: SubscriptionStore>(store: &S) {
    let key = RegionAlarmName::new("us-west-2", "test_paged");
    let page = store
        .query_by_region_alarm_name(&key, None)
        .await
        .expect("query should succeed");

    assert!(page.items.len() < MANY, "first page should be partial");
    assert!(page.next.is_some(), "partial page should carry a token");
}

pub async fn test_foreign_token_rejected<S: SubscriptionStore>(store: &S) {
    let result = store.scan(Some(PageToken::new("!!not-a-token!!"))).await;
    assert!(
        matches!(result, Err(StorageError::InvalidPageToken(_))),
        "foreign token should be rejected"
    );
}

// =============================================================================
// Test runner macro
// =============================================================================

/// Run all SubscriptionStore interface tests against a store implementation.
///
/// The store must be empty and use a page size below `MANY`.
#[macro_export]
macro_rules! run_subscription_store_tests {
    ($store:expr) => {
        use $crate::storage::subscription_store_tests::*;

        // put / delete tests
        test_put_then_query($store).await;
        println!("  test_put_then_query: PASSED");

        test_put_overwrites_all_attributes($store).await;
        println!("  test_put_overwrites_all_attributes: PASSED");

        test_put_preserves_state_fields($store).await;
        println!("  test_put_preserves_state_fields: PASSED");

        test_alarm_name_with_colons($store).await;
        println!("  test_alarm_name_with_colons: PASSED");

        test_delete_removes_only_target($store).await;
        println!("  test_delete_removes_only_target: PASSED");

        test_delete_missing_succeeds($store).await;
        println!("  test_delete_missing_succeeds: PASSED");

        // secondary access tests
        test_query_by_resource($store).await;
        println!("  test_query_by_resource: PASSED");

        test_query_by_state_excludes_stateless($store).await;
        println!("  test_query_by_state_excludes_stateless: PASSED");

        test_scan_sees_every_alarm($store).await;
        println!("  test_scan_sees_every_alarm: PASSED");

        // pagination tests
        test_pagination_returns_each_record_once($store).await;
        println!("  test_pagination_returns_each_record_once: PASSED");

        test_first_page_has_continuation($store).await;
        println!("  test_first_page_has_continuation: PASSED");

        test_foreign_token_rejected($store).await;
        println!("  test_foreign_token_rejected: PASSED");
    };
}
