//! Notification ingestion integration tests.
//!
//! Run with: cargo test --test ingest

use std::sync::Arc;

use alarm_registry::model::{state, RegionAlarmName, SubscriptionKey};
use alarm_registry::monitoring::MockAlarmSource;
use alarm_registry::storage::{MockEventLogStore, MockSubscriptionStore};
use alarm_registry::{AlarmRegistry, IngestError, NotificationBatch, NotificationIngestor};
use serde_json::{json, Value};

const SUBSCRIPTION_ARN: &str = "arn:aws:sns:us-east-1:123:topic";
const CHANGE_TIME: &str = "2021-06-01T12:00:00.123456+0000";
const CHANGE_EPOCH: i64 = 1622548800;

fn setup() -> (Arc<MockSubscriptionStore>, AlarmRegistry, NotificationIngestor) {
    let subscriptions = Arc::new(MockSubscriptionStore::with_page_size(2));
    let registry = AlarmRegistry::new(
        subscriptions.clone(),
        Arc::new(MockEventLogStore::new()),
        Arc::new(MockAlarmSource::new()),
    );
    let ingestor = NotificationIngestor::new(registry.clone());
    (subscriptions, registry, ingestor)
}

fn alarm_message(alarm_name: &str, new_state: &str) -> String {
    json!({
        "AlarmName": alarm_name,
        "AlarmDescription": null,
        "NewStateValue": new_state,
        "OldStateValue": "OK",
        "NewStateReason": "Threshold Crossed",
        "StateChangeTime": CHANGE_TIME,
        "Trigger": {"MetricName": "CPUUtilization", "Namespace": "AWS/EC2"}
    })
    .to_string()
}

fn batch_json(records: &[(&str, String)]) -> Value {
    let records: Vec<Value> = records
        .iter()
        .map(|(arn, message)| {
            json!({
                "EventSource": "aws:sns",
                "EventSubscriptionArn": arn,
                "Sns": {"Type": "Notification", "Message": message}
            })
        })
        .collect();
    json!({ "Records": records })
}

fn batch(records: &[(&str, String)]) -> NotificationBatch {
    serde_json::from_value(batch_json(records)).unwrap()
}

fn key(resource: &str) -> SubscriptionKey {
    SubscriptionKey {
        region_alarm_name: RegionAlarmName::new("us-east-1", "HighCPU"),
        resource_arn: resource.to_string(),
    }
}

fn subscribers(resources: &[&str]) -> Vec<String> {
    resources.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_alarm_notification_updates_every_subscriber() {
    let (store, registry, ingestor) = setup();
    registry
        .subscribe("HighCPU", "us-east-1", &subscribers(&["arn:r1", "arn:r2", "arn:r3"]))
        .await
        .unwrap();

    let report = ingestor
        .ingest_at(&batch(&[(SUBSCRIPTION_ARN, alarm_message("HighCPU", state::ALARM))]), 1700000000)
        .await
        .unwrap();
    assert_eq!(report.notifications, 1);
    assert_eq!(report.updated, 3);

    for resource in ["arn:r1", "arn:r2", "arn:r3"] {
        let record = store.get(&key(resource)).await.unwrap();
        assert_eq!(record.state_value.as_deref(), Some(state::ALARM));
        assert_eq!(record.state_updated, Some(CHANGE_EPOCH));
        assert_eq!(record.namespace.as_deref(), Some("AWS/EC2"));
        assert_eq!(record.updated, Some(1700000000));
    }

    let views = registry.alarms_for("arn:r1").await.unwrap();
    assert_eq!(views[0].state_value.as_deref(), Some(state::ALARM));
}

#[tokio::test]
async fn test_other_regions_untouched() {
    let (store, registry, ingestor) = setup();
    registry
        .subscribe("HighCPU", "us-west-2", &subscribers(&["arn:r1"]))
        .await
        .unwrap();

    let report = ingestor
        .ingest_at(&batch(&[(SUBSCRIPTION_ARN, alarm_message("HighCPU", state::ALARM))]), 1)
        .await
        .unwrap();
    assert_eq!(report.updated, 0);

    let untouched = store
        .get(&SubscriptionKey {
            region_alarm_name: RegionAlarmName::new("us-west-2", "HighCPU"),
            resource_arn: "arn:r1".to_string(),
        })
        .await
        .unwrap();
    assert!(untouched.state_value.is_none());
}

#[tokio::test]
async fn test_zero_subscribers_writes_nothing() {
    let (store, _registry, ingestor) = setup();

    let report = ingestor
        .ingest(&batch(&[(SUBSCRIPTION_ARN, alarm_message("Orphan", state::ALARM))]))
        .await
        .unwrap();

    assert_eq!(report.updated, 0);
    assert_eq!(store.put_count(), 0);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_reingestion_is_idempotent() {
    let (store, registry, ingestor) = setup();
    registry
        .subscribe("HighCPU", "us-east-1", &subscribers(&["arn:r1", "arn:r2"]))
        .await
        .unwrap();
    let notification = batch(&[(SUBSCRIPTION_ARN, alarm_message("HighCPU", state::ALARM))]);

    ingestor.ingest_at(&notification, 1700000000).await.unwrap();
    let first = (store.get(&key("arn:r1")).await, store.get(&key("arn:r2")).await);

    ingestor.ingest_at(&notification, 1700000000).await.unwrap();
    let second = (store.get(&key("arn:r1")).await, store.get(&key("arn:r2")).await);

    assert_eq!(first, second);
    assert_eq!(store.len().await, 2);
}

#[tokio::test]
async fn test_later_record_in_batch_wins() {
    let (store, registry, ingestor) = setup();
    registry
        .subscribe("HighCPU", "us-east-1", &subscribers(&["arn:r1"]))
        .await
        .unwrap();

    ingestor
        .ingest_at(
            &batch(&[
                (SUBSCRIPTION_ARN, alarm_message("HighCPU", state::ALARM)),
                (SUBSCRIPTION_ARN, alarm_message("HighCPU", state::OK)),
            ]),
            1,
        )
        .await
        .unwrap();

    let record = store.get(&key("arn:r1")).await.unwrap();
    assert_eq!(record.state_value.as_deref(), Some(state::OK));
}

#[tokio::test]
async fn test_metric_math_alarm_has_no_namespace() {
    let (store, registry, ingestor) = setup();
    registry
        .subscribe("HighCPU", "us-east-1", &subscribers(&["arn:r1"]))
        .await
        .unwrap();

    let message = json!({
        "AlarmName": "HighCPU",
        "NewStateValue": "INSUFFICIENT_DATA",
        "StateChangeTime": CHANGE_TIME,
        "Trigger": {"Metrics": []}
    })
    .to_string();
    ingestor.ingest_at(&batch(&[(SUBSCRIPTION_ARN, message)]), 1).await.unwrap();

    let record = store.get(&key("arn:r1")).await.unwrap();
    assert_eq!(record.state_value.as_deref(), Some(state::INSUFFICIENT_DATA));
    assert!(record.namespace.is_none());
}

#[tokio::test]
async fn test_malformed_input_is_an_error() {
    let (_store, _registry, ingestor) = setup();

    let short_arn = batch_json(&[("arn:aws:sns", alarm_message("HighCPU", state::ALARM))]);
    assert!(matches!(
        ingestor.handle_event(short_arn).await,
        Err(IngestError::Malformed(_))
    ));

    let bad_json = batch_json(&[(SUBSCRIPTION_ARN, "{not json".to_string())]);
    assert!(matches!(
        ingestor.handle_event(bad_json).await,
        Err(IngestError::Malformed(_))
    ));

    let bad_time = json!({
        "AlarmName": "HighCPU",
        "NewStateValue": "ALARM",
        "StateChangeTime": "yesterday",
        "Trigger": {}
    })
    .to_string();
    assert!(matches!(
        ingestor.handle_event(batch_json(&[(SUBSCRIPTION_ARN, bad_time)])).await,
        Err(IngestError::Malformed(_))
    ));

    assert!(matches!(
        ingestor.handle_event(json!({"NotRecords": []})).await,
        Err(IngestError::Malformed(_))
    ));
}

#[tokio::test]
async fn test_store_failure_is_reported_as_handled() {
    let (store, registry, ingestor) = setup();
    registry
        .subscribe("HighCPU", "us-east-1", &subscribers(&["arn:r1", "arn:r2"]))
        .await
        .unwrap();
    store.set_fail_on_resource(Some("arn:r1")).await;

    let event = batch_json(&[(SUBSCRIPTION_ARN, alarm_message("HighCPU", state::ALARM))]);
    assert!(ingestor.handle_event(event).await.unwrap());

    // Subscribers are visited in ARN order; the failure on arn:r1 stops the batch.
    let record = store.get(&key("arn:r2")).await.unwrap();
    assert!(record.state_value.is_none());
}

#[tokio::test]
async fn test_store_failure_surfaces_from_ingest() {
    let (store, registry, ingestor) = setup();
    registry
        .subscribe("HighCPU", "us-east-1", &subscribers(&["arn:r1"]))
        .await
        .unwrap();
    store.set_fail_on_query(true).await;

    let result = ingestor
        .ingest(&batch(&[(SUBSCRIPTION_ARN, alarm_message("HighCPU", state::ALARM))]))
        .await;
    assert!(matches!(result, Err(IngestError::Registry(_))));
}
