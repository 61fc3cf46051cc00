//! Alarm subscription registry.
//!
//! Subscribe and unsubscribe resources to alarms, and answer the read-side
//! queries over the subscription table, the pipeline event log and the
//! monitoring service. Every list operation is fully paginated through
//! [`for_each_page`]; a failure on any page fails the whole operation.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::model::{
    EventRecord, FilteredAlarm, InvalidRegionAlarmName, RegionAlarmName, ResourceStateCount,
    SubscribedAlarm, SubscriptionKey, SubscriptionRecord, SubscriptionView,
};
use crate::monitoring::{AlarmSource, MonitoringError, RawAlarm};
use crate::pagination::for_each_page;
use crate::storage::{EventLogStore, StorageError, SubscriptionStore};

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Errors returned by registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Monitoring error: {0}")]
    Monitoring(#[from] MonitoringError),

    #[error(transparent)]
    InvalidKey(#[from] InvalidRegionAlarmName),
}

/// Build the composite key for an alarm, rejecting regions that would make
/// the key ambiguous.
pub fn alarm_key(alarm_name: &str, region: &str) -> Result<RegionAlarmName> {
    if region.is_empty() || region.contains(':') || alarm_name.is_empty() {
        return Err(InvalidRegionAlarmName(format!("{}:{}", region, alarm_name)).into());
    }
    Ok(RegionAlarmName::new(region, alarm_name))
}

/// Registry over the subscription table, the event log and the alarm source.
#[derive(Clone)]
pub struct AlarmRegistry {
    subscriptions: Arc<dyn SubscriptionStore>,
    events: Arc<dyn EventLogStore>,
    alarms: Arc<dyn AlarmSource>,
}

impl AlarmRegistry {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionStore>,
        events: Arc<dyn EventLogStore>,
        alarms: Arc<dyn AlarmSource>,
    ) -> Self {
        Self {
            subscriptions,
            events,
            alarms,
        }
    }

    /// Subscribe each resource to the alarm.
    ///
    /// Existing subscriptions are overwritten and lose their state. The first
    /// failed write stops the batch.
    pub async fn subscribe(&self, alarm_name: &str, region: &str, resource_arns: &[String]) -> Result<()> {
        let key = alarm_key(alarm_name, region)?;
        for resource_arn in resource_arns {
            let record = SubscriptionRecord::new(key.clone(), resource_arn.as_str());
            self.subscriptions.put(&record).await.map_err(|e| {
                error!(region_alarm_name = %key, resource_arn = %resource_arn, error = %e, "Subscribe failed");
                e
            })?;
        }
        info!(region_alarm_name = %key, count = resource_arns.len(), "Subscribed resources");
        Ok(())
    }

    /// Remove each resource's subscription to the alarm. Missing
    /// subscriptions are not an error.
    pub async fn unsubscribe(&self, alarm_name: &str, region: &str, resource_arns: &[String]) -> Result<()> {
        let key = alarm_key(alarm_name, region)?;
        for resource_arn in resource_arns {
            let subscription = SubscriptionKey {
                region_alarm_name: key.clone(),
                resource_arn: resource_arn.clone(),
            };
            self.subscriptions.delete(&subscription).await.map_err(|e| {
                error!(region_alarm_name = %key, resource_arn = %resource_arn, error = %e, "Unsubscribe failed");
                e
            })?;
        }
        info!(region_alarm_name = %key, count = resource_arns.len(), "Unsubscribed resources");
        Ok(())
    }

    /// Sorted, duplicate-free resource ARNs subscribed to the alarm.
    pub async fn subscribers_of(&self, alarm_name: &str, region: &str) -> Result<Vec<String>> {
        let key = alarm_key(alarm_name, region)?;
        let store = &self.subscriptions;
        let key_ref = &key;
        let mut subscribers = BTreeSet::new();

        for_each_page(
            move |token| store.query_by_region_alarm_name(key_ref, token),
            |record| {
                subscribers.insert(record.resource_arn);
            },
        )
        .await
        .map_err(|e| {
            error!(region_alarm_name = %key, error = %e, "Subscriber query failed");
            e
        })?;

        debug!(region_alarm_name = %key, count = subscribers.len(), "Found subscribers");
        Ok(subscribers.into_iter().collect())
    }

    /// A resource's subscriptions, one per alarm, sorted by alarm key.
    pub async fn alarms_for(&self, resource_arn: &str) -> Result<Vec<SubscriptionView>> {
        let store = &self.subscriptions;
        let mut alarms = BTreeMap::new();

        for_each_page(
            move |token| store.query_by_resource(resource_arn, token),
            |record| {
                alarms.insert(record.region_alarm_name.clone(), record.into_view());
            },
        )
        .await
        .map_err(|e| {
            error!(resource_arn, error = %e, "Resource query failed");
            e
        })?;

        Ok(alarms.into_values().collect())
    }

    /// Every alarm with at least one subscriber, sorted by alarm key.
    pub async fn all_subscribed_alarms(&self) -> Result<Vec<SubscribedAlarm>> {
        let store = &self.subscriptions;
        let mut keys = BTreeSet::new();

        for_each_page(
            move |token| store.scan(token),
            |record| {
                keys.insert(record.region_alarm_name);
            },
        )
        .await
        .map_err(|e| {
            error!(error = %e, "Subscription scan failed");
            e
        })?;

        Ok(keys.iter().map(SubscribedAlarm::from).collect())
    }

    /// Per resource, the number of its subscriptions currently in `state`.
    /// Sorted by resource ARN.
    pub async fn subscribers_by_state(&self, state: &str) -> Result<Vec<ResourceStateCount>> {
        let store = &self.subscriptions;
        let mut counts: BTreeMap<String, u64> = BTreeMap::new();

        for_each_page(
            move |token| store.query_by_state(state, token),
            |record| {
                *counts.entry(record.resource_arn).or_insert(0) += 1;
            },
        )
        .await
        .map_err(|e| {
            error!(state, error = %e, "State query failed");
            e
        })?;

        Ok(counts
            .into_iter()
            .map(|(resource_arn, alarm_count)| ResourceStateCount {
                resource_arn,
                alarm_count,
            })
            .collect())
    }

    /// Pipeline events whose `alarm_state` equals `state`, verbatim.
    pub async fn events_in_state(&self, state: &str) -> Result<Vec<EventRecord>> {
        let store = &self.events;
        let mut events = Vec::new();

        for_each_page(
            move |token| store.query_by_alarm_state(state, token),
            |event| events.push(event),
        )
        .await
        .map_err(|e| {
            error!(state, error = %e, "Event log query failed");
            e
        })?;

        Ok(events)
    }

    /// Every alarm the monitoring service defines in `region`, reshaped.
    pub async fn list_alarms(&self, region: &str) -> Result<Vec<FilteredAlarm>> {
        let source = &self.alarms;
        let mut raw = Vec::new();

        for_each_page(
            move |token| source.describe_alarms(region, token),
            |alarm| raw.push(alarm),
        )
        .await
        .map_err(|e| {
            error!(region, error = %e, "Alarm listing failed");
            e
        })?;

        raw.into_iter()
            .map(|alarm| {
                filter_alarm(alarm).map_err(|e| {
                    error!(region, error = %e, "Malformed alarm in listing");
                    RegistryError::from(e)
                })
            })
            .collect()
    }

    /// Overwrite a subscription record in full.
    pub async fn record_state(&self, record: &SubscriptionRecord) -> Result<()> {
        self.subscriptions.put(record).await.map_err(|e| {
            error!(
                region_alarm_name = %record.region_alarm_name,
                resource_arn = %record.resource_arn,
                error = %e,
                "State update failed"
            );
            e
        })?;
        Ok(())
    }
}

/// Reshape a described alarm for display.
fn filter_alarm(alarm: RawAlarm) -> std::result::Result<FilteredAlarm, MonitoringError> {
    let name = alarm.alarm_name.clone().unwrap_or_default();
    let missing = |field: &str| MonitoringError::MalformedAlarm(format!("Alarm '{}' has no {}", name, field));

    Ok(FilteredAlarm {
        alarm_arn: alarm.alarm_arn.ok_or_else(|| missing("AlarmArn"))?,
        alarm_name: alarm.alarm_name.ok_or_else(|| missing("AlarmName"))?,
        metric_name: alarm.metric_name,
        namespace: alarm.namespace,
        state_value: alarm.state_value.ok_or_else(|| missing("StateValue"))?,
        state_updated: alarm.state_updated.ok_or_else(|| missing("StateUpdatedTimestamp"))?,
    })
}
