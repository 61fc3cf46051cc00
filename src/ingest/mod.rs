//! Alarm notification ingestion.
//!
//! Notification batches arrive from the SNS topic the alarms publish to. Each
//! record carries an alarm state change; every current subscriber of that
//! alarm gets its record overwritten with the new state.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::model::SubscriptionRecord;
use crate::registry::{alarm_key, AlarmRegistry, RegistryError};

/// Format of `StateChangeTime`, e.g. `2021-06-01T12:00:00.123456+0000`.
pub const STATE_CHANGE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%z";

/// Result type for ingestion.
pub type Result<T> = std::result::Result<T, IngestError>;

/// Errors that can occur while ingesting a notification batch.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Malformed notification: {0}")]
    Malformed(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Inbound batch of SNS records.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NotificationBatch {
    pub records: Vec<NotificationRecord>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NotificationRecord {
    pub event_subscription_arn: String,
    pub sns: SnsEnvelope,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SnsEnvelope {
    /// JSON-encoded [`AlarmNotification`].
    pub message: String,
}

/// The alarm state change carried inside an SNS message.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AlarmNotification {
    pub alarm_name: String,
    pub new_state_value: String,
    pub trigger: Trigger,
    pub state_change_time: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Trigger {
    /// Absent for metric-math alarms.
    #[serde(default)]
    pub namespace: Option<String>,
}

/// Outcome of one ingested batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Notification records processed.
    pub notifications: usize,
    /// Subscription records overwritten.
    pub updated: usize,
}

/// Region of the subscription ARN: the fourth `:`-delimited field.
pub fn region_of(event_subscription_arn: &str) -> Result<&str> {
    event_subscription_arn
        .split(':')
        .nth(3)
        .filter(|region| !region.is_empty())
        .ok_or_else(|| {
            IngestError::Malformed(format!(
                "Subscription ARN '{}' has no region field",
                event_subscription_arn
            ))
        })
}

/// Parse `StateChangeTime` into epoch seconds.
pub fn parse_state_change_time(raw: &str) -> Result<i64> {
    DateTime::parse_from_str(raw, STATE_CHANGE_TIME_FORMAT)
        .map(|t| t.timestamp())
        .map_err(|e| IngestError::Malformed(format!("StateChangeTime '{}': {}", raw, e)))
}

/// Applies alarm notifications to subscriber records.
pub struct NotificationIngestor {
    registry: AlarmRegistry,
}

impl NotificationIngestor {
    pub fn new(registry: AlarmRegistry) -> Self {
        Self { registry }
    }

    /// Ingest a batch, stamping every write with the current time.
    pub async fn ingest(&self, batch: &NotificationBatch) -> Result<IngestReport> {
        self.ingest_at(batch, Utc::now().timestamp()).await
    }

    /// Ingest a batch, stamping every write with `updated`.
    ///
    /// The first malformed record or failed store call stops the batch;
    /// records before it stay applied.
    pub async fn ingest_at(&self, batch: &NotificationBatch, updated: i64) -> Result<IngestReport> {
        let mut report = IngestReport::default();

        for record in &batch.records {
            let region = region_of(&record.event_subscription_arn)?;
            let alarm: AlarmNotification = serde_json::from_str(&record.sns.message)
                .map_err(|e| IngestError::Malformed(format!("Sns.Message: {}", e)))?;
            let state_updated = parse_state_change_time(&alarm.state_change_time)?;
            let key = alarm_key(&alarm.alarm_name, region)?;

            let subscribers = self.registry.subscribers_of(&alarm.alarm_name, region).await?;
            debug!(region_alarm_name = %key, subscribers = subscribers.len(), "Applying notification");

            for resource_arn in subscribers {
                let state = SubscriptionRecord {
                    region_alarm_name: key.clone(),
                    resource_arn,
                    state_value: Some(alarm.new_state_value.clone()),
                    namespace: alarm.trigger.namespace.clone(),
                    state_updated: Some(state_updated),
                    updated: Some(updated),
                };
                self.registry.record_state(&state).await?;
                info!(
                    region_alarm_name = %key,
                    resource_arn = %state.resource_arn,
                    state = %alarm.new_state_value,
                    "Updated subscriber state"
                );
                report.updated += 1;
            }
            report.notifications += 1;
        }

        Ok(report)
    }

    /// Entry point for raw notification events.
    ///
    /// Malformed input is an error. Store and registry failures are logged
    /// and still reported as handled, so the channel does not redeliver.
    pub async fn handle_event(&self, event: serde_json::Value) -> Result<bool> {
        let batch: NotificationBatch = serde_json::from_value(event)
            .map_err(|e| IngestError::Malformed(format!("Notification batch: {}", e)))?;

        match self.ingest(&batch).await {
            Ok(report) => {
                info!(notifications = report.notifications, updated = report.updated, "Ingested batch");
                Ok(true)
            }
            Err(IngestError::Registry(RegistryError::InvalidKey(e))) => Err(IngestError::Malformed(e.to_string())),
            Err(IngestError::Registry(e)) => {
                error!(error = %e, "Notification batch failed");
                Ok(true)
            }
            Err(e) => Err(e),
        }
    }
}
