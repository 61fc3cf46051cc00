//! Subscription records and the read-side views derived from them.
//!
//! Attribute names match the alarm table (`RegionAlarmName`, `ResourceArn`,
//! `StateValue`, ...), so every type here serializes with PascalCase keys.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Attribute names in the alarm table.
pub mod attr {
    pub const REGION_ALARM_NAME: &str = "RegionAlarmName";
    pub const RESOURCE_ARN: &str = "ResourceArn";
    pub const STATE_VALUE: &str = "StateValue";
    pub const NAMESPACE: &str = "Namespace";
    pub const STATE_UPDATED: &str = "StateUpdated";
    pub const UPDATED: &str = "Updated";
}

/// Alarm states reported by the monitoring service.
pub mod state {
    pub const OK: &str = "OK";
    pub const ALARM: &str = "ALARM";
    pub const INSUFFICIENT_DATA: &str = "INSUFFICIENT_DATA";
}

/// Composite `region:alarmName` key identifying an alarm within a region.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionAlarmName(String);

impl RegionAlarmName {
    pub fn new(region: &str, alarm_name: &str) -> Self {
        Self(format!("{}:{}", region, alarm_name))
    }

    /// Parse a stored key. Splits on the first `:` only, since alarm names may
    /// themselves contain colons.
    pub fn parse(raw: &str) -> Result<Self, InvalidRegionAlarmName> {
        match raw.split_once(':') {
            Some((region, _)) if !region.is_empty() => Ok(Self(raw.to_string())),
            _ => Err(InvalidRegionAlarmName(raw.to_string())),
        }
    }

    pub fn region(&self) -> &str {
        self.split().0
    }

    pub fn alarm_name(&self) -> &str {
        self.split().1
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn split(&self) -> (&str, &str) {
        self.0.split_once(':').unwrap_or((self.0.as_str(), ""))
    }
}

impl fmt::Display for RegionAlarmName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid RegionAlarmName '{0}': expected 'region:alarmName'")]
pub struct InvalidRegionAlarmName(pub String);

/// One (alarm, resource) subscription with its last applied alarm state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SubscriptionRecord {
    pub region_alarm_name: RegionAlarmName,
    pub resource_arn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_updated: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<i64>,
}

impl SubscriptionRecord {
    /// A fresh subscription with no state yet.
    pub fn new(region_alarm_name: RegionAlarmName, resource_arn: impl Into<String>) -> Self {
        Self {
            region_alarm_name,
            resource_arn: resource_arn.into(),
            state_value: None,
            namespace: None,
            state_updated: None,
            updated: None,
        }
    }

    pub fn key(&self) -> SubscriptionKey {
        SubscriptionKey {
            region_alarm_name: self.region_alarm_name.clone(),
            resource_arn: self.resource_arn.clone(),
        }
    }

    /// Project into the reader-facing view, dropping the index attributes.
    pub fn into_view(self) -> SubscriptionView {
        SubscriptionView {
            region: self.region_alarm_name.region().to_string(),
            alarm_name: self.region_alarm_name.alarm_name().to_string(),
            state_value: self.state_value,
            namespace: self.namespace,
            state_updated: self.state_updated,
        }
    }
}

/// Primary key of a subscription.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionKey {
    pub region_alarm_name: RegionAlarmName,
    pub resource_arn: String,
}

/// A resource's view of one of its alarm subscriptions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SubscriptionView {
    pub region: String,
    pub alarm_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_updated: Option<i64>,
}

/// An alarm with at least one subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SubscribedAlarm {
    pub region: String,
    pub alarm_name: String,
}

impl From<&RegionAlarmName> for SubscribedAlarm {
    fn from(key: &RegionAlarmName) -> Self {
        Self {
            region: key.region().to_string(),
            alarm_name: key.alarm_name().to_string(),
        }
    }
}

/// Number of a resource's subscriptions currently in a given state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceStateCount {
    pub resource_arn: String,
    pub alarm_count: u64,
}

/// Live alarm reshaped for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FilteredAlarm {
    pub alarm_arn: String,
    pub alarm_name: String,
    pub metric_name: Option<String>,
    pub namespace: Option<String>,
    pub state_value: String,
    pub state_updated: i64,
}

/// Opaque pipeline event from the event log, returned verbatim.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventRecord(pub serde_json::Map<String, serde_json::Value>);

impl EventRecord {
    pub fn get(&self, attribute: &str) -> Option<&serde_json::Value> {
        self.0.get(attribute)
    }
}
