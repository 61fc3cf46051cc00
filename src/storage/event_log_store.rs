//! EventLogStore trait definition.

use async_trait::async_trait;

use super::Result;
use crate::model::EventRecord;
use crate::pagination::{Page, PageToken};

/// Read-only interface for the pipeline event log.
///
/// Implementations:
/// - `DynamoEventLogStore`: DynamoDB table queried through `AlarmStateIndex`
/// - `SqliteEventLogStore`: SQLite storage
/// - `MockEventLogStore`: In-memory mock for testing
#[async_trait]
pub trait EventLogStore: Send + Sync {
    /// Events whose `alarm_state` attribute equals `alarm_state`.
    async fn query_by_alarm_state(
        &self,
        alarm_state: &str,
        start: Option<PageToken>,
    ) -> Result<Page<EventRecord>>;
}
