//! SubscriptionStore trait definition.

use async_trait::async_trait;

use super::Result;
use crate::model::{RegionAlarmName, SubscriptionKey, SubscriptionRecord};
use crate::pagination::{Page, PageToken};

/// Interface for the alarm subscription table.
///
/// Records are keyed by `(RegionAlarmName, ResourceArn)`. Besides the primary
/// key, the table is queryable by exact match on `ResourceArn`,
/// `RegionAlarmName` and `StateValue`, and can be scanned in full.
///
/// Every query method returns one page; pass the returned token back in as
/// `start` to fetch the next one. Page order is backend-defined.
///
/// Implementations:
/// - `DynamoSubscriptionStore`: DynamoDB table with secondary indexes
/// - `SqliteSubscriptionStore`: SQLite storage
/// - `MockSubscriptionStore`: In-memory mock for testing
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Write a record, replacing every attribute of an existing record with
    /// the same key.
    async fn put(&self, record: &SubscriptionRecord) -> Result<()>;

    /// Delete a record by primary key. Deleting a missing record succeeds.
    async fn delete(&self, key: &SubscriptionKey) -> Result<()>;

    /// Records subscribed to one alarm.
    async fn query_by_region_alarm_name(
        &self,
        region_alarm_name: &RegionAlarmName,
        start: Option<PageToken>,
    ) -> Result<Page<SubscriptionRecord>>;

    /// Records belonging to one resource.
    async fn query_by_resource(
        &self,
        resource_arn: &str,
        start: Option<PageToken>,
    ) -> Result<Page<SubscriptionRecord>>;

    /// Records whose last applied state equals `state_value`.
    ///
    /// Records without state are never returned.
    async fn query_by_state(
        &self,
        state_value: &str,
        start: Option<PageToken>,
    ) -> Result<Page<SubscriptionRecord>>;

    /// Full table scan.
    async fn scan(&self, start: Option<PageToken>) -> Result<Page<SubscriptionRecord>>;
}
