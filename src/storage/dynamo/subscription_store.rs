//! DynamoDB SubscriptionStore implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use tracing::{debug, error};

use super::{last_key_to_token, sdk_error, token_to_start_key};
use crate::model::{attr, RegionAlarmName, SubscriptionKey, SubscriptionRecord};
use crate::pagination::{Page, PageToken};
use crate::storage::{Result, StorageError, SubscriptionStore};

const RESOURCE_ARN_INDEX: &str = "ResourceArnIndex";
const REGION_ALARM_NAME_INDEX: &str = "RegionAlarmNameIndex";
const STATE_VALUE_INDEX: &str = "StateValueIndex";

/// DynamoDB implementation of SubscriptionStore.
pub struct DynamoSubscriptionStore {
    client: Client,
    table_name: String,
}

impl DynamoSubscriptionStore {
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    /// Exact-match query on one secondary index.
    async fn query_index(
        &self,
        index: &'static str,
        attribute: &'static str,
        value: &str,
        start: Option<PageToken>,
    ) -> Result<Page<SubscriptionRecord>> {
        let output = self
            .client
            .query()
            .table_name(&self.table_name)
            .index_name(index)
            .key_condition_expression("#k = :v")
            .expression_attribute_names("#k", attribute)
            .expression_attribute_values(":v", AttributeValue::S(value.to_string()))
            .set_exclusive_start_key(token_to_start_key(start)?)
            .send()
            .await
            .map_err(|e| {
                error!(table = %self.table_name, index, value, "DynamoDB query failed");
                sdk_error("query", e)
            })?;

        let items = output
            .items()
            .iter()
            .map(item_to_record)
            .collect::<Result<Vec<_>>>()?;
        let next = last_key_to_token(output.last_evaluated_key())?;

        debug!(table = %self.table_name, index, value, count = items.len(), "Queried subscriptions");
        Ok(Page::with_next(items, next))
    }
}

#[async_trait]
impl SubscriptionStore for DynamoSubscriptionStore {
    async fn put(&self, record: &SubscriptionRecord) -> Result<()> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(record_to_item(record)))
            .send()
            .await
            .map_err(|e| {
                error!(
                    table = %self.table_name,
                    region_alarm_name = %record.region_alarm_name,
                    resource_arn = %record.resource_arn,
                    "DynamoDB put_item failed"
                );
                sdk_error("put_item", e)
            })?;

        debug!(
            region_alarm_name = %record.region_alarm_name,
            resource_arn = %record.resource_arn,
            "Stored subscription in DynamoDB"
        );
        Ok(())
    }

    async fn delete(&self, key: &SubscriptionKey) -> Result<()> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .key(
                attr::REGION_ALARM_NAME,
                AttributeValue::S(key.region_alarm_name.to_string()),
            )
            .key(attr::RESOURCE_ARN, AttributeValue::S(key.resource_arn.clone()))
            .send()
            .await
            .map_err(|e| {
                error!(
                    table = %self.table_name,
                    region_alarm_name = %key.region_alarm_name,
                    resource_arn = %key.resource_arn,
                    "DynamoDB delete_item failed"
                );
                sdk_error("delete_item", e)
            })?;

        debug!(
            region_alarm_name = %key.region_alarm_name,
            resource_arn = %key.resource_arn,
            "Deleted subscription from DynamoDB"
        );
        Ok(())
    }

    async fn query_by_region_alarm_name(
        &self,
        region_alarm_name: &RegionAlarmName,
        start: Option<PageToken>,
    ) -> Result<Page<SubscriptionRecord>> {
        self.query_index(
            REGION_ALARM_NAME_INDEX,
            attr::REGION_ALARM_NAME,
            region_alarm_name.as_str(),
            start,
        )
        .await
    }

    async fn query_by_resource(
        &self,
        resource_arn: &str,
        start: Option<PageToken>,
    ) -> Result<Page<SubscriptionRecord>> {
        self.query_index(RESOURCE_ARN_INDEX, attr::RESOURCE_ARN, resource_arn, start)
            .await
    }

    async fn query_by_state(
        &self,
        state_value: &str,
        start: Option<PageToken>,
    ) -> Result<Page<SubscriptionRecord>> {
        self.query_index(STATE_VALUE_INDEX, attr::STATE_VALUE, state_value, start)
            .await
    }

    async fn scan(&self, start: Option<PageToken>) -> Result<Page<SubscriptionRecord>> {
        let output = self
            .client
            .scan()
            .table_name(&self.table_name)
            .set_exclusive_start_key(token_to_start_key(start)?)
            .send()
            .await
            .map_err(|e| {
                error!(table = %self.table_name, "DynamoDB scan failed");
                sdk_error("scan", e)
            })?;

        let items = output
            .items()
            .iter()
            .map(item_to_record)
            .collect::<Result<Vec<_>>>()?;
        let next = last_key_to_token(output.last_evaluated_key())?;

        debug!(table = %self.table_name, count = items.len(), "Scanned subscriptions");
        Ok(Page::with_next(items, next))
    }
}

/// Full item for a record; absent optional fields are omitted so a put
/// removes them from any existing item.
fn record_to_item(record: &SubscriptionRecord) -> HashMap<String, AttributeValue> {
    let mut item = HashMap::new();
    item.insert(
        attr::REGION_ALARM_NAME.to_string(),
        AttributeValue::S(record.region_alarm_name.to_string()),
    );
    item.insert(
        attr::RESOURCE_ARN.to_string(),
        AttributeValue::S(record.resource_arn.clone()),
    );
    if let Some(ref state) = record.state_value {
        item.insert(attr::STATE_VALUE.to_string(), AttributeValue::S(state.clone()));
    }
    if let Some(ref namespace) = record.namespace {
        item.insert(attr::NAMESPACE.to_string(), AttributeValue::S(namespace.clone()));
    }
    if let Some(state_updated) = record.state_updated {
        item.insert(
            attr::STATE_UPDATED.to_string(),
            AttributeValue::N(state_updated.to_string()),
        );
    }
    if let Some(updated) = record.updated {
        item.insert(attr::UPDATED.to_string(), AttributeValue::N(updated.to_string()));
    }
    item
}

fn item_to_record(item: &HashMap<String, AttributeValue>) -> Result<SubscriptionRecord> {
    let raw_key = required_string(item, attr::REGION_ALARM_NAME)?;
    let region_alarm_name = RegionAlarmName::parse(&raw_key)
        .map_err(|e| StorageError::MalformedItem(e.to_string()))?;

    Ok(SubscriptionRecord {
        region_alarm_name,
        resource_arn: required_string(item, attr::RESOURCE_ARN)?,
        state_value: optional_string(item, attr::STATE_VALUE),
        namespace: optional_string(item, attr::NAMESPACE),
        state_updated: optional_number(item, attr::STATE_UPDATED)?,
        updated: optional_number(item, attr::UPDATED)?,
    })
}

fn required_string(item: &HashMap<String, AttributeValue>, name: &str) -> Result<String> {
    optional_string(item, name)
        .ok_or_else(|| StorageError::MalformedItem(format!("Missing string attribute '{}'", name)))
}

fn optional_string(item: &HashMap<String, AttributeValue>, name: &str) -> Option<String> {
    match item.get(name) {
        Some(AttributeValue::S(s)) => Some(s.clone()),
        _ => None,
    }
}

fn optional_number(item: &HashMap<String, AttributeValue>, name: &str) -> Result<Option<i64>> {
    match item.get(name) {
        Some(AttributeValue::N(n)) => n
            .parse::<i64>()
            .map(Some)
            .map_err(|_| StorageError::MalformedItem(format!("Attribute '{}' is not an integer: {}", name, n))),
        _ => Ok(None),
    }
}
