//! DynamoDB EventLogStore implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use serde_json::{Map, Value};
use tracing::{debug, error};

use super::{last_key_to_token, sdk_error, token_to_start_key};
use crate::model::EventRecord;
use crate::pagination::{Page, PageToken};
use crate::storage::{EventLogStore, Result};

const ALARM_STATE_INDEX: &str = "AlarmStateIndex";
const ALARM_STATE_ATTR: &str = "alarm_state";

/// DynamoDB implementation of EventLogStore.
pub struct DynamoEventLogStore {
    client: Client,
    table_name: String,
}

impl DynamoEventLogStore {
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }
}

#[async_trait]
impl EventLogStore for DynamoEventLogStore {
    async fn query_by_alarm_state(
        &self,
        alarm_state: &str,
        start: Option<PageToken>,
    ) -> Result<Page<EventRecord>> {
        let output = self
            .client
            .query()
            .table_name(&self.table_name)
            .index_name(ALARM_STATE_INDEX)
            .key_condition_expression("#k = :v")
            .expression_attribute_names("#k", ALARM_STATE_ATTR)
            .expression_attribute_values(":v", AttributeValue::S(alarm_state.to_string()))
            .set_exclusive_start_key(token_to_start_key(start)?)
            .send()
            .await
            .map_err(|e| {
                error!(table = %self.table_name, alarm_state, "DynamoDB query failed");
                sdk_error("query", e)
            })?;

        let items: Vec<EventRecord> = output.items().iter().map(item_to_event).collect();
        let next = last_key_to_token(output.last_evaluated_key())?;

        debug!(table = %self.table_name, alarm_state, count = items.len(), "Queried event log");
        Ok(Page::with_next(items, next))
    }
}

fn item_to_event(item: &HashMap<String, AttributeValue>) -> EventRecord {
    EventRecord(
        item.iter()
            .map(|(name, value)| (name.clone(), attribute_to_json(value)))
            .collect(),
    )
}

/// Convert a DynamoDB attribute into plain JSON. Binary values have no JSON
/// form and become `null`.
fn attribute_to_json(value: &AttributeValue) -> Value {
    match value {
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::N(n) => number_to_json(n),
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::M(m) => Value::Object(
            m.iter()
                .map(|(k, v)| (k.clone(), attribute_to_json(v)))
                .collect::<Map<String, Value>>(),
        ),
        AttributeValue::L(l) => Value::Array(l.iter().map(attribute_to_json).collect()),
        AttributeValue::Ss(ss) => Value::Array(ss.iter().cloned().map(Value::String).collect()),
        AttributeValue::Ns(ns) => Value::Array(ns.iter().map(|n| number_to_json(n)).collect()),
        _ => Value::Null,
    }
}

fn number_to_json(n: &str) -> Value {
    if let Ok(i) = n.parse::<i64>() {
        return Value::from(i);
    }
    match n.parse::<f64>() {
        Ok(f) => Value::from(f),
        Err(_) => Value::String(n.to_string()),
    }
}
