//! DynamoDB storage implementations.
//!
//! Alarm table schema:
//! - PK: `RegionAlarmName` (String), SK: `ResourceArn` (String)
//! - `ResourceArnIndex`, `RegionAlarmNameIndex`, `StateValueIndex` (GSIs)
//!
//! Events table: queried through `AlarmStateIndex` on `alarm_state`.
//!
//! Continuation tokens wrap DynamoDB's `LastEvaluatedKey`.

mod event_log_store;
mod subscription_store;

pub use event_log_store::DynamoEventLogStore;
pub use subscription_store::DynamoSubscriptionStore;

use std::collections::{BTreeMap, HashMap};

use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use tracing::info;

use crate::config::DynamoConfig;
use crate::pagination::PageToken;
use crate::storage::helpers::{decode_key_token, encode_key_token};
use crate::storage::{Result, StorageError};

/// Build a DynamoDB client from the default provider chain plus overrides.
pub async fn connect(config: &DynamoConfig) -> Client {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(ref region) = config.region {
        loader = loader.region(aws_config::Region::new(region.clone()));
    }
    let sdk_config = loader.load().await;

    let client = if let Some(ref endpoint) = config.endpoint_url {
        let dynamo_config = aws_sdk_dynamodb::config::Builder::from(&sdk_config)
            .endpoint_url(endpoint)
            .build();
        Client::from_conf(dynamo_config)
    } else {
        Client::new(&sdk_config)
    };

    info!(region = ?config.region, endpoint = ?config.endpoint_url, "Connected to DynamoDB");
    client
}

/// Map an SDK error into a storage error, keeping the full error chain.
fn sdk_error<E>(operation: &'static str, err: E) -> StorageError
where
    E: std::error::Error,
{
    StorageError::Dynamo {
        operation,
        message: aws_sdk_dynamodb::error::DisplayErrorContext(err).to_string(),
    }
}

/// Turn a `LastEvaluatedKey` into an opaque page token.
///
/// Key attributes are strings or numbers; each value is tagged with its type.
fn last_key_to_token(key: Option<&HashMap<String, AttributeValue>>) -> Result<Option<PageToken>> {
    let Some(key) = key else {
        return Ok(None);
    };
    if key.is_empty() {
        return Ok(None);
    }

    let mut tagged = BTreeMap::new();
    for (name, value) in key {
        let encoded = match value {
            AttributeValue::S(s) => format!("S:{}", s),
            AttributeValue::N(n) => format!("N:{}", n),
            other => {
                return Err(StorageError::MalformedItem(format!(
                    "Unsupported key attribute type for '{}': {:?}",
                    name, other
                )))
            }
        };
        tagged.insert(name.clone(), encoded);
    }
    encode_key_token(&tagged).map(Some)
}

/// Turn a page token back into an `ExclusiveStartKey`.
fn token_to_start_key(token: Option<PageToken>) -> Result<Option<HashMap<String, AttributeValue>>> {
    let Some(token) = token else {
        return Ok(None);
    };

    let tagged = decode_key_token(&token)?;
    let mut key = HashMap::with_capacity(tagged.len());
    for (name, encoded) in tagged {
        let value = match encoded.split_once(':') {
            Some(("S", s)) => AttributeValue::S(s.to_string()),
            Some(("N", n)) => AttributeValue::N(n.to_string()),
            _ => {
                return Err(StorageError::InvalidPageToken(format!(
                    "Bad key attribute '{}'",
                    name
                )))
            }
        };
        key.insert(name, value);
    }
    Ok(Some(key))
}
