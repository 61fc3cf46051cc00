//! Storage configuration types.

use serde::Deserialize;

/// Storage type discriminator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    #[default]
    Dynamo,
    Sqlite,
    /// In-process maps. Nothing survives a restart.
    Memory,
}

/// Storage configuration (discriminated union).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage type discriminator.
    #[serde(rename = "type")]
    pub storage_type: StorageType,
    /// DynamoDB-specific configuration.
    pub dynamo: DynamoConfig,
    /// SQLite-specific configuration.
    pub sqlite: SqliteConfig,
}

/// DynamoDB-specific configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DynamoConfig {
    /// Subscription table name.
    pub alarms_table: String,
    /// Pipeline event log table name.
    pub events_table: String,
    /// Region override. Falls back to the SDK's provider chain.
    pub region: Option<String>,
    /// Endpoint override, e.g. DynamoDB Local.
    pub endpoint_url: Option<String>,
}

impl Default for DynamoConfig {
    fn default() -> Self {
        Self {
            alarms_table: "alarm-subscriptions".to_string(),
            events_table: "pipeline-events".to_string(),
            region: None,
            endpoint_url: None,
        }
    }
}

/// SQLite-specific configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SqliteConfig {
    /// Path to database file.
    pub path: String,
    /// Rows per page for paginated queries.
    pub page_size: u32,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: "./data/alarms.db".to_string(),
            page_size: 100,
        }
    }
}
