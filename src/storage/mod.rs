//! Storage for alarm subscriptions and the pipeline event log.
//!
//! This module contains:
//! - `SubscriptionStore` trait: the alarm subscription table
//! - `EventLogStore` trait: read-only pipeline event log
//! - Implementations: DynamoDB, SQLite, in-memory mock

use std::sync::Arc;

use tracing::{error, info};

use crate::config::{StorageConfig, StorageType};

mod event_log_store;
pub mod helpers;
mod subscription_store;

#[cfg(feature = "dynamo")]
pub mod dynamo;
pub mod mock;
#[cfg(feature = "sqlite")]
pub mod schema;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use event_log_store::EventLogStore;
pub use subscription_store::SubscriptionStore;

#[cfg(feature = "dynamo")]
pub use dynamo::{DynamoEventLogStore, DynamoSubscriptionStore};
pub use mock::{MockEventLogStore, MockSubscriptionStore};
#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteEventLogStore, SqliteSubscriptionStore};

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("DynamoDB {operation} failed: {message}")]
    Dynamo { operation: &'static str, message: String },

    #[cfg(feature = "sqlite")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid page token: {0}")]
    InvalidPageToken(String),

    #[error("Malformed item: {0}")]
    MalformedItem(String),

    #[error("Injected failure: {0}")]
    Injected(String),

    #[error("Storage backend '{0}' is not enabled in this build")]
    NotEnabled(&'static str),
}

/// Subscription table and event log handles.
pub type Stores = (Arc<dyn SubscriptionStore>, Arc<dyn EventLogStore>);

/// Initialize storage based on configuration.
pub async fn init_storage(config: &StorageConfig) -> Result<Stores> {
    match config.storage_type {
        #[cfg(feature = "dynamo")]
        StorageType::Dynamo => {
            info!(
                alarms_table = %config.dynamo.alarms_table,
                events_table = %config.dynamo.events_table,
                "Storage: dynamo"
            );
            let client = dynamo::connect(&config.dynamo).await;
            let subscriptions = Arc::new(DynamoSubscriptionStore::new(
                client.clone(),
                config.dynamo.alarms_table.clone(),
            ));
            let events = Arc::new(DynamoEventLogStore::new(client, config.dynamo.events_table.clone()));
            Ok((subscriptions, events))
        }
        #[cfg(not(feature = "dynamo"))]
        StorageType::Dynamo => {
            error!("DynamoDB storage requested but 'dynamo' feature is not enabled");
            Err(StorageError::NotEnabled("dynamo"))
        }
        #[cfg(feature = "sqlite")]
        StorageType::Sqlite => {
            info!(path = %config.sqlite.path, "Storage: sqlite");
            if let Some(parent) = std::path::Path::new(&config.sqlite.path).parent() {
                std::fs::create_dir_all(parent)?;
            }

            let pool =
                sqlx::SqlitePool::connect(&format!("sqlite:{}?mode=rwc", config.sqlite.path)).await?;

            let subscriptions = SqliteSubscriptionStore::new(pool.clone(), config.sqlite.page_size);
            subscriptions.init().await?;

            let events = SqliteEventLogStore::new(pool, config.sqlite.page_size);
            events.init().await?;

            Ok((Arc::new(subscriptions), Arc::new(events)))
        }
        #[cfg(not(feature = "sqlite"))]
        StorageType::Sqlite => {
            error!("SQLite storage requested but 'sqlite' feature is not enabled");
            Err(StorageError::NotEnabled("sqlite"))
        }
        StorageType::Memory => {
            info!("Storage: memory");
            Ok((
                Arc::new(MockSubscriptionStore::new()),
                Arc::new(MockEventLogStore::new()),
            ))
        }
    }
}
