//! Mock EventLogStore implementation for testing.

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{page_of, DEFAULT_PAGE_SIZE};
use crate::model::EventRecord;
use crate::pagination::{Page, PageToken};
use crate::storage::{EventLogStore, Result, StorageError};

/// Attribute the event log is indexed by.
const ALARM_STATE_ATTR: &str = "alarm_state";

/// Mock event log that keeps events in memory.
pub struct MockEventLogStore {
    events: RwLock<Vec<EventRecord>>,
    page_size: usize,
    fail_on_query: RwLock<bool>,
}

impl Default for MockEventLogStore {
    fn default() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }
}

impl MockEventLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            events: RwLock::new(Vec::new()),
            page_size,
            fail_on_query: RwLock::new(false),
        }
    }

    pub async fn set_fail_on_query(&self, fail: bool) {
        *self.fail_on_query.write().await = fail;
    }

    /// Append an event to the log.
    pub async fn append(&self, event: EventRecord) {
        self.events.write().await.push(event);
    }
}

#[async_trait]
impl EventLogStore for MockEventLogStore {
    async fn query_by_alarm_state(
        &self,
        alarm_state: &str,
        start: Option<PageToken>,
    ) -> Result<Page<EventRecord>> {
        if *self.fail_on_query.read().await {
            return Err(StorageError::Injected("query".to_string()));
        }
        let matching: Vec<EventRecord> = self
            .events
            .read()
            .await
            .iter()
            .filter(|e| e.get(ALARM_STATE_ATTR).and_then(|v| v.as_str()) == Some(alarm_state))
            .cloned()
            .collect();
        page_of(matching, start, self.page_size)
    }
}
