//! Mock SubscriptionStore implementation for testing.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{page_of, DEFAULT_PAGE_SIZE};
use crate::model::{RegionAlarmName, SubscriptionKey, SubscriptionRecord};
use crate::pagination::{Page, PageToken};
use crate::storage::{Result, StorageError, SubscriptionStore};

/// Mock subscription store that keeps records in memory.
pub struct MockSubscriptionStore {
    records: RwLock<BTreeMap<SubscriptionKey, SubscriptionRecord>>,
    page_size: usize,
    fail_on_query: RwLock<bool>,
    fail_on_resource: RwLock<Option<String>>,
    puts: AtomicUsize,
    deletes: AtomicUsize,
}

impl Default for MockSubscriptionStore {
    fn default() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }
}

impl MockSubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
            page_size,
            fail_on_query: RwLock::new(false),
            fail_on_resource: RwLock::new(None),
            puts: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
        }
    }

    /// Make every query and scan fail.
    pub async fn set_fail_on_query(&self, fail: bool) {
        *self.fail_on_query.write().await = fail;
    }

    /// Make puts and deletes for one resource fail.
    pub async fn set_fail_on_resource(&self, resource_arn: Option<&str>) {
        *self.fail_on_resource.write().await = resource_arn.map(str::to_string);
    }

    /// Insert a record directly, bypassing failure injection and counters.
    pub async fn seed(&self, record: SubscriptionRecord) {
        self.records.write().await.insert(record.key(), record);
    }

    pub async fn get(&self, key: &SubscriptionKey) -> Option<SubscriptionRecord> {
        self.records.read().await.get(key).cloned()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Successful puts since creation.
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    /// Successful deletes since creation.
    pub fn delete_count(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    async fn check_write(&self, resource_arn: &str) -> Result<()> {
        if self.fail_on_resource.read().await.as_deref() == Some(resource_arn) {
            return Err(StorageError::Injected(format!("write to {}", resource_arn)));
        }
        Ok(())
    }

    async fn select<P>(&self, start: Option<PageToken>, predicate: P) -> Result<Page<SubscriptionRecord>>
    where
        P: Fn(&SubscriptionRecord) -> bool,
    {
        if *self.fail_on_query.read().await {
            return Err(StorageError::Injected("query".to_string()));
        }
        let matching: Vec<SubscriptionRecord> = self
            .records
            .read()
            .await
            .values()
            .filter(|&r| predicate(r))
            .cloned()
            .collect();
        page_of(matching, start, self.page_size)
    }
}

#[async_trait]
impl SubscriptionStore for MockSubscriptionStore {
    async fn put(&self, record: &SubscriptionRecord) -> Result<()> {
        self.check_write(&record.resource_arn).await?;
        self.records.write().await.insert(record.key(), record.clone());
        self.puts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete(&self, key: &SubscriptionKey) -> Result<()> {
        self.check_write(&key.resource_arn).await?;
        self.records.write().await.remove(key);
        self.deletes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn query_by_region_alarm_name(
        &self,
        region_alarm_name: &RegionAlarmName,
        start: Option<PageToken>,
    ) -> Result<Page<SubscriptionRecord>> {
        self.select(start, |r| &r.region_alarm_name == region_alarm_name).await
    }

    async fn query_by_resource(
        &self,
        resource_arn: &str,
        start: Option<PageToken>,
    ) -> Result<Page<SubscriptionRecord>> {
        self.select(start, |r| r.resource_arn == resource_arn).await
    }

    async fn query_by_state(
        &self,
        state_value: &str,
        start: Option<PageToken>,
    ) -> Result<Page<SubscriptionRecord>> {
        self.select(start, |r| r.state_value.as_deref() == Some(state_value)).await
    }

    async fn scan(&self, start: Option<PageToken>) -> Result<Page<SubscriptionRecord>> {
        self.select(start, |_| true).await
    }
}
