//! Mock AlarmSource implementation for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{AlarmSource, MonitoringError, RawAlarm, Result};
use crate::pagination::{Page, PageToken};

/// In-memory alarms keyed by region.
pub struct MockAlarmSource {
    alarms: RwLock<HashMap<String, Vec<RawAlarm>>>,
    page_size: usize,
    fail_on_describe: RwLock<bool>,
    fail_after: RwLock<Option<usize>>,
    calls: AtomicUsize,
}

impl Default for MockAlarmSource {
    fn default() -> Self {
        Self::with_page_size(50)
    }
}

impl MockAlarmSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            alarms: RwLock::new(HashMap::new()),
            page_size: page_size.max(1),
            fail_on_describe: RwLock::new(false),
            fail_after: RwLock::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub async fn add_alarm(&self, region: &str, alarm: RawAlarm) {
        self.alarms
            .write()
            .await
            .entry(region.to_string())
            .or_default()
            .push(alarm);
    }

    pub async fn set_fail_on_describe(&self, fail: bool) {
        *self.fail_on_describe.write().await = fail;
    }

    /// Let the first `calls` describe calls succeed and fail every later one.
    pub async fn set_fail_after(&self, calls: Option<usize>) {
        *self.fail_after.write().await = calls;
    }

    /// Number of describe calls, failed ones included.
    pub fn describe_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AlarmSource for MockAlarmSource {
    async fn describe_alarms(&self, region: &str, start: Option<PageToken>) -> Result<Page<RawAlarm>> {
        let previous = self.calls.fetch_add(1, Ordering::SeqCst);
        let exhausted = matches!(*self.fail_after.read().await, Some(limit) if previous >= limit);
        if exhausted || *self.fail_on_describe.read().await {
            return Err(MonitoringError::Injected("describe_alarms".to_string()));
        }

        let offset = match start {
            Some(token) => token
                .as_str()
                .parse::<usize>()
                .map_err(|_| MonitoringError::Service(format!("Invalid token: {}", token.as_str())))?,
            None => 0,
        };

        let alarms = self.alarms.read().await;
        let all = alarms.get(region).map(Vec::as_slice).unwrap_or_default();
        let end = offset.saturating_add(self.page_size).min(all.len());
        let items = all.get(offset..end).map(<[RawAlarm]>::to_vec).unwrap_or_default();
        let next = (end < all.len()).then(|| PageToken::new(end.to_string()));

        Ok(Page::with_next(items, next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alarm(name: &str) -> RawAlarm {
        RawAlarm {
            alarm_name: Some(name.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_pages_per_region() {
        let source = MockAlarmSource::with_page_size(2);
        for name in ["a", "b", "c"] {
            source.add_alarm("us-east-1", alarm(name)).await;
        }
        source.add_alarm("eu-west-1", alarm("d")).await;

        let first = source.describe_alarms("us-east-1", None).await.unwrap();
        assert_eq!(first.items.len(), 2);
        let second = source.describe_alarms("us-east-1", first.next).await.unwrap();
        assert_eq!(second.items, vec![alarm("c")]);
        assert!(second.next.is_none());

        let other = source.describe_alarms("eu-west-1", None).await.unwrap();
        assert_eq!(other.items, vec![alarm("d")]);
    }

    #[tokio::test]
    async fn test_unknown_region_is_empty() {
        let source = MockAlarmSource::new();
        let page = source.describe_alarms("ap-south-1", None).await.unwrap();
        assert!(page.items.is_empty());
        assert!(page.next.is_none());
    }

    #[tokio::test]
    async fn test_fail_on_describe() {
        let source = MockAlarmSource::new();
        source.set_fail_on_describe(true).await;
        assert!(matches!(
            source.describe_alarms("us-east-1", None).await,
            Err(MonitoringError::Injected(_))
        ));
        assert_eq!(source.describe_count(), 1);
    }

    #[tokio::test]
    async fn test_fail_after_lets_first_calls_through() {
        let source = MockAlarmSource::with_page_size(1);
        source.add_alarm("us-east-1", alarm("a")).await;
        source.add_alarm("us-east-1", alarm("b")).await;
        source.set_fail_after(Some(1)).await;

        let first = source.describe_alarms("us-east-1", None).await.unwrap();
        assert!(matches!(
            source.describe_alarms("us-east-1", first.next).await,
            Err(MonitoringError::Injected(_))
        ));
    }

    #[tokio::test]
    async fn test_huge_offset_token_is_empty_page() {
        let source = MockAlarmSource::with_page_size(2);
        source.add_alarm("us-east-1", alarm("a")).await;

        let token = PageToken::new(usize::MAX.to_string());
        let page = source.describe_alarms("us-east-1", Some(token)).await.unwrap();
        assert!(page.items.is_empty());
        assert!(page.next.is_none());
    }
}
