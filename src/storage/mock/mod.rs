//! Mock storage implementations for testing.
//!
//! Both stores keep everything in memory, hand out results in pages of a
//! configurable size and can be told to fail.

mod event_log_store;
mod subscription_store;

pub use event_log_store::MockEventLogStore;
pub use subscription_store::MockSubscriptionStore;

use crate::pagination::{Page, PageToken};
use crate::storage::{Result, StorageError};

/// Default number of items per mock page.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Slice one page out of a fully materialized result.
///
/// The token is the offset of the next item.
fn page_of<T>(items: Vec<T>, start: Option<PageToken>, page_size: usize) -> Result<Page<T>> {
    let offset = match start {
        Some(token) => token
            .as_str()
            .parse::<usize>()
            .map_err(|_| StorageError::InvalidPageToken(token.into_inner()))?,
        None => 0,
    };

    let total = items.len();
    let end = offset.saturating_add(page_size.max(1)).min(total);
    let next = (end < total).then(|| PageToken::new(end.to_string()));
    let page: Vec<T> = items.into_iter().skip(offset).take(end.saturating_sub(offset)).collect();

    Ok(Page::with_next(page, next))
}
