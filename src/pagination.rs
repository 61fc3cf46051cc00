//! Continuation-token pagination.
//!
//! Every list operation against the alarm table, the event log and the
//! monitoring service goes through [`for_each_page`]: issue the request, hand
//! each item to one visitor, repeat with the returned token until the backend
//! stops returning one.

use std::future::Future;

use tracing::debug;

/// Opaque continuation token returned by a backend.
///
/// Only the backend that issued a token knows how to interpret it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageToken(String);

impl PageToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// One page of results plus the token for the next page, if any.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next: Option<PageToken>,
}

impl<T> Page<T> {
    /// A page with no continuation.
    pub fn last(items: Vec<T>) -> Self {
        Self { items, next: None }
    }

    pub fn with_next(items: Vec<T>, next: Option<PageToken>) -> Self {
        Self { items, next }
    }
}

/// Drive `fetch` until the backend returns no continuation token.
///
/// `fetch` receives `None` for the first request and the previous page's
/// token afterwards; every item of every page is passed to `visit`. The first
/// error stops the loop and is returned as-is.
pub async fn for_each_page<T, E, F, Fut, V>(mut fetch: F, mut visit: V) -> Result<(), E>
where
    F: FnMut(Option<PageToken>) -> Fut,
    Fut: Future<Output = Result<Page<T>, E>>,
    V: FnMut(T),
{
    let mut token = None;
    let mut pages = 0usize;

    loop {
        let page = fetch(token.take()).await?;
        pages += 1;
        debug!(page = pages, items = page.items.len(), more = page.next.is_some(), "Fetched page");

        for item in page.items {
            visit(item);
        }

        match page.next {
            Some(next) => token = Some(next),
            None => return Ok(()),
        }
    }
}
