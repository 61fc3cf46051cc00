//! SQLite implementations of storage interfaces.
//!
//! Pages are keyset-paginated: the token is the last row's key and the next
//! page resumes strictly after it.

mod event_log_store;
mod subscription_store;

pub use event_log_store::SqliteEventLogStore;
pub use subscription_store::SqliteSubscriptionStore;

/// Default number of rows per page.
pub const DEFAULT_PAGE_SIZE: u32 = 100;
