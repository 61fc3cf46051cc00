//! Shared storage integration tests.
//!
//! Tests the SubscriptionStore and EventLogStore interfaces against all
//! implementations. Each implementation module imports these test functions
//! and runs them.

pub mod event_log_store_tests;
pub mod subscription_store_tests;
