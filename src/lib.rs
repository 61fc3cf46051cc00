//! Alarm Registry - alarm subscription registry
//!
//! Links monitoring alarms to the resources that subscribe to them, applies
//! incoming alarm state-change notifications to every subscriber, and answers
//! paginated queries over subscriptions, pipeline events and live alarms.

pub mod config;
pub mod ingest;
pub mod model;
pub mod monitoring;
pub mod pagination;
pub mod params;
pub mod registry;
pub mod storage;
pub mod utils;

pub use ingest::{IngestError, IngestReport, NotificationBatch, NotificationIngestor};
pub use registry::{AlarmRegistry, RegistryError};
