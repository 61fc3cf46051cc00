//! Read-only access to the monitoring service's alarm definitions.
//!
//! - `AlarmSource` trait: paginated `describe_alarms` per region
//! - Implementations: CloudWatch, in-memory mock

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};

use crate::config::{MonitoringConfig, MonitoringType};
use crate::pagination::{Page, PageToken};

#[cfg(feature = "cloudwatch")]
pub mod cloudwatch;
pub mod mock;

#[cfg(feature = "cloudwatch")]
pub use cloudwatch::CloudWatchAlarmSource;
pub use mock::MockAlarmSource;

/// Result type for monitoring operations.
pub type Result<T> = std::result::Result<T, MonitoringError>;

/// Errors from the monitoring service.
#[derive(Debug, thiserror::Error)]
pub enum MonitoringError {
    #[error("Monitoring service error: {0}")]
    Service(String),

    #[error("Malformed alarm: {0}")]
    MalformedAlarm(String),

    #[error("Injected failure: {0}")]
    Injected(String),

    #[error("Monitoring backend '{0}' is not enabled in this build")]
    NotEnabled(&'static str),
}

/// An alarm as the monitoring service describes it.
///
/// Every field is optional on the wire; the registry decides which ones it
/// requires.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawAlarm {
    pub alarm_arn: Option<String>,
    pub alarm_name: Option<String>,
    pub metric_name: Option<String>,
    pub namespace: Option<String>,
    pub state_value: Option<String>,
    /// Epoch seconds of the last state transition.
    pub state_updated: Option<i64>,
}

/// Source of alarm definitions, one region at a time.
#[async_trait]
pub trait AlarmSource: Send + Sync {
    /// Describe one page of the alarms defined in `region`.
    async fn describe_alarms(&self, region: &str, start: Option<PageToken>) -> Result<Page<RawAlarm>>;
}

/// Initialize the alarm source based on configuration.
pub async fn init_monitoring(config: &MonitoringConfig) -> Result<Arc<dyn AlarmSource>> {
    match config.monitoring_type {
        #[cfg(feature = "cloudwatch")]
        MonitoringType::Cloudwatch => {
            info!(endpoint = ?config.endpoint_url, "Monitoring: cloudwatch");
            Ok(Arc::new(CloudWatchAlarmSource::connect(config.endpoint_url.clone()).await))
        }
        #[cfg(not(feature = "cloudwatch"))]
        MonitoringType::Cloudwatch => {
            error!("CloudWatch monitoring requested but 'cloudwatch' feature is not enabled");
            Err(MonitoringError::NotEnabled("cloudwatch"))
        }
        MonitoringType::Mock => {
            info!("Monitoring: mock");
            Ok(Arc::new(MockAlarmSource::new()))
        }
    }
}
