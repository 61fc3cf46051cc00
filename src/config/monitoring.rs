//! Monitoring backend configuration.

use serde::Deserialize;

/// Monitoring backend discriminator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitoringType {
    #[default]
    Cloudwatch,
    /// Empty in-process alarm source.
    Mock,
}

/// Monitoring configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    #[serde(rename = "type")]
    pub monitoring_type: MonitoringType,
    /// Endpoint override applied to every regional client.
    pub endpoint_url: Option<String>,
}
