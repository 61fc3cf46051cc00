//! CloudWatch alarm source.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_cloudwatch::types::MetricAlarm;
use aws_sdk_cloudwatch::Client;
use tracing::{debug, error};

use super::{AlarmSource, MonitoringError, RawAlarm, Result};
use crate::pagination::{Page, PageToken};

/// Describes metric alarms through the CloudWatch API.
///
/// A client is built per call for the requested region from one shared SDK
/// configuration.
pub struct CloudWatchAlarmSource {
    sdk_config: SdkConfig,
    endpoint_url: Option<String>,
}

impl CloudWatchAlarmSource {
    /// Load the default provider chain once.
    pub async fn connect(endpoint_url: Option<String>) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        Self {
            sdk_config,
            endpoint_url,
        }
    }

    fn client_for(&self, region: &str) -> Client {
        let mut builder = aws_sdk_cloudwatch::config::Builder::from(&self.sdk_config)
            .region(aws_config::Region::new(region.to_string()));
        if let Some(ref endpoint) = self.endpoint_url {
            builder = builder.endpoint_url(endpoint);
        }
        Client::from_conf(builder.build())
    }
}

#[async_trait]
impl AlarmSource for CloudWatchAlarmSource {
    async fn describe_alarms(&self, region: &str, start: Option<PageToken>) -> Result<Page<RawAlarm>> {
        let output = self
            .client_for(region)
            .describe_alarms()
            .set_next_token(start.map(PageToken::into_inner))
            .send()
            .await
            .map_err(|e| {
                let message = aws_sdk_cloudwatch::error::DisplayErrorContext(e).to_string();
                error!(region, error = %message, "CloudWatch DescribeAlarms failed");
                MonitoringError::Service(message)
            })?;

        let alarms: Vec<RawAlarm> = output.metric_alarms().iter().map(to_raw_alarm).collect();
        let next = output.next_token().map(PageToken::new);

        debug!(region, count = alarms.len(), "Described alarms");
        Ok(Page::with_next(alarms, next))
    }
}

fn to_raw_alarm(alarm: &MetricAlarm) -> RawAlarm {
    RawAlarm {
        alarm_arn: alarm.alarm_arn().map(str::to_string),
        alarm_name: alarm.alarm_name().map(str::to_string),
        metric_name: alarm.metric_name().map(str::to_string),
        namespace: alarm.namespace().map(str::to_string),
        state_value: alarm.state_value().map(|s| s.as_str().to_string()),
        state_updated: alarm.state_updated_timestamp().map(|t| t.secs()),
    }
}
