//! Database schema definitions using sea-query.
//!
//! These define the table and column identifiers for type-safe query building.

use sea_query::Iden;

/// Subscriptions table schema.
#[derive(Iden)]
pub enum Subscriptions {
    Table,
    #[iden = "region_alarm_name"]
    RegionAlarmName,
    #[iden = "resource_arn"]
    ResourceArn,
    #[iden = "state_value"]
    StateValue,
    #[iden = "namespace"]
    Namespace,
    #[iden = "state_updated"]
    StateUpdated,
    #[iden = "updated"]
    Updated,
}

/// Pipeline event log schema.
#[derive(Iden)]
pub enum PipelineEvents {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "alarm_state"]
    AlarmState,
    #[iden = "event_data"]
    EventData,
}

/// SQL for creating the subscriptions table.
pub const CREATE_SUBSCRIPTIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS subscriptions (
    region_alarm_name TEXT NOT NULL,
    resource_arn TEXT NOT NULL,
    state_value TEXT,
    namespace TEXT,
    state_updated INTEGER,
    updated INTEGER,
    PRIMARY KEY (region_alarm_name, resource_arn)
);

CREATE INDEX IF NOT EXISTS idx_subscriptions_resource_arn ON subscriptions(resource_arn);
CREATE INDEX IF NOT EXISTS idx_subscriptions_state_value ON subscriptions(state_value);
"#;

/// SQL for creating the pipeline event log table.
pub const CREATE_PIPELINE_EVENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS pipeline_events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    alarm_state TEXT NOT NULL,
    event_data TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_pipeline_events_alarm_state ON pipeline_events(alarm_state);
"#;
