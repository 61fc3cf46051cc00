//! SQLite EventLogStore implementation.

use std::collections::BTreeMap;

use async_trait::async_trait;
use sea_query::{Expr, Order, Query, SqliteQueryBuilder};
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::model::EventRecord;
use crate::pagination::{Page, PageToken};
use crate::storage::helpers::{decode_key_token, encode_key_token, key_attr};
use crate::storage::schema::{PipelineEvents, CREATE_PIPELINE_EVENTS_TABLE};
use crate::storage::{EventLogStore, Result, StorageError};

const ALARM_STATE_ATTR: &str = "alarm_state";
const ID_KEY: &str = "id";

/// SQLite implementation of EventLogStore.
///
/// Events are stored as JSON text alongside their `alarm_state`.
pub struct SqliteEventLogStore {
    pool: SqlitePool,
    page_size: u32,
}

impl SqliteEventLogStore {
    pub fn new(pool: SqlitePool, page_size: u32) -> Self {
        Self {
            pool,
            page_size: page_size.max(1),
        }
    }

    /// Create the table and index if they don't exist.
    pub async fn init(&self) -> Result<()> {
        sqlx::query(CREATE_PIPELINE_EVENTS_TABLE)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Append an event. The event must carry a string `alarm_state`.
    pub async fn append(&self, event: &EventRecord) -> Result<()> {
        let alarm_state = event
            .get(ALARM_STATE_ATTR)
            .and_then(|v| v.as_str())
            .ok_or_else(|| StorageError::MalformedItem("Event has no string 'alarm_state'".to_string()))?
            .to_string();
        let event_data = serde_json::to_string(event)
            .map_err(|e| StorageError::MalformedItem(e.to_string()))?;

        let query = Query::insert()
            .into_table(PipelineEvents::Table)
            .columns([PipelineEvents::AlarmState, PipelineEvents::EventData])
            .values_panic([alarm_state.into(), event_data.into()])
            .to_string(SqliteQueryBuilder);

        sqlx::query(&query).execute(&self.pool).await?;
        Ok(())
    }

    fn select_sql(&self, alarm_state: &str, start: Option<PageToken>) -> Result<String> {
        let after_id = match start {
            Some(token) => {
                let key = decode_key_token(&token)?;
                key_attr(&key, ID_KEY)?
                    .parse::<i64>()
                    .map_err(|_| StorageError::InvalidPageToken(token.into_inner()))?
            }
            None => 0,
        };

        Ok(Query::select()
            .columns([PipelineEvents::Id, PipelineEvents::EventData])
            .from(PipelineEvents::Table)
            .and_where(Expr::col(PipelineEvents::AlarmState).eq(alarm_state))
            .and_where(Expr::col(PipelineEvents::Id).gt(after_id))
            .order_by(PipelineEvents::Id, Order::Asc)
            .limit(u64::from(self.page_size))
            .to_string(SqliteQueryBuilder))
    }
}

#[async_trait]
impl EventLogStore for SqliteEventLogStore {
    async fn query_by_alarm_state(
        &self,
        alarm_state: &str,
        start: Option<PageToken>,
    ) -> Result<Page<EventRecord>> {
        let query = self.select_sql(alarm_state, start)?;
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;

        let mut items = Vec::with_capacity(rows.len());
        let mut last_id = None;
        for row in &rows {
            let id: i64 = row.try_get("id")?;
            let event_data: String = row.try_get("event_data")?;
            let event: EventRecord = serde_json::from_str(&event_data)
                .map_err(|e| StorageError::MalformedItem(format!("Event {}: {}", id, e)))?;
            items.push(event);
            last_id = Some(id);
        }

        let next = match last_id {
            Some(id) if items.len() as u64 == u64::from(self.page_size) => {
                let mut key = BTreeMap::new();
                key.insert(ID_KEY.to_string(), id.to_string());
                Some(encode_key_token(&key)?)
            }
            _ => None,
        };

        debug!(alarm_state, count = items.len(), "Queried event log");
        Ok(Page::with_next(items, next))
    }
}
