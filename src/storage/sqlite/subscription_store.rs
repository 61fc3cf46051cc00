//! SQLite SubscriptionStore implementation.

use std::collections::BTreeMap;

use async_trait::async_trait;
use sea_query::{Cond, Expr, OnConflict, Order, Query, SqliteQueryBuilder};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::model::{attr, RegionAlarmName, SubscriptionKey, SubscriptionRecord};
use crate::pagination::{Page, PageToken};
use crate::storage::helpers::{decode_key_token, encode_key_token, key_attr};
use crate::storage::schema::{Subscriptions, CREATE_SUBSCRIPTIONS_TABLE};
use crate::storage::{Result, StorageError, SubscriptionStore};

/// SQLite implementation of SubscriptionStore.
pub struct SqliteSubscriptionStore {
    pool: SqlitePool,
    page_size: u32,
}

impl SqliteSubscriptionStore {
    /// Create a new SQLite subscription store.
    pub fn new(pool: SqlitePool, page_size: u32) -> Self {
        Self {
            pool,
            page_size: page_size.max(1),
        }
    }

    /// Create the table and indexes if they don't exist.
    pub async fn init(&self) -> Result<()> {
        sqlx::query(CREATE_SUBSCRIPTIONS_TABLE)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Build the SELECT for one page, optionally restricted to `column = value`.
    fn select_sql(&self, filter: Option<(Subscriptions, &str)>, start: Option<PageToken>) -> Result<String> {
        let mut cond = Cond::all();
        if let Some((column, value)) = filter {
            cond = cond.add(Expr::col(column).eq(value));
        }
        if let Some(token) = start {
            let key = decode_key_token(&token)?;
            let region_alarm_name = key_attr(&key, attr::REGION_ALARM_NAME)?.to_string();
            let resource_arn = key_attr(&key, attr::RESOURCE_ARN)?.to_string();
            cond = cond.add(
                Cond::any()
                    .add(Expr::col(Subscriptions::RegionAlarmName).gt(region_alarm_name.clone()))
                    .add(
                        Cond::all()
                            .add(Expr::col(Subscriptions::RegionAlarmName).eq(region_alarm_name))
                            .add(Expr::col(Subscriptions::ResourceArn).gt(resource_arn)),
                    ),
            );
        }

        Ok(Query::select()
            .columns([
                Subscriptions::RegionAlarmName,
                Subscriptions::ResourceArn,
                Subscriptions::StateValue,
                Subscriptions::Namespace,
                Subscriptions::StateUpdated,
                Subscriptions::Updated,
            ])
            .from(Subscriptions::Table)
            .cond_where(cond)
            .order_by(Subscriptions::RegionAlarmName, Order::Asc)
            .order_by(Subscriptions::ResourceArn, Order::Asc)
            .limit(u64::from(self.page_size))
            .to_string(SqliteQueryBuilder))
    }

    /// Fetch one page, optionally restricted to `column = value`.
    async fn select_page(
        &self,
        filter: Option<(Subscriptions, &str)>,
        start: Option<PageToken>,
    ) -> Result<Page<SubscriptionRecord>> {
        let query = self.select_sql(filter, start)?;
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        let items = rows.iter().map(row_to_record).collect::<Result<Vec<_>>>()?;

        let next = match items.last() {
            Some(last) if items.len() as u64 == u64::from(self.page_size) => {
                let mut key = BTreeMap::new();
                key.insert(
                    attr::REGION_ALARM_NAME.to_string(),
                    last.region_alarm_name.to_string(),
                );
                key.insert(attr::RESOURCE_ARN.to_string(), last.resource_arn.clone());
                Some(encode_key_token(&key)?)
            }
            _ => None,
        };

        debug!(count = items.len(), more = next.is_some(), "Selected subscriptions page");
        Ok(Page::with_next(items, next))
    }
}

#[async_trait]
impl SubscriptionStore for SqliteSubscriptionStore {
    async fn put(&self, record: &SubscriptionRecord) -> Result<()> {
        let query = Query::insert()
            .into_table(Subscriptions::Table)
            .columns([
                Subscriptions::RegionAlarmName,
                Subscriptions::ResourceArn,
                Subscriptions::StateValue,
                Subscriptions::Namespace,
                Subscriptions::StateUpdated,
                Subscriptions::Updated,
            ])
            .values_panic([
                record.region_alarm_name.to_string().into(),
                record.resource_arn.clone().into(),
                record.state_value.clone().into(),
                record.namespace.clone().into(),
                record.state_updated.into(),
                record.updated.into(),
            ])
            .on_conflict(
                OnConflict::columns([Subscriptions::RegionAlarmName, Subscriptions::ResourceArn])
                    .update_columns([
                        Subscriptions::StateValue,
                        Subscriptions::Namespace,
                        Subscriptions::StateUpdated,
                        Subscriptions::Updated,
                    ])
                    .to_owned(),
            )
            .to_string(SqliteQueryBuilder);

        sqlx::query(&query).execute(&self.pool).await?;

        debug!(
            region_alarm_name = %record.region_alarm_name,
            resource_arn = %record.resource_arn,
            "Stored subscription in SQLite"
        );
        Ok(())
    }

    async fn delete(&self, key: &SubscriptionKey) -> Result<()> {
        let query = Query::delete()
            .from_table(Subscriptions::Table)
            .and_where(Expr::col(Subscriptions::RegionAlarmName).eq(key.region_alarm_name.as_str()))
            .and_where(Expr::col(Subscriptions::ResourceArn).eq(key.resource_arn.as_str()))
            .to_string(SqliteQueryBuilder);

        sqlx::query(&query).execute(&self.pool).await?;
        Ok(())
    }

    async fn query_by_region_alarm_name(
        &self,
        region_alarm_name: &RegionAlarmName,
        start: Option<PageToken>,
    ) -> Result<Page<SubscriptionRecord>> {
        self.select_page(
            Some((Subscriptions::RegionAlarmName, region_alarm_name.as_str())),
            start,
        )
        .await
    }

    async fn query_by_resource(
        &self,
        resource_arn: &str,
        start: Option<PageToken>,
    ) -> Result<Page<SubscriptionRecord>> {
        self.select_page(Some((Subscriptions::ResourceArn, resource_arn)), start)
            .await
    }

    async fn query_by_state(
        &self,
        state_value: &str,
        start: Option<PageToken>,
    ) -> Result<Page<SubscriptionRecord>> {
        self.select_page(Some((Subscriptions::StateValue, state_value)), start)
            .await
    }

    async fn scan(&self, start: Option<PageToken>) -> Result<Page<SubscriptionRecord>> {
        self.select_page(None, start).await
    }
}

fn row_to_record(row: &SqliteRow) -> Result<SubscriptionRecord> {
    let raw_key: String = row.try_get("region_alarm_name")?;
    let region_alarm_name = RegionAlarmName::parse(&raw_key)
        .map_err(|e| StorageError::MalformedItem(e.to_string()))?;

    Ok(SubscriptionRecord {
        region_alarm_name,
        resource_arn: row.try_get("resource_arn")?,
        state_value: row.try_get("state_value")?,
        namespace: row.try_get("namespace")?,
        state_updated: row.try_get("state_updated")?,
        updated: row.try_get("updated")?,
    })
}
