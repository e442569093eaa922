use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::{
    sea_query::Expr, ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    FromQueryResult, QueryFilter, QuerySelect, RuntimeErr,
};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::db::entities::subscription;
use crate::db::services::subscription_filter::SubscriptionFilter;

/// Every column of a subscription except its identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionFields {
    pub user_id: String,
    pub service_name: String,
    pub price: i32,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Subscription not found")]
    NotFound,
    #[error("Constraint violation: {0}")]
    Constraint(String),
    #[error("Database error: {0}")]
    Persistence(DbErr),
}

impl From<DbErr> for StoreError {
    fn from(err: DbErr) -> Self {
        let sqlx_error = match &err {
            DbErr::Query(RuntimeErr::SqlxError(e)) | DbErr::Exec(RuntimeErr::SqlxError(e)) => Some(e),
            _ => None,
        };
        if let Some(sqlx::Error::Database(database_error)) = sqlx_error {
            if database_error.is_unique_violation()
                || database_error.is_foreign_key_violation()
                || database_error.is_check_violation()
            {
                return StoreError::Constraint(database_error.message().to_string());
            }
        }
        StoreError::Persistence(err)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence operations on the `subscriptions` table.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn get(&self, id: Uuid) -> StoreResult<subscription::Model>;

    async fn list(&self, filter: &SubscriptionFilter) -> StoreResult<Vec<subscription::Model>>;

    /// Sum of `price` over every row matching the filter. The page window is ignored.
    async fn count_total(&self, filter: &SubscriptionFilter) -> StoreResult<i64>;

    async fn insert(&self, fields: SubscriptionFields) -> StoreResult<Uuid>;

    /// Replaces every mutable column of an existing row.
    async fn update(&self, id: Uuid, fields: SubscriptionFields) -> StoreResult<Uuid>;

    async fn delete(&self, id: Uuid) -> StoreResult<()>;
}

#[derive(Debug, FromQueryResult)]
struct PriceTotal {
    total: Option<i64>,
}

/// PostgreSQL-backed store.
pub struct PgSubscriptionStore {
    db: DatabaseConnection,
}

impl PgSubscriptionStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Hands the connection back, e.g. to close the pool on shutdown.
    pub fn into_inner(self) -> DatabaseConnection {
        self.db
    }
}

#[async_trait]
impl SubscriptionStore for PgSubscriptionStore {
    async fn get(&self, id: Uuid) -> StoreResult<subscription::Model> {
        subscription::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn list(&self, filter: &SubscriptionFilter) -> StoreResult<Vec<subscription::Model>> {
        let subscriptions = filter.select().all(&self.db).await?;
        debug!(count = subscriptions.len(), ?filter, "Listed subscriptions.");
        Ok(subscriptions)
    }

    async fn count_total(&self, filter: &SubscriptionFilter) -> StoreResult<i64> {
        let row = subscription::Entity::find()
            .select_only()
            .column_as(Expr::col(subscription::Column::Price).sum(), "total")
            .filter(filter.condition())
            .into_model::<PriceTotal>()
            .one(&self.db)
            .await?;

        // SUM over zero rows is NULL.
        Ok(row.and_then(|r| r.total).unwrap_or(0))
    }

    async fn insert(&self, fields: SubscriptionFields) -> StoreResult<Uuid> {
        let id = Uuid::new_v4();
        let active_model = subscription::ActiveModel {
            id: Set(id),
            user_id: Set(fields.user_id),
            service_name: Set(fields.service_name),
            price: Set(fields.price),
            start_date: Set(fields.start_date),
            end_date: Set(fields.end_date),
        };

        subscription::Entity::insert(active_model)
            .exec_without_returning(&self.db)
            .await?;
        debug!(subscription_id = %id, "Inserted subscription.");
        Ok(id)
    }

    async fn update(&self, id: Uuid, fields: SubscriptionFields) -> StoreResult<Uuid> {
        let result = subscription::Entity::update_many()
            .col_expr(subscription::Column::UserId, Expr::value(fields.user_id))
            .col_expr(subscription::Column::ServiceName, Expr::value(fields.service_name))
            .col_expr(subscription::Column::Price, Expr::value(fields.price))
            .col_expr(subscription::Column::StartDate, Expr::value(fields.start_date))
            .col_expr(subscription::Column::EndDate, Expr::value(fields.end_date))
            .filter(subscription::Column::Id.eq(id))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(id)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let result = subscription::Entity::delete_by_id(id).exec(&self.db).await?;

        if result.rows_affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
