use chrono::NaiveDate;
use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Select};
use uuid::Uuid;

use crate::db::entities::subscription;

/// Fixed number of rows returned per page.
pub const PAGE_SIZE: u64 = 20;

/// Highest page whose offset still fits the signed BIGINT Postgres binds.
pub const MAX_PAGE: u64 = i64::MAX as u64 / PAGE_SIZE;

/// Optional constraints for listing subscriptions or summing their prices.
///
/// Every field is independent; an unset field places no constraint on that
/// dimension and the set ones are combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionFilter {
    pub user_id: Option<Uuid>,
    pub service_name: Option<String>,
    /// Lower bound on `start_date`, inclusive.
    pub start_date: Option<NaiveDate>,
    /// Upper bound on `end_date`, inclusive. Ongoing rows never match.
    pub end_date: Option<NaiveDate>,
    /// 1-based page index.
    pub page: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: u64,
    pub offset: u64,
}

impl SubscriptionFilter {
    /// Builds the WHERE predicate. Clauses are appended in a fixed order so
    /// the generated statement is reproducible.
    pub fn condition(&self) -> Condition {
        let mut condition = Condition::all();

        if let Some(user_id) = self.user_id {
            condition = condition.add(subscription::Column::UserId.eq(user_id.to_string()));
        }
        if let Some(service_name) = &self.service_name {
            condition = condition.add(subscription::Column::ServiceName.eq(service_name.as_str()));
        }
        if let Some(start_date) = self.start_date {
            condition = condition.add(subscription::Column::StartDate.gte(start_date));
        }
        if let Some(end_date) = self.end_date {
            condition = condition.add(subscription::Column::EndDate.lte(end_date));
        }

        condition
    }

    pub fn pagination(&self) -> Option<Pagination> {
        self.page.map(|page| Pagination {
            limit: PAGE_SIZE,
            offset: page
                .saturating_sub(1)
                .saturating_mul(PAGE_SIZE)
                .min(i64::MAX as u64),
        })
    }

    /// The full list query: predicate, stable ordering, then the page window.
    pub fn select(&self) -> Select<subscription::Entity> {
        let query = subscription::Entity::find()
            .filter(self.condition())
            .order_by_asc(subscription::Column::StartDate)
            .order_by_asc(subscription::Column::Id);

        match self.pagination() {
            Some(Pagination { limit, offset }) => query.limit(limit).offset(offset),
            None => query,
        }
    }
}
