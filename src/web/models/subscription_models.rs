use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::db::entities::subscription;
use crate::db::services::{MAX_PAGE, SubscriptionFields, SubscriptionFilter};
use crate::web::AppError;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a strict `YYYY-MM-DD` calendar date.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let bytes = raw.as_bytes();
    let shape_ok = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shape_ok {
        return None;
    }
    NaiveDate::parse_from_str(raw, DATE_FORMAT).ok()
}

pub fn parse_subscription_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::InvalidIdentifier("Invalid UUID format".to_string()))
}

// --- Request Structs ---

/// Raw query string for list and total. Empty values count as absent.
#[derive(Deserialize, Debug, Default)]
pub struct SubscriptionQuery {
    pub user_id: Option<String>,
    pub service_name: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub page: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn filter_date(value: Option<String>, name: &str) -> Result<Option<NaiveDate>, AppError> {
    non_empty(value)
        .map(|raw| {
            parse_date(&raw).ok_or_else(|| AppError::InvalidFilter(format!("Invalid {name} format")))
        })
        .transpose()
}

impl SubscriptionQuery {
    pub fn into_filter(self) -> Result<SubscriptionFilter, AppError> {
        let user_id = non_empty(self.user_id)
            .map(|raw| {
                Uuid::parse_str(&raw)
                    .map_err(|_| AppError::InvalidFilter("Invalid user_id format".to_string()))
            })
            .transpose()?;

        let start_date = filter_date(self.start_date, "start_date")?;
        let end_date = filter_date(self.end_date, "end_date")?;

        let page = non_empty(self.page)
            .map(|raw| match raw.parse::<u64>() {
                Ok(page) if (1..=MAX_PAGE).contains(&page) => Ok(page),
                _ => Err(AppError::InvalidFilter("Invalid page format".to_string())),
            })
            .transpose()?;

        Ok(SubscriptionFilter {
            user_id,
            service_name: non_empty(self.service_name),
            start_date,
            end_date,
            page,
        })
    }
}

/// JSON body shared by create and update.
#[derive(Deserialize, Debug)]
pub struct SubscriptionBody {
    pub user_id: String,
    pub service_name: String,
    pub price: i32,
    pub start_date: String,
    #[serde(default)]
    pub end_date: Option<String>,
}

impl SubscriptionBody {
    pub fn into_fields(self) -> Result<SubscriptionFields, AppError> {
        if self.user_id.trim().is_empty() {
            return Err(AppError::InvalidBody("user_id must not be empty".to_string()));
        }
        if self.service_name.trim().is_empty() {
            return Err(AppError::InvalidBody("service_name must not be empty".to_string()));
        }
        if self.price < 0 {
            return Err(AppError::InvalidBody("price must not be negative".to_string()));
        }

        let start_date = parse_date(&self.start_date)
            .ok_or_else(|| AppError::InvalidBody("Invalid start_date format".to_string()))?;
        let end_date = non_empty(self.end_date)
            .map(|raw| {
                parse_date(&raw)
                    .ok_or_else(|| AppError::InvalidBody("Invalid end_date format".to_string()))
            })
            .transpose()?;

        if let Some(end) = end_date {
            if end < start_date {
                warn!(%start_date, end_date = %end, "Subscription ends before it starts.");
            }
        }

        // UUID-shaped owners are stored canonically so the user_id filter finds them.
        let user_id = match Uuid::parse_str(self.user_id.trim()) {
            Ok(uuid) => uuid.to_string(),
            Err(_) => self.user_id,
        };

        Ok(SubscriptionFields {
            user_id,
            service_name: self.service_name,
            price: self.price,
            start_date,
            end_date,
        })
    }
}

// --- Response Structs ---

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionResponse {
    pub id: Uuid,
    pub user_id: String,
    pub service_name: String,
    pub price: i32,
    pub start_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

impl From<subscription::Model> for SubscriptionResponse {
    fn from(model: subscription::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            service_name: model.service_name,
            price: model.price,
            start_date: model.start_date,
            end_date: model.end_date,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct SubscriptionEnvelope {
    pub subscription: SubscriptionResponse,
}

#[derive(Serialize, Debug)]
pub struct SubscriptionListResponse {
    pub subscriptions: Vec<SubscriptionResponse>,
}

#[derive(Serialize, Debug)]
pub struct TotalResponse {
    pub total: i64,
}

#[derive(Serialize, Debug)]
pub struct IdResponse {
    pub id: Uuid,
}
