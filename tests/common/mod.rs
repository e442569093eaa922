//! Shared harness for the HTTP tests.
//!
//! The router is driven through `tower::ServiceExt::oneshot` against an
//! in-memory store, so no PostgreSQL instance is needed.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use sea_orm::DbErr;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower::ServiceExt;
use uuid::Uuid;

use subscription_backend::db::entities::subscription;
use subscription_backend::db::services::{
    StoreError, StoreResult, SubscriptionFields, SubscriptionFilter, SubscriptionStore,
};
use subscription_backend::web::create_axum_router;

/// Mirrors the SQL semantics of the Postgres store on a map.
#[derive(Default)]
pub struct InMemorySubscriptionStore {
    rows: Mutex<HashMap<Uuid, subscription::Model>>,
}

impl InMemorySubscriptionStore {
    pub async fn len(&self) -> usize {
        self.rows.lock().await.len()
    }

    fn matches(filter: &SubscriptionFilter, row: &subscription::Model) -> bool {
        filter.user_id.is_none_or(|u| row.user_id == u.to_string())
            && filter.service_name.as_ref().is_none_or(|s| &row.service_name == s)
            && filter.start_date.is_none_or(|d| row.start_date >= d)
            // NULL <= x is never true in SQL.
            && filter.end_date.is_none_or(|d| row.end_date.is_some_and(|e| e <= d))
    }

    async fn matching(&self, filter: &SubscriptionFilter) -> Vec<subscription::Model> {
        let mut rows: Vec<_> = self
            .rows
            .lock()
            .await
            .values()
            .filter(|row| Self::matches(filter, row))
            .cloned()
            .collect();
        rows.sort_by(|a, b| (a.start_date, a.id).cmp(&(b.start_date, b.id)));
        rows
    }
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn get(&self, id: Uuid) -> StoreResult<subscription::Model> {
        self.rows.lock().await.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    async fn list(&self, filter: &SubscriptionFilter) -> StoreResult<Vec<subscription::Model>> {
        let rows = self.matching(filter).await;
        Ok(match filter.pagination() {
            Some(p) => rows.into_iter().skip(p.offset as usize).take(p.limit as usize).collect(),
            None => rows,
        })
    }

    async fn count_total(&self, filter: &SubscriptionFilter) -> StoreResult<i64> {
        Ok(self.matching(filter).await.iter().map(|r| i64::from(r.price)).sum())
    }

    async fn insert(&self, fields: SubscriptionFields) -> StoreResult<Uuid> {
        let id = Uuid::new_v4();
        self.rows.lock().await.insert(
            id,
            subscription::Model {
                id,
                user_id: fields.user_id,
                service_name: fields.service_name,
                price: fields.price,
                start_date: fields.start_date,
                end_date: fields.end_date,
            },
        );
        Ok(id)
    }

    async fn update(&self, id: Uuid, fields: SubscriptionFields) -> StoreResult<Uuid> {
        let mut rows = self.rows.lock().await;
        let row = rows.get_mut(&id).ok_or(StoreError::NotFound)?;
        row.user_id = fields.user_id;
        row.service_name = fields.service_name;
        row.price = fields.price;
        row.start_date = fields.start_date;
        row.end_date = fields.end_date;
        Ok(id)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        self.rows.lock().await.remove(&id).map(|_| ()).ok_or(StoreError::NotFound)
    }
}

/// Every call fails as if the database went away.
pub struct UnavailableStore;

#[async_trait]
impl SubscriptionStore for UnavailableStore {
    async fn get(&self, _id: Uuid) -> StoreResult<subscription::Model> {
        Err(unavailable())
    }
    async fn list(&self, _filter: &SubscriptionFilter) -> StoreResult<Vec<subscription::Model>> {
        Err(unavailable())
    }
    async fn count_total(&self, _filter: &SubscriptionFilter) -> StoreResult<i64> {
        Err(unavailable())
    }
    async fn insert(&self, _fields: SubscriptionFields) -> StoreResult<Uuid> {
        Err(unavailable())
    }
    async fn update(&self, _id: Uuid, _fields: SubscriptionFields) -> StoreResult<Uuid> {
        Err(unavailable())
    }
    async fn delete(&self, _id: Uuid) -> StoreResult<()> {
        Err(unavailable())
    }
}

fn unavailable() -> StoreError {
    StoreError::Persistence(DbErr::Conn(sea_orm::RuntimeErr::Internal(
        "connection refused to 10.0.0.5:5432".to_string(),
    )))
}

/// Panics on every call.
pub struct PanickingStore;

#[async_trait]
impl SubscriptionStore for PanickingStore {
    async fn get(&self, _id: Uuid) -> StoreResult<subscription::Model> {
        panic!("row decoder exploded")
    }
    async fn list(&self, _filter: &SubscriptionFilter) -> StoreResult<Vec<subscription::Model>> {
        panic!("row decoder exploded")
    }
    async fn count_total(&self, _filter: &SubscriptionFilter) -> StoreResult<i64> {
        panic!("row decoder exploded")
    }
    async fn insert(&self, _fields: SubscriptionFields) -> StoreResult<Uuid> {
        panic!("row decoder exploded")
    }
    async fn update(&self, _id: Uuid, _fields: SubscriptionFields) -> StoreResult<Uuid> {
        panic!("row decoder exploded")
    }
    async fn delete(&self, _id: Uuid) -> StoreResult<()> {
        panic!("row decoder exploded")
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemorySubscriptionStore>,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(InMemorySubscriptionStore::default());
        let router = create_axum_router(store.clone());
        Self { router, store }
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        send(&self.router, method, uri, body).await
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, None).await
    }

    pub async fn delete(&self, uri: &str) -> TestResponse {
        self.request(Method::DELETE, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> TestResponse {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> TestResponse {
        self.request(Method::PUT, uri, Some(body)).await
    }

    /// Creates a subscription and returns its id.
    pub async fn create(&self, body: Value) -> String {
        let response = self.post("/subscriptions", body).await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);
        response.body["id"].as_str().unwrap().to_string()
    }
}

pub async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    let request_body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    send_request(router, builder.body(request_body).unwrap()).await
}

pub async fn send_request(router: &Router, request: Request<Body>) -> TestResponse {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };

    TestResponse { status, headers, body }
}
