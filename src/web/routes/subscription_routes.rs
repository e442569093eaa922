use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    routing::get,
};
use std::sync::Arc;
use tracing::info;

use crate::db::services::{SubscriptionFields, SubscriptionFilter};
use crate::web::models::{
    IdResponse, SubscriptionBody, SubscriptionEnvelope, SubscriptionListResponse, SubscriptionQuery,
    SubscriptionResponse, TotalResponse, parse_subscription_id,
};
use crate::web::{AppError, AppState};

fn query_filter(
    query: Result<Query<SubscriptionQuery>, QueryRejection>,
) -> Result<SubscriptionFilter, AppError> {
    let Query(query) = query.map_err(|e| AppError::InvalidFilter(e.body_text()))?;
    query.into_filter()
}

fn body_fields(
    payload: Result<Json<SubscriptionBody>, JsonRejection>,
) -> Result<SubscriptionFields, AppError> {
    let Json(body) = payload.map_err(|e| AppError::InvalidBody(e.body_text()))?;
    body.into_fields()
}

// --- Route Handlers ---

async fn create_subscription_handler(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<SubscriptionBody>, JsonRejection>,
) -> Result<Json<IdResponse>, AppError> {
    let fields = body_fields(payload)?;
    let id = app_state.store.insert(fields).await?;
    info!(subscription_id = %id, "Subscription created.");
    Ok(Json(IdResponse { id }))
}

async fn list_subscriptions_handler(
    State(app_state): State<Arc<AppState>>,
    query: Result<Query<SubscriptionQuery>, QueryRejection>,
) -> Result<Json<SubscriptionListResponse>, AppError> {
    let filter = query_filter(query)?;
    let subscriptions = app_state.store.list(&filter).await?;
    Ok(Json(SubscriptionListResponse {
        subscriptions: subscriptions.into_iter().map(SubscriptionResponse::from).collect(),
    }))
}

async fn total_subscriptions_handler(
    State(app_state): State<Arc<AppState>>,
    query: Result<Query<SubscriptionQuery>, QueryRejection>,
) -> Result<Json<TotalResponse>, AppError> {
    let filter = query_filter(query)?;
    let total = app_state.store.count_total(&filter).await?;
    Ok(Json(TotalResponse { total }))
}

async fn get_subscription_handler(
    State(app_state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Result<Json<SubscriptionEnvelope>, AppError> {
    let id = parse_subscription_id(&raw_id)?;
    let subscription = app_state.store.get(id).await?;
    Ok(Json(SubscriptionEnvelope {
        subscription: subscription.into(),
    }))
}

async fn update_subscription_handler(
    State(app_state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
    payload: Result<Json<SubscriptionBody>, JsonRejection>,
) -> Result<Json<IdResponse>, AppError> {
    let id = parse_subscription_id(&raw_id)?;
    let fields = body_fields(payload)?;
    let id = app_state.store.update(id, fields).await?;
    info!(subscription_id = %id, "Subscription updated.");
    Ok(Json(IdResponse { id }))
}

async fn delete_subscription_handler(
    State(app_state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_subscription_id(&raw_id)?;
    app_state.store.delete(id).await?;
    info!(subscription_id = %id, "Subscription deleted.");
    Ok(StatusCode::OK)
}

// --- Router ---

pub fn create_subscriptions_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_subscriptions_handler).post(create_subscription_handler))
        .route("/total", get(total_subscriptions_handler))
        .route(
            "/{id}",
            get(get_subscription_handler)
                .put(update_subscription_handler)
                .delete(delete_subscription_handler),
        )
}
