use axum::{Router, middleware as axum_middleware, routing::get};
use std::sync::Arc;

use crate::db::services::SubscriptionStore;
use crate::web::middleware::{common_headers, recover, request_log};
use crate::web::routes::subscription_routes;

pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;

pub use error::AppError;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SubscriptionStore>,
}

async fn health_check_handler() -> &'static str {
    "OK"
}

pub fn create_axum_router(store: Arc<dyn SubscriptionStore>) -> Router {
    let app_state = Arc::new(AppState { store });

    Router::new()
        .route("/health", get(health_check_handler))
        .nest("/subscriptions", subscription_routes::create_subscriptions_router())
        .with_state(app_state)
        .layer(axum_middleware::from_fn(common_headers::common_headers))
        .layer(axum_middleware::from_fn(request_log::log_request))
        .layer(recover::recover_panic_layer())
}
