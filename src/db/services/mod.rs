pub mod subscription_filter;
pub mod subscription_service;

pub use subscription_filter::{MAX_PAGE, PAGE_SIZE, Pagination, SubscriptionFilter};
pub use subscription_service::{
    PgSubscriptionStore, StoreError, StoreResult, SubscriptionFields, SubscriptionStore,
};
