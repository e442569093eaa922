use axum::{
    body::Body as AxumBody,
    extract::ConnectInfo,
    http::Request,
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use std::time::Instant;
use tracing::info;

pub async fn log_request(req: Request<AxumBody>, next: Next) -> Response {
    // Absent when the router is driven without a listener, e.g. in tests.
    let remote_addr = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "-".to_string());
    let proto = format!("{:?}", req.version());
    let method = req.method().clone();
    let uri = req.uri().clone();

    info!(ip = %remote_addr, %proto, %method, %uri, "received request");

    let started = Instant::now();
    let response = next.run(req).await;

    info!(
        %method,
        %uri,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request completed"
    );
    response
}
