use axum::{
    extract::{ConnectInfo, Request},
    http::header,
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use std::time::Instant;
use tracing::info;

use super::request_id::REQUEST_ID_HEADER;

fn header_str<'a>(headers: &'a axum::http::HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
}

/// Logs one line per finished request, including how many bytes each side declared.
pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let uri = req.uri().clone();
    let request_id = header_str(req.headers(), REQUEST_ID_HEADER).to_string();
    let bytes_in = header_str(req.headers(), header::CONTENT_LENGTH.as_str()).to_string();
    let client = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "-".to_string());

    let response = next.run(req).await;

    let latency = start.elapsed();
    let status = response.status();
    let bytes_out = header_str(response.headers(), header::CONTENT_LENGTH.as_str());

    info!(
        target: "metrics",
        request_id = %request_id,
        client = %client,
        method = %method,
        uri = %uri,
        status = %status.as_u16(),
        bytes_in = %bytes_in,
        bytes_out = %bytes_out,
        latency_ms = %latency.as_millis(),
        "request_completed"
    );

    response
}
