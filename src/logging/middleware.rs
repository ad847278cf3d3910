use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tower_http::request_id::{
    MakeRequestUuid, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tracing::Instrument;

/// Runs the request inside a `request` span carrying its id and matched route,
/// then logs the outcome at a level chosen by the status class.
pub async fn log_request(request: Request, next: Next) -> Response {
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .and_then(|id| id.header_value().to_str().ok())
        .unwrap_or("unknown")
        .to_owned();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_owned());

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %request.method(),
        route = route.as_deref().unwrap_or("unmatched"),
        path = %request.uri().path(),
    );

    async move {
        let started = Instant::now();
        let response = next.run(request).await;
        let status = response.status().as_u16();
        let duration_ms = started.elapsed().as_millis() as u64;

        match status {
            500.. => tracing::error!(status, duration_ms, "request failed"),
            400..=499 => tracing::warn!(status, duration_ms, "request rejected"),
            _ => tracing::info!(status, duration_ms, "request completed"),
        }
        response
    }
    .instrument(span)
    .await
}

/// Stamps every inbound request with an `x-request-id` when it has none.
pub fn request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::x_request_id(MakeRequestUuid)
}

/// Echoes the request id back on the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::x_request_id()
}
