//! Axum middleware translating admission decisions into HTTP responses.
//!
//! Enabled by the `axum` Cargo feature. The middleware derives the identifier
//! from the peer address, consults the [`Limiter`], and maps a rejection to
//! `429 Too Many Requests`. Admitted responses carry the remaining quota in
//! the [`REMAINING_HEADER`] header.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::debug;

use crate::limiter::Limiter;

/// Response header carrying the remaining quota on admitted requests.
pub const REMAINING_HEADER: &str = "x-ratelimit-remaining";

/// Admission middleware for use with `axum::middleware::from_fn_with_state`.
///
/// Requires the router to be served with
/// `into_make_service_with_connect_info::<SocketAddr>()` so the peer address
/// is available.
pub async fn enforce_admission(
    State(limiter): State<Arc<Limiter>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    let identifier = addr.ip().to_string();
    let decision = limiter.is_request_allowed(&identifier);

    if !decision.allowed {
        debug!(identifier, "request rejected");
        return (StatusCode::TOO_MANY_REQUESTS, "Too Many Requests\n").into_response();
    }

    let mut response = next.run(request).await;
    response
        .headers_mut()
        .insert(REMAINING_HEADER, HeaderValue::from(decision.remaining));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};
    use crate::config::{LimiterConfig, StrategyKind};
    use axum::body::Body;
    use axum::middleware::from_fn_with_state;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    fn app(limiter: Arc<Limiter>) -> Router {
        Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(from_fn_with_state(limiter, enforce_admission))
    }

    fn request_from(addr: &str) -> Request<Body> {
        let mut request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let addr: SocketAddr = addr.parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(addr));
        request
    }

    fn limiter(limit: u32) -> Arc<Limiter> {
        let config = LimiterConfig::new(StrategyKind::FixedWindow, limit, 60_000);
        let clock = Arc::new(ManualClock::new()) as Arc<dyn Clock>;
        Arc::new(Limiter::from_config_with_clock(&config, clock).unwrap())
    }

    #[tokio::test]
    async fn admitted_request_reaches_handler_with_header() {
        let app = app(limiter(3));

        let response = app.oneshot(request_from("192.0.2.1:4000")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(REMAINING_HEADER).unwrap(),
            &HeaderValue::from(2u32)
        );
    }

    #[tokio::test]
    async fn exhausted_quota_returns_429() {
        let app = app(limiter(1));

        let response = app
            .clone()
            .oneshot(request_from("192.0.2.1:4000"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.oneshot(request_from("192.0.2.1:4001")).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(response.headers().get(REMAINING_HEADER).is_none());
    }

    #[tokio::test]
    async fn peers_are_limited_independently() {
        let app = app(limiter(1));

        let response = app
            .clone()
            .oneshot(request_from("192.0.2.1:4000"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // A different peer address keeps its own quota.
        let response = app
            .clone()
            .oneshot(request_from("192.0.2.2:4000"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.oneshot(request_from("192.0.2.1:5000")).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
