use axum::extract::{Request, State};
use axum::http::header::RETRY_AFTER;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::decision::Decision;
use crate::handlers::AppState;
use crate::key_resolver::ClientKeyResolver;
use crate::response::RejectionBody;

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Admission gate in front of every non-excluded route.
///
/// Admitted requests are forwarded and the rate limit headers are attached to
/// whatever the application returns. Rejected requests never reach the
/// application and get a 429 with a JSON body instead.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if state.path_filter.is_excluded(request.uri().path()) {
        return next.run(request).await;
    }

    let key = state.resolver.resolve(request.headers());
    let decision = state.limiter.check(&key);

    if !decision.admitted {
        warn!(
            target: "gatekeeper::middleware",
            client = %key,
            uri = %request.uri(),
            retry_after = decision.retry_after_secs.unwrap_or_default(),
            "Rate limit exceeded"
        );
        return rejection_response(&decision);
    }

    debug!(
        target: "gatekeeper::middleware",
        client = %key,
        remaining = decision.remaining,
        "Request admitted"
    );

    let mut response = next.run(request).await;
    apply_rate_limit_headers(response.headers_mut(), &decision);
    response
}

pub fn apply_rate_limit_headers(headers: &mut HeaderMap, decision: &Decision) {
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(decision.limit));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(decision.remaining));
    headers.insert(X_RATELIMIT_RESET, HeaderValue::from(decision.reset_epoch_secs));
}

pub fn rejection_response(decision: &Decision) -> Response {
    let retry_after = decision.retry_after_secs.unwrap_or(1);

    let mut response = (
        StatusCode::TOO_MANY_REQUESTS,
        Json(RejectionBody::new(retry_after)),
    )
        .into_response();

    let headers = response.headers_mut();
    headers.insert(RETRY_AFTER, HeaderValue::from(retry_after));
    apply_rate_limit_headers(headers, decision);
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(0u64));
    response
}

/// Logging middleware for request/response tracking
pub async fn logging_middleware(mut request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let client = ClientKeyResolver::new().resolve(request.headers());

    let request_id = match request.headers().get(&X_REQUEST_ID) {
        Some(value) => value.clone(),
        None => {
            let generated = HeaderValue::from_str(&Uuid::new_v4().to_string())
                .unwrap_or_else(|_| HeaderValue::from_static("invalid"));
            request.headers_mut().insert(X_REQUEST_ID, generated.clone());
            generated
        }
    };
    let request_id_str = request_id.to_str().unwrap_or_default().to_string();

    info!(
        target: "gatekeeper::middleware",
        method = %method,
        uri = %uri,
        client = %client,
        request_id = %request_id_str,
        "Incoming request"
    );

    let mut response = next.run(request).await;

    info!(
        target: "gatekeeper::middleware",
        method = %method,
        uri = %uri,
        status = %response.status(),
        request_id = %request_id_str,
        "Request completed"
    );

    response.headers_mut().insert(X_REQUEST_ID, request_id);
    response
}
