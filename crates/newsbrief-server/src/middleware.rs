use std::{
    sync::{Arc, Mutex, PoisonError},
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use uuid::Uuid;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Correlation id for one HTTP request, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Fixed-window limiter in front of the analysis route.
///
/// Each analysis fans out to several external providers, so the whole process
/// shares one counter rather than one per client.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    max_requests: usize,
    window: Duration,
    current: Arc<Mutex<Window>>,
}

#[derive(Debug)]
struct Window {
    opened_at: Instant,
    admitted: usize,
}

impl RateLimitState {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            current: Arc::new(Mutex::new(Window {
                opened_at: Instant::now(),
                admitted: 0,
            })),
        }
    }

    /// Admit one request at `now`, or return how long until the window
    /// reopens.
    fn try_admit(&self, now: Instant) -> Result<(), Duration> {
        let mut window = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let age = now.saturating_duration_since(window.opened_at);
        if age >= self.window {
            window.opened_at = now;
            window.admitted = 0;
        }
        if window.admitted >= self.max_requests {
            return Err(self.window.saturating_sub(age));
        }
        window.admitted += 1;
        Ok(())
    }
}

fn resolve_request_id(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from)
}

/// Tag the request with a [`RequestId`] and echo it on the response.
///
/// A non-blank `x-request-id` header is reused; otherwise a UUIDv4 is minted.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = resolve_request_id(req.headers());
    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        res.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    res
}

/// Reject with 429 and `Retry-After` once the current window is full.
pub async fn enforce_rate_limit(
    State(limit): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    match limit.try_admit(Instant::now()) {
        Ok(()) => next.run(req).await,
        Err(wait) => {
            let retry_after = wait.as_secs().max(1);
            tracing::warn!(path = %req.uri().path(), retry_after, "rate limit exceeded");
            (
                StatusCode::TOO_MANY_REQUESTS,
                [(header::RETRY_AFTER, retry_after.to_string())],
                Json(json!({
                    "error": { "code": "rate_limited", "message": "too many analysis requests" }
                })),
            )
                .into_response()
        }
    }
}
