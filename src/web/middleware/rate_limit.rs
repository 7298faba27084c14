use axum::{
    body::Body as AxumBody,
    extract::{Extension, State},
    http::Request,
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::warn;

use crate::web::models::CurrentUser;
use crate::web::{AppState, error::AppError};

const CONTACTS_LIMIT: u32 = 10;
const CONTACTS_WINDOW_SECS: i64 = 60;

pub const UPLOAD_LIMIT: u32 = 5;
pub const UPLOAD_WINDOW_SECS: i64 = 60;

struct Window {
    started_at: i64,
    count: u32,
}

/// Fixed-window request counter keyed by (caller, route class). Windows reset
/// lazily on the first request past their end; stale entries are overwritten,
/// never reaped.
#[derive(Default)]
pub struct RateLimiter {
    windows: DashMap<(i32, &'static str), Window>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self { windows: DashMap::new() }
    }

    /// True when the call fits the window, false when the limit is hit.
    pub fn check(&self, caller_id: i32, class: &'static str, limit: u32, window_secs: i64) -> bool {
        self.check_at(caller_id, class, limit, window_secs, chrono::Utc::now().timestamp())
    }

    fn check_at(
        &self,
        caller_id: i32,
        class: &'static str,
        limit: u32,
        window_secs: i64,
        now: i64,
    ) -> bool {
        let mut entry = self
            .windows
            .entry((caller_id, class))
            .or_insert(Window { started_at: now, count: 0 });
        if now - entry.started_at >= window_secs {
            entry.started_at = now;
            entry.count = 0;
        }
        entry.count += 1;
        entry.count <= limit
    }
}

/// No more than 10 requests per minute per caller on the contacts routes.
pub async fn contacts_rate_limit(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    req: Request<AxumBody>,
    next: Next,
) -> Result<Response, AppError> {
    if !state
        .rate_limiter
        .check(user.id, "contacts", CONTACTS_LIMIT, CONTACTS_WINDOW_SECS)
    {
        warn!(user_id = user.id, "contacts rate limit hit");
        return Err(AppError::RateLimited);
    }
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_within_the_window_are_counted() {
        let limiter = RateLimiter::new();
        for _ in 0..10 {
            assert!(limiter.check_at(1, "contacts", 10, 60, 1_000));
        }
        assert!(!limiter.check_at(1, "contacts", 10, 60, 1_000));
    }

    #[test]
    fn keys_are_independent() {
        let limiter = RateLimiter::new();
        for _ in 0..10 {
            assert!(limiter.check_at(1, "contacts", 10, 60, 1_000));
        }
        assert!(limiter.check_at(2, "contacts", 10, 60, 1_000));
        assert!(limiter.check_at(1, "upload", 10, 60, 1_000));
    }

    #[test]
    fn window_resets_after_it_elapses() {
        let limiter = RateLimiter::new();
        for _ in 0..10 {
            assert!(limiter.check_at(1, "contacts", 10, 60, 1_000));
        }
        assert!(!limiter.check_at(1, "contacts", 10, 60, 1_059));
        assert!(limiter.check_at(1, "contacts", 10, 60, 1_060));
    }
}
