//! Fixed-window request limiter for the session endpoints, keyed by the
//! client's IP address. It is the brute-force brake on login and signup.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::auth::AppState;
use crate::error::ApiError;

/// Requests one client may make to `/api/session` per window.
pub const SESSION_RATE_LIMIT: u32 = 100;
pub const SESSION_RATE_WINDOW: Duration = Duration::from_secs(15 * 60);

/// How often expired windows are swept from the map.
const SWEEP_INTERVAL: Duration = Duration::from_secs(300);

#[derive(Debug)]
pub struct RateLimiter {
    limit: u32,
    window: Duration,
    windows: Mutex<Windows>,
}

#[derive(Debug)]
struct Windows {
    /// Client key -> (window start, requests counted in it).
    by_client: HashMap<String, (Instant, u32)>,
    last_sweep: Instant,
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            windows: Mutex::new(Windows {
                by_client: HashMap::new(),
                last_sweep: Instant::now(),
            }),
        }
    }

    /// 100 requests per 15 minutes.
    pub fn for_sessions() -> Self {
        Self::new(SESSION_RATE_LIMIT, SESSION_RATE_WINDOW)
    }

    /// Count one request from `client`. False once the client has used up
    /// its current window.
    pub fn allow(&self, client: &str) -> bool {
        self.allow_at(client, Instant::now())
    }

    fn allow_at(&self, client: &str, now: Instant) -> bool {
        let mut guard = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
        let Windows {
            by_client,
            last_sweep,
        } = &mut *guard;

        if now.saturating_duration_since(*last_sweep) >= SWEEP_INTERVAL {
            let window = self.window;
            by_client.retain(|_, (start, _)| now.saturating_duration_since(*start) < window);
            *last_sweep = now;
        }

        let (start, count) = by_client.entry(client.to_owned()).or_insert((now, 0));
        if now.saturating_duration_since(*start) >= self.window {
            *start = now;
            *count = 0;
        }

        if *count >= self.limit {
            return false;
        }
        *count += 1;
        true
    }

    #[cfg(test)]
    fn tracked_clients(&self) -> usize {
        self.windows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .by_client
            .len()
    }
}

/// Reject with 429 once the caller's window is used up.
pub async fn limit_sessions(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let client = client_key(&req);
    if !state.session_limiter.allow(&client) {
        warn!("Session rate limit exceeded for {}", client);
        return Err(ApiError::TooManyRequests);
    }
    Ok(next.run(req).await)
}

/// Peer IP when the server runs with connect info. Without it every caller
/// shares one window.
fn client_key(req: &Request) -> String {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".into())
}
