//! Fixed-window per-client rate limiting.
//!
//! Each client IP gets a counter that resets when its window elapses.
//! Requests past the budget are rejected with a 429 before reaching the
//! handler. Counters live in process memory; a restart clears them, and in a
//! multi-instance deployment each instance enforces its own budget.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use futures_util::future::{LocalBoxFuture, Ready, ready};

use crate::domain::Error;

/// Bucket count above which expired windows are swept on the next request.
const PRUNE_THRESHOLD: usize = 1024;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

#[derive(Debug)]
struct Limiter {
    max_requests: u32,
    window: Duration,
    buckets: Mutex<HashMap<String, Window>>,
}

impl Limiter {
    /// Count one request for `key`; `false` means over budget.
    fn admit(&self, key: &str, now: Instant) -> bool {
        let mut buckets = match self.buckets.lock() {
            Ok(guard) => guard,
            // A poisoned lock only means another request panicked mid-update;
            // the counters are still usable.
            Err(poisoned) => poisoned.into_inner(),
        };
        if buckets.len() > PRUNE_THRESHOLD {
            let window = self.window;
            buckets.retain(|_, w| now.duration_since(w.started) < window);
        }
        let bucket = buckets.entry(key.to_owned()).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.duration_since(bucket.started) >= self.window {
            bucket.started = now;
            bucket.count = 0;
        }
        if bucket.count >= self.max_requests {
            return false;
        }
        bucket.count += 1;
        true
    }
}

/// Rate-limiting middleware; cheap to clone, instances sharing a clone share
/// the counters.
#[derive(Clone)]
pub struct RateLimit {
    limiter: Arc<Limiter>,
}

impl RateLimit {
    /// Allow `max_requests` per client per `window`.
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            limiter: Arc::new(Limiter {
                max_requests,
                window,
                buckets: Mutex::new(HashMap::new()),
            }),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = RateLimitMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddleware {
            service,
            limiter: Arc::clone(&self.limiter),
        }))
    }
}

/// Service wrapper produced by [`RateLimit`].
pub struct RateLimitMiddleware<S> {
    service: S,
    limiter: Arc<Limiter>,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let key = req
            .peer_addr()
            .map_or_else(|| "unknown".to_owned(), |addr| addr.ip().to_string());
        if !self.limiter.admit(&key, Instant::now()) {
            return Box::pin(ready(Err(
                Error::too_many_requests("rate limit exceeded, retry later").into(),
            )));
        }
        let fut = self.service.call(req);
        Box::pin(async move { fut.await })
    }
}
