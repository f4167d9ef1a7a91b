//! Per-IP token bucket rate limiting via `governor`, applied to
//! `openMultiPartUpload` / `temporaryStoreCurrentContributionUploadedChunkData`,
//! the highest-frequency calls in the protocol. Applied as a layer on just
//! those two routes, not globally.

use crate::domain::config::RateLimitConfig;
use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use dashmap::DashMap;
use governor::{clock::DefaultClock, state::{InMemoryState, NotKeyed}, Quota, RateLimiter};
use std::net::{IpAddr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Instant;
use tower::{Layer, Service};
use tracing::warn;

type Bucket = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

pub struct RateLimitState {
    buckets: DashMap<IpAddr, (Bucket, Instant)>,
    config: RateLimitConfig,
}

impl RateLimitState {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            buckets: DashMap::new(),
            config,
        }
    }

    pub fn check(&self, ip: IpAddr) -> bool {
        if !self.config.enabled {
            return true;
        }
        let mut entry = self.buckets.entry(ip).or_insert_with(|| {
            let quota = Quota::per_second(
                NonZeroU32::new(self.config.requests_per_second).unwrap_or(NonZeroU32::new(1).unwrap()),
            )
            .allow_burst(NonZeroU32::new(self.config.burst_size).unwrap_or(NonZeroU32::new(1).unwrap()));
            (RateLimiter::direct(quota), Instant::now())
        });
        entry.1 = Instant::now();
        entry.0.check().is_ok()
    }
}

#[derive(Clone)]
pub struct RateLimitLayer {
    state: Arc<RateLimitState>,
}

impl RateLimitLayer {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            state: Arc::new(RateLimitState::new(config)),
        }
    }
}

impl<S> Layer<S> for RateLimitLayer {
    type Service = RateLimitService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimitService {
            inner,
            state: Arc::clone(&self.state),
        }
    }
}

#[derive(Clone)]
pub struct RateLimitService<S> {
    inner: S,
    state: Arc<RateLimitState>,
}

impl<S> Service<Request<Body>> for RateLimitService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future =
        std::pin::Pin<Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut std::task::Context<'_>) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let state = Arc::clone(&self.state);
        let mut inner = self.inner.clone();
        let ip = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|c| c.0.ip())
            .unwrap_or(IpAddr::from([127, 0, 0, 1]));

        Box::pin(async move {
            if state.check(ip) {
                inner.call(req).await
            } else {
                warn!(%ip, "rate limit exceeded");
                let body = Json(serde_json::json!({
                    "error": "UPSTREAM_UNAVAILABLE",
                    "message": "rate limit exceeded, retry later",
                }));
                Ok((StatusCode::TOO_MANY_REQUESTS, body).into_response())
            }
        })
    }
}
