//! Middleware for the API Gateway: CORS and body-limit and
//! timeout come straight from `tower_http`, wired in `service.rs`. `auth`
//! and `rate_limit` are applied as route-scoped layers rather than a
//! single global stack, since each only covers a subset of operations.

pub mod auth;
pub mod cors;
pub mod rate_limit;

pub use auth::{AuthLayer, MethodTier};
pub use cors::create_cors_layer;
pub use rate_limit::{RateLimitLayer, RateLimitState};
