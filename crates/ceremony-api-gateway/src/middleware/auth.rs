//! Authentication middleware: enforces the two caller tiers
//! the RPC surface recognizes. There is no anonymous tier — every
//! operation in the RPC surface table requires at least an authenticated
//! contributor. An `AuthLayer`/`AuthService` tower
//! pair built around a tier enum plus an injected `Authenticator` port.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use ceremony_ports::{Authenticator, Principal};
use std::sync::Arc;
use tower::{Layer, Service};

/// The caller capability a route requires, per the RPC surface table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodTier {
    /// `checkParticipantForCeremony`, `openMultiPartUpload`, etc.
    ContributorOrCoordinator,
    /// `setupCeremony`, `finalizeCeremony`, etc.
    CoordinatorOnly,
}

#[derive(Clone)]
pub struct AuthLayer {
    authenticator: Arc<dyn Authenticator>,
    required: MethodTier,
}

impl AuthLayer {
    pub fn new(authenticator: Arc<dyn Authenticator>, required: MethodTier) -> Self {
        Self { authenticator, required }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthService {
            inner,
            authenticator: Arc::clone(&self.authenticator),
            required: self.required,
        }
    }
}

#[derive(Clone)]
pub struct AuthService<S> {
    inner: S,
    authenticator: Arc<dyn Authenticator>,
    required: MethodTier,
}

impl<S> Service<Request<Body>> for AuthService<S>
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

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let authenticator = Arc::clone(&self.authenticator);
        let required = self.required;
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let token = bearer_token(&req);
            let principal = authenticator.authenticate(token.as_deref()).await;

            match &principal {
                Principal::Anonymous => return Ok(unauthenticated_response()),
                Principal::Contributor(_) if required == MethodTier::CoordinatorOnly => {
                    return Ok(forbidden_response());
                }
                _ => {}
            }

            req.extensions_mut().insert(principal);
            inner.call(req).await
        })
    }
}

fn bearer_token<B>(req: &Request<B>) -> Option<String> {
    req.headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|s| s.to_string())
}

fn unauthenticated_response() -> Response {
    let body = Json(serde_json::json!({
        "error": "UNAUTHENTICATED",
        "message": "no identity on the call",
    }));
    (StatusCode::UNAUTHORIZED, body).into_response()
}

fn forbidden_response() -> Response {
    let body = Json(serde_json::json!({
        "error": "FORBIDDEN",
        "message": "this operation requires the coordinator capability",
    }));
    (StatusCode::FORBIDDEN, body).into_response()
}
