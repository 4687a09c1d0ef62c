//! Per-request identity context.
//!
//! Extraction never rejects a request: a missing, malformed, expired, or
//! tampered credential just leaves the context anonymous. Resolvers that need
//! an identity call `require_identity` before touching storage.

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use tracing::debug;

use murmur_types::api::IdentityClaim;

use crate::auth::AppState;
use crate::error::ApiError;

#[derive(Debug, Clone)]
pub struct RequestContext {
    pub identity: Option<IdentityClaim>,
}

impl RequestContext {
    pub fn require_identity(&self) -> Result<&IdentityClaim, ApiError> {
        self.identity.as_ref().ok_or(ApiError::Unauthenticated)
    }
}

/// Middleware that attaches a `RequestContext` to every request.
pub async fn attach_identity(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let identity = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .and_then(|token| match state.tokens.verify(token) {
            Ok(claim) => Some(claim),
            Err(e) => {
                // Degrade to anonymous; the resolver decides whether that matters.
                debug!("discarding bearer credential: {}", e);
                None
            }
        });

    req.extensions_mut().insert(RequestContext { identity });
    next.run(req).await
}
