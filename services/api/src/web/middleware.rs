//! services/api/src/web/middleware.rs
//!
//! Session middleware for protecting routes.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use campus_core::store::StoreError;
use std::sync::Arc;
use tracing::debug;

use crate::error::ApiError;
use crate::web::state::AppState;

/// Middleware that requires a signed-in student.
///
/// If there is one, inserts the current `User` into request extensions for
/// handlers to use. Otherwise returns 401 with `NO_ACTIVE_SESSION`.
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = state
        .service
        .read(|s| s.is_authenticated().then(|| s.user().cloned()).flatten())
        .await;

    let Some(user) = user else {
        debug!(path = %req.uri().path(), "Rejected request without a session");
        return Err(StoreError::NoActiveSession.into());
    };

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}
