//! Permission enforcement middleware for protected routes
//!
//! Reads the already-authenticated `UserContext` from request extensions
//! (placed there by the embedding application's identity layer) and runs the
//! guard for the route's (resource, action) pair. Denials are translated
//! into user-facing responses by `AppError::into_response`; handlers behind
//! the layer never run on a denied request.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::domain::{Action, ResourceKey, UserContext};
use crate::engine::AuthzEngine;
use crate::error::AppError;
use crate::repository::AssignmentRepository;

/// Shared state for the permission middleware: the engine plus the pair the
/// route requires.
pub struct RequirePermissionState<R: AssignmentRepository> {
    engine: Arc<AuthzEngine<R>>,
    resource: ResourceKey,
    action: Action,
}

impl<R: AssignmentRepository> RequirePermissionState<R> {
    pub fn new(engine: Arc<AuthzEngine<R>>, resource: ResourceKey, action: Action) -> Self {
        Self {
            engine,
            resource,
            action,
        }
    }
}

impl<R: AssignmentRepository> Clone for RequirePermissionState<R> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            resource: self.resource.clone(),
            action: self.action,
        }
    }
}

/// Enforce the configured (resource, action) pair on every request passing
/// through. A missing `UserContext` extension means the identity layer never
/// ran: treated as unauthenticated.
pub async fn require_permission_middleware<R: AssignmentRepository + 'static>(
    State(state): State<RequirePermissionState<R>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let ctx = match request.extensions().get::<UserContext>() {
        Some(ctx) => ctx.clone(),
        None => return AppError::Unauthenticated.into_response(),
    };

    match state
        .engine
        .require_permission(&ctx, &state.resource, state.action)
        .await
    {
        Ok(()) => next.run(request).await,
        Err(err) => err.into_response(),
    }
}
