//! Access-token gate: header extraction → verification → identity propagation.
//!
//! Every request entering `/api/v1` (except the open routes) passes through
//! here exactly once. On success the request continues with `x-user-id` /
//! `x-user-role` rewritten and an `AuthCtx` in its extensions; on failure the
//! request terminates with a classified `AppError`.

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderValue, Request, header},
    middleware::{self, Next},
    response::Response,
};

use crate::api::v1::extractors::AuthCtx;
use crate::error::AppError;
use crate::services::auth::{AccessJwtError, AuthService};
use crate::state::AppState;

/// Apply the gate to a router.
///
/// ```ignore
/// let protected = middleware::auth::access::apply(routes, state.clone());
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8's from_fn cannot take a State extractor on its own, so the
    // state is passed explicitly via from_fn_with_state.
    router.layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let ctx = authenticate(&state.auth, req.headers_mut())?;

    // middleware → extractor hand-off
    req.extensions_mut().insert(ctx);

    Ok(next.run(req).await)
}

/// The gate itself, free of axum's middleware plumbing.
///
/// Reads `authorization`, verifies the bearer token, and on success writes
/// the derived `x-user-id` / `x-user-role` headers (always overwriting any
/// client-supplied value — downstream must never trust these two headers
/// unless they came through this gate).
pub fn authenticate(auth: &AuthService, headers: &mut HeaderMap) -> Result<AuthCtx, AppError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AppError::Unauthorized("No authorization token provided"))?;

    // A value that is not visible ASCII cannot match the Bearer scheme.
    let value = value.to_str().map_err(|_| {
        AppError::Unauthorized("Invalid authorization format. Use: Bearer <token>")
    })?;

    // Exactly two space-separated parts, scheme keyword case-sensitive.
    let token = match value.split(' ').collect::<Vec<_>>()[..] {
        ["Bearer", token] => token,
        _ => {
            return Err(AppError::Unauthorized(
                "Invalid authorization format. Use: Bearer <token>",
            ));
        }
    };

    let identity = auth.verify_identity(token).map_err(|err| {
        tracing::warn!(error = %err, "access token verification failed");
        rejection(err)
    })?;

    let user_id = HeaderValue::from_str(&identity.user_id)
        .map_err(|_| AppError::Unauthorized("Invalid token"))?;
    let role = HeaderValue::from_str(&identity.role)
        .map_err(|_| AppError::Unauthorized("Invalid token"))?;
    headers.insert("x-user-id", user_id);
    headers.insert("x-user-role", role);

    Ok(AuthCtx::from(identity))
}

/// Map a verification failure onto the gateway's error taxonomy.
fn rejection(err: AccessJwtError) -> AppError {
    match err {
        AccessJwtError::Expired => AppError::Unauthorized("Token has expired"),
        AccessJwtError::Invalid(_) | AccessJwtError::MissingSubject => {
            AppError::Unauthorized("Invalid token")
        }
        AccessJwtError::Fault(_) => AppError::Internal("Error validating token"),
    }
}
