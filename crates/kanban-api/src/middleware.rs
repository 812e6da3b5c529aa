use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};

use crate::auth::AppState;
use crate::error::ApiError;

/// The authenticated caller, inserted into request extensions by [`require_auth`].
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub user_id: String,
    pub username: String,
}

/// Extract the token from an `Authorization: Bearer <token>` header.
/// Any other shape, including an empty token, yields `None`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .filter(|token| !token.is_empty())
}

/// Validate the bearer token against the session store.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(req.headers())
        .ok_or(ApiError::Unauthenticated("Unauthorized"))?
        .to_string();

    let session = state.sessions.validate(&token)?;

    req.extensions_mut().insert(AuthSession {
        token,
        user_id: session.user_id,
        username: session.username,
    });
    Ok(next.run(req).await)
}
