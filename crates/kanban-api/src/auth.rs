use std::sync::Arc;

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::{error, warn};

use kanban_db::{BoardResult, Database};
use kanban_types::api::{LoginRequest, LoginResponse};

use crate::assistant::Assistant;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::middleware::AuthSession;
use crate::sessions::SessionStore;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub sessions: SessionStore,
    pub assistant: Arc<dyn Assistant>,
}

/// Run blocking storage work off the async runtime.
pub(crate) async fn db_call<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> BoardResult<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Fatal(e.to_string())
        })?
        .map_err(ApiError::from)
}

/// Passwords are stored and compared in plaintext.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = req.username.clone();
    let user = db_call(&state, move |db| db.get_user_by_username(&username)).await?;

    let user = match user {
        Some(user) if user.password == req.password => user,
        _ => {
            warn!(username = %req.username, "Failed login");
            return Err(ApiError::Unauthenticated("Invalid credentials"));
        }
    };

    let token = state.sessions.issue(&user.id, &user.username);

    Ok(Json(LoginResponse {
        token,
        user_id: user.id,
        username: user.username,
    }))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
) -> StatusCode {
    state.sessions.revoke(&session.token);
    StatusCode::NO_CONTENT
}
