use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use kanban_types::api::InviteMemberRequest;

use crate::auth::{AppState, db_call};
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::middleware::AuthSession;

pub async fn list_members(
    State(state): State<AppState>,
    Path(board_id): Path<String>,
    Extension(session): Extension<AuthSession>,
) -> Result<impl IntoResponse, ApiError> {
    let members = db_call(&state, move |db| db.list_members(&board_id, &session.user_id)).await?;
    Ok(Json(members))
}

pub async fn invite_member(
    State(state): State<AppState>,
    Path(board_id): Path<String>,
    Extension(session): Extension<AuthSession>,
    ApiJson(req): ApiJson<InviteMemberRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let member = db_call(&state, move |db| {
        db.invite_member(&board_id, &req.username, &session.user_id)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(member)))
}

pub async fn remove_member(
    State(state): State<AppState>,
    Path((board_id, username)): Path<(String, String)>,
    Extension(session): Extension<AuthSession>,
) -> Result<StatusCode, ApiError> {
    db_call(&state, move |db| {
        db.remove_member(&board_id, &username, &session.user_id)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}
