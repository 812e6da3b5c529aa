use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use kanban_types::api::CreateBoardRequest;
use kanban_types::board::BoardDocument;

use crate::auth::{AppState, db_call};
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::middleware::AuthSession;

pub async fn list_boards(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
) -> Result<impl IntoResponse, ApiError> {
    let boards = db_call(&state, move |db| db.list_boards(&session.user_id)).await?;
    Ok(Json(boards))
}

pub async fn create_board(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    ApiJson(req): ApiJson<CreateBoardRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let title = req.title.trim().to_string();
    if title.is_empty() {
        return Err(ApiError::Validation("Board title must not be empty".into()));
    }

    let summary = db_call(&state, move |db| db.create_board(&title, &session.user_id)).await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

pub async fn delete_board(
    State(state): State<AppState>,
    Path(board_id): Path<String>,
    Extension(session): Extension<AuthSession>,
) -> Result<StatusCode, ApiError> {
    db_call(&state, move |db| db.delete_board(&board_id, &session.user_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_board(
    State(state): State<AppState>,
    Path(board_id): Path<String>,
    Extension(session): Extension<AuthSession>,
) -> Result<Json<BoardDocument>, ApiError> {
    let doc = db_call(&state, move |db| db.get_board_document(&board_id, &session.user_id)).await?;
    Ok(Json(doc))
}

/// Full replace of the board's columns and cards; last write wins.
pub async fn patch_board(
    State(state): State<AppState>,
    Path(board_id): Path<String>,
    Extension(session): Extension<AuthSession>,
    ApiJson(doc): ApiJson<BoardDocument>,
) -> Result<Json<BoardDocument>, ApiError> {
    let stored = db_call(&state, move |db| {
        db.replace_board(&board_id, &session.user_id, &doc)
    })
    .await?;
    Ok(Json(stored))
}
