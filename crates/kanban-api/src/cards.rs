use axum::{
    Extension, Json,
    extract::{Path, State},
};

use kanban_types::api::AssignCardRequest;
use kanban_types::board::CardDoc;

use crate::auth::{AppState, db_call};
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::middleware::AuthSession;

/// Any member may assign; `username: null` clears the assignee.
pub async fn assign_card(
    State(state): State<AppState>,
    Path((board_id, card_id)): Path<(String, String)>,
    Extension(session): Extension<AuthSession>,
    ApiJson(req): ApiJson<AssignCardRequest>,
) -> Result<Json<CardDoc>, ApiError> {
    let card = db_call(&state, move |db| {
        db.assign_card(&board_id, &card_id, req.username.as_deref(), &session.user_id)
    })
    .await?;
    Ok(Json(card))
}
