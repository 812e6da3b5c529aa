use axum::{Extension, Json, extract::State};
use tracing::{info, warn};

use kanban_types::api::{ChatRequest, ChatResponse};

use crate::auth::{AppState, db_call};
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::middleware::AuthSession;

/// Forward the conversation to the assistant and apply any board it returns.
///
/// The membership check and the write run in separate transactions so no
/// storage lock is held while the assistant is working.
pub async fn post_chat(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    ApiJson(req): ApiJson<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let ChatRequest {
        messages,
        board,
        board_id,
    } = req;

    {
        let board_id = board_id.clone();
        let user_id = session.user_id.clone();
        db_call(&state, move |db| db.check_member(&board_id, &user_id)).await?;
    }

    let reply = state.assistant.respond(&board, &messages).await;

    if let Some(update) = reply.board_update.clone() {
        let user_id = session.user_id.clone();
        let target = board_id.clone();
        db_call(&state, move |db| db.replace_board(&target, &user_id, &update))
            .await
            .inspect_err(|e| warn!(board_id = %board_id, "Assistant board update rejected: {}", e))?;
        info!(board_id = %board_id, "Applied assistant board update");
    }

    Ok(Json(ChatResponse {
        message: reply.message,
        board_update: reply.board_update,
    }))
}
