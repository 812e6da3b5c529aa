use axum::{
    Json, Router, middleware,
    routing::{delete, get, patch, post},
};
use serde_json::{Value, json};

use crate::auth::{self, AppState};
use crate::middleware::require_auth;
use crate::{boards, cards, chat, members};

/// All HTTP routes, mounted under `/api`. Everything except login and the
/// health check requires a bearer token.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/login", post(auth::login))
        .route("/health", get(health));

    let protected_routes = Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/boards", get(boards::list_boards).post(boards::create_board))
        .route(
            "/boards/{board_id}",
            get(boards::get_board)
                .patch(boards::patch_board)
                .delete(boards::delete_board),
        )
        .route(
            "/boards/{board_id}/members",
            get(members::list_members).post(members::invite_member),
        )
        .route("/boards/{board_id}/members/{username}", delete(members::remove_member))
        .route("/boards/{board_id}/cards/{card_id}/assignee", patch(cards::assign_card))
        .route("/chat", post(chat::post_chat))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .nest("/api", public_routes.merge(protected_routes))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
