use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt; // for `oneshot`

use kanban_api::assistant::{Assistant, AssistantReply};
use kanban_api::sessions::{DEFAULT_SESSION_TTL, SessionStore};
use kanban_api::{AppState, AppStateInner, router};
use kanban_db::Database;
use kanban_types::api::ChatMessage;
use kanban_types::board::BoardDocument;

const BOARD_ID: &str = "board-1";

/// Replays one canned reply and records the conversations it was shown.
#[derive(Default)]
struct ScriptedAssistant {
    reply: Mutex<AssistantReply>,
    seen: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedAssistant {
    fn set_reply(&self, reply: AssistantReply) {
        *self.reply.lock().unwrap() = reply;
    }
}

#[async_trait]
impl Assistant for ScriptedAssistant {
    async fn respond(&self, _board: &BoardDocument, messages: &[ChatMessage]) -> AssistantReply {
        self.seen.lock().unwrap().push(messages.to_vec());
        self.reply.lock().unwrap().clone()
    }
}

struct TestApp {
    router: Router,
    state: AppState,
    assistant: Arc<ScriptedAssistant>,
}

impl TestApp {
    fn new() -> Self {
        Self::with_ttl(DEFAULT_SESSION_TTL)
    }

    fn with_ttl(ttl: Duration) -> Self {
        let db = Database::open_in_memory().unwrap();
        db.seed_demo_data().unwrap();

        let assistant = Arc::new(ScriptedAssistant::default());
        let state: AppState = Arc::new(AppStateInner {
            db,
            sessions: SessionStore::new(ttl),
            assistant: assistant.clone(),
        });

        Self {
            router: router(state.clone()),
            state,
            assistant,
        }
    }

    async fn send(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn login(&self, username: &str) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "username": username, "password": "password" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    async fn board(&self, token: &str, board_id: &str) -> Value {
        let (status, body) = self
            .send(Method::GET, &format!("/api/boards/{}", board_id), Some(token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        body
    }
}

fn column<'a>(board: &'a Value, id: &str) -> &'a Value {
    board["columns"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["id"] == id)
        .unwrap()
}

fn card_ids(board: &Value, column_id: &str) -> Vec<String> {
    column(board, column_id)["cardIds"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect()
}

/// Move `card` out of `from` and insert it into `to` at `index`.
fn move_card(board: &Value, card: &str, from: &str, to: &str, index: usize) -> Value {
    let mut board = board.clone();
    for col in board["columns"].as_array_mut().unwrap() {
        let is_from = col["id"] == from;
        let is_to = col["id"] == to;
        let ids = col["cardIds"].as_array_mut().unwrap();
        if is_from {
            ids.retain(|id| id != card);
        }
        if is_to {
            ids.insert(index, json!(card));
        }
    }
    board
}

// -- Auth --

#[tokio::test]
async fn login_returns_identity() {
    let app = TestApp::new();
    let (status, body) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "username": "user", "password": "password" })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], "user-1");
    assert_eq!(body["username"], "user");
    assert!(body["token"].as_str().unwrap().len() >= 32);
}

#[tokio::test]
async fn login_rejects_bad_credentials() {
    let app = TestApp::new();
    for (username, password) in [("user", "wrong"), ("ghost", "password")] {
        let (status, _) = app
            .send(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "username": username, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn protected_routes_require_bearer_token() {
    let app = TestApp::new();

    let (status, _) = app.send(Method::GET, "/api/boards", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.send(Method::GET, "/api/boards", Some("not-a-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/api/boards")
        .header(header::AUTHORIZATION, "Token abc")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let token = app.login("user").await;
    let (status, _) = app.send(Method::GET, "/api/boards", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn logout_revokes_token() {
    let app = TestApp::new();
    let token = app.login("user").await;

    let (status, _) = app.send(Method::POST, "/api/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(!app.state.sessions.contains(&token));

    let (status, _) = app.send(Method::GET, "/api/boards", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.send(Method::POST, "/api/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_token_is_rejected_and_dropped() {
    let app = TestApp::with_ttl(Duration::ZERO);
    let token = app.login("user").await;

    let (status, _) = app
        .send(Method::GET, &format!("/api/boards/{}", BOARD_ID), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(!app.state.sessions.contains(&token));
}

#[tokio::test]
async fn health_is_public() {
    let app = TestApp::new();
    let (status, body) = app.send(Method::GET, "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

// -- Boards --

#[tokio::test]
async fn create_board_starts_with_default_columns() {
    let app = TestApp::new();
    let token = app.login("user").await;

    let (status, summary) = app
        .send(Method::POST, "/api/boards", Some(&token), Some(json!({ "title": "T" })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(summary["title"], "T");
    assert_eq!(summary["owner_username"], "user");

    let board = app.board(&token, summary["id"].as_str().unwrap()).await;
    let titles: Vec<&str> = board["columns"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["Backlog", "Discovery", "In Progress", "Review", "Done"]);
    assert!(board["columns"]
        .as_array()
        .unwrap()
        .iter()
        .all(|c| c["cardIds"].as_array().unwrap().is_empty()));
    assert_eq!(board["cards"], json!({}));

    let (_, boards) = app.send(Method::GET, "/api/boards", Some(&token), None).await;
    let titles: Vec<&str> = boards
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["Main Board", "T"]);
}

#[tokio::test]
async fn create_board_rejects_blank_title() {
    let app = TestApp::new();
    let token = app.login("user").await;
    let (status, _) = app
        .send(Method::POST, "/api/boards", Some(&token), Some(json!({ "title": "  " })))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn patch_moves_card_between_columns() {
    let app = TestApp::new();
    let token = app.login("user").await;
    let board = app.board(&token, BOARD_ID).await;

    let updated = move_card(&board, "card-1", "col-backlog", "col-progress", 1);
    let (status, stored) = app
        .send(Method::PATCH, &format!("/api/boards/{}", BOARD_ID), Some(&token), Some(updated))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(card_ids(&stored, "col-progress"), ["card-4", "card-1", "card-5"]);

    let refreshed = app.board(&token, BOARD_ID).await;
    assert_eq!(card_ids(&refreshed, "col-backlog"), ["card-2"]);
    assert_eq!(card_ids(&refreshed, "col-progress"), ["card-4", "card-1", "card-5"]);
    assert_eq!(refreshed, stored);
}

#[tokio::test]
async fn patch_twice_is_stable() {
    let app = TestApp::new();
    let token = app.login("alice").await;
    let board = app.board(&token, BOARD_ID).await;

    let mut updated = move_card(&board, "card-6", "col-review", "col-done", 0);
    updated["cards"]["card-6"]["title"] = json!("QA micro-interactions (done)");

    let uri = format!("/api/boards/{}", BOARD_ID);
    let (_, first) = app.send(Method::PATCH, &uri, Some(&token), Some(updated.clone())).await;
    let (_, second) = app.send(Method::PATCH, &uri, Some(&token), Some(updated)).await;
    assert_eq!(first, second);
    assert_eq!(second["cards"]["card-6"]["title"], "QA micro-interactions (done)");
}

#[tokio::test]
async fn patch_rejects_malformed_document() {
    let app = TestApp::new();
    let token = app.login("user").await;
    let (status, _) = app
        .send(
            Method::PATCH,
            &format!("/api/boards/{}", BOARD_ID),
            Some(&token),
            Some(json!({ "columns": "nope" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    // nothing changed
    let board = app.board(&token, BOARD_ID).await;
    assert_eq!(board["cards"].as_object().unwrap().len(), 8);
}

#[tokio::test]
async fn unparseable_body_is_a_validation_error() {
    let app = TestApp::new();
    let token = app.login("user").await;
    let uri = format!("/api/boards/{}", BOARD_ID);

    let request = Request::builder()
        .method(Method::PATCH)
        .uri(&uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"columns": ["#))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["error"].is_string());

    // JSON body without a JSON content type
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/boards")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from(json!({ "title": "T" }).to_string()))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "username": "user" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn missing_board_is_not_found_even_for_outsiders() {
    let app = TestApp::new();
    let bob = app.login("bob").await;
    let alice = app.login("alice").await;

    let (_, summary) = app
        .send(Method::POST, "/api/boards", Some(&bob), Some(json!({ "title": "Bob's" })))
        .await;
    let bobs_board = format!("/api/boards/{}", summary["id"].as_str().unwrap());

    let (status, _) = app.send(Method::GET, &bobs_board, Some(&alice), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    for method in [Method::GET, Method::DELETE] {
        let (status, _) = app.send(method, "/api/boards/no-such-board", Some(&alice), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
    let (status, _) = app
        .send(Method::GET, "/api/boards/no-such-board/members", Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn only_owner_deletes_board() {
    let app = TestApp::new();
    let alice = app.login("alice").await;
    let owner = app.login("user").await;
    let uri = format!("/api/boards/{}", BOARD_ID);

    let (status, _) = app.send(Method::DELETE, &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.send(Method::DELETE, &uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.send(Method::GET, &uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, boards) = app.send(Method::GET, "/api/boards", Some(&alice), None).await;
    assert_eq!(boards, json!([]));
}

// -- Members --

#[tokio::test]
async fn invite_then_conflict() {
    let app = TestApp::new();
    let token = app.login("user").await;
    let (_, summary) = app
        .send(Method::POST, "/api/boards", Some(&token), Some(json!({ "title": "Team" })))
        .await;
    let members_uri = format!("/api/boards/{}/members", summary["id"].as_str().unwrap());

    let (status, member) = app
        .send(Method::POST, &members_uri, Some(&token), Some(json!({ "username": "alice" })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(member["username"], "alice");

    let (status, _) = app
        .send(Method::POST, &members_uri, Some(&token), Some(json!({ "username": "alice" })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .send(Method::POST, &members_uri, Some(&token), Some(json!({ "username": "nobody" })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, members) = app.send(Method::GET, &members_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        members,
        json!([
            { "user_id": "user-2", "username": "alice" },
            { "user_id": "user-1", "username": "user" },
        ])
    );
}

#[tokio::test]
async fn non_owner_cannot_manage_members() {
    let app = TestApp::new();
    let alice = app.login("alice").await;
    let members_uri = format!("/api/boards/{}/members", BOARD_ID);

    let (status, _) = app
        .send(Method::POST, &members_uri, Some(&alice), Some(json!({ "username": "bob" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send(Method::DELETE, &format!("{}/bob", members_uri), Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // but any member can list
    let (status, _) = app.send(Method::GET, &members_uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn owner_removes_member_but_not_self() {
    let app = TestApp::new();
    let owner = app.login("user").await;
    let bob = app.login("bob").await;
    let members_uri = format!("/api/boards/{}/members", BOARD_ID);

    let (status, body) = app
        .send(Method::DELETE, &format!("{}/user", members_uri), Some(&owner), None)
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("cannot remove"));

    let (status, _) = app
        .send(Method::DELETE, &format!("{}/bob", members_uri), Some(&owner), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .send(Method::GET, &format!("/api/boards/{}", BOARD_ID), Some(&bob), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

// -- Cards --

#[tokio::test]
async fn assign_card_resolves_usernames() {
    let app = TestApp::new();
    let bob = app.login("bob").await;
    let uri = format!("/api/boards/{}/cards/card-3/assignee", BOARD_ID);

    let (status, card) = app
        .send(Method::PATCH, &uri, Some(&bob), Some(json!({ "username": "alice" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(card["id"], "card-3");
    assert_eq!(card["created_by"], "user");
    assert_eq!(card["assigned_to"], "alice");

    let board = app.board(&bob, BOARD_ID).await;
    assert_eq!(board["cards"]["card-3"]["assigned_to"], "alice");

    let (status, card) = app
        .send(Method::PATCH, &uri, Some(&bob), Some(json!({ "username": null })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(card["assigned_to"].is_null());

    let (status, _) = app
        .send(
            Method::PATCH,
            &format!("/api/boards/{}/cards/card-404/assignee", BOARD_ID),
            Some(&bob),
            Some(json!({ "username": null })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// -- Chat --

#[tokio::test]
async fn chat_requires_auth() {
    let app = TestApp::new();
    let (status, _) = app
        .send(
            Method::POST,
            "/api/chat",
            None,
            Some(json!({ "messages": [], "board": { "columns": [], "cards": {} }, "board_id": BOARD_ID })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn chat_without_board_update() {
    let app = TestApp::new();
    let token = app.login("user").await;
    let board = app.board(&token, BOARD_ID).await;
    app.assistant.set_reply(AssistantReply::text("Done"));

    let (status, body) = app
        .send(
            Method::POST,
            "/api/chat",
            Some(&token),
            Some(json!({
                "messages": [{ "role": "user", "content": "hi" }],
                "board": board.clone(),
                "board_id": BOARD_ID,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Done");
    assert!(body["board_update"].is_null());
    assert_eq!(app.assistant.seen.lock().unwrap()[0][0].content, "hi");
    assert_eq!(app.board(&token, BOARD_ID).await, board);
}

#[tokio::test]
async fn chat_applies_board_update() {
    let app = TestApp::new();
    let token = app.login("alice").await;
    let board = app.board(&token, BOARD_ID).await;

    let mut updated = move_card(&board, "card-1", "col-backlog", "col-progress", 0);
    updated["columns"][0]["cardIds"]
        .as_array_mut()
        .unwrap()
        .push(json!("card-ai"));
    updated["cards"]["card-ai"] = json!({ "id": "card-ai", "title": "Suggested by AI" });

    app.assistant.set_reply(AssistantReply {
        message: "Moved card-1".into(),
        board_update: Some(serde_json::from_value(updated).unwrap()),
    });

    let (status, body) = app
        .send(
            Method::POST,
            "/api/chat",
            Some(&token),
            Some(json!({
                "messages": [{ "role": "user", "content": "move card-1" }],
                "board": board,
                "board_id": BOARD_ID,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Moved card-1");
    assert!(!body["board_update"].is_null());

    let refreshed = app.board(&token, BOARD_ID).await;
    assert_eq!(card_ids(&refreshed, "col-progress")[0], "card-1");
    assert!(!card_ids(&refreshed, "col-backlog").contains(&"card-1".to_string()));
    assert_eq!(refreshed["cards"]["card-ai"]["created_by"], "alice");
}

#[tokio::test]
async fn chat_rejects_malformed_request() {
    let app = TestApp::new();
    let token = app.login("user").await;
    let (status, _) = app
        .send(
            Method::POST,
            "/api/chat",
            Some(&token),
            Some(json!({ "messages": "not-a-list", "board": {}, "board_id": BOARD_ID })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn chat_requires_membership() {
    let app = TestApp::new();
    let bob = app.login("bob").await;
    let alice = app.login("alice").await;
    let (_, summary) = app
        .send(Method::POST, "/api/boards", Some(&bob), Some(json!({ "title": "Private" })))
        .await;

    let (status, _) = app
        .send(
            Method::POST,
            "/api/chat",
            Some(&alice),
            Some(json!({
                "messages": [],
                "board": { "columns": [], "cards": {} },
                "board_id": summary["id"],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(app.assistant.seen.lock().unwrap().is_empty());
}
