//! End-to-end tests over the assembled router: an in-memory database, a
//! keyless AI client (so every gateway call fails before the network), and
//! real requests driven through tower.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use fable_api::routes::router;
use fable_api::state::{AppState, AppStateInner};

fn app() -> (Router, AppState) {
    let db = fable_db::Database::open_in_memory().unwrap();
    let ai = fable_ai::AiClient::new(None, None).unwrap();
    let state = Arc::new(AppStateInner::new(db, ai, "test-secret".to_string()).unwrap());
    (router(state.clone()), state)
}

async fn send(app: &Router, req: Request<Body>) -> axum::response::Response {
    app.clone().oneshot(req).await.unwrap()
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn form_post(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(c) = cookie {
        builder = builder.header(header::COOKIE, c);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn json_post(uri: &str, body: Value, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(c) = cookie {
        builder = builder.header(header::COOKIE, c);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(c) = cookie {
        builder = builder.header(header::COOKIE, c);
    }
    builder.body(Body::empty()).unwrap()
}

fn session_cookie(resp: &axum::response::Response) -> Option<String> {
    resp.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("session=") && !v.starts_with("session=;"))
        .map(|v| v.split(';').next().unwrap().to_string())
}

fn location(resp: &axum::response::Response) -> String {
    resp.headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string()
}

/// Registers and logs in a user, returning their session cookie.
async fn login_as(app: &Router, username: &str, email: &str) -> String {
    let resp = send(
        app,
        form_post(
            "/auth",
            &format!("form_type=register&username={username}&email={email}&password=hunter2"),
            None,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let resp = send(
        app,
        form_post(
            "/auth",
            &format!("form_type=login&email={email}&password=hunter2"),
            None,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/dashboard");
    session_cookie(&resp).expect("login sets session cookie")
}

/// Creates a story through the form route and returns its id.
async fn create_story(app: &Router, cookie: &str, title: &str) -> String {
    let resp = send(
        app,
        form_post(
            "/story/create",
            &format!("title={title}&description=A+test+story"),
            Some(cookie),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let loc = location(&resp);
    loc.strip_prefix("/editor/").unwrap().to_string()
}

#[tokio::test]
async fn duplicate_email_is_rejected_on_register() {
    let (app, state) = app();
    login_as(&app, "ada", "ada@example.com").await;

    let resp = send(
        &app,
        form_post(
            "/auth",
            "form_type=register&username=impostor&email=ada@example.com&password=other",
            None,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/auth");

    let user = state.db.get_user_by_email("ada@example.com").unwrap().unwrap();
    assert_eq!(user.username, "ada");
}

#[tokio::test]
async fn wrong_password_does_not_establish_identity() {
    let (app, _state) = app();
    login_as(&app, "ada", "ada@example.com").await;

    let resp = send(
        &app,
        form_post("/auth", "form_type=login&email=ada@example.com&password=wrong", None),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/auth");
    assert!(session_cookie(&resp).is_none());
}

#[tokio::test]
async fn login_honors_next_parameter() {
    let (app, _state) = app();
    login_as(&app, "ada", "ada@example.com").await;

    let resp = send(
        &app,
        form_post(
            "/auth?next=/discover",
            "form_type=login&email=ada@example.com&password=hunter2",
            None,
        ),
    )
    .await;
    assert_eq!(location(&resp), "/discover");
}

#[tokio::test]
async fn unauthenticated_page_redirects_and_api_gets_401() {
    let (app, _state) = app();

    let resp = send(&app, get("/dashboard", None)).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/auth?next=/dashboard");

    let resp = send(&app, json_post("/api/node/some-id", json!({}), None)).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await, json!({ "error": "Unauthorized" }));
}

#[tokio::test]
async fn creating_a_story_yields_exactly_one_node_with_start_backfilled() {
    let (app, state) = app();
    let cookie = login_as(&app, "ada", "ada@example.com").await;
    let story_id = create_story(&app, &cookie, "Labyrinth").await;

    let story = state.db.get_story(&story_id).unwrap().unwrap();
    let nodes = state.db.nodes_for_story(&story_id).unwrap();
    assert_eq!(nodes.len(), 1);
    assert_eq!(story.start_node_id.as_deref(), Some(nodes[0].id.as_str()));
}

#[tokio::test]
async fn node_save_then_get_round_trips() {
    let (app, state) = app();
    let cookie = login_as(&app, "ada", "ada@example.com").await;
    let story_id = create_story(&app, &cookie, "Labyrinth").await;
    let node_id = state.db.get_story(&story_id).unwrap().unwrap().start_node_id.unwrap();

    let resp = send(
        &app,
        json_post(
            &format!("/api/node/{node_id}"),
            json!({
                "storyText": "Hello",
                "choices": [{"label": "Go", "target": "X"}],
            }),
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["success"], json!(true));

    let resp = send(&app, get(&format!("/api/node/{node_id}"), Some(&cookie))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let doc = body_json(resp).await;
    assert_eq!(doc["_id"], json!(node_id));
    assert_eq!(doc["story_id"], json!(story_id));
    assert_eq!(doc["story_text"], json!("Hello"));
    assert_eq!(doc["choices"], json!([{"label": "Go", "target": "X"}]));
}

#[tokio::test]
async fn missing_required_node_fields_are_a_caller_error() {
    let (app, state) = app();
    let cookie = login_as(&app, "ada", "ada@example.com").await;
    let story_id = create_story(&app, &cookie, "Labyrinth").await;
    let node_id = state.db.get_story(&story_id).unwrap().unwrap().start_node_id.unwrap();

    let resp = send(
        &app,
        json_post(&format!("/api/node/{node_id}"), json!({"choices": []}), Some(&cookie)),
    )
    .await;
    assert!(resp.status().is_client_error());
}

#[tokio::test]
async fn create_node_requires_story_ownership() {
    let (app, _state) = app();
    let ada = login_as(&app, "ada", "ada@example.com").await;
    let eve = login_as(&app, "eve", "eve@example.com").await;
    let story_id = create_story(&app, &ada, "Labyrinth").await;

    let resp = send(
        &app,
        json_post(&format!("/api/story/{story_id}/nodes"), json!({}), Some(&eve)),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = send(
        &app,
        json_post(&format!("/api/story/{story_id}/nodes"), json!({}), Some(&ada)),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["success"], json!(true));
    assert!(body["newNodeId"].is_string());
}

#[tokio::test]
async fn non_owner_cannot_update_or_delete_a_story() {
    let (app, state) = app();
    let ada = login_as(&app, "ada", "ada@example.com").await;
    let eve = login_as(&app, "eve", "eve@example.com").await;
    let story_id = create_story(&app, &ada, "Original").await;

    let resp = send(
        &app,
        form_post(
            &format!("/api/story/{story_id}/update-details"),
            "title=Hijacked&description=x",
            Some(&eve),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(state.db.get_story(&story_id).unwrap().unwrap().title, "Original");

    let resp = send(
        &app,
        form_post(&format!("/story/delete/{story_id}"), "", Some(&eve)),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert!(state.db.get_story(&story_id).unwrap().is_some());

    // The owner can.
    let resp = send(
        &app,
        form_post(&format!("/story/delete/{story_id}"), "", Some(&ada)),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert!(state.db.get_story(&story_id).unwrap().is_none());
    assert!(state.db.nodes_for_story(&story_id).unwrap().is_empty());
}

#[tokio::test]
async fn editor_page_is_owner_only() {
    let (app, _state) = app();
    let ada = login_as(&app, "ada", "ada@example.com").await;
    let eve = login_as(&app, "eve", "eve@example.com").await;
    let story_id = create_story(&app, &ada, "Labyrinth").await;

    let resp = send(&app, get(&format!("/editor/{story_id}"), Some(&ada))).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(&app, get(&format!("/editor/{story_id}"), Some(&eve))).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/dashboard");
}

#[tokio::test]
async fn playing_the_start_node_records_history_once() {
    let (app, state) = app();
    let ada = login_as(&app, "ada", "ada@example.com").await;
    let eve = login_as(&app, "eve", "eve@example.com").await;
    let story_id = create_story(&app, &ada, "Labyrinth").await;
    let start = state.db.get_story(&story_id).unwrap().unwrap().start_node_id.unwrap();

    // Second node so we can visit a non-start page too.
    let resp = send(
        &app,
        json_post(&format!("/api/story/{story_id}/nodes"), json!({}), Some(&ada)),
    )
    .await;
    let second = body_json(resp).await["newNodeId"].as_str().unwrap().to_string();

    let eve_id = state.db.get_user_by_email("eve@example.com").unwrap().unwrap().id;

    for _ in 0..2 {
        let resp = send(&app, get(&format!("/play/{start}"), Some(&eve))).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
    assert_eq!(state.db.played_history(&eve_id).unwrap(), vec![story_id.clone()]);

    // A non-start node never mutates history; anonymous playing never does.
    send(&app, get(&format!("/play/{second}"), Some(&eve))).await;
    assert_eq!(state.db.played_history(&eve_id).unwrap().len(), 1);

    let resp = send(&app, get(&format!("/play/{start}"), None)).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(&app, get("/play/nonexistent", None)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn ending_generation_never_fails_the_caller() {
    // AI client has no key, so the gateway errors before any network call;
    // the endpoint must still answer with the fixed closing line.
    let (app, _state) = app();
    let ada = login_as(&app, "ada", "ada@example.com").await;
    let story_id = create_story(&app, &ada, "Labyrinth").await;

    let resp = send(
        &app,
        json_post("/api/ai/generate-ending", json!({ "story_id": story_id }), None),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert!(body.get("error").is_none());
    let ending = body["ending_text"].as_str().unwrap();
    assert!(!ending.is_empty());
}

#[tokio::test]
async fn enrich_validates_input_and_surfaces_gateway_errors() {
    let (app, _state) = app();
    let ada = login_as(&app, "ada", "ada@example.com").await;

    let resp = send(&app, json_post("/api/ai/enrich", json!({ "prompt": "" }), Some(&ada))).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await, json!({ "error": "Prompt is required" }));

    let resp = send(
        &app,
        json_post("/api/ai/enrich", json!({ "prompt": "a ruined tower" }), Some(&ada)),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(resp).await;
    assert!(body["error"].as_str().unwrap().starts_with("AI service error"));

    let resp = send(&app, json_post("/api/ai/enrich", json!({ "prompt": "x" }), None)).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn set_poster_round_trips_to_story() {
    let (app, state) = app();
    let ada = login_as(&app, "ada", "ada@example.com").await;
    let story_id = create_story(&app, &ada, "Labyrinth").await;

    let resp = send(
        &app,
        json_post(
            &format!("/api/story/{story_id}/set-poster"),
            json!({ "posterImageURL": "https://img.example/poster.png" }),
            Some(&ada),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["message"], json!("Poster updated!"));

    let story = state.db.get_story(&story_id).unwrap().unwrap();
    assert_eq!(story.poster_image_url, "https://img.example/poster.png");
}
