use axum::{
    Extension,
    extract::{Path, Query, State},
    http::{HeaderMap, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use fable_types::api::{Claims, NextQuery};

use crate::auth::flash_redirect;
use crate::error::ApiError;
use crate::flash;
use crate::middleware::CurrentUser;
use crate::state::AppState;
use crate::view;

/// Renders a template with the pending flash message (if any) folded into
/// the data, clearing the flash cookie alongside the response.
fn page(
    state: &AppState,
    headers: &HeaderMap,
    name: &str,
    mut data: serde_json::Value,
) -> Result<Response, ApiError> {
    let pending = flash::take(headers);
    if let Some(f) = &pending {
        data["flash"] = json!(f);
    }
    let html = state.render(name, &data)?;
    if pending.is_some() {
        Ok(([(header::SET_COOKIE, flash::clear())], html).into_response())
    } else {
        Ok(html.into_response())
    }
}

fn user_json(user: &CurrentUser) -> serde_json::Value {
    match &user.0 {
        Some(claims) => json!({ "username": claims.username }),
        None => serde_json::Value::Null,
    }
}

/// GET /
pub async fn home(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    page(&state, &headers, "home", json!({ "user": user_json(&user) }))
}

/// GET /discover — every story, author-joined.
pub async fn discover(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.stories_with_authors())
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(anyhow::anyhow!(e))
        })??;

    let stories: Vec<_> = rows.into_iter().map(view::story_with_author).collect();
    page(
        &state,
        &headers,
        "discover",
        json!({ "user": user_json(&user), "stories": stories }),
    )
}

/// GET /auth — login and registration forms.
pub async fn auth_page(
    State(state): State<AppState>,
    Query(query): Query<NextQuery>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    page(&state, &headers, "auth", json!({ "next": query.next }))
}

/// GET /dashboard — the caller's own stories plus their played history.
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let db = state.clone();
    let user_id = claims.sub.to_string();
    let (own, played) = tokio::task::spawn_blocking(move || {
        let own = db.db.stories_by_author(&user_id)?;
        let played = db.db.played_stories(&user_id)?;
        anyhow::Ok((own, played))
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal(anyhow::anyhow!(e))
    })??;

    let stories: Vec<_> = own.into_iter().map(view::story).collect();
    let played_stories: Vec<_> = played.into_iter().map(view::story_with_author).collect();
    page(
        &state,
        &headers,
        "dashboard",
        json!({
            "user": { "username": claims.username },
            "stories": stories,
            "played_stories": played_stories,
        }),
    )
}

/// GET /editor/{story_id} — owner-only; node ids reach the template as
/// plain strings.
pub async fn editor(
    State(state): State<AppState>,
    Path(story_id): Path<String>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let db = state.clone();
    let sid = story_id.clone();
    let (story, nodes) = tokio::task::spawn_blocking(move || {
        let story = db.db.get_story(&sid)?;
        let nodes = db.db.nodes_for_story(&sid)?;
        anyhow::Ok((story, nodes))
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal(anyhow::anyhow!(e))
    })??;

    let story = match story {
        Some(s) if s.author_id == claims.sub.to_string() => view::story(s),
        _ => {
            return Ok(flash_redirect(
                "/dashboard",
                "error",
                "Story not found or you don't have permission to edit it.",
            ));
        }
    };

    let nodes: Vec<_> = nodes.into_iter().map(view::node_document).collect();
    let nodes_json =
        serde_json::to_string(&nodes).map_err(|e| ApiError::Internal(anyhow::anyhow!(e)))?;

    page(
        &state,
        &headers,
        "editor",
        json!({
            "user": { "username": claims.username },
            "story": story,
            "nodes": nodes,
            "nodes_json": nodes_json,
        }),
    )
}
