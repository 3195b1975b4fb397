use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::state::AppState;
use crate::view;

/// GET /play/{node_id} — the read path.
///
/// The only mutation reading can trigger: when an authenticated viewer
/// lands on a story's designated start node, the story is recorded in
/// their played history (idempotently).
pub async fn play(
    State(state): State<AppState>,
    Path(node_id): Path<String>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Response, ApiError> {
    let db = state.clone();
    let viewer = user.0.as_ref().map(|c| c.sub.to_string());

    let node = tokio::task::spawn_blocking(move || {
        let Some(node) = db.db.get_node(&node_id)? else {
            return anyhow::Ok(None);
        };

        if let Some(viewer_id) = viewer {
            let story = db.db.get_story(&node.story_id)?;
            let is_start = story
                .as_ref()
                .and_then(|s| s.start_node_id.as_deref())
                .is_some_and(|start| start == node.id);
            if is_start {
                db.db.record_played(&viewer_id, &node.story_id)?;
            }
        }

        Ok(Some(node))
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal(anyhow::anyhow!(e))
    })??;

    let Some(node) = node else {
        return Ok((StatusCode::NOT_FOUND, "Story node not found.").into_response());
    };

    let node = view::node_document(node);
    let html = state.render("player", &json!({ "node": node }))?;
    Ok(html.into_response())
}
