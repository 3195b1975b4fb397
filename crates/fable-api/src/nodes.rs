use axum::{
    Extension, Json,
    extract::{Path, State},
};
use tracing::error;
use uuid::Uuid;

use fable_types::api::{Claims, CreateNodeResponse, SaveNodeRequest, SuccessResponse};

use crate::error::ApiError;
use crate::state::AppState;
use crate::view;

/// GET /api/node/{id} — the full node document, ids as opaque strings.
pub async fn get_node(
    State(state): State<AppState>,
    Path(node_id): Path<String>,
) -> Result<Json<fable_types::api::NodeDocument>, ApiError> {
    let node = state
        .db
        .get_node(&node_id)?
        .ok_or_else(|| ApiError::NotFound("Node not found".to_string()))?;
    Ok(Json(view::node_document(node)))
}

/// POST /api/node/{id} — overwrites the editable fields. Requires ownership
/// of the parent story: a node's content is authored state.
pub async fn save_node(
    State(state): State<AppState>,
    Path(node_id): Path<String>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SaveNodeRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let db = state.clone();
    let author_id = claims.sub.to_string();
    let choices_json =
        serde_json::to_string(&req.choices).map_err(|e| ApiError::Internal(anyhow::anyhow!(e)))?;

    tokio::task::spawn_blocking(move || -> Result<(), ApiError> {
        let Some(node) = db.db.get_node(&node_id)? else {
            return Err(ApiError::NotFound("Node not found".to_string()));
        };
        let Some(story) = db.db.get_story(&node.story_id)? else {
            return Err(ApiError::NotFound("Story not found".to_string()));
        };
        if story.author_id != author_id {
            return Err(ApiError::Forbidden);
        }

        db.db.save_node(
            &node_id,
            &req.story_text,
            &choices_json,
            req.background_image_url.as_deref().unwrap_or(""),
            req.next_node_id.as_deref(),
        )?;
        Ok(())
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal(anyhow::anyhow!(e))
    })??;

    Ok(Json(SuccessResponse {
        success: true,
        message: Some("Node saved!".to_string()),
    }))
}

/// POST /api/story/{id}/nodes — inserts a fresh placeholder node. Story
/// ownership is required, same rule as saving.
pub async fn create_node(
    State(state): State<AppState>,
    Path(story_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<CreateNodeResponse>, ApiError> {
    let new_node_id = Uuid::new_v4().to_string();

    let db = state.clone();
    let author_id = claims.sub.to_string();
    let nid = new_node_id.clone();
    tokio::task::spawn_blocking(move || -> Result<(), ApiError> {
        let Some(story) = db.db.get_story(&story_id)? else {
            return Err(ApiError::NotFound("Story not found".to_string()));
        };
        if story.author_id != author_id {
            return Err(ApiError::Forbidden);
        }
        db.db.insert_node(&nid, &story_id, "New Page")?;
        Ok(())
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal(anyhow::anyhow!(e))
    })??;

    Ok(Json(CreateNodeResponse {
        success: true,
        new_node_id,
    }))
}
