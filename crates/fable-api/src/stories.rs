use axum::{
    Extension, Form, Json,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use tracing::error;
use uuid::Uuid;

use fable_types::api::{Claims, CreateStoryForm, SetPosterRequest, SuccessResponse, UpdateDetailsForm};

use crate::auth::flash_redirect;
use crate::error::ApiError;
use crate::state::AppState;

const FIRST_NODE_TEXT: &str =
    "This is the beginning of your story. Edit this page to get started!";

/// POST /story/create — story plus its first node in one transaction, then
/// straight into the editor.
pub async fn create_story(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Form(form): Form<CreateStoryForm>,
) -> Result<Response, ApiError> {
    let story_id = Uuid::new_v4().to_string();
    let node_id = Uuid::new_v4().to_string();

    let db = state.clone();
    let sid = story_id.clone();
    let author_id = claims.sub.to_string();
    tokio::task::spawn_blocking(move || {
        db.db.create_story_with_start(
            &sid,
            &form.title,
            &form.description,
            &author_id,
            &node_id,
            FIRST_NODE_TEXT,
        )
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal(anyhow::anyhow!(e))
    })??;

    Ok(flash_redirect(
        &format!("/editor/{story_id}"),
        "success",
        "Story created! You are now in the editor.",
    ))
}

/// POST /story/delete/{story_id} — ownership-checked transactional cascade.
pub async fn delete_story(
    State(state): State<AppState>,
    Path(story_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<Response, ApiError> {
    let db = state.clone();
    let author_id = claims.sub.to_string();
    let deleted = tokio::task::spawn_blocking(move || db.db.delete_story(&story_id, &author_id))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(anyhow::anyhow!(e))
        })??;

    if deleted {
        Ok(flash_redirect("/dashboard", "success", "Story deleted successfully."))
    } else {
        Ok(flash_redirect("/dashboard", "error", "Could not delete story."))
    }
}

/// POST /api/story/{id}/update-details (form fields).
pub async fn update_details(
    State(state): State<AppState>,
    Path(story_id): Path<String>,
    Extension(claims): Extension<Claims>,
    Form(form): Form<UpdateDetailsForm>,
) -> Result<impl IntoResponse, ApiError> {
    let changed = state
        .db
        .update_story_details(&story_id, &claims.sub.to_string(), &form.title, &form.description)?;

    if changed == 0 {
        return Err(ownership_error(&state, &story_id));
    }

    Ok(Json(SuccessResponse {
        success: true,
        message: None,
    }))
}

/// POST /api/story/{id}/set-poster (JSON).
pub async fn set_poster(
    State(state): State<AppState>,
    Path(story_id): Path<String>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SetPosterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let changed =
        state
            .db
            .set_story_poster(&story_id, &claims.sub.to_string(), &req.poster_image_url)?;

    if changed == 0 {
        return Err(ownership_error(&state, &story_id));
    }

    Ok(Json(SuccessResponse {
        success: true,
        message: Some("Poster updated!".to_string()),
    }))
}

/// Zero rows changed on an ownership-gated update means one of two things;
/// distinguish them so the caller sees Forbidden rather than a silent no-op.
fn ownership_error(state: &AppState, story_id: &str) -> ApiError {
    match state.db.get_story(story_id) {
        Ok(Some(_)) => ApiError::Forbidden,
        Ok(None) => ApiError::NotFound("Story not found".to_string()),
        Err(e) => ApiError::Internal(e),
    }
}
