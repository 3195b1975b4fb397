use axum::{Json, extract::State};
use tracing::warn;

use fable_ai::split_choice_lines;
use fable_types::api::{
    EnrichRequest, EnrichResponse, GenerateEndingRequest, GenerateEndingResponse,
    SuggestChoicesRequest, SuggestChoicesResponse,
};

use crate::error::ApiError;
use crate::state::AppState;

/// The reader-facing closing line used whenever the gateway fails. Ending
/// generation must never surface an error to the player.
const DEFAULT_ENDING: &str =
    "Every story has an end, and this is yours. Thank you for the journey.";

/// POST /api/ai/generate-ending — no auth; any failure falls back to the
/// fixed closing line.
pub async fn generate_ending(
    State(state): State<AppState>,
    Json(req): Json<GenerateEndingRequest>,
) -> Json<GenerateEndingResponse> {
    let story_title = state
        .db
        .get_story(&req.story_id)
        .ok()
        .flatten()
        .map(|s| s.title)
        .unwrap_or_else(|| "this story".to_string());

    let prompt = vec![format!(
        "A reader finished a story titled \"{story_title}\". \
         Write a short, satisfying, concluding thought."
    )];

    let ending_text = match state.ai.generate(&prompt).await {
        Ok(text) => text,
        Err(e) => {
            warn!("ending generation failed, using fallback: {}", e);
            DEFAULT_ENDING.to_string()
        }
    };

    Json(GenerateEndingResponse { ending_text })
}

/// POST /api/ai/enrich — expand a scene idea into narration.
pub async fn enrich(
    State(state): State<AppState>,
    Json(req): Json<EnrichRequest>,
) -> Result<Json<EnrichResponse>, ApiError> {
    if req.prompt.trim().is_empty() {
        return Err(ApiError::Validation("Prompt is required".to_string()));
    }

    let prompt = vec![
        "You are a creative co-author for an interactive story. Expand the \
         following scene idea into vivid second-person narration, two to \
         four sentences, no headings or commentary."
            .to_string(),
        format!("Scene Idea: {}", req.prompt),
    ];

    let enriched_text = state
        .ai
        .generate(&prompt)
        .await
        .map_err(|e| ApiError::AiService(e.to_string()))?;

    Ok(Json(EnrichResponse { enriched_text }))
}

/// POST /api/ai/suggest-choices — three player choices for a scene, one
/// per response line.
pub async fn suggest_choices(
    State(state): State<AppState>,
    Json(req): Json<SuggestChoicesRequest>,
) -> Result<Json<SuggestChoicesResponse>, ApiError> {
    if req.description.trim().is_empty() {
        return Err(ApiError::Validation(
            "Scene description is required".to_string(),
        ));
    }

    let prompt = vec![
        format!(
            "You are a game designer for an interactive story titled '{}'.",
            req.story_title
        ),
        "Based on the following scene, suggest three creative, distinct, and \
         compelling choices for the player to make."
            .to_string(),
        "The choices should move the plot forward in interesting ways. Do not \
         use generic actions like 'look around' or 'wait'."
            .to_string(),
        "Return the response as a simple list of strings, separated by \
         newlines. Do not add any other text like titles or bullet points."
            .to_string(),
        format!("Scene: {}", req.description),
    ];

    let text = state
        .ai
        .generate(&prompt)
        .await
        .map_err(|e| ApiError::AiService(e.to_string()))?;

    Ok(Json(SuggestChoicesResponse {
        choices: split_choice_lines(&text),
    }))
}
