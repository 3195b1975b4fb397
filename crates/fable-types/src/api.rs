use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Choice;

// -- Session claims --

/// JWT claims carried in the `session` cookie. Canonical definition lives
/// here so the API middleware and the auth handlers share one shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

/// The single `/auth` form; `form_type` selects the branch.
#[derive(Debug, Deserialize)]
pub struct AuthForm {
    pub form_type: String,
    pub email: String,
    pub password: String,
    /// Only present on the registration branch.
    pub username: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

// -- Stories --

#[derive(Debug, Deserialize)]
pub struct CreateStoryForm {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDetailsForm {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct SetPosterRequest {
    #[serde(rename = "posterImageURL")]
    pub poster_image_url: String,
}

// -- Nodes --

/// Field names match what the editor's JavaScript sends and expects back,
/// so a saved node round-trips through `GET /api/node/{id}` unchanged.
#[derive(Debug, Deserialize)]
pub struct SaveNodeRequest {
    #[serde(rename = "storyText")]
    pub story_text: String,
    pub choices: Vec<Choice>,
    #[serde(rename = "backgroundImageURL")]
    pub background_image_url: Option<String>,
    #[serde(rename = "nextNodeId")]
    pub next_node_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NodeDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub story_id: String,
    pub story_text: String,
    #[serde(rename = "backgroundImageURL")]
    pub background_image_url: String,
    pub choices: Vec<Choice>,
    pub next_node_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateNodeResponse {
    pub success: bool,
    #[serde(rename = "newNodeId")]
    pub new_node_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// -- AI --

#[derive(Debug, Deserialize)]
pub struct GenerateEndingRequest {
    pub story_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateEndingResponse {
    pub ending_text: String,
}

#[derive(Debug, Deserialize)]
pub struct EnrichRequest {
    #[serde(default)]
    pub prompt: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EnrichResponse {
    pub enriched_text: String,
}

#[derive(Debug, Deserialize)]
pub struct SuggestChoicesRequest {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub story_title: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuggestChoicesResponse {
    pub choices: Vec<String>,
}
