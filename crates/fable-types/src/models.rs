use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Document identifiers are opaque strings end to end. They happen to be
/// UUIDv4 today, but nothing outside the db layer may rely on that.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Story {
    pub id: String,
    pub title: String,
    pub description: String,
    pub author_id: String,
    /// Null until the story's first node exists.
    pub start_node_id: Option<String>,
    pub poster_image_url: String,
}

/// A story joined with its author's public identity, as shown on the
/// discover page and in played-history listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryWithAuthor {
    #[serde(flatten)]
    pub story: Story,
    pub author_username: String,
}

/// One branch out of a node: a label shown to the reader and the id of the
/// node it leads to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub label: String,
    pub target: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryNode {
    pub id: String,
    pub story_id: String,
    pub story_text: String,
    pub background_image_url: String,
    pub choices: Vec<Choice>,
    /// Linear fallback when the node has no branching choices.
    pub next_node_id: Option<String>,
}
