/// Database row types — these map directly to SQLite rows.
/// Distinct from fable-types models to keep the DB layer independent;
/// `choices` in particular stays as its raw JSON text here.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub created_at: String,
}

pub struct StoryRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub author_id: String,
    pub start_node_id: Option<String>,
    pub poster_image_url: String,
    pub created_at: String,
}

pub struct StoryWithAuthorRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub author_id: String,
    pub start_node_id: Option<String>,
    pub poster_image_url: String,
    pub author_username: String,
}

pub struct NodeRow {
    pub id: String,
    pub story_id: String,
    pub story_text: String,
    pub background_image_url: String,
    /// JSON array of `{label, target}` objects, stored verbatim.
    pub choices: String,
    pub next_node_id: Option<String>,
    pub created_at: String,
}
