//! Row-to-document projections. DB rows keep choices as raw JSON text;
//! everything leaving this module is fully typed with string ids.

use tracing::warn;

use fable_db::models::{NodeRow, StoryRow, StoryWithAuthorRow};
use fable_types::api::NodeDocument;
use fable_types::models::{Choice, Story, StoryWithAuthor};

pub fn story(row: StoryRow) -> Story {
    Story {
        id: row.id,
        title: row.title,
        description: row.description,
        author_id: row.author_id,
        start_node_id: row.start_node_id,
        poster_image_url: row.poster_image_url,
    }
}

pub fn story_with_author(row: StoryWithAuthorRow) -> StoryWithAuthor {
    StoryWithAuthor {
        story: Story {
            id: row.id,
            title: row.title,
            description: row.description,
            author_id: row.author_id,
            start_node_id: row.start_node_id,
            poster_image_url: row.poster_image_url,
        },
        author_username: row.author_username,
    }
}

pub fn node_document(row: NodeRow) -> NodeDocument {
    let choices: Vec<Choice> = serde_json::from_str(&row.choices).unwrap_or_else(|e| {
        warn!("Corrupt choices on node '{}': {}", row.id, e);
        Vec::new()
    });
    NodeDocument {
        id: row.id,
        story_id: row.story_id,
        story_text: row.story_text,
        background_image_url: row.background_image_url,
        choices,
        next_node_id: row.next_node_id,
    }
}
