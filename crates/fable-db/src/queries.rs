use crate::Database;
use crate::models::{NodeRow, StoryRow, StoryWithAuthorRow, UserRow};
use anyhow::Result;
use rusqlite::OptionalExtension;

const STORY_COLUMNS: &str =
    "id, title, description, author_id, start_node_id, poster_image_url, created_at";
const NODE_COLUMNS: &str =
    "id, story_id, story_text, background_image_url, choices, next_node_id, created_at";

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        id: &str,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, email, password) VALUES (?1, ?2, ?3, ?4)",
                (id, username, email, password_hash),
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, username, email, password, created_at FROM users WHERE email = ?1",
                    [email],
                    user_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, username, email, password, created_at FROM users WHERE id = ?1",
                    [id],
                    user_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    // -- Stories --

    /// Creates a story together with its first node and backfills
    /// `start_node_id`, all in one transaction. SQLite gives us the
    /// atomicity the three-step sequence needs.
    pub fn create_story_with_start(
        &self,
        story_id: &str,
        title: &str,
        description: &str,
        author_id: &str,
        node_id: &str,
        placeholder_text: &str,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO stories (id, title, description, author_id, start_node_id)
                 VALUES (?1, ?2, ?3, ?4, NULL)",
                (story_id, title, description, author_id),
            )?;
            tx.execute(
                "INSERT INTO story_nodes (id, story_id, story_text) VALUES (?1, ?2, ?3)",
                (node_id, story_id, placeholder_text),
            )?;
            tx.execute(
                "UPDATE stories SET start_node_id = ?1 WHERE id = ?2",
                (node_id, story_id),
            )?;
            tx.commit()?;
            Ok(())
        })
    }

    pub fn get_story(&self, id: &str) -> Result<Option<StoryRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {STORY_COLUMNS} FROM stories WHERE id = ?1"),
                    [id],
                    story_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Returns the number of rows changed: 0 means the caller is not the
    /// owner (or the story does not exist) — callers distinguish the two.
    pub fn update_story_details(
        &self,
        story_id: &str,
        author_id: &str,
        title: &str,
        description: &str,
    ) -> Result<usize> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE stories SET title = ?1, description = ?2 WHERE id = ?3 AND author_id = ?4",
                (title, description, story_id, author_id),
            )?;
            Ok(changed)
        })
    }

    pub fn set_story_poster(&self, story_id: &str, author_id: &str, url: &str) -> Result<usize> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE stories SET poster_image_url = ?1 WHERE id = ?2 AND author_id = ?3",
                (url, story_id, author_id),
            )?;
            Ok(changed)
        })
    }

    /// Deletes the story and every node under it in one transaction.
    /// Returns false when no story owned by `author_id` matched.
    pub fn delete_story(&self, story_id: &str, author_id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let owned: Option<String> = tx
                .query_row(
                    "SELECT id FROM stories WHERE id = ?1 AND author_id = ?2",
                    (story_id, author_id),
                    |row| row.get(0),
                )
                .optional()?;
            if owned.is_none() {
                return Ok(false);
            }
            tx.execute("DELETE FROM story_nodes WHERE story_id = ?1", [story_id])?;
            tx.execute(
                "DELETE FROM played_history WHERE story_id = ?1",
                [story_id],
            )?;
            tx.execute("DELETE FROM stories WHERE id = ?1", [story_id])?;
            tx.commit()?;
            Ok(true)
        })
    }

    pub fn stories_by_author(&self, author_id: &str) -> Result<Vec<StoryRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {STORY_COLUMNS} FROM stories WHERE author_id = ?1 ORDER BY created_at"
            ))?;
            let rows = stmt
                .query_map([author_id], story_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// The discover listing: every story joined with its author's username.
    pub fn stories_with_authors(&self) -> Result<Vec<StoryWithAuthorRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT s.id, s.title, s.description, s.author_id, s.start_node_id,
                        s.poster_image_url, u.username
                 FROM stories s
                 JOIN users u ON s.author_id = u.id
                 ORDER BY s.created_at",
            )?;
            let rows = stmt
                .query_map([], story_with_author_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Stories the user has started playing, author-joined for the
    /// dashboard's history section.
    pub fn played_stories(&self, user_id: &str) -> Result<Vec<StoryWithAuthorRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT s.id, s.title, s.description, s.author_id, s.start_node_id,
                        s.poster_image_url, u.username
                 FROM played_history h
                 JOIN stories s ON h.story_id = s.id
                 JOIN users u ON s.author_id = u.id
                 WHERE h.user_id = ?1
                 ORDER BY h.played_at",
            )?;
            let rows = stmt
                .query_map([user_id], story_with_author_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Nodes --

    pub fn insert_node(&self, id: &str, story_id: &str, story_text: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO story_nodes (id, story_id, story_text) VALUES (?1, ?2, ?3)",
                (id, story_id, story_text),
            )?;
            Ok(())
        })
    }

    pub fn get_node(&self, id: &str) -> Result<Option<NodeRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {NODE_COLUMNS} FROM story_nodes WHERE id = ?1"),
                    [id],
                    node_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Overwrites the editable node fields. `story_id` is deliberately not
    /// part of the SET list: a node never moves between stories.
    pub fn save_node(
        &self,
        id: &str,
        story_text: &str,
        choices_json: &str,
        background_image_url: &str,
        next_node_id: Option<&str>,
    ) -> Result<usize> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE story_nodes
                 SET story_text = ?1, choices = ?2, background_image_url = ?3, next_node_id = ?4
                 WHERE id = ?5",
                (story_text, choices_json, background_image_url, next_node_id, id),
            )?;
            Ok(changed)
        })
    }

    pub fn nodes_for_story(&self, story_id: &str) -> Result<Vec<NodeRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {NODE_COLUMNS} FROM story_nodes WHERE story_id = ?1 ORDER BY created_at"
            ))?;
            let rows = stmt
                .query_map([story_id], node_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Played history --

    /// Set-semantics insert: visiting a start node twice records the story
    /// once.
    pub fn record_played(&self, user_id: &str, story_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO played_history (user_id, story_id) VALUES (?1, ?2)",
                (user_id, story_id),
            )?;
            Ok(())
        })
    }

    pub fn played_history(&self, user_id: &str) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT story_id FROM played_history WHERE user_id = ?1 ORDER BY played_at",
            )?;
            let rows = stmt
                .query_map([user_id], |row| row.get(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn story_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoryRow> {
    Ok(StoryRow {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        author_id: row.get(3)?,
        start_node_id: row.get(4)?,
        poster_image_url: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn story_with_author_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoryWithAuthorRow> {
    Ok(StoryWithAuthorRow {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        author_id: row.get(3)?,
        start_node_id: row.get(4)?,
        poster_image_url: row.get(5)?,
        author_username: row.get(6)?,
    })
}

fn node_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<NodeRow> {
    Ok(NodeRow {
        id: row.get(0)?,
        story_id: row.get(1)?,
        story_text: row.get(2)?,
        background_image_url: row.get(3)?,
        choices: row.get(4)?,
        next_node_id: row.get(5)?,
        created_at: row.get(6)?,
    })
}
