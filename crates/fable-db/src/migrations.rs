use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            username    TEXT NOT NULL,
            email       TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS stories (
            id                TEXT PRIMARY KEY,
            title             TEXT NOT NULL,
            description       TEXT NOT NULL,
            author_id         TEXT NOT NULL REFERENCES users(id),
            start_node_id     TEXT,
            poster_image_url  TEXT NOT NULL DEFAULT '',
            created_at        TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_stories_author
            ON stories(author_id);

        CREATE TABLE IF NOT EXISTS story_nodes (
            id                    TEXT PRIMARY KEY,
            story_id              TEXT NOT NULL REFERENCES stories(id),
            story_text            TEXT NOT NULL,
            background_image_url  TEXT NOT NULL DEFAULT '',
            choices               TEXT NOT NULL DEFAULT '[]',
            next_node_id          TEXT,
            created_at            TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_nodes_story
            ON story_nodes(story_id);

        -- played_history is a set: (user, story) appears at most once.
        CREATE TABLE IF NOT EXISTS played_history (
            user_id     TEXT NOT NULL REFERENCES users(id),
            story_id    TEXT NOT NULL REFERENCES stories(id),
            played_at   TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (user_id, story_id)
        );
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
