use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            username    TEXT NOT NULL UNIQUE,
            email       TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS thoughts (
            id              TEXT PRIMARY KEY,
            thought_text    TEXT NOT NULL,
            username        TEXT NOT NULL,
            created_at      TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_thoughts_username
            ON thoughts(username, created_at);

        CREATE TABLE IF NOT EXISTS reactions (
            id              TEXT PRIMARY KEY,
            thought_id      TEXT NOT NULL REFERENCES thoughts(id),
            reaction_body   TEXT NOT NULL,
            username        TEXT NOT NULL,
            created_at      TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_reactions_thought
            ON reactions(thought_id, created_at);

        CREATE TABLE IF NOT EXISTS friends (
            user_id     TEXT NOT NULL REFERENCES users(id),
            friend_id   TEXT NOT NULL REFERENCES users(id),
            PRIMARY KEY (user_id, friend_id)
        );
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
