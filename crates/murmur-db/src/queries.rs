use crate::Database;
use crate::models::{FriendEdgeRow, FriendRow, ReactionRow, ThoughtRow, UserRow};
use anyhow::Result;
use rusqlite::Connection;

/// Explicit filter for thought listings — replaces the ambiguous
/// "empty object means everything" convention with a tagged choice.
#[derive(Debug, Clone)]
pub enum ThoughtFilter {
    All,
    ByUsername(String),
}

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        id: &str,
        username: &str,
        email: &str,
        password_hash: &str,
        created_at: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, email, password, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (id, username, email, password_hash, created_at),
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username", username))
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    pub fn list_users(&self) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, username, email, password, created_at
                 FROM users ORDER BY username",
            )?;
            let rows = stmt
                .query_map([], user_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Thoughts --

    pub fn insert_thought(
        &self,
        id: &str,
        thought_text: &str,
        username: &str,
        created_at: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO thoughts (id, thought_text, username, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                (id, thought_text, username, created_at),
            )?;
            Ok(())
        })
    }

    pub fn get_thought(&self, id: &str) -> Result<Option<ThoughtRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, thought_text, username, created_at
                 FROM thoughts WHERE id = ?1",
            )?;
            let row = stmt.query_row([id], thought_from_row).optional()?;
            Ok(row)
        })
    }

    pub fn list_thoughts(&self, filter: &ThoughtFilter) -> Result<Vec<ThoughtRow>> {
        self.with_conn(|conn| {
            let rows = match filter {
                ThoughtFilter::All => {
                    let mut stmt = conn.prepare(
                        "SELECT id, thought_text, username, created_at
                         FROM thoughts ORDER BY created_at DESC, rowid DESC",
                    )?;
                    stmt.query_map([], thought_from_row)?
                        .collect::<std::result::Result<Vec<_>, _>>()?
                }
                ThoughtFilter::ByUsername(username) => {
                    let mut stmt = conn.prepare(
                        "SELECT id, thought_text, username, created_at
                         FROM thoughts WHERE username = ?1
                         ORDER BY created_at DESC, rowid DESC",
                    )?;
                    stmt.query_map([username], thought_from_row)?
                        .collect::<std::result::Result<Vec<_>, _>>()?
                }
            };
            Ok(rows)
        })
    }

    // -- Reactions --

    /// Append a reaction to a thought. Returns false without inserting when
    /// the thought does not exist; existence check and insert run under the
    /// same connection lock, so no reaction can land on a vanished thought.
    pub fn insert_reaction(
        &self,
        id: &str,
        thought_id: &str,
        reaction_body: &str,
        username: &str,
        created_at: &str,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let exists: Option<String> = conn
                .query_row(
                    "SELECT id FROM thoughts WHERE id = ?1",
                    [thought_id],
                    |row| row.get(0),
                )
                .optional()?;

            if exists.is_none() {
                return Ok(false);
            }

            conn.execute(
                "INSERT INTO reactions (id, thought_id, reaction_body, username, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (id, thought_id, reaction_body, username, created_at),
            )?;
            Ok(true)
        })
    }

    pub fn get_reactions_for_thought(&self, thought_id: &str) -> Result<Vec<ReactionRow>> {
        self.get_reactions_for_thoughts(&[thought_id.to_string()])
    }

    /// Batch-fetch reactions for a set of thought IDs, oldest first.
    pub fn get_reactions_for_thoughts(&self, thought_ids: &[String]) -> Result<Vec<ReactionRow>> {
        if thought_ids.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let placeholders: Vec<String> =
                (1..=thought_ids.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "SELECT id, thought_id, reaction_body, username, created_at
                 FROM reactions WHERE thought_id IN ({})
                 ORDER BY created_at",
                placeholders.join(", ")
            );

            let mut stmt = conn.prepare(&sql)?;
            let params: Vec<&dyn rusqlite::types::ToSql> = thought_ids
                .iter()
                .map(|id| id as &dyn rusqlite::types::ToSql)
                .collect();

            let rows = stmt
                .query_map(params.as_slice(), |row| {
                    Ok(ReactionRow {
                        id: row.get(0)?,
                        thought_id: row.get(1)?,
                        reaction_body: row.get(2)?,
                        username: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    // -- Friends --

    /// Idempotent set-add: re-adding an existing friend is a no-op at the
    /// storage layer, not a read-modify-write in the caller.
    pub fn add_friend(&self, user_id: &str, friend_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO friends (user_id, friend_id) VALUES (?1, ?2)",
                (user_id, friend_id),
            )?;
            Ok(())
        })
    }

    /// Batch-fetch friendship edges for a set of user IDs in one query.
    pub fn get_friends_for_users(&self, user_ids: &[String]) -> Result<Vec<FriendEdgeRow>> {
        if user_ids.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let placeholders: Vec<String> =
                (1..=user_ids.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "SELECT f.user_id, u.id, u.username
                 FROM friends f
                 JOIN users u ON u.id = f.friend_id
                 WHERE f.user_id IN ({})
                 ORDER BY u.username",
                placeholders.join(", ")
            );

            let mut stmt = conn.prepare(&sql)?;
            let params: Vec<&dyn rusqlite::types::ToSql> = user_ids
                .iter()
                .map(|id| id as &dyn rusqlite::types::ToSql)
                .collect();

            let rows = stmt
                .query_map(params.as_slice(), |row| {
                    Ok(FriendEdgeRow {
                        user_id: row.get(0)?,
                        friend_id: row.get(1)?,
                        friend_username: row.get(2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn list_friends(&self, user_id: &str) -> Result<Vec<FriendRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT u.id, u.username
                 FROM friends f
                 JOIN users u ON u.id = f.friend_id
                 WHERE f.user_id = ?1
                 ORDER BY u.username",
            )?;
            let rows = stmt
                .query_map([user_id], |row| {
                    Ok(FriendRow {
                        id: row.get(0)?,
                        username: row.get(1)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    // `column` is always a compile-time literal from the methods above.
    let sql = format!(
        "SELECT id, username, email, password, created_at FROM users WHERE {} = ?1",
        column
    );
    let mut stmt = conn.prepare(&sql)?;
    let row = stmt.query_row([value], user_from_row).optional()?;
    Ok(row)
}

fn user_from_row(row: &rusqlite::Row<'_>) -> std::result::Result<UserRow, rusqlite::Error> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn thought_from_row(row: &rusqlite::Row<'_>) -> std::result::Result<ThoughtRow, rusqlite::Error> {
    Ok(ThoughtRow {
        id: row.get(0)?,
        thought_text: row.get(1)?,
        username: row.get(2)?,
        created_at: row.get(3)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
