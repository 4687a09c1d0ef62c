use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user as returned on every read path. The password hash never appears
/// here — it stays behind in the DB row type and is dropped at projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    /// The user's thoughts, newest first.
    pub thoughts: Vec<Thought>,
    pub friends: Vec<FriendSummary>,
    /// Derived, always equals `friends.len()`.
    pub friend_count: usize,
}

/// Minimal view of a friend inside a user projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendSummary {
    pub id: Uuid,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thought {
    pub id: Uuid,
    pub thought_text: String,
    /// Author username, denormalized onto the thought at creation.
    pub username: String,
    pub created_at: DateTime<Utc>,
    /// Append-only; reactions are never edited or removed.
    pub reactions: Vec<Reaction>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reaction {
    pub id: Uuid,
    pub reaction_body: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
}
