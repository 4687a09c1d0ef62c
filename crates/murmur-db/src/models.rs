/// Database row types — these map directly to SQLite rows.
/// Distinct from murmur-types API models to keep the DB layer independent;
/// note the password hash exists only here, never on the API model.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub created_at: String,
}

pub struct ThoughtRow {
    pub id: String,
    pub thought_text: String,
    pub username: String,
    pub created_at: String,
}

pub struct ReactionRow {
    pub id: String,
    pub thought_id: String,
    pub reaction_body: String,
    pub username: String,
    pub created_at: String,
}

pub struct FriendRow {
    pub id: String,
    pub username: String,
}

/// One friendship edge, keyed by the owning user. Used by the batched
/// listing path; single-user lookups use `FriendRow`.
pub struct FriendEdgeRow {
    pub user_id: String,
    pub friend_id: String,
    pub friend_username: String,
}
