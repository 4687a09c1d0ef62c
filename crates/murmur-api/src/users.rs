//! User queries, the caller's own profile, and the friends list.

use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Path, State},
};

use murmur_db::{Database, ThoughtFilter};
use murmur_db::models::UserRow;
use murmur_types::api::AddFriendRequest;
use murmur_types::models::{FriendSummary, Thought, User};

use crate::auth::AppState;
use crate::context::RequestContext;
use crate::error::ApiError;
use crate::{parse_id, parse_timestamp, run_blocking, thoughts};

pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    let db = state.clone();
    let users = run_blocking(move || load_all_users(&db.db)).await?;
    Ok(Json(users))
}

/// Blocking. One pass over users, thoughts, and friendship edges instead of
/// per-user queries on the listing path.
fn load_all_users(db: &Database) -> anyhow::Result<Vec<User>> {
    let rows = db.list_users()?;

    let mut thoughts_by_author: HashMap<String, Vec<Thought>> = HashMap::new();
    for thought in thoughts::load_thoughts(db, &ThoughtFilter::All)? {
        // Globally newest-first, so each author's slice stays newest-first.
        thoughts_by_author
            .entry(thought.username.clone())
            .or_default()
            .push(thought);
    }

    let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
    let mut friends_by_user: HashMap<String, Vec<FriendSummary>> = HashMap::new();
    for edge in db.get_friends_for_users(&ids)? {
        let summary = FriendSummary {
            id: parse_id(&edge.friend_id, "user"),
            username: edge.friend_username,
        };
        friends_by_user.entry(edge.user_id).or_default().push(summary);
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let thoughts = thoughts_by_author.remove(&row.username).unwrap_or_default();
            let friends = friends_by_user.remove(&row.id).unwrap_or_default();
            let id = parse_id(&row.id, "user");
            let created_at = parse_timestamp(&row.created_at, &row.id);
            User {
                id,
                username: row.username,
                email: row.email,
                created_at,
                friend_count: friends.len(),
                thoughts,
                friends,
            }
        })
        .collect())
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<User>, ApiError> {
    let db = state.clone();
    let user = run_blocking(move || {
        let Some(row) = db.db.get_user_by_username(&username)? else {
            return Ok(None);
        };
        load_user(&db.db, row).map(Some)
    })
    .await?;

    user.map(Json).ok_or(ApiError::NotFound)
}

/// The caller's own record, looked up by the id in the verified claim.
pub async fn me(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<User>, ApiError> {
    let identity = ctx.require_identity()?.clone();

    let db = state.clone();
    let user = run_blocking(move || {
        let Some(row) = db.db.get_user_by_id(&identity.id.to_string())? else {
            return Ok(None);
        };
        load_user(&db.db, row).map(Some)
    })
    .await?;

    user.map(Json).ok_or(ApiError::NotFound)
}

pub async fn add_friend(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(req): Json<AddFriendRequest>,
) -> Result<Json<User>, ApiError> {
    let identity = ctx.require_identity()?.clone();

    // Invariant: a user's friends set never contains its own id.
    if req.friend_id == identity.id {
        return Err(ApiError::Validation(
            "cannot add yourself as a friend".into(),
        ));
    }

    let db = state.clone();
    let user = run_blocking(move || {
        if db.db.get_user_by_id(&req.friend_id.to_string())?.is_none() {
            return Ok(None);
        }
        // INSERT OR IGNORE at the storage layer — re-adding is a no-op.
        db.db
            .add_friend(&identity.id.to_string(), &req.friend_id.to_string())?;

        let Some(row) = db.db.get_user_by_id(&identity.id.to_string())? else {
            return Ok(None);
        };
        load_user(&db.db, row).map(Some)
    })
    .await?;

    user.map(Json).ok_or(ApiError::NotFound)
}

/// Blocking. Project a DB row into the API user: populate thoughts (newest
/// first) and friends, derive `friend_count`, and drop the password hash —
/// the API model has no field for it.
pub(crate) fn load_user(db: &Database, row: UserRow) -> anyhow::Result<User> {
    let thoughts = thoughts::load_thoughts(db, &ThoughtFilter::ByUsername(row.username.clone()))?;
    let friends: Vec<FriendSummary> = db
        .list_friends(&row.id)?
        .into_iter()
        .map(|f| FriendSummary {
            id: parse_id(&f.id, "user"),
            username: f.username,
        })
        .collect();

    let id = parse_id(&row.id, "user");
    let created_at = parse_timestamp(&row.created_at, &row.id);
    Ok(User {
        id,
        username: row.username,
        email: row.email,
        created_at,
        friend_count: friends.len(),
        thoughts,
        friends,
    })
}
