use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::User;

// -- JWT claims --

/// Identity data embedded in a token: a snapshot of the user at issue time.
/// It can go stale if the profile ever changes after issuance; with no
/// profile edits in this API that cannot happen, but verification never
/// consults storage either way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaim {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

/// Full JWT payload. Canonical definition lives here in murmur-types so the
/// API layer and integration tests share one shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub data: IdentityClaim,
    pub iat: i64,
    pub exp: i64,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Returned by both signup and login.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

// -- Thoughts --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddThoughtRequest {
    pub thought_text: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddReactionRequest {
    pub reaction_body: String,
}

// -- Friends --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddFriendRequest {
    pub friend_id: Uuid,
}
