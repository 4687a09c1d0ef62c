//! Signup and login, plus the shared application state.

use std::sync::Arc;

use anyhow::anyhow;
use argon2::password_hash::{SaltString, rand_core::OsRng};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use uuid::Uuid;

use murmur_db::Database;
use murmur_db::models::UserRow;
use murmur_types::api::{AuthResponse, IdentityClaim, LoginRequest, SignupRequest};
use murmur_types::models::User;

use crate::error::ApiError;
use crate::token::TokenService;
use crate::{format_timestamp, run_blocking, users};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub tokens: TokenService,
}

pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = req.username.trim().to_string();
    let email = req.email.trim().to_string();
    validate_signup(&username, &email, &req.password)?;

    // Argon2id, PHC string storage. Verification is constant-time by
    // construction, so login can never leak password length.
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(anyhow!("password hash failed: {}", e)))?
        .to_string();

    let user_id = Uuid::new_v4();
    let created_at = Utc::now();

    let db = state.clone();
    {
        let username = username.clone();
        let email = email.clone();
        let created = format_timestamp(&created_at);
        run_blocking(move || {
            db.db
                .create_user(&user_id.to_string(), &username, &email, &password_hash, &created)
        })
        .await
        .map_err(|e| {
            // Uniqueness is delegated to the storage constraint; no pre-check,
            // so there is no check-then-insert race.
            if murmur_db::is_constraint_violation(&e) {
                ApiError::Conflict
            } else {
                ApiError::Internal(e)
            }
        })?;
    }

    let claim = IdentityClaim {
        id: user_id,
        username: username.clone(),
        email: email.clone(),
    };
    let token = state.tokens.issue(&claim)?;

    // Fresh account: no thoughts, no friends, nothing to populate.
    let user = User {
        id: user_id,
        username,
        email,
        created_at,
        thoughts: vec![],
        friends: vec![],
        friend_count: 0,
    };

    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let email = req.email.trim().to_string();

    let db = state.clone();
    let row = run_blocking(move || db.db.get_user_by_email(&email))
        .await?
        .ok_or(ApiError::IncorrectCredentials)?;

    let parsed_hash = PasswordHash::new(&row.password)
        .map_err(|e| ApiError::Internal(anyhow!("stored hash unparseable: {}", e)))?;

    // Same error as the unknown-email case above — the response must not
    // reveal which check failed.
    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::IncorrectCredentials)?;

    let claim = claim_from_row(&row)?;
    let token = state.tokens.issue(&claim)?;

    let db = state.clone();
    let user = run_blocking(move || users::load_user(&db.db, row)).await?;

    Ok(Json(AuthResponse { token, user }))
}

fn claim_from_row(row: &UserRow) -> Result<IdentityClaim, ApiError> {
    let id: Uuid = row
        .id
        .parse()
        .map_err(|e| ApiError::Internal(anyhow!("corrupt user id '{}': {}", row.id, e)))?;
    Ok(IdentityClaim {
        id,
        username: row.username.clone(),
        email: row.email.clone(),
    })
}

fn validate_signup(username: &str, email: &str, password: &str) -> Result<(), ApiError> {
    if username.is_empty() || username.chars().count() > 32 {
        return Err(ApiError::Validation(
            "username must be 1-32 characters".into(),
        ));
    }
    if !is_well_formed_email(email) {
        return Err(ApiError::Validation("email must be a valid address".into()));
    }
    if password.chars().count() < 5 {
        return Err(ApiError::Validation(
            "password must be at least 5 characters".into(),
        ));
    }
    Ok(())
}

fn is_well_formed_email(email: &str) -> bool {
    let Some((local, host)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !host.is_empty()
        && host.contains('.')
        && !host.starts_with('.')
        && !host.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}
