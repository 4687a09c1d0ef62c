pub mod auth;
pub mod context;
pub mod error;
pub mod thoughts;
pub mod token;
pub mod users;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use chrono::{DateTime, SecondsFormat, Utc};
use tracing::warn;
use uuid::Uuid;

use crate::auth::AppState;

/// Build the full API router. Shared by the server binary and the
/// integration tests.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/thoughts", get(thoughts::list_thoughts).post(thoughts::add_thought))
        .route("/thoughts/{id}", get(thoughts::get_thought))
        .route("/thoughts/{id}/reactions", post(thoughts::add_reaction))
        .route("/users", get(users::list_users))
        .route("/users/{username}", get(users::get_user))
        .route("/me", get(users::me))
        .route("/me/friends", post(users::add_friend))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            context::attach_identity,
        ))
        .with_state(state)
}

/// Run blocking DB work off the async runtime.
pub(crate) async fn run_blocking<F, T>(f: F) -> anyhow::Result<T>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| anyhow::anyhow!("blocking task join error: {}", e))?
}

/// Timestamps are stored as RFC 3339 at fixed microsecond precision so that
/// lexicographic ORDER BY in SQLite equals chronological order.
pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(raw: &str, owner: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // Tolerate SQLite's bare "YYYY-MM-DD HH:MM:SS" form
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("corrupt created_at '{}' on '{}': {}", raw, owner, e);
            DateTime::default()
        })
}

pub(crate) fn parse_id(raw: &str, what: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("corrupt {} id '{}': {}", what, raw, e);
        Uuid::default()
    })
}
