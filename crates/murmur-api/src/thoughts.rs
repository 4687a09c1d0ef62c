//! The thoughts feed: public reads, identity-gated writes.

use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use murmur_db::models::{ReactionRow, ThoughtRow};
use murmur_db::{Database, ThoughtFilter};
use murmur_types::api::{AddReactionRequest, AddThoughtRequest};
use murmur_types::models::{Reaction, Thought};

use crate::auth::AppState;
use crate::context::RequestContext;
use crate::error::ApiError;
use crate::{format_timestamp, parse_id, parse_timestamp, run_blocking};

const MAX_BODY_CHARS: usize = 280;

#[derive(Debug, Deserialize)]
pub struct ThoughtQuery {
    pub username: Option<String>,
}

pub async fn list_thoughts(
    State(state): State<AppState>,
    Query(query): Query<ThoughtQuery>,
) -> Result<Json<Vec<Thought>>, ApiError> {
    let filter = match query.username {
        Some(username) => ThoughtFilter::ByUsername(username),
        None => ThoughtFilter::All,
    };

    let db = state.clone();
    let thoughts = run_blocking(move || load_thoughts(&db.db, &filter)).await?;
    Ok(Json(thoughts))
}

pub async fn get_thought(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Thought>, ApiError> {
    let db = state.clone();
    let thought = run_blocking(move || {
        let Some(row) = db.db.get_thought(&id.to_string())? else {
            return Ok(None);
        };
        let reactions = db.db.get_reactions_for_thought(&row.id)?;
        Ok(Some(project_thought(row, reactions)))
    })
    .await?;

    thought.map(Json).ok_or(ApiError::NotFound)
}

pub async fn add_thought(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(req): Json<AddThoughtRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Identity check comes before validation and storage, uniformly across
    // all mutations.
    let identity = ctx.require_identity()?.clone();

    let text = req.thought_text.trim().to_string();
    validate_body(&text, "thought_text")?;

    let id = Uuid::new_v4();
    let created_at = Utc::now();

    let db = state.clone();
    {
        let text = text.clone();
        let username = identity.username.clone();
        let created = format_timestamp(&created_at);
        run_blocking(move || db.db.insert_thought(&id.to_string(), &text, &username, &created))
            .await?;
    }

    Ok((
        StatusCode::CREATED,
        Json(Thought {
            id,
            thought_text: text,
            username: identity.username,
            created_at,
            reactions: vec![],
        }),
    ))
}

pub async fn add_reaction(
    State(state): State<AppState>,
    Path(thought_id): Path<Uuid>,
    Extension(ctx): Extension<RequestContext>,
    Json(req): Json<AddReactionRequest>,
) -> Result<Json<Thought>, ApiError> {
    let identity = ctx.require_identity()?.clone();

    let body = req.reaction_body.trim().to_string();
    validate_body(&body, "reaction_body")?;

    let db = state.clone();
    let thought = run_blocking(move || {
        let inserted = db.db.insert_reaction(
            &Uuid::new_v4().to_string(),
            &thought_id.to_string(),
            &body,
            &identity.username,
            &format_timestamp(&Utc::now()),
        )?;
        if !inserted {
            return Ok(None);
        }
        let Some(row) = db.db.get_thought(&thought_id.to_string())? else {
            return Ok(None);
        };
        let reactions = db.db.get_reactions_for_thought(&row.id)?;
        Ok(Some(project_thought(row, reactions)))
    })
    .await?;

    thought.map(Json).ok_or(ApiError::NotFound)
}

/// Blocking. List thoughts and batch-fetch their reactions in one pass
/// instead of a per-thought query.
pub(crate) fn load_thoughts(db: &Database, filter: &ThoughtFilter) -> anyhow::Result<Vec<Thought>> {
    let rows = db.list_thoughts(filter)?;
    let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
    let reaction_rows = db.get_reactions_for_thoughts(&ids)?;

    let mut by_thought: HashMap<String, Vec<ReactionRow>> = HashMap::new();
    for r in reaction_rows {
        by_thought.entry(r.thought_id.clone()).or_default().push(r);
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let reactions = by_thought.remove(&row.id).unwrap_or_default();
            project_thought(row, reactions)
        })
        .collect())
}

pub(crate) fn project_thought(row: ThoughtRow, reactions: Vec<ReactionRow>) -> Thought {
    let id = parse_id(&row.id, "thought");
    let created_at = parse_timestamp(&row.created_at, &row.id);
    Thought {
        id,
        thought_text: row.thought_text,
        username: row.username,
        created_at,
        reactions: reactions
            .into_iter()
            .map(|r| {
                let id = parse_id(&r.id, "reaction");
                let created_at = parse_timestamp(&r.created_at, &r.id);
                Reaction {
                    id,
                    reaction_body: r.reaction_body,
                    username: r.username,
                    created_at,
                }
            })
            .collect(),
    }
}

fn validate_body(text: &str, field: &str) -> Result<(), ApiError> {
    if text.is_empty() {
        return Err(ApiError::Validation(format!("{} is required", field)));
    }
    if text.chars().count() > MAX_BODY_CHARS {
        return Err(ApiError::Validation(format!(
            "{} must be at most {} characters",
            field, MAX_BODY_CHARS
        )));
    }
    Ok(())
}
