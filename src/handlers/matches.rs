use std::collections::HashSet;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use chrono::Utc;
use futures_util::TryStreamExt;
use mongodb::bson::{self, doc, oid::ObjectId, Document};
use mongodb::options::ReturnDocument;
use mongodb::Collection;
use serde_json::{json, Value};

use crate::database::connection::{CONTESTS, MATCHES, TEAMS};
use crate::errors::{AppError, Result};
use crate::handlers::parse_id;
use crate::middleware::auth::require;
use crate::models::contest::{Contest, ContestStatus};
use crate::models::matches::{
    AddPlayers, CreateMatch, Match, MatchDetails, MatchQuery, MatchStatus, MatchSummary, PlayerView,
    UpdateMatchStatus, UpdatePlayerPoints,
};
use crate::models::team::Team;
use crate::models::user::{Capability, Claims};
use crate::services::{results, roster};
use crate::state::AppState;

/// Validates a create request into a new upcoming match with an empty roster.
fn build_match(payload: CreateMatch, created_by: &str) -> Result<Match> {
    let match_name = payload.match_name.trim().to_string();
    let venue = payload.venue.trim().to_string();
    if match_name.is_empty() || venue.is_empty() || payload.teams.is_empty() {
        return Err(AppError::invalid_data("Missing required fields"));
    }
    let match_date = payload
        .match_date
        .ok_or_else(|| AppError::invalid_data("Missing required fields"))?;

    let teams: Vec<String> = payload.teams.iter().map(|t| t.trim().to_string()).collect();
    if teams.len() < 2 {
        return Err(AppError::invalid_data("A match needs at least two teams"));
    }
    if teams.iter().any(String::is_empty) {
        return Err(AppError::invalid_data("Team names cannot be empty"));
    }
    let distinct: HashSet<&str> = teams.iter().map(String::as_str).collect();
    if distinct.len() != teams.len() {
        return Err(AppError::invalid_data("Team names must be distinct"));
    }

    let entry_fee = payload.entry_fee.unwrap_or(0.0);
    let prize_pool = payload.prize_pool.unwrap_or(0.0);
    if !(entry_fee.is_finite() && entry_fee >= 0.0 && prize_pool.is_finite() && prize_pool >= 0.0) {
        return Err(AppError::invalid_data("Entry fee and prize pool cannot be negative"));
    }
    let max_teams_per_user = payload.max_teams_per_user.unwrap_or(1);
    if max_teams_per_user < 1 {
        return Err(AppError::invalid_data("maxTeamsPerUser must be at least 1"));
    }

    Ok(Match {
        id: None,
        match_name,
        teams,
        venue,
        match_date,
        status: MatchStatus::Upcoming,
        players: Vec::new(),
        entry_fee,
        prize_pool,
        max_teams_per_user,
        created_at: Utc::now(),
        created_by: created_by.to_string(),
    })
}

pub(crate) async fn load_match(state: &AppState, id: ObjectId) -> Result<Match> {
    state
        .db
        .collection::<Match>(MATCHES)
        .find_one(doc! { "_id": id })
        .await?
        .ok_or(AppError::NotFound("Match"))
}

pub async fn create_match(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateMatch>,
) -> Result<(StatusCode, Json<Value>)> {
    require(&claims, Capability::ManageMatches)?;
    let new_match = build_match(payload, &claims.sub)?;

    let collection: Collection<Match> = state.db.collection(MATCHES);
    let inserted = collection.insert_one(&new_match).await?;
    let match_id = inserted
        .inserted_id
        .as_object_id()
        .ok_or_else(|| AppError::Internal("inserted match has no ObjectId".into()))?;

    tracing::info!("match {} '{}' created by {}", match_id, new_match.match_name, claims.sub);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Match created successfully", "matchId": match_id.to_hex() })),
    ))
}

pub async fn add_players(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(payload): Json<AddPlayers>,
) -> Result<Json<Value>> {
    require(&claims, Capability::ManageMatches)?;
    if payload.players.is_empty() {
        return Err(roster::RosterRejection::EmptyBatch.into());
    }
    let match_id = parse_id(&id, "match")?;
    let mut m = load_match(&state, match_id).await?;
    let roster_before = m.players.len() as i64;

    let total = roster::add_players(&mut m, &payload.players, Utc::now())?;

    // Only write over the roster we validated against.
    let players = bson::to_bson(&m.players).map_err(|e| AppError::Internal(e.to_string()))?;
    let result = state
        .db
        .collection::<Match>(MATCHES)
        .update_one(
            doc! { "_id": match_id, "players": { "$size": roster_before } },
            doc! { "$set": { "players": players } },
        )
        .await?;
    if result.matched_count == 0 {
        tracing::warn!("roster of match {} changed while adding players", match_id);
        return Err(AppError::Conflict("The roster changed, please retry".into()));
    }

    tracing::info!("added {} players to match {}", payload.players.len(), match_id);
    Ok(Json(json!({ "message": "Players added successfully", "totalPlayers": total })))
}

pub async fn update_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateMatchStatus>,
) -> Result<Json<Value>> {
    require(&claims, Capability::ManageMatches)?;
    let status: MatchStatus = payload
        .status
        .as_deref()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| AppError::invalid_data("Valid status is required"))?;
    let match_id = parse_id(&id, "match")?;

    state
        .db
        .collection::<Match>(MATCHES)
        .find_one_and_update(doc! { "_id": match_id }, doc! { "$set": { "status": status.as_str() } })
        .return_document(ReturnDocument::After)
        .await?
        .ok_or(AppError::NotFound("Match"))?;

    if status == MatchStatus::Completed {
        let closed = state
            .db
            .collection::<Contest>(CONTESTS)
            .update_many(
                doc! { "matchId": match_id, "status": { "$ne": ContestStatus::Completed.as_str() } },
                doc! { "$set": { "status": ContestStatus::Closed.as_str() } },
            )
            .await?;
        tracing::info!("match {} completed, {} contests closed", match_id, closed.modified_count);
    } else {
        tracing::info!("match {} is now {}", match_id, status);
    }

    Ok(Json(json!({ "message": "Match status updated successfully" })))
}

pub async fn update_player_points(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(payload): Json<UpdatePlayerPoints>,
) -> Result<Json<Value>> {
    require(&claims, Capability::SubmitPoints)?;
    let updates = payload
        .player_points
        .ok_or_else(|| AppError::invalid_data("Player points array is required"))?;
    let match_id = parse_id(&id, "match")?;

    let summary = results::publish_results(&state.db, match_id, &updates).await?;
    Ok(Json(json!({
        "message": "Player points updated and team rankings calculated",
        "teamsScored": summary.teams_scored,
        "contestsRanked": summary.contests_ranked,
    })))
}

pub async fn list_matches(
    State(state): State<AppState>,
    Query(query): Query<MatchQuery>,
) -> Result<Json<Vec<MatchSummary>>> {
    let mut filter = Document::new();
    // Unknown status values are ignored rather than rejected.
    if let Some(status) = query.status.as_deref().and_then(|s| s.parse::<MatchStatus>().ok()) {
        filter.insert("status", status.as_str());
    }

    let matches: Vec<Match> = state
        .db
        .collection::<Match>(MATCHES)
        .find(filter)
        .sort(doc! { "matchDate": 1 })
        .await?
        .try_collect()
        .await?;

    tracing::debug!("listing {} matches", matches.len());
    Ok(Json(matches.into_iter().map(MatchSummary::from).collect()))
}

pub async fn user_matches(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<MatchSummary>>> {
    let teams: Vec<Team> = state
        .db
        .collection::<Team>(TEAMS)
        .find(doc! { "userId": &claims.sub })
        .await?
        .try_collect()
        .await?;

    let mut seen = HashSet::new();
    let match_ids: Vec<ObjectId> = teams
        .iter()
        .map(|t| t.match_id)
        .filter(|id| seen.insert(*id))
        .collect();
    if match_ids.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let matches: Vec<Match> = state
        .db
        .collection::<Match>(MATCHES)
        .find(doc! { "_id": { "$in": match_ids } })
        .sort(doc! { "matchDate": 1 })
        .await?
        .try_collect()
        .await?;

    Ok(Json(matches.into_iter().map(MatchSummary::from).collect()))
}

pub async fn get_match(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MatchDetails>> {
    let m = load_match(&state, parse_id(&id, "match")?).await?;
    Ok(Json(MatchDetails::from(m)))
}

pub async fn get_match_players(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<PlayerView>>> {
    let m = load_match(&state, parse_id(&id, "match")?).await?;
    Ok(Json(m.players.into_iter().map(PlayerView::from).collect()))
}
