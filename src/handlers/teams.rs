use std::collections::{HashMap, HashSet};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use chrono::Utc;
use futures_util::TryStreamExt;
use mongodb::bson::{self, doc, oid::ObjectId, Document};
use mongodb::Collection;
use serde_json::{json, Value};

use crate::database::connection::{MATCHES, TEAMS};
use crate::errors::{translate_duplicate, AppError, Result};
use crate::handlers::matches::load_match;
use crate::handlers::parse_id;
use crate::middleware::auth::require;
use crate::models::matches::{Match, Player};
use crate::models::team::{CreateTeam, SlotView, Team, TeamQuery, TeamView, UpdateTeam};
use crate::models::user::{Capability, Claims};
use crate::services::team_builder::{self, TeamRejection};
use crate::state::AppState;

/// Joins a team's slots with live roster data (side and current points).
fn team_view(team: Team, roster: &HashMap<ObjectId, &Player>) -> TeamView {
    let players = team
        .players
        .into_iter()
        .map(|slot| {
            let live = roster.get(&slot.player_id);
            SlotView {
                player_id: slot.player_id.to_hex(),
                name: slot.name,
                role: slot.role,
                is_captain: slot.is_captain,
                is_vice_captain: slot.is_vice_captain,
                team: live.map(|p| p.team.clone()).unwrap_or_default(),
                points: live.map(|p| p.points).unwrap_or(0.0),
            }
        })
        .collect();

    TeamView {
        id: team.id.map(|id| id.to_hex()).unwrap_or_default(),
        match_id: team.match_id.to_hex(),
        team_name: team.team_name,
        players,
        total_points: team.total_points,
        rank: team.rank,
        created_at: team.created_at,
    }
}

fn roster_index(matches: &[Match]) -> HashMap<ObjectId, &Player> {
    matches
        .iter()
        .flat_map(|m| m.players.iter())
        .map(|p| (p.id, p))
        .collect()
}

async fn load_team(state: &AppState, id: ObjectId) -> Result<Team> {
    state
        .db
        .collection::<Team>(TEAMS)
        .find_one(doc! { "_id": id })
        .await?
        .ok_or(AppError::NotFound("Team"))
}

pub async fn create_team(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateTeam>,
) -> Result<(StatusCode, Json<Value>)> {
    require(&claims, Capability::PlayContests)?;
    let team_name = payload.team_name.trim().to_string();
    let picks = match payload.players {
        Some(picks) if !payload.match_id.trim().is_empty() && !team_name.is_empty() => picks,
        _ => return Err(AppError::invalid_data("Missing required fields")),
    };

    let match_id = parse_id(&payload.match_id, "match")?;
    let m = load_match(&state, match_id).await?;

    let collection: Collection<Team> = state.db.collection(TEAMS);
    let existing = collection
        .count_documents(doc! { "userId": &claims.sub, "matchId": match_id })
        .await?;

    let slots = team_builder::validate_new_team(&m, existing, &picks).map_err(|rejection| {
        tracing::warn!("team for match {} by {} rejected: {}", match_id, claims.sub, rejection);
        rejection
    })?;

    if collection
        .find_one(doc! { "userId": &claims.sub, "matchId": match_id, "teamName": &team_name })
        .await?
        .is_some()
    {
        return Err(TeamRejection::DuplicateName.into());
    }

    let team = Team {
        id: None,
        user_id: claims.sub.clone(),
        match_id,
        team_name,
        players: slots,
        total_points: 0.0,
        rank: 0,
        created_at: Utc::now(),
    };

    // Two concurrent creates with the same name both pass the lookup above;
    // the unique index decides.
    let inserted = collection
        .insert_one(&team)
        .await
        .map_err(|e| translate_duplicate(e, || TeamRejection::DuplicateName.into()))?;
    let team_id = inserted
        .inserted_id
        .as_object_id()
        .ok_or_else(|| AppError::Internal("inserted team has no ObjectId".into()))?;

    tracing::info!("team {} '{}' created for match {} by {}", team_id, team.team_name, match_id, claims.sub);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Team created successfully", "teamId": team_id.to_hex() })),
    ))
}

pub async fn update_team(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateTeam>,
) -> Result<Json<Value>> {
    require(&claims, Capability::PlayContests)?;
    let team_id = parse_id(&id, "team")?;
    let team = load_team(&state, team_id).await?;
    if team.user_id != claims.sub {
        return Err(AppError::forbidden("Not authorized to update this team"));
    }

    let m = state
        .db
        .collection::<Match>(MATCHES)
        .find_one(doc! { "_id": team.match_id })
        .await?
        .ok_or(TeamRejection::MatchNotUpcoming)?;
    team_builder::check_open_for_edit(&m)?;

    let mut changes = Document::new();
    if let Some(picks) = payload.players.as_deref() {
        let slots = team_builder::validate_team_update(&m, picks)?;
        let slots = bson::to_bson(&slots).map_err(|e| AppError::Internal(e.to_string()))?;
        changes.insert("players", slots);
    }
    if let Some(name) = payload.team_name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        changes.insert("teamName", name);
    }
    if changes.is_empty() {
        return Ok(Json(json!({ "message": "Team updated successfully" })));
    }

    state
        .db
        .collection::<Team>(TEAMS)
        .update_one(doc! { "_id": team_id }, doc! { "$set": changes })
        .await
        .map_err(|e| translate_duplicate(e, || TeamRejection::DuplicateName.into()))?;

    tracing::info!("team {} updated by {}", team_id, claims.sub);
    Ok(Json(json!({ "message": "Team updated successfully" })))
}

pub async fn my_teams(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<TeamQuery>,
) -> Result<Json<Vec<TeamView>>> {
    let mut filter = doc! { "userId": &claims.sub };
    if let Some(raw) = query.match_id.as_deref().filter(|s| !s.trim().is_empty()) {
        filter.insert("matchId", parse_id(raw, "match")?);
    }

    let teams: Vec<Team> = state
        .db
        .collection::<Team>(TEAMS)
        .find(filter)
        .sort(doc! { "createdAt": -1 })
        .await?
        .try_collect()
        .await?;

    let match_ids: Vec<ObjectId> = teams
        .iter()
        .map(|t| t.match_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let matches: Vec<Match> = if match_ids.is_empty() {
        Vec::new()
    } else {
        state
            .db
            .collection::<Match>(MATCHES)
            .find(doc! { "_id": { "$in": match_ids } })
            .await?
            .try_collect()
            .await?
    };

    let roster = roster_index(&matches);
    Ok(Json(teams.into_iter().map(|t| team_view(t, &roster)).collect()))
}

pub async fn get_team(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<TeamView>> {
    let team = load_team(&state, parse_id(&id, "team")?).await?;
    if team.user_id != claims.sub && require(&claims, Capability::ViewAnyTeam).is_err() {
        return Err(AppError::forbidden("Not authorized to view this team"));
    }

    let matches: Vec<Match> = state
        .db
        .collection::<Match>(MATCHES)
        .find_one(doc! { "_id": team.match_id })
        .await?
        .into_iter()
        .collect();
    let roster = roster_index(&matches);
    Ok(Json(team_view(team, &roster)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::team_builder::fixtures::{full_match, valid_picks, HOME};

    #[test]
    fn views_carry_live_side_and_points() {
        let mut m = full_match();
        m.players[0].points = 42.0;
        let team = Team {
            id: Some(ObjectId::new()),
            user_id: "u1".into(),
            match_id: m.id.unwrap(),
            team_name: "Titans".into(),
            players: team_builder::build_slots(&m, &valid_picks(&m)).unwrap(),
            total_points: 0.0,
            rank: 0,
            created_at: Utc::now(),
        };
        let matches = vec![m];
        let view = team_view(team, &roster_index(&matches));
        assert_eq!(view.players.len(), 11);
        assert_eq!(view.players[0].team, HOME);
        assert_eq!(view.players[0].points, 42.0);
    }

    #[test]
    fn views_tolerate_a_missing_match() {
        let m = full_match();
        let team = Team {
            id: None,
            user_id: "u1".into(),
            match_id: m.id.unwrap(),
            team_name: "Orphans".into(),
            players: team_builder::build_slots(&m, &valid_picks(&m)).unwrap(),
            total_points: 12.5,
            rank: 3,
            created_at: Utc::now(),
        };
        let view = team_view(team, &HashMap::new());
        assert!(view.players.iter().all(|s| s.team.is_empty() && s.points == 0.0));
        assert_eq!(view.total_points, 12.5);
    }
}
