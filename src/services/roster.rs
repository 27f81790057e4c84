//! Roster mutation rules for a match: adding players before the start and
//! writing final points after completion. Both are all-or-nothing.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use thiserror::Error;

use crate::models::matches::{Match, MatchStatus, NewPlayer, Player, PlayerPoints, PlayerRole};

pub const MAX_PER_SIDE: usize = 11;

#[derive(Debug, Error, PartialEq)]
pub enum RosterRejection {
    #[error("Players array is required")]
    EmptyBatch,

    #[error("The match has already started")]
    MatchStarted,

    #[error("The match already has {0} players")]
    RosterFull(usize),

    #[error("Each player must have name, team, and role")]
    MissingField,

    #[error("Invalid player role: {0}")]
    InvalidRole(String),

    #[error("Player team must be one of the match teams: {}", .0.join(", "))]
    ForeignTeam(Vec<String>),

    #[error("Player {0} is already on the roster")]
    DuplicatePlayer(String),

    #[error("Team {0} cannot have more than 11 players")]
    SideFull(String),

    #[error("Cannot update points for match that is not completed")]
    MatchNotCompleted,

    #[error("Player with ID {0} not found in match")]
    UnknownPlayer(String),

    #[error("Points for player {0} must be a finite number")]
    InvalidPoints(String),
}

/// Validates the whole batch, then appends it. Returns the new roster size.
pub fn add_players(
    m: &mut Match,
    batch: &[NewPlayer],
    now: DateTime<Utc>,
) -> Result<usize, RosterRejection> {
    if batch.is_empty() {
        return Err(RosterRejection::EmptyBatch);
    }
    if m.match_date <= now {
        return Err(RosterRejection::MatchStarted);
    }
    let capacity = m.max_roster_size();
    if m.players.len() >= capacity {
        return Err(RosterRejection::RosterFull(capacity));
    }

    let mut names: HashSet<&str> = m.players.iter().map(|p| p.name.as_str()).collect();
    let mut accepted = Vec::with_capacity(batch.len());
    for incoming in batch {
        let (name, team, role) = (incoming.name.trim(), incoming.team.trim(), incoming.role.trim());
        if name.is_empty() || team.is_empty() || role.is_empty() {
            return Err(RosterRejection::MissingField);
        }
        let role: PlayerRole = role
            .parse()
            .map_err(|_| RosterRejection::InvalidRole(role.to_string()))?;
        if !m.teams.iter().any(|t| t == team) {
            return Err(RosterRejection::ForeignTeam(m.teams.clone()));
        }
        if !names.insert(name) {
            return Err(RosterRejection::DuplicatePlayer(name.to_string()));
        }
        accepted.push((name, team, role));
    }

    let mut per_side: HashMap<&str, usize> = HashMap::new();
    for p in &m.players {
        *per_side.entry(p.team.as_str()).or_insert(0) += 1;
    }
    for (_, team, _) in &accepted {
        *per_side.entry(*team).or_insert(0) += 1;
    }
    for side in &m.teams {
        if per_side.get(side.as_str()).copied().unwrap_or(0) > MAX_PER_SIDE {
            return Err(RosterRejection::SideFull(side.clone()));
        }
    }

    let new_players: Vec<Player> = accepted
        .into_iter()
        .map(|(name, team, role)| Player {
            id: ObjectId::new(),
            name: name.to_string(),
            team: team.to_string(),
            role,
            points: 0.0,
        })
        .collect();
    m.players.extend(new_players);
    Ok(m.players.len())
}

/// Overwrites roster points for a completed match. Every id must resolve
/// before anything is written.
pub fn apply_points(m: &mut Match, updates: &[PlayerPoints]) -> Result<(), RosterRejection> {
    if m.status != MatchStatus::Completed {
        return Err(RosterRejection::MatchNotCompleted);
    }

    let index: HashMap<String, usize> = m
        .players
        .iter()
        .enumerate()
        .map(|(i, p)| (p.id.to_hex(), i))
        .collect();

    let mut resolved = Vec::with_capacity(updates.len());
    for update in updates {
        let slot = index
            .get(update.player_id.as_str())
            .ok_or_else(|| RosterRejection::UnknownPlayer(update.player_id.clone()))?;
        if !update.points.is_finite() {
            return Err(RosterRejection::InvalidPoints(update.player_id.clone()));
        }
        resolved.push((*slot, update.points));
    }

    for (slot, points) in resolved {
        m.players[slot].points = points;
    }
    Ok(())
}
