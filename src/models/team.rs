use chrono::{DateTime, Utc};
use mongodb::bson::{self, oid::ObjectId};
use serde::{Deserialize, Serialize};

use crate::models::matches::PlayerRole;

/// One pick in a fantasy team. Name and role are copied from the roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamSlot {
    pub player_id: ObjectId,
    pub name: String,
    pub role: PlayerRole,
    #[serde(default)]
    pub is_captain: bool,
    #[serde(default)]
    pub is_vice_captain: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: String,
    pub match_id: ObjectId,
    pub team_name: String,
    pub players: Vec<TeamSlot>,
    #[serde(default)]
    pub total_points: f64,
    #[serde(default)]
    pub rank: u32,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

/// What the caller controls about a slot: which player, and the armbands.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotSelection {
    #[serde(default)]
    pub player_id: String,
    #[serde(default)]
    pub is_captain: bool,
    #[serde(default)]
    pub is_vice_captain: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeam {
    #[serde(default)]
    pub match_id: String,
    #[serde(default)]
    pub team_name: String,
    pub players: Option<Vec<SlotSelection>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTeam {
    pub team_name: Option<String>,
    pub players: Option<Vec<SlotSelection>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamQuery {
    pub match_id: Option<String>,
}

/// A slot enriched with live roster data for the "my teams" view.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotView {
    pub player_id: String,
    pub name: String,
    pub role: PlayerRole,
    pub is_captain: bool,
    pub is_vice_captain: bool,
    pub team: String,
    pub points: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamView {
    pub id: String,
    pub match_id: String,
    pub team_name: String,
    pub players: Vec<SlotView>,
    pub total_points: f64,
    pub rank: u32,
    pub created_at: DateTime<Utc>,
}
