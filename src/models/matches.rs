use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use mongodb::bson::{self, oid::ObjectId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Upcoming,
    Live,
    Completed,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Upcoming => "upcoming",
            MatchStatus::Live => "live",
            MatchStatus::Completed => "completed",
        }
    }
}

impl FromStr for MatchStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upcoming" => Ok(MatchStatus::Upcoming),
            "live" => Ok(MatchStatus::Live),
            "completed" => Ok(MatchStatus::Completed),
            _ => Err(()),
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlayerRole {
    Batsman,
    Bowler,
    AllRounder,
    WicketKeeper,
}

impl FromStr for PlayerRole {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "batsman" => Ok(PlayerRole::Batsman),
            "bowler" => Ok(PlayerRole::Bowler),
            "all-rounder" => Ok(PlayerRole::AllRounder),
            "wicket-keeper" => Ok(PlayerRole::WicketKeeper),
            _ => Err(()),
        }
    }
}

/// A real player on a match roster. The id is only meaningful within its match.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub team: String,
    pub role: PlayerRole,
    #[serde(default)]
    pub points: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub match_name: String,
    pub teams: Vec<String>,
    pub venue: String,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub match_date: DateTime<Utc>,
    pub status: MatchStatus,
    #[serde(default)]
    pub players: Vec<Player>,
    #[serde(default)]
    pub entry_fee: f64,
    #[serde(default)]
    pub prize_pool: f64,
    #[serde(default = "default_max_teams")]
    pub max_teams_per_user: u32,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

fn default_max_teams() -> u32 {
    1
}

impl Match {
    /// Roster capacity: eleven per declared side.
    pub fn max_roster_size(&self) -> usize {
        self.teams.len() * 11
    }

    pub fn player(&self, id: &ObjectId) -> Option<&Player> {
        self.players.iter().find(|p| &p.id == id)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMatch {
    #[serde(default)]
    pub match_name: String,
    #[serde(default)]
    pub teams: Vec<String>,
    #[serde(default)]
    pub venue: String,
    pub match_date: Option<DateTime<Utc>>,
    pub entry_fee: Option<f64>,
    pub prize_pool: Option<f64>,
    pub max_teams_per_user: Option<u32>,
}

/// Incoming roster entry. Fields stay raw so the roster guard can report
/// exactly which requirement failed.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPlayer {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct AddPlayers {
    #[serde(default)]
    pub players: Vec<NewPlayer>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMatchStatus {
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerPoints {
    pub player_id: String,
    pub points: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePlayerPoints {
    pub player_points: Option<Vec<PlayerPoints>>,
}

#[derive(Debug, Deserialize)]
pub struct MatchQuery {
    pub status: Option<String>,
}

/// Listing projection: everything but the roster.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSummary {
    pub id: String,
    pub match_name: String,
    pub teams: Vec<String>,
    pub venue: String,
    pub match_date: DateTime<Utc>,
    pub status: MatchStatus,
    pub entry_fee: f64,
    pub prize_pool: f64,
}

impl From<Match> for MatchSummary {
    fn from(m: Match) -> Self {
        MatchSummary {
            id: m.id.map(|id| id.to_hex()).unwrap_or_default(),
            match_name: m.match_name,
            teams: m.teams,
            venue: m.venue,
            match_date: m.match_date,
            status: m.status,
            entry_fee: m.entry_fee,
            prize_pool: m.prize_pool,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchDetails {
    #[serde(flatten)]
    pub summary: MatchSummary,
    pub max_teams_per_user: u32,
    pub players: Vec<PlayerView>,
}

/// Roster entry as clients see it: the id as a hex string.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub team: String,
    pub role: PlayerRole,
    pub points: f64,
}

impl From<Player> for PlayerView {
    fn from(p: Player) -> Self {
        PlayerView {
            id: p.id.to_hex(),
            name: p.name,
            team: p.team,
            role: p.role,
            points: p.points,
        }
    }
}

impl From<Match> for MatchDetails {
    fn from(mut m: Match) -> Self {
        let players = std::mem::take(&mut m.players)
            .into_iter()
            .map(PlayerView::from)
            .collect();
        let max_teams_per_user = m.max_teams_per_user;
        MatchDetails {
            summary: MatchSummary::from(m),
            max_teams_per_user,
            players,
        }
    }
}
