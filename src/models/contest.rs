use chrono::{DateTime, Utc};
use mongodb::bson::{self, oid::ObjectId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContestStatus {
    Open,
    Closed,
    Completed,
}

impl ContestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContestStatus::Open => "open",
            ContestStatus::Closed => "closed",
            ContestStatus::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrizeTier {
    pub rank: u32,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contest {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub match_id: ObjectId,
    pub name: String,
    pub entry_fee: f64,
    pub total_spots: u32,
    #[serde(default)]
    pub filled_spots: u32,
    pub prize_pool: f64,
    #[serde(default)]
    pub winner_distribution: Vec<PrizeTier>,
    #[serde(default)]
    pub teams: Vec<ObjectId>,
    pub status: ContestStatus,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

impl Contest {
    /// Prize owed to a rank under the winner distribution (display only).
    pub fn prize_for_rank(&self, rank: u32) -> f64 {
        self.winner_distribution
            .iter()
            .find(|tier| tier.rank == rank)
            .map(|tier| self.prize_pool * tier.percentage / 100.0)
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateContest {
    #[serde(default)]
    pub match_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub entry_fee: f64,
    pub total_spots: Option<u32>,
    #[serde(default)]
    pub prize_pool: f64,
    #[serde(default)]
    pub winner_distribution: Vec<PrizeTier>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinContest {
    #[serde(default)]
    pub team_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContestQuery {
    pub match_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub team_id: String,
    pub team_name: String,
    pub user_id: String,
    pub total_points: f64,
    pub rank: u32,
    pub prize: f64,
}

/// Listing projection: everything but the entered team ids.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContestSummary {
    pub id: String,
    pub match_id: String,
    pub name: String,
    pub entry_fee: f64,
    pub total_spots: u32,
    pub filled_spots: u32,
    pub prize_pool: f64,
    pub winner_distribution: Vec<PrizeTier>,
    pub status: ContestStatus,
    pub created_at: DateTime<Utc>,
}

impl From<Contest> for ContestSummary {
    fn from(c: Contest) -> Self {
        ContestSummary {
            id: c.id.map(|id| id.to_hex()).unwrap_or_default(),
            match_id: c.match_id.to_hex(),
            name: c.name,
            entry_fee: c.entry_fee,
            total_spots: c.total_spots,
            filled_spots: c.filled_spots,
            prize_pool: c.prize_pool,
            winner_distribution: c.winner_distribution,
            status: c.status,
            created_at: c.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ContestDetails {
    #[serde(flatten)]
    pub summary: ContestSummary,
    pub leaderboard: Vec<LeaderboardEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prize_follows_distribution() {
        let contest = Contest {
            id: None,
            match_id: ObjectId::new(),
            name: "Mega".into(),
            entry_fee: 50.0,
            total_spots: 10,
            filled_spots: 0,
            prize_pool: 1000.0,
            winner_distribution: vec![
                PrizeTier { rank: 1, percentage: 50.0 },
                PrizeTier { rank: 2, percentage: 30.0 },
            ],
            teams: vec![],
            status: ContestStatus::Open,
            created_at: Utc::now(),
            created_by: "admin".into(),
        };
        assert_eq!(contest.prize_for_rank(1), 500.0);
        assert_eq!(contest.prize_for_rank(2), 300.0);
        assert_eq!(contest.prize_for_rank(3), 0.0);
    }
}
