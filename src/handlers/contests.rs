use std::collections::HashSet;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use chrono::Utc;
use futures_util::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Document};
use mongodb::options::ReturnDocument;
use mongodb::Collection;
use serde_json::{json, Value};

use crate::database::connection::{CONTESTS, TEAMS};
use crate::errors::{AppError, Result};
use crate::handlers::matches::load_match;
use crate::handlers::parse_id;
use crate::middleware::auth::require;
use crate::models::contest::{
    Contest, ContestDetails, ContestQuery, ContestStatus, ContestSummary, CreateContest, JoinContest,
    LeaderboardEntry,
};
use crate::models::matches::MatchStatus;
use crate::models::team::Team;
use crate::models::user::{Capability, Claims};
use crate::services::ranking;
use crate::state::AppState;

fn build_contest(payload: CreateContest, match_id: ObjectId, created_by: &str) -> Result<Contest> {
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::invalid_data("Contest name is required"));
    }
    let total_spots = payload
        .total_spots
        .filter(|spots| *spots >= 1)
        .ok_or_else(|| AppError::invalid_data("totalSpots must be at least 1"))?;
    for amount in [payload.entry_fee, payload.prize_pool] {
        if !amount.is_finite() || amount < 0.0 {
            return Err(AppError::invalid_data("Entry fee and prize pool cannot be negative"));
        }
    }

    let mut ranks = HashSet::new();
    let mut share = 0.0;
    for tier in &payload.winner_distribution {
        if tier.rank < 1 {
            return Err(AppError::invalid_data("Winner ranks start at 1"));
        }
        if !ranks.insert(tier.rank) {
            return Err(AppError::invalid_data(format!("Rank {} appears twice in the distribution", tier.rank)));
        }
        if !(tier.percentage.is_finite() && tier.percentage > 0.0) {
            return Err(AppError::invalid_data("Distribution percentages must be positive"));
        }
        share += tier.percentage;
    }
    if share > 100.0 {
        return Err(AppError::invalid_data("Winner distribution exceeds 100%"));
    }

    let mut winner_distribution = payload.winner_distribution;
    winner_distribution.sort_by_key(|tier| tier.rank);

    Ok(Contest {
        id: None,
        match_id,
        name,
        entry_fee: payload.entry_fee,
        total_spots,
        filled_spots: 0,
        prize_pool: payload.prize_pool,
        winner_distribution,
        teams: Vec::new(),
        status: ContestStatus::Open,
        created_at: Utc::now(),
        created_by: created_by.to_string(),
    })
}

/// Why `team_id` cannot enter `contest`, if anything stops it.
fn join_rejection(contest: &Contest, team_id: &ObjectId) -> Option<&'static str> {
    if contest.status != ContestStatus::Open {
        Some("Contest is not open for joining")
    } else if contest.teams.contains(team_id) {
        Some("Team already joined this contest")
    } else if contest.filled_spots >= contest.total_spots {
        Some("Contest is full")
    } else {
        None
    }
}

/// Standings computed from the contest's own entries. A team's stored `rank`
/// belongs to whichever contest was ranked last, so it is never read here.
/// Ranks and prizes appear only once the contest is completed.
fn leaderboard(contest: &Contest, teams: Vec<Team>) -> Vec<LeaderboardEntry> {
    let completed = contest.status == ContestStatus::Completed;
    let scored: Vec<(usize, f64)> = teams.iter().map(|t| t.total_points).enumerate().collect();
    let mut teams: Vec<Option<Team>> = teams.into_iter().map(Some).collect();

    ranking::competition_ranks(&scored)
        .into_iter()
        .filter_map(|(idx, total_points, rank)| {
            let team = teams[idx].take()?;
            let rank = if completed { rank } else { 0 };
            Some(LeaderboardEntry {
                team_id: team.id.map(|id| id.to_hex()).unwrap_or_default(),
                team_name: team.team_name,
                user_id: team.user_id,
                total_points,
                rank,
                prize: if rank > 0 { contest.prize_for_rank(rank) } else { 0.0 },
            })
        })
        .collect()
}

async fn load_contest(collection: &Collection<Contest>, id: ObjectId) -> Result<Contest> {
    collection
        .find_one(doc! { "_id": id })
        .await?
        .ok_or(AppError::NotFound("Contest"))
}

pub async fn create_contest(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateContest>,
) -> Result<(StatusCode, Json<Value>)> {
    require(&claims, Capability::ManageContests)?;
    let match_id = parse_id(&payload.match_id, "match")?;
    let m = load_match(&state, match_id).await?;
    if m.status == MatchStatus::Completed {
        return Err(AppError::invalid_data("Cannot create a contest for a completed match"));
    }

    let contest = build_contest(payload, match_id, &claims.sub)?;
    let inserted = state
        .db
        .collection::<Contest>(CONTESTS)
        .insert_one(&contest)
        .await?;
    let contest_id = inserted
        .inserted_id
        .as_object_id()
        .ok_or_else(|| AppError::Internal("inserted contest has no ObjectId".into()))?;

    tracing::info!("contest {} '{}' created for match {}", contest_id, contest.name, match_id);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Contest created successfully", "contestId": contest_id.to_hex() })),
    ))
}

pub async fn join_contest(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(payload): Json<JoinContest>,
) -> Result<Json<Value>> {
    require(&claims, Capability::PlayContests)?;
    let contest_id = parse_id(&id, "contest")?;
    let team_id = parse_id(&payload.team_id, "team")?;

    let contests: Collection<Contest> = state.db.collection(CONTESTS);
    let contest = load_contest(&contests, contest_id).await?;

    let team = state
        .db
        .collection::<Team>(TEAMS)
        .find_one(doc! { "_id": team_id })
        .await?
        .ok_or(AppError::NotFound("Team"))?;
    if team.user_id != claims.sub {
        return Err(AppError::forbidden("Not authorized to use this team"));
    }
    if team.match_id != contest.match_id {
        return Err(AppError::invalid_data("Team does not belong to this contest's match"));
    }
    if let Some(reason) = join_rejection(&contest, &team_id) {
        return Err(AppError::invalid_data(reason));
    }

    // Status, membership and capacity are re-checked by the store in the same
    // write, so concurrent joins cannot overfill the contest.
    let joined = contests
        .find_one_and_update(
            doc! {
                "_id": contest_id,
                "status": ContestStatus::Open.as_str(),
                "teams": { "$ne": team_id },
                "$expr": { "$lt": ["$filledSpots", "$totalSpots"] },
            },
            doc! {
                "$push": { "teams": team_id },
                "$inc": { "filledSpots": 1 },
            },
        )
        .return_document(ReturnDocument::After)
        .await?;

    let Some(joined) = joined else {
        let current = load_contest(&contests, contest_id).await?;
        let reason = join_rejection(&current, &team_id).unwrap_or("Could not join contest, please retry");
        tracing::warn!("join of contest {} by team {} lost a race: {}", contest_id, team_id, reason);
        return Err(AppError::invalid_data(reason));
    };

    tracing::info!("team {} joined contest {} ({}/{})", team_id, contest_id, joined.filled_spots, joined.total_spots);
    Ok(Json(json!({
        "message": "Joined contest successfully",
        "filledSpots": joined.filled_spots,
        "totalSpots": joined.total_spots,
    })))
}

pub async fn list_contests(
    State(state): State<AppState>,
    Query(query): Query<ContestQuery>,
) -> Result<Json<Vec<ContestSummary>>> {
    let mut filter = Document::new();
    if let Some(raw) = query.match_id.as_deref().filter(|s| !s.trim().is_empty()) {
        filter.insert("matchId", parse_id(raw, "match")?);
    }

    let contests: Vec<Contest> = state
        .db
        .collection::<Contest>(CONTESTS)
        .find(filter)
        .sort(doc! { "createdAt": -1 })
        .await?
        .try_collect()
        .await?;

    Ok(Json(contests.into_iter().map(ContestSummary::from).collect()))
}

pub async fn get_contest(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ContestDetails>> {
    let contests: Collection<Contest> = state.db.collection(CONTESTS);
    let contest = load_contest(&contests, parse_id(&id, "contest")?).await?;

    let teams: Vec<Team> = if contest.teams.is_empty() {
        Vec::new()
    } else {
        state
            .db
            .collection::<Team>(TEAMS)
            .find(doc! { "_id": { "$in": contest.teams.clone() } })
            .await?
            .try_collect()
            .await?
    };

    let leaderboard = leaderboard(&contest, teams);
    Ok(Json(ContestDetails {
        summary: ContestSummary::from(contest),
        leaderboard,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::contest::PrizeTier;

    fn request(distribution: Vec<PrizeTier>) -> CreateContest {
        CreateContest {
            match_id: ObjectId::new().to_hex(),
            name: "Mega Contest".into(),
            entry_fee: 49.0,
            total_spots: Some(100),
            prize_pool: 4000.0,
            winner_distribution: distribution,
        }
    }

    fn tier(rank: u32, percentage: f64) -> PrizeTier {
        PrizeTier { rank, percentage }
    }

    fn open_contest() -> Contest {
        build_contest(request(vec![tier(1, 60.0), tier(2, 40.0)]), ObjectId::new(), "admin").unwrap()
    }

    fn entry(name: &str, stale_rank: u32, points: f64) -> Team {
        Team {
            id: Some(ObjectId::new()),
            user_id: format!("{}-owner", name),
            match_id: ObjectId::new(),
            team_name: name.into(),
            players: Vec::new(),
            total_points: points,
            rank: stale_rank,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn distribution_is_validated_and_sorted() {
        let contest = build_contest(request(vec![tier(2, 30.0), tier(1, 70.0)]), ObjectId::new(), "admin").unwrap();
        assert_eq!(contest.winner_distribution[0].rank, 1);
        assert_eq!(contest.status, ContestStatus::Open);

        assert!(build_contest(request(vec![tier(1, 80.0), tier(2, 30.0)]), ObjectId::new(), "a").is_err());
        assert!(build_contest(request(vec![tier(1, 50.0), tier(1, 10.0)]), ObjectId::new(), "a").is_err());
        assert!(build_contest(request(vec![tier(0, 50.0)]), ObjectId::new(), "a").is_err());
        assert!(build_contest(request(vec![tier(1, 0.0)]), ObjectId::new(), "a").is_err());
    }

    #[test]
    fn spots_and_name_are_required() {
        let mut req = request(vec![]);
        req.total_spots = Some(0);
        assert!(build_contest(req, ObjectId::new(), "a").is_err());

        let mut req = request(vec![]);
        req.name = "  ".into();
        assert!(build_contest(req, ObjectId::new(), "a").is_err());
    }

    #[test]
    fn join_rejections_name_the_reason() {
        let mut contest = open_contest();
        let team = ObjectId::new();
        assert_eq!(join_rejection(&contest, &team), None);

        contest.teams.push(team);
        assert_eq!(join_rejection(&contest, &team), Some("Team already joined this contest"));

        contest.filled_spots = contest.total_spots;
        assert_eq!(join_rejection(&contest, &ObjectId::new()), Some("Contest is full"));

        contest.status = ContestStatus::Closed;
        assert_eq!(join_rejection(&contest, &ObjectId::new()), Some("Contest is not open for joining"));
    }

    #[test]
    fn leaderboard_ranks_and_pays_a_completed_contest() {
        let mut contest = open_contest();
        contest.status = ContestStatus::Completed;
        let teams = vec![
            entry("third", 0, 50.0),
            entry("first-a", 0, 80.0),
            entry("fourth", 0, 12.5),
            entry("first-b", 0, 80.0),
        ];
        let board = leaderboard(&contest, teams);
        let order: Vec<(&str, u32)> = board.iter().map(|e| (e.team_name.as_str(), e.rank)).collect();
        assert_eq!(order, vec![("first-a", 1), ("first-b", 1), ("third", 3), ("fourth", 4)]);
        assert_eq!(board[0].prize, 2400.0);
        assert_eq!(board[1].prize, 2400.0);
        assert_eq!(board[2].prize, 0.0);
    }

    #[test]
    fn open_contests_list_entries_without_ranks_or_prizes() {
        let board = leaderboard(&open_contest(), vec![entry("a", 0, 0.0), entry("b", 0, 0.0)]);
        assert_eq!(board.len(), 2);
        assert!(board.iter().all(|e| e.rank == 0 && e.prize == 0.0));
    }

    #[test]
    fn shared_team_is_ranked_within_each_contest() {
        // `mid` is in both contests. Publishing ranked B last, so its stored
        // rank of 2 comes from B, where `high` beat it.
        let low = entry("low", 2, 85.5);
        let mid = entry("mid", 2, 91.5);
        let high = entry("high", 1, 120.0);

        let mut contest_a = build_contest(request(vec![tier(1, 100.0)]), ObjectId::new(), "admin").unwrap();
        contest_a.status = ContestStatus::Completed;
        contest_a.teams = vec![low.id.unwrap(), mid.id.unwrap()];
        let mut contest_b = contest_a.clone();
        contest_b.teams = vec![mid.id.unwrap(), high.id.unwrap()];

        let board_a = leaderboard(&contest_a, vec![low.clone(), mid.clone()]);
        let ranks_a: Vec<(&str, u32, f64)> =
            board_a.iter().map(|e| (e.team_name.as_str(), e.rank, e.prize)).collect();
        assert_eq!(ranks_a, vec![("mid", 1, 4000.0), ("low", 2, 0.0)]);

        let board_b = leaderboard(&contest_b, vec![mid, high]);
        let ranks_b: Vec<(&str, u32, f64)> =
            board_b.iter().map(|e| (e.team_name.as_str(), e.rank, e.prize)).collect();
        assert_eq!(ranks_b, vec![("high", 1, 4000.0), ("mid", 2, 0.0)]);
    }
}
