//! Publishing match results: roster points → team totals → contest ranks.
//!
//! The plan is computed in memory first, then written inside one MongoDB
//! transaction so a failure part-way leaves no half-ranked contest behind.
//! Requires a replica set or sharded deployment.

use std::collections::HashMap;

use futures_util::TryStreamExt;
use mongodb::{
    bson::{self, doc, oid::ObjectId},
    ClientSession, Database,
};
use serde::Serialize;

use crate::database::connection::{CONTESTS, MATCHES, TEAMS};
use crate::errors::{AppError, Result};
use crate::models::contest::{Contest, ContestStatus};
use crate::models::matches::{Match, PlayerPoints};
use crate::models::team::Team;
use crate::services::{ranking, roster, scoring};

#[derive(Debug, Default)]
pub struct ResultsPlan {
    pub team_totals: HashMap<ObjectId, f64>,
    /// A team entered in several contests keeps the rank from the last one.
    /// Contest leaderboards re-rank their own entries from `team_totals`.
    pub team_ranks: HashMap<ObjectId, u32>,
    pub completed_contests: Vec<ObjectId>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsSummary {
    pub teams_scored: usize,
    pub contests_ranked: usize,
}

/// Scores every team, then ranks every contest from those totals.
pub fn plan_results(m: &Match, teams: &mut [Team], contests: &[Contest]) -> ResultsPlan {
    let team_totals = scoring::score_teams(m, teams);

    let mut team_ranks = HashMap::new();
    let mut completed_contests = Vec::with_capacity(contests.len());
    for contest in contests {
        for (team_id, rank) in ranking::rank_contest(&contest.teams, &team_totals) {
            team_ranks.insert(team_id, rank);
        }
        if let Some(id) = contest.id {
            completed_contests.push(id);
        }
    }

    for team in teams.iter_mut() {
        if let Some(rank) = team.id.and_then(|id| team_ranks.get(&id)) {
            team.rank = *rank;
        }
    }

    ResultsPlan {
        team_totals,
        team_ranks,
        completed_contests,
    }
}

pub async fn publish_results(
    db: &Database,
    match_id: ObjectId,
    updates: &[PlayerPoints],
) -> Result<ResultsSummary> {
    let mut m = db
        .collection::<Match>(MATCHES)
        .find_one(doc! { "_id": match_id })
        .await?
        .ok_or(AppError::NotFound("Match"))?;

    roster::apply_points(&mut m, updates)?;

    let mut teams: Vec<Team> = db
        .collection::<Team>(TEAMS)
        .find(doc! { "matchId": match_id })
        .await?
        .try_collect()
        .await?;
    let contests: Vec<Contest> = db
        .collection::<Contest>(CONTESTS)
        .find(doc! { "matchId": match_id })
        .sort(doc! { "createdAt": 1 })
        .await?
        .try_collect()
        .await?;

    let plan = plan_results(&m, &mut teams, &contests);

    let mut session = db.client().start_session().await?;
    session.start_transaction().await?;
    if let Err(e) = write_plan(db, &mut session, &m, &teams, &plan).await {
        tracing::error!("results for match {} rolled back: {}", match_id, e);
        if let Err(abort_err) = session.abort_transaction().await {
            tracing::warn!("abort after failed results write also failed: {}", abort_err);
        }
        return Err(e);
    }
    session.commit_transaction().await?;

    tracing::info!(
        "match {}: scored {} teams, ranked {} contests",
        match_id,
        plan.team_totals.len(),
        plan.completed_contests.len()
    );

    Ok(ResultsSummary {
        teams_scored: plan.team_totals.len(),
        contests_ranked: plan.completed_contests.len(),
    })
}

async fn write_plan(
    db: &Database,
    session: &mut ClientSession,
    m: &Match,
    teams: &[Team],
    plan: &ResultsPlan,
) -> Result<()> {
    let players = bson::to_bson(&m.players).map_err(|e| AppError::Internal(e.to_string()))?;
    db.collection::<Match>(MATCHES)
        .update_one(doc! { "_id": m.id }, doc! { "$set": { "players": players } })
        .session(&mut *session)
        .await?;

    let team_collection = db.collection::<Team>(TEAMS);
    for team in teams {
        let Some(id) = team.id else { continue };
        team_collection
            .update_one(
                doc! { "_id": id },
                doc! { "$set": { "totalPoints": team.total_points, "rank": i64::from(team.rank) } },
            )
            .session(&mut *session)
            .await?;
    }

    let contest_collection = db.collection::<Contest>(CONTESTS);
    for contest_id in &plan.completed_contests {
        contest_collection
            .update_one(
                doc! { "_id": *contest_id },
                doc! { "$set": { "status": ContestStatus::Completed.as_str() } },
            )
            .session(&mut *session)
            .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::models::contest::PrizeTier;
    use crate::models::matches::{MatchStatus, NewPlayer};
    use crate::models::team::SlotSelection;
    use crate::services::team_builder::{self, fixtures::{AWAY, HOME}};

    fn contest_for(match_id: ObjectId, teams: Vec<ObjectId>) -> Contest {
        Contest {
            id: Some(ObjectId::new()),
            match_id,
            name: "Head to head".into(),
            entry_fee: 10.0,
            total_spots: 10,
            filled_spots: teams.len() as u32,
            prize_pool: 100.0,
            winner_distribution: vec![PrizeTier { rank: 1, percentage: 100.0 }],
            teams,
            status: ContestStatus::Open,
            created_at: Utc::now(),
            created_by: "admin".into(),
        }
    }

    fn team(m: &Match, owner: &str, picks: &[SlotSelection]) -> Team {
        Team {
            id: Some(ObjectId::new()),
            user_id: owner.into(),
            match_id: m.id.unwrap(),
            team_name: format!("{} XI", owner),
            players: team_builder::build_slots(m, picks).unwrap(),
            total_points: 0.0,
            rank: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn end_to_end_scoring_and_ranking() {
        // Empty match, roster of 22 added through the guard.
        let mut m = team_builder::fixtures::full_match();
        m.players.clear();
        let roles = [
            "wicket-keeper", "batsman", "batsman", "batsman", "batsman", "all-rounder",
            "all-rounder", "bowler", "bowler", "bowler", "bowler",
        ];
        let batch: Vec<NewPlayer> = [HOME, AWAY]
            .iter()
            .flat_map(|side| {
                roles.iter().enumerate().map(move |(i, role)| NewPlayer {
                    name: format!("{} {}", side, i),
                    team: side.to_string(),
                    role: role.to_string(),
                })
            })
            .collect();
        assert_eq!(roster::add_players(&mut m, &batch, Utc::now()), Ok(22));

        let picks_a = team_builder::fixtures::valid_picks(&m);
        let mut picks_b = picks_a.clone();
        picks_b[0].is_captain = false;
        picks_b[1].is_vice_captain = false;
        picks_b[2].is_captain = true;
        picks_b[3].is_vice_captain = true;
        let mut teams = vec![team(&m, "alice", &picks_a), team(&m, "bob", &picks_b)];

        m.status = MatchStatus::Completed;
        let updates: Vec<PlayerPoints> = m
            .players
            .iter()
            .enumerate()
            .map(|(i, p)| PlayerPoints { player_id: p.id.to_hex(), points: (i % 5) as f64 * 10.0 })
            .collect();
        roster::apply_points(&mut m, &updates).unwrap();

        let contest = contest_for(m.id.unwrap(), teams.iter().filter_map(|t| t.id).collect());
        let plan = plan_results(&m, &mut teams, std::slice::from_ref(&contest));

        // Hand-computed: picks are home 0..6 and away 1..6, captain first pick,
        // vice-captain second. Points are (roster index % 5) * 10.
        let raw = |idx: usize| (idx % 5) as f64 * 10.0;
        let plain: f64 = [2, 3, 4, 5, 12, 13, 14, 15, 16].iter().map(|&i| raw(i)).sum();
        let alice = raw(0) * 2.0 + raw(1) * 1.5 + plain;
        let bob_plain: f64 = [0, 1, 4, 5, 12, 13, 14, 15, 16].iter().map(|&i| raw(i)).sum();
        let bob = raw(2) * 2.0 + raw(3) * 1.5 + bob_plain;

        assert_eq!(teams[0].total_points, alice);
        assert_eq!(teams[1].total_points, bob);
        assert!(bob > alice);
        assert_eq!(teams[1].rank, 1);
        assert_eq!(teams[0].rank, 2);
        assert_eq!(plan.completed_contests, vec![contest.id.unwrap()]);
    }

    #[test]
    fn replanning_is_idempotent() {
        let mut m = team_builder::fixtures::full_match();
        m.status = MatchStatus::Completed;
        for (i, p) in m.players.iter_mut().enumerate() {
            p.points = i as f64;
        }
        let picks = team_builder::fixtures::valid_picks(&m);
        let mut teams = vec![team(&m, "a", &picks), team(&m, "b", &picks), team(&m, "c", &picks)];
        let contest = contest_for(m.id.unwrap(), teams.iter().filter_map(|t| t.id).collect());

        let first = plan_results(&m, &mut teams, std::slice::from_ref(&contest));
        let second = plan_results(&m, &mut teams, std::slice::from_ref(&contest));
        assert_eq!(first.team_totals, second.team_totals);
        assert_eq!(first.team_ranks, second.team_ranks);
        // identical picks tie for first
        assert!(teams.iter().all(|t| t.rank == 1));
    }

    #[test]
    fn teams_outside_every_contest_are_scored_but_unranked() {
        let mut m = team_builder::fixtures::full_match();
        m.status = MatchStatus::Completed;
        for p in m.players.iter_mut() {
            p.points = 5.0;
        }
        let picks = team_builder::fixtures::valid_picks(&m);
        let mut teams = vec![team(&m, "solo", &picks)];
        let plan = plan_results(&m, &mut teams, &[]);
        assert_eq!(teams[0].total_points, 5.0 * 2.0 + 5.0 * 1.5 + 5.0 * 9.0);
        assert_eq!(teams[0].rank, 0);
        assert!(plan.team_ranks.is_empty());
    }
}
