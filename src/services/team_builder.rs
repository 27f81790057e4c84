//! Validation of a user's eleven picks against the match roster.
//!
//! Checks run in a fixed order and the first failure wins, so callers always
//! see one precise reason. The roster is authoritative for player name, role
//! and side; the caller only chooses which players and who wears the armbands.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::models::matches::{Match, MatchStatus, Player, PlayerRole};
use crate::models::team::{SlotSelection, TeamSlot};

pub const SQUAD_SIZE: usize = 11;
pub const MAX_FROM_ONE_SIDE: usize = 7;

#[derive(Debug, Error, PartialEq)]
pub enum TeamRejection {
    #[error("Cannot create team for completed match")]
    MatchCompleted,

    #[error("Teams can only be updated for upcoming matches")]
    MatchNotUpcoming,

    #[error("You have reached the maximum limit of {0} teams for this match")]
    TeamLimitReached(u32),

    #[error("Team must have exactly 11 players, received {0}")]
    WrongSquadSize(usize),

    #[error("Team must have exactly 1 captain, found {0}")]
    CaptainCount(usize),

    #[error("Team must have exactly 1 vice-captain, found {0}")]
    ViceCaptainCount(usize),

    #[error("Captain and vice-captain must be different players")]
    CaptainIsViceCaptain,

    #[error("Invalid players: {}", .0.join(", "))]
    UnknownPlayers(Vec<String>),

    #[error("Player {0} was selected more than once")]
    DuplicatePick(String),

    #[error("Team must have at least 1 wicket-keeper")]
    NoWicketKeeper,

    #[error("Maximum 7 players allowed from a single team, you have selected {count} from {side}")]
    TooManyFromOneSide { side: String, count: usize },

    #[error("You already have a team with this name for this match")]
    DuplicateName,
}

/// Step 1: no new teams once the match is over.
pub fn check_open_for_entry(m: &Match) -> Result<(), TeamRejection> {
    if m.status == MatchStatus::Completed {
        return Err(TeamRejection::MatchCompleted);
    }
    Ok(())
}

/// Edits are only allowed before the first ball.
pub fn check_open_for_edit(m: &Match) -> Result<(), TeamRejection> {
    if m.status != MatchStatus::Upcoming {
        return Err(TeamRejection::MatchNotUpcoming);
    }
    Ok(())
}

/// Step 2: per-user team quota for the match.
pub fn check_team_limit(m: &Match, existing_teams: u64) -> Result<(), TeamRejection> {
    if existing_teams >= u64::from(m.max_teams_per_user) {
        return Err(TeamRejection::TeamLimitReached(m.max_teams_per_user));
    }
    Ok(())
}

/// Steps 3 to 8: squad shape, armbands, roster membership and composition.
/// Returns the slots to persist, with name and role copied from the roster.
pub fn build_slots(m: &Match, picks: &[SlotSelection]) -> Result<Vec<TeamSlot>, TeamRejection> {
    if picks.len() != SQUAD_SIZE {
        return Err(TeamRejection::WrongSquadSize(picks.len()));
    }

    let captains = picks.iter().filter(|p| p.is_captain).count();
    if captains != 1 {
        return Err(TeamRejection::CaptainCount(captains));
    }
    let vice_captains = picks.iter().filter(|p| p.is_vice_captain).count();
    if vice_captains != 1 {
        return Err(TeamRejection::ViceCaptainCount(vice_captains));
    }
    if picks.iter().any(|p| p.is_captain && p.is_vice_captain) {
        return Err(TeamRejection::CaptainIsViceCaptain);
    }

    let roster: HashMap<String, &Player> = m.players.iter().map(|p| (p.id.to_hex(), p)).collect();

    let unknown: Vec<String> = picks
        .iter()
        .filter(|p| !roster.contains_key(p.player_id.as_str()))
        .map(|p| p.player_id.clone())
        .collect();
    if !unknown.is_empty() {
        return Err(TeamRejection::UnknownPlayers(unknown));
    }

    let mut seen = HashSet::with_capacity(SQUAD_SIZE);
    let mut resolved = Vec::with_capacity(SQUAD_SIZE);
    for pick in picks {
        if !seen.insert(pick.player_id.as_str()) {
            return Err(TeamRejection::DuplicatePick(pick.player_id.clone()));
        }
        resolved.push((pick, roster[pick.player_id.as_str()]));
    }

    if !resolved.iter().any(|(_, player)| player.role == PlayerRole::WicketKeeper) {
        return Err(TeamRejection::NoWicketKeeper);
    }

    // Sides are checked in declaration order so the reported side is stable.
    let mut per_side: HashMap<&str, usize> = HashMap::new();
    for (_, player) in &resolved {
        *per_side.entry(player.team.as_str()).or_insert(0) += 1;
    }
    for side in &m.teams {
        let count = per_side.get(side.as_str()).copied().unwrap_or(0);
        if count > MAX_FROM_ONE_SIDE {
            return Err(TeamRejection::TooManyFromOneSide { side: side.clone(), count });
        }
    }

    Ok(resolved
        .into_iter()
        .map(|(pick, player)| TeamSlot {
            player_id: player.id,
            name: player.name.clone(),
            role: player.role,
            is_captain: pick.is_captain,
            is_vice_captain: pick.is_vice_captain,
        })
        .collect())
}

/// Full pre-storage sequence for a new team. Name uniqueness is left to the
/// caller because it needs the store.
pub fn validate_new_team(
    m: &Match,
    existing_teams: u64,
    picks: &[SlotSelection],
) -> Result<Vec<TeamSlot>, TeamRejection> {
    check_open_for_entry(m)?;
    check_team_limit(m, existing_teams)?;
    build_slots(m, picks)
}

/// Same sequence for an edit, without the quota and name checks.
pub fn validate_team_update(m: &Match, picks: &[SlotSelection]) -> Result<Vec<TeamSlot>, TeamRejection> {
    check_open_for_edit(m)?;
    build_slots(m, picks)
}


#[cfg(test)]
mod tests {
    use mongodb::bson::oid::ObjectId;

    use super::fixtures::*;
    use super::*;

    #[test]
    fn accepts_a_legal_team_and_copies_roster_data() {
        let m = full_match();
        let slots = validate_new_team(&m, 0, &valid_picks(&m)).unwrap();
        assert_eq!(slots.len(), 11);
        assert!(slots[0].is_captain);
        assert!(slots[1].is_vice_captain);
        assert_eq!(slots[0].role, PlayerRole::WicketKeeper);
        assert_eq!(slots[0].name, "India player 1");
    }

    #[test]
    fn rejects_completed_match_before_anything_else() {
        let mut m = full_match();
        m.status = MatchStatus::Completed;
        assert_eq!(validate_new_team(&m, 0, &[]), Err(TeamRejection::MatchCompleted));
    }

    #[test]
    fn enforces_team_quota() {
        let m = full_match();
        assert_eq!(
            validate_new_team(&m, 2, &valid_picks(&m)),
            Err(TeamRejection::TeamLimitReached(2))
        );
    }

    #[test]
    fn rejects_wrong_squad_size() {
        let m = full_match();
        let mut picks = valid_picks(&m);
        picks.pop();
        assert_eq!(build_slots(&m, &picks), Err(TeamRejection::WrongSquadSize(10)));
    }

    #[test]
    fn rejects_two_captains() {
        let m = full_match();
        let mut picks = valid_picks(&m);
        picks[5].is_captain = true;
        assert_eq!(build_slots(&m, &picks), Err(TeamRejection::CaptainCount(2)));
    }

    #[test]
    fn rejects_missing_vice_captain() {
        let m = full_match();
        let mut picks = valid_picks(&m);
        picks[1].is_vice_captain = false;
        assert_eq!(build_slots(&m, &picks), Err(TeamRejection::ViceCaptainCount(0)));
    }

    #[test]
    fn rejects_captain_doubling_as_vice_captain() {
        let m = full_match();
        let mut picks = valid_picks(&m);
        picks[1].is_vice_captain = false;
        picks[0].is_vice_captain = true;
        assert_eq!(build_slots(&m, &picks), Err(TeamRejection::CaptainIsViceCaptain));
    }

    #[test]
    fn rejects_players_outside_the_roster() {
        let m = full_match();
        let mut picks = valid_picks(&m);
        let stranger = ObjectId::new().to_hex();
        picks[10].player_id = stranger.clone();
        picks[9].player_id = "not-an-id".into();
        assert_eq!(
            build_slots(&m, &picks),
            Err(TeamRejection::UnknownPlayers(vec!["not-an-id".into(), stranger]))
        );
    }

    #[test]
    fn rejects_the_same_player_twice() {
        let m = full_match();
        let mut picks = valid_picks(&m);
        picks[10].player_id = picks[9].player_id.clone();
        assert!(matches!(build_slots(&m, &picks), Err(TeamRejection::DuplicatePick(_))));
    }

    #[test]
    fn rejects_team_without_wicket_keeper() {
        let m = full_match();
        let home = m.players.iter().filter(|p| p.team == HOME).skip(1).take(6);
        let away = m.players.iter().filter(|p| p.team == AWAY).skip(1).take(5);
        let mut picks: Vec<SlotSelection> = home.chain(away).map(pick).collect();
        picks[0].is_captain = true;
        picks[1].is_vice_captain = true;
        assert_eq!(build_slots(&m, &picks), Err(TeamRejection::NoWicketKeeper));
    }

    #[test]
    fn rejects_eight_from_one_side() {
        let m = full_match();
        let home = m.players.iter().filter(|p| p.team == HOME).take(8);
        let away = m.players.iter().filter(|p| p.team == AWAY).skip(1).take(3);
        let mut picks: Vec<SlotSelection> = home.chain(away).map(pick).collect();
        picks[0].is_captain = true;
        picks[1].is_vice_captain = true;
        assert_eq!(
            build_slots(&m, &picks),
            Err(TeamRejection::TooManyFromOneSide { side: HOME.into(), count: 8 })
        );
    }

    #[test]
    fn role_comes_from_roster_not_the_request() {
        // SlotSelection has no role field at all; a keeper is found only
        // because the roster says so.
        let m = full_match();
        let slots = build_slots(&m, &valid_picks(&m)).unwrap();
        let keepers = slots.iter().filter(|s| s.role == PlayerRole::WicketKeeper).count();
        assert_eq!(keepers, 1);
    }

    #[test]
    fn every_rejection_has_its_own_message() {
        let messages: HashSet<String> = [
            TeamRejection::CaptainCount(2),
            TeamRejection::ViceCaptainCount(0),
            TeamRejection::UnknownPlayers(vec!["x".into()]),
            TeamRejection::TooManyFromOneSide { side: HOME.into(), count: 8 },
            TeamRejection::NoWicketKeeper,
        ]
        .iter()
        .map(|r| r.to_string())
        .collect();
        assert_eq!(messages.len(), 5);
    }

    #[test]
    fn updates_require_an_upcoming_match() {
        let mut m = full_match();
        m.status = MatchStatus::Live;
        assert_eq!(
            validate_team_update(&m, &valid_picks(&m)),
            Err(TeamRejection::MatchNotUpcoming)
        );
        m.status = MatchStatus::Upcoming;
        assert!(validate_team_update(&m, &valid_picks(&m)).is_ok());
    }
}
