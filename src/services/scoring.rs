use std::collections::HashMap;

use mongodb::bson::oid::ObjectId;

use crate::models::matches::Match;
use crate::models::team::{Team, TeamSlot};

pub const CAPTAIN_MULTIPLIER: f64 = 2.0;
pub const VICE_CAPTAIN_MULTIPLIER: f64 = 1.5;

/// Raw points per roster player, built once per scoring pass.
pub struct PointsTable {
    points: HashMap<ObjectId, f64>,
}

impl PointsTable {
    pub fn from_match(m: &Match) -> Self {
        PointsTable {
            points: m.players.iter().map(|p| (p.id, p.points)).collect(),
        }
    }

    /// Unresolved players score nothing.
    pub fn raw(&self, player_id: &ObjectId) -> f64 {
        self.points.get(player_id).copied().unwrap_or(0.0)
    }

    pub fn slot_points(&self, slot: &TeamSlot) -> f64 {
        let raw = self.raw(&slot.player_id);
        if slot.is_captain {
            raw * CAPTAIN_MULTIPLIER
        } else if slot.is_vice_captain {
            raw * VICE_CAPTAIN_MULTIPLIER
        } else {
            raw
        }
    }

    pub fn team_total(&self, slots: &[TeamSlot]) -> f64 {
        slots.iter().map(|slot| self.slot_points(slot)).sum()
    }
}

/// Recomputes `total_points` for every team of the match and returns the
/// totals keyed by team id.
pub fn score_teams(m: &Match, teams: &mut [Team]) -> HashMap<ObjectId, f64> {
    let table = PointsTable::from_match(m);
    let mut totals = HashMap::with_capacity(teams.len());
    for team in teams.iter_mut() {
        team.total_points = table.team_total(&team.players);
        if let Some(id) = team.id {
            totals.insert(id, team.total_points);
        }
    }
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::matches::MatchStatus;
    use crate::services::team_builder::{build_slots, fixtures::{full_match, valid_picks}};
    use chrono::Utc;

    fn scored_match() -> Match {
        let mut m = full_match();
        m.status = MatchStatus::Completed;
        for (i, p) in m.players.iter_mut().enumerate() {
            p.points = (i as f64) * 3.0 + 1.0;
        }
        m
    }

    fn team_for(m: &Match) -> Team {
        Team {
            id: Some(ObjectId::new()),
            user_id: "user-1".into(),
            match_id: m.id.unwrap(),
            team_name: "Strikers".into(),
            players: build_slots(m, &valid_picks(m)).unwrap(),
            total_points: 0.0,
            rank: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn multipliers_apply_per_armband() {
        let m = scored_match();
        let table = PointsTable::from_match(&m);
        let mut slot = team_for(&m).players[4].clone();
        let raw = table.raw(&slot.player_id);
        assert!(raw > 0.0);

        slot.is_captain = false;
        slot.is_vice_captain = false;
        assert_eq!(table.slot_points(&slot), raw);
        slot.is_captain = true;
        assert_eq!(table.slot_points(&slot), 2.0 * raw);
        slot.is_captain = false;
        slot.is_vice_captain = true;
        assert_eq!(table.slot_points(&slot), 1.5 * raw);
    }

    #[test]
    fn total_matches_hand_computed_sum() {
        let m = scored_match();
        let team = team_for(&m);
        let expected: f64 = team
            .players
            .iter()
            .map(|s| {
                let raw = m.player(&s.player_id).unwrap().points;
                if s.is_captain {
                    raw * 2.0
                } else if s.is_vice_captain {
                    raw * 1.5
                } else {
                    raw
                }
            })
            .sum();
        assert_eq!(PointsTable::from_match(&m).team_total(&team.players), expected);
    }

    #[test]
    fn unknown_players_score_zero() {
        let m = scored_match();
        let mut team = team_for(&m);
        team.players[10].player_id = ObjectId::new();
        let table = PointsTable::from_match(&m);
        assert_eq!(table.slot_points(&team.players[10]), 0.0);
    }

    #[test]
    fn scoring_twice_gives_identical_totals() {
        let m = scored_match();
        let mut teams = vec![team_for(&m), team_for(&m)];
        teams[1].players.swap(0, 5);
        let first = score_teams(&m, &mut teams);
        let second = score_teams(&m, &mut teams);
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }
}
