//! Standard competition ranking ("1224" ranking) for contest standings.

use std::collections::HashMap;

use mongodb::bson::oid::ObjectId;

/// Ranks `(id, points)` entries by points descending. Tied entries share a
/// rank and the next lower score resumes at `rank + tied`, so ranks may skip.
/// Exact ties keep their input order.
pub fn competition_ranks<K: Clone>(entries: &[(K, f64)]) -> Vec<(K, f64, u32)> {
    let mut sorted: Vec<&(K, f64)> = entries.iter().collect();
    sorted.sort_by(|a, b| b.1.total_cmp(&a.1));

    let mut ranked = Vec::with_capacity(sorted.len());
    let mut rank = 1u32;
    let mut tied = 0u32;
    let mut previous: Option<f64> = None;

    for (key, points) in sorted {
        match previous {
            Some(prev) if *points < prev => {
                rank += tied;
                tied = 1;
            }
            _ => tied += 1,
        }
        ranked.push((key.clone(), *points, rank));
        previous = Some(*points);
    }
    ranked
}

/// Ranks a contest's entries using already-final team totals. Entries with no
/// total are skipped.
pub fn rank_contest(entries: &[ObjectId], totals: &HashMap<ObjectId, f64>) -> Vec<(ObjectId, u32)> {
    let scored: Vec<(ObjectId, f64)> = entries
        .iter()
        .filter_map(|id| match totals.get(id) {
            Some(points) => Some((*id, *points)),
            None => {
                tracing::warn!("team {} is entered in a contest but has no score", id);
                None
            }
        })
        .collect();

    competition_ranks(&scored)
        .into_iter()
        .map(|(id, _, rank)| (id, rank))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranks_of(points: &[f64]) -> Vec<u32> {
        let entries: Vec<(usize, f64)> = points.iter().copied().enumerate().collect();
        competition_ranks(&entries).into_iter().map(|(_, _, r)| r).collect()
    }

    #[test]
    fn ties_share_and_skip() {
        assert_eq!(ranks_of(&[100.0, 100.0, 90.0, 80.0, 80.0, 80.0]), vec![1, 1, 3, 4, 4, 4]);
    }

    #[test]
    fn unsorted_input_is_ordered_descending() {
        let entries = vec![("c", 80.0), ("a", 100.0), ("d", 80.0), ("b", 90.0)];
        let ranked = competition_ranks(&entries);
        let order: Vec<(&str, u32)> = ranked.iter().map(|(k, _, r)| (*k, *r)).collect();
        assert_eq!(order, vec![("a", 1), ("b", 2), ("c", 3), ("d", 3)]);
    }

    #[test]
    fn all_tied_and_empty() {
        assert_eq!(ranks_of(&[50.0, 50.0, 50.0]), vec![1, 1, 1]);
        assert!(ranks_of(&[]).is_empty());
    }

    #[test]
    fn fractional_totals_from_vice_captains_rank_correctly() {
        assert_eq!(ranks_of(&[10.5, 10.0, 10.5, 9.75]), vec![1, 1, 3, 4]);
    }

    #[test]
    fn higher_total_always_means_better_rank() {
        let points = [12.0, 99.5, 12.0, 40.0, 7.0, 99.5, 40.0, 0.0];
        let entries: Vec<(usize, f64)> = points.iter().copied().enumerate().collect();
        let ranked = competition_ranks(&entries);
        for (_, pa, ra) in &ranked {
            for (_, pb, rb) in &ranked {
                if pa > pb {
                    assert!(ra < rb);
                }
                if pa == pb {
                    assert_eq!(ra, rb);
                }
            }
        }
    }

    #[test]
    fn contest_ranking_ignores_unscored_entries() {
        let (a, b, ghost) = (ObjectId::new(), ObjectId::new(), ObjectId::new());
        let totals = HashMap::from([(a, 30.0), (b, 45.0)]);
        let ranked = rank_contest(&[a, ghost, b], &totals);
        assert_eq!(ranked, vec![(b, 1), (a, 2)]);
    }
}
