use std::collections::btree_map::{self, BTreeMap};

use log::debug;

use crate::moves::SolutionCandidate;
use crate::puzzle::PuzzleId;
use crate::scorer::score;

/// Index of the candidate source a row came from, in scan order.
pub type SourceId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub candidate: SolutionCandidate,
    pub score: usize,
    pub source: SourceId,
}

/// What happened to a candidate offered to the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    Inserted,
    Improved { from_score: usize },
    /// Not strictly better than the stored best, which stays.
    Kept { best_score: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Improvement {
    pub puzzle_id: PuzzleId,
    pub from_score: usize,
    pub to_score: usize,
    pub source: SourceId,
}

/// Keeps the shortest candidate per puzzle id.
///
/// A stored entry is replaced only by a strictly lower score, so among equal
/// scores the first one seen wins. Candidates are trusted as given: nothing
/// here verifies them.
#[derive(Debug, Clone, Default)]
pub struct BestOfAggregator {
    table: BTreeMap<PuzzleId, Entry>,
    improvements: Vec<Improvement>,
}

impl BestOfAggregator {
    pub fn new() -> BestOfAggregator {
        BestOfAggregator::default()
    }

    pub fn observe(&mut self, puzzle_id: PuzzleId, candidate: SolutionCandidate, source: SourceId) -> Observation {
        let new_score = score(&candidate);
        match self.table.entry(puzzle_id) {
            btree_map::Entry::Vacant(e) => {
                e.insert(Entry { candidate, score: new_score, source });
                Observation::Inserted
            }
            btree_map::Entry::Occupied(mut e) => {
                let best = e.get_mut();
                if new_score < best.score {
                    let from_score = best.score;
                    debug!("puzzle {puzzle_id}: {from_score} -> {new_score} (source {source})");
                    *best = Entry { candidate, score: new_score, source };
                    self.improvements.push(Improvement { puzzle_id, from_score, to_score: new_score, source });
                    Observation::Improved { from_score }
                } else {
                    Observation::Kept { best_score: best.score }
                }
            }
        }
    }

    pub fn best(&self, puzzle_id: PuzzleId) -> Option<&Entry> {
        self.table.get(&puzzle_id)
    }

    pub fn finish(self) -> AggregationTable {
        AggregationTable {
            entries: self.table,
            improvements: self.improvements,
        }
    }
}

impl Extend<(PuzzleId, SolutionCandidate, SourceId)> for BestOfAggregator {
    fn extend<T: IntoIterator<Item = (PuzzleId, SolutionCandidate, SourceId)>>(&mut self, iter: T) {
        for (puzzle_id, candidate, source) in iter {
            self.observe(puzzle_id, candidate, source);
        }
    }
}

/// The best candidate per id once every source has been scanned.
#[derive(Debug, Clone, Default)]
pub struct AggregationTable {
    entries: BTreeMap<PuzzleId, Entry>,
    improvements: Vec<Improvement>,
}

impl AggregationTable {
    pub fn get(&self, puzzle_id: PuzzleId) -> Option<&Entry> {
        self.entries.get(&puzzle_id)
    }

    /// Entries in ascending id order.
    pub fn iter(&self) -> btree_map::Iter<'_, PuzzleId, Entry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_score(&self) -> usize {
        self.entries.values().fold(0, |acc, e| acc + e.score)
    }

    /// Every replacement made during the scan, in the order it happened.
    pub fn improvements(&self) -> &[Improvement] {
        &self.improvements
    }

    /// Moves saved against the first candidate seen for each id.
    pub fn total_decrease(&self) -> usize {
        self.improvements.iter().map(|i| i.from_score - i.to_score).sum()
    }

    /// How many ids each source holds the best candidate for.
    pub fn wins_by_source(&self) -> BTreeMap<SourceId, usize> {
        let mut wins = BTreeMap::new();
        for e in self.entries.values() {
            *wins.entry(e.source).or_insert(0) += 1;
        }
        wins
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::moves::MoveToken;

    fn candidate(name: &str, len: usize) -> SolutionCandidate {
        SolutionCandidate::new(vec![MoveToken::forward(name); len])
    }

    #[test]
    fn test_first_seen_wins_ties() {
        let mut agg = BestOfAggregator::new();
        assert_eq!(agg.observe(42, candidate("a", 15), 0), Observation::Inserted);
        assert_eq!(agg.observe(42, candidate("b", 9), 1), Observation::Improved { from_score: 15 });
        assert_eq!(agg.observe(42, candidate("c", 9), 2), Observation::Kept { best_score: 9 });

        let table = agg.finish();
        let best = table.get(42).unwrap();
        assert_eq!(best.candidate, candidate("b", 9));
        assert_eq!(best.source, 1);
        assert_eq!(table.total_score(), 9);
        assert_eq!(table.total_decrease(), 6);
        assert_eq!(
            table.improvements(),
            &[Improvement { puzzle_id: 42, from_score: 15, to_score: 9, source: 1 }]
        );
    }

    #[test]
    fn test_total_is_folded_over_final_table() {
        let mut agg = BestOfAggregator::new();
        agg.extend([
            (1, candidate("a", 5), 0),
            (2, candidate("a", 7), 0),
            (1, candidate("b", 3), 1),
            (2, candidate("b", 8), 1),
            (1, candidate("c", 4), 2),
        ]);
        let table = agg.finish();
        assert_eq!(table.len(), 2);
        assert_eq!(table.total_score(), 3 + 7);
        assert_eq!(table.wins_by_source(), BTreeMap::from([(0, 1), (1, 1)]));
        assert_eq!(table.iter().map(|(id, _)| *id).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_keeps_first_minimum_on_random_streams() {
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..20 {
            let stream: Vec<(PuzzleId, usize, SourceId)> = (0..200)
                .map(|i| (rng.gen_range(0..10), rng.gen_range(1..6), i))
                .collect();

            let mut agg = BestOfAggregator::new();
            let mut last_score = BTreeMap::new();
            for &(id, len, pos) in &stream {
                agg.observe(id, candidate(&format!("m{pos}"), len), pos);
                let now = agg.best(id).unwrap().score;
                if let Some(prev) = last_score.insert(id, now) {
                    assert!(now <= prev);
                }
            }
            let table = agg.finish();

            for (&id, entry) in table.iter() {
                let min = stream.iter().filter(|s| s.0 == id).map(|s| s.1).min().unwrap();
                let first = stream.iter().find(|s| s.0 == id && s.1 == min).unwrap();
                assert_eq!(entry.score, min);
                assert_eq!(entry.source, first.2);
                assert_eq!(entry.candidate, candidate(&format!("m{}", first.2), min));
            }
        }
    }
}
