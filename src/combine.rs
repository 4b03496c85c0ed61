use std::path::Path;

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::aggregator::{AggregationTable, BestOfAggregator, Observation, SourceId};
use crate::config::{with_pool, CombineConfig};
use crate::error::{Rejection, Result};
use crate::io::{self, CandidateRow, Schema};
use crate::moves::{parse_move_string, SolutionCandidate};
use crate::puzzle::PuzzleSet;
use crate::scorer::score;
use crate::verifier;

/// What a candidate has to pass before it may enter the table.
#[derive(Debug, Clone, Copy)]
pub enum Gate<'a> {
    /// Replay against the puzzle and require acceptance.
    Verify(&'a PuzzleSet),
    /// Only check that the moves parse. Sources are assumed correct.
    TrustSources,
}

impl Gate<'_> {
    fn admit(&self, row: &CandidateRow) -> std::result::Result<SolutionCandidate, Rejection> {
        match self {
            Gate::Verify(puzzles) => {
                let puzzle = puzzles.get(row.id).ok_or(Rejection::UnknownPuzzle { puzzle_id: row.id })?;
                verifier::verify_str(puzzle, &row.moves).map(|(candidate, _)| candidate)
            }
            Gate::TrustSources => parse_move_string(&row.moves)
                .map(SolutionCandidate::new)
                .map_err(|raw_token| Rejection::MalformedToken { puzzle_id: row.id, raw_token }),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceStats {
    pub rows: usize,
    pub rejected: usize,
    pub improved: usize,
}

/// Folds candidate sources, in the order they are added, into one table.
pub struct Combiner<'a> {
    gate: Gate<'a>,
    threads: Option<usize>,
    aggregator: BestOfAggregator,
    sources: Vec<String>,
}

impl<'a> Combiner<'a> {
    pub fn new(gate: Gate<'a>, config: &CombineConfig) -> Combiner<'a> {
        if let Gate::TrustSources = gate {
            info!("candidate sources are trusted; nothing will be verified");
        }
        Combiner {
            gate,
            threads: config.threads,
            aggregator: BestOfAggregator::new(),
            sources: vec![],
        }
    }

    pub fn add_source<I>(&mut self, name: &str, rows: I) -> Result<SourceStats>
    where
        I: IntoIterator<Item = Result<CandidateRow>>,
    {
        let rows = rows.into_iter().collect::<Result<Vec<_>>>()?;
        let source: SourceId = self.sources.len();
        self.sources.push(name.to_owned());

        // verify in parallel, then fold in row order so ties go to the earlier row
        let gate = self.gate;
        let admitted: Vec<_> = with_pool(self.threads, || rows.par_iter().map(|row| gate.admit(row)).collect());

        let mut stats = SourceStats { rows: rows.len(), ..SourceStats::default() };
        for (row, admitted) in rows.iter().zip(admitted) {
            let candidate = match admitted {
                Ok(candidate) => candidate,
                Err(rejection) => {
                    warn!("{name}: skipping candidate: {rejection}");
                    stats.rejected += 1;
                    continue;
                }
            };
            let to_score = score(&candidate);
            if let Observation::Improved { from_score } = self.aggregator.observe(row.id, candidate, source) {
                info!(
                    "Found shorter path for id {}, decrease of -{} from {from_score} to {to_score} ({name})",
                    row.id,
                    from_score - to_score,
                );
                stats.improved += 1;
            }
        }
        debug!("{name}: {} rows, {} rejected, {} improved", stats.rows, stats.rejected, stats.improved);
        Ok(stats)
    }

    pub fn finish(self) -> Combined {
        Combined {
            table: self.aggregator.finish(),
            sources: self.sources,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Combined {
    pub table: AggregationTable,
    /// Source names, indexed by `SourceId`.
    pub sources: Vec<String>,
}

impl Combined {
    pub fn log_summary(&self) {
        for (source, wins) in self.table.wins_by_source() {
            info!("{}: best for {} puzzles", self.sources[source], wins);
        }
        info!("Overall decrease of {} steps against the first candidate per id", self.table.total_decrease());
        info!("{} puzzles, total score {}", self.table.len(), self.table.total_score());
    }
}

/// Combines every `*.csv` file in `dir`, taken in file name order.
pub fn combine_dir(dir: &Path, gate: Gate<'_>, config: &CombineConfig) -> Result<Combined> {
    let mut paths = vec![];
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "csv") {
            paths.push(path);
        }
    }
    paths.sort();
    debug!("{}: {} candidate files", dir.display(), paths.len());

    let mut combiner = Combiner::new(gate, config);
    for path in paths {
        let rows = io::open_candidates(&path, Schema::Contains, config.reader)?;
        let name = path.file_name().map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        combiner.add_source(&name, rows)?;
    }
    Ok(combiner.finish())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::puzzle::{PuzzleInstance, PuzzleType};

    fn puzzles() -> PuzzleSet {
        let t = Arc::new(PuzzleType::new("tri".to_owned(), vec![("r".to_owned(), vec![1, 2, 0])]).unwrap());
        let abc = ["A", "B", "C"];
        PuzzleSet::new(vec![
            PuzzleInstance::new(0, t.clone(), &abc, &["B", "C", "A"], 0).unwrap(),
            PuzzleInstance::new(1, t, &abc, &["C", "A", "B"], 0).unwrap(),
        ])
        .unwrap()
    }

    fn source(csv: &str) -> Vec<Result<CandidateRow>> {
        io::candidate_rows("src.csv", csv.as_bytes(), Schema::Contains, Default::default())
            .unwrap()
            .collect()
    }

    #[test]
    fn test_verified_combine_skips_invalid_candidates() {
        let puzzles = puzzles();
        let mut combiner = Combiner::new(Gate::Verify(&puzzles), &CombineConfig::default());
        let a = combiner.add_source("a.csv", source("id,moves\n0,r.r.r.r\n1,r.r\n")).unwrap();
        assert_eq!(a, SourceStats { rows: 2, rejected: 0, improved: 0 });

        // "r.r" does not solve puzzle 0 and id 9 is unknown, so neither may win
        let b = combiner.add_source("b.csv", source("id,moves\n0,r.r\n0,-r.-r\n1,-r\n9,r\n")).unwrap();
        assert_eq!(b, SourceStats { rows: 4, rejected: 2, improved: 2 });

        let combined = combiner.finish();
        let table = &combined.table;
        assert_eq!(table.get(0).unwrap().candidate.to_string(), "-r.-r");
        assert_eq!(table.get(1).unwrap().candidate.to_string(), "-r");
        assert_eq!(table.total_score(), 3);
        assert!(table.get(9).is_none());
        assert_eq!(combined.sources, vec!["a.csv", "b.csv"]);
    }

    #[test]
    fn test_trusted_combine_takes_shortest() {
        let mut combiner = Combiner::new(Gate::TrustSources, &CombineConfig::default());
        combiner.add_source("a.csv", source("id,moves\n0,r.r.r.r\n")).unwrap();
        let b = combiner.add_source("b.csv", source("id,moves\n0,r.r\n0,x\n0,..\n9,r\n")).unwrap();
        assert_eq!(b.rejected, 1);

        let table = combiner.finish().table;
        assert_eq!(table.get(0).unwrap().candidate.to_string(), "x");
        assert_eq!(table.get(9).unwrap().score, 1);
        assert_eq!(table.total_score(), 2);
    }
}
