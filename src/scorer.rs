use log::{debug, info, warn};
use rayon::prelude::*;

use crate::config::{with_pool, EvalConfig};
use crate::error::{Error, Rejection, Result};
use crate::io::CandidateRow;
use crate::moves::SolutionCandidate;
use crate::puzzle::{PuzzleId, PuzzleInstance, PuzzleSet};
use crate::verifier;

/// Score of a candidate: its move count.
pub fn score(candidate: &SolutionCandidate) -> usize {
    candidate.len()
}

/// Move count of a raw `.`-joined move string, without parsing or verifying
/// it. Only for summarising results that are already trusted.
pub fn score_move_string(moves: &str) -> usize {
    moves.split('.').count()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scored {
    pub candidate: SolutionCandidate,
    pub score: usize,
    pub mismatches: usize,
}

/// Verifies `moves` against `instance` and scores it. A rejected candidate
/// never gets a score.
pub fn verify_and_score(instance: &PuzzleInstance, moves: &str) -> std::result::Result<Scored, Rejection> {
    let (candidate, accepted) = verifier::verify_str(instance, moves)?;
    Ok(Scored {
        score: score(&candidate),
        mismatches: accepted.mismatches,
        candidate,
    })
}

#[derive(Debug, Clone)]
pub struct Outcome {
    pub puzzle_id: PuzzleId,
    pub puzzle_type: String,
    pub result: std::result::Result<Scored, Rejection>,
}

#[derive(Debug, Clone, Default)]
pub struct EvaluationReport {
    /// In submission order.
    pub outcomes: Vec<Outcome>,
    /// Sum over accepted candidates only.
    pub total_score: usize,
    pub accepted: usize,
    pub rejected: usize,
}

impl EvaluationReport {
    pub fn rejections(&self) -> impl Iterator<Item = &Rejection> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().err())
    }
}

/// Scores a whole submission against the puzzle set, pairing rows by position.
///
/// Misaligned ids and a row count that differs from the puzzle count abort the
/// run. Rejections are recorded per row and the run continues.
pub fn evaluate<I>(puzzles: &PuzzleSet, submission: I, config: &EvalConfig) -> Result<EvaluationReport>
where
    I: IntoIterator<Item = Result<CandidateRow>>,
{
    let mut submission = submission.into_iter();
    let mut pairs = vec![];
    let mut rows = 0;
    for (row, (puzzle, sub)) in puzzles.iter().zip(submission.by_ref()).enumerate() {
        let sub = sub?;
        rows += 1;
        if sub.id != puzzle.id() {
            return Err(Error::IdMismatch { row, expected: puzzle.id(), actual: sub.id });
        }
        if config.specific_ids.as_ref().is_some_and(|ids| !ids.contains(&sub.id)) {
            continue;
        }
        pairs.push((puzzle, sub.moves));
    }
    rows += submission.count();
    if rows != puzzles.len() {
        return Err(Error::MissingRows { expected: puzzles.len(), actual: rows });
    }
    debug!("verifying {} of {} submission rows", pairs.len(), rows);

    let outcomes: Vec<Outcome> = with_pool(config.threads, || {
        pairs
            .par_iter()
            .map(|(puzzle, moves)| Outcome {
                puzzle_id: puzzle.id(),
                puzzle_type: puzzle.puzzle_type().name().to_owned(),
                result: verify_and_score(puzzle, moves),
            })
            .collect()
    });

    let mut report = EvaluationReport::default();
    for outcome in &outcomes {
        match &outcome.result {
            Ok(scored) => {
                report.total_score += scored.score;
                report.accepted += 1;
            }
            Err(rejection) => {
                warn!("{rejection}");
                report.rejected += 1;
            }
        }
    }
    report.outcomes = outcomes;
    info!(
        "{} accepted, {} rejected, total score {}",
        report.accepted, report.rejected, report.total_score
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use super::*;
    use crate::puzzle::PuzzleType;

    fn puzzles() -> PuzzleSet {
        let t = Arc::new(PuzzleType::new("tri".to_owned(), vec![("r".to_owned(), vec![1, 2, 0])]).unwrap());
        let abc = ["A", "B", "C"];
        PuzzleSet::new(vec![
            PuzzleInstance::new(0, t.clone(), &abc, &["B", "C", "A"], 0).unwrap(),
            PuzzleInstance::new(1, t.clone(), &abc, &["C", "A", "B"], 0).unwrap(),
            PuzzleInstance::new(2, t, &abc, &abc, 0).unwrap(),
        ])
        .unwrap()
    }

    fn rows(rows: &[(PuzzleId, &str)]) -> Vec<Result<CandidateRow>> {
        rows.iter().map(|&(id, moves)| Ok(CandidateRow { id, moves: moves.to_owned() })).collect()
    }

    #[test]
    fn test_score_counts_moves() {
        let p = &puzzles();
        let scored = verify_and_score(p.get(1).unwrap(), "r.r").unwrap();
        assert_eq!(scored.score, 2);
        assert_eq!(score(&scored.candidate), 2);
        assert_eq!(score_move_string("r.-r.r"), 3);
    }

    #[test]
    fn test_evaluate_mixed_submission() {
        let report = evaluate(&puzzles(), rows(&[(0, "r"), (1, "-r"), (2, "r.q")]), &EvalConfig::default()).unwrap();
        assert_eq!(report.accepted, 2);
        assert_eq!(report.rejected, 1);
        assert_eq!(report.total_score, 2);
        assert_eq!(report.outcomes.iter().map(|o| o.puzzle_id).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(
            report.rejections().cloned().collect::<Vec<_>>(),
            vec![Rejection::UnknownMove { puzzle_id: 2, move_name: "q".to_owned() }]
        );
    }

    #[test]
    fn test_evaluate_specific_ids() {
        let config = EvalConfig {
            specific_ids: Some(BTreeSet::from([1])),
            threads: Some(2),
            ..EvalConfig::default()
        };
        let report = evaluate(&puzzles(), rows(&[(0, "r"), (1, "r.r"), (2, "q")]), &config).unwrap();
        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.total_score, 2);
    }

    #[test]
    fn test_evaluate_misaligned_ids() {
        let err = evaluate(&puzzles(), rows(&[(0, "r"), (2, "r"), (1, "r")]), &EvalConfig::default()).unwrap_err();
        assert!(matches!(err, Error::IdMismatch { row: 1, expected: 1, actual: 2 }));

        let err = evaluate(&puzzles(), rows(&[(0, "r")]), &EvalConfig::default()).unwrap_err();
        assert!(matches!(err, Error::MissingRows { expected: 3, actual: 1 }));

        let extra = rows(&[(0, "r"), (1, "r.r"), (2, "r.r.r"), (3, "r")]);
        let err = evaluate(&puzzles(), extra, &EvalConfig::default()).unwrap_err();
        assert!(matches!(err, Error::MissingRows { expected: 3, actual: 4 }));
    }
}
