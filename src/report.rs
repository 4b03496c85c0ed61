use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::aggregator::AggregationTable;
use crate::error::{Error, Result};
use crate::io::CandidateRow;
use crate::puzzle::PuzzleId;
use crate::scorer::{score_move_string, EvaluationReport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredRow {
    pub puzzle_id: PuzzleId,
    pub puzzle_type: String,
    pub score: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub total_score: usize,
    /// Highest total first; equal totals by type name.
    pub by_type: Vec<(String, usize)>,
    /// Highest score first; equal scores keep input order.
    pub top: Vec<ScoredRow>,
}

pub fn summarize(rows: &[ScoredRow], top_n: usize) -> Summary {
    let total_score = rows.iter().map(|r| r.score).sum();

    let mut totals: BTreeMap<&str, usize> = BTreeMap::new();
    for r in rows {
        *totals.entry(&r.puzzle_type).or_insert(0) += r.score;
    }
    let mut by_type: Vec<(String, usize)> = totals.into_iter().map(|(t, s)| (t.to_owned(), s)).collect();
    // stable sort on top of the name order from the BTreeMap
    by_type.sort_by(|a, b| b.1.cmp(&a.1));

    let mut top = rows.to_vec();
    top.sort_by(|a, b| b.score.cmp(&a.score));
    top.truncate(top_n);

    Summary { total_score, by_type, top }
}

/// Scores each submission row by counting its moves. Nothing is verified.
pub fn rows_from_submission<I>(submission: I, puzzle_types: &HashMap<PuzzleId, String>) -> Result<Vec<ScoredRow>>
where
    I: IntoIterator<Item = Result<CandidateRow>>,
{
    let mut rows = vec![];
    for row in submission {
        let row = row?;
        let puzzle_type = puzzle_types
            .get(&row.id)
            .ok_or(Error::UnknownPuzzleId { puzzle_id: row.id })?;
        rows.push(ScoredRow {
            puzzle_id: row.id,
            puzzle_type: puzzle_type.clone(),
            score: score_move_string(&row.moves),
        });
    }
    Ok(rows)
}

/// Accepted outcomes only.
pub fn rows_from_evaluation(report: &EvaluationReport) -> Vec<ScoredRow> {
    report
        .outcomes
        .iter()
        .filter_map(|o| {
            let scored = o.result.as_ref().ok()?;
            Some(ScoredRow {
                puzzle_id: o.puzzle_id,
                puzzle_type: o.puzzle_type.clone(),
                score: scored.score,
            })
        })
        .collect()
}

pub fn rows_from_table(table: &AggregationTable, puzzle_types: &HashMap<PuzzleId, String>) -> Result<Vec<ScoredRow>> {
    table
        .iter()
        .map(|(&puzzle_id, entry)| {
            let puzzle_type = puzzle_types.get(&puzzle_id).ok_or(Error::UnknownPuzzleId { puzzle_id })?;
            Ok(ScoredRow {
                puzzle_id,
                puzzle_type: puzzle_type.clone(),
                score: entry.score,
            })
        })
        .collect()
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total score = {}", self.total_score)?;
        writeln!(f)?;
        writeln!(f, "Score by puzzle type:")?;
        let type_width = self.by_type.iter().map(|(t, _)| t.len()).chain([11]).max().unwrap_or(11);
        writeln!(f, "{:<type_width$} {:>8}", "puzzle_type", "score")?;
        for (puzzle_type, score) in &self.by_type {
            writeln!(f, "{puzzle_type:<type_width$} {score:>8}")?;
        }
        writeln!(f)?;
        writeln!(f, "Score by puzzle id (top {}):", self.top.len())?;
        writeln!(f, "{:>6} {:<type_width$} {:>8}", "id", "puzzle_type", "score")?;
        for r in &self.top {
            writeln!(f, "{:>6} {:<type_width$} {:>8}", r.puzzle_id, r.puzzle_type, r.score)?;
        }
        Ok(())
    }
}
