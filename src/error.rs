use thiserror::Error;

use crate::puzzle::PuzzleId;

/// Why a single candidate was not accepted. Scoped to that candidate: the run
/// goes on, and the candidate contributes no score.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("{move_name} is not an allowed move for {puzzle_id}")]
    UnknownMove { puzzle_id: PuzzleId, move_name: String },
    #[error("malformed move token {raw_token:?} for {puzzle_id}")]
    MalformedToken { puzzle_id: PuzzleId, raw_token: String },
    #[error("submitted moves do not solve {puzzle_id}: {mismatches} wrong facelets, {tolerance} wildcards allowed")]
    ToleranceExceeded {
        puzzle_id: PuzzleId,
        mismatches: usize,
        tolerance: usize,
    },
    #[error("no puzzle with id {puzzle_id}")]
    UnknownPuzzle { puzzle_id: PuzzleId },
}

impl Rejection {
    pub fn puzzle_id(&self) -> PuzzleId {
        match self {
            Rejection::UnknownMove { puzzle_id, .. }
            | Rejection::MalformedToken { puzzle_id, .. }
            | Rejection::ToleranceExceeded { puzzle_id, .. }
            | Rejection::UnknownPuzzle { puzzle_id } => *puzzle_id,
        }
    }
}

/// Errors that stop the whole run.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("Invalid allowed_moves literal: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{source_name} must have columns {expected:?}, found {actual:?}")]
    Schema {
        source_name: String,
        expected: Vec<String>,
        actual: Vec<String>,
    },
    #[error("{source_name}:{line}: field of {len} bytes exceeds the limit of {limit}")]
    FieldTooLarge {
        source_name: String,
        line: u64,
        len: usize,
        limit: usize,
    },
    #[error("move {move_name} of {puzzle_type} is not a permutation")]
    InvalidPermutation { puzzle_type: String, move_name: String },
    #[error("{context}: expected {expected} facelets but got {actual}")]
    FaceletCountMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },
    #[error("puzzle {puzzle_id} refers to unknown puzzle type {puzzle_type}")]
    UnknownPuzzleType { puzzle_id: PuzzleId, puzzle_type: String },
    #[error("puzzle id {0} appears more than once")]
    DuplicatePuzzleId(PuzzleId),
    #[error("row {row}: submission id {actual} does not match puzzle id {expected}")]
    IdMismatch {
        row: usize,
        expected: PuzzleId,
        actual: PuzzleId,
    },
    #[error("submission has {actual} rows but there are {expected} puzzles")]
    MissingRows { expected: usize, actual: usize },
    #[error("no puzzle with id {puzzle_id}")]
    UnknownPuzzleId { puzzle_id: PuzzleId },
}

pub type Result<T> = std::result::Result<T, Error>;
