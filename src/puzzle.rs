use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::perm::{Permutation, SparsePermutation};

pub type PuzzleId = usize;

/// Interned facelet colour. Only equality is meaningful.
pub type Facelet = usize;

/// A named move. Both directions are precomputed once at load time.
#[derive(Debug, Clone)]
pub struct PuzzleMove {
    dense: Permutation,
    forward: SparsePermutation,
    inverse: SparsePermutation,
}

impl PuzzleMove {
    pub fn new(dense: Permutation) -> PuzzleMove {
        let forward = dense.sparsify();
        let inverse = !forward.clone();
        PuzzleMove { dense, forward, inverse }
    }

    pub fn permutation(&self) -> &Permutation {
        &self.dense
    }

    pub fn apply_inplace(&self, state: &mut [Facelet]) {
        self.forward.apply_inplace(state);
    }

    pub fn apply_inv_inplace(&self, state: &mut [Facelet]) {
        self.inverse.apply_inplace(state);
    }
}

#[derive(Debug, Clone)]
pub struct PuzzleType {
    name: String,
    n: usize,
    moves: BTreeMap<String, PuzzleMove>,
}

impl PuzzleType {
    /// Builds a puzzle type from raw destination-index arrays, checking that
    /// each one is a permutation and that they all agree on the facelet count.
    pub fn new(name: String, raw_moves: Vec<(String, Vec<usize>)>) -> Result<PuzzleType> {
        let mut n = None;
        let mut moves = BTreeMap::new();
        for (move_name, raw) in raw_moves {
            let len = raw.len();
            match n {
                None => n = Some(len),
                Some(n) if n != len => {
                    return Err(Error::FaceletCountMismatch {
                        context: format!("move {move_name} of {name}"),
                        expected: n,
                        actual: len,
                    })
                }
                Some(_) => (),
            }
            let Some(perm) = Permutation::new(raw) else {
                return Err(Error::InvalidPermutation { puzzle_type: name, move_name });
            };
            moves.insert(move_name, PuzzleMove::new(perm));
        }
        Ok(PuzzleType { name, n: n.unwrap_or(0), moves })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Facelet count shared by every move of this type.
    pub fn n(&self) -> usize {
        self.n
    }

    pub fn get(&self, move_name: &str) -> Option<&PuzzleMove> {
        self.moves.get(move_name)
    }

    pub fn move_names(&self) -> impl Iterator<Item = &str> {
        self.moves.keys().map(String::as_str)
    }
}

/// Puzzle types by name. Built once per run and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct PuzzleCatalog {
    types: BTreeMap<String, Arc<PuzzleType>>,
}

impl PuzzleCatalog {
    pub fn new() -> PuzzleCatalog {
        PuzzleCatalog::default()
    }

    pub fn insert(&mut self, puzzle_type: PuzzleType) {
        self.types.insert(puzzle_type.name.clone(), Arc::new(puzzle_type));
    }

    pub fn get(&self, name: &str) -> Option<&Arc<PuzzleType>> {
        self.types.get(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

fn conv_colors(a: &[&str], hm: &mut HashMap<String, Facelet>) -> Vec<Facelet> {
    let mut res = Vec::with_capacity(a.len());
    for &x in a {
        let next_id = hm.len();
        res.push(*hm.entry(x.to_owned()).or_insert(next_id));
    }
    res
}

/// One puzzle to be solved. The puzzle type is shared with the catalog.
#[derive(Debug, Clone)]
pub struct PuzzleInstance {
    id: PuzzleId,
    puzzle_type: Arc<PuzzleType>,
    initial_state: Vec<Facelet>,
    goal_state: Vec<Facelet>,
    tolerance: usize,
    color_names: Vec<String>,
}

impl PuzzleInstance {
    pub fn new(
        id: PuzzleId,
        puzzle_type: Arc<PuzzleType>,
        initial_state: &[&str],
        goal_state: &[&str],
        tolerance: usize,
    ) -> Result<PuzzleInstance> {
        for (what, state) in [("initial_state", initial_state), ("solution_state", goal_state)] {
            if state.len() != puzzle_type.n() {
                return Err(Error::FaceletCountMismatch {
                    context: format!("{what} of puzzle {id} ({})", puzzle_type.name()),
                    expected: puzzle_type.n(),
                    actual: state.len(),
                });
            }
        }

        let mut colors = HashMap::new();
        let goal_state = conv_colors(goal_state, &mut colors);
        let initial_state = conv_colors(initial_state, &mut colors);
        let mut color_names = vec![String::new(); colors.len()];
        for (k, v) in colors {
            color_names[v] = k;
        }

        Ok(PuzzleInstance {
            id,
            puzzle_type,
            initial_state,
            goal_state,
            tolerance,
            color_names,
        })
    }

    /// Resolves `type_name` in `catalog` and builds the instance.
    pub fn from_catalog(
        catalog: &PuzzleCatalog,
        id: PuzzleId,
        type_name: &str,
        initial_state: &[&str],
        goal_state: &[&str],
        tolerance: usize,
    ) -> Result<PuzzleInstance> {
        let puzzle_type = catalog.get(type_name).ok_or_else(|| Error::UnknownPuzzleType {
            puzzle_id: id,
            puzzle_type: type_name.to_owned(),
        })?;
        PuzzleInstance::new(id, Arc::clone(puzzle_type), initial_state, goal_state, tolerance)
    }

    pub fn id(&self) -> PuzzleId {
        self.id
    }

    pub fn puzzle_type(&self) -> &PuzzleType {
        &self.puzzle_type
    }

    pub fn initial_state(&self) -> &[Facelet] {
        &self.initial_state
    }

    pub fn goal_state(&self) -> &[Facelet] {
        &self.goal_state
    }

    pub fn tolerance(&self) -> usize {
        self.tolerance
    }

    /// Maps interned facelets back to the tokens they came from.
    pub fn render(&self, state: &[Facelet]) -> Vec<String> {
        state.iter().map(|&c| self.color_names[c].clone()).collect()
    }
}

/// Puzzle instances in file order, indexed by id.
#[derive(Debug, Clone, Default)]
pub struct PuzzleSet {
    puzzles: Vec<PuzzleInstance>,
    index: HashMap<PuzzleId, usize>,
}

impl PuzzleSet {
    pub fn new(puzzles: Vec<PuzzleInstance>) -> Result<PuzzleSet> {
        let mut index = HashMap::with_capacity(puzzles.len());
        for (i, p) in puzzles.iter().enumerate() {
            if index.insert(p.id(), i).is_some() {
                return Err(Error::DuplicatePuzzleId(p.id()));
            }
        }
        Ok(PuzzleSet { puzzles, index })
    }

    pub fn get(&self, id: PuzzleId) -> Option<&PuzzleInstance> {
        self.index.get(&id).map(|&i| &self.puzzles[i])
    }

    /// Puzzle type name by id.
    pub fn puzzle_types(&self) -> HashMap<PuzzleId, String> {
        self.puzzles.iter().map(|p| (p.id(), p.puzzle_type().name().to_owned())).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PuzzleInstance> {
        self.puzzles.iter()
    }

    pub fn len(&self) -> usize {
        self.puzzles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.puzzles.is_empty()
    }
}
