use log::trace;

use crate::error::Rejection;
use crate::moves::{Direction, MoveToken, SolutionCandidate};
use crate::puzzle::{Facelet, PuzzleInstance};

/// Result of replaying a candidate that ended within tolerance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted {
    pub final_state: Vec<Facelet>,
    pub mismatches: usize,
}

pub type Verdict = Result<Accepted, Rejection>;

/// Replays `moves` left to right from the initial state. Stops at the first
/// move the puzzle type does not have.
pub fn replay(instance: &PuzzleInstance, moves: &[MoveToken]) -> Result<Vec<Facelet>, Rejection> {
    let puzzle_type = instance.puzzle_type();
    let mut state = instance.initial_state().to_vec();
    for tok in moves {
        let Some(mv) = puzzle_type.get(&tok.name) else {
            return Err(Rejection::UnknownMove {
                puzzle_id: instance.id(),
                move_name: tok.name.clone(),
            });
        };
        match tok.direction {
            Direction::Forward => mv.apply_inplace(&mut state),
            Direction::Inverse => mv.apply_inv_inplace(&mut state),
        }
    }
    Ok(state)
}

pub fn count_mismatches(state: &[Facelet], goal: &[Facelet]) -> usize {
    state.iter().zip(goal).filter(|(s, t)| s != t).count()
}

pub fn verify(instance: &PuzzleInstance, moves: &[MoveToken]) -> Verdict {
    let final_state = replay(instance, moves)?;
    let mismatches = count_mismatches(&final_state, instance.goal_state());
    trace!("puzzle {}: {} moves, {}/{} mismatches", instance.id(), moves.len(), mismatches, instance.tolerance());
    if mismatches > instance.tolerance() {
        return Err(Rejection::ToleranceExceeded {
            puzzle_id: instance.id(),
            mismatches,
            tolerance: instance.tolerance(),
        });
    }
    Ok(Accepted { final_state, mismatches })
}

/// Parses a `.`-joined move string for `instance`, reporting malformed tokens
/// against that puzzle.
pub fn parse_candidate(instance: &PuzzleInstance, input: &str) -> Result<SolutionCandidate, Rejection> {
    crate::moves::parse_move_string(input)
        .map(SolutionCandidate::new)
        .map_err(|raw_token| Rejection::MalformedToken {
            puzzle_id: instance.id(),
            raw_token,
        })
}

pub fn verify_str(instance: &PuzzleInstance, input: &str) -> Result<(SolutionCandidate, Accepted), Rejection> {
    let candidate = parse_candidate(instance, input)?;
    let accepted = verify(instance, candidate.moves())?;
    Ok((candidate, accepted))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::moves::parse_move_string;
    use crate::puzzle::PuzzleType;

    fn puzzle_type(moves: &[(&str, Vec<usize>)]) -> Arc<PuzzleType> {
        let moves = moves.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
        Arc::new(PuzzleType::new("test".to_owned(), moves).unwrap())
    }

    fn instance(moves: &[(&str, Vec<usize>)], init: &[&str], goal: &[&str], tolerance: usize) -> PuzzleInstance {
        PuzzleInstance::new(42, puzzle_type(moves), init, goal, tolerance).unwrap()
    }

    #[test]
    fn test_rotation_example() {
        let p = instance(&[("r", vec![1, 2, 0])], &["A", "B", "C"], &["B", "C", "A"], 0);

        let (candidate, accepted) = verify_str(&p, "r").unwrap();
        assert_eq!(candidate.len(), 1);
        assert_eq!(accepted.mismatches, 0);
        assert_eq!(p.render(&accepted.final_state), vec!["B", "C", "A"]);

        let moves = parse_move_string("-r").unwrap();
        assert_eq!(p.render(&replay(&p, &moves).unwrap()), vec!["C", "A", "B"]);
        assert_eq!(
            verify(&p, &moves),
            Err(Rejection::ToleranceExceeded { puzzle_id: 42, mismatches: 3, tolerance: 0 })
        );

        let lenient = instance(&[("r", vec![1, 2, 0])], &["A", "B", "C"], &["B", "C", "A"], 3);
        assert_eq!(verify(&lenient, &moves).unwrap().mismatches, 3);
    }

    #[test]
    fn test_non_commuting_moves() {
        let t = puzzle_type(&[("a", vec![1, 0, 2]), ("b", vec![0, 2, 1])]);
        let p = PuzzleInstance::new(1, t.clone(), &["A", "B", "C"], &["A", "B", "C"], 3).unwrap();
        let ab = replay(&p, &parse_move_string("a.b").unwrap()).unwrap();
        let ba = replay(&p, &parse_move_string("b.a").unwrap()).unwrap();
        assert_eq!(p.render(&ab), vec!["B", "C", "A"]);
        assert_eq!(p.render(&ba), vec!["C", "A", "B"]);
        assert_ne!(ab, ba);

        // Replaying "a.b" applies a first, which is b * a as a composition.
        let a = t.get("a").unwrap().permutation();
        let b = t.get("b").unwrap().permutation();
        assert_eq!(p.render(&(b * a).apply(p.initial_state())), vec!["B", "C", "A"]);
    }

    #[test]
    fn test_inverse_round_trip() {
        let moves = [("r", vec![1, 2, 3, 0, 4, 5]), ("s", vec![0, 4, 2, 5, 1, 3]), ("t", vec![5, 1, 0, 3, 2, 4])];
        let init = ["A", "B", "C", "D", "E", "F"];
        let p = instance(&moves, &init, &init, 0);
        let names = ["r", "s", "t"];

        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..50 {
            let len = rng.gen_range(1..20);
            let mut seq = vec![];
            for _ in 0..len {
                let name = names[rng.gen_range(0..names.len())];
                if rng.gen_bool(0.5) {
                    seq.push(MoveToken::forward(name));
                } else {
                    seq.push(MoveToken::inverse(name));
                }
            }
            let mut undo: Vec<MoveToken> = seq
                .iter()
                .rev()
                .map(|tok| match tok.direction {
                    Direction::Forward => MoveToken::inverse(&tok.name),
                    Direction::Inverse => MoveToken::forward(&tok.name),
                })
                .collect();
            seq.append(&mut undo);
            let accepted = verify(&p, &seq).unwrap();
            assert_eq!(accepted.final_state, p.initial_state());
        }

        for name in names {
            let there_and_back = vec![MoveToken::forward(name), MoveToken::inverse(name)];
            assert_eq!(replay(&p, &there_and_back).unwrap(), p.initial_state());
            let back_and_there = vec![MoveToken::inverse(name), MoveToken::forward(name)];
            assert_eq!(replay(&p, &back_and_there).unwrap(), p.initial_state());
        }
    }

    #[test]
    fn test_tolerance_boundary() {
        // Swapping two facelets leaves exactly two mismatches.
        let moves = [("x", vec![1, 0, 2, 3])];
        let init = ["A", "B", "C", "D"];
        let seq = parse_move_string("x").unwrap();

        let at_limit = instance(&moves, &init, &init, 2);
        assert_eq!(verify(&at_limit, &seq).unwrap().mismatches, 2);

        let below = instance(&moves, &init, &init, 1);
        assert_eq!(
            verify(&below, &seq),
            Err(Rejection::ToleranceExceeded { puzzle_id: 42, mismatches: 2, tolerance: 1 })
        );
    }

    #[test]
    fn test_unknown_and_malformed_tokens() {
        let p = instance(&[("r", vec![1, 2, 0])], &["A", "B", "C"], &["B", "C", "A"], 0);
        assert_eq!(
            verify_str(&p, "r.q.r"),
            Err(Rejection::UnknownMove { puzzle_id: 42, move_name: "q".to_owned() })
        );
        assert_eq!(
            verify_str(&p, "-q"),
            Err(Rejection::UnknownMove { puzzle_id: 42, move_name: "q".to_owned() })
        );
        assert_eq!(
            verify_str(&p, "r."),
            Err(Rejection::MalformedToken { puzzle_id: 42, raw_token: String::new() })
        );
        assert_eq!(
            verify_str(&p, ""),
            Err(Rejection::MalformedToken { puzzle_id: 42, raw_token: String::new() })
        );
    }
}
