use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Inverse,
}

/// One reference to a move, e.g. `f1` or `-f1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MoveToken {
    pub name: String,
    pub direction: Direction,
}

impl MoveToken {
    pub fn forward(name: &str) -> MoveToken {
        MoveToken { name: name.to_owned(), direction: Direction::Forward }
    }

    pub fn inverse(name: &str) -> MoveToken {
        MoveToken { name: name.to_owned(), direction: Direction::Inverse }
    }

    /// Parses a single token. A leading `-` marks the inverse; the rest must be
    /// a non-empty name that does not itself start with `-`.
    pub fn parse(tok: &str) -> Option<MoveToken> {
        let (name, direction) = match tok.strip_prefix('-') {
            Some(rest) => (rest, Direction::Inverse),
            None => (tok, Direction::Forward),
        };
        if name.is_empty() || name.starts_with('-') {
            return None;
        }
        Some(MoveToken { name: name.to_owned(), direction })
    }
}

impl fmt::Display for MoveToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            Direction::Forward => write!(f, "{}", self.name),
            Direction::Inverse => write!(f, "-{}", self.name),
        }
    }
}

/// Splits a `.`-joined move string into parsed tokens. On failure returns the
/// first raw token that could not be parsed.
pub fn parse_move_string(input: &str) -> Result<Vec<MoveToken>, String> {
    input
        .split('.')
        .map(|tok| MoveToken::parse(tok).ok_or_else(|| tok.to_owned()))
        .collect()
}

/// A submitted move sequence for one puzzle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolutionCandidate {
    moves: Vec<MoveToken>,
}

impl SolutionCandidate {
    pub fn new(moves: Vec<MoveToken>) -> SolutionCandidate {
        SolutionCandidate { moves }
    }

    pub fn moves(&self) -> &[MoveToken] {
        &self.moves
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}

impl fmt::Display for SolutionCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, mv) in self.moves.iter().enumerate() {
            if i != 0 {
                f.write_str(".")?;
            }
            write!(f, "{mv}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_token() {
        assert_eq!(MoveToken::parse("f0"), Some(MoveToken::forward("f0")));
        assert_eq!(MoveToken::parse("-r1"), Some(MoveToken::inverse("r1")));
        assert_eq!(MoveToken::parse(""), None);
        assert_eq!(MoveToken::parse("-"), None);
        assert_eq!(MoveToken::parse("--r"), None);
    }

    #[test]
    fn test_parse_move_string() {
        let moves = parse_move_string("r0.-f1.d2").unwrap();
        assert_eq!(
            moves,
            vec![MoveToken::forward("r0"), MoveToken::inverse("f1"), MoveToken::forward("d2")]
        );
        assert_eq!(SolutionCandidate::new(moves).to_string(), "r0.-f1.d2");

        assert_eq!(parse_move_string(""), Err(String::new()));
        assert_eq!(parse_move_string("r0..f1"), Err(String::new()));
        assert_eq!(parse_move_string("r0.-"), Err("-".to_owned()));
    }
}
