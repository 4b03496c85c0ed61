use std::ops::{Mul, Not};

/// A permutation of facelet positions.
///
/// `apply` follows the destination-index convention of `puzzle_info.csv`:
/// position `i` of the result receives the facelet at `perm[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Permutation {
    perm: Vec<usize>,
    perm_inv: Vec<usize>,
}

impl Permutation {
    /// Builds a permutation, or returns `None` when `perm` is not a bijection on `0..perm.len()`.
    pub fn new(perm: Vec<usize>) -> Option<Permutation> {
        let mut perm_inv = vec![usize::MAX; perm.len()];
        for i in 0..perm.len() {
            let p = perm[i];
            if p >= perm.len() || perm_inv[p] != usize::MAX {
                return None;
            }
            perm_inv[p] = i;
        }
        Some(Permutation { perm, perm_inv })
    }

    pub fn identity(size: usize) -> Permutation {
        Permutation {
            perm: (0..size).collect(),
            perm_inv: (0..size).collect(),
        }
    }

    pub fn sparsify(&self) -> SparsePermutation {
        let mut src = vec![];
        let mut dest = vec![];
        for i in 0..self.len() {
            if self.perm[i] != i {
                src.push(i);
                dest.push(self.perm[i]);
            }
        }
        SparsePermutation { src, dest, len: self.len() }
    }

    pub fn apply<T: Clone>(&self, target: &[T]) -> Vec<T> {
        assert_eq!(self.len(), target.len());
        self.perm.iter().map(|&p| target[p].clone()).collect()
    }

    pub fn apply_inv<T: Clone>(&self, target: &[T]) -> Vec<T> {
        assert_eq!(self.len(), target.len());
        self.perm_inv.iter().map(|&p| target[p].clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.perm.len()
    }

    pub fn is_empty(&self) -> bool {
        self.perm.is_empty()
    }
}

impl Not for Permutation {
    type Output = Permutation;

    fn not(self) -> Self::Output {
        Permutation {
            perm: self.perm_inv,
            perm_inv: self.perm,
        }
    }
}

// Composition of permutations.
// (x * y).apply(seq) == x.apply(y.apply(seq)) holds.
impl Mul<&Permutation> for &Permutation {
    type Output = Permutation;

    fn mul(self, rhs: &Permutation) -> Self::Output {
        // a.apply(b.apply(target))[i] == b.apply(target)[a.perm[i]] == target[b.perm[a.perm[i]]]
        assert_eq!(self.len(), rhs.len());
        let perm: Vec<usize> = self.perm.iter().map(|&p| rhs.perm[p]).collect();
        let mut perm_inv = vec![0; perm.len()];
        for (i, &p) in perm.iter().enumerate() {
            perm_inv[p] = i;
        }
        Permutation { perm, perm_inv }
    }
}

impl Mul<Permutation> for Permutation {
    type Output = Permutation;

    fn mul(self, rhs: Permutation) -> Self::Output {
        &self * &rhs
    }
}

/// Only the positions a move actually displaces. Most puzzle moves touch a
/// small fraction of the facelets, so replay works in place on these.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SparsePermutation {
    src: Vec<usize>,
    dest: Vec<usize>,
    len: usize,
}

impl SparsePermutation {
    pub fn densify(&self) -> Permutation {
        let mut perm = (0..self.len).collect::<Vec<_>>();
        for i in 0..self.src.len() {
            perm[self.src[i]] = self.dest[i];
        }
        let mut perm_inv = vec![0; self.len];
        for (i, &p) in perm.iter().enumerate() {
            perm_inv[p] = i;
        }
        Permutation { perm, perm_inv }
    }

    pub fn apply_inplace<T: Clone>(&self, target: &mut [T]) {
        assert_eq!(self.len(), target.len());
        let buf: Vec<T> = self.dest.iter().map(|&d| target[d].clone()).collect();
        for (i, val) in buf.into_iter().enumerate() {
            target[self.src[i]] = val;
        }
    }

    pub fn apply_inv_inplace<T: Clone>(&self, target: &mut [T]) {
        assert_eq!(self.len(), target.len());
        let buf: Vec<T> = self.src.iter().map(|&s| target[s].clone()).collect();
        for (i, val) in buf.into_iter().enumerate() {
            target[self.dest[i]] = val;
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of displaced positions.
    pub fn num_moves(&self) -> usize {
        self.src.len()
    }
}

impl Not for SparsePermutation {
    type Output = SparsePermutation;

    fn not(self) -> Self::Output {
        SparsePermutation {
            src: self.dest,
            dest: self.src,
            len: self.len,
        }
    }
}
