//! Shared piece sequence dealt identically to every player of a match

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::piece::{Piece, PieceType};
use crate::error::{ArenaError, Result};

/// What happens when a player reaches the end of the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolPolicy {
    /// The pool is never regenerated mid-match; running out is fatal for
    /// the player who ran out
    #[default]
    Fixed,
    /// Another batch is appended when a pointer reaches the end. The batch
    /// comes from the pool's own RNG so every player sees the same entries.
    Extend,
}

/// Ordered, finite sequence of pieces generated once per match
#[derive(Debug, Clone)]
pub struct PiecePool {
    pieces: Vec<Piece>,
    batch_size: usize,
    // Bag currently being dealt, reshuffled every seven pieces
    bag: [PieceType; 7],
    rng: StdRng,
}

impl PiecePool {
    /// Generate a pool of `size` pieces from a fresh OS seed
    pub fn generate(size: usize) -> Self {
        Self::from_rng(size, StdRng::from_os_rng())
    }

    /// Generate a reproducible pool
    pub fn with_seed(size: usize, seed: u64) -> Self {
        Self::from_rng(size, StdRng::seed_from_u64(seed))
    }

    fn from_rng(size: usize, rng: StdRng) -> Self {
        let mut pool = PiecePool {
            pieces: Vec::with_capacity(size),
            batch_size: size,
            bag: PieceType::ALL,
            rng,
        };
        pool.extend();
        pool
    }

    /// Append one more batch of pieces.
    ///
    /// Pieces are drawn bag by bag: every run of seven consecutive entries
    /// starting at a multiple of seven contains each shape exactly once.
    pub fn extend(&mut self) {
        let target = self.pieces.len() + self.batch_size;
        while self.pieces.len() < target {
            let offset = self.pieces.len() % self.bag.len();
            if offset == 0 {
                self.bag.shuffle(&mut self.rng);
            }
            self.pieces.push(Piece::spawn(self.bag[offset]));
        }
    }

    /// Pure lookup of the piece at `index`
    pub fn piece_at(&self, index: usize) -> Result<Piece> {
        self.pieces
            .get(index)
            .cloned()
            .ok_or(ArenaError::CapacityExceeded {
                index,
                len: self.pieces.len(),
            })
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_pool_has_requested_length() {
        let pool = PiecePool::generate(100);
        assert_eq!(pool.len(), 100);
        assert!(pool.piece_at(99).is_ok());
    }

    #[test]
    fn test_index_at_length_is_capacity_exceeded() {
        let pool = PiecePool::with_seed(100, 1);
        match pool.piece_at(100) {
            Err(ArenaError::CapacityExceeded { index, len }) => {
                assert_eq!(index, 100);
                assert_eq!(len, 100);
            }
            other => panic!("Expected CapacityExceeded, got {:?}", other),
        }
    }

    #[test]
    fn test_lookup_is_pure() {
        let pool = PiecePool::with_seed(20, 3);
        assert_eq!(pool.piece_at(5).unwrap(), pool.piece_at(5).unwrap());
        assert_eq!(pool.len(), 20);
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let a = PiecePool::with_seed(50, 42);
        let b = PiecePool::with_seed(50, 42);
        for i in 0..50 {
            assert_eq!(a.piece_at(i).unwrap(), b.piece_at(i).unwrap());
        }
    }

    #[test]
    fn test_bag_distribution() {
        let pool = PiecePool::with_seed(98, 9);
        for bag in 0..14 {
            let kinds: HashSet<PieceType> = (bag * 7..bag * 7 + 7)
                .map(|i| pool.piece_at(i).unwrap().kind())
                .collect();
            assert_eq!(kinds.len(), 7);
        }
    }

    #[test]
    fn test_extend_keeps_existing_entries() {
        let mut pool = PiecePool::with_seed(10, 5);
        let before: Vec<Piece> = (0..10).map(|i| pool.piece_at(i).unwrap()).collect();
        pool.extend();
        assert_eq!(pool.len(), 20);
        for (i, piece) in before.iter().enumerate() {
            assert_eq!(&pool.piece_at(i).unwrap(), piece);
        }
        assert!(pool.piece_at(19).is_ok());
    }

    #[test]
    fn test_dealt_pieces_are_in_spawn_state() {
        let pool = PiecePool::with_seed(14, 11);
        for i in 0..14 {
            let piece = pool.piece_at(i).unwrap();
            assert_eq!(piece, Piece::spawn(piece.kind()));
        }
    }
}
