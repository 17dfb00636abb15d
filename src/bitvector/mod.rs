//! Compact bit-set over `[0, universe)` with block-sampled rank/select.
//!
//! Generalizes the fixed five-symbol checkpoint scheme of a blocked FM-index
//! rank table (one prefix-count array per symbol, sampled every block) down
//! to a single bit: each [`BitVector`] keeps one running count, sampled every
//! [`BLOCK_STRIDE`] bits, so `rank`/`select`/`valueAfter` only ever scan a
//! bounded suffix of one block instead of the whole vector.

use bitvec::prelude::{BitVec, Lsb0};
use thiserror::Error;

/// Number of bits between rank/select checkpoints.
pub const BLOCK_STRIDE: usize = 512;

/// Errors raised while building or querying a [`BitVector`].
#[derive(Debug, Error)]
pub enum BitVectorError {
    /// A run or bit was added at or before the current encoder cursor.
    #[error("position {position} is not past the current cursor {cursor}")]
    NonMonotonicPosition {
        /// Position of the offending write.
        position: usize,
        /// Cursor position before the write.
        cursor: usize,
    },
    /// A run or bit fell outside the declared universe.
    #[error("position {position} is outside universe of size {universe}")]
    OutOfUniverse {
        /// Offending position.
        position: usize,
        /// Declared universe size.
        universe: usize,
    },
}

#[derive(Debug, Clone, Copy)]
struct Checkpoint {
    bit_index: usize,
    count_before: usize,
}

/// A compressed, immutable bit-set over `[0, universe)`.
#[derive(Debug, Clone)]
pub struct BitVector {
    bits: BitVec<u64, Lsb0>,
    checkpoints: Vec<Checkpoint>,
    total_set: usize,
}

impl BitVector {
    /// Size of the universe this bit-set is defined over.
    pub fn universe(&self) -> usize {
        self.bits.len()
    }

    /// Total number of set bits.
    pub fn count_set(&self) -> usize {
        self.total_set
    }

    /// Whether bit `i` is set. Out-of-range indices are unset.
    pub fn is_set(&self, i: usize) -> bool {
        self.bits.get(i).map(|b| *b).unwrap_or(false)
    }

    fn checkpoint_for(&self, i: usize) -> &Checkpoint {
        let idx = i / BLOCK_STRIDE;
        &self.checkpoints[idx.min(self.checkpoints.len() - 1)]
    }

    /// Number of set bits in `[0, i)`.
    pub fn rank(&self, i: usize) -> usize {
        let bounded = i.min(self.bits.len());
        let checkpoint = self.checkpoint_for(bounded);
        let start = checkpoint.bit_index;
        let scan = &self.bits[start..bounded];
        checkpoint.count_before + scan.count_ones()
    }

    /// Position of the `k`-th set bit (0-indexed). Panics if `k >=
    /// count_set()`; callers that want a saturating answer should check
    /// `count_set()` first, matching `valueAfter`'s explicit failure value.
    pub fn select(&self, k: usize) -> usize {
        assert!(k < self.total_set, "select index out of range");

        // Binary search the checkpoint table for the block containing rank k.
        let block = self
            .checkpoints
            .partition_point(|c| c.count_before <= k)
            .saturating_sub(1);
        let checkpoint = self.checkpoints[block];

        let mut seen = checkpoint.count_before;
        for (offset, bit) in self.bits[checkpoint.bit_index..].iter().enumerate() {
            if *bit {
                if seen == k {
                    return checkpoint.bit_index + offset;
                }
                seen += 1;
            }
        }
        unreachable!("select index within count_set but not found");
    }

    /// Smallest set bit at or after `i`, together with its rank. Returns
    /// `(universe, count_set())` when no such bit exists.
    pub fn value_after(&self, i: usize) -> (usize, usize) {
        if i >= self.bits.len() {
            return (self.universe(), self.total_set);
        }
        if self.is_set(i) {
            return (i, self.rank(i));
        }
        for (offset, bit) in self.bits[i..].iter().enumerate() {
            if *bit {
                let pos = i + offset;
                return (pos, self.rank(pos));
            }
        }
        (self.universe(), self.total_set)
    }

    /// Number of maximal runs of consecutive set bits.
    pub fn count_runs(&self) -> usize {
        if self.total_set == 0 {
            return 0;
        }
        let mut runs = 0;
        let mut prev = false;
        for bit in self.bits.iter() {
            let bit = *bit;
            if bit && !prev {
                runs += 1;
            }
            prev = bit;
        }
        runs
    }

    /// Build directly from an iterator of set positions (test/demo helper;
    /// prefer [`BitVectorBuilder`] for streaming construction with run
    /// coalescing).
    pub fn from_positions(universe: usize, positions: impl IntoIterator<Item = usize>) -> Self {
        let mut builder = BitVectorBuilder::new(universe);
        for p in positions {
            builder.add_bit(p).expect("position within universe and monotone");
        }
        builder.finish()
    }
}

/// Streaming encoder for [`BitVector`], matching the source's
/// `addBit`/`addRun`/`flush` encoder interface. Positions must be added in
/// strictly increasing order; adjacent runs are coalesced automatically.
#[derive(Debug)]
pub struct BitVectorBuilder {
    universe: usize,
    bits: BitVec<u64, Lsb0>,
    checkpoints: Vec<Checkpoint>,
    cursor: usize,
    total_set: usize,
    pending_run: Option<(usize, usize)>,
}

impl BitVectorBuilder {
    /// Start a new builder for a bit-set over `[0, universe)`.
    pub fn new(universe: usize) -> Self {
        Self {
            universe,
            bits: BitVec::repeat(false, universe),
            checkpoints: Vec::new(),
            cursor: 0,
            total_set: 0,
            pending_run: None,
        }
    }

    /// Add a single set bit at `position`.
    pub fn add_bit(&mut self, position: usize) -> Result<(), BitVectorError> {
        self.add_run(position, 1)
    }

    /// Add a run of `len` set bits starting at `start`, coalescing with an
    /// immediately adjacent pending run.
    pub fn add_run(&mut self, start: usize, len: usize) -> Result<(), BitVectorError> {
        if len == 0 {
            return Ok(());
        }
        if start + len > self.universe {
            return Err(BitVectorError::OutOfUniverse {
                position: start + len - 1,
                universe: self.universe,
            });
        }
        if start < self.cursor {
            return Err(BitVectorError::NonMonotonicPosition {
                position: start,
                cursor: self.cursor,
            });
        }

        match self.pending_run {
            Some((run_start, run_len)) if run_start + run_len == start => {
                self.pending_run = Some((run_start, run_len + len));
            }
            Some((run_start, run_len)) => {
                self.commit_run(run_start, run_len);
                self.pending_run = Some((start, len));
            }
            None => {
                self.pending_run = Some((start, len));
            }
        }
        self.cursor = start + len;
        Ok(())
    }

    fn commit_run(&mut self, start: usize, len: usize) {
        self.bits[start..start + len].fill(true);
        self.total_set += len;
    }

    /// Finish the build, producing an immutable [`BitVector`] with rank/select
    /// checkpoints populated.
    pub fn finish(mut self) -> BitVector {
        if let Some((start, len)) = self.pending_run.take() {
            self.commit_run(start, len);
        }

        let mut checkpoints = Vec::with_capacity(self.universe / BLOCK_STRIDE + 1);
        let mut count_before = 0usize;
        let mut block_start = 0usize;
        while block_start < self.universe.max(1) {
            checkpoints.push(Checkpoint {
                bit_index: block_start,
                count_before,
            });
            let block_end = (block_start + BLOCK_STRIDE).min(self.universe);
            count_before += self.bits[block_start..block_end].count_ones();
            block_start += BLOCK_STRIDE;
        }
        if checkpoints.is_empty() {
            checkpoints.push(Checkpoint {
                bit_index: 0,
                count_before: 0,
            });
        }

        BitVector {
            bits: self.bits,
            checkpoints,
            total_set: self.total_set,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_select_round_trip() {
        let bv = BitVector::from_positions(100, [2, 5, 6, 7, 40, 99]);
        assert_eq!(bv.count_set(), 6);
        for (k, expected) in [(0, 2), (1, 5), (2, 6), (3, 7), (4, 40), (5, 99)] {
            assert_eq!(bv.select(k), expected);
        }
        assert_eq!(bv.rank(0), 0);
        assert_eq!(bv.rank(3), 1);
        assert_eq!(bv.rank(6), 2);
        assert_eq!(bv.rank(100), 6);
    }

    #[test]
    fn value_after_finds_next_or_end_sentinel() {
        let bv = BitVector::from_positions(20, [3, 10]);
        assert_eq!(bv.value_after(0), (3, 0));
        assert_eq!(bv.value_after(3), (3, 0));
        assert_eq!(bv.value_after(4), (10, 1));
        assert_eq!(bv.value_after(11), (20, 2));
    }

    #[test]
    fn count_runs_counts_maximal_runs() {
        let bv = BitVector::from_positions(20, [0, 1, 2, 5, 8, 9]);
        assert_eq!(bv.count_runs(), 3);
    }

    #[test]
    fn run_coalescing_matches_explicit_bits() {
        let mut builder = BitVectorBuilder::new(30);
        builder.add_run(2, 3).unwrap(); // 2,3,4
        builder.add_run(5, 2).unwrap(); // 5,6 -- adjacent, coalesces
        builder.add_bit(20).unwrap();
        let bv = builder.finish();

        let explicit = BitVector::from_positions(30, [2, 3, 4, 5, 6, 20]);
        for i in 0..30 {
            assert_eq!(bv.is_set(i), explicit.is_set(i), "bit {i}");
        }
        assert_eq!(bv.count_runs(), 2);
    }

    #[test]
    fn empty_bitvector_is_well_behaved() {
        let bv = BitVector::from_positions(10, []);
        assert_eq!(bv.count_set(), 0);
        assert_eq!(bv.count_runs(), 0);
        assert_eq!(bv.value_after(0), (10, 0));
        assert_eq!(bv.rank(10), 0);
    }

    #[test]
    fn checkpoints_span_multiple_blocks() {
        let positions: Vec<usize> = (0..2000).step_by(3).collect();
        let bv = BitVector::from_positions(2000, positions.clone());
        for (k, &pos) in positions.iter().enumerate() {
            assert_eq!(bv.select(k), pos);
        }
        for i in (0..2000).step_by(17) {
            let naive_rank = positions.iter().filter(|&&p| p < i).count();
            assert_eq!(bv.rank(i), naive_rank, "rank at {i}");
        }
    }
}
