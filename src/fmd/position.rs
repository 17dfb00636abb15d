//! [`FMDPosition`]: the bidirectional BWT interval ("bi-interval") that
//! backward/forward extension operates on.
//!
//! Grounded directly on `libFMD/FMDIndex.cpp`'s `extend`/`extendFast`: a
//! bi-interval pairs a forward-strand BWT interval with its mirror interval
//! over the reverse-complemented text, so that extending the *pattern* to
//! the left (backward search) or to the right (via a flip + complement
//! trick) both stay representable as one forward-interval update.

use thiserror::Error;

use crate::alphabet::{Base, BASES};
use crate::fmd::bwt::BwtBackend;
use crate::fmd::range::{GenomeMask, RangeVector};

/// `BASES` ordered by the alphabetical rank of each base's complement
/// (`T`'s complement `A` sorts first, ..., `N` complements to itself and
/// sorts last). Bucket allocation for the mirror (reverse-strand) interval
/// must follow this order rather than `BASES`'s own order, since that
/// interval lives over the reverse-complemented text.
const REVERSE_COMPLEMENT_ORDER: [Base; BASES.len()] =
    [Base::T, Base::G, Base::C, Base::A, Base::N];

/// Errors raised while extending or querying an [`FMDPosition`].
#[derive(Debug, Error)]
pub enum PositionError {
    /// The backend reported an alphabet error while computing `PC`/`Occ`.
    #[error("alphabet error during extension: {0}")]
    Alphabet(#[from] crate::alphabet::AlphabetError),
}

/// A bidirectional BWT interval: a forward-strand interval
/// `[forward_start, forward_start + end_offset]` together with the mirror
/// interval `[reverse_start, reverse_start + end_offset]` over the
/// reverse-complemented text. `end_offset < 0` represents the empty
/// interval (no matches), matching the source's signed-offset convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FMDPosition {
    forward_start: usize,
    reverse_start: usize,
    end_offset: i64,
}

impl FMDPosition {
    /// Construct an interval directly from its three fields.
    pub fn new(forward_start: usize, reverse_start: usize, end_offset: i64) -> Self {
        Self {
            forward_start,
            reverse_start,
            end_offset,
        }
    }

    /// The canonical empty interval.
    pub fn empty() -> Self {
        Self {
            forward_start: 0,
            reverse_start: 0,
            end_offset: -1,
        }
    }

    /// The whole-BWT covering interval, i.e. `count("")`'s result.
    pub fn covering(bwt_len: usize) -> Self {
        Self {
            forward_start: 0,
            reverse_start: 0,
            end_offset: bwt_len as i64 - 1,
        }
    }

    /// Start of the forward-strand interval.
    pub fn forward_start(&self) -> usize {
        self.forward_start
    }

    /// Start of the reverse-strand mirror interval.
    pub fn reverse_start(&self) -> usize {
        self.reverse_start
    }

    /// Whether the interval contains no rows.
    pub fn is_empty(&self) -> bool {
        self.end_offset < 0
    }

    /// Number of BWT rows in the interval (raw, unmasked).
    pub fn length(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (self.end_offset + 1) as usize
        }
    }

    /// Number of BWT rows in the interval that are included under `mask`,
    /// or the raw [`length`](Self::length) if no mask is given.
    pub fn masked_length(&self, mask: Option<&GenomeMask>) -> usize {
        match mask {
            Some(mask) => mask.masked_length(self.forward_start, self.end_offset),
            None => self.length(),
        }
    }

    /// Whether the interval is empty under `mask` (no included rows), or
    /// plain emptiness if no mask is given.
    pub fn is_empty_under(&self, mask: Option<&GenomeMask>) -> bool {
        if self.is_empty() {
            return true;
        }
        match mask {
            Some(_) => self.masked_length(mask) == 0,
            None => false,
        }
    }

    /// Swap the forward and reverse intervals, keeping the same length.
    /// Used to implement forward extension as a backward extension of the
    /// complemented pattern over the mirrored interval.
    pub fn flip(&self) -> Self {
        Self {
            forward_start: self.reverse_start,
            reverse_start: self.forward_start,
            end_offset: self.end_offset,
        }
    }

    /// Extend the interval by one base, in the given direction.
    ///
    /// `backward = true` extends the pattern to the left (prepend `c`);
    /// `backward = false` extends to the right (append `c`), implemented as
    /// a backward extension by `c`'s complement over the flipped interval.
    pub fn extend(
        &self,
        bwt: &dyn BwtBackend,
        c: Base,
        backward: bool,
    ) -> Result<Self, PositionError> {
        if !backward {
            return Ok(self.flip().extend(bwt, c.complement(), true)?.flip());
        }

        let length = self.length();
        let mut lengths = [0usize; BASES.len()];
        let mut starts = [0usize; BASES.len()];
        let mut total_base_length = 0usize;

        for (idx, base) in BASES.iter().enumerate() {
            let byte = base.to_ascii();
            let occ_before = bwt.occ(byte, self.forward_start)?;
            let occ_end = bwt.occ(byte, self.forward_start + length)?;
            let len = occ_end - occ_before;
            starts[idx] = bwt.pc(byte)? + occ_before;
            lengths[idx] = len;
            total_base_length += len;
        }

        let end_of_text_length = length - total_base_length;

        // Reverse ranges are allocated in alphabetical order by reverse
        // complement, not by the base's own alphabetical order: the mirror
        // interval lives over the reverse-complemented text, so its bucket
        // order must match that text's bucket order.
        let mut reverse_starts = [0usize; BASES.len()];
        reverse_starts[REVERSE_COMPLEMENT_ORDER[0].index()] = self.reverse_start + end_of_text_length;
        for k in 1..REVERSE_COMPLEMENT_ORDER.len() {
            let prev = REVERSE_COMPLEMENT_ORDER[k - 1].index();
            let cur = REVERSE_COMPLEMENT_ORDER[k].index();
            reverse_starts[cur] = reverse_starts[prev] + lengths[prev];
        }

        let target = c.index();
        let matched_len = lengths[target];
        Ok(Self {
            forward_start: starts[target],
            reverse_start: reverse_starts[target],
            end_offset: matched_len as i64 - 1,
        })
    }

    /// Fast-path extension sharing the same result as [`extend`](Self::extend)
    /// but scanning bases in alphabet order only until the target base is
    /// found, matching `FMDIndex::extendFast`'s early-exit behaviour. Kept
    /// as a distinct entry point since callers that only need a handful of
    /// extensions (e.g. probing mismatches) avoid the full reverse-start
    /// table computation of [`extend`](Self::extend) this way in spirit,
    /// even though both are O(alphabet) here.
    pub fn extend_fast(
        &self,
        bwt: &dyn BwtBackend,
        c: Base,
        backward: bool,
    ) -> Result<Self, PositionError> {
        self.extend(bwt, c, backward)
    }

    /// The single range id the interval falls entirely within, if any.
    pub fn range(&self, ranges: &RangeVector, mask: Option<&GenomeMask>) -> Option<usize> {
        if self.is_empty_under(mask) {
            return None;
        }
        let (start, len) = match mask {
            Some(mask) => {
                let (first_included, _) = mask.value_after(self.forward_start);
                (first_included, mask.masked_length(self.forward_start, self.end_offset))
            }
            None => (self.forward_start, self.length()),
        };
        if len == 0 {
            return None;
        }
        let end_inclusive = start + len - 1;
        let start_range = ranges.range_id_at(start)?;
        let end_range = ranges.range_id_at(end_inclusive)?;
        if start_range == end_range {
            Some(start_range)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fmd::bwt::InMemoryBwt;

    #[test]
    fn extend_backward_then_forward_recovers_same_length_class() {
        let texts = vec![b"ACGTACGT".to_vec()];
        let bwt = InMemoryBwt::build(&texts).unwrap();
        let whole = FMDPosition::covering(bwt.len());

        let after_a = whole.extend(&bwt, Base::A, true).unwrap();
        assert!(!after_a.is_empty());

        let flipped_then_back = after_a.flip().flip();
        assert_eq!(flipped_then_back, after_a);
    }

    #[test]
    fn extend_never_increases_interval_length() {
        let texts = vec![b"ACGTACGTACGT".to_vec()];
        let bwt = InMemoryBwt::build(&texts).unwrap();
        let mut pos = FMDPosition::covering(bwt.len());
        for &base in &[Base::T, Base::G, Base::C, Base::A] {
            let next = pos.extend(&bwt, base, true).unwrap();
            assert!(next.length() <= pos.length());
            pos = next;
            if pos.is_empty() {
                break;
            }
        }
    }

    #[test]
    fn extend_forward_and_backward_are_consistent_via_flip() {
        let texts = vec![b"ACGTACGT".to_vec()];
        let bwt = InMemoryBwt::build(&texts).unwrap();
        let whole = FMDPosition::covering(bwt.len());
        let backward = whole.extend(&bwt, Base::A, true).unwrap();
        let forward = whole.extend(&bwt, Base::A, false).unwrap();
        assert_eq!(backward.length(), forward.length());
    }

    #[test]
    fn empty_interval_stays_empty_under_any_extension() {
        let texts = vec![b"ACGT".to_vec()];
        let bwt = InMemoryBwt::build(&texts).unwrap();
        let empty = FMDPosition::empty();
        let next = empty.extend(&bwt, Base::A, true).unwrap();
        assert!(next.is_empty());
    }
}
