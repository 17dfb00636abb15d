//! BWT storage boundary: [`BwtBackend`] and the in-memory demonstration
//! implementation that builds one by naive suffix-array sort.
//!
//! `spec.md` scopes loading a production on-disk BWT/sampled-suffix-array
//! out as a Non-goal; `BwtBackend` is the seam such a loader would plug
//! into. [`InMemoryBwt`] is the one concrete implementation shipped here,
//! grounded directly on `genomics::fm_index::BlockedFMIndex::build`'s
//! naive-sort construction and its explicit "demonstration and moderate
//! input sizes" caveat.

use thiserror::Error;

use crate::alphabet::{symbol_order, AlphabetError, ALPHABET_SIZE, SENTINEL};
use crate::fmd::contigs::TextPosition;

/// Errors raised while building or querying a [`BwtBackend`].
#[derive(Debug, Error)]
pub enum BwtError {
    /// The input collection contained no sequence at all.
    #[error("cannot build a BWT over an empty sequence collection")]
    EmptyCollection,
    /// A byte in the input could not be classified as a base or sentinel.
    #[error("invalid symbol at text {text} offset {offset}: {source}")]
    InvalidSymbol {
        /// Text (contig*2+strand) the symbol occurred in.
        text: usize,
        /// Offset within that text.
        offset: usize,
        /// Underlying alphabet error.
        #[source]
        source: AlphabetError,
    },
}

/// Read-only access to a BWT over a concatenated multi-text collection.
///
/// All counting operations use an *exclusive-prefix* convention: `occ(c,
/// before)` counts occurrences of `c` in `bwt[0..before]`, so `before = 0`
/// always yields `0` without needing a signed "index -1" sentinel the way
/// the original C++ `Occ(c, -1)` does.
pub trait BwtBackend: Send + Sync {
    /// Total length of the BWT (sum of every text's length, including one
    /// sentinel per text).
    fn len(&self) -> usize;

    /// Whether the BWT is empty (never true for a non-degenerate backend).
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of symbols in the whole BWT strictly less than `symbol` in
    /// alphabet order (`$ < A < C < G < T < N`), i.e. the `C`/`PC` array.
    fn pc(&self, symbol: u8) -> Result<usize, AlphabetError>;

    /// Number of occurrences of `symbol` in `bwt[0..before]`.
    fn occ(&self, symbol: u8, before: usize) -> Result<usize, AlphabetError>;

    /// The BWT symbol (`L` column) at `index`.
    fn char_at(&self, index: usize) -> u8;

    /// The sorted-rotation symbol (`F` column) at `index`, derived from
    /// `pc`/`occ` by locating which alphabet bucket contains `index`.
    fn first_at(&self, index: usize) -> u8 {
        let mut symbol = SENTINEL;
        for candidate in std::iter::once(SENTINEL).chain(crate::alphabet::BASES.iter().map(|b| b.to_ascii())) {
            if self.pc(candidate).unwrap_or(0) <= index {
                symbol = candidate;
            } else {
                break;
            }
        }
        symbol
    }

    /// LF-mapping: the BWT index whose `F`-column instance corresponds to
    /// the same text position as `index`'s `L`-column instance.
    fn last_to_first(&self, index: usize) -> usize {
        let c = self.char_at(index);
        let rank_before = self.occ(c, index).unwrap_or(0);
        self.pc(c).unwrap_or(0) + rank_before
    }

    /// Resolve a BWT row to its originating `(text, offset)`, walking the
    /// sampled/full suffix array.
    fn locate(&self, index: usize) -> TextPosition;

    /// The BWT index of the last row of `contig`'s given strand's text,
    /// i.e. where a backward walk via `last_to_first` should start to
    /// reconstruct that text end-to-start.
    fn contig_end_index(&self, text: usize) -> usize;
}

#[derive(Debug, Clone, Copy)]
struct SuffixArrayEntry {
    text: usize,
    offset: usize,
}

/// A demonstration [`BwtBackend`] built by sorting all rotations/suffixes
/// of the input collection directly in memory.
///
/// Suitable for demonstration and moderate input sizes — this is not a
/// production suffix-array construction algorithm (no SA-IS, no on-disk
/// sampling); it exists so the rest of the crate has a real, queryable BWT
/// to run against.
pub struct InMemoryBwt {
    bwt: Vec<u8>,
    suffix_array: Vec<SuffixArrayEntry>,
    row_of_position: std::collections::HashMap<(usize, usize), usize>,
    pc: [usize; ALPHABET_SIZE + 1],
    contig_end_indices: Vec<usize>,
}

impl InMemoryBwt {
    /// Build an in-memory BWT over `texts`, one byte slice per
    /// `contig * 2 + strand` text (forward and reverse complement for each
    /// contig, interleaved as `[fwd0, rev0, fwd1, rev1, ...]`).
    pub fn build(texts: &[Vec<u8>]) -> Result<Self, BwtError> {
        if texts.is_empty() || texts.iter().all(|t| t.is_empty()) {
            return Err(BwtError::EmptyCollection);
        }

        // Validate the alphabet up front so later indexing never needs to
        // handle invalid bytes.
        for (text_idx, text) in texts.iter().enumerate() {
            for (offset, &byte) in text.iter().enumerate() {
                symbol_order(byte).map_err(|source| BwtError::InvalidSymbol {
                    text: text_idx,
                    offset,
                    source,
                })?;
            }
        }

        // Each text is terminated with its own sentinel so suffixes never
        // run across text boundaries.
        let terminated: Vec<Vec<u8>> = texts
            .iter()
            .map(|t| {
                let mut v = t.clone();
                v.push(SENTINEL);
                v
            })
            .collect();

        let mut suffixes: Vec<SuffixArrayEntry> = Vec::new();
        for (text_idx, text) in terminated.iter().enumerate() {
            for offset in 0..text.len() {
                suffixes.push(SuffixArrayEntry { text: text_idx, offset });
            }
        }

        suffixes.sort_by(|a, b| {
            let sa = &terminated[a.text][a.offset..];
            let sb = &terminated[b.text][b.offset..];
            compare_suffixes(sa, sb)
        });

        let bwt: Vec<u8> = suffixes
            .iter()
            .map(|entry| {
                let text = &terminated[entry.text];
                if entry.offset == 0 {
                    text[text.len() - 1]
                } else {
                    text[entry.offset - 1]
                }
            })
            .collect();

        let mut counts = [0usize; ALPHABET_SIZE + 1];
        for &byte in &bwt {
            let order = symbol_order(byte).expect("validated above");
            counts[order] += 1;
        }
        let mut pc = [0usize; ALPHABET_SIZE + 1];
        let mut running = 0;
        for (order, count) in counts.iter().enumerate() {
            pc[order] = running;
            running += count;
        }

        let mut contig_end_indices = vec![0usize; terminated.len()];
        let mut row_of_position = std::collections::HashMap::with_capacity(suffixes.len());
        for (row, entry) in suffixes.iter().enumerate() {
            if entry.offset == terminated[entry.text].len() - 1 {
                contig_end_indices[entry.text] = row;
            }
            if entry.offset < texts[entry.text].len() {
                row_of_position.insert((entry.text, entry.offset), row);
            }
        }

        Ok(Self {
            bwt,
            suffix_array: suffixes,
            row_of_position,
            pc,
            contig_end_indices,
        })
    }
}

impl InMemoryBwt {
    /// Inverse of [`BwtBackend::locate`]: the BWT row whose suffix starts at
    /// `(text, offset)`. Used by callers that build a [`crate::fmd::RangeVector`]
    /// over a known set of reference positions.
    pub fn row_of(&self, text: usize, offset: usize) -> Option<usize> {
        self.row_of_position.get(&(text, offset)).copied()
    }
}

fn compare_suffixes(a: &[u8], b: &[u8]) -> std::cmp::Ordering {
    for (&x, &y) in a.iter().zip(b.iter()) {
        let ox = symbol_order(x).expect("validated");
        let oy = symbol_order(y).expect("validated");
        if ox != oy {
            return ox.cmp(&oy);
        }
    }
    a.len().cmp(&b.len())
}

impl BwtBackend for InMemoryBwt {
    fn len(&self) -> usize {
        self.bwt.len()
    }

    fn pc(&self, symbol: u8) -> Result<usize, AlphabetError> {
        Ok(self.pc[symbol_order(symbol)?])
    }

    fn occ(&self, symbol: u8, before: usize) -> Result<usize, AlphabetError> {
        let order = symbol_order(symbol)?;
        let before = before.min(self.bwt.len());
        Ok(self.bwt[..before]
            .iter()
            .filter(|&&b| symbol_order(b).expect("validated") == order)
            .count())
    }

    fn char_at(&self, index: usize) -> u8 {
        self.bwt[index]
    }

    fn locate(&self, index: usize) -> TextPosition {
        let entry = self.suffix_array[index];
        TextPosition::new(entry.text, entry.offset)
    }

    fn contig_end_index(&self, text: usize) -> usize {
        self.contig_end_indices[text]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive_occ(bwt: &[u8], symbol: u8, before: usize) -> usize {
        bwt[..before.min(bwt.len())]
            .iter()
            .filter(|&&b| b == symbol)
            .count()
    }

    #[test]
    fn occ_matches_naive_scan() {
        let texts = vec![b"ACGT".to_vec(), b"TTGCA".to_vec()];
        let bwt = InMemoryBwt::build(&texts).unwrap();
        for &symbol in &[b'A', b'C', b'G', b'T', b'N', SENTINEL] {
            for before in 0..=bwt.len() {
                assert_eq!(
                    bwt.occ(symbol, before).unwrap(),
                    naive_occ(&bwt.bwt, symbol, before),
                    "symbol {symbol} before {before}"
                );
            }
        }
    }

    #[test]
    fn pc_is_nondecreasing_and_spans_total_length() {
        let texts = vec![b"ACGTACGT".to_vec()];
        let bwt = InMemoryBwt::build(&texts).unwrap();
        let mut prev = 0;
        for &symbol in &[SENTINEL, b'A', b'C', b'G', b'T', b'N'] {
            let pc = bwt.pc(symbol).unwrap();
            assert!(pc >= prev);
            prev = pc;
        }
    }

    #[test]
    fn empty_collection_is_rejected() {
        assert!(InMemoryBwt::build(&[]).is_err());
        assert!(InMemoryBwt::build(&[Vec::new()]).is_err());
    }

    #[test]
    fn invalid_symbol_is_rejected() {
        let texts = vec![b"ACGTX".to_vec()];
        assert!(matches!(
            InMemoryBwt::build(&texts),
            Err(BwtError::InvalidSymbol { .. })
        ));
    }

    #[test]
    fn last_to_first_is_a_permutation_of_bwt_rows() {
        let texts = vec![b"BANANA".iter().map(|&b| if b == b'B' { b'A' } else { b }).collect()];
        let bwt = InMemoryBwt::build(&texts).unwrap();
        let mut seen = vec![false; bwt.len()];
        for i in 0..bwt.len() {
            let lf = bwt.last_to_first(i);
            assert!(lf < bwt.len());
            assert!(!seen[lf], "last_to_first should be injective");
            seen[lf] = true;
        }
    }
}
