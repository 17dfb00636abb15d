//! [`FMDIndex`]: the queryable bidirectional FM-index assembled from a
//! [`BwtBackend`], contig metadata, and the optional genome mask / range
//! vector used by range-aware mapping.
//!
//! Grounded on `libFMD/FMDIndex.cpp`'s public query surface: `count`,
//! `locate`, `display`/`displayFirst`/`displayContig`, the one-sided
//! `map`/`mapPosition` pair, the range-projecting `map`/`mapPosition`
//! overloads, the two-sided `Cmap`/`CmapPosition` pair, and the
//! mismatch-tolerant `misMatchMap` family.

use thiserror::Error;
use tracing::{debug, trace};

use crate::alphabet::{AlphabetError, Base, BASES};
use crate::fmd::bwt::BwtBackend;
use crate::fmd::contigs::{ContigTable, ContigTableError, TextPosition};
use crate::fmd::position::{FMDPosition, PositionError};
use crate::fmd::range::{GenomeMask, RangeVector};

/// Errors raised while querying an [`FMDIndex`].
#[derive(Debug, Error)]
pub enum IndexError {
    /// A query byte was not a valid base or sentinel.
    #[error(transparent)]
    Alphabet(#[from] AlphabetError),
    /// An interval extension failed at the `BwtBackend` layer.
    #[error(transparent)]
    Position(#[from] PositionError),
    /// A contig/genome identifier was invalid.
    #[error(transparent)]
    Contig(#[from] ContigTableError),
    /// A range-aware query was made on an index with no [`RangeVector`].
    #[error("this operation requires a range vector, but the index has none")]
    RangesRequired,
    /// `map_both`'s forward and reverse-complement mapping passes produced
    /// different numbers of positions (should be impossible for a
    /// well-formed query, but is checked rather than assumed).
    #[error("forward mapping produced {forward} positions but reverse-complement mapping produced {reverse}")]
    ForwardReverseSizeMismatch {
        /// Length of the forward-pass mapping.
        forward: usize,
        /// Length of the reverse-complement-pass mapping.
        reverse: usize,
    },
    /// A mismatch-tolerant extension was attempted on an already-empty
    /// extension set.
    #[error("cannot extend an already-empty mismatch extension set")]
    EmptyExtensionSet,
}

/// The result of mapping one query position to a unique text location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mapping {
    /// The unique text position this query position mapped to, if any.
    pub position: Option<TextPosition>,
}

impl Mapping {
    /// A mapping that failed to resolve to a unique position.
    pub fn unmapped() -> Self {
        Self { position: None }
    }

    /// A mapping that resolved to `position`.
    pub fn mapped(position: TextPosition) -> Self {
        Self {
            position: Some(position),
        }
    }

    /// Whether this query position mapped uniquely.
    pub fn is_mapped(&self) -> bool {
        self.position.is_some()
    }
}

/// The result of mapping one query position into a single merge-target
/// range, together with the context length used (`characters`) and the
/// longest context that was ever unambiguous (`max_characters`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeMapping {
    /// The unique range this position mapped to, if any.
    pub range: Option<usize>,
    /// Context length actually used to decide the mapping.
    pub characters: usize,
    /// Longest context length for which the interval stayed non-empty.
    pub max_characters: usize,
}

/// The result of mismatch-tolerant mapping at one query position.
#[derive(Debug, Clone)]
pub struct MismatchMapping {
    /// The unique range this position mapped to, if any.
    pub range: Option<usize>,
    /// Number of mismatches tolerated in the winning alignment.
    pub mismatches: u32,
    /// Context length used.
    pub characters: usize,
}

#[derive(Debug, Clone)]
struct MisMatchState {
    positions: Vec<(FMDPosition, u32)>,
    characters: usize,
    max_characters: usize,
}

impl MisMatchState {
    fn front_is_empty(&self) -> bool {
        self.positions.first().map(|(p, _)| p.is_empty()).unwrap_or(true)
    }
}

/// A bidirectional FM-index: BWT backend plus contig/range metadata.
pub struct FMDIndex {
    bwt: Box<dyn BwtBackend>,
    contigs: ContigTable,
    mask: Option<GenomeMask>,
    ranges: Option<RangeVector>,
}

impl FMDIndex {
    /// Assemble an index from its backend and metadata.
    pub fn new(
        bwt: Box<dyn BwtBackend>,
        contigs: ContigTable,
        mask: Option<GenomeMask>,
        ranges: Option<RangeVector>,
    ) -> Self {
        Self {
            bwt,
            contigs,
            mask,
            ranges,
        }
    }

    /// The contig/genome metadata table.
    pub fn contigs(&self) -> &ContigTable {
        &self.contigs
    }

    fn mask(&self) -> Option<&GenomeMask> {
        self.mask.as_ref()
    }

    fn ranges(&self) -> Option<&RangeVector> {
        self.ranges.as_ref()
    }

    /// The bi-interval covering exactly the rows whose `L`-column symbol is
    /// `c` (`getCharPosition`).
    fn char_position(&self, c: Base) -> Result<FMDPosition, IndexError> {
        let byte = c.to_ascii();
        let forward_start = self.bwt.pc(byte)?;
        let reverse_start = self.bwt.pc(c.complement().to_ascii())?;
        let total = self.bwt.occ(byte, self.bwt.len())?;
        Ok(FMDPosition::new(forward_start, reverse_start, total as i64 - 1))
    }

    /// Count occurrences of `pattern` (empty pattern covers the whole BWT).
    pub fn count(&self, pattern: &[u8]) -> Result<FMDPosition, IndexError> {
        if pattern.is_empty() {
            return Ok(FMDPosition::covering(self.bwt.len()));
        }
        let mut bases = pattern
            .iter()
            .map(|&b| Base::from_ascii(b))
            .collect::<Result<Vec<_>, _>>()?;
        let last = bases.pop().expect("non-empty");
        let mut position = self.char_position(last)?;
        while let Some(base) = bases.pop() {
            if position.is_empty() {
                break;
            }
            position = position.extend(&*self.bwt, base, true)?;
        }
        Ok(position)
    }

    /// The BWT row's origin `(text, offset)`.
    pub fn locate(&self, bwt_index: usize) -> TextPosition {
        self.bwt.locate(bwt_index)
    }

    /// The `L`-column symbol at `bwt_index`.
    pub fn display(&self, bwt_index: usize) -> u8 {
        self.bwt.char_at(bwt_index)
    }

    /// The `F`-column symbol at `bwt_index`.
    pub fn display_first(&self, bwt_index: usize) -> u8 {
        self.bwt.first_at(bwt_index)
    }

    /// LF-mapping at `bwt_index`.
    pub fn get_lf(&self, bwt_index: usize) -> usize {
        self.bwt.last_to_first(bwt_index)
    }

    /// Reconstruct the full sequence of `text` by walking `get_lf`
    /// backward from its contig-end row.
    pub fn display_contig(&self, text: usize, length: usize) -> Vec<u8> {
        let mut bwt_index = self.bwt.contig_end_index(text);
        let mut bases = Vec::with_capacity(length);
        for _ in 0..length {
            bases.push(self.display(bwt_index));
            bwt_index = self.get_lf(bwt_index);
        }
        bases.reverse();
        bases
    }

    fn map_position(&self, query: &[u8], index: usize) -> Result<(FMDPosition, usize, bool), IndexError> {
        let c = Base::from_ascii(query[index])?;
        let mut position = self.char_position(c)?;
        if position.is_empty() {
            return Ok((position, 1, false));
        }
        if position.length() == 1 {
            return Ok((position, 1, true));
        }
        if index == 0 {
            return Ok((position, 1, false));
        }

        let mut characters = 1;
        let mut idx = index;
        while idx > 0 {
            idx -= 1;
            let prev_base = Base::from_ascii(query[idx])?;
            let extended = position.extend(&*self.bwt, prev_base, true)?;
            if extended.is_empty() {
                return Ok((position, characters, false));
            }
            position = extended;
            characters += 1;
            if position.length() == 1 {
                return Ok((position, characters, true));
            }
        }
        Ok((position, characters, false))
    }

    /// One-sided right-extension context map: for each query position,
    /// the unique text location whose left context (within the query)
    /// uniquely determines it, if any, requiring at least `min_context`
    /// matching bases.
    pub fn map(&self, query: &[u8], min_context: usize) -> Result<Vec<Mapping>, IndexError> {
        let mask = self.mask();
        let mut mappings = Vec::with_capacity(query.len());
        let mut position = FMDPosition::empty();
        let mut characters = 0usize;
        let mut is_mapped = false;

        for i in 0..query.len() {
            let c = Base::from_ascii(query[i])?;
            if position.is_empty_under(mask) {
                let (p, chars, mapped) = self.map_position(query, i)?;
                position = p;
                characters = chars;
                is_mapped = mapped;
            } else {
                position = position.extend(&*self.bwt, c, false)?;
                characters += 1;
            }

            let success = is_mapped && characters >= min_context && position.masked_length(mask) == 1;
            if success {
                let row = match mask {
                    Some(m) => m.value_after(position.forward_start()).0,
                    None => position.forward_start(),
                };
                let text_position = self.bwt.locate(row).shifted(characters - 1);
                trace!(query_index = i, ?text_position, "mapped position");
                mappings.push(Mapping::mapped(text_position));
            } else {
                mappings.push(Mapping::unmapped());
            }
        }
        debug!(mapped = mappings.iter().filter(|m| m.is_mapped()).count(), total = mappings.len(), "one-sided map complete");
        Ok(mappings)
    }

    /// Restart helper for [`map_to_range`](Self::map_to_range): like
    /// [`map_position`](Self::map_position), but the termination test is
    /// "falls in a single range" rather than "interval has length 1", and
    /// it is always scanned toward index `0` regardless of which direction
    /// the caller's outer loop is walking — backward extension always
    /// prepends earlier (smaller-index) characters.
    fn map_position_to_range(
        &self,
        query: &[u8],
        index: usize,
    ) -> Result<(FMDPosition, usize, bool), IndexError> {
        let ranges = self.ranges().ok_or(IndexError::RangesRequired)?;
        let c = Base::from_ascii(query[index])?;
        let mut position = self.char_position(c)?;
        if position.is_empty() {
            return Ok((position, 1, false));
        }
        if position.range(ranges, self.mask()).is_some() {
            return Ok((position, 1, true));
        }
        if index == 0 {
            return Ok((position, 1, false));
        }

        let mut characters = 1;
        let mut idx = index;
        while idx > 0 {
            idx -= 1;
            let prev_base = Base::from_ascii(query[idx])?;
            let extended = position.extend(&*self.bwt, prev_base, true)?;
            if extended.is_empty() {
                return Ok((position, characters, false));
            }
            position = extended;
            characters += 1;
            if position.range(ranges, self.mask()).is_some() {
                return Ok((position, characters, true));
            }
        }
        Ok((position, characters, false))
    }

    /// Right-mapping to ranges: scan the query right to left,
    /// backward-extending the bi-interval with each new (leftward)
    /// character, re-seeding via [`map_position_to_range`](Self::map_position_to_range)
    /// whenever the running interval empties out. The result vector is
    /// built back-to-front and reversed at the end so it parallels the
    /// query, matching §4.4's "right-mapping to ranges" procedure. Used by
    /// the merge generator when mapping against a reference's range
    /// partitioning rather than locating individual text positions.
    pub fn map_to_range(&self, query: &[u8], min_context: usize) -> Result<Vec<RangeMapping>, IndexError> {
        let ranges = self.ranges().ok_or(IndexError::RangesRequired)?;
        let mask = self.mask();
        let mut out = Vec::with_capacity(query.len());
        let mut position = FMDPosition::empty();
        let mut characters = 0usize;
        let mut is_mapped = false;

        let mut i = query.len();
        while i > 0 {
            i -= 1;
            let c = Base::from_ascii(query[i])?;
            if position.is_empty_under(mask) {
                let (p, chars, mapped) = self.map_position_to_range(query, i)?;
                position = p;
                characters = chars;
                is_mapped = mapped;
            } else {
                position = position.extend(&*self.bwt, c, true)?;
                characters += 1;
            }

            let range = if is_mapped && characters >= min_context {
                position.range(ranges, mask)
            } else {
                None
            };
            out.push(RangeMapping {
                range,
                characters: characters.saturating_sub(1),
                max_characters: characters,
            });
        }
        out.reverse();
        Ok(out)
    }

    fn cmap_position(&self, query: &[u8], index: usize) -> Result<(FMDPosition, usize, usize, bool), IndexError> {
        let ranges = self.ranges().ok_or(IndexError::RangesRequired)?;
        let c = Base::from_ascii(query[index])?;
        let mut position = self.char_position(c)?;
        let mut characters = 1usize;
        let mut max_characters = 1usize;
        if position.is_empty() {
            return Ok((position, characters, max_characters, false));
        }

        let mut is_mapped = position.range(ranges, self.mask()).is_some();
        let mut found_position = position;
        let mut i = 1usize;
        while index + i < query.len() && index >= i {
            let right = Base::from_ascii(query[index + i])?;
            let left = Base::from_ascii(query[index - i])?;
            let next = position
                .extend(&*self.bwt, right, false)?
                .extend(&*self.bwt, left, true)?;
            if next.is_empty() {
                characters = max_characters;
                break;
            }
            position = next;
            max_characters += 1;
            let in_range = position.range(ranges, self.mask()).is_some();
            if !is_mapped && in_range {
                is_mapped = true;
                characters = max_characters;
                found_position = position;
            } else if is_mapped && in_range {
                // keep extending; characters stays at the first unique hit
            } else {
                characters = max_characters;
            }
            i += 1;
        }
        if is_mapped {
            position = found_position;
        }
        Ok((position, characters, max_characters, is_mapped))
    }

    /// Two-sided "credit" map: extends both left and right of each query
    /// position simultaneously, reporting both the context actually needed
    /// (`characters`) and the longest unambiguous context seen
    /// (`max_characters`), clamped up to `min_context` when a longer
    /// unambiguous context exists.
    pub fn cmap(&self, query: &[u8], min_context: usize) -> Result<Vec<RangeMapping>, IndexError> {
        let ranges = self.ranges().ok_or(IndexError::RangesRequired)?;
        let mut out = vec![
            RangeMapping {
                range: None,
                characters: 0,
                max_characters: 0
            };
            query.len()
        ];

        let mut position = FMDPosition::empty();
        let mut characters = 0usize;
        let mut max_characters = 0usize;
        let mut is_mapped = false;

        let mut i = query.len();
        while i > 0 {
            i -= 1;
            if position.is_empty() || i < characters {
                let (p, c, mc, mapped) = self.cmap_position(query, i)?;
                position = p;
                characters = c;
                max_characters = mc;
                is_mapped = mapped;
            }

            if characters < min_context && max_characters >= min_context {
                characters = min_context;
            }

            let success = is_mapped && characters >= min_context && !position.is_empty();
            let range = if success {
                position.range(ranges, self.mask())
            } else {
                None
            };
            out[i] = RangeMapping {
                range,
                characters,
                max_characters,
            };
        }
        Ok(out)
    }

    fn mismatch_extend(
        &self,
        prev: &MisMatchState,
        c: Base,
        backward: bool,
        z_max: u32,
        start_extension: bool,
        finish_extension: bool,
    ) -> Result<MisMatchState, IndexError> {
        if prev.front_is_empty() {
            return Err(IndexError::EmptyExtensionSet);
        }

        let mut positions = Vec::new();
        for &(position, z) in &prev.positions {
            if start_extension {
                let next = position.extend(&*self.bwt, c, backward)?;
                if !next.is_empty() {
                    positions.push((next, z));
                }
                continue;
            }
            if !finish_extension {
                let next = position.extend(&*self.bwt, c, backward)?;
                if !next.is_empty() {
                    positions.push((next, z));
                }
            }
            if z < z_max {
                for &base in &BASES {
                    if base == c {
                        continue;
                    }
                    let next = position.extend(&*self.bwt, base, backward)?;
                    if !next.is_empty() {
                        positions.push((next, z + 1));
                    }
                }
            }
        }

        if positions.is_empty() {
            positions.push((FMDPosition::empty(), 0));
        }

        Ok(MisMatchState {
            positions,
            characters: prev.characters,
            max_characters: prev.max_characters,
        })
    }

    fn mismatch_map_position(
        &self,
        query: &[u8],
        index: usize,
        min_context: usize,
        z_max: u32,
    ) -> Result<(MisMatchState, bool), IndexError> {
        let ranges = self.ranges().ok_or(IndexError::RangesRequired)?;
        let c = Base::from_ascii(query[index])?;
        let start = self.char_position(c)?;
        let mut state = MisMatchState {
            positions: vec![(start, 0)],
            characters: 1,
            max_characters: 1,
        };
        if start.is_empty() {
            return Ok((state, true));
        }
        if start.range(ranges, self.mask()).is_some() {
            return Ok((state, true));
        }

        let mut is_mapped = false;
        let mut found_positions = state.positions.clone();
        let mut idx = index;
        while idx + 1 < query.len() {
            idx += 1;
            let next_base = Base::from_ascii(query[idx])?;
            let new_state = self.mismatch_extend(&state, next_base, false, z_max, false, false)?;

            if new_state.front_is_empty() {
                if state.positions.len() == 1 && state.characters >= min_context {
                    return Ok((
                        MisMatchState {
                            positions: state.positions,
                            characters: state.max_characters,
                            max_characters: state.max_characters,
                        },
                        true,
                    ));
                }
                let empty = MisMatchState {
                    positions: vec![(FMDPosition::empty(), 0)],
                    characters: 1,
                    max_characters: 1,
                };
                return Ok((empty, false));
            }

            let unique_in_range = new_state.positions.len() == 1
                && new_state.positions[0].0.range(ranges, self.mask()).is_some();

            if !is_mapped && unique_in_range {
                state = MisMatchState {
                    positions: new_state.positions,
                    characters: state.characters + 1,
                    max_characters: state.max_characters + 1,
                };
                is_mapped = true;
                found_positions = state.positions.clone();
            } else if is_mapped && unique_in_range {
                state = MisMatchState {
                    positions: new_state.positions,
                    characters: state.characters,
                    max_characters: state.max_characters + 1,
                };
            } else {
                state = MisMatchState {
                    positions: new_state.positions,
                    characters: state.characters + 1,
                    max_characters: state.max_characters + 1,
                };
            }
        }

        if is_mapped {
            state.positions = found_positions;
            Ok((state, true))
        } else {
            let empty = MisMatchState {
                positions: vec![(FMDPosition::empty(), 0)],
                characters: 1,
                max_characters: 1,
            };
            Ok((empty, false))
        }
    }

    /// Mismatch-tolerant one-sided map: like [`map_to_range`](Self::map_to_range)
    /// but each query position may carry up to `z_max` mismatches against
    /// the reference, tracked per surviving candidate interval.
    pub fn mismatch_map(
        &self,
        query: &[u8],
        min_context: usize,
        z_max: u32,
    ) -> Result<Vec<MismatchMapping>, IndexError> {
        let ranges = self.ranges().ok_or(IndexError::RangesRequired)?;
        let mut out = Vec::with_capacity(query.len());
        let mut state = MisMatchState {
            positions: vec![(FMDPosition::empty(), 0)],
            characters: 0,
            max_characters: 0,
        };
        let mut is_mapped = false;

        for i in 0..query.len() {
            if state.front_is_empty() {
                let (s, mapped) = self.mismatch_map_position(query, i, min_context, z_max)?;
                state = s;
                is_mapped = mapped;
            } else {
                let c = Base::from_ascii(query[i])?;
                state = self.mismatch_extend(&state, c, false, z_max, false, false)?;
                state.characters += 1;
                state.max_characters += 1;
            }

            let unique = state.positions.len() == 1 && !state.front_is_empty();
            if is_mapped && unique && state.characters >= min_context {
                let (position, mismatches) = state.positions[0];
                let range = position.range(ranges, self.mask());
                out.push(MismatchMapping {
                    range,
                    mismatches,
                    characters: state.characters,
                });
            } else {
                out.push(MismatchMapping {
                    range: None,
                    mismatches: 0,
                    characters: 0,
                });
            }
        }
        Ok(out)
    }

    /// Reconcile a left-context [`Mapping`] and a right-context [`Mapping`]
    /// for the same query position into a single verdict: they must name
    /// the same text position (after flipping the right mapping's strand)
    /// to be trusted; otherwise the position is reported unmapped.
    pub fn disambiguate(&self, left: &Mapping, right: &Mapping) -> Result<Mapping, IndexError> {
        match (left.position, right.position) {
            (Some(l), Some(r)) => {
                let contig_length = self.contigs.contig_length(r.contig())?;
                let flipped_text = r.text() ^ 1;
                let flipped_offset = contig_length - r.offset() - 1;
                if l.text() == flipped_text && l.offset() == flipped_offset {
                    Ok(Mapping::mapped(l))
                } else {
                    Ok(Mapping::unmapped())
                }
            }
            (Some(l), None) => Ok(Mapping::mapped(l)),
            (None, Some(r)) => Ok(Mapping::mapped(r)),
            (None, None) => Ok(Mapping::unmapped()),
        }
    }

    /// Map `query` in both directions (forward, and via its
    /// reverse complement) and disambiguate each position, matching
    /// `FMDIndex::mapBoth`.
    pub fn map_both(&self, query: &[u8], min_context: usize) -> Result<Vec<Mapping>, IndexError> {
        let forward = self.map(query, min_context)?;
        let rc = crate::alphabet::reverse_complement(query);
        let mut reverse = self.map(&rc, min_context)?;
        reverse.reverse();

        if forward.len() != reverse.len() {
            return Err(IndexError::ForwardReverseSizeMismatch {
                forward: forward.len(),
                reverse: reverse.len(),
            });
        }

        forward
            .iter()
            .zip(reverse.iter())
            .map(|(l, r)| self.disambiguate(l, r))
            .collect()
    }
}
