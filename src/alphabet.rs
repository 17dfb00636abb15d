//! DNA alphabet shared by the BWT, bi-interval, and mapping layers.
//!
//! Base ordering is fixed and alphabetical (`A < C < G < T < N`), matching
//! the on-disk BWT's column order. `extend` (see [`crate::fmd::position`])
//! depends on this order to allocate reverse-strand sub-ranges correctly.

use thiserror::Error;

/// One of the four canonical DNA bases, or the ambiguous `N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Base {
    /// Adenine.
    A,
    /// Cytosine.
    C,
    /// Guanine.
    G,
    /// Thymine.
    T,
    /// Ambiguous base.
    N,
}

/// Fixed alphabetical order of the bases, used to allocate reverse-strand
/// sub-ranges during bidirectional extension.
pub const BASES: [Base; 5] = [Base::A, Base::C, Base::G, Base::T, Base::N];

/// Number of non-sentinel symbols in the alphabet.
pub const ALPHABET_SIZE: usize = BASES.len();

/// Error raised when a byte cannot be interpreted as a base or sentinel.
#[derive(Debug, Error)]
pub enum AlphabetError {
    /// Extension or lookup was attempted with the null byte.
    #[error("cannot extend with the null byte")]
    NullByte,
    /// Character outside `{A, C, G, T, N}` (case-insensitively).
    #[error("character '{0}' is not a DNA base")]
    NotABase(char),
}

impl Base {
    /// Parse an ASCII byte into a [`Base`], accepting lower case.
    pub fn from_ascii(byte: u8) -> Result<Self, AlphabetError> {
        match byte {
            0 => Err(AlphabetError::NullByte),
            b'A' | b'a' => Ok(Base::A),
            b'C' | b'c' => Ok(Base::C),
            b'G' | b'g' => Ok(Base::G),
            b'T' | b't' => Ok(Base::T),
            b'N' | b'n' => Ok(Base::N),
            other => Err(AlphabetError::NotABase(other as char)),
        }
    }

    /// Uppercase ASCII byte for this base.
    pub fn to_ascii(self) -> u8 {
        match self {
            Base::A => b'A',
            Base::C => b'C',
            Base::G => b'G',
            Base::T => b'T',
            Base::N => b'N',
        }
    }

    /// Index into alphabet-ordered tables (`PC`, rank/select counters, ...).
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Base::A => 0,
            Base::C => 1,
            Base::G => 2,
            Base::T => 3,
            Base::N => 4,
        }
    }

    /// Watson-Crick complement. `N` complements to itself.
    pub fn complement(self) -> Base {
        match self {
            Base::A => Base::T,
            Base::T => Base::A,
            Base::C => Base::G,
            Base::G => Base::C,
            Base::N => Base::N,
        }
    }
}

/// The BWT text-terminator sentinel byte, sorted before every base.
pub const SENTINEL: u8 = b'$';

/// Order of a symbol (sentinel or base) in the BWT's `PC` table:
/// `$ < A < C < G < T < N`.
pub fn symbol_order(byte: u8) -> Result<usize, AlphabetError> {
    if byte == SENTINEL {
        Ok(0)
    } else {
        Ok(Base::from_ascii(byte)?.index() + 1)
    }
}

/// Reverse-complement a DNA string (bytes, uppercase `ACGTN`).
///
/// Non-base bytes (e.g. the sentinel) pass through reversed but
/// uncomplemented, since only sequence content should ever appear here.
pub fn reverse_complement(sequence: &[u8]) -> Vec<u8> {
    sequence
        .iter()
        .rev()
        .map(|&b| match Base::from_ascii(b) {
            Ok(base) => base.complement().to_ascii(),
            Err(_) => b,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complement_is_involution() {
        for base in BASES {
            assert_eq!(base.complement().complement(), base);
        }
    }

    #[test]
    fn reverse_complement_round_trips() {
        let seq = b"ACGTACGTNN";
        let rc = reverse_complement(seq);
        let back = reverse_complement(&rc);
        assert_eq!(back, seq);
    }

    #[test]
    fn order_is_alphabetical_with_sentinel_first() {
        let mut orders: Vec<usize> = vec![symbol_order(SENTINEL).unwrap()];
        orders.extend(BASES.iter().map(|b| symbol_order(b.to_ascii()).unwrap()));
        let mut sorted = orders.clone();
        sorted.sort_unstable();
        assert_eq!(orders, sorted);
    }
}
