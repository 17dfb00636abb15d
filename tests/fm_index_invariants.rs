//! Property tests for the bi-interval extension algebra (spec §8, invariants 1-3).

use fmd_merge_mapper::alphabet::{reverse_complement, Base, BASES};
use fmd_merge_mapper::fmd::{BwtBackend, ContigEntry, ContigTable, FMDIndex, FMDPosition, InMemoryBwt};
use proptest::prelude::*;

fn single_contig_index(seq: &[u8]) -> FMDIndex {
    let rc = reverse_complement(seq);
    let texts = vec![seq.to_vec(), rc];
    let bwt = InMemoryBwt::build(&texts).expect("valid sequence builds");
    let contigs = ContigTable::new(
        vec![ContigEntry {
            name: "contig0".into(),
            length: seq.len(),
        }],
        vec![1],
    );
    FMDIndex::new(Box::new(bwt), contigs, None, None)
}

fn dna_sequence() -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(prop_oneof![Just(b'A'), Just(b'C'), Just(b'G'), Just(b'T')], 4..24)
}

proptest! {
    #[test]
    fn extend_never_grows_the_interval(seq in dna_sequence(), pattern_len in 1usize..3) {
        let index = single_contig_index(&seq);
        let pattern = &seq[..pattern_len.min(seq.len())];
        let start = index.count(pattern).expect("pattern is present in its own source");

        for &base in &BASES {
            let extended = start
                .extend(&backend(&index), base, true)
                .expect("extension over a valid base succeeds");
            prop_assert!(extended.length() <= start.length());
        }
    }

    #[test]
    fn flip_is_an_involution(seq in dna_sequence()) {
        let index = single_contig_index(&seq);
        let position = index.count(&seq[..1]).unwrap();
        prop_assert_eq!(position.flip().flip(), position);
    }

    #[test]
    fn backward_extension_equals_flipped_forward_extension(seq in dna_sequence()) {
        let index = single_contig_index(&seq);
        let position = index.count(&seq[..1]).unwrap();

        for &base in &BASES {
            let direct = position.extend(&backend(&index), base, true).unwrap();
            let via_flip = position
                .flip()
                .extend(&backend(&index), base.complement(), false)
                .unwrap()
                .flip();
            prop_assert_eq!(direct, via_flip);
        }
    }
}

/// `count` only ever uses backward extension (`extend(..., true)`), so it is
/// an independent ground truth for forward extension's bucket allocation:
/// extending the interval for `pattern` forward by `base` must have the
/// same length as counting `pattern` with `base` appended.
#[test]
fn forward_extension_length_matches_backward_count_of_the_longer_pattern() {
    let seq = b"ACGTACGTACGT".to_vec();
    let index = single_contig_index(&seq);
    let bwt = backend(&index);

    for pattern_len in 1..seq.len() {
        let pattern = &seq[..pattern_len];
        let position = index.count(pattern).unwrap();
        for &base in &BASES {
            let mut extended_pattern = pattern.to_vec();
            extended_pattern.push(base.to_ascii());
            let expected = index.count(&extended_pattern).unwrap();
            let forward = position.extend(&bwt, base, false).unwrap();
            assert_eq!(
                forward.length(),
                expected.length(),
                "forward-extending {:?} with {:?} should match count({:?})",
                String::from_utf8_lossy(pattern),
                base,
                String::from_utf8_lossy(&extended_pattern)
            );
        }
    }
}

#[test]
fn last_to_first_reconstructs_the_forward_strand() {
    let seq = b"GATTACA".to_vec();
    let index = single_contig_index(&seq);
    let reconstructed = index.display_contig(0, seq.len());
    assert_eq!(reconstructed, seq);
}

#[test]
fn empty_pattern_covers_the_whole_bwt() {
    let seq = b"ACGTACGT".to_vec();
    let index = single_contig_index(&seq);
    let covering = index.count(&[]).unwrap();
    assert_eq!(covering.forward_start(), 0);
    assert_eq!(covering.reverse_start(), 0);
    assert_eq!(covering.length(), (seq.len() + 1) * 2);
}

/// Borrow the index's backend through `count`/`extend`'s own public seam:
/// `FMDIndex` keeps its `Box<dyn BwtBackend>` private, so tests that need a
/// `&dyn BwtBackend` build a throwaway one over the same sequence instead of
/// reaching into `FMDIndex`'s internals.
fn backend(index: &FMDIndex) -> Box<dyn BwtBackend> {
    let length = index.contigs().contig_length(0).unwrap();
    let seq = index.display_contig(0, length);
    let rc = reverse_complement(&seq);
    Box::new(InMemoryBwt::build(&[seq, rc]).unwrap())
}
