//! Tabular coverage of the DNA alphabet's fixed encoding (spec §4.1's
//! alphabetical `$ < A < C < G < T < N` ordering) via `test-case`.

use fmd_merge_mapper::alphabet::{symbol_order, Base, SENTINEL};
use test_case::test_case;

#[test_case(b'A', Base::A, Base::T, 0)]
#[test_case(b'C', Base::C, Base::G, 1)]
#[test_case(b'G', Base::G, Base::C, 2)]
#[test_case(b'T', Base::T, Base::A, 3)]
#[test_case(b'N', Base::N, Base::N, 4)]
fn base_table(ascii: u8, parsed: Base, complement: Base, index: usize) {
    let base = Base::from_ascii(ascii).unwrap();
    assert_eq!(base, parsed);
    assert_eq!(base.complement(), complement);
    assert_eq!(base.index(), index);
    assert_eq!(base.to_ascii(), ascii);
}

#[test_case(b'a', Base::A)]
#[test_case(b'c', Base::C)]
#[test_case(b'g', Base::G)]
#[test_case(b't', Base::T)]
#[test_case(b'n', Base::N)]
fn lowercase_bases_parse_the_same_as_uppercase(ascii: u8, expected: Base) {
    assert_eq!(Base::from_ascii(ascii).unwrap(), expected);
}

#[test_case(SENTINEL, 0)]
#[test_case(b'A', 1)]
#[test_case(b'C', 2)]
#[test_case(b'G', 3)]
#[test_case(b'T', 4)]
#[test_case(b'N', 5)]
fn symbol_order_places_the_sentinel_before_every_base(byte: u8, expected: usize) {
    assert_eq!(symbol_order(byte).unwrap(), expected);
}

#[test_case(b'X')]
#[test_case(b'Z')]
#[test_case(0)]
fn non_bases_are_rejected(byte: u8) {
    assert!(Base::from_ascii(byte).is_err());
}
