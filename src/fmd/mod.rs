//! Bidirectional FM-index: bi-interval algebra, BWT storage, contig
//! bookkeeping, and the range/mask-aware mapping operations built on top.

mod bwt;
mod contigs;
mod index;
mod position;
mod range;

pub use bwt::{BwtBackend, BwtError, InMemoryBwt};
pub use contigs::{ContigEntry, ContigTable, ContigTableError, Strand, TextPosition};
pub use index::{FMDIndex, IndexError, Mapping, MismatchMapping, RangeMapping};
pub use position::{FMDPosition, PositionError};
pub use range::{GenomeMask, RangeBases, RangeVector, ReferenceBase};
