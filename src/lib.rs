//! # Bidirectional FM-index merge mapper
//!
//! This library provides a bidirectional (FMD) FM-index over a collection
//! of DNA contigs and a concurrent merge-mapping pipeline that aligns one
//! genome's contigs against another's, producing the pinch instructions a
//! pangenome graph builder needs to stitch them together.
//!
//! ## Core pieces
//!
//! 1. **[`bitvector`]**: succinct rank/select bit-vectors underlying both
//!    the genome mask and the range vector.
//! 2. **[`fmd`]**: the bidirectional BWT interval algebra (`FMDPosition`),
//!    the BWT storage boundary (`BwtBackend`), and the queryable index
//!    (`FMDIndex`) with its one-sided, two-sided, and mismatch-tolerant
//!    mapping operations.
//! 3. **[`merge`]**: per-contig merge generation, the concurrent queue
//!    connecting producer threads to one consumer, the consumer
//!    (`MergeApplier`) applying merges to an external `PinchSink`, and the
//!    `MergeDriver` that wires a whole run together.
//!
//! ## Usage Example
//!
//! ```ignore
//! use fmd_merge_mapper::fmd::{FMDIndex, InMemoryBwt, ContigTable};
//! use fmd_merge_mapper::merge::{MergeConfig, MergeDriver, MergeApplier};
//!
//! let index = Arc::new(FMDIndex::new(bwt, contigs, mask, ranges));
//! let mut driver = MergeDriver::new();
//! let receiver = driver.run(config, index, range_bases)?;
//! let applier = MergeApplier::new(sink);
//! applier.run(receiver.queue())?;
//! ```

#![warn(missing_docs, missing_debug_implementations)]

pub mod alphabet;
pub mod bitvector;
pub mod fmd;
pub mod io;
pub mod merge;

pub use alphabet::{Base, AlphabetError};
pub use bitvector::{BitVector, BitVectorBuilder, BitVectorError};
pub use fmd::{BwtBackend, FMDIndex, FMDPosition, InMemoryBwt};
pub use merge::{MergeApplier, MergeConfig, MergeDriver, PinchSink};
