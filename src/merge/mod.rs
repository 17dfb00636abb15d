//! Merge pipeline: per-contig merge generation, the concurrent queue
//! connecting producers to the consumer, the consumer itself, and the
//! driver that wires them together.

mod applier;
mod config;
mod driver;
mod generator;
mod queue;

pub use applier::{ApplierError, MergeApplier, PinchSink};
pub use config::MergeConfig;
pub use driver::{DriverError, MergeDriver, MergeReceiver};
pub use generator::GeneratorError;
pub use queue::{Merge, MergeQueue, QueueState};
