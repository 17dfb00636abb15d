//! Merge applier: the single consumer thread draining the merge queue into
//! an external pinch-graph collaborator.
//!
//! Grounded on `createIndex/MergeApplier.cpp`: a dedicated thread loops on
//! `waitForNonemptyOrEnd`/`isEmpty`/`dequeue`, decomposing each merge into
//! its two `TextPosition`s and an orientation flag before handing it to the
//! pinch graph.

use thiserror::Error;
use tracing::{trace, warn};

use crate::fmd::TextPosition;
use crate::merge::queue::MergeQueue;

/// Errors raised while applying merges.
#[derive(Debug, Error)]
pub enum ApplierError {
    /// A non-reversible merge arrived but the sink cannot undo a prior
    /// pinch, which is the only way to correctly represent it. The
    /// original source leaves this reconstruction unimplemented
    /// (`//TODO: implement pop operation for blocks`); rather than attempt
    /// it half-finished, this crate refuses the mode outright.
    #[error("sink does not support unpinch, required to apply a non-reversible merge")]
    UnpinchUnsupported,
}

/// The external collaborator that actually builds the pinch graph. This
/// crate only defines the boundary; constructing a pinch graph is out of
/// scope (`spec.md` §1).
pub trait PinchSink: Send + Sync {
    /// Merge `first` and `second`; `same_orientation` is `true` when they
    /// are on the same strand.
    fn pinch(&self, first: TextPosition, second: TextPosition, same_orientation: bool);

    /// Whether this sink can undo ("unpinch") a previously applied merge.
    /// Sinks that cannot should leave this `false` (the default); the
    /// applier then refuses non-reversible merges instead of guessing.
    fn supports_unpinch(&self) -> bool {
        false
    }
}

/// Drains a [`MergeQueue`] into a [`PinchSink`] until every producer has
/// closed and the queue is empty.
pub struct MergeApplier<S: PinchSink> {
    sink: S,
}

impl<S: PinchSink> MergeApplier<S> {
    /// Wrap a sink in an applier.
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    /// Run the consumer loop to completion, returning the number of merges
    /// applied.
    pub fn run(&self, queue: &MergeQueue) -> Result<usize, ApplierError> {
        let mut applied = 0usize;
        loop {
            let mut guard = queue.wait_for_nonempty_or_end();
            if queue.is_empty(&guard) {
                break;
            }
            let merge = match queue.dequeue(&mut guard) {
                Some(m) => m,
                None => continue,
            };
            drop(guard);

            if merge.non_reversible && !self.sink.supports_unpinch() {
                warn!(?merge, "refusing non-reversible merge: sink has no unpinch");
                return Err(ApplierError::UnpinchUnsupported);
            }

            trace!(?merge, "applying merge");
            self.sink
                .pinch(merge.query, merge.reference, merge.same_orientation());
            applied += 1;
        }
        Ok(applied)
    }
}
