//! Driver: spawns one worker thread per contig of the target genome and
//! owns their join handles.
//!
//! Grounded on `MappingMergeScheme::run`/`join` and its destructor: `run`
//! refuses to be called twice (the source throws if its queue pointer is
//! already set), and the destructor joins every worker thread so a dropped
//! driver never leaks them.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use thiserror::Error;
use tracing::info_span;

use crate::fmd::{ContigTableError, FMDIndex, RangeBases};
use crate::merge::config::MergeConfig;
use crate::merge::generator::{self, GeneratorError};
use crate::merge::queue::MergeQueue;

/// Errors raised while starting a merge run.
#[derive(Debug, Error)]
pub enum DriverError {
    /// `run` was called a second time on the same driver.
    #[error("run() was already called on this driver")]
    RunCalledTwice,
    /// The configured genome id was not in the index's contig table.
    #[error(transparent)]
    Contig(#[from] ContigTableError),
}

/// A handle to a running merge-generation pass: wraps the shared queue the
/// caller should drain with a [`crate::merge::applier::MergeApplier`].
pub struct MergeReceiver {
    queue: Arc<MergeQueue>,
}

impl MergeReceiver {
    /// The underlying queue.
    pub fn queue(&self) -> &MergeQueue {
        &self.queue
    }
}

/// Spawns and owns the per-contig merge-generator worker threads.
#[derive(Default)]
pub struct MergeDriver {
    handles: Vec<JoinHandle<()>>,
    started: bool,
}

impl MergeDriver {
    /// A driver with no workers started yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start one worker thread per contig of `config.genome`, each mapping
    /// that contig against `index`'s ranges and enqueueing merges. Returns
    /// a [`MergeReceiver`] the caller hands to a
    /// [`crate::merge::applier::MergeApplier`].
    pub fn run(
        &mut self,
        config: MergeConfig,
        index: Arc<FMDIndex>,
        range_bases: Arc<RangeBases>,
    ) -> Result<MergeReceiver, DriverError> {
        if self.started {
            return Err(DriverError::RunCalledTwice);
        }
        self.started = true;

        let contigs: Vec<usize> = index.contigs().genome_contigs(config.genome)?.collect();
        let queue = Arc::new(MergeQueue::new(contigs.len()));

        for contig in contigs {
            let index = index.clone();
            let range_bases = range_bases.clone();
            let queue = queue.clone();
            let config = config.clone();
            let handle = thread::spawn(move || {
                let span = info_span!("merge_worker", contig);
                let _enter = span.enter();
                if let Err(err) = generator::run_for_contig(&index, &range_bases, &queue, contig, &config) {
                    log_generator_error(contig, &err);
                }
            });
            self.handles.push(handle);
        }

        Ok(MergeReceiver { queue })
    }
}

fn log_generator_error(contig: usize, err: &GeneratorError) {
    tracing::error!(contig, error = %err, "merge worker failed");
}

impl Drop for MergeDriver {
    fn drop(&mut self) {
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}
