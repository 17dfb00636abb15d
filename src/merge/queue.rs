//! Concurrent merge queue: a `Mutex` + `Condvar` MPMC queue with an
//! explicit writer-count close protocol.
//!
//! Grounded on `createIndex/Merge.hpp`'s `ConcurrentQueue<Merge>`, used by
//! `MappingMergeScheme` (producers) and `MergeApplier` (the one consumer).
//! `std::sync::mpsc` is deliberately not used here: `is_empty` must be able
//! to answer "no items *and* no writers left" atomically under one lock,
//! which a channel's receiver does not expose directly.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard};

use crate::fmd::{Strand, TextPosition};

/// One pinch instruction: merge `query` and `reference`, tagged
/// non-reversible if the two sides disagreed on orientation when it was
/// generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Merge {
    /// Position on the query contig being merged.
    pub query: TextPosition,
    /// Position on the reference contig it merges into.
    pub reference: TextPosition,
    /// Whether this merge was generated from a one-sided (ambiguous) match
    /// rather than a full two-sided agreement.
    pub non_reversible: bool,
}

impl Merge {
    /// Whether `query` and `reference` are on the same strand, the
    /// orientation flag `MergeApplier::run` passes to the pinch call.
    pub fn same_orientation(&self) -> bool {
        self.query.strand() == self.reference.strand()
    }
}

/// Internal queue state guarded by [`MergeQueue`]'s mutex.
pub struct QueueState {
    items: VecDeque<Merge>,
    writers: usize,
}

impl QueueState {
    /// Number of merges currently buffered.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the queue currently holds no merges.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of producer threads that have not yet called `close`.
    pub fn open_writers(&self) -> usize {
        self.writers
    }
}

/// A multi-producer, single-consumer queue of [`Merge`]s with a
/// writer-count based close protocol: the queue is considered drained only
/// once it is empty *and* every registered writer has closed.
pub struct MergeQueue {
    state: Mutex<QueueState>,
    condvar: Condvar,
}

impl MergeQueue {
    /// Create a queue expecting `writer_count` producers to each call
    /// [`close`](Self::close) exactly once when done.
    pub fn new(writer_count: usize) -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                writers: writer_count,
            }),
            condvar: Condvar::new(),
        }
    }

    /// Acquire the queue's lock without otherwise touching its state.
    pub fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().expect("merge queue mutex poisoned")
    }

    /// Enqueue a merge, waking one waiting consumer.
    pub fn enqueue(&self, merge: Merge, guard: &mut MutexGuard<'_, QueueState>) {
        guard.items.push_back(merge);
        self.condvar.notify_one();
    }

    /// Dequeue the oldest merge, if any is buffered.
    pub fn dequeue(&self, guard: &mut MutexGuard<'_, QueueState>) -> Option<Merge> {
        guard.items.pop_front()
    }

    /// Mark one producer as finished. Wakes all waiters once every
    /// producer has closed, so the consumer can observe end-of-stream.
    pub fn close(&self, mut guard: MutexGuard<'_, QueueState>) {
        guard.writers = guard.writers.saturating_sub(1);
        if guard.writers == 0 {
            self.condvar.notify_all();
        }
    }

    /// Block until the queue has at least one item, or every writer has
    /// closed (in which case the returned guard observes `is_empty() ==
    /// true`).
    pub fn wait_for_nonempty_or_end(&self) -> MutexGuard<'_, QueueState> {
        let mut guard = self.lock();
        while guard.items.is_empty() && guard.writers > 0 {
            guard = self
                .condvar
                .wait(guard)
                .expect("merge queue mutex poisoned");
        }
        guard
    }

    /// Whether the queue is drained: no items buffered and no writers left.
    pub fn is_empty(&self, guard: &MutexGuard<'_, QueueState>) -> bool {
        guard.is_empty() && guard.open_writers() == 0
    }
}
