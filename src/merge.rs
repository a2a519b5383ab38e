//! `PriorityMergeReader`: per-timestamp merge across any number of page
//! iterators, resolving same-timestamp conflicts by `VersionKey`.
//!
//! One generic reader serves both directions (see `direction::DirectedEntry`
//! for the heap-ordering trick); there is no separate ASC/DESC type.

use std::collections::BinaryHeap;

use crate::direction::{Direction, DirectedEntry};
use crate::model::{TimeValuePair, Value, VersionKey};

struct MergeInput<I> {
    iter: I,
    version: VersionKey,
    end_frontier: i64,
    alive: bool,
}

struct Pending {
    timestamp: i64,
    idx: usize,
    value: Value,
}

/// Consumes `(iterator, version, endFrontier)` triples and yields
/// `TimeValuePair`s in direction order with version-based shadowing: at
/// equal timestamps, only the pair from the largest `VersionKey` survives.
pub struct PriorityMergeReader<I> {
    direction: Direction,
    inputs: Vec<MergeInput<I>>,
    heap: BinaryHeap<DirectedEntry<(usize, Value)>>,
    pending: Option<Pending>,
}

impl<I: Iterator<Item = TimeValuePair>> PriorityMergeReader<I> {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            inputs: Vec::new(),
            heap: BinaryHeap::new(),
            pending: None,
        }
    }

    pub fn is_empty(&mut self) -> bool {
        self.ensure_pending();
        self.pending.is_none()
    }

    /// Register a new input. May be called at any time, including with a
    /// first timestamp that ties or precedes the current head — the next
    /// `ensure_pending` pass re-resolves against it.
    pub fn add_reader(&mut self, iter: I, version: VersionKey, end_frontier: i64) {
        let idx = self.inputs.len();
        self.inputs.push(MergeInput {
            iter,
            version,
            end_frontier,
            alive: true,
        });
        self.pull(idx);
    }

    /// The minimum (ASC) / maximum (DESC) `endFrontier` across inputs that
    /// have not yet exhausted their iterator.
    pub fn current_read_stop_time(&self) -> Option<i64> {
        self.inputs
            .iter()
            .filter(|i| i.alive)
            .map(|i| i.end_frontier)
            .reduce(|a, b| match self.direction.cmp_time(a, b) {
                std::cmp::Ordering::Greater => b,
                _ => a,
            })
    }

    pub fn current_time_value_pair(&mut self) -> Option<TimeValuePair> {
        self.ensure_pending();
        self.pending.as_ref().map(|p| TimeValuePair::new(p.timestamp, p.value.clone()))
    }

    pub fn next_time_value_pair(&mut self) -> Option<TimeValuePair> {
        self.ensure_pending();
        let pending = self.pending.take()?;
        self.pull(pending.idx);
        Some(TimeValuePair::new(pending.timestamp, pending.value))
    }

    fn pull(&mut self, idx: usize) {
        match self.inputs[idx].iter.next() {
            Some(tvp) => self.heap.push(DirectedEntry::new(tvp.timestamp, self.direction, (idx, tvp.value))),
            None => self.inputs[idx].alive = false,
        }
    }

    /// Resolve `pending` against the heap until the heap's front is
    /// strictly behind `pending` in direction order. Handles both a tie
    /// (version shoot-out) and a newcomer that belongs ahead of the
    /// current `pending` (an `addReader` arriving with an earlier or
    /// tied first timestamp).
    fn ensure_pending(&mut self) {
        if self.pending.is_none() {
            if let Some(top) = self.heap.pop() {
                let (idx, value) = top.value;
                self.pending = Some(Pending {
                    timestamp: top.key,
                    idx,
                    value,
                });
            } else {
                return;
            }
        }
        loop {
            let Some(top) = self.heap.peek() else { break };
            let pending = self.pending.as_ref().expect("checked above");
            match self.direction.cmp_time(top.key, pending.timestamp) {
                std::cmp::Ordering::Greater => break,
                std::cmp::Ordering::Less => {
                    let top = self.heap.pop().expect("just peeked");
                    let (idx, value) = top.value;
                    let displaced = self.pending.replace(Pending {
                        timestamp: top.key,
                        idx,
                        value,
                    });
                    if let Some(displaced) = displaced {
                        self.heap.push(DirectedEntry::new(displaced.timestamp, self.direction, (displaced.idx, displaced.value)));
                    }
                }
                std::cmp::Ordering::Equal => {
                    let top = self.heap.pop().expect("just peeked");
                    let (top_idx, top_value) = top.value;
                    let pending = self.pending.take().expect("checked above");
                    let pending_wins = self.inputs[pending.idx].version >= self.inputs[top_idx].version;
                    let (winner, loser_idx) = if pending_wins {
                        (pending, top_idx)
                    } else {
                        (
                            Pending {
                                timestamp: top.key,
                                idx: top_idx,
                                value: top_value,
                            },
                            pending.idx,
                        )
                    };
                    self.pending = Some(winner);
                    self.pull(loser_idx);
                }
            }
        }
    }
}
