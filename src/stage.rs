//! One merge level of the pipeline.
//!
//! Stage `s` receives runs of length `L = 2^(s-1)` and emits runs of length
//! `2L`. Incoming runs land alternately in queue 0 and queue 1. Once the
//! second run of a pair has started to arrive the stage interleaves one
//! receive with one merge-and-emit step, so every level of the sort works at
//! the same time.

use crate::bounded_queue::BoundedQueue;
use crate::channel::{Inbound, Outbound};
use crate::error::SortError;
use crate::metrics::StageReport;
use crate::order::MergeOrder;
use std::time::{Duration, Instant};
use tracing::{debug, info, info_span};

pub struct Stage<T, O> {
    index: usize,
    run_len: usize,
    total: usize,
    order: O,
    queues: [BoundedQueue<T>; 2],
    received_count: usize,
    store_index: usize,
    popped: [usize; 2],
    merge_steps: usize,
    pairs_completed: usize,
    peak_occupancy: usize,
}

impl<T, O: MergeOrder<T>> Stage<T, O> {
    /// Builds stage `index` (1-based) of a chain sorting `total` elements.
    ///
    /// Both queues hold `L + 1` elements: while the tail of one pair is
    /// still draining from queue 0, the head of the next run already lands
    /// there.
    pub fn new(index: usize, total: usize, order: O) -> Result<Self, SortError> {
        if index == 0 || index >= usize::BITS as usize {
            return Err(SortError::Setup(format!("stage index {} out of range", index)));
        }
        let run_len = 1usize << (index - 1);
        if total / 2 < run_len || total % (2 * run_len) != 0 {
            return Err(SortError::Setup(format!(
                "stage {} cannot merge {} elements",
                index, total
            )));
        }
        Ok(Stage {
            index,
            run_len,
            total,
            order,
            queues: [
                BoundedQueue::with_capacity(run_len + 1),
                BoundedQueue::with_capacity(run_len + 1),
            ],
            received_count: 0,
            store_index: 0,
            popped: [0, 0],
            merge_steps: 0,
            pairs_completed: 0,
            peak_occupancy: 0,
        })
    }

    pub fn received_count(&self) -> usize {
        self.received_count
    }

    pub fn store_index(&self) -> usize {
        self.store_index
    }

    pub fn popped(&self) -> [usize; 2] {
        self.popped
    }

    pub fn needs_input(&self) -> bool {
        self.received_count < self.total
    }

    /// Merging starts once the second run of the first pair has begun.
    pub fn ready_to_merge(&self) -> bool {
        self.received_count > self.run_len
    }

    pub fn is_finished(&self) -> bool {
        !self.needs_input() && self.queues[0].is_empty() && self.queues[1].is_empty()
    }

    pub fn receive_and_store(&mut self, value: T) {
        assert!(self.needs_input(), "stage {} received more than {} elements", self.index, self.total);
        self.queues[self.store_index].enqueue(value);
        self.received_count += 1;
        if self.received_count % self.run_len == 0 {
            self.store_index ^= 1;
        }
        let occupancy = self.queues[0].len() + self.queues[1].len();
        self.peak_occupancy = self.peak_occupancy.max(occupancy);
    }

    /// Takes the next element of the current run pair.
    pub fn merge_step(&mut self) -> T {
        let from = if self.popped[0] == self.run_len {
            1
        } else if self.popped[1] == self.run_len {
            0
        } else if self.order.takes_left(self.queues[0].front(), self.queues[1].front()) {
            0
        } else {
            1
        };

        let value = self.queues[from].dequeue();
        self.popped[from] += 1;
        self.merge_steps += 1;
        if self.popped[0] + self.popped[1] == 2 * self.run_len {
            self.popped = [0, 0];
            self.pairs_completed += 1;
        }
        value
    }

    /// Drives the stage to completion.
    pub fn run<I, S>(&mut self, inbound: &mut I, outbound: &mut S) -> Result<StageReport, SortError>
    where
        I: Inbound<T>,
        S: Outbound<T>,
    {
        let span = info_span!("stage", stage = self.index, run_len = self.run_len);
        let _guard = span.enter();
        debug!(total = self.total, "stage started");

        let started = Instant::now();
        let mut blocked = Duration::ZERO;
        while !self.is_finished() {
            if self.needs_input() {
                let waiting = Instant::now();
                let value = inbound.recv()?;
                blocked += waiting.elapsed();
                self.receive_and_store(value);
            }
            if self.ready_to_merge() {
                let value = self.merge_step();
                let waiting = Instant::now();
                outbound.send(value)?;
                blocked += waiting.elapsed();
            }
        }

        let report = self.report(started.elapsed(), blocked);
        info!(
            emitted = report.emitted,
            pairs = report.pairs_completed,
            peak = report.peak_occupancy,
            busy_secs = report.busy_secs,
            blocked_secs = report.blocked_secs,
            "stage finished"
        );
        Ok(report)
    }

    /// Busy time is wall time minus time spent waiting on either channel.
    fn report(&self, elapsed: Duration, blocked: Duration) -> StageReport {
        StageReport {
            stage: self.index,
            run_len: self.run_len,
            received: self.received_count,
            emitted: self.merge_steps,
            pairs_completed: self.pairs_completed,
            peak_occupancy: self.peak_occupancy,
            busy_secs: elapsed.saturating_sub(blocked).as_secs_f64(),
            blocked_secs: blocked.as_secs_f64(),
            elapsed_secs: elapsed.as_secs_f64(),
        }
    }
}
