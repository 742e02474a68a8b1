//! Bounded FIFO buffer for commands with no destination.
//!
//! Insertion past capacity evicts the oldest entry; enqueue never fails.
//! Like the registry, the queue is owned by the delivery worker and needs no
//! internal lock.

use std::collections::VecDeque;

use metrics::counter;
use tracing::warn;

use uibridge_core::command::UiCommand;

use crate::metrics::{COMMANDS_EVICTED_TOTAL, COMMANDS_QUEUED_TOTAL};

/// Drop-oldest pending command queue.
pub struct PendingQueue {
    commands: VecDeque<UiCommand>,
    capacity: usize,
}

impl PendingQueue {
    /// Create a queue holding at most `capacity` commands.
    pub fn new(capacity: usize) -> Self {
        Self {
            commands: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    /// Append a command, evicting the oldest entry if the queue is full.
    pub fn enqueue(&mut self, command: UiCommand) {
        if self.commands.len() >= self.capacity {
            if let Some(dropped) = self.commands.pop_front() {
                warn!(
                    command_id = %dropped.id,
                    command_type = dropped.command_type,
                    capacity = self.capacity,
                    "pending queue full, dropping oldest command"
                );
                counter!(COMMANDS_EVICTED_TOTAL).increment(1);
            }
        }
        self.commands.push_back(command);
        counter!(COMMANDS_QUEUED_TOTAL).increment(1);
    }

    /// Deliver queued commands in insertion order through `sink`.
    ///
    /// `sink` returns `false` on a failed send; the failing command and
    /// everything after it stay queued. On full success the queue is empty.
    /// Returns the number of commands delivered.
    pub fn drain_to(&mut self, mut sink: impl FnMut(&UiCommand) -> bool) -> usize {
        let mut delivered = 0;
        while let Some(command) = self.commands.front() {
            if !sink(command) {
                break;
            }
            let _ = self.commands.pop_front();
            delivered += 1;
        }
        delivered
    }

    /// Number of queued commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
