//! CPU scheduler
//!
//! Owns the running slot, the FIFO ready queue and PID allocation. It knows
//! nothing about processes beyond their IDs; state bookkeeping lives in the
//! kernel.

use alloc::collections::VecDeque;
use alloc::vec::Vec;

use crate::types::ProcessId;

/// Round-robin scheduler state
#[derive(Clone, Debug)]
pub struct Scheduler {
    /// Process holding the CPU
    running: Option<ProcessId>,
    /// Ready queue, front runs next
    ready: VecDeque<ProcessId>,
    /// Next process ID to allocate
    next_pid: u64,
}

impl Scheduler {
    /// Idle scheduler; the first PID handed out is 1
    pub fn new() -> Self {
        Self {
            running: None,
            ready: VecDeque::new(),
            next_pid: 1,
        }
    }

    /// Generate next process ID
    pub fn alloc_pid(&mut self) -> ProcessId {
        let pid = ProcessId(self.next_pid);
        self.next_pid += 1;
        pid
    }

    /// Next PID that will be allocated
    pub fn next_pid(&self) -> u64 {
        self.next_pid
    }

    /// Process holding the CPU
    pub fn running(&self) -> Option<ProcessId> {
        self.running
    }

    /// Put `pid` on the CPU. The slot must be empty.
    pub fn set_running(&mut self, pid: ProcessId) {
        debug_assert!(self.running.is_none(), "CPU already occupied");
        self.running = Some(pid);
    }

    /// Empty the running slot, returning its previous occupant
    pub fn take_running(&mut self) -> Option<ProcessId> {
        self.running.take()
    }

    /// Append to the back of the ready queue
    pub fn enqueue(&mut self, pid: ProcessId) {
        self.ready.push_back(pid);
    }

    /// Move the front of the ready queue onto an idle CPU.
    ///
    /// Returns the dispatched PID, or `None` if the CPU is busy or the ready
    /// queue is empty.
    pub fn dispatch_next(&mut self) -> Option<ProcessId> {
        if self.running.is_some() {
            return None;
        }
        let pid = self.ready.pop_front()?;
        self.running = Some(pid);
        Some(pid)
    }

    /// Remove `pid` from the running slot or the ready queue.
    ///
    /// Returns true if it was found in either place.
    pub fn remove(&mut self, pid: ProcessId) -> bool {
        if self.running == Some(pid) {
            self.running = None;
            return true;
        }
        match self.ready.iter().position(|&p| p == pid) {
            Some(idx) => {
                self.ready.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Ready queue, front first
    pub fn ready_queue(&self) -> impl Iterator<Item = ProcessId> + '_ {
        self.ready.iter().copied()
    }

    /// Ready queue snapshot, front first
    pub fn ready_snapshot(&self) -> Vec<ProcessId> {
        self.ready.iter().copied().collect()
    }

    /// Number of processes in the ready queue
    pub fn ready_len(&self) -> usize {
        self.ready.len()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
