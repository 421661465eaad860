//! Pure step function
//!
//! `step(kernel, event)` applies one [`Event`] to a [`Kernel`] and returns
//! the result together with the list of state mutations it caused.
//!
//! This design enables:
//! - Deterministic replay from a recorded event sequence
//! - Scripted drivers (events are serde values)
//! - Audit logging of every mutation

use alloc::string::String;
use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

use crate::error::KernelError;
use crate::kernel::Kernel;
use crate::types::ProcessId;

// ============================================================================
// Events
// ============================================================================

/// Every mutating kernel operation, as data
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Event {
    /// Create a process with no parent
    NewProcess,
    /// Fork the running process
    SimFork,
    /// Terminate the running process
    SimExit,
    /// Running process waits for a child
    SimWait,
    /// Preempt the running process
    TimerInterrupt,
    /// Running process reads a file from a disk
    DiskReadRequest {
        /// Disk number
        disk: usize,
        /// File to read
        file_name: String,
    },
    /// A disk finished its current job
    DiskJobCompleted {
        /// Disk number
        disk: usize,
    },
    /// Running process touches a logical address
    AccessMemoryAddress {
        /// Logical address
        address: u64,
    },
}

impl Event {
    /// Short operation name, matches the serde tag
    pub fn name(&self) -> &'static str {
        match self {
            Event::NewProcess => "new_process",
            Event::SimFork => "sim_fork",
            Event::SimExit => "sim_exit",
            Event::SimWait => "sim_wait",
            Event::TimerInterrupt => "timer_interrupt",
            Event::DiskReadRequest { .. } => "disk_read_request",
            Event::DiskJobCompleted { .. } => "disk_job_completed",
            Event::AccessMemoryAddress { .. } => "access_memory_address",
        }
    }
}

/// What a successful event produced
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EventOutcome {
    /// A process was created (new_process, sim_fork)
    Created {
        /// The new process
        pid: ProcessId,
    },
    /// The event completed with nothing to return
    Done,
}

// ============================================================================
// Commit types
// ============================================================================

/// Commit types - describe state mutations for audit/replay
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "commit", rename_all = "snake_case")]
pub enum CommitType {
    /// Process entered the process table
    ProcessCreated {
        pid: ProcessId,
        parent: Option<ProcessId>,
    },
    /// Process took the CPU
    Dispatched { pid: ProcessId },
    /// Process joined the back of the ready queue
    Queued { pid: ProcessId },
    /// Running process was moved to the back of the ready queue
    Preempted { pid: ProcessId },
    /// CPU left without a process
    CpuIdle,
    /// Running process queued a read and left the CPU
    DiskRequested {
        pid: ProcessId,
        disk: usize,
        file_name: String,
    },
    /// Disk finished a read; the process joined the ready queue
    DiskCompleted { pid: ProcessId, disk: usize },
    /// Running process started waiting for a child
    Waiting { pid: ProcessId },
    /// Process exited and awaits its parent
    Zombie { pid: ProcessId },
    /// Exited process was collected by its parent
    Reaped { pid: ProcessId, by: ProcessId },
    /// Process was removed without leaving a zombie
    Terminated { pid: ProcessId },
    /// Page loaded into a frame
    PageLoaded {
        pid: ProcessId,
        page: u64,
        frame: u64,
    },
    /// Resident page moved to the most-recently-used end
    PageTouched {
        pid: ProcessId,
        page: u64,
        frame: u64,
    },
    /// Page evicted to make room
    PageEvicted {
        pid: ProcessId,
        page: u64,
        frame: u64,
    },
    /// All frames of a process were freed
    MemoryReleased { pid: ProcessId, frames: usize },
}

/// Result of a step operation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepResult {
    /// The event result
    pub result: Result<EventOutcome, KernelError>,
    /// Commits generated by this step
    pub commits: Vec<CommitType>,
}

// ============================================================================
// The step function
// ============================================================================

/// Apply `event` to `kernel`.
///
/// # Properties
///
/// 1. **Deterministic**: same kernel + event always produces same result
/// 2. **No side effects**: only mutates the provided kernel
/// 3. **Atomic**: an `Err` result comes with no commits and no mutation
pub fn step(kernel: &mut Kernel, event: Event) -> StepResult {
    let result = match event {
        Event::NewProcess => Ok(EventOutcome::Created {
            pid: kernel.new_process(),
        }),
        Event::SimFork => kernel
            .sim_fork()
            .map(|pid| EventOutcome::Created { pid }),
        Event::SimExit => kernel.sim_exit().map(|()| EventOutcome::Done),
        Event::SimWait => kernel.sim_wait().map(|()| EventOutcome::Done),
        Event::TimerInterrupt => kernel.timer_interrupt().map(|()| EventOutcome::Done),
        Event::DiskReadRequest { disk, file_name } => kernel
            .disk_read_request(disk, file_name)
            .map(|()| EventOutcome::Done),
        Event::DiskJobCompleted { disk } => kernel
            .disk_job_completed(disk)
            .map(|()| EventOutcome::Done),
        Event::AccessMemoryAddress { address } => kernel
            .access_memory_address(address)
            .map(|()| EventOutcome::Done),
    };

    StepResult {
        result,
        commits: kernel.last_commits().to_vec(),
    }
}
