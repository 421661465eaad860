//! Core kernel types
//!
//! This module contains the fundamental types used throughout the kernel core.
//! All types here are pure data.

use alloc::collections::BTreeSet;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use serde::{Deserialize, Serialize};

/// Process identifier
///
/// Assigned from 1 upwards and never reused. `ProcessId(0)` is reserved as
/// [`NO_PROCESS`].
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ProcessId(pub u64);

/// Sentinel meaning "no process" (idle CPU, idle disk)
pub const NO_PROCESS: ProcessId = ProcessId(0);

impl ProcessId {
    /// True for the [`NO_PROCESS`] sentinel
    pub fn is_none(self) -> bool {
        self == NO_PROCESS
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Process state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessState {
    /// Process holds the CPU
    Running,
    /// Process sits in the ready queue
    Ready,
    /// Process sits in the I/O queue of a disk
    Blocked {
        /// Disk the request was issued to
        disk: usize,
    },
    /// Process called wait and has live children but no zombie child
    Waiting,
    /// Process has exited; its parent has not waited for it yet
    Zombie,
}

impl ProcessState {
    /// Zombies are the only state that is not alive
    pub fn is_alive(self) -> bool {
        self != ProcessState::Zombie
    }
}

/// Process descriptor - one node of the process tree
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Process {
    /// Process ID
    pub pid: ProcessId,
    /// Parent process (`None` for processes created by `new_process`)
    pub parent: Option<ProcessId>,
    /// Children, live or zombie
    pub children: BTreeSet<ProcessId>,
    /// Current state
    pub state: ProcessState,
}

impl Process {
    /// Create a process descriptor with no children
    pub fn new(pid: ProcessId, parent: Option<ProcessId>, state: ProcessState) -> Self {
        Self {
            pid,
            parent,
            children: BTreeSet::new(),
            state,
        }
    }
}

// ============================================================================
// Disk types
// ============================================================================

/// A pending or in-service disk read
///
/// The default value (`NO_PROCESS`, empty file name) is what an idle disk
/// reports.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReadRequest {
    /// Process that issued the read
    pub pid: ProcessId,
    /// File being read
    pub file_name: String,
}

impl FileReadRequest {
    /// Create a request for `pid`
    pub fn new(pid: ProcessId, file_name: impl Into<String>) -> Self {
        Self {
            pid,
            file_name: file_name.into(),
        }
    }
}

// ============================================================================
// Memory types
// ============================================================================

/// One used frame of RAM
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryItem {
    /// Logical page of the owning process
    pub page_number: u64,
    /// Physical frame holding the page
    pub frame_number: u64,
    /// Process using this frame
    pub pid: ProcessId,
}

/// Frame table contents, from low addresses to high
pub type MemoryUsage = Vec<MemoryItem>;

// ============================================================================
// Snapshots
// ============================================================================

/// State of a single disk
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskSnapshot {
    /// Request being served (default request when idle)
    pub serving: FileReadRequest,
    /// Every queued request, the one being served first
    pub queue: Vec<FileReadRequest>,
}

/// Everything a caller can observe about the kernel
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Process holding the CPU, or `NO_PROCESS`
    pub cpu: ProcessId,
    /// Ready queue, front first
    pub ready_queue: Vec<ProcessId>,
    /// Frame table, ascending frame number
    pub memory: MemoryUsage,
    /// Per-disk state, indexed by disk number
    pub disks: Vec<DiskSnapshot>,
}
