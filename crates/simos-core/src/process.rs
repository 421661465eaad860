//! Process table
//!
//! Processes form a tree of owned nodes keyed by [`ProcessId`]. Links are IDs,
//! never references: a node stores its parent's ID and the set of its
//! children's IDs. Both directions are kept in sync by this module.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::types::{Process, ProcessId, ProcessState};

/// All processes that are alive or zombie
#[derive(Clone, Debug, Default)]
pub struct ProcessTable {
    processes: BTreeMap<ProcessId, Process>,
}

impl ProcessTable {
    /// Empty table
    pub fn new() -> Self {
        Self {
            processes: BTreeMap::new(),
        }
    }

    /// Add a process, linking it under `parent` if given
    pub fn insert(&mut self, pid: ProcessId, parent: Option<ProcessId>, state: ProcessState) {
        if let Some(parent_pid) = parent {
            if let Some(parent_proc) = self.processes.get_mut(&parent_pid) {
                parent_proc.children.insert(pid);
            }
        }
        self.processes.insert(pid, Process::new(pid, parent, state));
    }

    /// Get process info
    pub fn get(&self, pid: ProcessId) -> Option<&Process> {
        self.processes.get(&pid)
    }

    /// Current state of `pid`
    pub fn state(&self, pid: ProcessId) -> Option<ProcessState> {
        self.processes.get(&pid).map(|p| p.state)
    }

    /// Update the state of `pid`. Unknown PIDs are ignored.
    pub fn set_state(&mut self, pid: ProcessId, state: ProcessState) {
        if let Some(proc) = self.processes.get_mut(&pid) {
            proc.state = state;
        }
    }

    /// Check if a process exists and is alive
    pub fn is_alive(&self, pid: ProcessId) -> bool {
        self.state(pid).map(ProcessState::is_alive).unwrap_or(false)
    }

    /// Parent of `pid`
    pub fn parent(&self, pid: ProcessId) -> Option<ProcessId> {
        self.processes.get(&pid).and_then(|p| p.parent)
    }

    /// Children of `pid`, ascending PID
    pub fn children(&self, pid: ProcessId) -> Vec<ProcessId> {
        self.processes
            .get(&pid)
            .map(|p| p.children.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Lowest-numbered zombie child of `pid`
    pub fn zombie_child(&self, pid: ProcessId) -> Option<ProcessId> {
        self.processes.get(&pid)?.children.iter().copied().find(|c| {
            self.state(*c) == Some(ProcessState::Zombie)
        })
    }

    /// Whether `pid` has a child that has not exited
    pub fn has_live_child(&self, pid: ProcessId) -> bool {
        self.processes
            .get(&pid)
            .map(|p| p.children.iter().any(|c| self.is_alive(*c)))
            .unwrap_or(false)
    }

    /// Every descendant of `pid`, children before grandchildren
    pub fn descendants(&self, pid: ProcessId) -> Vec<ProcessId> {
        let mut out = self.children(pid);
        let mut idx = 0;
        while idx < out.len() {
            let next = self.children(out[idx]);
            out.extend(next);
            idx += 1;
        }
        out
    }

    /// Remove `pid` and detach it from its parent.
    ///
    /// Children keep a dangling parent link; callers remove subtrees
    /// bottom-up.
    pub fn remove(&mut self, pid: ProcessId) -> Option<Process> {
        let proc = self.processes.remove(&pid)?;
        if let Some(parent_pid) = proc.parent {
            if let Some(parent_proc) = self.processes.get_mut(&parent_pid) {
                parent_proc.children.remove(&pid);
            }
        }
        Some(proc)
    }

    /// Iterate over all processes, ascending PID
    pub fn iter(&self) -> impl Iterator<Item = &Process> + '_ {
        self.processes.values()
    }

    /// Number of processes (including zombies)
    pub fn len(&self) -> usize {
        self.processes.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }
}
