//! Commit Log
//!
//! Records every state mutation the kernel reports, in order, tagged with
//! the SysLog request that caused it.
//!
//! # Core Invariant
//!
//! > `reduce(genesis, events) -> state`
//!
//! The genesis record carries the kernel configuration, so the log alone is
//! enough to rebuild a kernel and re-run its history.

use serde::{Deserialize, Serialize};
use simos_core::{CommitType, KernelConfig};

use crate::types::{CommitId, EventId};

/// A state mutation record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Sequence number (monotonic, genesis is 0)
    pub seq: CommitId,
    /// The SysLog request that caused this commit
    pub caused_by: Option<EventId>,
    /// What changed
    pub record: CommitRecord,
}

/// Contents of a commit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitRecord {
    /// Kernel construction
    Genesis {
        /// Configuration the kernel was built with
        config: KernelConfig,
    },
    /// A mutation reported by the kernel
    Kernel(CommitType),
}

/// Append-only commit log.
#[derive(Clone, Debug)]
pub struct CommitLog {
    commits: Vec<Commit>,
    config: KernelConfig,
}

impl CommitLog {
    /// Create a log holding only the genesis commit.
    pub fn new(config: KernelConfig) -> Self {
        Self {
            commits: vec![Commit {
                seq: 0,
                caused_by: None,
                record: CommitRecord::Genesis { config },
            }],
            config,
        }
    }

    /// Append a kernel commit.
    ///
    /// Returns the sequence number of the new commit.
    pub fn append(&mut self, commit_type: CommitType, caused_by: Option<EventId>) -> CommitId {
        let seq = self.commits.len() as CommitId;
        self.commits.push(Commit {
            seq,
            caused_by,
            record: CommitRecord::Kernel(commit_type),
        });
        seq
    }

    /// Configuration recorded in the genesis commit
    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// Get all commits, genesis first.
    pub fn commits(&self) -> &[Commit] {
        &self.commits
    }

    /// Kernel commits with the request that caused each, genesis excluded
    pub fn kernel_commits(&self) -> impl Iterator<Item = (Option<EventId>, &CommitType)> + '_ {
        self.commits.iter().filter_map(|c| match &c.record {
            CommitRecord::Kernel(ct) => Some((c.caused_by, ct)),
            CommitRecord::Genesis { .. } => None,
        })
    }

    /// Get commits with `start_seq <= seq < end_seq`.
    pub fn get_range(&self, start_seq: CommitId, end_seq: CommitId) -> Vec<&Commit> {
        self.commits
            .iter()
            .filter(|c| c.seq >= start_seq && c.seq < end_seq)
            .collect()
    }

    /// Get the most recent N commits, newest first.
    pub fn get_recent(&self, count: usize) -> Vec<&Commit> {
        self.commits.iter().rev().take(count).collect()
    }

    /// Sequence number of the latest commit
    pub fn current_seq(&self) -> CommitId {
        self.commits.len() as CommitId - 1
    }

    /// Number of commits, genesis included
    pub fn len(&self) -> usize {
        self.commits.len()
    }

    /// Always false: the genesis commit is never removed
    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }
}
