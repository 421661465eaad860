//! Common types for the Axiom layer.

/// Event identifier (monotonic, unique within SysLog)
pub type EventId = u64;

/// Commit identifier (sequence number within CommitLog, genesis is 0)
pub type CommitId = u64;
