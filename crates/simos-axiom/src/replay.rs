//! Deterministic Replay
//!
//! > Same configuration and event sequence always produces the same state.
//!
//! [`replay`] rebuilds a kernel from a configuration and a sequence of
//! events. [`replay_and_verify`] re-runs a gateway's SysLog on a fresh
//! kernel and checks every response, every commit and the final state
//! against what the gateway recorded.

use std::collections::BTreeMap;

use simos_core::{
    check_all_invariants, step, ConfigError, Event, EventOutcome, Kernel, KernelConfig,
    KernelError, Snapshot, StepResult,
};

use crate::gateway::AxiomGateway;
use crate::syslog::SysEventType;
use crate::types::EventId;

/// Errors that can occur during replay.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ReplayError {
    /// Recorded configuration cannot build a kernel
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Oldest events were trimmed from the SysLog
    #[error("syslog starts at event {first}; earlier events were trimmed")]
    Truncated { first: EventId },

    /// A request was never answered
    #[error("request {request_id} has no response")]
    MissingResponse { request_id: EventId },

    /// Replayed kernel answered differently
    #[error("request {request_id}: recorded {recorded:?}, replayed {replayed:?}")]
    ResultMismatch {
        request_id: EventId,
        recorded: Result<EventOutcome, KernelError>,
        replayed: Result<EventOutcome, KernelError>,
    },

    /// Replayed commits differ from the CommitLog
    #[error("commits diverge at request {request_id}")]
    CommitMismatch { request_id: EventId },

    /// Replay produced fewer commits than the CommitLog holds
    #[error("commitlog holds {extra} commit(s) no event produced")]
    UnexplainedCommits { extra: usize },

    /// Replayed state differs from the live kernel
    #[error("replayed state differs from the live kernel")]
    SnapshotMismatch,

    /// Replayed kernel breaks an invariant
    #[error("invariant {invariant} violated after replay: {description}")]
    Invariant {
        invariant: &'static str,
        description: String,
    },
}

/// Result of a replay operation.
pub type ReplayResult<T> = Result<T, ReplayError>;

/// Build a kernel from `config` and apply `events` in order.
///
/// Rejected events are part of the history and are replayed as such.
pub fn replay<I>(config: KernelConfig, events: I) -> ReplayResult<Kernel>
where
    I: IntoIterator<Item = Event>,
{
    let mut kernel = Kernel::with_config(config)?;
    for event in events {
        step(&mut kernel, event);
    }
    Ok(kernel)
}

/// Replay a gateway's history on a fresh kernel and verify it.
///
/// Returns the replayed snapshot on success.
pub fn replay_and_verify(gateway: &AxiomGateway) -> ReplayResult<Snapshot> {
    let syslog = gateway.syslog();
    if let Some(first) = syslog.first_id() {
        if first != 0 {
            return Err(ReplayError::Truncated { first });
        }
    }

    let mut responses = BTreeMap::new();
    for ev in syslog.events() {
        if let SysEventType::Response { request_id, result } = &ev.event_type {
            responses.insert(*request_id, *result);
        }
    }

    let mut kernel = Kernel::with_config(*gateway.config())?;
    let mut recorded = gateway.commitlog().kernel_commits();

    for ev in syslog.events() {
        let SysEventType::Request { event } = &ev.event_type else {
            continue;
        };
        let request_id = ev.id;
        let expected = responses
            .get(&request_id)
            .copied()
            .ok_or(ReplayError::MissingResponse { request_id })?;

        let StepResult { result, commits } = step(&mut kernel, event.clone());
        if result != expected {
            return Err(ReplayError::ResultMismatch {
                request_id,
                recorded: expected,
                replayed: result,
            });
        }

        for commit in &commits {
            match recorded.next() {
                Some((Some(cause), ct)) if cause == request_id && ct == commit => {}
                _ => return Err(ReplayError::CommitMismatch { request_id }),
            }
        }
    }

    let extra = recorded.count();
    if extra > 0 {
        return Err(ReplayError::UnexplainedCommits { extra });
    }

    if let Some(v) = check_all_invariants(&kernel).into_iter().next() {
        return Err(ReplayError::Invariant {
            invariant: v.invariant,
            description: v.description,
        });
    }

    let snapshot = kernel.snapshot();
    if snapshot != gateway.kernel().snapshot() {
        return Err(ReplayError::SnapshotMismatch);
    }

    log::debug!(
        "replay verified: {} event(s), {} commit(s)",
        syslog.len(),
        gateway.commitlog().len()
    );
    Ok(snapshot)
}
