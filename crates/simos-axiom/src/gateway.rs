//! Axiom Gateway
//!
//! Entry point for every kernel event. The gateway:
//! 1. Logs the request to SysLog
//! 2. Applies the event with `simos_core::step`
//! 3. Appends any resulting commits to CommitLog
//! 4. Logs the response to SysLog
//!
//! The gateway owns its kernel, so `&mut self` on [`AxiomGateway::dispatch`]
//! is the only way to mutate it.

use simos_core::{
    step, ConfigError, Event, EventOutcome, Kernel, KernelConfig, KernelError, StepResult,
};

use crate::commitlog::CommitLog;
use crate::syslog::SysLog;
use crate::types::{CommitId, EventId};

/// Axiom gateway: owns a kernel and its audit logs.
#[derive(Clone, Debug)]
pub struct AxiomGateway {
    kernel: Kernel,
    /// Event audit log
    syslog: SysLog,
    /// State mutation log
    commitlog: CommitLog,
}

/// Outcome of a dispatched event
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dispatched {
    /// SysLog ID of the request
    pub request_id: EventId,
    /// What the kernel returned
    pub result: Result<EventOutcome, KernelError>,
    /// Sequence numbers of the commits the event produced
    pub commit_ids: Vec<CommitId>,
}

impl AxiomGateway {
    /// Build a kernel from `config` and wrap it.
    pub fn new(config: KernelConfig) -> Result<Self, ConfigError> {
        let kernel = Kernel::with_config(config)?;
        log::debug!(
            "kernel created: {} disk(s), {} frame(s), {:?} replacement",
            config.number_of_disks,
            kernel.max_frames(),
            config.replacement
        );
        Ok(Self {
            kernel,
            syslog: SysLog::new(),
            commitlog: CommitLog::new(config),
        })
    }

    /// Apply one event to the kernel, recording it in both logs.
    pub fn dispatch(&mut self, event: Event) -> Dispatched {
        let name = event.name();

        // 1. Log request
        let request_id = self.syslog.log_request(event.clone());

        // 2. Execute kernel operation
        let StepResult { result, commits } = step(&mut self.kernel, event);

        // 3. Append commits to CommitLog
        let commit_ids: Vec<CommitId> = commits
            .into_iter()
            .map(|ct| self.commitlog.append(ct, Some(request_id)))
            .collect();

        match &result {
            Ok(outcome) => log::debug!(
                "event {} {}: {:?} ({} commit(s))",
                request_id,
                name,
                outcome,
                commit_ids.len()
            ),
            Err(e) => log::warn!("event {} {} rejected: {}", request_id, name, e),
        }

        // 4. Log response
        self.syslog.log_response(request_id, result);

        Dispatched {
            request_id,
            result,
            commit_ids,
        }
    }

    /// Read-only access to the kernel.
    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    /// Configuration the kernel was built with.
    pub fn config(&self) -> &KernelConfig {
        self.commitlog.config()
    }

    /// Get the SysLog (for inspection/auditing).
    pub fn syslog(&self) -> &SysLog {
        &self.syslog
    }

    /// Get the CommitLog (for replay/inspection).
    pub fn commitlog(&self) -> &CommitLog {
        &self.commitlog
    }

    /// Get current state for debugging.
    pub fn state_summary(&self) -> GatewayState {
        GatewayState {
            syslog_len: self.syslog.len(),
            syslog_next_id: self.syslog.next_id(),
            commitlog_len: self.commitlog.len(),
            commitlog_seq: self.commitlog.current_seq(),
        }
    }
}

/// Summary of gateway state (for debugging/monitoring).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GatewayState {
    /// Number of events in SysLog
    pub syslog_len: usize,
    /// Next event ID in SysLog
    pub syslog_next_id: EventId,
    /// Number of commits in CommitLog
    pub commitlog_len: usize,
    /// Current sequence number in CommitLog
    pub commitlog_seq: CommitId,
}
