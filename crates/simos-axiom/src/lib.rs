//! SimOS Axiom Layer
//!
//! The Axiom layer wraps a [`simos_core::Kernel`] and provides:
//! - **SysLog**: Audit trail of every event (request + response)
//! - **CommitLog**: Every state mutation, tagged with its cause
//! - **AxiomGateway**: Single entry point that mutates the kernel
//! - **Replay**: Rebuild and verify a kernel from its history
//! - **Script**: JSON-driven runs that report state after every event
//!
//! # Core Guarantee
//!
//! > Same configuration and events always produce the same state.
//!
//! # Logging
//!
//! Records go through the `log` facade. The embedding binary picks the
//! logger; without one, logging is a no-op.

pub mod commitlog;
pub mod gateway;
pub mod replay;
pub mod script;
pub mod syslog;
pub mod types;

// Re-export main types
pub use commitlog::{Commit, CommitLog, CommitRecord};
pub use gateway::{AxiomGateway, Dispatched, GatewayState};
pub use replay::{replay, replay_and_verify, ReplayError, ReplayResult};
pub use script::{run_script, run_script_json, Script, ScriptError, ScriptReport, ScriptStep};
pub use syslog::{SysEvent, SysEventType, SysLog, MAX_SYSLOG_EVENTS};
pub use types::*;
