//! SimOS Kernel Core - Pure State Machine
//!
//! This crate contains the **pure, deterministic** state machine of a
//! single-CPU, multi-disk, paged-memory kernel simulator. Nothing happens on
//! its own: every transition is driven by an explicit call (process creation,
//! fork, exit, wait, timer interrupt, disk request/completion, memory access).
//!
//! # Design Principles
//!
//! 1. **No I/O or side effects**: no clocks, no threads, no logging
//! 2. **Deterministic**: same event sequence always produces the same state
//! 3. **Validate then mutate**: a rejected operation leaves the kernel untouched
//! 4. **Explicitly owned**: no statics, independent kernels coexist
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        simos-core                           │
//! │                                                             │
//! │   ┌───────────────┐    ┌───────────────┐                   │
//! │   │    Kernel     │    │    step()     │                   │
//! │   │  - scheduler  │───▶│  Event-driven │                   │
//! │   │  - memory     │    │  transformer  │                   │
//! │   │  - disks      │    └───────────────┘                   │
//! │   │  - processes  │                                         │
//! │   └───────────────┘    ┌───────────────┐                   │
//! │                        │  Invariants   │                   │
//! │                        │  Assertions   │                   │
//! │                        └───────────────┘                   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              │ used by
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       simos-axiom                           │
//! │   - SysLog audit trail, CommitLog                           │
//! │   - Replay and verification                                 │
//! │   - JSON scripted driver                                    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Module Organization
//!
//! - `types` - Core types (ProcessId, FileReadRequest, MemoryItem, ...)
//! - `error` - KernelError and ConfigError
//! - `config` - KernelConfig and the page replacement policy
//! - `scheduler` - Running slot, ready queue, PID allocation
//! - `memory` - Fixed-capacity frame table with eviction
//! - `disk` - Per-disk FIFO request queues
//! - `process` - Process tree (parents, children, zombies)
//! - `kernel` - The Kernel tying all of the above together
//! - `step` - Event enum and the `step(kernel, event)` function
//! - `invariants` - Runtime-checkable kernel invariants

#![no_std]
extern crate alloc;

pub mod config;
pub mod disk;
pub mod error;
pub mod invariants;
pub mod kernel;
pub mod memory;
pub mod process;
pub mod scheduler;
pub mod step;
pub mod types;

// Re-export all public types for convenient access
pub use config::{KernelConfig, ReplacementPolicy};
pub use error::{ConfigError, KernelError};
pub use invariants::{assert_invariants, check_all_invariants, InvariantViolation};
pub use kernel::Kernel;
pub use step::{step, CommitType, Event, EventOutcome, StepResult};
pub use types::{
    DiskSnapshot, FileReadRequest, MemoryItem, MemoryUsage, Process, ProcessId, ProcessState,
    Snapshot, NO_PROCESS,
};
