//! Kernel invariants
//!
//! Runtime-checkable invariants that must hold between any two operations.
//! Used for assertion checking in tests and by replay verification.
//!
//! # Invariants
//!
//! 1. **Placement Exclusion**: a PID occupies at most one of the running slot,
//!    the ready queue, or a disk queue, and never appears twice in a queue
//! 2. **State Agreement**: a process's state matches where it is placed
//! 3. **Memory Capacity**: the frame table never exceeds its capacity
//! 4. **Dense Frames**: frame numbers are exactly `0..len` in table order
//! 5. **No Zombie Memory**: every frame belongs to a live process
//! 6. **PID Monotonicity**: every known PID is below the next PID
//! 7. **Tree Symmetry**: parent and child links agree

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use crate::kernel::Kernel;
use crate::types::{ProcessId, ProcessState};

/// An invariant violation with details
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Name of the violated invariant
    pub invariant: &'static str,
    /// Description of what went wrong
    pub description: String,
}

fn violation(invariant: &'static str, description: String) -> InvariantViolation {
    InvariantViolation {
        invariant,
        description,
    }
}

/// Where a PID was found
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Placement {
    Running,
    Ready,
    Disk(usize),
}

/// Check all kernel invariants.
///
/// Returns a list of violations (empty if all invariants hold).
pub fn check_all_invariants(kernel: &Kernel) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();

    let placements = collect_placements(kernel, &mut violations);
    violations.extend(check_state_agreement(kernel, &placements));
    violations.extend(check_memory(kernel));
    violations.extend(check_pid_monotonicity(kernel));
    violations.extend(check_tree_symmetry(kernel));

    violations
}

/// Invariant 1: record every placement, flagging any PID seen twice
fn collect_placements(
    kernel: &Kernel,
    violations: &mut Vec<InvariantViolation>,
) -> BTreeMap<ProcessId, Placement> {
    let mut placements = BTreeMap::new();

    let mut place = |pid: ProcessId, at: Placement, violations: &mut Vec<InvariantViolation>| {
        if let Some(prev) = placements.insert(pid, at) {
            violations.push(violation(
                "placement_exclusion",
                format!("Process {} placed at both {:?} and {:?}", pid, prev, at),
            ));
        }
    };

    if let Some(pid) = kernel.scheduler.running() {
        place(pid, Placement::Running, violations);
    }
    for pid in kernel.scheduler.ready_queue() {
        place(pid, Placement::Ready, violations);
    }
    for (disk, req) in kernel.disks.requests() {
        place(req.pid, Placement::Disk(disk), violations);
    }

    placements
}

/// Invariant 2: process state matches placement
fn check_state_agreement(
    kernel: &Kernel,
    placements: &BTreeMap<ProcessId, Placement>,
) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();

    for (&pid, &at) in placements {
        let expected = match at {
            Placement::Running => ProcessState::Running,
            Placement::Ready => ProcessState::Ready,
            Placement::Disk(disk) => ProcessState::Blocked { disk },
        };
        match kernel.processes.state(pid) {
            Some(state) if state == expected => {}
            Some(state) => violations.push(violation(
                "state_agreement",
                format!("Process {} is {:?} but placed at {:?}", pid, state, at),
            )),
            None => violations.push(violation(
                "state_agreement",
                format!("Unknown process {} placed at {:?}", pid, at),
            )),
        }
    }

    for proc in kernel.processes.iter() {
        let placed = placements.contains_key(&proc.pid);
        let should_be_placed = !matches!(proc.state, ProcessState::Waiting | ProcessState::Zombie);
        if placed != should_be_placed {
            violations.push(violation(
                "state_agreement",
                format!(
                    "Process {} is {:?} but {} placed",
                    proc.pid,
                    proc.state,
                    if placed { "is" } else { "is not" }
                ),
            ));
        }
    }

    violations
}

/// Invariants 3-5: capacity, dense numbering, live owners, index agreement
fn check_memory(kernel: &Kernel) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    let memory = &kernel.memory;

    if memory.len() > memory.max_frames() {
        violations.push(violation(
            "memory_capacity",
            format!(
                "{} frames used but capacity is {}",
                memory.len(),
                memory.max_frames()
            ),
        ));
    }

    let mut indexed: BTreeMap<ProcessId, Vec<u64>> = BTreeMap::new();
    for (idx, item) in memory.frames().iter().enumerate() {
        if item.frame_number != idx as u64 {
            violations.push(violation(
                "dense_frames",
                format!(
                    "Frame at position {} is numbered {}",
                    idx, item.frame_number
                ),
            ));
        }
        if !kernel.processes.is_alive(item.pid) {
            violations.push(violation(
                "no_zombie_memory",
                format!(
                    "Frame {} owned by dead or unknown process {}",
                    item.frame_number, item.pid
                ),
            ));
        }
        indexed.entry(item.pid).or_default().push(item.page_number);
    }

    for pid in memory.owners() {
        let mut from_table = indexed.remove(&pid).unwrap_or_default();
        from_table.sort_unstable();
        if from_table != memory.pages_of(pid) {
            violations.push(violation(
                "owned_page_index",
                format!("Owned-page index of process {} disagrees with frame table", pid),
            ));
        }
    }
    for pid in indexed.keys() {
        violations.push(violation(
            "owned_page_index",
            format!("Process {} owns frames missing from the index", pid),
        ));
    }

    violations
}

/// Invariant 6: every known PID is below the next PID
fn check_pid_monotonicity(kernel: &Kernel) -> Vec<InvariantViolation> {
    let next_pid = kernel.scheduler.next_pid();
    kernel
        .processes
        .iter()
        .filter(|p| p.pid.0 == 0 || p.pid.0 >= next_pid)
        .map(|p| {
            violation(
                "pid_monotonicity",
                format!("Process {} exists but next_pid is {}", p.pid, next_pid),
            )
        })
        .collect()
}

/// Invariant 7: parent and child links agree
fn check_tree_symmetry(kernel: &Kernel) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();

    for proc in kernel.processes.iter() {
        if let Some(parent) = proc.parent {
            let listed = kernel
                .processes
                .get(parent)
                .map(|p| p.children.contains(&proc.pid))
                .unwrap_or(false);
            if !listed {
                violations.push(violation(
                    "tree_symmetry",
                    format!("Process {} not listed by parent {}", proc.pid, parent),
                ));
            }
        }
        for &child in &proc.children {
            if kernel.processes.parent(child) != Some(proc.pid) {
                violations.push(violation(
                    "tree_symmetry",
                    format!("Process {} lists {} which is not its child", proc.pid, child),
                ));
            }
        }
    }

    violations
}

/// Assert all invariants hold (panic if not)
pub fn assert_invariants(kernel: &Kernel) {
    let violations = check_all_invariants(kernel);
    if let Some(v) = violations.first() {
        panic!("Invariant violated: {} ({})", v.invariant, v.description);
    }
}
