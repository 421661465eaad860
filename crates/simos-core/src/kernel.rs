//! The kernel - scheduler, memory, disks and process tree in one state machine
//!
//! Every mutating operation follows the same shape:
//! 1. clear the commit buffer
//! 2. check preconditions (`KernelError` on failure, nothing touched)
//! 3. mutate, recording each change as a [`CommitType`]
//!
//! Observers return copies; nothing handed out aliases internal state.

use alloc::string::String;
use alloc::vec::Vec;

use crate::config::KernelConfig;
use crate::disk::DiskManager;
use crate::error::{ConfigError, KernelError};
use crate::memory::{Access, MemoryManager};
use crate::process::ProcessTable;
use crate::scheduler::Scheduler;
use crate::step::CommitType;
use crate::types::{
    FileReadRequest, MemoryUsage, ProcessId, ProcessState, Snapshot, NO_PROCESS,
};

/// Single-CPU, multi-disk, paged-memory kernel simulator.
#[derive(Clone, Debug)]
pub struct Kernel {
    /// Construction parameters
    pub(crate) config: KernelConfig,
    /// Running slot and ready queue
    pub(crate) scheduler: Scheduler,
    /// Frame table
    pub(crate) memory: MemoryManager,
    /// Disk I/O queues
    pub(crate) disks: DiskManager,
    /// Process tree
    pub(crate) processes: ProcessTable,
    /// Mutations made by the most recent operation
    commits: Vec<CommitType>,
}

impl Kernel {
    /// Kernel with `number_of_disks` disks and `amount_of_ram / page_size`
    /// frames, FIFO replacement.
    pub fn new(
        number_of_disks: usize,
        amount_of_ram: u64,
        page_size: u64,
    ) -> Result<Self, ConfigError> {
        Self::with_config(KernelConfig::new(number_of_disks, amount_of_ram, page_size))
    }

    /// Kernel built from a full configuration
    pub fn with_config(config: KernelConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let max_frames = config.frame_capacity()?;
        Ok(Self {
            config,
            scheduler: Scheduler::new(),
            memory: MemoryManager::new(max_frames, config.page_size, config.replacement),
            disks: DiskManager::new(config.number_of_disks),
            processes: ProcessTable::new(),
            commits: Vec::new(),
        })
    }

    /// Construction parameters
    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// Capacity of the frame table
    pub fn max_frames(&self) -> usize {
        self.memory.max_frames()
    }

    /// Mutations made by the most recent operation (empty if it failed)
    pub fn last_commits(&self) -> &[CommitType] {
        &self.commits
    }

    // ========================================================================
    // Internal helpers
    // ========================================================================

    fn begin(&mut self) {
        self.commits.clear();
    }

    fn record(&mut self, commit: CommitType) {
        self.commits.push(commit);
    }

    fn require_running(&self) -> Result<ProcessId, KernelError> {
        self.scheduler.running().ok_or(KernelError::Idle)
    }

    /// Put the ready queue's front on the CPU if the CPU is free
    fn dispatch_if_idle(&mut self) {
        if let Some(pid) = self.scheduler.dispatch_next() {
            self.processes.set_state(pid, ProcessState::Running);
            self.record(CommitType::Dispatched { pid });
        }
    }

    /// Refill a CPU that was just vacated, or record that it went idle
    fn reschedule(&mut self) {
        self.dispatch_if_idle();
        if self.scheduler.running().is_none() {
            self.record(CommitType::CpuIdle);
        }
    }

    fn release_memory(&mut self, pid: ProcessId) -> usize {
        let frames = self.memory.release(pid);
        if frames > 0 {
            self.record(CommitType::MemoryReleased { pid, frames });
        }
        frames
    }

    /// Remove `pid` from every queue, the frame table and the process table
    fn terminate(&mut self, pid: ProcessId) {
        self.scheduler.remove(pid);
        self.disks.remove_process(pid);
        self.release_memory(pid);
        self.processes.remove(pid);
        self.record(CommitType::Terminated { pid });
    }

    // ========================================================================
    // Scheduler operations
    // ========================================================================

    /// Create a process with no parent.
    ///
    /// It takes the CPU if the CPU is idle, otherwise it joins the back of
    /// the ready queue. Never fails.
    pub fn new_process(&mut self) -> ProcessId {
        self.begin();
        let pid = self.scheduler.alloc_pid();
        self.record(CommitType::ProcessCreated { pid, parent: None });

        if self.scheduler.running().is_none() {
            self.processes.insert(pid, None, ProcessState::Running);
            self.scheduler.set_running(pid);
            self.record(CommitType::Dispatched { pid });
        } else {
            self.processes.insert(pid, None, ProcessState::Ready);
            self.scheduler.enqueue(pid);
            self.record(CommitType::Queued { pid });
        }
        pid
    }

    /// Fork the running process. The child joins the back of the ready queue.
    pub fn sim_fork(&mut self) -> Result<ProcessId, KernelError> {
        self.begin();
        let parent = self.require_running()?;

        let pid = self.scheduler.alloc_pid();
        self.processes.insert(pid, Some(parent), ProcessState::Ready);
        self.scheduler.enqueue(pid);
        self.record(CommitType::ProcessCreated {
            pid,
            parent: Some(parent),
        });
        self.record(CommitType::Queued { pid });
        Ok(pid)
    }

    /// Terminate the running process.
    ///
    /// All descendants are terminated with it and its memory is released.
    /// A waiting parent is woken and the process is reaped on the spot;
    /// otherwise a process with a parent stays behind as a zombie. The
    /// ready queue's front then takes the CPU.
    pub fn sim_exit(&mut self) -> Result<(), KernelError> {
        self.begin();
        let pid = self.require_running()?;

        // Cascading termination, deepest first
        for descendant in self.processes.descendants(pid).into_iter().rev() {
            self.terminate(descendant);
        }

        self.scheduler.take_running();
        self.release_memory(pid);

        match self.processes.parent(pid) {
            Some(parent) if self.processes.state(parent) == Some(ProcessState::Waiting) => {
                self.processes.remove(pid);
                self.record(CommitType::Reaped { pid, by: parent });
                self.processes.set_state(parent, ProcessState::Ready);
                self.scheduler.enqueue(parent);
                self.record(CommitType::Queued { pid: parent });
            }
            Some(parent) if self.processes.is_alive(parent) => {
                self.processes.set_state(pid, ProcessState::Zombie);
                self.record(CommitType::Zombie { pid });
            }
            _ => {
                self.processes.remove(pid);
                self.record(CommitType::Terminated { pid });
            }
        }

        self.reschedule();
        Ok(())
    }

    /// The running process waits for one of its children.
    ///
    /// A zombie child is reaped immediately and the caller keeps the CPU.
    /// With only live children the caller leaves the CPU until a child
    /// exits. With no children at all this is a no-op.
    pub fn sim_wait(&mut self) -> Result<(), KernelError> {
        self.begin();
        let pid = self.require_running()?;

        if let Some(zombie) = self.processes.zombie_child(pid) {
            self.processes.remove(zombie);
            self.record(CommitType::Reaped { pid: zombie, by: pid });
            return Ok(());
        }

        if self.processes.has_live_child(pid) {
            self.scheduler.take_running();
            self.processes.set_state(pid, ProcessState::Waiting);
            self.record(CommitType::Waiting { pid });
            self.reschedule();
        }
        Ok(())
    }

    /// Move the running process to the back of the ready queue and run the
    /// front. A lone process gets the CPU straight back.
    pub fn timer_interrupt(&mut self) -> Result<(), KernelError> {
        self.begin();
        let pid = self.require_running()?;

        self.scheduler.take_running();
        self.processes.set_state(pid, ProcessState::Ready);
        self.scheduler.enqueue(pid);
        self.record(CommitType::Preempted { pid });
        self.dispatch_if_idle();
        Ok(())
    }

    // ========================================================================
    // Disk operations
    // ========================================================================

    /// The running process reads `file_name` from `disk`.
    ///
    /// The process leaves the CPU unconditionally. The CPU stays idle unless
    /// `dispatch_on_idle` is configured.
    pub fn disk_read_request(
        &mut self,
        disk: usize,
        file_name: impl Into<String>,
    ) -> Result<(), KernelError> {
        self.begin();
        self.disks.check(disk)?;
        let pid = self.require_running()?;

        let file_name = file_name.into();
        self.disks
            .enqueue(disk, FileReadRequest::new(pid, file_name.clone()))?;
        self.scheduler.take_running();
        self.processes.set_state(pid, ProcessState::Blocked { disk });
        self.record(CommitType::DiskRequested {
            pid,
            disk,
            file_name,
        });

        if self.config.dispatch_on_idle {
            self.reschedule();
        } else {
            self.record(CommitType::CpuIdle);
        }
        Ok(())
    }

    /// `disk` finished the request at the front of its queue; the served
    /// process joins the back of the ready queue. An idle disk is a no-op.
    pub fn disk_job_completed(&mut self, disk: usize) -> Result<(), KernelError> {
        self.begin();
        let request = match self.disks.complete(disk)? {
            Some(request) => request,
            None => return Ok(()),
        };

        let pid = request.pid;
        self.processes.set_state(pid, ProcessState::Ready);
        self.scheduler.enqueue(pid);
        self.record(CommitType::DiskCompleted { pid, disk });

        if self.config.dispatch_on_idle {
            self.dispatch_if_idle();
        }
        Ok(())
    }

    // ========================================================================
    // Memory operations
    // ========================================================================

    /// The running process touches logical `address`; its page is made
    /// resident, evicting the front of the frame table if RAM is full.
    pub fn access_memory_address(&mut self, address: u64) -> Result<(), KernelError> {
        self.begin();
        let pid = self.require_running()?;
        let page = self.memory.page_of(address);

        match self.memory.access(pid, address) {
            Access::Hit { frame, moved } => {
                if moved {
                    self.record(CommitType::PageTouched { pid, page, frame });
                }
            }
            Access::Loaded { frame, evicted } => {
                if let Some(victim) = evicted {
                    self.record(CommitType::PageEvicted {
                        pid: victim.pid,
                        page: victim.page_number,
                        frame: victim.frame_number,
                    });
                }
                self.record(CommitType::PageLoaded { pid, page, frame });
            }
        }
        Ok(())
    }

    /// Free every frame owned by `pid`. A process without memory is a no-op.
    pub fn release_process_memory(&mut self, pid: ProcessId) {
        self.begin();
        self.release_memory(pid);
    }

    // ========================================================================
    // Observers
    // ========================================================================

    /// Process holding the CPU, or `NO_PROCESS`
    pub fn get_cpu(&self) -> ProcessId {
        self.scheduler.running().unwrap_or(NO_PROCESS)
    }

    /// Ready queue, front first
    pub fn get_ready_queue(&self) -> Vec<ProcessId> {
        self.scheduler.ready_snapshot()
    }

    /// Used frames, low to high address
    pub fn get_memory(&self) -> MemoryUsage {
        self.memory.snapshot()
    }

    /// Request `disk` is serving, or the default request if idle
    pub fn get_disk(&self, disk: usize) -> Result<FileReadRequest, KernelError> {
        self.disks.serving(disk)
    }

    /// `disk`'s I/O queue, next to be served first
    pub fn get_disk_queue(&self, disk: usize) -> Result<Vec<FileReadRequest>, KernelError> {
        self.disks.snapshot(disk)
    }

    /// State of `pid`; `None` once it is gone for good
    pub fn process_state(&self, pid: ProcessId) -> Option<ProcessState> {
        self.processes.state(pid)
    }

    /// Parent of `pid`
    pub fn parent_of(&self, pid: ProcessId) -> Option<ProcessId> {
        self.processes.parent(pid)
    }

    /// Children of `pid` (live and zombie), ascending PID
    pub fn children_of(&self, pid: ProcessId) -> Vec<ProcessId> {
        self.processes.children(pid)
    }

    /// Everything observable, in one value
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            cpu: self.get_cpu(),
            ready_queue: self.get_ready_queue(),
            memory: self.get_memory(),
            disks: self.disks.snapshot_all(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn kernel() -> Kernel {
        Kernel::new(2, 1024, 256).unwrap()
    }

    #[test]
    fn test_new_rejects_bad_config() {
        assert_eq!(Kernel::new(1, 1024, 0).err(), Some(ConfigError::ZeroPageSize));
        assert!(matches!(
            Kernel::new(1, 10, 256).err(),
            Some(ConfigError::InsufficientRam { .. })
        ));
    }

    #[test]
    fn test_first_process_runs() {
        let mut k = kernel();
        assert_eq!(k.max_frames(), 4);
        assert_eq!(k.get_cpu(), NO_PROCESS);

        let pid = k.new_process();
        assert_eq!(pid, ProcessId(1));
        assert_eq!(k.get_cpu(), pid);
        assert!(k.get_ready_queue().is_empty());
        assert_eq!(k.process_state(pid), Some(ProcessState::Running));
        assert_eq!(
            k.last_commits(),
            &[
                CommitType::ProcessCreated { pid, parent: None },
                CommitType::Dispatched { pid }
            ]
        );
    }

    #[test]
    fn test_fork_links_child() {
        let mut k = kernel();
        let parent = k.new_process();
        let child = k.sim_fork().unwrap();

        assert_eq!(k.get_ready_queue(), vec![child]);
        assert_eq!(k.parent_of(child), Some(parent));
        assert_eq!(k.children_of(parent), vec![child]);
    }

    #[test]
    fn test_failed_operation_records_nothing() {
        let mut k = kernel();
        k.new_process();
        k.sim_exit().unwrap();
        assert!(!k.last_commits().is_empty());

        assert_eq!(k.sim_fork(), Err(KernelError::Idle));
        assert!(k.last_commits().is_empty());
    }

    #[test]
    fn test_timer_interrupt_round_robin() {
        let mut k = kernel();
        let p1 = k.new_process();
        let p2 = k.new_process();

        k.timer_interrupt().unwrap();
        assert_eq!(k.get_cpu(), p2);
        assert_eq!(k.get_ready_queue(), vec![p1]);
        assert_eq!(k.process_state(p1), Some(ProcessState::Ready));
    }

    #[test]
    fn test_timer_interrupt_lone_process_resumes() {
        let mut k = kernel();
        let p1 = k.new_process();
        k.timer_interrupt().unwrap();
        assert_eq!(k.get_cpu(), p1);
        assert!(k.get_ready_queue().is_empty());
    }

    #[test]
    fn test_disk_request_leaves_cpu_idle() {
        let mut k = kernel();
        let p1 = k.new_process();
        let p2 = k.new_process();

        k.disk_read_request(1, "a.txt").unwrap();
        assert_eq!(k.get_cpu(), NO_PROCESS);
        assert_eq!(k.get_ready_queue(), vec![p2]);
        assert_eq!(k.get_disk(1).unwrap(), FileReadRequest::new(p1, "a.txt"));
        assert_eq!(k.process_state(p1), Some(ProcessState::Blocked { disk: 1 }));
    }

    #[test]
    fn test_dispatch_on_idle() {
        let config = KernelConfig::new(1, 1024, 256).with_dispatch_on_idle(true);
        let mut k = Kernel::with_config(config).unwrap();
        let p1 = k.new_process();
        let p2 = k.new_process();

        k.disk_read_request(0, "a").unwrap();
        assert_eq!(k.get_cpu(), p2);

        k.disk_read_request(0, "b").unwrap();
        assert_eq!(k.get_cpu(), NO_PROCESS);

        k.disk_job_completed(0).unwrap();
        assert_eq!(k.get_cpu(), p1);
        assert_eq!(k.get_disk(0).unwrap().pid, p2);
    }

    #[test]
    fn test_disk_job_completed_idle_disk() {
        let mut k = kernel();
        k.new_process();
        assert_eq!(k.disk_job_completed(0), Ok(()));
        assert!(k.last_commits().is_empty());
        assert_eq!(
            k.disk_job_completed(2),
            Err(KernelError::InvalidDisk { disk: 2, disks: 2 })
        );
    }

    #[test]
    fn test_memory_access_records_eviction() {
        let mut k = Kernel::new(0, 512, 256).unwrap();
        let pid = k.new_process();
        k.access_memory_address(0).unwrap();
        k.access_memory_address(256).unwrap();
        k.access_memory_address(512).unwrap();

        assert_eq!(
            k.last_commits(),
            &[
                CommitType::PageEvicted {
                    pid,
                    page: 0,
                    frame: 0
                },
                CommitType::PageLoaded {
                    pid,
                    page: 2,
                    frame: 1
                }
            ]
        );
    }

    #[test]
    fn test_release_process_memory_is_noop_without_memory() {
        let mut k = kernel();
        k.release_process_memory(ProcessId(42));
        assert!(k.get_memory().is_empty());
        assert!(k.last_commits().is_empty());
    }

    #[test]
    fn test_snapshot_covers_all_disks() {
        let mut k = kernel();
        k.new_process();
        k.disk_read_request(0, "x").unwrap();

        let snap = k.snapshot();
        assert_eq!(snap.cpu, NO_PROCESS);
        assert_eq!(snap.disks.len(), 2);
        assert_eq!(snap.disks[0].serving.file_name, "x");
        assert_eq!(snap.disks[1].serving, FileReadRequest::default());
    }
}
