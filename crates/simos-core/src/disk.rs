//! Disk manager
//!
//! One FIFO queue of read requests per disk. The front of a queue is the
//! request being served; the rest wait in arrival order.

use alloc::collections::VecDeque;
use alloc::vec::Vec;

use crate::error::KernelError;
use crate::types::{DiskSnapshot, FileReadRequest, ProcessId};

/// Per-disk I/O queues
#[derive(Clone, Debug)]
pub struct DiskManager {
    queues: Vec<VecDeque<FileReadRequest>>,
}

impl DiskManager {
    /// `count` idle disks
    pub fn new(count: usize) -> Self {
        Self {
            queues: (0..count).map(|_| VecDeque::new()).collect(),
        }
    }

    /// Number of disks
    pub fn count(&self) -> usize {
        self.queues.len()
    }

    /// Fail with `InvalidDisk` unless `disk` is in range
    pub fn check(&self, disk: usize) -> Result<(), KernelError> {
        if disk < self.queues.len() {
            Ok(())
        } else {
            Err(KernelError::InvalidDisk {
                disk,
                disks: self.queues.len(),
            })
        }
    }

    fn queue(&self, disk: usize) -> Result<&VecDeque<FileReadRequest>, KernelError> {
        self.check(disk)?;
        Ok(&self.queues[disk])
    }

    fn queue_mut(&mut self, disk: usize) -> Result<&mut VecDeque<FileReadRequest>, KernelError> {
        self.check(disk)?;
        Ok(&mut self.queues[disk])
    }

    /// Append a request to the back of `disk`'s queue
    pub fn enqueue(&mut self, disk: usize, request: FileReadRequest) -> Result<(), KernelError> {
        self.queue_mut(disk)?.push_back(request);
        Ok(())
    }

    /// Finish the request at the front of `disk`'s queue.
    ///
    /// An idle disk completes nothing and returns `Ok(None)`.
    pub fn complete(&mut self, disk: usize) -> Result<Option<FileReadRequest>, KernelError> {
        Ok(self.queue_mut(disk)?.pop_front())
    }

    /// Request being served, or the default request if idle
    pub fn serving(&self, disk: usize) -> Result<FileReadRequest, KernelError> {
        Ok(self.queue(disk)?.front().cloned().unwrap_or_default())
    }

    /// Copy of `disk`'s queue, next to be served first
    pub fn snapshot(&self, disk: usize) -> Result<Vec<FileReadRequest>, KernelError> {
        Ok(self.queue(disk)?.iter().cloned().collect())
    }

    /// Drop every request issued by `pid`, returning how many were removed
    pub fn remove_process(&mut self, pid: ProcessId) -> usize {
        let mut removed = 0;
        for queue in &mut self.queues {
            let before = queue.len();
            queue.retain(|req| req.pid != pid);
            removed += before - queue.len();
        }
        removed
    }

    /// Iterate over every queued request with its disk number
    pub fn requests(&self) -> impl Iterator<Item = (usize, &FileReadRequest)> + '_ {
        self.queues
            .iter()
            .enumerate()
            .flat_map(|(disk, q)| q.iter().map(move |req| (disk, req)))
    }

    /// State of every disk
    pub fn snapshot_all(&self) -> Vec<DiskSnapshot> {
        self.queues
            .iter()
            .map(|q| DiskSnapshot {
                serving: q.front().cloned().unwrap_or_default(),
                queue: q.iter().cloned().collect(),
            })
            .collect()
    }
}
