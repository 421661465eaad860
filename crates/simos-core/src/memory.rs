//! Memory manager
//!
//! A fixed-capacity frame table. Frame numbers are positions in the table:
//! the table is always dense (`0..len`), ordered from low to high address,
//! and a newly loaded page lands at `frame_number = len`. Removing entries
//! (eviction or release) renumbers everything behind them.
//!
//! The victim on overflow is always the front of the table. Whether a hit
//! moves a page to the back is decided by the [`ReplacementPolicy`].
//!
//! The per-process page index answers residency checks without scanning the
//! table. It does not speed up release: dense renumbering makes releasing a
//! process O(table) regardless.
//!
//! The table grows on demand and never holds more than `max_frames` entries.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec::Vec;

use crate::config::ReplacementPolicy;
use crate::types::{MemoryItem, MemoryUsage, ProcessId};

/// Outcome of a memory access
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    /// Page was already resident
    Hit {
        /// Frame holding the page after the access
        frame: u64,
        /// Whether the policy moved the page to the back of the table
        moved: bool,
    },
    /// Page was loaded into a new frame
    Loaded {
        /// Frame the page was loaded into
        frame: u64,
        /// Page evicted to make room, as it was before eviction
        evicted: Option<MemoryItem>,
    },
}

/// Frame table with per-process ownership index
#[derive(Clone, Debug)]
pub struct MemoryManager {
    /// Frame table, index == frame number
    frames: Vec<MemoryItem>,
    /// Capacity in frames
    max_frames: usize,
    /// Bytes per page
    page_size: u64,
    /// Resident pages per process
    owned: BTreeMap<ProcessId, BTreeSet<u64>>,
    /// What a hit does
    policy: ReplacementPolicy,
}

impl MemoryManager {
    /// Empty frame table. `page_size` must be non-zero.
    pub fn new(max_frames: usize, page_size: u64, policy: ReplacementPolicy) -> Self {
        Self {
            frames: Vec::new(),
            max_frames,
            page_size,
            owned: BTreeMap::new(),
            policy,
        }
    }

    /// Capacity in frames
    pub fn max_frames(&self) -> usize {
        self.max_frames
    }

    /// Page containing `address`
    pub fn page_of(&self, address: u64) -> u64 {
        address / self.page_size
    }

    /// Number of used frames
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Check if no frame is used
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Whether `pid` has `page` resident
    pub fn is_resident(&self, pid: ProcessId, page: u64) -> bool {
        self.owned
            .get(&pid)
            .map(|pages| pages.contains(&page))
            .unwrap_or(false)
    }

    /// Resident pages of `pid`, ascending page number
    pub fn pages_of(&self, pid: ProcessId) -> Vec<u64> {
        self.owned
            .get(&pid)
            .map(|pages| pages.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Processes that own at least one frame
    pub fn owners(&self) -> impl Iterator<Item = ProcessId> + '_ {
        self.owned.keys().copied()
    }

    /// Make sure `pid`'s page holding `address` is resident.
    pub fn access(&mut self, pid: ProcessId, address: u64) -> Access {
        let page = self.page_of(address);

        if self.is_resident(pid, page) {
            return self.touch(pid, page);
        }

        let evicted = if self.frames.len() >= self.max_frames {
            self.evict()
        } else {
            None
        };

        let frame = self.frames.len() as u64;
        self.frames.push(MemoryItem {
            page_number: page,
            frame_number: frame,
            pid,
        });
        self.owned.entry(pid).or_default().insert(page);

        Access::Loaded { frame, evicted }
    }

    fn touch(&mut self, pid: ProcessId, page: u64) -> Access {
        let idx = match self
            .frames
            .iter()
            .position(|item| item.pid == pid && item.page_number == page)
        {
            Some(idx) => idx,
            None => {
                // Index and table disagree; treat the index as stale.
                debug_assert!(false, "owned-page index out of sync");
                return Access::Hit {
                    frame: 0,
                    moved: false,
                };
            }
        };

        if !self.policy.reorders_on_hit() || idx + 1 == self.frames.len() {
            return Access::Hit {
                frame: idx as u64,
                moved: false,
            };
        }

        let item = self.frames.remove(idx);
        self.frames.push(item);
        self.renumber(idx);
        Access::Hit {
            frame: (self.frames.len() - 1) as u64,
            moved: true,
        }
    }

    /// Remove the entry at the front of the table
    fn evict(&mut self) -> Option<MemoryItem> {
        if self.frames.is_empty() {
            return None;
        }
        let victim = self.frames.remove(0);
        self.forget(victim.pid, victim.page_number);
        self.renumber(0);
        Some(victim)
    }

    /// Release every frame owned by `pid`.
    ///
    /// Returns how many frames were freed. A process with no memory is a
    /// no-op.
    pub fn release(&mut self, pid: ProcessId) -> usize {
        if self.owned.remove(&pid).is_none() {
            return 0;
        }
        let before = self.frames.len();
        self.frames.retain(|item| item.pid != pid);
        self.renumber(0);
        before - self.frames.len()
    }

    fn forget(&mut self, pid: ProcessId, page: u64) {
        if let Some(pages) = self.owned.get_mut(&pid) {
            pages.remove(&page);
            if pages.is_empty() {
                self.owned.remove(&pid);
            }
        }
    }

    /// Restore `frame_number == index` from `start` onwards
    fn renumber(&mut self, start: usize) {
        for (idx, item) in self.frames.iter_mut().enumerate().skip(start) {
            item.frame_number = idx as u64;
        }
    }

    /// Frame table, low to high address
    pub fn frames(&self) -> &[MemoryItem] {
        &self.frames
    }

    /// Copy of the frame table, low to high address
    pub fn snapshot(&self) -> MemoryUsage {
        self.frames.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fifo(max_frames: usize) -> MemoryManager {
        MemoryManager::new(max_frames, 256, ReplacementPolicy::Fifo)
    }

    fn pages(mem: &MemoryManager) -> Vec<(u64, u64, u64)> {
        mem.frames()
            .iter()
            .map(|i| (i.page_number, i.frame_number, i.pid.0))
            .collect()
    }

    #[test]
    fn test_page_of() {
        let mem = fifo(4);
        assert_eq!(mem.page_of(0), 0);
        assert_eq!(mem.page_of(255), 0);
        assert_eq!(mem.page_of(256), 1);
        assert_eq!(mem.page_of(1000), 3);
    }

    #[test]
    fn test_miss_loads_into_next_frame() {
        let mut mem = fifo(4);
        assert_eq!(
            mem.access(ProcessId(1), 300),
            Access::Loaded {
                frame: 0,
                evicted: None
            }
        );
        assert_eq!(
            mem.access(ProcessId(1), 0),
            Access::Loaded {
                frame: 1,
                evicted: None
            }
        );
        assert_eq!(pages(&mem), alloc::vec![(1, 0, 1), (0, 1, 1)]);
        assert!(mem.is_resident(ProcessId(1), 0));
        assert!(mem.is_resident(ProcessId(1), 1));
    }

    #[test]
    fn test_hit_does_not_allocate() {
        let mut mem = fifo(4);
        mem.access(ProcessId(1), 10);
        assert_eq!(
            mem.access(ProcessId(1), 20),
            Access::Hit {
                frame: 0,
                moved: false
            }
        );
        assert_eq!(mem.len(), 1);
    }

    #[test]
    fn test_same_page_different_process_is_a_miss() {
        let mut mem = fifo(4);
        mem.access(ProcessId(1), 0);
        assert!(matches!(
            mem.access(ProcessId(2), 0),
            Access::Loaded { frame: 1, .. }
        ));
        assert_eq!(mem.len(), 2);
    }

    #[test]
    fn test_fifo_eviction_keeps_table_dense() {
        let mut mem = fifo(4);
        for page in 0..4 {
            mem.access(ProcessId(2), page * 256);
        }

        let access = mem.access(ProcessId(2), 4 * 256);
        assert_eq!(
            access,
            Access::Loaded {
                frame: 3,
                evicted: Some(MemoryItem {
                    page_number: 0,
                    frame_number: 0,
                    pid: ProcessId(2)
                })
            }
        );
        assert_eq!(
            pages(&mem),
            alloc::vec![(1, 0, 2), (2, 1, 2), (3, 2, 2), (4, 3, 2)]
        );
        assert!(!mem.is_resident(ProcessId(2), 0));
    }

    #[test]
    fn test_fifo_hit_does_not_save_page_from_eviction() {
        let mut mem = fifo(2);
        mem.access(ProcessId(1), 0);
        mem.access(ProcessId(1), 256);
        mem.access(ProcessId(1), 0); // hit on page 0

        mem.access(ProcessId(1), 512);
        assert!(!mem.is_resident(ProcessId(1), 0));
        assert!(mem.is_resident(ProcessId(1), 1));
    }

    #[test]
    fn test_lru_hit_moves_page_to_back() {
        let mut mem = MemoryManager::new(2, 256, ReplacementPolicy::Lru);
        mem.access(ProcessId(1), 0);
        mem.access(ProcessId(1), 256);

        assert_eq!(
            mem.access(ProcessId(1), 0),
            Access::Hit {
                frame: 1,
                moved: true
            }
        );
        assert_eq!(pages(&mem), alloc::vec![(1, 0, 1), (0, 1, 1)]);

        // Page 1 is now least recently used
        mem.access(ProcessId(1), 512);
        assert!(mem.is_resident(ProcessId(1), 0));
        assert!(!mem.is_resident(ProcessId(1), 1));
    }

    #[test]
    fn test_lru_hit_on_most_recent_page_does_not_move() {
        let mut mem = MemoryManager::new(2, 256, ReplacementPolicy::Lru);
        mem.access(ProcessId(1), 0);
        mem.access(ProcessId(1), 256);
        assert_eq!(
            mem.access(ProcessId(1), 300),
            Access::Hit {
                frame: 1,
                moved: false
            }
        );
    }

    #[test]
    fn test_release_removes_only_owner_and_renumbers() {
        let mut mem = fifo(4);
        mem.access(ProcessId(1), 0);
        mem.access(ProcessId(2), 0);
        mem.access(ProcessId(1), 256);
        mem.access(ProcessId(3), 0);

        assert_eq!(mem.release(ProcessId(1)), 2);
        assert_eq!(pages(&mem), alloc::vec![(0, 0, 2), (0, 1, 3)]);
        assert!(mem.pages_of(ProcessId(1)).is_empty());
        assert_eq!(mem.owners().count(), 2);
    }

    #[test]
    fn test_release_without_memory_is_noop() {
        let mut mem = fifo(4);
        mem.access(ProcessId(1), 0);
        assert_eq!(mem.release(ProcessId(7)), 0);
        assert_eq!(mem.len(), 1);
    }

    #[test]
    fn test_eviction_updates_owner_index() {
        let mut mem = fifo(1);
        mem.access(ProcessId(1), 0);
        mem.access(ProcessId(2), 0);

        assert_eq!(mem.owners().collect::<Vec<_>>(), alloc::vec![ProcessId(2)]);
        assert_eq!(mem.release(ProcessId(1)), 0);
    }

    #[test]
    fn test_huge_capacity_allocates_lazily() {
        let mut mem = MemoryManager::new(usize::MAX, 1, ReplacementPolicy::Fifo);
        assert!(mem.is_empty());
        assert_eq!(
            mem.access(ProcessId(1), 5),
            Access::Loaded {
                frame: 0,
                evicted: None
            }
        );
        assert_eq!(mem.len(), 1);
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let mut mem = fifo(2);
        mem.access(ProcessId(1), 0);
        let mut snap = mem.snapshot();
        snap.clear();
        assert_eq!(mem.len(), 1);
    }
}
