//! ## The global page table
//!
//! One flat table keyed by `(pid, virtual page number)` shared by every
//! process. Frames come from a single pool, so a frame number is unique across
//! the whole table, not only within one process.

use crate::address::{PhysAddr, PhysPageNum, VirtAddr, VirtPageNum};
use crate::error::{MmuError, MmuResult};
use crate::frame_allocator::{FrameAllocator, FrameAllocatorImpl};
use crate::process::Pid;
use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use log::trace;

/// # Page table
///
/// | key                | value        |
/// |--------------------|--------------|
/// | (pid, VirtPageNum) | PhysPageNum  |
///
/// An entry exists while some variable of `pid` covers the page and is never
/// modified in place: it is created by [`PageTable::ensure_mapped`] and destroyed
/// by [`PageTable::remove_entry`] or [`PageTable::remove_all`].
pub struct PageTable {
    page_size: u32,
    /// Ordered by pid then page, which is also the dump order.
    entries: BTreeMap<(Pid, VirtPageNum), PhysPageNum>,
    frames: FrameAllocatorImpl,
}

impl PageTable {
    /// Create an empty table for pages of `page_size` bytes.
    pub fn new(page_size: u32) -> Self {
        assert!(page_size > 0, "page size must be greater than zero");
        Self {
            page_size,
            entries: BTreeMap::new(),
            frames: FrameAllocatorImpl::new(),
        }
    }

    /// Bytes per page.
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Page holding `va`.
    pub fn page_number(&self, va: VirtAddr) -> VirtPageNum {
        va.floor(self.page_size)
    }

    /// Map `(pid, vpn)` to the lowest free frame unless it is mapped already.
    ///
    /// # Return
    /// The frame backing the page.
    pub fn ensure_mapped(&mut self, pid: Pid, vpn: VirtPageNum) -> PhysPageNum {
        if let Some(ppn) = self.entries.get(&(pid, vpn)) {
            return *ppn;
        }
        let ppn = self.frames.alloc();
        trace!("map pid {} {:?} -> {:?}", pid, vpn, ppn);
        self.entries.insert((pid, vpn), ppn);
        ppn
    }

    /// Drop the mapping of `(pid, vpn)` if present, making its frame reusable.
    pub fn remove_entry(&mut self, pid: Pid, vpn: VirtPageNum) {
        if let Some(ppn) = self.entries.remove(&(pid, vpn)) {
            trace!("unmap pid {} {:?} (frees {:?})", pid, vpn, ppn);
            self.frames.dealloc(ppn);
        }
    }

    /// Drop every mapping of `pid`.
    pub fn remove_all(&mut self, pid: Pid) {
        let vpns: Vec<VirtPageNum> = self
            .entries
            .range((pid, VirtPageNum(0))..=(pid, VirtPageNum(u32::MAX)))
            .map(|(&(_, vpn), _)| vpn)
            .collect();
        for vpn in vpns {
            self.remove_entry(pid, vpn);
        }
    }

    /// Frame backing `(pid, vpn)`, or `None` if unmapped.
    pub fn frame(&self, pid: Pid, vpn: VirtPageNum) -> Option<PhysPageNum> {
        self.entries.get(&(pid, vpn)).copied()
    }

    /// Is `(pid, vpn)` mapped?
    pub fn is_mapped(&self, pid: Pid, vpn: VirtPageNum) -> bool {
        self.entries.contains_key(&(pid, vpn))
    }

    /// Translate a virtual address of `pid` into a physical address.
    ///
    /// `PA = frame * page_size + va % page_size`
    ///
    /// # Errors
    /// `UnmappedAddress` if the page holding `va` has no frame.
    pub fn translate(&self, pid: Pid, va: VirtAddr) -> MmuResult<PhysAddr> {
        let vpn = self.page_number(va);
        let ppn = self.frame(pid, vpn).ok_or(MmuError::UnmappedAddress)?;
        Ok(PhysAddr::new(ppn, va.page_offset(self.page_size), self.page_size))
    }

    /// Every entry as `(pid, vpn, frame)`, ordered by pid then page.
    pub fn iter(&self) -> impl Iterator<Item = (Pid, VirtPageNum, PhysPageNum)> + '_ {
        self.entries.iter().map(|(&(pid, vpn), &ppn)| (pid, vpn, ppn))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Is the table empty?
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of frames currently backing some page.
    pub fn frames_in_use(&self) -> usize {
        self.frames.in_use()
    }
}
