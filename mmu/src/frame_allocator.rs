//! Implementation of [`FrameAllocator`] which
//! controls all the frames shared by every process.

use super::PhysPageNum;
use alloc::collections::BTreeSet;

pub(crate) trait FrameAllocator {
    fn new() -> Self;
    fn alloc(&mut self) -> PhysPageNum;
    fn dealloc(&mut self, ppn: PhysPageNum);
}

/// physical page number interval \[ current , ∞ ) has never been allocated
pub(crate) struct LowestFirstFrameAllocator {
    /// First `PhysPageNum` which has never been allocated.
    current: usize,
    /// Frames below `current` that were handed back, kept sorted so the
    /// smallest one is reused first.
    recycled: BTreeSet<usize>,
}

impl FrameAllocator for LowestFirstFrameAllocator {
    fn new() -> Self {
        Self {
            current: 0,
            recycled: BTreeSet::new(),
        }
    }

    /// Allocate a frame.
    ///
    /// # Information
    ///
    /// Internally, it branches into two ways of allocation.
    ///
    /// - Take the smallest recycled frame.
    /// - If there is no recycled frame, hand out `current` and grow the pool.
    ///
    /// Either way the result is the smallest frame number not in use.
    fn alloc(&mut self) -> PhysPageNum {
        if let Some(ppn) = self.recycled.pop_first() {
            ppn.into()
        } else {
            self.current += 1;
            (self.current - 1).into()
        }
    }

    /// Hand `ppn` back to the pool.
    ///
    /// # Panic
    ///
    /// The frame must have been allocated before and must not be freed twice.
    fn dealloc(&mut self, ppn: PhysPageNum) {
        let ppn = ppn.0;
        // validity check
        if ppn >= self.current || self.recycled.contains(&ppn) {
            panic!("Frame ppn={:#x} has not been allocated!", ppn);
        }
        // The top frame shrinks the pool instead of sitting in `recycled`.
        if ppn + 1 == self.current {
            self.current -= 1;
            while let Some(&top) = self.recycled.last() {
                if top + 1 != self.current {
                    break;
                }
                self.recycled.pop_last();
                self.current -= 1;
            }
        } else {
            self.recycled.insert(ppn);
        }
    }
}

impl LowestFirstFrameAllocator {
    /// Number of frames currently handed out.
    pub fn in_use(&self) -> usize {
        self.current - self.recycled.len()
    }
}

pub(crate) type FrameAllocatorImpl = LowestFirstFrameAllocator;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hands_out_increasing_frames() {
        let mut frames = FrameAllocatorImpl::new();
        assert_eq!(frames.alloc(), PhysPageNum(0));
        assert_eq!(frames.alloc(), PhysPageNum(1));
        assert_eq!(frames.alloc(), PhysPageNum(2));
        assert_eq!(frames.in_use(), 3);
    }

    #[test]
    fn reuses_smallest_freed_frame() {
        let mut frames = FrameAllocatorImpl::new();
        for _ in 0..5 {
            frames.alloc();
        }
        frames.dealloc(PhysPageNum(3));
        frames.dealloc(PhysPageNum(1));
        assert_eq!(frames.alloc(), PhysPageNum(1));
        assert_eq!(frames.alloc(), PhysPageNum(3));
        assert_eq!(frames.alloc(), PhysPageNum(5));
    }

    #[test]
    fn freeing_the_top_shrinks_the_pool() {
        let mut frames = FrameAllocatorImpl::new();
        for _ in 0..4 {
            frames.alloc();
        }
        frames.dealloc(PhysPageNum(2));
        frames.dealloc(PhysPageNum(3));
        assert_eq!(frames.in_use(), 2);
        assert_eq!(frames.alloc(), PhysPageNum(2));
        assert_eq!(frames.alloc(), PhysPageNum(3));
    }

    #[test]
    #[should_panic(expected = "has not been allocated")]
    fn double_free_panics() {
        let mut frames = FrameAllocatorImpl::new();
        frames.alloc();
        frames.alloc();
        frames.dealloc(PhysPageNum(0));
        frames.dealloc(PhysPageNum(0));
    }
}
