//! Implementation of physical and virtual address and page number.
//!
//! The page size is chosen at startup, so every conversion between an
//! address and a page number takes it as a parameter.

use core::fmt::{self, Debug, Formatter};

// Definitions

/// # Virtual address
///
/// Byte offset inside a process' flat address space.
///
/// | Meaning | VirtualPageNumber     | PageOffset           |
/// |---------|-----------------------|----------------------|
/// | Value   | `va / page_size`      | `va % page_size`     |
///
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub struct VirtAddr(pub u32);

/// # Physical address
///
/// Byte offset inside physical memory: `frame * page_size + offset`.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub struct PhysAddr(pub usize);

/// # Virtual page number
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub struct VirtPageNum(pub u32);

/// # Physical page number (frame number)
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub struct PhysPageNum(pub usize);

/// Debugging

impl Debug for VirtAddr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("VA:{:#x}", self.0))
    }
}

impl Debug for VirtPageNum {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("VPN:{:#x}", self.0))
    }
}

impl Debug for PhysAddr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("PA:{:#x}", self.0))
    }
}

impl Debug for PhysPageNum {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("PPN:{:#x}", self.0))
    }
}

/// Frame numbers come out of the allocator as raw counters.
impl From<usize> for PhysPageNum {
    fn from(v: usize) -> Self {
        Self(v)
    }
}

impl VirtAddr {
    /// Page holding this address.
    pub fn floor(&self, page_size: u32) -> VirtPageNum {
        VirtPageNum(self.0 / page_size)
    }

    /// Offset of the address inside its page.
    pub fn page_offset(&self, page_size: u32) -> u32 {
        self.0 % page_size
    }
}

impl PhysAddr {
    /// Combine a frame number with the offset inside the page.
    pub fn new(ppn: PhysPageNum, offset: u32, page_size: u32) -> Self {
        Self(ppn.0 * page_size as usize + offset as usize)
    }
}

/// Step to the next value in a [`SimpleRange`].
pub trait StepByOne {
    /// Advance by one.
    fn step(&mut self);
}

impl StepByOne for VirtPageNum {
    fn step(&mut self) {
        self.0 += 1;
    }
}

#[derive(Copy, Clone)]
/// a simple range structure for type T
pub struct SimpleRange<T>
where
    T: StepByOne + Copy + PartialEq + PartialOrd + Debug,
{
    l: T,
    r: T,
}

impl<T> SimpleRange<T>
where
    T: StepByOne + Copy + PartialEq + PartialOrd + Debug,
{
    /// Half-open range `[start, end)`.
    pub fn new(start: T, end: T) -> Self {
        assert!(start <= end, "start {:?} > end {:?}!", start, end);
        Self { l: start, r: end }
    }

    /// Does the range contain `v`?
    pub fn contains(&self, v: T) -> bool {
        self.l <= v && v < self.r
    }
}

impl<T> IntoIterator for SimpleRange<T>
where
    T: StepByOne + Copy + PartialEq + PartialOrd + Debug,
{
    type Item = T;
    type IntoIter = SimpleRangeIterator<T>;
    fn into_iter(self) -> Self::IntoIter {
        SimpleRangeIterator::new(self.l, self.r)
    }
}

/// iterator for the simple range structure
pub struct SimpleRangeIterator<T>
where
    T: StepByOne + Copy + PartialEq + PartialOrd + Debug,
{
    current: T,
    end: T,
}

impl<T> SimpleRangeIterator<T>
where
    T: StepByOne + Copy + PartialEq + PartialOrd + Debug,
{
    /// Iterate `[l, r)`.
    pub fn new(l: T, r: T) -> Self {
        Self { current: l, end: r }
    }
}

impl<T> Iterator for SimpleRangeIterator<T>
where
    T: StepByOne + Copy + PartialEq + PartialOrd + Debug,
{
    type Item = T;
    fn next(&mut self) -> Option<Self::Item> {
        if self.current == self.end {
            None
        } else {
            let t = self.current;
            self.current.step();
            Some(t)
        }
    }
}

/// a simple range structure for virtual page number
pub type VPNRange = SimpleRange<VirtPageNum>;

impl VPNRange {
    /// Pages touched by the byte range `[start, start + size)`.
    ///
    /// An empty byte range touches no page.
    pub fn covering(start: VirtAddr, size: u32, page_size: u32) -> Self {
        if size == 0 {
            let vpn = start.floor(page_size);
            return Self::new(vpn, vpn);
        }
        let end = VirtAddr(start.0 + (size - 1));
        let last = end.floor(page_size);
        Self::new(start.floor(page_size), VirtPageNum(last.0 + 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn split_virtual_address() {
        let va = VirtAddr(65686);
        assert_eq!(va.floor(1024), VirtPageNum(64));
        assert_eq!(va.page_offset(1024), 150);
        assert_eq!(VirtAddr(4096).page_offset(1024), 0);
    }

    #[test]
    fn compose_physical_address() {
        let pa = PhysAddr::new(PhysPageNum(3), 150, 1024);
        assert_eq!(pa, PhysAddr(3222));
        assert_eq!(PhysAddr::new(PhysPageNum(0), 7, 16), PhysAddr(7));
    }

    #[test]
    fn covering_range() {
        let pages: Vec<u32> = VPNRange::covering(VirtAddr(1000), 100, 1024)
            .into_iter()
            .map(|vpn| vpn.0)
            .collect();
        assert_eq!(pages, [0, 1]);

        let pages: Vec<u32> = VPNRange::covering(VirtAddr(1024), 1024, 1024)
            .into_iter()
            .map(|vpn| vpn.0)
            .collect();
        assert_eq!(pages, [1]);

        assert_eq!(VPNRange::covering(VirtAddr(1500), 0, 1024).into_iter().count(), 0);
    }
}
