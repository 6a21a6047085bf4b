//! The physical memory the page table points into.
//!
//! The model itself never touches bytes: only the shell reads and writes
//! values here, one resolved physical address at a time.
//!
//! Frames are handed out per page while admission counts bytes, so the
//! highest frame number can reach past `physical_memory_size / page_size`.
//! The buffer therefore grows up to the highest byte ever written.

use mmu::PhysAddr;

/// Zero-initialised byte buffer standing in for RAM.
pub struct PhysicalMemory {
    data: Vec<u8>,
}

impl PhysicalMemory {
    /// Reserve room for `size` bytes up front.
    pub fn new(size: usize) -> Self {
        Self {
            data: Vec::with_capacity(size),
        }
    }

    /// Read one byte. Bytes never written read as zero.
    pub fn read(&self, pa: PhysAddr) -> u8 {
        self.data.get(pa.0).copied().unwrap_or(0)
    }

    /// Write one byte, backing every address up to `pa` first.
    pub fn write(&mut self, pa: PhysAddr, value: u8) {
        if pa.0 >= self.data.len() {
            self.data.resize(pa.0 + 1, 0);
        }
        self.data[pa.0] = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_zeroed() {
        let memory = PhysicalMemory::new(64);
        assert_eq!(memory.read(PhysAddr(0)), 0);
        assert_eq!(memory.read(PhysAddr(63)), 0);
    }

    #[test]
    fn read_back_what_was_written() {
        let mut memory = PhysicalMemory::new(64);
        memory.write(PhysAddr(10), 0xab);
        assert_eq!(memory.read(PhysAddr(10)), 0xab);
        assert_eq!(memory.read(PhysAddr(9)), 0);
    }

    #[test]
    fn grows_past_the_reserved_size() {
        let mut memory = PhysicalMemory::new(64);
        memory.write(PhysAddr(200), 7);
        assert_eq!(memory.read(PhysAddr(200)), 7);
        assert_eq!(memory.read(PhysAddr(150)), 0);
        assert_eq!(memory.read(PhysAddr(1000)), 0);
    }
}
