//! Constants and startup parameters of the memory model

use crate::error::{MmuError, MmuResult};

/// 64MiB (64 * 1024 * 1024)
pub const DEFAULT_MEMORY_SIZE: u32 = 0x400_0000;
/// 65536byte == 64KiB, every process gets a stack of this size.
pub const STACK_SIZE: u32 = 0x1_0000;
/// First pid handed out. Everything below is reserved.
pub const PID_BASE: u32 = 1024;

/// Name shared by all unused runs of a process.
pub const FREE_SPACE_NAME: &str = "<FREE_SPACE>";
/// Code segment allocated on process creation.
pub const TEXT_NAME: &str = "<TEXT>";
/// Global variables segment allocated on process creation.
pub const GLOBALS_NAME: &str = "<GLOBALS>";
/// Stack segment allocated on process creation.
pub const STACK_NAME: &str = "<STACK>";

/// Sizes fixed once at startup and immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MmuConfig {
    /// Bytes per page (and per frame).
    pub page_size: u32,
    /// Size of every process' flat virtual address space.
    pub space_size: u32,
    /// Upper bound on the bytes of non-free variables summed over all processes.
    pub physical_memory_size: u32,
}

impl MmuConfig {
    /// Create a configuration with the given page size and 64MiB for both the
    /// virtual space and the physical memory.
    ///
    /// # Errors
    /// `InvalidPageSize` if `page_size` is 0.
    pub fn new(page_size: u32) -> MmuResult<Self> {
        if page_size == 0 {
            return Err(MmuError::InvalidPageSize);
        }
        Ok(Self {
            page_size,
            space_size: DEFAULT_MEMORY_SIZE,
            physical_memory_size: DEFAULT_MEMORY_SIZE,
        })
    }

    /// Replace the virtual space size.
    pub fn with_space_size(mut self, space_size: u32) -> Self {
        self.space_size = space_size;
        self
    }

    /// Replace the physical memory bound.
    pub fn with_physical_memory_size(mut self, physical_memory_size: u32) -> Self {
        self.physical_memory_size = physical_memory_size;
        self
    }
}
