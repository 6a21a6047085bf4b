//! Process space allocator
//!
//! Every [`Process`] keeps an ordered list of [`Variable`]s whose ranges tile
//! its whole virtual space: real variables are carved from the front of free
//! runs, and freed variables turn back into free runs that are merged with
//! their neighbours.

use crate::address::{VPNRange, VirtAddr, VirtPageNum};
use crate::config::FREE_SPACE_NAME;
use crate::data_type::DataType;
use crate::error::{MmuError, MmuResult};
use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;

/// Process identifier
pub type Pid = u32;

/// A named byte range inside a process' virtual space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    /// Unique within the process, except for the free-space name.
    pub name: String,
    /// Element type; `FreeSpace` for unused runs.
    pub data_type: DataType,
    /// First byte of the range.
    pub virtual_address: VirtAddr,
    /// Length of the range in bytes.
    pub size: u32,
}

impl Variable {
    fn free_run(virtual_address: VirtAddr, size: u32) -> Self {
        Self {
            name: FREE_SPACE_NAME.to_string(),
            data_type: DataType::FreeSpace,
            virtual_address,
            size,
        }
    }

    /// Is this an unused run?
    pub fn is_free(&self) -> bool {
        self.data_type == DataType::FreeSpace
    }

    /// One past the last byte.
    pub fn end(&self) -> u32 {
        self.virtual_address.0 + self.size
    }

    /// Number of elements of `data_type` held.
    pub fn element_count(&self) -> u32 {
        self.size / self.data_type.element_width()
    }

    /// Pages touched by the variable.
    pub fn pages(&self, page_size: u32) -> VPNRange {
        VPNRange::covering(self.virtual_address, self.size, page_size)
    }
}

/// A process and the variables tiling its address space.
#[derive(Debug, Clone)]
pub struct Process {
    pid: Pid,
    space_size: u32,
    /// Insertion order, which is also the listing order.
    variables: Vec<Variable>,
}

impl Process {
    /// A process whose whole space is a single free run.
    pub fn new(pid: Pid, space_size: u32) -> Self {
        let variables = if space_size == 0 {
            Vec::new()
        } else {
            vec![Variable::free_run(VirtAddr(0), space_size)]
        };
        Self {
            pid,
            space_size,
            variables,
        }
    }

    /// Process id
    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// Size of the virtual space in bytes.
    pub fn space_size(&self) -> u32 {
        self.space_size
    }

    /// Every entry, free runs included, in insertion order.
    pub fn entries(&self) -> &[Variable] {
        &self.variables
    }

    /// User-visible variables in insertion order.
    pub fn variables(&self) -> impl Iterator<Item = &Variable> + '_ {
        self.variables.iter().filter(|v| !v.is_free())
    }

    /// Free runs in insertion order.
    pub fn free_runs(&self) -> impl Iterator<Item = &Variable> + '_ {
        self.variables.iter().filter(|v| v.is_free())
    }

    /// Look up a user-visible variable. Free runs are never returned.
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables().find(|v| v.name == name)
    }

    fn position_of(&self, name: &str) -> Option<usize> {
        self.variables
            .iter()
            .position(|v| !v.is_free() && v.name == name)
    }

    /// Bytes held by user-visible variables.
    pub fn committed(&self) -> u64 {
        self.variables().map(|v| v.size as u64).sum()
    }

    /// Bytes in free runs.
    pub fn free_bytes(&self) -> u64 {
        self.free_runs().map(|v| v.size as u64).sum()
    }

    /// Lowest-addressed free run holding at least `size` bytes.
    fn first_fit(&self, size: u32) -> Option<usize> {
        self.variables
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_free() && v.size >= size)
            .min_by_key(|(_, v)| v.virtual_address)
            .map(|(idx, _)| idx)
    }

    /// Check that `name` can be given to a new variable.
    ///
    /// # Errors
    /// - `ReservedName` for the free-space name
    /// - `NameAlreadyExists` if a variable already uses `name`
    pub fn check_name(&self, name: &str) -> MmuResult<()> {
        if name == FREE_SPACE_NAME {
            return Err(MmuError::ReservedName);
        }
        if self.position_of(name).is_some() {
            return Err(MmuError::NameAlreadyExists);
        }
        Ok(())
    }

    /// Check that some free run holds `size` bytes.
    ///
    /// # Errors
    /// `InsufficientContiguousSpace` if no free run is large enough.
    pub fn check_fit(&self, size: u32) -> MmuResult<()> {
        self.first_fit(size)
            .map(|_| ())
            .ok_or(MmuError::InsufficientContiguousSpace)
    }

    /// Carve a variable from the front of the first free run large enough.
    ///
    /// # Return
    /// The virtual address of the new variable.
    ///
    /// # Errors
    /// Same as [`Process::check_name`] then [`Process::check_fit`]; nothing
    /// changes on failure.
    pub fn carve(&mut self, name: &str, data_type: DataType, size: u32) -> MmuResult<VirtAddr> {
        self.check_name(name)?;
        let idx = self
            .first_fit(size)
            .ok_or(MmuError::InsufficientContiguousSpace)?;

        let run = &mut self.variables[idx];
        let virtual_address = run.virtual_address;
        run.virtual_address = VirtAddr(run.virtual_address.0 + size);
        run.size -= size;
        if run.size == 0 {
            self.variables.remove(idx);
        }

        self.variables.push(Variable {
            name: name.to_string(),
            data_type,
            virtual_address,
            size,
        });
        Ok(virtual_address)
    }

    /// Turn a variable back into free space and merge it with the free runs
    /// directly before and after it.
    ///
    /// # Return
    /// The variable as it was before being released.
    ///
    /// # Errors
    /// `VariableNotFound` if no user-visible variable is called `name`.
    pub fn release(&mut self, name: &str) -> MmuResult<Variable> {
        let idx = self.position_of(name).ok_or(MmuError::VariableNotFound)?;
        let freed = self.variables[idx].clone();
        if freed.size == 0 {
            // An empty range leaves nothing to give back.
            self.variables.remove(idx);
            return Ok(freed);
        }

        self.variables[idx] = Variable::free_run(freed.virtual_address, freed.size);
        let mut idx = idx;

        // merge with the run ending where the freed range starts
        if let Some(before) = self
            .variables
            .iter()
            .position(|v| v.is_free() && v.end() == freed.virtual_address.0)
        {
            let size = self.variables[idx].size;
            self.variables[before].size += size;
            self.variables.remove(idx);
            idx = if before > idx { before - 1 } else { before };
        }

        // merge with the run starting where the freed range ends
        if let Some(after) = self
            .variables
            .iter()
            .position(|v| v.is_free() && v.virtual_address.0 == freed.end())
        {
            let size = self.variables[after].size;
            self.variables[idx].size += size;
            self.variables.remove(after);
        }

        Ok(freed)
    }

    /// Is any non-empty user-visible variable touching page `vpn`?
    pub fn covers_page(&self, vpn: VirtPageNum, page_size: u32) -> bool {
        self.variables()
            .any(|v| v.pages(page_size).contains(vpn))
    }

    /// Pages touched by user-visible variables, ascending and without duplicates.
    pub fn covered_pages(&self, page_size: u32) -> Vec<VirtPageNum> {
        let mut pages: Vec<VirtPageNum> = self
            .variables()
            .flat_map(|v| v.pages(page_size))
            .collect();
        pages.sort_unstable();
        pages.dedup();
        pages
    }
}
