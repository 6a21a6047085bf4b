//!Implementation of the process directory [`Mmu`]
//!
//! `Mmu` owns the live processes together with the global [`PageTable`], so
//! that every operation updates both as one unit: a request that fails leaves
//! neither of them changed.

use crate::address::{PhysAddr, PhysPageNum, VPNRange, VirtAddr, VirtPageNum};
use crate::config::{MmuConfig, GLOBALS_NAME, STACK_NAME, STACK_SIZE, TEXT_NAME};
use crate::data_type::DataType;
use crate::error::{MmuError, MmuResult};
use crate::id::PidAllocator;
use crate::page_table::PageTable;
use crate::process::{Pid, Process, Variable};
use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use log::debug;

/// One line of the page table dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTableRow {
    /// Owning process
    pub pid: Pid,
    /// Virtual page of that process
    pub vpn: VirtPageNum,
    /// Frame backing the page
    pub ppn: PhysPageNum,
}

/// # Process directory
///
/// | Field       | Role                                            |
/// |-------------|-------------------------------------------------|
/// | config      | page size, space size, physical memory bound    |
/// | processes   | pid -> [`Process`], ordered by pid              |
/// | page_table  | `(pid, vpn)` -> frame, shared by every process  |
/// | pids        | monotonic pid counter, never reuses an id       |
pub struct Mmu {
    config: MmuConfig,
    processes: BTreeMap<Pid, Process>,
    page_table: PageTable,
    pids: PidAllocator,
}

impl Mmu {
    /// Build an empty model.
    ///
    /// # Errors
    /// `InvalidPageSize` if the configured page size is 0.
    pub fn new(config: MmuConfig) -> MmuResult<Self> {
        if config.page_size == 0 {
            return Err(MmuError::InvalidPageSize);
        }
        Ok(Self {
            config,
            processes: BTreeMap::new(),
            page_table: PageTable::new(config.page_size),
            pids: PidAllocator::new(),
        })
    }

    /// Startup parameters.
    pub fn config(&self) -> &MmuConfig {
        &self.config
    }

    /// Bytes per page.
    pub fn page_size(&self) -> u32 {
        self.config.page_size
    }

    /// The global page table.
    pub fn page_table(&self) -> &PageTable {
        &self.page_table
    }

    /// Look up a live process.
    pub fn process(&self, pid: Pid) -> MmuResult<&Process> {
        self.processes.get(&pid).ok_or(MmuError::ProcessNotFound)
    }

    /// Is `pid` alive?
    pub fn process_exists(&self, pid: Pid) -> bool {
        self.processes.contains_key(&pid)
    }

    /// Bytes of user-visible variables summed over every process.
    pub fn committed(&self) -> u64 {
        self.processes.values().map(Process::committed).sum()
    }

    /// Admission control against the physical memory shared by all processes.
    fn admit(&self, size: u64) -> MmuResult<()> {
        if self.committed() + size > self.config.physical_memory_size as u64 {
            return Err(MmuError::OutOfMemory);
        }
        Ok(())
    }

    /// Create a process with its code, globals and stack segments.
    ///
    /// # Parameters
    /// - `text_size`: bytes of the code segment
    /// - `globals_size`: bytes of the global variables segment
    ///
    /// The stack is always `STACK_SIZE` bytes.
    ///
    /// # Return
    /// The new pid.
    ///
    /// # Errors
    /// `OutOfMemory` or `InsufficientContiguousSpace` when the three segments
    /// do not fit. No pid is consumed in that case.
    pub fn create_process(&mut self, text_size: u32, globals_size: u32) -> MmuResult<Pid> {
        let required = text_size as u64 + globals_size as u64 + STACK_SIZE as u64;
        self.admit(required)?;
        if required > self.config.space_size as u64 {
            return Err(MmuError::InsufficientContiguousSpace);
        }

        let pid = self.pids.alloc();
        self.processes
            .insert(pid, Process::new(pid, self.config.space_size));
        debug!("create process {}", pid);

        self.allocate(pid, TEXT_NAME, DataType::Char, text_size)?;
        self.allocate(pid, GLOBALS_NAME, DataType::Char, globals_size)?;
        self.allocate(pid, STACK_NAME, DataType::Char, STACK_SIZE)?;
        Ok(pid)
    }

    /// Allocate `count` elements of `data_type` in process `pid`.
    ///
    /// Every page the new variable touches gets a frame.
    ///
    /// # Return
    /// The virtual address of the variable.
    ///
    /// # Errors
    /// - `ProcessNotFound`
    /// - `NameAlreadyExists`, `ReservedName`
    /// - `OutOfMemory` if the bytes of all processes would exceed physical memory
    /// - `InsufficientContiguousSpace` if no free run of the process is large enough
    pub fn allocate(
        &mut self,
        pid: Pid,
        name: &str,
        data_type: DataType,
        count: u32,
    ) -> MmuResult<VirtAddr> {
        let size = data_type.size_of(count)?;
        let process = self.process(pid)?;
        process.check_name(name)?;
        self.admit(size as u64)?;
        process.check_fit(size)?;

        let process = self
            .processes
            .get_mut(&pid)
            .ok_or(MmuError::ProcessNotFound)?;
        let va = process.carve(name, data_type, size)?;
        for vpn in VPNRange::covering(va, size, self.config.page_size) {
            self.page_table.ensure_mapped(pid, vpn);
        }
        debug!(
            "allocate pid {} {} {}x{} at {:?} ({} bytes)",
            pid, name, data_type, count, va, size
        );
        Ok(va)
    }

    /// Free variable `name` of process `pid`.
    ///
    /// Pages no longer touched by any variable of the process lose their frame.
    ///
    /// # Errors
    /// `ProcessNotFound`, `VariableNotFound`
    pub fn free(&mut self, pid: Pid, name: &str) -> MmuResult<()> {
        let process = self
            .processes
            .get_mut(&pid)
            .ok_or(MmuError::ProcessNotFound)?;
        let freed = process.release(name)?;
        let page_size = self.config.page_size;
        for vpn in freed.pages(page_size) {
            if !process.covers_page(vpn, page_size) {
                self.page_table.remove_entry(pid, vpn);
            }
        }
        debug!(
            "free pid {} {} at {:?} ({} bytes)",
            pid, name, freed.virtual_address, freed.size
        );
        Ok(())
    }

    /// Terminate process `pid`, dropping its variables and page table entries.
    ///
    /// # Errors
    /// `ProcessNotFound`
    pub fn terminate(&mut self, pid: Pid) -> MmuResult<()> {
        self.processes
            .remove(&pid)
            .ok_or(MmuError::ProcessNotFound)?;
        self.page_table.remove_all(pid);
        debug!("terminate process {}", pid);
        Ok(())
    }

    /// Translate a virtual address of `pid` into a physical address.
    ///
    /// # Errors
    /// `UnmappedAddress` if the page is not mapped, which includes unknown pids.
    pub fn resolve(&self, pid: Pid, va: VirtAddr) -> MmuResult<PhysAddr> {
        self.page_table.translate(pid, va)
    }

    /// User-visible variable `name` of `pid`.
    pub fn variable(&self, pid: Pid, name: &str) -> Option<&Variable> {
        self.processes.get(&pid)?.variable(name)
    }

    /// Virtual address of element `index` of variable `name`.
    ///
    /// # Errors
    /// `ProcessNotFound`, `VariableNotFound`, or `IndexOutOfBounds` when the
    /// variable holds no more than `index` elements.
    pub fn element_address(&self, pid: Pid, name: &str, index: u32) -> MmuResult<VirtAddr> {
        let variable = self
            .process(pid)?
            .variable(name)
            .ok_or(MmuError::VariableNotFound)?;
        if index >= variable.element_count() {
            return Err(MmuError::IndexOutOfBounds);
        }
        let offset = index * variable.data_type.element_width();
        Ok(VirtAddr(variable.virtual_address.0 + offset))
    }

    /// Live pids in ascending (creation) order.
    pub fn list_processes(&self) -> Vec<Pid> {
        self.processes.keys().copied().collect()
    }

    /// User-visible variables of `pid` in allocation order.
    ///
    /// # Errors
    /// `ProcessNotFound`
    pub fn list_variables(&self, pid: Pid) -> MmuResult<Vec<Variable>> {
        Ok(self.process(pid)?.variables().cloned().collect())
    }

    /// Every page table entry ordered by pid then page.
    pub fn dump_page_table(&self) -> Vec<PageTableRow> {
        self.page_table
            .iter()
            .map(|(pid, vpn, ppn)| PageTableRow { pid, vpn, ppn })
            .collect()
    }

    /// Iterate over the live processes in pid order.
    pub fn processes(&self) -> impl Iterator<Item = &Process> + '_ {
        self.processes.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn mmu(page_size: u32) -> Mmu {
        Mmu::new(MmuConfig::new(page_size).unwrap()).unwrap()
    }

    #[test]
    fn create_process_lays_out_segments() {
        let mut mmu = mmu(1024);
        let pid = mmu.create_process(100, 50).unwrap();
        assert_eq!(pid, 1024);

        let names: Vec<(String, u32, u32)> = mmu
            .list_variables(pid)
            .unwrap()
            .into_iter()
            .map(|v| (v.name, v.virtual_address.0, v.size))
            .collect();
        assert_eq!(
            names,
            vec![
                ("<TEXT>".to_string(), 0, 100),
                ("<GLOBALS>".to_string(), 100, 50),
                ("<STACK>".to_string(), 150, 65536),
            ]
        );
        // 65686 bytes touch pages 0..=64
        assert_eq!(mmu.page_table().len(), 65);
    }

    #[test]
    fn allocate_scenario() {
        let mut mmu = mmu(1024);
        let pid = mmu.create_process(100, 50).unwrap();
        let va = mmu.allocate(pid, "x", DataType::Int, 10).unwrap();
        assert_eq!(va, VirtAddr(65686));
        assert!(mmu.page_table().is_mapped(pid, VirtPageNum(64)));

        // page 64 is shared with the stack, so it survives the free
        mmu.free(pid, "x").unwrap();
        assert!(mmu.variable(pid, "x").is_none());
        assert!(mmu.page_table().is_mapped(pid, VirtPageNum(64)));
        let free: Vec<_> = mmu
            .process(pid)
            .unwrap()
            .free_runs()
            .map(|v| (v.virtual_address.0, v.size))
            .collect();
        assert_eq!(free, vec![(65686, 67108864 - 65686)]);
    }

    #[test]
    fn free_releases_pages_only_it_touched() {
        let mut mmu = mmu(1024);
        let pid = mmu.create_process(100, 50).unwrap();
        mmu.allocate(pid, "big", DataType::Char, 4096).unwrap();
        // 65686 .. 69782 touches pages 64..=68
        assert!(mmu.page_table().is_mapped(pid, VirtPageNum(68)));
        mmu.free(pid, "big").unwrap();
        for vpn in 65..=68 {
            assert!(!mmu.page_table().is_mapped(pid, VirtPageNum(vpn)));
        }
        assert!(mmu.page_table().is_mapped(pid, VirtPageNum(64)));
    }

    #[test]
    fn terminate_removes_everything() {
        let mut mmu = mmu(1024);
        let first = mmu.create_process(100, 50).unwrap();
        let second = mmu.create_process(2048, 0).unwrap();
        mmu.allocate(first, "x", DataType::Int, 10).unwrap();
        mmu.terminate(first).unwrap();

        assert_eq!(mmu.list_processes(), vec![second]);
        assert!(mmu.dump_page_table().iter().all(|row| row.pid == second));
        assert_eq!(mmu.terminate(first), Err(MmuError::ProcessNotFound));

        // pids are never reused
        assert_eq!(mmu.create_process(100, 0), Ok(1026));
    }

    #[test]
    fn failing_create_consumes_no_pid() {
        let config = MmuConfig::new(1024)
            .unwrap()
            .with_physical_memory_size(70000);
        let mut mmu = Mmu::new(config).unwrap();
        assert_eq!(mmu.create_process(100, 0), Ok(1024));
        assert_eq!(mmu.create_process(100, 0), Err(MmuError::OutOfMemory));
        assert_eq!(mmu.list_processes(), vec![1024]);
        mmu.terminate(1024).unwrap();
        assert_eq!(mmu.create_process(100, 0), Ok(1025));
    }

    #[test]
    fn admission_control_spans_processes() {
        let config = MmuConfig::new(1024)
            .unwrap()
            .with_physical_memory_size(2 * 65536 + 1000);
        let mut mmu = Mmu::new(config).unwrap();
        let a = mmu.create_process(0, 0).unwrap();
        let b = mmu.create_process(0, 0).unwrap();
        mmu.allocate(a, "x", DataType::Char, 600).unwrap();
        let before = mmu.dump_page_table();
        assert_eq!(
            mmu.allocate(b, "y", DataType::Char, 401),
            Err(MmuError::OutOfMemory)
        );
        assert_eq!(mmu.dump_page_table(), before);
        assert!(mmu.variable(b, "y").is_none());
        assert!(mmu.allocate(b, "y", DataType::Char, 400).is_ok());
    }

    #[test]
    fn out_of_memory_is_reported_before_missing_space() {
        let config = MmuConfig::new(1024)
            .unwrap()
            .with_space_size(66000)
            .with_physical_memory_size(70000);
        let mut mmu = Mmu::new(config).unwrap();
        let pid = mmu.create_process(0, 0).unwrap();
        // 464 bytes left in the space and 4464 in physical memory
        assert_eq!(
            mmu.allocate(pid, "big", DataType::Char, 5000),
            Err(MmuError::OutOfMemory)
        );
        assert_eq!(
            mmu.allocate(pid, "mid", DataType::Char, 1000),
            Err(MmuError::InsufficientContiguousSpace)
        );
        // name checks still come first
        assert_eq!(
            mmu.allocate(pid, "<STACK>", DataType::Char, 5000),
            Err(MmuError::NameAlreadyExists)
        );
        assert!(mmu.allocate(pid, "small", DataType::Char, 464).is_ok());
    }

    #[test]
    fn allocate_errors() {
        let mut mmu = mmu(1024);
        let pid = mmu.create_process(100, 50).unwrap();
        assert_eq!(
            mmu.allocate(7, "x", DataType::Int, 1),
            Err(MmuError::ProcessNotFound)
        );
        mmu.allocate(pid, "x", DataType::Int, 1).unwrap();
        assert_eq!(
            mmu.allocate(pid, "x", DataType::Int, 1),
            Err(MmuError::NameAlreadyExists)
        );
        assert_eq!(mmu.free(pid, "nope"), Err(MmuError::VariableNotFound));
        assert_eq!(mmu.free(9, "x"), Err(MmuError::ProcessNotFound));
    }

    #[test]
    fn resolve_and_element_address() {
        let mut mmu = mmu(1024);
        let pid = mmu.create_process(100, 50).unwrap();
        mmu.allocate(pid, "x", DataType::Int, 10).unwrap();

        let third = mmu.element_address(pid, "x", 2).unwrap();
        assert_eq!(third, VirtAddr(65694));
        let frame = mmu.page_table().frame(pid, VirtPageNum(64)).unwrap();
        assert_eq!(
            mmu.resolve(pid, third),
            Ok(PhysAddr(frame.0 * 1024 + (65694 % 1024)))
        );
        assert_eq!(
            mmu.element_address(pid, "x", 10),
            Err(MmuError::IndexOutOfBounds)
        );
        assert_eq!(
            mmu.element_address(pid, "<FREE_SPACE>", 0),
            Err(MmuError::VariableNotFound)
        );
        assert_eq!(
            mmu.resolve(pid, VirtAddr(200_000)),
            Err(MmuError::UnmappedAddress)
        );
    }
}
