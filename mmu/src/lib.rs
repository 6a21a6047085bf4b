//! A paged memory model isolated from any front end.
//!
//! Every process owns a flat virtual address space that is carved into named
//! variables, and a single global page table maps `(pid, virtual page)` pairs
//! to physical frames drawn from one shared pool.
//!
//! | layer               | module              |
//! |---------------------|---------------------|
//! | process directory   | [`manager`]         |
//! | space allocator     | [`process`]         |
//! | page table          | [`page_table`]      |
//! | frame pool          | `frame_allocator`   |
//! | addresses / pages   | [`address`]         |
//! | element widths      | [`data_type`]       |
#![cfg_attr(not(test), no_std)]
#![deny(missing_docs)]
extern crate alloc;

pub mod address;
pub mod config;
pub mod data_type;
mod error;
mod frame_allocator;
mod id;
pub mod manager;
pub mod page_table;
pub mod process;

pub use address::{PhysAddr, PhysPageNum, VirtAddr, VirtPageNum};
pub use config::MmuConfig;
pub use data_type::DataType;
pub use error::{MmuError, MmuResult};
pub use manager::{Mmu, PageTableRow};
pub use process::{Pid, Process, Variable};
