//! Executes parsed commands against the model and physical memory.

use std::io::Write;

use log::info;
use mmu::{DataType, Mmu, Pid, VirtAddr};

use crate::command::{split, Command, PrintTarget};
use crate::error::{ShellError, ShellResult};
use crate::memory::PhysicalMemory;
use crate::value::Value;

/// Elements shown by `print <pid>:<name>` before the rest is summarised.
const PRINT_ELEMENTS: u32 = 4;

/// Should the prompt loop keep going?
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub struct Shell {
    mmu: Mmu,
    memory: PhysicalMemory,
}

impl Shell {
    pub fn new(mmu: Mmu, memory: PhysicalMemory) -> Self {
        Self { mmu, memory }
    }

    /// Tokenize, parse and run one input line, writing its output to `out`.
    pub fn execute_line(&mut self, line: &str, out: &mut impl Write) -> ShellResult<Flow> {
        match Command::parse(&split(line, ' '))? {
            Some(command) => self.execute(command, out),
            None => Ok(Flow::Continue),
        }
    }

    pub fn execute(&mut self, command: Command, out: &mut impl Write) -> ShellResult<Flow> {
        match command {
            Command::Create {
                text_size,
                data_size,
            } => {
                let pid = self.mmu.create_process(text_size, data_size)?;
                writeln!(out, "{}", pid)?;
            }
            Command::Allocate {
                pid,
                name,
                data_type,
                count,
            } => {
                let va = self.mmu.allocate(pid, &name, data_type, count)?;
                writeln!(out, "{}", va.0)?;
            }
            Command::Set {
                pid,
                name,
                offset,
                values,
            } => self.set(pid, &name, offset, &values)?,
            Command::Print(target) => self.print(target, out)?,
            Command::Free { pid, name } => self.mmu.free(pid, &name)?,
            Command::Terminate { pid } => self.mmu.terminate(pid)?,
            Command::Exit => return Ok(Flow::Exit),
        }
        Ok(Flow::Continue)
    }

    /// Store `values` into consecutive elements of a variable starting at
    /// element `offset`.
    ///
    /// Every value and address is checked before the first byte is written.
    fn set(&mut self, pid: Pid, name: &str, offset: u32, values: &[String]) -> ShellResult<()> {
        let data_type = self
            .mmu
            .process(pid)?
            .variable(name)
            .ok_or(mmu::MmuError::VariableNotFound)?
            .data_type;

        let mut writes = Vec::with_capacity(values.len());
        for (i, text) in values.iter().enumerate() {
            let value = Value::parse(data_type, text)?;
            let index = offset
                .checked_add(i as u32)
                .ok_or(mmu::MmuError::IndexOutOfBounds)?;
            let va = self.mmu.element_address(pid, name, index)?;
            writes.push((va, value));
        }

        let mut resolved = Vec::new();
        for (va, value) in writes {
            for (i, byte) in value.to_bytes().into_iter().enumerate() {
                let pa = self.mmu.resolve(pid, VirtAddr(va.0 + i as u32))?;
                resolved.push((pa, byte));
            }
        }
        for (pa, byte) in resolved {
            self.memory.write(pa, byte);
        }
        info!("set {} element(s) of {}:{}", values.len(), pid, name);
        Ok(())
    }

    /// Read element `index` of a variable.
    fn load(&self, pid: Pid, name: &str, data_type: DataType, index: u32) -> ShellResult<Value> {
        let va = self.mmu.element_address(pid, name, index)?;
        let mut bytes = Vec::with_capacity(data_type.element_width() as usize);
        for i in 0..data_type.element_width() {
            let pa = self.mmu.resolve(pid, VirtAddr(va.0 + i))?;
            bytes.push(self.memory.read(pa));
        }
        Value::from_bytes(data_type, &bytes).ok_or_else(|| ShellError::Parse(data_type.to_string()))
    }

    fn print(&self, target: PrintTarget, out: &mut impl Write) -> ShellResult<()> {
        match target {
            PrintTarget::Mmu => {
                writeln!(out, " PID  | Variable Name | Virtual Addr | Size")?;
                writeln!(out, "------+---------------+--------------+------------")?;
                for process in self.mmu.processes() {
                    for variable in process.variables() {
                        writeln!(
                            out,
                            " {:>4} | {:<13} |   0x{:08X} | {:>10} ",
                            process.pid(),
                            variable.name,
                            variable.virtual_address.0,
                            variable.size
                        )?;
                    }
                }
            }
            PrintTarget::Page => {
                writeln!(out, " PID  | Page Number | Frame Number")?;
                writeln!(out, "------+-------------+--------------")?;
                for row in self.mmu.dump_page_table() {
                    writeln!(out, " {:>4} | {:>11} | {:>12} ", row.pid, row.vpn.0, row.ppn.0)?;
                }
            }
            PrintTarget::Processes => {
                for pid in self.mmu.list_processes() {
                    writeln!(out, "{}", pid)?;
                }
            }
            PrintTarget::Variable { pid, name } => {
                let variable = self
                    .mmu
                    .process(pid)?
                    .variable(&name)
                    .ok_or(mmu::MmuError::VariableNotFound)?;
                let data_type = variable.data_type;
                let count = variable.element_count();

                let shown = count.min(PRINT_ELEMENTS);
                let mut items = Vec::with_capacity(shown as usize);
                for index in 0..shown {
                    items.push(self.load(pid, &name, data_type, index)?.to_string());
                }
                if count > PRINT_ELEMENTS {
                    items.push(format!("... [{} items]", count));
                }
                writeln!(out, "{}", items.join(", "))?;
            }
        }
        Ok(())
    }
}
