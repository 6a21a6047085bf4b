use core::fmt::{self, Display, Formatter};

/// Failures reported by the memory model.
///
/// None of them is fatal: the state is left exactly as it was before the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MmuError {
    /// No live process has the requested pid.
    ProcessNotFound,
    /// The process has no variable with the requested name.
    VariableNotFound,
    /// A variable with the same name already exists in the process.
    NameAlreadyExists,
    /// The name is used internally for free runs.
    ReservedName,
    /// The allocation would exceed the physical memory shared by all processes.
    OutOfMemory,
    /// No single free run of the process is large enough.
    InsufficientContiguousSpace,
    /// The virtual page holding the address has no frame.
    UnmappedAddress,
    /// The element index lies past the end of the variable.
    IndexOutOfBounds,
    /// Page size must be greater than zero.
    InvalidPageSize,
}

impl Display for MmuError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::ProcessNotFound => "process not found",
            Self::VariableNotFound => "variable not found",
            Self::NameAlreadyExists => "variable already exists",
            Self::ReservedName => "variable name is reserved",
            Self::OutOfMemory => "allocation exceeds system memory",
            Self::InsufficientContiguousSpace => "no free space large enough in process",
            Self::UnmappedAddress => "virtual address is not mapped",
            Self::IndexOutOfBounds => "index out of range",
            Self::InvalidPageSize => "page size must be greater than zero",
        };
        f.write_str(msg)
    }
}

/// Result alias used throughout the crate.
pub type MmuResult<T> = Result<T, MmuError>;
