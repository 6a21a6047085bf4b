use std::fmt::{self, Display, Formatter};
use std::io;

use mmu::MmuError;

/// Everything a command can fail with. None of them ends the session.
#[derive(Debug)]
pub enum ShellError {
    /// Rejected by the memory model.
    Mmu(MmuError),
    /// First token is not a command.
    UnknownCommand,
    /// Wrong number or shape of arguments; holds the expected form.
    Usage(&'static str),
    /// A token could not be read as the expected kind of value.
    Parse(String),
    /// Writing the output failed.
    Io(io::Error),
}

impl Display for ShellError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mmu(e) => write!(f, "{}", e),
            Self::UnknownCommand => f.write_str("command not recognized"),
            Self::Usage(form) => write!(f, "usage: {}", form),
            Self::Parse(token) => write!(f, "invalid value \"{}\"", token),
            Self::Io(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ShellError {}

impl From<MmuError> for ShellError {
    fn from(e: MmuError) -> Self {
        Self::Mmu(e)
    }
}

impl From<io::Error> for ShellError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

pub type ShellResult<T> = Result<T, ShellError>;
