//! Element types a variable can hold and their byte widths.

use core::fmt::{self, Display, Formatter};
use core::str::FromStr;

use crate::error::{MmuError, MmuResult};

/// Tag of a variable.
///
/// `FreeSpace` is bookkeeping only and never names a user variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Unused run of bytes.
    FreeSpace,
    /// 1 byte
    Char,
    /// 2 bytes
    Short,
    /// 4 bytes
    Int,
    /// 4 bytes
    Float,
    /// 8 bytes
    Long,
    /// 8 bytes
    Double,
}

impl DataType {
    /// Width in bytes of a single element.
    ///
    /// | type            | bytes |
    /// |-----------------|-------|
    /// | char, free      | 1     |
    /// | short           | 2     |
    /// | int, float      | 4     |
    /// | long, double    | 8     |
    pub const fn element_width(self) -> u32 {
        match self {
            Self::FreeSpace | Self::Char => 1,
            Self::Short => 2,
            Self::Int | Self::Float => 4,
            Self::Long | Self::Double => 8,
        }
    }

    /// Bytes needed for `count` elements.
    ///
    /// # Errors
    /// `OutOfMemory` when the product does not fit in the 32-bit address space.
    pub fn size_of(self, count: u32) -> MmuResult<u32> {
        self.element_width()
            .checked_mul(count)
            .ok_or(MmuError::OutOfMemory)
    }

    /// Lowercase name as typed in commands.
    pub const fn name(self) -> &'static str {
        match self {
            Self::FreeSpace => "free",
            Self::Char => "char",
            Self::Short => "short",
            Self::Int => "int",
            Self::Float => "float",
            Self::Long => "long",
            Self::Double => "double",
        }
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when text does not name a user-visible type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownDataType;

impl Display for UnknownDataType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("unknown data type")
    }
}

impl FromStr for DataType {
    type Err = UnknownDataType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ty = if s.eq_ignore_ascii_case("char") {
            Self::Char
        } else if s.eq_ignore_ascii_case("short") {
            Self::Short
        } else if s.eq_ignore_ascii_case("int") {
            Self::Int
        } else if s.eq_ignore_ascii_case("float") {
            Self::Float
        } else if s.eq_ignore_ascii_case("long") {
            Self::Long
        } else if s.eq_ignore_ascii_case("double") {
            Self::Double
        } else {
            return Err(UnknownDataType);
        };
        Ok(ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widths() {
        assert_eq!(DataType::Char.element_width(), 1);
        assert_eq!(DataType::Short.element_width(), 2);
        assert_eq!(DataType::Int.element_width(), 4);
        assert_eq!(DataType::Float.element_width(), 4);
        assert_eq!(DataType::Long.element_width(), 8);
        assert_eq!(DataType::Double.element_width(), 8);
    }

    #[test]
    fn size_of_detects_overflow() {
        assert_eq!(DataType::Int.size_of(10), Ok(40));
        assert_eq!(DataType::Double.size_of(u32::MAX), Err(MmuError::OutOfMemory));
    }

    #[test]
    fn parse_is_case_insensitive_and_rejects_free() {
        assert_eq!("Int".parse::<DataType>(), Ok(DataType::Int));
        assert_eq!("DOUBLE".parse::<DataType>(), Ok(DataType::Double));
        assert_eq!("free".parse::<DataType>(), Err(UnknownDataType));
        assert_eq!("pointer".parse::<DataType>(), Err(UnknownDataType));
    }
}
