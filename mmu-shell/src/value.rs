//! Typed values and their little-endian byte encoding.

use std::fmt::{self, Display, Formatter};

use mmu::DataType;

use crate::error::{ShellError, ShellResult};

/// One element of a variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Char(u8),
    Short(i16),
    Int(i32),
    Float(f32),
    Long(i64),
    Double(f64),
}

impl Value {
    /// Read `text` as an element of `data_type`.
    ///
    /// A `char` takes the first byte of the token, so `"hello"` stores `h`.
    pub fn parse(data_type: DataType, text: &str) -> ShellResult<Self> {
        let invalid = || ShellError::Parse(text.to_string());
        let value = match data_type {
            DataType::Char => Self::Char(*text.as_bytes().first().ok_or_else(invalid)?),
            DataType::Short => Self::Short(text.parse().map_err(|_| invalid())?),
            DataType::Int => Self::Int(text.parse().map_err(|_| invalid())?),
            DataType::Float => Self::Float(text.parse().map_err(|_| invalid())?),
            DataType::Long => Self::Long(text.parse().map_err(|_| invalid())?),
            DataType::Double => Self::Double(text.parse().map_err(|_| invalid())?),
            DataType::FreeSpace => return Err(invalid()),
        };
        Ok(value)
    }

    pub fn to_bytes(self) -> Vec<u8> {
        match self {
            Self::Char(v) => vec![v],
            Self::Short(v) => v.to_le_bytes().to_vec(),
            Self::Int(v) => v.to_le_bytes().to_vec(),
            Self::Float(v) => v.to_le_bytes().to_vec(),
            Self::Long(v) => v.to_le_bytes().to_vec(),
            Self::Double(v) => v.to_le_bytes().to_vec(),
        }
    }

    /// Decode an element of `data_type` from exactly `element_width` bytes.
    pub fn from_bytes(data_type: DataType, bytes: &[u8]) -> Option<Self> {
        let value = match data_type {
            DataType::Char => Self::Char(*bytes.first()?),
            DataType::Short => Self::Short(i16::from_le_bytes(bytes.try_into().ok()?)),
            DataType::Int => Self::Int(i32::from_le_bytes(bytes.try_into().ok()?)),
            DataType::Float => Self::Float(f32::from_le_bytes(bytes.try_into().ok()?)),
            DataType::Long => Self::Long(i64::from_le_bytes(bytes.try_into().ok()?)),
            DataType::Double => Self::Double(f64::from_le_bytes(bytes.try_into().ok()?)),
            DataType::FreeSpace => return None,
        };
        Some(value)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Char(v) => write!(f, "{}", *v as char),
            Self::Short(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Long(v) => write!(f, "{}", v),
            Self::Double(v) => write!(f, "{}", v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_per_type() {
        assert_eq!(Value::parse(DataType::Char, "hello").unwrap(), Value::Char(b'h'));
        assert_eq!(Value::parse(DataType::Short, "-12").unwrap(), Value::Short(-12));
        assert_eq!(Value::parse(DataType::Double, "2.5").unwrap(), Value::Double(2.5));
        assert!(Value::parse(DataType::Int, "4.5").is_err());
        assert!(Value::parse(DataType::Short, "70000").is_err());
        assert!(Value::parse(DataType::Char, "").is_err());
    }

    #[test]
    fn encoding_is_little_endian_and_sized() {
        assert_eq!(Value::Int(0x0102_0304).to_bytes(), vec![4, 3, 2, 1]);
        assert_eq!(Value::Long(1).to_bytes().len(), 8);
        assert_eq!(
            Value::from_bytes(DataType::Float, &1.5f32.to_le_bytes()),
            Some(Value::Float(1.5))
        );
        assert_eq!(Value::from_bytes(DataType::Int, &[1, 2]), None);
    }

    #[test]
    fn display() {
        assert_eq!(Value::Char(b'x').to_string(), "x");
        assert_eq!(Value::Float(3.25).to_string(), "3.25");
        assert_eq!(Value::Long(-7).to_string(), "-7");
    }
}
