//! Mapping from cylinder index to process colour.

use std::fmt;

use crate::{CompensationError, Result};

/// Process colour printed by a cylinder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Colour {
    Cyan,
    Magenta,
    Yellow,
    /// Reference layer; never compensated.
    Black,
}

impl Colour {
    /// Cylinders 1-2 print cyan, 3-4 magenta, 5-6 yellow, anything higher black.
    pub fn from_cylinder(cylinder: u32) -> Result<Self> {
        match cylinder {
            0 => Err(CompensationError::InvalidCylinder),
            1 | 2 => Ok(Colour::Cyan),
            3 | 4 => Ok(Colour::Magenta),
            5 | 6 => Ok(Colour::Yellow),
            _ => Ok(Colour::Black),
        }
    }

    /// Single-letter code used in geometry documents.
    pub fn letter(self) -> char {
        match self {
            Colour::Cyan => 'C',
            Colour::Magenta => 'M',
            Colour::Yellow => 'Y',
            Colour::Black => 'K',
        }
    }

    pub fn is_reference(self) -> bool {
        self == Colour::Black
    }
}

impl fmt::Display for Colour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Colour::Cyan => "cyan",
            Colour::Magenta => "magenta",
            Colour::Yellow => "yellow",
            Colour::Black => "black",
        };
        f.write_str(name)
    }
}
