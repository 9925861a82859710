//! Plate filename parsing.
//!
//! Plate setters encode the tower, cylinder, web section and half of a plate
//! in fixed character positions of the filename, e.g. `071A1.tif` with the
//! default layout is tower `07`, cylinder 1, section `A`, half `1`.

use std::fmt;
use std::str::FromStr;

/// Errors raised while decoding a plate filename.
#[derive(Debug, thiserror::Error)]
pub enum PlateNameError {
    #[error("Invalid field layout {0:?}: expected 'start,length' with both at least 1")]
    InvalidLayout(String),

    #[error("Field {field} ({start},{length}) lies outside filename {name:?}")]
    FieldOutOfRange {
        field: &'static str,
        start: usize,
        length: usize,
        name: String,
    },

    #[error("Cylinder field {0:?} is not a number")]
    InvalidCylinder(String),

    #[error("Section field {0:?} must be a single character")]
    InvalidSection(String),
}

/// A 1-based `start,length` character range inside a filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLayout {
    pub start: usize,
    pub length: usize,
}

impl FieldLayout {
    pub const fn new(start: usize, length: usize) -> Self {
        Self { start, length }
    }

    /// The characters this field covers, or `None` if the name is too short.
    pub fn extract<'a>(&self, name: &'a str) -> Option<&'a str> {
        let mut bounds = name
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(name.len()));
        let begin = bounds.nth(self.start.checked_sub(1)?)?;
        let end = if self.length == 0 {
            begin
        } else {
            bounds.nth(self.length - 1)?
        };
        Some(&name[begin..end])
    }
}

impl FromStr for FieldLayout {
    type Err = PlateNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PlateNameError::InvalidLayout(s.to_string());
        let (start, length) = s.split_once(',').ok_or_else(invalid)?;
        let start: usize = start.trim().parse().map_err(|_| invalid())?;
        let length: usize = length.trim().parse().map_err(|_| invalid())?;
        if start == 0 || length == 0 {
            return Err(invalid());
        }
        Ok(Self { start, length })
    }
}

impl fmt::Display for FieldLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.start, self.length)
    }
}

/// Where each plate attribute sits in the filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameLayout {
    pub tower: FieldLayout,
    pub cylinder: FieldLayout,
    pub section: FieldLayout,
    pub half: FieldLayout,
}

impl Default for NameLayout {
    fn default() -> Self {
        Self {
            tower: FieldLayout::new(1, 2),
            cylinder: FieldLayout::new(3, 1),
            section: FieldLayout::new(4, 1),
            half: FieldLayout::new(5, 1),
        }
    }
}

/// Attributes decoded from a plate filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlateName {
    pub tower: String,
    pub cylinder: u32,
    pub section: char,
    pub half: String,
}

impl PlateName {
    pub fn parse(file_name: &str, layout: &NameLayout) -> Result<Self, PlateNameError> {
        let field = |name: &'static str, field: FieldLayout| {
            field
                .extract(file_name)
                .ok_or_else(|| PlateNameError::FieldOutOfRange {
                    field: name,
                    start: field.start,
                    length: field.length,
                    name: file_name.to_string(),
                })
        };

        let tower = field("tower", layout.tower)?.to_string();

        let cylinder_text = field("cylinder", layout.cylinder)?;
        let cylinder = cylinder_text
            .trim()
            .parse::<u32>()
            .map_err(|_| PlateNameError::InvalidCylinder(cylinder_text.to_string()))?;

        let section_text = field("section", layout.section)?;
        let mut chars = section_text.chars();
        let section = match (chars.next(), chars.next()) {
            (Some(c), None) => c,
            _ => return Err(PlateNameError::InvalidSection(section_text.to_string())),
        };

        let half = field("half", layout.half)?.to_string();

        Ok(Self {
            tower,
            cylinder,
            section,
            half,
        })
    }
}

impl fmt::Display for PlateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tower {} cylinder {} section {} half {}",
            self.tower, self.cylinder, self.section, self.half
        )
    }
}
