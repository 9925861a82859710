//! Shift direction and magnitude from the tower's roll-position pattern.
//!
//! The pattern lists the web sections in the order they pass the tower.
//! Sections at the leading end move down, sections at the trailing end move
//! up, and the centre section stays put. Back-side cylinders (even index)
//! see the web mirrored, so Up and Down swap.

use std::fmt;

use bitplate::Shift;

use crate::{CompensationError, Result};

/// Where a plate's content goes after decimation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Middle,
}

impl Direction {
    /// Row shift for this direction; `Middle` does not move.
    pub fn as_shift(self) -> Option<Shift> {
        match self {
            Direction::Up => Some(Shift::Up),
            Direction::Down => Some(Shift::Down),
            Direction::Middle => None,
        }
    }

    fn mirrored(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Middle => Direction::Middle,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => f.write_str("up"),
            Direction::Down => f.write_str("down"),
            Direction::Middle => f.write_str("middle"),
        }
    }
}

fn pattern_chars(pattern: &str) -> Result<Vec<char>> {
    let chars: Vec<char> = pattern.chars().collect();
    if chars.is_empty() || chars.len() > 4 {
        return Err(CompensationError::InvalidPattern(pattern.to_string()));
    }
    Ok(chars)
}

/// Direction for `section` on a tower with the given roll-position pattern.
pub fn compute_direction(pattern: &str, section: char, cylinder: u32) -> Result<Direction> {
    let p = pattern_chars(pattern)?;
    let front = match p.len() {
        1 => Direction::Middle,
        2 if section == p[0] => Direction::Down,
        2 => Direction::Up,
        3 if section == p[0] => Direction::Down,
        3 if section == p[2] => Direction::Up,
        3 => Direction::Middle,
        _ if section == p[0] || section == p[1] => Direction::Down,
        _ => Direction::Up,
    };

    if cylinder % 2 == 0 {
        Ok(front.mirrored())
    } else {
        Ok(front)
    }
}

/// Rows to shift `section` by, given the plate's pixel fan-out.
pub fn compute_shift_pixels(pattern: &str, section: char, pixel_fanout: u32) -> Result<u32> {
    let p = pattern_chars(pattern)?;
    let shift = match p.len() {
        1 | 2 => 0,
        3 if section == p[1] => 0,
        3 => pixel_fanout / 2,
        _ if section == p[0] || section == p[3] => pixel_fanout,
        _ => 0,
    };
    Ok(shift)
}
