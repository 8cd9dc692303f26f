//! Discrete grid coordinates.
//!
//! The warehouse floor is a 4-connected grid: robots move one cell north,
//! south, east or west per tick, never diagonally.

use std::fmt;

/// A cell on the warehouse grid.  `x` is the column, `y` the row.
///
/// Ordering is lexicographic on `(x, y)` so positions can key `BTreeMap`s
/// and sort deterministically.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridPosition {
    pub x: u32,
    pub y: u32,
}

impl GridPosition {
    #[inline]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// L1 distance in cells — the exact shortest-path length on an empty
    /// 4-connected grid.
    #[inline]
    pub fn manhattan(self, other: GridPosition) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// In-bounds 4-connected neighbours, in the fixed expansion order
    /// south, north, east, west (`+y`, `-y`, `+x`, `-x`).
    pub fn neighbors(self, bounds: GridBounds) -> impl Iterator<Item = GridPosition> {
        const STEPS: [(i64, i64); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];
        STEPS.into_iter().filter_map(move |(dx, dy)| {
            let nx = self.x as i64 + dx;
            let ny = self.y as i64 + dy;
            if nx < 0 || ny < 0 {
                return None;
            }
            let next = GridPosition::new(nx as u32, ny as u32);
            bounds.contains(next).then_some(next)
        })
    }
}

impl From<(u32, u32)> for GridPosition {
    fn from((x, y): (u32, u32)) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for GridPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Width × height of a grid.  Valid cells satisfy `x < width && y < height`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridBounds {
    pub width:  u32,
    pub height: u32,
}

impl GridBounds {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn contains(self, pos: GridPosition) -> bool {
        pos.x < self.width && pos.y < self.height
    }
}
