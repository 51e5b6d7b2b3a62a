//! Core world types shared across all modules.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Positions
// ---------------------------------------------------------------------------

/// A continuous map position in degrees.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }

    /// Euclidean distance in coordinate space (degrees, not metres).
    pub fn distance_to(&self, other: &LatLng) -> f64 {
        (self.lat - other.lat).hypot(self.lng - other.lng)
    }

    /// Position offset by whole steps along each axis.
    pub fn offset(&self, d_lat: f64, d_lng: f64) -> Self {
        Self::new(self.lat + d_lat, self.lng + d_lng)
    }
}

impl std::fmt::Display for LatLng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lng)
    }
}

// ---------------------------------------------------------------------------
// Grid cells
// ---------------------------------------------------------------------------

/// Integer offset of a cell from the world origin, in steps.
///
/// `i` runs along latitude (north positive), `j` along longitude (east
/// positive).
#[derive(
    Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize,
)]
pub struct CellCoord {
    pub i: i32,
    pub j: i32,
}

impl CellCoord {
    pub fn new(i: i32, j: i32) -> Self {
        Self { i, j }
    }

    /// The cell `(di, dj)` away, or `None` past the `i32` range.
    pub fn offset(&self, di: i32, dj: i32) -> Option<CellCoord> {
        Some(CellCoord::new(self.i.checked_add(di)?, self.j.checked_add(dj)?))
    }

    /// Chebyshev distance in cells.
    pub fn chebyshev(&self, other: &CellCoord) -> u32 {
        let di = (i64::from(self.i) - i64::from(other.i)).unsigned_abs();
        let dj = (i64::from(self.j) - i64::from(other.j)).unsigned_abs();
        di.max(dj) as u32
    }
}

impl std::fmt::Display for CellCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.i, self.j)
    }
}

// ---------------------------------------------------------------------------
// Movement
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    /// One-cell step as (di, dj).
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::North => (1, 0),
            Direction::South => (-1, 0),
            Direction::East => (0, 1),
            Direction::West => (0, -1),
        }
    }
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "n" | "north" | "up" => Ok(Direction::North),
            "s" | "south" | "down" => Ok(Direction::South),
            "e" | "east" | "right" => Ok(Direction::East),
            "w" | "west" | "left" => Ok(Direction::West),
            other => Err(format!("unknown direction '{}'", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorldStats {
    /// Cells whose existence roll has been made (both outcomes).
    pub checked_cells: usize,
    /// Cells that hold a cache.
    pub generated_caches: usize,
    /// Caches currently materialized for display.
    pub visible_caches: usize,
    /// Total coins held by the player.
    pub inventory_coins: u64,
    /// Moves since the session started or was last reset.
    pub total_moves: u64,
}
