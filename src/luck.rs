//! Deterministic generator: seeded md5 rolls in `[0, 1)`.
//!
//! A roll depends only on the seed and the key it is asked about, so the
//! same world comes back on every run. Different purposes for the same cell
//! use different tags instead of reusing one roll.

use crate::types::CellCoord;

/// Tag for the "does this cell hold a cache" roll.
pub const SPAWN_TAG: &str = "spawn";
/// Tag for the "how many coins does it start with" roll.
pub const COINS_TAG: &str = "coins";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Luck {
    seed: String,
}

impl Luck {
    pub fn new(seed: impl Into<String>) -> Self {
        Self { seed: seed.into() }
    }

    /// Roll for an arbitrary key.
    pub fn roll(&self, key: &str) -> f64 {
        let digest = md5::compute(format!("{}|{}", self.seed, key).as_bytes());
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest.0[..8]);
        // Top 53 bits fill an f64 mantissa exactly, so the result is < 1.0.
        (u64::from_be_bytes(head) >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Roll for a cell under a disambiguating tag.
    pub fn cell_roll(&self, cell: CellCoord, tag: &str) -> f64 {
        self.roll(&format!("{},{}|{}", cell.i, cell.j, tag))
    }

    /// Map a roll onto `1..=max`.
    pub fn scaled_count(roll: f64, max: u32) -> u32 {
        let max = max.max(1);
        (1 + (roll * f64::from(max)).floor() as u32).clamp(1, max)
    }
}
