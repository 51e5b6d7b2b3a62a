//! Command and view protocol between the engine and any front end
//! (terminal driver, browser client).
//!
//! ## Design rules
//!
//! 1. Every type is `Serialize + Deserialize` with snake_case JSON.
//! 2. Front ends only ever see views; they never hold references into the
//!    cache store.
//! 3. Caches are addressed by their cell; coins by their `"i:j#serial"` id.

use crate::cache::{Cache, CoinId};
use crate::grid::GridMapper;
use crate::service::{CollectOutcome, MoveReport};
use crate::types::{CellCoord, Direction, LatLng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Commands  (front end → engine)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// One step in a compass direction.
    Move { direction: Direction },
    /// Jump to an absolute position (geolocation feed).
    MoveTo { position: LatLng },
    /// Take `coin` out of the cache at `cell`.
    Collect { cell: CellCoord, coin: CoinId },
    /// Give one inventory coin to the cache at `cell`.
    Deposit { cell: CellCoord },
    /// Back to origin with an empty inventory and a fresh world.
    Reset,
}

/// Result of [`crate::GeocacheService::apply`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandOutcome {
    Moved(MoveReport),
    Collected(CollectOutcome),
    Deposited { coin: Option<CoinId> },
}

// ---------------------------------------------------------------------------
// Views  (engine → front end)
// ---------------------------------------------------------------------------

/// What a front end needs to draw and interact with one visible cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheView {
    pub cell: CellCoord,
    /// Canonical (south-west corner) position.
    pub position: LatLng,
    /// North-east corner, for drawing the cell rectangle.
    pub far_corner: LatLng,
    pub coins: Vec<CoinId>,
}

impl CacheView {
    pub fn of(cache: &Cache, grid: &GridMapper) -> Self {
        let (position, far_corner) = grid.cell_bounds(cache.cell);
        Self {
            cell: cache.cell,
            position,
            far_corner,
            coins: cache.coins().to_vec(),
        }
    }
}

// ---------------------------------------------------------------------------
// Persisted state
// ---------------------------------------------------------------------------

/// Everything that survives a session: position, inventory, path, and the
/// contents of every cache the player has changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedState {
    pub player: LatLng,
    #[serde(default)]
    pub inventory: BTreeMap<CoinId, u32>,
    #[serde(default)]
    pub history: Vec<LatLng>,
    /// Caches whose coins differ from their initial mint, ordered by cell.
    /// Unlisted caches regenerate from the seed.
    #[serde(default)]
    pub caches: Vec<SavedCache>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedCache {
    pub cell: CellCoord,
    pub coins: Vec<CoinId>,
}
