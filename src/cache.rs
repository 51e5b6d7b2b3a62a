//! Cache subsystem: coin identities, cache entities and the cell → cache
//! store with its generation policy.

use crate::error::WorldError;
use crate::luck::{Luck, COINS_TAG, SPAWN_TAG};
use crate::types::CellCoord;
use log::debug;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Coin identity
// ---------------------------------------------------------------------------

/// Identity of a coin: the cell that minted it plus its ordinal in that
/// cell's initial mint. Rendered as `"i:j#serial"`.
///
/// Two mints of the same cell produce equal ids on purpose; holders count
/// occurrences of an id rather than tracking instances.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct CoinId {
    pub cell: CellCoord,
    pub serial: u32,
}

impl CoinId {
    pub fn new(cell: CellCoord, serial: u32) -> Self {
        Self { cell, serial }
    }
}

impl fmt::Display for CoinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}#{}", self.cell.i, self.cell.j, self.serial)
    }
}

impl FromStr for CoinId {
    type Err = WorldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || WorldError::InvalidCoinId(s.to_string());
        let (cell, serial) = s.split_once('#').ok_or_else(invalid)?;
        let (i, j) = cell.split_once(':').ok_or_else(invalid)?;
        Ok(CoinId::new(
            CellCoord::new(
                i.trim().parse().map_err(|_| invalid())?,
                j.trim().parse().map_err(|_| invalid())?,
            ),
            serial.trim().parse().map_err(|_| invalid())?,
        ))
    }
}

// Serialized as the display string so coin ids can key JSON maps.
impl Serialize for CoinId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CoinId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CoinIdVisitor;

        impl Visitor<'_> for CoinIdVisitor {
            type Value = CoinId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a coin id of the form \"i:j#serial\"")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<CoinId, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_str(CoinIdVisitor)
    }
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

/// A cache owned by exactly one cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Cache {
    pub cell: CellCoord,
    coins: Vec<CoinId>,
    /// Whether the cache currently has a displayed representation.
    visible: bool,
}

impl Cache {
    /// Mint `count` coins scoped to `cell`.
    pub fn minted(cell: CellCoord, count: u32) -> Self {
        Self {
            cell,
            coins: (0..count).map(|serial| CoinId::new(cell, serial)).collect(),
            visible: false,
        }
    }

    /// A cache holding exactly `coins`, e.g. contents read back from a save.
    pub fn with_coins(cell: CellCoord, coins: Vec<CoinId>) -> Self {
        Self {
            cell,
            coins,
            visible: false,
        }
    }

    pub fn coins(&self) -> &[CoinId] {
        &self.coins
    }

    pub fn coin_count(&self) -> usize {
        self.coins.len()
    }

    pub fn holds(&self, coin: &CoinId) -> bool {
        self.coins.contains(coin)
    }

    /// Remove one occurrence of `coin`. Returns `false` when absent.
    pub fn take_coin(&mut self, coin: &CoinId) -> bool {
        match self.coins.iter().position(|c| c == coin) {
            Some(idx) => {
                self.coins.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Append a coin. No cap: deposits may grow a cache past its mint size.
    pub fn put_coin(&mut self, coin: CoinId) {
        self.coins.push(coin);
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Set the display flag. Returns `true` if it changed.
    pub fn set_visible(&mut self, visible: bool) -> bool {
        let changed = self.visible != visible;
        self.visible = visible;
        changed
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Outcome of a cell's existence check. Both outcomes are kept forever so a
/// cell is rolled at most once.
#[derive(Debug, Clone, PartialEq)]
pub enum CellState {
    Empty,
    Occupied(Cache),
}

impl CellState {
    pub fn cache(&self) -> Option<&Cache> {
        match self {
            CellState::Occupied(cache) => Some(cache),
            CellState::Empty => None,
        }
    }
}

/// Authoritative cell → cache mapping, filled lazily by [`CacheStore::ensure_cache`].
pub struct CacheStore {
    luck: Luck,
    spawn_probability: f64,
    max_coins_per_cache: u32,
    cells: HashMap<CellCoord, CellState>,
}

impl CacheStore {
    pub fn new(luck: Luck, spawn_probability: f64, max_coins_per_cache: u32) -> Self {
        Self {
            luck,
            spawn_probability,
            max_coins_per_cache,
            cells: HashMap::new(),
        }
    }

    /// Return the cache at `cell`, generating it on the first check.
    ///
    /// Existing caches are returned unchanged and cells that failed their
    /// roll stay empty; neither is ever re-rolled.
    pub fn ensure_cache(&mut self, cell: CellCoord) -> Option<&Cache> {
        let state = match self.cells.entry(cell) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(v) => {
                let state = Self::generate(
                    &self.luck,
                    self.spawn_probability,
                    self.max_coins_per_cache,
                    cell,
                );
                v.insert(state)
            }
        };
        state.cache()
    }

    /// Whether `cell` has been checked, regardless of outcome.
    pub fn is_checked(&self, cell: &CellCoord) -> bool {
        self.cells.contains_key(cell)
    }

    pub fn get(&self, cell: &CellCoord) -> Option<&Cache> {
        self.cells.get(cell).and_then(CellState::cache)
    }

    pub fn get_mut(&mut self, cell: &CellCoord) -> Option<&mut Cache> {
        match self.cells.get_mut(cell) {
            Some(CellState::Occupied(cache)) => Some(cache),
            _ => None,
        }
    }

    pub fn caches(&self) -> impl Iterator<Item = &Cache> {
        self.cells.values().filter_map(CellState::cache)
    }

    pub fn caches_mut(&mut self) -> impl Iterator<Item = &mut Cache> {
        self.cells.values_mut().filter_map(|state| match state {
            CellState::Occupied(cache) => Some(cache),
            CellState::Empty => None,
        })
    }

    pub fn checked_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn cache_count(&self) -> usize {
        self.caches().count()
    }

    /// Forget every check. The next pass regenerates from the seed.
    pub fn clear(&mut self) {
        self.cells.clear();
    }

    /// Caches whose coins no longer match what the generator mints for
    /// their cell.
    pub fn modified_caches(&self) -> impl Iterator<Item = &Cache> {
        self.caches().filter(move |cache| {
            match Self::mint_count(
                &self.luck,
                self.spawn_probability,
                self.max_coins_per_cache,
                cache.cell,
            ) {
                Some(count) => cache.coins() != Cache::minted(cache.cell, count).coins(),
                None => true,
            }
        })
    }

    /// Put saved contents back into `cell`, replacing any generated cache.
    pub fn restore_cache(&mut self, cell: CellCoord, coins: Vec<CoinId>) {
        self.cells
            .insert(cell, CellState::Occupied(Cache::with_coins(cell, coins)));
    }

    fn generate(luck: &Luck, spawn_probability: f64, max_coins: u32, cell: CellCoord) -> CellState {
        match Self::mint_count(luck, spawn_probability, max_coins, cell) {
            Some(count) => {
                debug!("Spawned cache at {} with {} coins", cell, count);
                CellState::Occupied(Cache::minted(cell, count))
            }
            None => CellState::Empty,
        }
    }

    /// Initial coin count for `cell`, or `None` if it holds no cache.
    fn mint_count(luck: &Luck, spawn_probability: f64, max_coins: u32, cell: CellCoord) -> Option<u32> {
        if luck.cell_roll(cell, SPAWN_TAG) >= spawn_probability {
            return None;
        }
        Some(Luck::scaled_count(luck.cell_roll(cell, COINS_TAG), max_coins))
    }
}
