//! The player's coin holdings.

use crate::cache::CoinId;
use std::collections::BTreeMap;

/// Coin id → held count. Entries are removed when they reach zero.
///
/// Backed by a `BTreeMap`, so enumeration (and therefore which coin a
/// deposit gives away) follows coin-id order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    coins: BTreeMap<CoinId, u32>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from a persisted map, dropping zero-count records.
    pub fn from_counts(counts: BTreeMap<CoinId, u32>) -> Self {
        Self {
            coins: counts.into_iter().filter(|(_, n)| *n > 0).collect(),
        }
    }

    pub fn add(&mut self, coin: CoinId) {
        *self.coins.entry(coin).or_insert(0) += 1;
    }

    /// Remove one occurrence. Returns `false` when the coin is not held.
    pub fn remove(&mut self, coin: &CoinId) -> bool {
        match self.coins.get_mut(coin) {
            Some(n) if *n > 1 => {
                *n -= 1;
                true
            }
            Some(_) => {
                self.coins.remove(coin);
                true
            }
            None => false,
        }
    }

    /// Take whichever coin enumerates first.
    pub fn take_first(&mut self) -> Option<CoinId> {
        let coin = *self.coins.keys().next()?;
        self.remove(&coin);
        Some(coin)
    }

    pub fn count(&self, coin: &CoinId) -> u32 {
        self.coins.get(coin).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.coins.values().map(|&n| u64::from(n)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.coins.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CoinId, u32)> {
        self.coins.iter().map(|(coin, &n)| (coin, n))
    }

    pub fn counts(&self) -> &BTreeMap<CoinId, u32> {
        &self.coins
    }

    pub fn clear(&mut self) {
        self.coins.clear();
    }
}
