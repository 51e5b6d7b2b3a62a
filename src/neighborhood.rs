//! Neighborhood manager: the spawn pass (on cell change) and the visibility
//! pass (on every move).
//!
//! Spawning is keyed on cells and only re-scans when the player's cell
//! changes. Visibility is keyed on continuous distance and runs after every
//! move. Neither ever removes a cache from the store.

use crate::cache::{Cache, CacheStore};
use crate::grid::GridMapper;
use crate::types::{CellCoord, LatLng};
use log::debug;

/// Cells whose display state changed during a visibility pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibilityChanges {
    pub shown: Vec<CellCoord>,
    pub hidden: Vec<CellCoord>,
}

pub struct NeighborhoodManager {
    grid: GridMapper,
    store: CacheStore,
    radius: i32,
    visible_distance: f64,
}

impl NeighborhoodManager {
    pub fn new(grid: GridMapper, store: CacheStore, radius: i32, visible_distance: f64) -> Self {
        Self {
            grid,
            store,
            radius,
            visible_distance,
        }
    }

    pub fn grid(&self) -> &GridMapper {
        &self.grid
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut CacheStore {
        &mut self.store
    }

    /// Every cell within Chebyshev distance `radius` of `center`.
    pub fn neighborhood(&self, center: CellCoord) -> impl Iterator<Item = CellCoord> {
        let r = self.radius;
        (-r..=r).flat_map(move |di| {
            (-r..=r).map(move |dj| {
                CellCoord::new(center.i.saturating_add(di), center.j.saturating_add(dj))
            })
        })
    }

    /// Ensure a cache check for every cell in the neighborhood of `center`.
    ///
    /// Returns the cells whose cache was generated by this pass.
    pub fn on_cell_changed(&mut self, center: CellCoord) -> Vec<CellCoord> {
        let cells: Vec<CellCoord> = self.neighborhood(center).collect();
        let mut spawned = Vec::new();

        for cell in cells {
            let fresh = !self.store.is_checked(&cell);
            if self.store.ensure_cache(cell).is_some() && fresh {
                spawned.push(cell);
            }
        }

        debug!(
            "Neighborhood pass around {}: {} new caches",
            center,
            spawned.len()
        );
        spawned
    }

    /// Show caches within `visible_distance` of `position`, hide the rest.
    pub fn refresh_visibility(&mut self, position: LatLng) -> VisibilityChanges {
        let mut changes = VisibilityChanges::default();
        let grid = self.grid;
        let limit = self.visible_distance;

        for cache in self.store.caches_mut() {
            let within = grid.position_of(cache.cell).distance_to(&position) <= limit;
            if cache.set_visible(within) {
                if within {
                    debug!("Showing cache {}", cache.cell);
                    changes.shown.push(cache.cell);
                } else {
                    debug!("Hiding cache {}", cache.cell);
                    changes.hidden.push(cache.cell);
                }
            }
        }

        changes.shown.sort();
        changes.hidden.sort();
        changes
    }

    pub fn visible_caches(&self) -> impl Iterator<Item = &Cache> {
        self.store.caches().filter(|c| c.is_visible())
    }
}
