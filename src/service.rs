//! GeocacheService – player movement, cell lifecycle, coin transfers.
//!
//! The service is the single owner of every piece of mutable world state.
//! Front ends translate their events into calls here (or into
//! [`Command`]s for [`GeocacheService::apply`]) and render the returned
//! reports and views.

use crate::cache::{Cache, CacheStore, CoinId};
use crate::config::WorldConfig;
use crate::error::{Result, WorldError};
use crate::grid::GridMapper;
use crate::inventory::Inventory;
use crate::luck::Luck;
use crate::neighborhood::NeighborhoodManager;
use crate::persistence::decode_state;
use crate::protocol::{CacheView, Command, CommandOutcome, SavedCache, SavedState};
use crate::types::{CellCoord, Direction, LatLng, WorldStats};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Everything that changed because the player was placed somewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveReport {
    pub position: LatLng,
    pub cell: CellCoord,
    /// Whether a spawn pass ran.
    pub cell_changed: bool,
    /// Caches generated by this move.
    pub spawned: Vec<CellCoord>,
    /// Caches that became visible.
    pub shown: Vec<CellCoord>,
    /// Caches that stopped being visible.
    pub hidden: Vec<CellCoord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectOutcome {
    pub coin: CoinId,
    /// `false` when the cache did not hold the coin (nothing moved).
    pub collected: bool,
    /// Inventory count for `coin` afterwards.
    pub held: u32,
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

pub struct GeocacheService {
    config: WorldConfig,
    neighborhood: NeighborhoodManager,
    inventory: Inventory,
    player: LatLng,
    last_cell: Option<CellCoord>,
    history: Vec<LatLng>,
    move_count: u64,
}

impl GeocacheService {
    /// Validate `config` and place the player at its origin.
    pub fn new(config: WorldConfig) -> Result<Self> {
        config.validate()?;

        let grid = GridMapper::new(config.origin, config.step);
        let store = CacheStore::new(
            Luck::new(config.seed.clone()),
            config.spawn_probability,
            config.max_coins_per_cache,
        );
        let neighborhood = NeighborhoodManager::new(
            grid,
            store,
            config.neighborhood_radius,
            config.visible_distance,
        );

        let mut service = Self {
            player: config.origin,
            config,
            neighborhood,
            inventory: Inventory::new(),
            last_cell: None,
            history: Vec::new(),
            move_count: 0,
        };
        service.place_player(service.player)?;
        Ok(service)
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Movement
    // -----------------------------------------------------------------------

    /// Move one step in `direction`.
    ///
    /// The destination cell is the current cell plus one, never re-derived
    /// from the new position, and the player keeps its offset within the
    /// cell. Stepping from a cell corner lands exactly on the next corner.
    pub fn move_player(&mut self, direction: Direction) -> Result<MoveReport> {
        let grid = *self.neighborhood.grid();
        let from = match self.last_cell {
            Some(cell) => cell,
            None => grid.cell_of(self.player)?,
        };
        let (di, dj) = direction.delta();
        let to = from
            .offset(di, dj)
            .ok_or(WorldError::CoordinateOutOfRange {
                lat: self.player.lat,
                lng: self.player.lng,
            })?;

        let (from_corner, to_corner) = (grid.position_of(from), grid.position_of(to));
        let target = to_corner.offset(
            self.player.lat - from_corner.lat,
            self.player.lng - from_corner.lng,
        );
        let report = self.enter(target, to);
        self.record_move(target);
        Ok(report)
    }

    /// Move to an absolute position, e.g. from a geolocation fix.
    pub fn move_to(&mut self, position: LatLng) -> Result<MoveReport> {
        let report = self.place_player(position)?;
        self.record_move(position);
        Ok(report)
    }

    fn record_move(&mut self, position: LatLng) {
        self.history.push(position);
        self.move_count += 1;
    }

    /// Put the player at `position` and run the spawn / visibility passes.
    ///
    /// Fails without touching any state if `position` has no cell.
    fn place_player(&mut self, position: LatLng) -> Result<MoveReport> {
        let cell = self.neighborhood.grid().cell_of(position)?;
        Ok(self.enter(position, cell))
    }

    fn enter(&mut self, position: LatLng, cell: CellCoord) -> MoveReport {
        self.player = position;

        let cell_changed = self.last_cell != Some(cell);
        let spawned = if cell_changed {
            self.last_cell = Some(cell);
            self.neighborhood.on_cell_changed(cell)
        } else {
            Vec::new()
        };

        let visibility = self.neighborhood.refresh_visibility(position);
        debug!(
            "Player at {} in cell {} (+{} caches, {} shown, {} hidden)",
            position,
            cell,
            spawned.len(),
            visibility.shown.len(),
            visibility.hidden.len()
        );

        MoveReport {
            position,
            cell,
            cell_changed,
            spawned,
            shown: visibility.shown,
            hidden: visibility.hidden,
        }
    }

    // -----------------------------------------------------------------------
    // Coin transfers
    // -----------------------------------------------------------------------

    /// Move `coin` from the cache at `cell` into the inventory.
    ///
    /// Collecting a coin the cache no longer holds is a no-op.
    pub fn collect(&mut self, cell: CellCoord, coin: &CoinId) -> Result<CollectOutcome> {
        let cache = self.reachable_cache(cell)?;
        let collected = cache.take_coin(coin);
        if collected {
            self.inventory.add(*coin);
            debug!("Collected {} from cache {}", coin, cell);
        }
        Ok(CollectOutcome {
            coin: *coin,
            collected,
            held: self.inventory.count(coin),
        })
    }

    /// Give the first inventory coin to the cache at `cell`.
    ///
    /// Returns the deposited coin, or `None` when the inventory is empty.
    pub fn deposit(&mut self, cell: CellCoord) -> Result<Option<CoinId>> {
        // Resolve the target before touching the inventory.
        self.reachable_cache(cell)?;
        let Some(coin) = self.inventory.take_first() else {
            return Ok(None);
        };
        self.reachable_cache(cell)?.put_coin(coin);
        debug!("Deposited {} into cache {}", coin, cell);
        Ok(Some(coin))
    }

    fn reachable_cache(&mut self, cell: CellCoord) -> Result<&mut Cache> {
        let cache = self
            .neighborhood
            .store_mut()
            .get_mut(&cell)
            .ok_or(WorldError::UnknownCache(cell))?;
        if !cache.is_visible() {
            return Err(WorldError::CacheOutOfReach(cell));
        }
        Ok(cache)
    }

    // -----------------------------------------------------------------------
    // Session lifecycle
    // -----------------------------------------------------------------------

    /// Back to origin with an empty inventory, no history and a world
    /// regenerated from the seed.
    pub fn reset(&mut self) -> MoveReport {
        info!("Resetting session to origin {}", self.config.origin);
        self.inventory.clear();
        self.history.clear();
        self.move_count = 0;
        self.reset_world();
        self.place_origin()
    }

    /// Current persisted state. Pure read.
    pub fn snapshot(&self) -> SavedState {
        let mut caches: Vec<SavedCache> = self
            .store()
            .modified_caches()
            .map(|cache| SavedCache {
                cell: cache.cell,
                coins: cache.coins().to_vec(),
            })
            .collect();
        caches.sort_by_key(|c| c.cell);

        SavedState {
            player: self.player,
            inventory: self.inventory.counts().clone(),
            history: self.history.clone(),
            caches,
        }
    }

    /// Reinstate a saved session and rebuild the world around it.
    pub fn restore(&mut self, state: SavedState) -> Result<MoveReport> {
        // Validate before mutating anything.
        self.neighborhood.grid().cell_of(state.player)?;
        if state.history.iter().any(|p| !p.is_finite()) {
            return Err(WorldError::CorruptState("non-finite history position".into()));
        }

        info!(
            "Restoring session at {} ({} inventory coins, {} history points, {} changed caches)",
            state.player,
            state.inventory.values().map(|&n| u64::from(n)).sum::<u64>(),
            state.history.len(),
            state.caches.len()
        );
        self.inventory = Inventory::from_counts(state.inventory);
        self.history = state.history;
        self.move_count = self.history.len() as u64;
        self.reset_world();

        // Saved contents go in before the spawn pass so it never re-mints them.
        let store = self.neighborhood.store_mut();
        for saved in state.caches {
            store.restore_cache(saved.cell, saved.coins);
        }
        self.place_player(state.player)
    }

    /// Restore from an optional blob, starting fresh when it is missing or
    /// unusable.
    pub fn restore_or_fresh(&mut self, blob: Option<&str>) -> MoveReport {
        let restored = match blob {
            Some(blob) => decode_state(blob).and_then(|state| self.restore(state)),
            None => {
                info!("No saved state, starting at origin");
                return self.reset();
            }
        };
        match restored {
            Ok(report) => report,
            Err(e) => {
                warn!("Discarding saved state: {}", e);
                self.reset()
            }
        }
    }

    fn reset_world(&mut self) {
        self.neighborhood.store_mut().clear();
        self.last_cell = None;
    }

    fn place_origin(&mut self) -> MoveReport {
        let origin = self.config.origin;
        let cell = CellCoord::new(0, 0);
        self.player = origin;
        self.last_cell = Some(cell);
        let spawned = self.neighborhood.on_cell_changed(cell);
        let visibility = self.neighborhood.refresh_visibility(origin);
        MoveReport {
            position: origin,
            cell,
            cell_changed: true,
            spawned,
            shown: visibility.shown,
            hidden: visibility.hidden,
        }
    }

    // -----------------------------------------------------------------------
    // Command entry point
    // -----------------------------------------------------------------------

    pub fn apply(&mut self, command: Command) -> Result<CommandOutcome> {
        match command {
            Command::Move { direction } => self.move_player(direction).map(CommandOutcome::Moved),
            Command::MoveTo { position } => self.move_to(position).map(CommandOutcome::Moved),
            Command::Collect { cell, coin } => {
                self.collect(cell, &coin).map(CommandOutcome::Collected)
            }
            Command::Deposit { cell } => self
                .deposit(cell)
                .map(|coin| CommandOutcome::Deposited { coin }),
            Command::Reset => Ok(CommandOutcome::Moved(self.reset())),
        }
    }

    // -----------------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------------

    pub fn player(&self) -> LatLng {
        self.player
    }

    pub fn player_cell(&self) -> Option<CellCoord> {
        self.last_cell
    }

    pub fn history(&self) -> &[LatLng] {
        &self.history
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn store(&self) -> &CacheStore {
        self.neighborhood.store()
    }

    /// Visible caches, ordered by cell.
    pub fn visible_caches(&self) -> Vec<CacheView> {
        let grid = self.neighborhood.grid();
        let mut views: Vec<CacheView> = self
            .neighborhood
            .visible_caches()
            .map(|cache| CacheView::of(cache, grid))
            .collect();
        views.sort_by_key(|v| v.cell);
        views
    }

    pub fn cache_view(&self, cell: CellCoord) -> Option<CacheView> {
        self.store()
            .get(&cell)
            .map(|cache| CacheView::of(cache, self.neighborhood.grid()))
    }

    pub fn stats(&self) -> WorldStats {
        let store = self.store();
        WorldStats {
            checked_cells: store.checked_cells(),
            generated_caches: store.cache_count(),
            visible_caches: self.neighborhood.visible_caches().count(),
            inventory_coins: self.inventory.total(),
            total_moves: self.move_count,
        }
    }
}
