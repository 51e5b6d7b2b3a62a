//! Geocoin World Engine
//!
//! A deterministic geocaching world: the player walks a grid of fixed-size
//! cells, caches of coins appear around them from a seeded generator, and
//! coins move between caches and the player's inventory.
//!
//! ## Architecture
//!
//! ```text
//! SessionDriver  (driver.rs)          ← stdin / geolocation / autosave (cli)
//!   └── GeocacheService  (service.rs) ← single owner, command API
//!         ├── NeighborhoodManager  (neighborhood.rs) ← spawn + visibility passes
//!         │     ├── CacheStore  (cache.rs)           ← cell → cache, never deleted
//!         │     │     └── Luck  (luck.rs)            ← md5 seeded rolls
//!         │     └── GridMapper  (grid.rs)
//!         └── Inventory  (inventory.rs)
//! ```
//!
//! Persistence goes through the [`persistence::StateStore`] trait so the
//! native binary (file) and the browser client (`localStorage`) share the
//! same blob format.

pub mod cache;
pub mod config;
pub mod error;
pub mod grid;
pub mod inventory;
pub mod luck;
pub mod neighborhood;
pub mod persistence;
pub mod protocol;
pub mod service;
pub mod types;

// Async session driver requires the `cli` feature.
#[cfg(feature = "cli")]
pub mod driver;

pub use cache::{Cache, CacheStore, CellState, CoinId};
pub use config::WorldConfig;
pub use error::{Result, WorldError};
pub use grid::GridMapper;
pub use inventory::Inventory;
pub use luck::Luck;
pub use neighborhood::NeighborhoodManager;
pub use persistence::{FileStore, MemoryStore, StateStore};
pub use protocol::{CacheView, Command, CommandOutcome, SavedCache, SavedState};
pub use service::{CollectOutcome, GeocacheService, MoveReport};
pub use types::{CellCoord, Direction, LatLng, WorldStats};
