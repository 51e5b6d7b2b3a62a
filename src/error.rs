//! Error types for the world engine.

use crate::types::CellCoord;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorldError {
    #[error("non-finite coordinate ({lat}, {lng})")]
    NonFiniteCoordinate { lat: f64, lng: f64 },

    #[error("coordinate ({lat}, {lng}) is outside the addressable grid")]
    CoordinateOutOfRange { lat: f64, lng: f64 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("no cache at cell {0}")]
    UnknownCache(CellCoord),

    #[error("cache at cell {0} is not within reach")]
    CacheOutOfReach(CellCoord),

    #[error("invalid coin id '{0}'")]
    InvalidCoinId(String),

    #[error("corrupt saved state: {0}")]
    CorruptState(String),

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, WorldError>;
