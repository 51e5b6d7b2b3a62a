//! World configuration: defaults, layered loading, validation.
//!
//! Values are layered (lowest priority first):
//!
//! 1. [`WorldConfig::default`]
//! 2. an optional TOML / JSON file
//! 3. `GEOCOIN_*` environment variables (`GEOCOIN_ORIGIN__LAT`, `GEOCOIN_STEP`, …)
//!
//! The binary applies CLI flags on top of the result.

use crate::error::{Result, WorldError};
use crate::types::LatLng;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Oakes College, UC Santa Cruz.
pub const DEFAULT_ORIGIN: LatLng = LatLng {
    lat: 36.98949379578401,
    lng: -122.06277128548504,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorldConfig {
    /// Seed string folded into every generator roll.
    pub seed: String,
    /// World origin; cell (0, 0) has its south-west corner here.
    pub origin: LatLng,
    /// Width/height of a cell in degrees. Also the player's move step.
    ///
    /// Changing it re-keys every cell, so saved worlds are not portable
    /// across step sizes.
    pub step: f64,
    /// Chebyshev radius (in cells) of the spawn pass.
    pub neighborhood_radius: i32,
    /// Probability that a checked cell holds a cache.
    pub spawn_probability: f64,
    /// Upper bound of the initial mint of a cache.
    pub max_coins_per_cache: u32,
    /// Euclidean radius (degrees) within which caches are displayed.
    pub visible_distance: f64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: "geocoin".into(),
            origin: DEFAULT_ORIGIN,
            step: 1e-4,
            neighborhood_radius: 8,
            spawn_probability: 0.1,
            max_coins_per_cache: 3,
            visible_distance: 8e-4,
        }
    }
}

impl WorldConfig {
    /// Load defaults, then `path` (if given and present), then the
    /// environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }
        let built = builder
            .add_source(
                Environment::with_prefix("GEOCOIN")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| WorldError::InvalidConfig(e.to_string()))?;

        let config: WorldConfig = built
            .try_deserialize()
            .map_err(|e| WorldError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document over the defaults (no environment layer).
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: WorldConfig = Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| WorldError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.step.is_finite() || self.step <= 0.0 {
            return Err(WorldError::InvalidConfig(format!(
                "step must be positive and finite, got {}",
                self.step
            )));
        }
        if !self.origin.is_finite() {
            return Err(WorldError::InvalidConfig(format!(
                "origin must be finite, got {}",
                self.origin
            )));
        }
        if !(0.0..=1.0).contains(&self.spawn_probability) {
            return Err(WorldError::InvalidConfig(format!(
                "spawn_probability must be within [0, 1], got {}",
                self.spawn_probability
            )));
        }
        if self.max_coins_per_cache == 0 {
            return Err(WorldError::InvalidConfig(
                "max_coins_per_cache must be at least 1".into(),
            ));
        }
        if self.neighborhood_radius < 0 {
            return Err(WorldError::InvalidConfig(format!(
                "neighborhood_radius must not be negative, got {}",
                self.neighborhood_radius
            )));
        }
        if !self.visible_distance.is_finite() || self.visible_distance < 0.0 {
            return Err(WorldError::InvalidConfig(format!(
                "visible_distance must be finite and non-negative, got {}",
                self.visible_distance
            )));
        }
        Ok(())
    }
}
