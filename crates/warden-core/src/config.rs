//! World configuration.
//!
//! [`WorldConfig`] is plain serde data so hosts can load it from JSON next to
//! the rest of their settings. Missing fields take their defaults.
//!
//! ```
//! use warden_core::config::WorldConfig;
//!
//! let config = WorldConfig::from_json_str(r#"{ "width": 640, "height": 480 }"#).unwrap();
//! assert_eq!(config.width, 640.0);
//! assert_eq!(config.cell_size, 50.0);
//! ```

use serde::{Deserialize, Serialize};
use tessera::{GridConfig, Rectangle};

use crate::error::WorldError;

/// Configuration for an [`Environment`](crate::environment::Environment).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// World width; the world spans `[0, width]` on `x`
    pub width: f32,
    /// World height; the world spans `[0, height]` on `y`
    pub height: f32,
    /// Edge length of a segment-grid cell
    pub cell_size: f32,
    /// Extra rings of cells searched around every proximity query
    pub query_margin: u32,
    /// Seed for the environment's random helpers
    pub seed: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 1000.0,
            height: 1000.0,
            cell_size: 50.0,
            query_margin: 1,
            seed: 0,
        }
    }
}

impl WorldConfig {
    /// Create a config with the given world size and default grid settings.
    #[must_use]
    pub fn with_size(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// Parse a JSON document and validate it.
    ///
    /// # Errors
    ///
    /// [`WorldError::ConfigParse`] for malformed JSON, or any error from
    /// [`WorldConfig::validate`].
    pub fn from_json_str(json: &str) -> Result<Self, WorldError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| WorldError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check every value is usable.
    ///
    /// # Errors
    ///
    /// [`WorldError::InvalidConfig`] for a non-positive or non-finite world
    /// size, [`WorldError::Grid`] for a bad cell size.
    pub fn validate(&self) -> Result<(), WorldError> {
        if !self.width.is_finite() || !self.height.is_finite() {
            return Err(WorldError::InvalidConfig("world size must be finite"));
        }
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(WorldError::InvalidConfig("world size must be positive"));
        }
        self.grid_config().validate()?;
        Ok(())
    }

    /// The world boundary rectangle.
    #[must_use]
    pub fn world_rectangle(&self) -> Rectangle {
        Rectangle::from_origin(self.width, self.height)
    }

    /// Settings for the segment grid.
    #[must_use]
    pub fn grid_config(&self) -> GridConfig {
        GridConfig {
            cell_size: self.cell_size,
            query_margin: self.query_margin,
        }
    }
}
