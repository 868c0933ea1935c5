//! Optional JSON configuration.
//!
//! Every field has a default, so an absent file and `{}` are equivalent.

use crate::{
    color::{Color, COIN_GOLD, COIN_LIGHT, DEEP_GREEN, EMERALD, NIGHT_BLUE},
    error::{AssetError, Result},
    raster::{DEFAULT_SUPERSAMPLE, MAX_SUPERSAMPLE},
};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssetConfig {
    pub palette: Palette,

    /// Supersample factor used by the procedural rasterizer.
    pub supersample: u32,

    /// Emit an sRGB chunk in generated PNGs.
    pub srgb_chunk: bool,

    /// Log a warning when an SVG source exists but no external tool could
    /// rasterize it and the procedural banner is used instead.
    pub warn_on_vector_fallback: bool,

    /// Bleed factor for `round-fill`.
    pub round_overscale: f32,
}

/// Largest accepted `round_overscale`.
pub const MAX_ROUND_OVERSCALE: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Palette {
    pub top: Color,
    pub mid: Color,
    pub bottom: Color,
    pub coin_inner: Color,
    pub coin_outer: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            top: NIGHT_BLUE,
            mid: DEEP_GREEN,
            bottom: EMERALD,
            coin_inner: COIN_LIGHT,
            coin_outer: COIN_GOLD,
        }
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            palette: Palette::default(),
            supersample: DEFAULT_SUPERSAMPLE,
            srgb_chunk: true,
            warn_on_vector_fallback: false,
            round_overscale: 1.08,
        }
    }
}

impl AssetConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: AssetConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AssetError::MissingInput(path.to_path_buf()));
        }
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !(1..=MAX_SUPERSAMPLE).contains(&self.supersample) {
            return Err(AssetError::InvalidConfig(format!(
                "supersample must be between 1 and {MAX_SUPERSAMPLE}, got {}",
                self.supersample
            )));
        }
        let overscale = self.round_overscale;
        if !(1.0..=MAX_ROUND_OVERSCALE).contains(&overscale) {
            return Err(AssetError::InvalidConfig(format!(
                "round_overscale must be between 1.0 and {MAX_ROUND_OVERSCALE}, got {overscale}"
            )));
        }
        Ok(())
    }
}
