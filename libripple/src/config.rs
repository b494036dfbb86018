//! Configuration for the decode pipeline.
//!
//! Defaults live in `default_config.toml` at the repository root and can be
//! overridden by a `ripple.toml` in the working directory or by
//! `RIPPLE_`-prefixed environment variables.

use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use eyre::{Result, eyre};
use serde::{Deserialize, Serialize};

const CONFIG_FILE: &str = "ripple.toml";

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RippleConfig {
    pub levels: LevelsConfig,
    pub edges: EdgesConfig,
    pub symbol_rate: SymbolRateConfig,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct LevelsConfig {
    /// Maximum number of samples consumed while searching for a first edge.
    pub max_samples: usize,
    /// Capacity of the bounded sample buffer handed to the level estimator.
    pub buffer_size: usize,
    /// Number of histogram/KDE bins used for level estimation.
    pub bins: usize,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct EdgesConfig {
    /// Hysteresis fraction for single-ended edge extraction.
    pub hysteresis: f64,
    /// Hysteresis fraction for differential edge extraction.
    pub differential_hysteresis: f64,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct SymbolRateConfig {
    /// Number of spectra folded into the harmonic product spectrum.
    pub spectra: usize,
    /// Automatically limit the edge spans included in the spectrum.
    pub auto_span_limit: bool,
}

impl RippleConfig {
    pub fn new() -> Result<Self> {
        let default_config = String::from(include_str!("../../default_config.toml"));

        Config::builder()
            .add_source(File::from_str(&default_config, FileFormat::Toml))
            .add_source(File::from(Path::new(CONFIG_FILE)).required(false))
            .add_source(Environment::with_prefix("ripple"))
            .build()?
            .try_deserialize()
            .map_err(|e| eyre!("Failed to parse config {e}"))
    }

    pub fn new_from_toml(config: &str) -> Result<Self> {
        Ok(toml::from_str(config)?)
    }
}

impl Default for RippleConfig {
    fn default() -> Self {
        Self::new_from_toml(include_str!("../../default_config.toml"))
            .expect("Failed to load default config")
    }
}
