//! System configuration
//!
//! Loaded from JSON; every field has a default so partial files work.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::sim::{MapConfig, SchemeConfig};

/// How the IFS scheme recolors the points it produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ColorScheme {
    /// Gradient from green (slow) to red (fast) by normalized speed
    #[default]
    Distance,
    /// Fixed green
    Color,
    /// Any other value: colors are left untouched
    #[serde(other)]
    Unspecified,
}

impl ColorScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColorScheme::Distance => "Distance",
            ColorScheme::Color => "Color",
            ColorScheme::Unspecified => "Unspecified",
        }
    }
}

/// Parameters of the default particle generator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Particle size returned for every slot
    pub base_size: f32,
    /// Radius of the sphere respawned trails and bubbles are placed in
    pub spawn_radius: f32,
    /// Lifetime in frames assigned on respawn, inclusive range
    pub life_range: (i32, i32),
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            base_size: 0.05,
            spawn_radius: 10.0,
            life_range: (200, 600),
        }
    }
}

/// Full configuration of a particle system
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    /// Number of particle slots (N)
    pub particle_count: usize,
    /// Slots per trail
    pub trail_size: usize,
    /// Integration sub-steps per frame
    pub steps_per_frame: usize,
    /// Integration time step
    pub time_step: f32,
    /// Global multiplier applied to particle sizes
    pub particle_scale_factor: f32,
    /// Recoloring used by the IFS scheme
    pub color_scheme: ColorScheme,
    /// Run seed for reproducibility
    pub seed: u64,
    /// Active chaotic map
    pub map: MapConfig,
    /// Active simulation scheme
    pub scheme: SchemeConfig,
    /// Default generator policy
    pub generator: GeneratorConfig,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            particle_count: 100_000,
            trail_size: 100,
            steps_per_frame: 1,
            time_step: 0.005,
            particle_scale_factor: 1.0,
            color_scheme: ColorScheme::Distance,
            seed: 0x5EED,
            map: MapConfig::default(),
            scheme: SchemeConfig::default(),
            generator: GeneratorConfig::default(),
        }
    }
}

impl SystemConfig {
    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&json)?;
        log::info!(
            "Loaded config from {} ({} particles, scheme {})",
            path.display(),
            config.particle_count,
            config.scheme.name()
        );
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.particle_count == 0 {
            return Err(ConfigError::invalid("particle_count", "must be at least 1"));
        }
        if !self.time_step.is_finite() {
            return Err(ConfigError::invalid(
                "time_step",
                format!("must be finite, got {}", self.time_step),
            ));
        }
        if !self.particle_scale_factor.is_finite() || self.particle_scale_factor < 0.0 {
            return Err(ConfigError::invalid(
                "particle_scale_factor",
                format!("must be finite and >= 0, got {}", self.particle_scale_factor),
            ));
        }
        if self.generator.base_size.is_nan() || self.generator.base_size <= 0.0 {
            return Err(ConfigError::invalid(
                "generator.base_size",
                format!("must be > 0, got {}", self.generator.base_size),
            ));
        }
        let (lo, hi) = self.generator.life_range;
        if lo > hi {
            return Err(ConfigError::invalid(
                "generator.life_range",
                format!("start {lo} is greater than end {hi}"),
            ));
        }
        Ok(())
    }

    /// Slots per trail, between 1 and the particle count
    #[inline]
    pub fn effective_trail_size(&self) -> usize {
        self.trail_size.clamp(1, self.particle_count.max(1))
    }

    /// Sub-steps per frame, at least 1
    #[inline]
    pub fn effective_steps_per_frame(&self) -> usize {
        self.steps_per_frame.max(1)
    }
}
