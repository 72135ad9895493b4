//! Owning particle system
//!
//! Holds the buffers, the active map, generator and scheme, and drives one
//! scheme call per frame. Publishing the buffers to a display device is the
//! caller's job after [`ParticleSystem::advance`] returns.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::buffers::ParticleBuffers;
use super::generator::{BubbleGenerator, ParticleGenerator};
use super::map::ChaoticMap;
use super::scheme::{SchemeConfig, SimContext, Simulation};
use crate::SystemConfig;

/// Summary of the buffers after a frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameStats {
    pub step: u64,
    pub min: Vec3,
    pub max: Vec3,
    pub centroid: Vec3,
    pub speed_upper_bound: f32,
}

pub struct ParticleSystem {
    pub config: SystemConfig,
    pub buffers: ParticleBuffers,
    map: Box<dyn ChaoticMap>,
    generator: Box<dyn ParticleGenerator>,
    simulation: Simulation,
    step: u64,
}

impl ParticleSystem {
    pub fn new(
        config: SystemConfig,
        map: Box<dyn ChaoticMap>,
        generator: Box<dyn ParticleGenerator>,
    ) -> Self {
        let buffers = ParticleBuffers::new(config.particle_count);
        let simulation = Simulation::new(config.scheme.clone());
        log::info!(
            "particle system: {} particles, trail size {}, scheme {}",
            config.particle_count,
            config.effective_trail_size(),
            simulation.scheme.name()
        );
        Self {
            config,
            buffers,
            map,
            generator,
            simulation,
            step: 0,
        }
    }

    /// System using the configured built-in map and the bubble generator
    pub fn from_config(config: SystemConfig) -> Self {
        let expects_flow = match config.scheme {
            SchemeConfig::ParticlesWithTrails(_) => Some(true),
            SchemeConfig::IfsScheme(_) => Some(false),
            SchemeConfig::SingleStepScheme => None,
        };
        if expects_flow.is_some_and(|flow| flow != config.map.is_flow()) {
            log::warn!(
                "map {} is a {} but scheme {} iterates {}",
                config.map.name(),
                if config.map.is_flow() { "flow" } else { "point map" },
                config.scheme.name(),
                if config.map.is_flow() { "point maps" } else { "flows" }
            );
        }
        let map = Box::new(config.map);
        let generator = Box::new(BubbleGenerator::new(config.generator.clone()));
        Self::new(config, map, generator)
    }

    #[inline]
    pub fn step(&self) -> u64 {
        self.step
    }

    pub fn scheme(&self) -> &SchemeConfig {
        &self.simulation.scheme
    }

    /// Shared speed bound, for normalizing colors and sizes
    pub fn speed_upper_bound(&self) -> f32 {
        self.simulation.speed_upper_bound()
    }

    pub fn set_scheme(&mut self, scheme: SchemeConfig) {
        self.config.scheme = scheme.clone();
        self.simulation.set_scheme(scheme);
    }

    pub fn set_map(&mut self, map: Box<dyn ChaoticMap>) {
        self.map = map;
    }

    /// Advance one frame
    pub fn advance(&mut self, time: f64) {
        self.step += 1;
        self.simulate_at(time, self.step);
    }

    /// Run the active scheme for an explicit step number
    pub fn simulate_at(&mut self, time: f64, step: u64) {
        self.step = step;
        let ctx = SimContext {
            config: &self.config,
            map: self.map.as_ref(),
            generator: self.generator.as_ref(),
        };
        self.simulation.simulate(ctx, &mut self.buffers, time, step);
    }

    pub fn stats(&self) -> FrameStats {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        let mut sum = Vec3::ZERO;
        let mut finite = 0usize;

        for p in &self.buffers.position {
            let p = p.truncate();
            if p.is_finite() {
                min = min.min(p);
                max = max.max(p);
                sum += p;
                finite += 1;
            }
        }
        if finite == 0 {
            min = Vec3::ZERO;
            max = Vec3::ZERO;
        }

        FrameStats {
            step: self.step,
            min,
            max,
            centroid: sum / finite.max(1) as f32,
            speed_upper_bound: self.speed_upper_bound(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::ifs::IfsScheme;
    use crate::sim::map::MapConfig;
    use crate::sim::trails::TrailScheme;

    fn small_config() -> SystemConfig {
        SystemConfig {
            particle_count: 256,
            trail_size: 8,
            scheme: SchemeConfig::ParticlesWithTrails(TrailScheme {
                trail_bundle_size: 4,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_advance_counts_steps() {
        let mut system = ParticleSystem::from_config(small_config());
        for frame in 0..5 {
            system.advance(frame as f64 / 60.0);
        }
        assert_eq!(system.step(), 5);
        assert!(system.speed_upper_bound() >= crate::consts::TRAIL_SPEED_FLOOR);
    }

    #[test]
    fn test_lorenz_trails_stay_finite() {
        let mut system = ParticleSystem::from_config(small_config());
        for frame in 0..200 {
            system.advance(frame as f64 / 60.0);
        }
        assert!(system.buffers.position.iter().all(|p| p.is_finite()));
        assert!(system.buffers.rotation.iter().all(|r| r.is_finite()));
        let stats = system.stats();
        assert!(stats.min.cmple(stats.max).all());
        assert_eq!(stats.step, 200);
    }

    #[test]
    fn test_switch_to_ifs() {
        let mut system = ParticleSystem::from_config(small_config());
        system.advance(0.0);
        system.set_map(Box::new(MapConfig::DE_JONG));
        system.set_scheme(SchemeConfig::IfsScheme(IfsScheme { stride: 16 }));
        for _ in 0..32 {
            system.advance(0.0);
        }
        assert_eq!(system.scheme().name(), "IfsScheme");
        assert_eq!(system.config.scheme.name(), "IfsScheme");
        // De Jong points stay in [-2, 2]
        let stats = system.stats();
        assert!(stats.max.max_element() <= 2.0 && stats.min.min_element() >= -2.0);
    }

    #[test]
    fn test_simulate_at_with_gap_reseeds() {
        let config = SystemConfig {
            particle_count: 32,
            scheme: SchemeConfig::SingleStepScheme,
            ..Default::default()
        };
        let mut system = ParticleSystem::from_config(config);
        system.advance(0.0);
        let first = system.buffers.position.clone();

        system.advance(0.0);
        assert_eq!(system.buffers.position, first);

        system.simulate_at(0.0, 10);
        assert_ne!(system.buffers.position, first);
        assert_eq!(system.step(), 10);
    }

    #[test]
    fn test_mismatched_map_still_runs() {
        // Point map driving trails only warns
        let config = SystemConfig {
            map: MapConfig::CLIFFORD,
            ..small_config()
        };
        assert!(!config.map.is_flow());
        let mut system = ParticleSystem::from_config(config);
        for frame in 0..10 {
            system.advance(frame as f64 / 60.0);
        }
        assert!(system.buffers.position.iter().all(|p| p.is_finite()));
    }

    #[test]
    fn test_stats_of_empty_system() {
        let config = SystemConfig {
            particle_count: 0,
            ..Default::default()
        };
        let mut system = ParticleSystem::from_config(config);
        system.advance(0.0);
        let stats = system.stats();
        assert_eq!(stats.min, Vec3::ZERO);
        assert_eq!(stats.centroid, Vec3::ZERO);
    }
}
