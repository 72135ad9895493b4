//! Particle generation policy
//!
//! Schemes ask a generator for particle sizes, trail respawns and
//! single-particle resets. Generators are shared across bundle workers, so
//! any randomness must come from a stream derived from the call's inputs.

use glam::{Mat4, Vec3, Vec4};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::buffers::{BundleMut, ParticleBuffers};
use crate::mix_seed;
use crate::settings::{GeneratorConfig, SystemConfig};

/// Size, respawn and reset policy consumed by the simulation schemes
pub trait ParticleGenerator: Send + Sync {
    /// Size of the particles written for `trail` at sub-step `sub`
    fn update_size(&self, config: &SystemConfig, trail: usize, sub: usize) -> f32;

    /// Respawn the trail anchored at local slot `anchor` of `bundle`.
    ///
    /// Must only touch that trail's slots and its metadata entry.
    fn new_bundle(
        &self,
        config: &SystemConfig,
        bundle: &mut BundleMut<'_>,
        anchor: usize,
        step: u64,
    );

    /// Reinitialize particles `from..=to`
    fn make_bubble(
        &self,
        config: &SystemConfig,
        buffers: &mut ParticleBuffers,
        from: usize,
        to: usize,
        step: u64,
    );
}

/// Default policy: constant size, respawn at a random point of a sphere
#[derive(Debug, Clone, Default)]
pub struct BubbleGenerator {
    pub params: GeneratorConfig,
}

impl BubbleGenerator {
    pub fn new(params: GeneratorConfig) -> Self {
        Self { params }
    }

    fn rng(seed: u64, index: usize, step: u64) -> Pcg32 {
        Pcg32::seed_from_u64(mix_seed(seed, index as u64, step))
    }

    /// Uniform point inside the spawn sphere
    fn spawn_point(&self, rng: &mut Pcg32) -> Vec4 {
        let p = loop {
            let candidate = Vec3::new(
                rng.random_range(-1.0..=1.0),
                rng.random_range(-1.0..=1.0),
                rng.random_range(-1.0..=1.0),
            );
            if candidate.length_squared() <= 1.0 {
                break candidate;
            }
        };
        (p * self.params.spawn_radius).extend(1.0)
    }
}

impl ParticleGenerator for BubbleGenerator {
    fn update_size(&self, _config: &SystemConfig, _trail: usize, _sub: usize) -> f32 {
        self.params.base_size
    }

    fn new_bundle(
        &self,
        config: &SystemConfig,
        bundle: &mut BundleMut<'_>,
        anchor: usize,
        step: u64,
    ) {
        let mut rng = Self::rng(config.seed, bundle.global(anchor), step);
        let point = self.spawn_point(&mut rng);

        for slot in bundle.trail_slots(anchor) {
            bundle.position[slot] = point;
        }

        let (lo, hi) = self.params.life_range;
        let meta = &mut bundle.meta[anchor];
        meta.life_len = rng.random_range(lo..=hi.max(lo));
        meta.velocity = Vec3::ZERO;
    }

    fn make_bubble(
        &self,
        config: &SystemConfig,
        buffers: &mut ParticleBuffers,
        from: usize,
        to: usize,
        step: u64,
    ) {
        if buffers.is_empty() {
            return;
        }
        let to = to.min(buffers.len() - 1);
        let size = self.params.base_size;

        for i in from..=to {
            let mut rng = Self::rng(config.seed, i, step);
            buffers.position[i] = self.spawn_point(&mut rng);
            buffers.dimension[i] = Vec4::splat(size);
            buffers.rotation[i] = Mat4::IDENTITY;
            buffers.color[i] = Vec4::ONE;
        }
    }
}
