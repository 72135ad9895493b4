//! Chaos Trails - chaotic-map particle trails on the CPU
//!
//! Core modules:
//! - `sim`: Simulation schemes, particle buffers, chaotic maps
//! - `settings`: Data-driven system configuration
//! - `error`: Configuration errors
//!
//! The simulation only mutates numeric arrays. Publishing them to a display
//! device is left to the caller (see [`sim::ParticleBuffers::position_bytes`]).

pub mod error;
pub mod settings;
pub mod sim;

pub use error::ConfigError;
pub use settings::{ColorScheme, GeneratorConfig, SystemConfig};

use glam::Vec4;

/// Simulation constants
pub mod consts {
    /// Per-frame multiplicative decay of the speed upper bound
    pub const SPEED_DECAY: f32 = 0.75;
    /// Speed bound floor for the trail scheme
    pub const TRAIL_SPEED_FLOOR: f32 = 0.01;
    /// Speed bound floor for the IFS and single-step schemes
    pub const SEED_SPEED_FLOOR: f32 = 1.0;

    /// Number of interleaved chains in the IFS scheme
    pub const IFS_STRIDE: usize = 150;
    /// Upper bound of the random x coordinate of an IFS seed point
    pub const IFS_SEED_SPREAD: f32 = 0.01;

    /// A single step may cover at most this many particle sizes (LimitDelta)
    pub const MAX_STEP_IN_SIZES: f32 = 10.0;
    /// Floor for the particle size returned by a generator
    pub const MIN_PARTICLE_SIZE: f32 = f32::MIN_POSITIVE;
}

/// `ceil(a / b)` for positive integers
#[inline]
pub fn div_ceil(a: usize, b: usize) -> usize {
    a.div_ceil(b.max(1))
}

/// Decay a speed bound for a new frame, never dropping below `floor`
#[inline]
pub fn decay_speed_bound(bound: f32, floor: f32) -> f32 {
    (bound * consts::SPEED_DECAY).max(floor)
}

/// Force the homogeneous component of a point to 1
#[inline]
pub fn homogenize(mut p: Vec4) -> Vec4 {
    p.w = 1.0;
    p
}

/// Mix a seed with an index and a step into a single RNG seed (splitmix64 finalizer)
#[inline]
pub fn mix_seed(seed: u64, index: u64, step: u64) -> u64 {
    let mut z = seed
        ^ index.wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ step.wrapping_mul(0xC2B2_AE3D_27D4_EB4F);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_div_ceil() {
        assert_eq!(div_ceil(8, 2), 4);
        assert_eq!(div_ceil(9, 2), 5);
        assert_eq!(div_ceil(0, 3), 0);
        // Zero divisor is treated as 1
        assert_eq!(div_ceil(5, 0), 5);
    }

    #[test]
    fn test_decay_speed_bound() {
        assert!((decay_speed_bound(4.0, 0.01) - 3.0).abs() < 1e-6);
        assert_eq!(decay_speed_bound(0.001, 0.01), 0.01);
        assert_eq!(decay_speed_bound(0.0, 1.0), 1.0);
    }

    #[test]
    fn test_mix_seed_varies() {
        let a = mix_seed(1, 0, 0);
        let b = mix_seed(1, 1, 0);
        let c = mix_seed(1, 0, 1);
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, mix_seed(1, 0, 0));
    }
}
