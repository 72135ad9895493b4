//! Particle simulation
//!
//! Everything that mutates particle buffers lives here. This module is pure
//! numeric code:
//! - No rendering or platform dependencies
//! - Seeded RNG only
//! - Bundles own disjoint buffer ranges; the speed bound is the only shared value

pub mod buffers;
pub mod generator;
pub mod ifs;
pub mod map;
pub mod scheme;
pub mod single_step;
pub mod speed;
pub mod system;
pub mod trails;

pub use buffers::{BundleMut, ParticleBuffers, TrailMeta};
pub use generator::{BubbleGenerator, ParticleGenerator};
pub use ifs::IfsScheme;
pub use map::{ChaoticMap, MapConfig};
pub use scheme::{ContinuityState, SchemeConfig, SchemeState, SimContext, Simulation};
pub use single_step::SingleStepScheme;
pub use speed::AtomicSpeedBound;
pub use system::{FrameStats, ParticleSystem};
pub use trails::{
    ComputeMetadata, IntegrationStep, MapMode, TrailLayout, TrailScheme, TrailState,
};
