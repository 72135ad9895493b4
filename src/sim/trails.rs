//! Trail-following scheme
//!
//! Every trail has a leading particle that follows the chaotic map. Each
//! frame the leader moves, and the slots it sweeps over are filled in along
//! the way, so the trail paints the path behind it. Trails are grouped into
//! bundles, and each bundle is simulated on its own rayon worker.

use glam::{Mat4, Vec4};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::buffers::{BundleMut, ParticleBuffers};
use super::scheme::SimContext;
use super::speed::AtomicSpeedBound;
use crate::consts::{MAX_STEP_IN_SIZES, MIN_PARTICLE_SIZE, TRAIL_SPEED_FLOOR};
use crate::{SystemConfig, decay_speed_bound, div_ceil};

/// How the map output drives a trail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MapMode {
    /// Map output is a velocity, scaled by the time step
    #[default]
    Direct,
    /// Map output is a force accumulated into the trail's velocity
    ForceField,
}

/// Whether a single step is clamped to a few particle sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum IntegrationStep {
    #[default]
    LimitDelta,
    DoNotLimit,
}

/// What gets written into the color channel of each new slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ComputeMetadata {
    /// Unit direction of motion
    #[default]
    Tangent,
    /// Displacement of the step
    Speed,
    /// Any other value: color is left untouched
    #[serde(other)]
    Unspecified,
}

/// Parameters of the trail scheme
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrailScheme {
    pub map_mode: MapMode,
    pub integration_step: IntegrationStep,
    /// Trails per bundle (unit of parallel work)
    pub trail_bundle_size: usize,
    pub compute_metadata: ComputeMetadata,
}

impl Default for TrailScheme {
    fn default() -> Self {
        Self {
            map_mode: MapMode::Direct,
            integration_step: IntegrationStep::LimitDelta,
            trail_bundle_size: 1,
            compute_metadata: ComputeMetadata::Tangent,
        }
    }
}

/// State carried from frame to frame
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TrailState {
    pub speed_upper_bound: f32,
}

/// Derived sizes for one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrailLayout {
    pub trail_size: usize,
    pub trail_count: usize,
    pub bundle_size: usize,
    pub bundle_count: usize,
    pub steps_per_frame: usize,
}

impl TrailLayout {
    /// Trails never exceed the buffer and bundles never exceed the trail count
    pub fn new(config: &SystemConfig, scheme: &TrailScheme, particle_count: usize) -> Self {
        let trail_size = config.effective_trail_size().min(particle_count.max(1));
        let trail_count = div_ceil(particle_count, trail_size);
        let bundle_size = scheme.trail_bundle_size.clamp(1, trail_count.max(1));
        Self {
            trail_size,
            trail_count,
            bundle_size,
            bundle_count: div_ceil(trail_count, bundle_size),
            steps_per_frame: config.effective_steps_per_frame(),
        }
    }

    /// Particles per bundle
    #[inline]
    pub fn chunk(&self) -> usize {
        self.trail_size.saturating_mul(self.bundle_size)
    }
}

/// Orthonormal frame from a direction of motion and the previous frame's
/// second basis vector. Degenerate inputs give zero vectors, never NaN.
pub fn orthonormal_frame(delta: Vec4, previous_b1: Vec4) -> (Vec4, Vec4, Vec4) {
    let b0 = delta.truncate();
    let b2 = b0.cross(previous_b1.truncate());
    let b1 = b2.cross(b0);
    (
        b0.normalize_or_zero().extend(0.0),
        b1.normalize_or_zero().extend(0.0),
        b2.normalize_or_zero().extend(0.0),
    )
}

/// Number of slots a step of length `step_len` fills, at most `trail_size`
pub fn local_count(step_len: f32, unit: f32, trail_size: usize) -> usize {
    if step_len.is_nan() || step_len <= 0.0 {
        return 0;
    }
    let count = (step_len / unit).ceil();
    if count.is_nan() {
        0
    } else {
        count.min(trail_size as f32) as usize
    }
}

impl TrailScheme {
    pub fn simulate(
        &self,
        state: TrailState,
        ctx: SimContext<'_>,
        buffers: &mut ParticleBuffers,
        _time: f64,
        step: u64,
    ) -> TrailState {
        let bound = AtomicSpeedBound::new(decay_speed_bound(
            state.speed_upper_bound,
            TRAIL_SPEED_FLOOR,
        ));
        let layout = TrailLayout::new(ctx.config, self, buffers.len());

        buffers
            .bundles_mut(layout.chunk(), layout.bundle_size)
            .for_each(|mut bundle| {
                let observed = self.simulate_bundle(&mut bundle, &layout, ctx, step);
                bound.raise(observed);
            });

        let speed_upper_bound = bound.into_inner();
        log::trace!(
            "trail frame {}: {} bundles of {} trails, speed bound {:.4}",
            step,
            layout.bundle_count,
            layout.bundle_size,
            speed_upper_bound
        );
        TrailState { speed_upper_bound }
    }

    /// Advance every trail of one bundle; returns the highest speed seen
    fn simulate_bundle(
        &self,
        bundle: &mut BundleMut<'_>,
        layout: &TrailLayout,
        ctx: SimContext<'_>,
        step: u64,
    ) -> f32 {
        let config = ctx.config;
        let dt = config.time_step;
        let scale = config.particle_scale_factor;
        let stride = layout.bundle_size;
        let ring = layout.chunk();
        let len = bundle.len();
        let anchors = bundle.anchor_count();
        let mut max_speed = 0.0f32;

        for sub in 0..layout.steps_per_frame {
            for anchor in 0..anchors {
                let mut pi = anchor + bundle.meta[anchor].leader;
                if pi >= len {
                    bundle.meta[anchor].leader = 0;
                    pi = anchor;
                }
                let origin = bundle.position[pi];

                let velocity = match self.map_mode {
                    MapMode::ForceField => {
                        let meta = &mut bundle.meta[anchor];
                        let velocity = meta.velocity;
                        meta.velocity += ctx.map.map(origin).truncate() * dt;
                        velocity.extend(0.0)
                    }
                    MapMode::Direct => ctx.map.map(origin),
                };
                let speed = velocity.length();
                if speed.is_finite() {
                    max_speed = max_speed.max(speed);
                }
                let mut delta = velocity * dt;

                let size = ctx
                    .generator
                    .update_size(config, bundle.global(anchor), sub)
                    .max(MIN_PARTICLE_SIZE);
                let unit = size * scale;

                let (b0, b1, b2) = orthonormal_frame(delta, bundle.rotation[pi].y_axis);

                if self.integration_step == IntegrationStep::LimitDelta {
                    let step_len = delta.length();
                    if step_len > 0.0 {
                        delta *= (MAX_STEP_IN_SIZES * unit / step_len).min(1.0);
                    }
                }

                let count = local_count(delta.length(), unit, layout.trail_size);
                let frame = Mat4::from_cols(b0, b1, b2, Vec4::W);
                let attribute = match self.compute_metadata {
                    ComputeMetadata::Speed => Some(delta),
                    ComputeMetadata::Tangent => Some(b0),
                    ComputeMetadata::Unspecified => None,
                };

                for li in 0..count {
                    let meta = &mut bundle.meta[anchor];
                    meta.leader = (meta.leader + stride) % ring;
                    let mut ii = anchor + meta.leader;
                    if ii >= len {
                        ii = anchor;
                        meta.leader = 0;
                    }

                    bundle.position[ii] = origin + delta * ((li + 1) as f32 / count as f32);
                    bundle.dimension[ii] = Vec4::splat(size);
                    bundle.rotation[ii] = frame;
                    if let Some(attribute) = attribute {
                        bundle.color[ii] = attribute;
                    }
                }

                if sub + 1 == layout.steps_per_frame {
                    if bundle.meta[anchor].life_len <= 0 {
                        ctx.generator.new_bundle(config, bundle, anchor, step);
                        let meta = &mut bundle.meta[anchor];
                        meta.leader = stride * (div_ceil(meta.leader, stride) % layout.trail_size);
                        if anchor + meta.leader >= len {
                            meta.leader = 0;
                        }
                    } else {
                        bundle.meta[anchor].life_len -= 1;
                    }
                }
            }
        }

        max_speed
    }
}
