//! Single-step scheme
//!
//! After every break in the step counter, each particle is reset by the
//! generator and pushed through the map once. Calls within a continuous
//! run do nothing.

use super::buffers::ParticleBuffers;
use super::scheme::{ContinuityState, SimContext};
use crate::consts::SEED_SPEED_FLOOR;
use crate::{decay_speed_bound, homogenize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SingleStepScheme;

impl SingleStepScheme {
    pub fn simulate(
        &self,
        mut state: ContinuityState,
        ctx: SimContext<'_>,
        buffers: &mut ParticleBuffers,
        _time: f64,
        step: u64,
    ) -> ContinuityState {
        state.observe_step(step);
        state.speed_upper_bound = decay_speed_bound(state.speed_upper_bound, SEED_SPEED_FLOOR);

        if !state.seeded {
            for i in 0..buffers.len() {
                ctx.generator.make_bubble(ctx.config, buffers, i, i, step);
                buffers.position[i] = homogenize(ctx.map.map(buffers.position[i]));
            }
            state.seeded = true;
            log::debug!("single-step reset {} particles at step {}", buffers.len(), step);
        }

        state
    }
}
