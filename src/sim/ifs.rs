//! Iterated-function-system scheme
//!
//! The buffer is split into `stride` interleaved chains: chain `c` holds
//! particles `c, c + stride, c + 2 * stride, ...`, and every element is the
//! map applied to its predecessor. Each frame one chain is recomputed
//! (round-robin cursor), so the whole attractor refreshes every `stride`
//! frames.

use glam::Vec4;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::buffers::ParticleBuffers;
use super::scheme::{ContinuityState, SimContext};
use crate::consts::{IFS_SEED_SPREAD, IFS_STRIDE, SEED_SPEED_FLOOR};
use crate::{ColorScheme, decay_speed_bound, homogenize, mix_seed};

/// Color of the fastest points
pub const HOT: Vec4 = Vec4::new(1.0, 0.2, 0.2, 1.0);
/// Color of slow points, and the fixed color scheme
pub const COLD: Vec4 = Vec4::new(0.2, 1.0, 0.2, 1.0);

/// Parameters of the IFS scheme
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IfsScheme {
    /// Number of interleaved chains
    pub stride: usize,
}

impl Default for IfsScheme {
    fn default() -> Self {
        Self { stride: IFS_STRIDE }
    }
}

impl IfsScheme {
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

        let n = buffers.len();
        let stride = self.stride.max(1);
        state.cursor = (state.cursor + 1) % stride;

        if !state.seeded {
            let mut rng = Pcg32::seed_from_u64(mix_seed(ctx.config.seed, 0, step));
            for p in buffers.position.iter_mut().take(stride) {
                *p = Vec4::new(rng.random::<f32>() * IFS_SEED_SPREAD, 0.0, 0.0, 1.0);
            }
            state.seeded = true;
            log::debug!("IFS seeded {} chains at step {}", stride.min(n), step);
        }

        // Speed is distance per time step; a zero step counts as one
        let dt = if ctx.config.time_step > 0.0 {
            ctx.config.time_step
        } else {
            1.0
        };

        for i in (state.cursor + stride..n).step_by(stride) {
            let prev = buffers.position[i - stride];
            let next = homogenize(ctx.map.map(prev));
            buffers.position[i] = next;

            match ctx.config.color_scheme {
                ColorScheme::Distance => {
                    let speed = (next - prev).length() / dt;
                    let a = (2.0 * speed / state.speed_upper_bound).clamp(0.0, 1.0);
                    if speed.is_finite() {
                        state.speed_upper_bound = state.speed_upper_bound.max(speed);
                    }
                    buffers.color[i] = HOT * a + COLD * (1.0 - a);
                }
                ColorScheme::Color => buffers.color[i] = COLD,
                ColorScheme::Unspecified => {}
            }
        }

        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SystemConfig;
    use crate::sim::generator::BubbleGenerator;
    use crate::sim::map::{ChaoticMap, MapConfig};

    fn config(n: usize, color_scheme: ColorScheme) -> SystemConfig {
        SystemConfig {
            particle_count: n,
            time_step: 1.0,
            color_scheme,
            ..Default::default()
        }
    }

    fn run(
        scheme: &IfsScheme,
        config: &SystemConfig,
        map: &dyn ChaoticMap,
        buffers: &mut ParticleBuffers,
        state: ContinuityState,
        step: u64,
    ) -> ContinuityState {
        let generator = BubbleGenerator::default();
        let ctx = SimContext {
            config,
            map,
            generator: &generator,
        };
        scheme.simulate(state, ctx, buffers, 0.0, step)
    }

    #[test]
    fn test_first_call_seeds_chain_heads() {
        let scheme = IfsScheme { stride: 4 };
        let config = config(20, ColorScheme::Color);
        let mut buffers = ParticleBuffers::new(20);

        let state = run(
            &scheme,
            &config,
            &MapConfig::DE_JONG,
            &mut buffers,
            ContinuityState::default(),
            1,
        );

        assert!(state.seeded);
        assert_eq!(state.cursor, 1);
        for p in &buffers.position[..4] {
            assert!(p.x >= 0.0 && p.x < IFS_SEED_SPREAD);
            assert_eq!((p.y, p.z, p.w), (0.0, 0.0, 1.0));
        }
    }

    #[test]
    fn test_iterates_only_cursor_chain() {
        let scheme = IfsScheme { stride: 4 };
        let config = config(20, ColorScheme::Color);
        let shift = |p: Vec4| p + Vec4::new(1.0, 0.0, 0.0, 7.0);
        let mut buffers = ParticleBuffers::new(20);

        run(&scheme, &config, &shift, &mut buffers, ContinuityState::default(), 1);

        // Cursor 1: chain 1, 5, 9, 13, 17
        let head = buffers.position[1].x;
        for (k, i) in [5, 9, 13, 17].into_iter().enumerate() {
            assert!((buffers.position[i].x - (head + (k + 1) as f32)).abs() < 1e-5);
            assert_eq!(buffers.position[i].w, 1.0);
            assert_eq!(buffers.color[i], COLD);
        }
        // Other chains untouched
        assert_eq!(buffers.position[6], Vec4::W);
        assert_eq!(buffers.color[6], Vec4::ZERO);
    }

    #[test]
    fn test_continuous_steps_do_not_reseed() {
        let scheme = IfsScheme { stride: 4 };
        let config = config(20, ColorScheme::Color);
        let mut buffers = ParticleBuffers::new(20);

        let state = run(
            &scheme,
            &config,
            &MapConfig::DE_JONG,
            &mut buffers,
            ContinuityState::default(),
            1,
        );
        // Mark a seed slot; continuous step must leave it alone
        buffers.position[0] = Vec4::new(0.5, 0.5, 0.5, 1.0);
        let state = run(&scheme, &config, &MapConfig::DE_JONG, &mut buffers, state, 2);
        assert_eq!(buffers.position[0], Vec4::new(0.5, 0.5, 0.5, 1.0));
        assert_eq!(state.cursor, 2);

        // Gap in the step counter forces a reseed
        let state = run(&scheme, &config, &MapConfig::DE_JONG, &mut buffers, state, 5);
        assert!(state.seeded);
        assert!(buffers.position[0].x < IFS_SEED_SPREAD);
        assert_eq!(state.last_step, 5);
    }

    #[test]
    fn test_repeated_step_forces_reseed() {
        let scheme = IfsScheme { stride: 4 };
        let config = config(8, ColorScheme::Color);
        let mut buffers = ParticleBuffers::new(8);

        let state = run(
            &scheme,
            &config,
            &MapConfig::DE_JONG,
            &mut buffers,
            ContinuityState::default(),
            3,
        );
        buffers.position[2] = Vec4::splat(9.0);
        run(&scheme, &config, &MapConfig::DE_JONG, &mut buffers, state, 3);
        assert!(buffers.position[2].x < IFS_SEED_SPREAD);
    }

    #[test]
    fn test_distance_coloring_ratchets_bound() {
        let scheme = IfsScheme { stride: 2 };
        let config = config(8, ColorScheme::Distance);
        // Every hop is 5 units long
        let hop = |p: Vec4| p + Vec4::new(3.0, 4.0, 0.0, 0.0);
        let mut buffers = ParticleBuffers::new(8);

        let state = run(&scheme, &config, &hop, &mut buffers, ContinuityState::default(), 1);

        assert!((state.speed_upper_bound - 5.0).abs() < 1e-4);
        // First hop is compared against the floor: fully hot
        assert_eq!(buffers.color[3], HOT);
        // Later hops: a = clamp(2 * 5 / 5) = 1
        assert_eq!(buffers.color[7], HOT);
    }

    #[test]
    fn test_distance_gradient_mixes_colors() {
        let scheme = IfsScheme { stride: 1 };
        let config = config(3, ColorScheme::Distance);
        let hop = |p: Vec4| p + Vec4::new(0.25, 0.0, 0.0, 0.0);
        let mut buffers = ParticleBuffers::new(3);
        let state = ContinuityState {
            speed_upper_bound: 4.0 / 0.75,
            ..Default::default()
        };

        let state = run(&scheme, &config, &hop, &mut buffers, state, 1);

        // Bound decays to 4, a = 2 * 0.25 / 4 = 0.125
        assert!((state.speed_upper_bound - 4.0).abs() < 1e-5);
        let expected = HOT * 0.125 + COLD * 0.875;
        assert!((buffers.color[1] - expected).length() < 1e-5);
    }

    #[test]
    fn test_infinite_hop_leaves_bound_finite() {
        let scheme = IfsScheme { stride: 2 };
        let config = config(8, ColorScheme::Distance);
        let blow_up = |p: Vec4| p + Vec4::new(f32::MAX, f32::MAX, 0.0, 0.0);
        let mut buffers = ParticleBuffers::new(8);

        let state = run(&scheme, &config, &blow_up, &mut buffers, ContinuityState::default(), 1);

        assert_eq!(state.speed_upper_bound, SEED_SPEED_FLOOR);
    }

    #[test]
    fn test_unspecified_color_scheme_leaves_color() {
        let scheme = IfsScheme { stride: 2 };
        let config = config(8, ColorScheme::Unspecified);
        let mut buffers = ParticleBuffers::new(8);

        run(&scheme, &config, &MapConfig::DE_JONG, &mut buffers, ContinuityState::default(), 1);

        assert!(buffers.color.iter().all(|c| *c == Vec4::ZERO));
    }

    #[test]
    fn test_buffer_smaller_than_stride() {
        let scheme = IfsScheme::default();
        let config = config(10, ColorScheme::Distance);
        let mut buffers = ParticleBuffers::new(10);

        let state = run(
            &scheme,
            &config,
            &MapConfig::DE_JONG,
            &mut buffers,
            ContinuityState::default(),
            1,
        );

        assert!(state.seeded);
        assert!(buffers.position.iter().all(|p| p.x < IFS_SEED_SPREAD));
    }
}
