//! Simulation scheme registry
//!
//! A scheme is selected at configuration time from a closed set. Its state
//! lives in a separate value that the caller threads through every call:
//! `simulate(state, inputs) -> new state`.

use serde::{Deserialize, Serialize};

use super::buffers::ParticleBuffers;
use super::generator::ParticleGenerator;
use super::ifs::IfsScheme;
use super::map::ChaoticMap;
use super::single_step::SingleStepScheme;
use super::trails::{TrailScheme, TrailState};
use crate::SystemConfig;

/// Everything a scheme reads from its owning system
#[derive(Clone, Copy)]
pub struct SimContext<'a> {
    pub config: &'a SystemConfig,
    pub map: &'a dyn ChaoticMap,
    pub generator: &'a dyn ParticleGenerator,
}

/// State of the seeding schemes, which only act after a break in the step counter
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ContinuityState {
    pub speed_upper_bound: f32,
    pub seeded: bool,
    pub last_step: u64,
    /// Round-robin chain cursor (IFS only)
    pub cursor: usize,
}

impl ContinuityState {
    /// Record `step`; clears `seeded` unless it directly follows the last one.
    ///
    /// Returns true if the step was continuous.
    pub fn observe_step(&mut self, step: u64) -> bool {
        let continuous = step == self.last_step.wrapping_add(1);
        if !continuous && self.seeded {
            log::warn!(
                "step counter jumped from {} to {}, reseeding",
                self.last_step,
                step
            );
        }
        self.seeded &= continuous;
        self.last_step = step;
        continuous
    }
}

/// Per-scheme state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SchemeState {
    Trails(TrailState),
    Continuity(ContinuityState),
}

impl SchemeState {
    pub fn speed_upper_bound(&self) -> f32 {
        match self {
            SchemeState::Trails(s) => s.speed_upper_bound,
            SchemeState::Continuity(s) => s.speed_upper_bound,
        }
    }
}

/// The available schemes and their parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum SchemeConfig {
    ParticlesWithTrails(TrailScheme),
    IfsScheme(IfsScheme),
    SingleStepScheme,
}

impl Default for SchemeConfig {
    fn default() -> Self {
        SchemeConfig::ParticlesWithTrails(TrailScheme::default())
    }
}

impl SchemeConfig {
    pub const ALL_NAMES: [&'static str; 3] =
        ["ParticlesWithTrails", "IfsScheme", "SingleStepScheme"];

    pub fn name(&self) -> &'static str {
        match self {
            SchemeConfig::ParticlesWithTrails(_) => "ParticlesWithTrails",
            SchemeConfig::IfsScheme(_) => "IfsScheme",
            SchemeConfig::SingleStepScheme => "SingleStepScheme",
        }
    }

    /// Build a scheme with default parameters from its name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "particleswithtrails" | "trails" => {
                Some(SchemeConfig::ParticlesWithTrails(TrailScheme::default()))
            }
            "ifsscheme" | "ifs" => Some(SchemeConfig::IfsScheme(IfsScheme::default())),
            "singlestepscheme" | "singlestep" => Some(SchemeConfig::SingleStepScheme),
            _ => None,
        }
    }

    pub fn initial_state(&self) -> SchemeState {
        match self {
            SchemeConfig::ParticlesWithTrails(_) => SchemeState::Trails(TrailState::default()),
            SchemeConfig::IfsScheme(_) | SchemeConfig::SingleStepScheme => {
                SchemeState::Continuity(ContinuityState::default())
            }
        }
    }

    /// Run one frame. A state belonging to another scheme is replaced by a fresh one.
    pub fn simulate(
        &self,
        state: SchemeState,
        ctx: SimContext<'_>,
        buffers: &mut ParticleBuffers,
        time: f64,
        step: u64,
    ) -> SchemeState {
        match (self, state) {
            (SchemeConfig::ParticlesWithTrails(scheme), SchemeState::Trails(s)) => {
                SchemeState::Trails(scheme.simulate(s, ctx, buffers, time, step))
            }
            (SchemeConfig::IfsScheme(scheme), SchemeState::Continuity(s)) => {
                SchemeState::Continuity(scheme.simulate(s, ctx, buffers, time, step))
            }
            (SchemeConfig::SingleStepScheme, SchemeState::Continuity(s)) => {
                SchemeState::Continuity(SingleStepScheme.simulate(s, ctx, buffers, time, step))
            }
            _ => self.simulate(self.initial_state(), ctx, buffers, time, step),
        }
    }
}

/// Active scheme plus its carried state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Simulation {
    pub scheme: SchemeConfig,
    pub state: SchemeState,
}

impl Simulation {
    pub fn new(scheme: SchemeConfig) -> Self {
        let state = scheme.initial_state();
        Self { scheme, state }
    }

    /// Switch scheme; the new one starts from a fresh state
    pub fn set_scheme(&mut self, scheme: SchemeConfig) {
        log::debug!("switching scheme {} -> {}", self.scheme.name(), scheme.name());
        *self = Self::new(scheme);
    }

    pub fn simulate(
        &mut self,
        ctx: SimContext<'_>,
        buffers: &mut ParticleBuffers,
        time: f64,
        step: u64,
    ) {
        self.state = self.scheme.simulate(self.state, ctx, buffers, time, step);
    }

    pub fn speed_upper_bound(&self) -> f32 {
        self.state.speed_upper_bound()
    }
}
