//! Chaotic maps
//!
//! A map is a pure function of a 4-component point. Flows return a
//! derivative (w = 0) that the trail scheme scales by the time step; point
//! maps return the next point (w = 1) and drive the IFS scheme.
//!
//! Maps are evaluated concurrently from every bundle worker, so the trait
//! requires `Send + Sync` and takes `&self`.

use glam::Vec4;
use serde::{Deserialize, Serialize};

/// A stateless dynamical map
pub trait ChaoticMap: Send + Sync {
    fn map(&self, p: Vec4) -> Vec4;
}

impl<F> ChaoticMap for F
where
    F: Fn(Vec4) -> Vec4 + Send + Sync,
{
    #[inline]
    fn map(&self, p: Vec4) -> Vec4 {
        self(p)
    }
}

/// Built-in maps, selectable from a config file
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum MapConfig {
    /// Lorenz flow
    Lorenz { sigma: f32, rho: f32, beta: f32 },
    /// Rössler flow
    Rossler { a: f32, b: f32, c: f32 },
    /// Thomas' cyclically symmetric flow
    Thomas { b: f32 },
    /// Peter de Jong point map (x, y) with a bounded third coordinate
    DeJong { a: f32, b: f32, c: f32, d: f32 },
    /// Clifford point map (x, y) with a bounded third coordinate
    Clifford { a: f32, b: f32, c: f32, d: f32 },
    /// Same output everywhere
    Constant { delta: Vec4 },
}

impl Default for MapConfig {
    fn default() -> Self {
        MapConfig::LORENZ
    }
}

impl MapConfig {
    /// Classic Lorenz parameters
    pub const LORENZ: Self = MapConfig::Lorenz {
        sigma: 10.0,
        rho: 28.0,
        beta: 8.0 / 3.0,
    };
    pub const ROSSLER: Self = MapConfig::Rossler {
        a: 0.2,
        b: 0.2,
        c: 5.7,
    };
    pub const THOMAS: Self = MapConfig::Thomas { b: 0.208_186 };
    pub const DE_JONG: Self = MapConfig::DeJong {
        a: 1.4,
        b: -2.3,
        c: 2.4,
        d: -2.1,
    };
    pub const CLIFFORD: Self = MapConfig::Clifford {
        a: -1.4,
        b: 1.6,
        c: 1.0,
        d: 0.7,
    };

    pub fn name(&self) -> &'static str {
        match self {
            MapConfig::Lorenz { .. } => "Lorenz",
            MapConfig::Rossler { .. } => "Rossler",
            MapConfig::Thomas { .. } => "Thomas",
            MapConfig::DeJong { .. } => "DeJong",
            MapConfig::Clifford { .. } => "Clifford",
            MapConfig::Constant { .. } => "Constant",
        }
    }

    /// True if the output is a derivative rather than the next point
    pub fn is_flow(&self) -> bool {
        matches!(
            self,
            MapConfig::Lorenz { .. }
                | MapConfig::Rossler { .. }
                | MapConfig::Thomas { .. }
                | MapConfig::Constant { .. }
        )
    }
}

impl ChaoticMap for MapConfig {
    fn map(&self, p: Vec4) -> Vec4 {
        let (x, y, z) = (p.x, p.y, p.z);
        match *self {
            MapConfig::Lorenz { sigma, rho, beta } => Vec4::new(
                sigma * (y - x),
                x * (rho - z) - y,
                x * y - beta * z,
                0.0,
            ),
            MapConfig::Rossler { a, b, c } => {
                Vec4::new(-y - z, x + a * y, b + z * (x - c), 0.0)
            }
            MapConfig::Thomas { b } => Vec4::new(
                y.sin() - b * x,
                z.sin() - b * y,
                x.sin() - b * z,
                0.0,
            ),
            MapConfig::DeJong { a, b, c, d } => Vec4::new(
                (a * y).sin() - (b * x).cos(),
                (c * x).sin() - (d * y).cos(),
                (a * z).sin() - (d * x).cos(),
                1.0,
            ),
            MapConfig::Clifford { a, b, c, d } => Vec4::new(
                (a * y).sin() + c * (a * x).cos(),
                (b * x).sin() + d * (b * y).cos(),
                (b * z).sin() + c * (a * y).cos(),
                1.0,
            ),
            MapConfig::Constant { delta } => delta,
        }
    }
}
