//! Particle buffers and per-trail metadata
//!
//! All arrays are indexed by a dense particle id in `[0, N)`. A trail anchored
//! at slot `i` of a bundle with `B` trails owns slots `i, i + B, i + 2B, ...`
//! of that bundle, so a bundle of `T`-slot trails is one contiguous chunk of
//! `B * T` particles.

use std::iter::StepBy;
use std::ops::Range;

use glam::{Mat4, Vec3, Vec4};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Mutable state of one trail, stored at its anchor index
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TrailMeta {
    /// Offset of the most recently written slot, relative to the anchor
    pub leader: usize,
    /// Frames left before the trail is respawned
    pub life_len: i32,
    /// Accumulated velocity (force-field mode only)
    pub velocity: Vec3,
}

/// Shared particle arrays, all of the same length
#[derive(Debug, Clone)]
pub struct ParticleBuffers {
    pub position: Vec<Vec4>,
    /// Size replicated in all four components
    pub dimension: Vec<Vec4>,
    /// Orientation frame: basis in `x_axis`, `y_axis`, `z_axis`
    pub rotation: Vec<Mat4>,
    pub color: Vec<Vec4>,
    /// Only entries at trail anchors are meaningful
    pub meta: Vec<TrailMeta>,
}

impl ParticleBuffers {
    pub fn new(count: usize) -> Self {
        Self {
            position: vec![Vec4::W; count],
            dimension: vec![Vec4::ZERO; count],
            rotation: vec![Mat4::IDENTITY; count],
            color: vec![Vec4::ZERO; count],
            meta: vec![TrailMeta::default(); count],
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.position.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.position.is_empty()
    }

    /// Split every array into disjoint bundles of `chunk` particles.
    ///
    /// `stride` is the number of trails per bundle (slot spacing of a trail).
    /// The last bundle is shorter when `chunk` does not divide `N`.
    pub fn bundles_mut(
        &mut self,
        chunk: usize,
        stride: usize,
    ) -> impl IndexedParallelIterator<Item = BundleMut<'_>> {
        let chunk = chunk.max(1);
        let stride = stride.max(1);
        debug_assert!(
            [
                self.dimension.len(),
                self.rotation.len(),
                self.color.len(),
                self.meta.len()
            ]
            .iter()
            .all(|&len| len == self.position.len()),
            "particle arrays must share one length"
        );

        self.position
            .par_chunks_mut(chunk)
            .zip(self.dimension.par_chunks_mut(chunk))
            .zip(self.rotation.par_chunks_mut(chunk))
            .zip(self.color.par_chunks_mut(chunk))
            .zip(self.meta.par_chunks_mut(chunk))
            .enumerate()
            .map(
                move |(index, ((((position, dimension), rotation), color), meta))| BundleMut {
                    offset: index * chunk,
                    stride,
                    position,
                    dimension,
                    rotation,
                    color,
                    meta,
                },
            )
    }

    /// Raw bytes of the position array, ready for upload
    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.position)
    }

    pub fn dimension_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.dimension)
    }

    pub fn rotation_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.rotation)
    }

    pub fn color_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.color)
    }
}

/// Exclusive view of one bundle's particles
#[derive(Debug)]
pub struct BundleMut<'a> {
    /// Global index of the first particle
    pub offset: usize,
    /// Trails in this bundle, also the slot spacing within a trail
    pub stride: usize,
    pub position: &'a mut [Vec4],
    pub dimension: &'a mut [Vec4],
    pub rotation: &'a mut [Mat4],
    pub color: &'a mut [Vec4],
    pub meta: &'a mut [TrailMeta],
}

impl BundleMut<'_> {
    #[inline]
    pub fn len(&self) -> usize {
        self.position.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.position.is_empty()
    }

    /// Number of trail anchors in this bundle (shorter for a truncated bundle)
    #[inline]
    pub fn anchor_count(&self) -> usize {
        self.stride.min(self.len())
    }

    /// Local slot indices owned by the trail anchored at `anchor`
    pub fn trail_slots(&self, anchor: usize) -> StepBy<Range<usize>> {
        (anchor..self.len()).step_by(self.stride)
    }

    /// Global particle index of a local slot
    #[inline]
    pub fn global(&self, local: usize) -> usize {
        self.offset + local
    }
}
