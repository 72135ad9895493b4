//! Shared speed upper bound
//!
//! During the parallel phase of a frame every bundle worker may raise the
//! bound; nobody lowers it. The value lives in an `AtomicU32` as raw `f32`
//! bits and is raised with a compare-and-swap retry loop.

use std::sync::atomic::{AtomicU32, Ordering};

#[derive(Debug)]
pub struct AtomicSpeedBound(AtomicU32);

impl AtomicSpeedBound {
    pub fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    #[inline]
    pub fn get(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Acquire))
    }

    /// Raise the bound to at least `observed`.
    ///
    /// Returns the value that was current when the loop ended. Non-finite
    /// values and values not above the current bound leave it unchanged.
    pub fn raise(&self, observed: f32) -> f32 {
        if !observed.is_finite() {
            return self.get();
        }
        let mut current_bits = self.0.load(Ordering::Acquire);
        loop {
            let current = f32::from_bits(current_bits);
            let candidate = current.max(observed);
            if candidate <= current {
                return current;
            }
            match self.0.compare_exchange_weak(
                current_bits,
                candidate.to_bits(),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return candidate,
                Err(actual) => current_bits = actual,
            }
        }
    }

    pub fn into_inner(self) -> f32 {
        f32::from_bits(self.0.into_inner())
    }
}
