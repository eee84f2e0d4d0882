//! Rejection sampling of donut transforms around an exclusion box.

use std::f32::consts::PI;
use std::num::NonZeroU32;

use glam::{EulerRot, Mat4, Quat, Vec3};
use log::warn;
use rand::Rng;

use crate::aabb::Aabb3;
use crate::error::PlacementError;

/// Half-width of the cube positions are drawn from
pub const SPREAD: f32 = 5.0;

/// Position, X/Y rotation and uniform scale of one donut.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub position: Vec3,
    /// Euler angles about X then Y; Z rotation is always zero
    pub rotation: [f32; 2],
    pub scale: f32,
}

impl Placement {
    /// Draws position, rotation and scale in that order
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let x = rng.gen::<f32>() * 2.0 * SPREAD - SPREAD;
        let y = rng.gen::<f32>() * 2.0 * SPREAD - SPREAD;
        let z = rng.gen::<f32>() * 2.0 * SPREAD - SPREAD;
        let rotation_x = rng.gen::<f32>() * PI;
        let rotation_y = rng.gen::<f32>() * PI;
        let scale = rng.gen::<f32>();
        Placement {
            position: Vec3::new(x, y, z),
            rotation: [rotation_x, rotation_y],
            scale,
        }
    }

    pub fn matrix(&self) -> Mat4 {
        let rotation = Quat::from_euler(EulerRot::XYZ, self.rotation[0], self.rotation[1], 0.0);
        Mat4::from_scale_rotation_translation(Vec3::splat(self.scale), rotation, self.position)
    }
}

/// Draws placements whose world box stays clear of an exclusion box.
///
/// Candidates are only tested against the exclusion box, never against each
/// other, so accepted donuts may overlap.
#[derive(Debug, Clone, Copy)]
pub struct PlacementSampler {
    exclusion: Aabb3,
    local_bounds: Aabb3,
    max_attempts: Option<NonZeroU32>,
}

impl PlacementSampler {
    /// `local_bounds` is the box of the geometry being placed; without a cap
    /// the sampler retries until it succeeds.
    pub fn new(exclusion: Aabb3, local_bounds: Aabb3, max_attempts: Option<NonZeroU32>) -> Self {
        PlacementSampler {
            exclusion,
            local_bounds,
            max_attempts,
        }
    }

    pub fn world_bounds(&self, placement: &Placement) -> Aabb3 {
        self.local_bounds.transformed(&placement.matrix())
    }

    pub fn place<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Placement, PlacementError> {
        let mut attempts: u32 = 0;
        loop {
            let candidate = Placement::random(rng);
            attempts = attempts.saturating_add(1);
            if !self.world_bounds(&candidate).intersects(&self.exclusion) {
                return Ok(candidate);
            }
            if let Some(max) = self.max_attempts {
                if attempts >= max.get() {
                    return Err(PlacementError::Exhausted { attempts });
                }
            }
        }
    }

    /// Places up to `count` donuts; exhausted draws are logged and left out.
    pub fn scatter<R: Rng + ?Sized>(&self, rng: &mut R, count: usize) -> Vec<Placement> {
        let mut placements = Vec::with_capacity(count);
        for index in 0..count {
            match self.place(rng) {
                Ok(placement) => placements.push(placement),
                Err(err) => warn!("skipping donut {index}: {err}"),
            }
        }
        placements
    }
}
