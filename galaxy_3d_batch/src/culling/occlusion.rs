/// Occlusion rejection for the culled path.
///
/// Only instances flagged occludable are tested. Each frame tests a
/// rotating subset (`(id + frame) % test_rate == 0`); the others reuse
/// their last result.
///
/// The test runs in world space: a ray from the camera to the instance's
/// bounding sphere, stopping at the sphere's near side, against the
/// occluder. With a planet configured, a closed-form horizon test runs
/// first and instances closer than `min_distance` are never tested.

use glam::Vec3;
use crate::math::{BoundingSphere, Ray};

/// Geometry that can hide instances.
pub trait Occluder: Send + Sync {
    /// Whether the ray hits the occluder within `[near, far]`.
    fn raycast(&self, ray: &Ray, near: f32, far: f32) -> bool;
}

/// Solid sphere occluder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereOccluder {
    pub sphere: BoundingSphere,
}

impl SphereOccluder {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { sphere: BoundingSphere::new(center, radius) }
    }
}

impl Occluder for SphereOccluder {
    fn raycast(&self, ray: &Ray, near: f32, far: f32) -> bool {
        match ray.intersect_sphere(&self.sphere) {
            Some(t) => t >= near && t <= far,
            None => false,
        }
    }
}

/// Spherical ground used by the horizon test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Planet {
    pub center: Vec3,
    pub radius: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OcclusionConfig {
    /// Each instance is re-tested every `test_rate` frames (0 behaves as 1)
    pub test_rate: u32,
    pub planet: Option<Planet>,
    /// Camera distance under which instances are never tested (planet only)
    pub min_distance: f32,
}

impl Default for OcclusionConfig {
    fn default() -> Self {
        Self {
            test_rate: 1,
            planet: None,
            min_distance: 0.0,
        }
    }
}

/// Whether `point` lies below the horizon of `planet` seen from `camera`.
pub fn horizon_occluded(camera: Vec3, point: Vec3, planet: &Planet) -> bool {
    let vc = camera - planet.center;
    let vt = point - camera;
    let vh_sq = vc.length_squared() - planet.radius * planet.radius;
    let vt_dot_vc = -vt.dot(vc);

    vt_dot_vc > vh_sq && vt_dot_vc * vt_dot_vc / vt.length_squared() > vh_sq
}

/// Occlusion settings plus the per-instance result cache.
pub(crate) struct OcclusionState {
    config: OcclusionConfig,
    occluder: Option<Box<dyn Occluder>>,
    cache: Vec<bool>,
    frame: u32,
}

impl OcclusionState {
    pub fn new(config: OcclusionConfig, occluder: Option<Box<dyn Occluder>>) -> Self {
        Self { config, occluder, cache: Vec::new(), frame: 0 }
    }

    pub fn config(&self) -> &OcclusionConfig {
        &self.config
    }

    pub fn begin_frame(&mut self) {
        self.frame = self.frame.wrapping_add(1);
    }

    /// Forget the cached result of a recycled id.
    pub fn forget(&mut self, id: u32) {
        if let Some(slot) = self.cache.get_mut(id as usize) {
            *slot = false;
        }
    }

    /// Occlusion result for an instance this frame. `sphere` is in world space.
    pub fn is_occluded(&mut self, id: u32, camera: Vec3, sphere: &BoundingSphere) -> bool {
        let slot = id as usize;
        if slot >= self.cache.len() {
            self.cache.resize(slot + 1, false);
        }

        let rate = self.config.test_rate.max(1);
        if id.wrapping_add(self.frame) % rate != 0 {
            return self.cache[slot];
        }

        let occluded = self.test(camera, sphere);
        self.cache[slot] = occluded;
        occluded
    }

    fn test(&self, camera: Vec3, sphere: &BoundingSphere) -> bool {
        let to_instance = sphere.center - camera;
        let distance = to_instance.length();

        if let Some(planet) = &self.config.planet {
            if distance < self.config.min_distance {
                return false;
            }
            if horizon_occluded(camera, sphere.center, planet) {
                return true;
            }
        }

        let Some(occluder) = &self.occluder else {
            return false;
        };
        let far = distance - sphere.radius;
        if far <= 0.0 {
            return false;
        }
        let ray = Ray::new(camera, to_instance / distance);
        occluder.raycast(&ray, 0.0, far)
    }
}

#[cfg(test)]
#[path = "occlusion_tests.rs"]
mod tests;
