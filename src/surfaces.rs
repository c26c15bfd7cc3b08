//! Host colliders → simulation surface objects
//!
//! Every supported collider the host adds becomes one surface object in the
//! simulation, keyed by collider identity. Host add/remove ordering relative
//! to the bridge is not guaranteed, so duplicate adds and unknown removes are
//! logged no-ops rather than failures.

use std::collections::BTreeMap;

use glam::Vec3;

use crate::coords::{HostTransform, to_sim_transform};
use crate::sim::{SimSurface, SimulationBackend, SurfaceHandle, SurfaceObject};

/// Opaque host key, unique per live collider
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ColliderId(pub u64);

/// Collider shape as reported by the host
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColliderShape {
    /// Full edge lengths in host units
    Box { dimensions: Vec3 },
    Sphere { radius: f32 },
    Capsule { radius: f32, height: f32 },
    Mesh,
}

/// What the host tells us about a collider when it is added
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColliderDescriptor {
    pub shape: ColliderShape,
    /// Current world placement
    pub world: HostTransform,
}

impl ColliderDescriptor {
    pub fn cuboid(dimensions: Vec3, world: HostTransform) -> Self {
        Self {
            shape: ColliderShape::Box { dimensions },
            world,
        }
    }
}

/// The 12 outward-facing triangles of a box centered on the origin
///
/// Faces come in +X, -X, +Y, -Y, +Z, -Z order, two triangles each, wound so
/// `(b - a) × (c - a)` points away from the center.
pub fn box_triangles(half_extents: Vec3) -> [[Vec3; 3]; 12] {
    let mut triangles = [[Vec3::ZERO; 3]; 12];
    let mut t = 0;

    for a in 0..3 {
        let (u, v) = ((a + 1) % 3, (a + 2) % 3);
        let e_a = Vec3::AXES[a] * half_extents[a];
        let e_u = Vec3::AXES[u] * half_extents[u];
        let e_v = Vec3::AXES[v] * half_extents[v];

        for sign in [1.0, -1.0] {
            let center = e_a * sign;
            let quad = [
                center - e_u - e_v,
                center + e_u - e_v,
                center + e_u + e_v,
                center - e_u + e_v,
            ];
            // u × v = a, so counter-clockwise quad order faces +a
            if sign > 0.0 {
                triangles[t] = [quad[0], quad[1], quad[2]];
                triangles[t + 1] = [quad[0], quad[2], quad[3]];
            } else {
                triangles[t] = [quad[0], quad[2], quad[1]];
                triangles[t + 1] = [quad[0], quad[3], quad[2]];
            }
            t += 2;
        }
    }

    triangles
}

/// Box collider → simulation triangles in object-local space
pub fn box_surfaces(dimensions: Vec3, extent_scale: f32) -> Vec<SimSurface> {
    let half = dimensions * extent_scale * 0.5;
    box_triangles(half)
        .iter()
        .map(|tri| SimSurface::new(tri.map(|v| [v.x as i32, v.y as i32, v.z as i32])))
        .collect()
}

/// Collider identity → surface handle, one entry per live supported collider
#[derive(Debug)]
pub struct SurfaceLifecycleBridge {
    entries: BTreeMap<ColliderId, SurfaceHandle>,
    extent_scale: f32,
}

impl SurfaceLifecycleBridge {
    pub fn new(extent_scale: f32) -> Self {
        Self {
            entries: BTreeMap::new(),
            extent_scale,
        }
    }

    /// Register a surface object for a newly added collider
    ///
    /// Returns the new handle, or `None` when the shape is unsupported or the
    /// collider already has a surface.
    pub fn on_collider_added<B: SimulationBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        id: ColliderId,
        collider: &ColliderDescriptor,
    ) -> Option<SurfaceHandle> {
        let ColliderShape::Box { dimensions } = collider.shape else {
            log::trace!("Ignoring collider {:?}: unsupported shape {:?}", id, collider.shape);
            return None;
        };

        if let Some(existing) = self.entries.get(&id) {
            log::warn!(
                "Collider {:?} added twice (already surface {:?}); ignoring",
                id,
                existing
            );
            return None;
        }

        let object = SurfaceObject {
            transform: to_sim_transform(&collider.world),
            surfaces: box_surfaces(dimensions, self.extent_scale),
        };
        let handle = backend.surface_object_create(&object);
        self.entries.insert(id, handle);
        log::debug!("Collider {:?} → surface {:?}", id, handle);

        Some(handle)
    }

    /// Deregister a removed collider's surface; `false` if it had none
    pub fn on_collider_removed<B: SimulationBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        id: ColliderId,
    ) -> bool {
        let Some(&handle) = self.entries.get(&id) else {
            log::trace!("Collider {:?} removed without a surface", id);
            return false;
        };

        // Deregister before the identity becomes reusable
        backend.surface_object_delete(handle);
        self.entries.remove(&id);
        log::debug!("Collider {:?} released surface {:?}", id, handle);

        true
    }

    /// Push current collider transforms to their surface objects
    ///
    /// Colliders the lookup no longer knows keep their last transform.
    pub fn sync_motion<B, F>(&self, backend: &mut B, lookup: F) -> usize
    where
        B: SimulationBackend + ?Sized,
        F: Fn(ColliderId) -> Option<HostTransform>,
    {
        let mut moved = 0;
        for (&id, &handle) in &self.entries {
            if let Some(world) = lookup(id) {
                backend.surface_object_move(handle, &to_sim_transform(&world));
                moved += 1;
            }
        }
        moved
    }

    /// Deregister every surface, in collider id order
    pub fn clear<B: SimulationBackend + ?Sized>(&mut self, backend: &mut B) {
        for (id, handle) in std::mem::take(&mut self.entries) {
            backend.surface_object_delete(handle);
            log::trace!("Released surface {:?} of collider {:?}", handle, id);
        }
    }

    pub fn handle(&self, id: ColliderId) -> Option<SurfaceHandle> {
        self.entries.get(&id).copied()
    }

    pub fn ids(&self) -> impl Iterator<Item = ColliderId> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
