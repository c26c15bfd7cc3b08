//! Host ↔ simulation coordinate conversion
//!
//! The host describes placement as position + quaternion + scale. The
//! simulation wants position + Euler angles (radians, Y-X-Z intrinsic order)
//! and works at 100× the host's linear scale. Everything here is pure.

use glam::{Affine3A, EulerRot, Mat3, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Host-space placement of an entity or collider (read-only to the bridge)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HostTransform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for HostTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl HostTransform {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            scale: Vec3::ONE,
        }
    }

    /// Affine matrix T·R·S
    pub fn to_affine(&self) -> Affine3A {
        Affine3A::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

/// Simulation-space placement, derived from a [`HostTransform`] on every use
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SimTransform {
    pub position: [f32; 3],
    /// Radians, stored as (x, y, z)
    pub euler_rotation: [f32; 3],
}

/// Convert a host transform to the simulation's object transform
///
/// Position is copied unchanged: only geometry vertices are rescaled, the
/// simulation consumes object positions in its native scale.
pub fn to_sim_transform(transform: &HostTransform) -> SimTransform {
    let (y, x, z) = transform.rotation.normalize().to_euler(EulerRot::YXZ);
    SimTransform {
        position: transform.position.to_array(),
        euler_rotation: [x, y, z],
    }
}

/// Inverse of the host transform; compute once per frame, apply per vertex
pub fn host_inverse(transform: &HostTransform) -> Affine3A {
    transform.to_affine().inverse()
}

/// Map a simulation-space point into host-local render space
#[inline]
pub fn to_host_space(sim_position: Vec3, inverse: &Affine3A, scale: f32) -> Vec3 {
    inverse.transform_point3(sim_position) * scale
}

/// Inverse-transpose of the linear part of `inverse`
///
/// Only needed for normals when the host transform carries non-uniform scale.
pub fn normal_matrix(inverse: &Affine3A) -> Mat3 {
    Mat3::from(inverse.matrix3).inverse().transpose()
}
