//! Values exchanged with the embedded simulation
//!
//! The `#[repr(C)]` structs match the simulation's C ABI layout so the
//! binding can hand them across without conversion.

use glam::Vec3;

use crate::consts::{SURFACE_DEFAULT, TERRAIN_GRASS};
use crate::coords::SimTransform;

/// Session-assigned key of a managed character
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CharacterId(pub u32);

/// Simulation-assigned character instance id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceHandle(pub i32);

/// Simulation-assigned surface object id
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SurfaceHandle(pub u32);

/// Per-tick controller input
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SimInputs {
    pub cam_look_x: f32,
    pub cam_look_z: f32,
    pub stick_x: f32,
    pub stick_y: f32,
    pub button_a: u8,
    pub button_b: u8,
    pub button_z: u8,
}

/// Character state written by each tick
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SimState {
    pub position: [f32; 3],
    pub velocity: [f32; 3],
    pub face_angle: f32,
    pub health: i16,
}

/// One collision triangle in simulation units
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimSurface {
    pub surface_type: i16,
    pub force: i16,
    pub terrain: u16,
    pub vertices: [[i32; 3]; 3],
}

impl SimSurface {
    /// Default-material triangle
    pub fn new(vertices: [[i32; 3]; 3]) -> Self {
        Self {
            surface_type: SURFACE_DEFAULT,
            force: 0,
            terrain: TERRAIN_GRASS,
            vertices,
        }
    }
}

/// A movable group of surfaces registered as one object
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceObject {
    pub transform: SimTransform,
    pub surfaces: Vec<SimSurface>,
}

/// Unindexed triangle list produced by every character tick
///
/// Arrays are sized for `capacity` triangles and overwritten in place; only
/// the first `triangle_count` triangles are live.
#[derive(Debug, Clone)]
pub struct TriangleSoup {
    pub position: Vec<f32>,
    pub normal: Vec<f32>,
    /// RGB in [0, 1]
    pub color: Vec<f32>,
    pub uv: Vec<f32>,
    pub triangle_count: u16,
}

impl TriangleSoup {
    pub fn with_capacity(max_triangles: usize) -> Self {
        let vertices = max_triangles * 3;
        Self {
            position: vec![0.0; vertices * 3],
            normal: vec![0.0; vertices * 3],
            color: vec![0.0; vertices * 3],
            uv: vec![0.0; vertices * 2],
            triangle_count: 0,
        }
    }

    /// Triangle capacity
    pub fn capacity(&self) -> usize {
        self.position.len() / 9
    }

    #[inline]
    pub fn vertex_position(&self, v: usize) -> Vec3 {
        Vec3::from_slice(&self.position[v * 3..v * 3 + 3])
    }

    #[inline]
    pub fn vertex_normal(&self, v: usize) -> Vec3 {
        Vec3::from_slice(&self.normal[v * 3..v * 3 + 3])
    }

    #[inline]
    pub fn vertex_color(&self, v: usize) -> [f32; 3] {
        [self.color[v * 3], self.color[v * 3 + 1], self.color[v * 3 + 2]]
    }

    #[inline]
    pub fn vertex_uv(&self, v: usize) -> [f32; 2] {
        [self.uv[v * 2], self.uv[v * 2 + 1]]
    }

    /// Write one triangle with a flat normal and color
    pub fn set_triangle(&mut self, t: usize, corners: [Vec3; 3], normal: Vec3, color: [f32; 3]) {
        for (i, corner) in corners.iter().enumerate() {
            let v = t * 3 + i;
            self.position[v * 3..v * 3 + 3].copy_from_slice(&corner.to_array());
            self.normal[v * 3..v * 3 + 3].copy_from_slice(&normal.to_array());
            self.color[v * 3..v * 3 + 3].copy_from_slice(&color);
            self.uv[v * 2..v * 2 + 2].copy_from_slice(&[0.0, 0.0]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_soup_capacity_and_accessors() {
        let mut soup = TriangleSoup::with_capacity(4);
        assert_eq!(soup.capacity(), 4);
        assert_eq!(soup.uv.len(), 4 * 3 * 2);

        soup.set_triangle(
            2,
            [Vec3::X, Vec3::Y, Vec3::Z],
            Vec3::Y,
            [0.5, 0.25, 1.0],
        );
        assert_eq!(soup.vertex_position(7), Vec3::Y);
        assert_eq!(soup.vertex_normal(8), Vec3::Y);
        assert_eq!(soup.vertex_color(6), [0.5, 0.25, 1.0]);
        assert_eq!(soup.vertex_uv(6), [0.0, 0.0]);
    }

    #[test]
    fn test_default_surface_material() {
        let s = SimSurface::new([[0; 3]; 3]);
        assert_eq!(s.surface_type, SURFACE_DEFAULT);
        assert_eq!(s.terrain, TERRAIN_GRASS);
        assert_eq!(s.force, 0);
    }
}
