//! In-process stand-in for the native simulation
//!
//! Keeps the same contract as the C library (global window, static surfaces,
//! surface objects, characters) with deliberately simple character motion:
//! stick input drives horizontal velocity, gravity pulls down to the highest
//! static surface under the character in x/z, the body is a 12-triangle box.
//! Every registration is recorded so callers can inspect what the bridge did.

use std::collections::BTreeMap;

use glam::Vec3;

use super::backend::SimulationBackend;
use super::types::{
    InstanceHandle, SimInputs, SimState, SimSurface, SurfaceHandle, SurfaceObject, TriangleSoup,
};
use crate::consts::{TEXTURE_HEIGHT, TEXTURE_WIDTH};
use crate::coords::SimTransform;
use crate::error::BridgeError;
use crate::surfaces::box_triangles;

/// Horizontal speed at full stick deflection, units per tick
const RUN_SPEED: f32 = 32.0;
/// Downward acceleration, units per tick²
const GRAVITY: f32 = 4.0;
/// Launch speed of a jump, units per tick
const JUMP_SPEED: f32 = 42.0;
/// Full health in the simulation's encoding
const FULL_HEALTH: i16 = 0x880;
/// Half extents of the placeholder body
const BODY_HALF_EXTENTS: Vec3 = Vec3::new(40.0, 80.0, 40.0);

#[derive(Debug, Clone)]
struct Character {
    position: Vec3,
    velocity: Vec3,
    face_angle: f32,
    ticks: u64,
}

/// Deterministic in-process simulation backend
#[derive(Debug, Default)]
pub struct HeadlessSimulation {
    initialized: bool,
    debug_log: bool,
    static_surfaces: Vec<SimSurface>,
    objects: BTreeMap<SurfaceHandle, SurfaceObject>,
    next_object: u32,
    deleted_objects: usize,
    characters: BTreeMap<i32, Character>,
    next_character: i32,
}

impl HeadlessSimulation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn debug_log_installed(&self) -> bool {
        self.debug_log
    }

    pub fn static_surfaces(&self) -> &[SimSurface] {
        &self.static_surfaces
    }

    pub fn surface_objects(&self) -> &BTreeMap<SurfaceHandle, SurfaceObject> {
        &self.objects
    }

    pub fn surface_object(&self, handle: SurfaceHandle) -> Option<&SurfaceObject> {
        self.objects.get(&handle)
    }

    /// Surface objects deleted over this backend's lifetime
    pub fn deleted_surface_count(&self) -> usize {
        self.deleted_objects
    }

    pub fn live_characters(&self) -> usize {
        self.characters.len()
    }

    /// Ticks run by a live character
    pub fn ticks_run(&self, instance: InstanceHandle) -> Option<u64> {
        self.characters.get(&instance.0).map(|c| c.ticks)
    }

    /// Height of the highest static surface whose x/z footprint covers `position`
    ///
    /// Surfaces are treated as flat at their highest vertex.
    fn floor_height_at(&self, position: Vec3) -> Option<f32> {
        self.static_surfaces
            .iter()
            .filter(|s| covers_xz(s.vertices, position.x, position.z))
            .map(|s| s.vertices.iter().map(|v| v[1] as f32).fold(f32::MIN, f32::max))
            .reduce(f32::max)
    }

    fn print(&self, message: &str) {
        if self.debug_log {
            log::debug!(target: "sm64", "{}", message);
        }
    }

    fn require_init(&self, op: &str) {
        debug_assert!(self.initialized, "{op} called outside the global init window");
    }
}

/// Whether the triangle's projection onto the x/z plane contains (x, z)
fn covers_xz(vertices: [[i32; 3]; 3], x: f32, z: f32) -> bool {
    let [a, b, c] = vertices.map(|v| (v[0] as f32, v[2] as f32));
    let edge = |(x0, z0): (f32, f32), (x1, z1): (f32, f32)| (x1 - x0) * (z - z0) - (z1 - z0) * (x - x0);
    let (d0, d1, d2) = (edge(a, b), edge(b, c), edge(c, a));
    let has_neg = d0 < 0.0 || d1 < 0.0 || d2 < 0.0;
    let has_pos = d0 > 0.0 || d1 > 0.0 || d2 > 0.0;
    !(has_neg && has_pos)
}

impl SimulationBackend for HeadlessSimulation {
    fn global_init(&mut self, rom: &[u8], texture: &mut [u8]) -> Result<(), BridgeError> {
        if self.initialized {
            return Err(BridgeError::GlobalStateBusy);
        }
        if rom.is_empty() {
            return Err(BridgeError::EmptyAsset("rom".to_string()));
        }
        let expected = (TEXTURE_WIDTH * TEXTURE_HEIGHT * 4) as usize;
        if texture.len() != expected {
            return Err(BridgeError::TextureSize {
                expected,
                actual: texture.len(),
            });
        }

        // Checkerboard atlas tinted by the payload so it is visibly non-empty
        let tint = rom[0];
        let width = TEXTURE_WIDTH as usize;
        for (i, pixel) in texture.chunks_exact_mut(4).enumerate() {
            let (x, y) = (i % width, i / width);
            let on = (x / 8 + y / 8) % 2 == 0;
            let value = if on { 255 } else { tint };
            pixel.copy_from_slice(&[value, value, value, 255]);
        }

        self.initialized = true;
        self.print("headless simulation initialized");
        Ok(())
    }

    fn global_terminate(&mut self) {
        self.print("headless simulation terminated");
        *self = Self {
            debug_log: self.debug_log,
            deleted_objects: self.deleted_objects,
            ..Self::default()
        };
    }

    fn install_debug_log(&mut self) {
        self.debug_log = true;
    }

    fn load_static_surfaces(&mut self, surfaces: &[SimSurface]) {
        self.require_init("load_static_surfaces");
        self.static_surfaces.extend_from_slice(surfaces);
    }

    fn surface_object_create(&mut self, object: &SurfaceObject) -> SurfaceHandle {
        self.require_init("surface_object_create");
        let handle = SurfaceHandle(self.next_object);
        self.next_object += 1;
        self.objects.insert(handle, object.clone());
        handle
    }

    fn surface_object_move(&mut self, handle: SurfaceHandle, transform: &SimTransform) {
        if let Some(object) = self.objects.get_mut(&handle) {
            object.transform = *transform;
        }
    }

    fn surface_object_delete(&mut self, handle: SurfaceHandle) {
        if self.objects.remove(&handle).is_some() {
            self.deleted_objects += 1;
        } else {
            self.print(&format!("delete of unknown surface object {}", handle.0));
        }
    }

    fn character_create(&mut self, position: Vec3) -> Result<InstanceHandle, BridgeError> {
        self.require_init("character_create");
        if self.floor_height_at(position).is_none() {
            self.print("no floor below spawn point");
            return Err(BridgeError::CharacterSpawnFailed(position));
        }

        let id = self.next_character;
        self.next_character += 1;
        self.characters.insert(
            id,
            Character {
                position,
                velocity: Vec3::ZERO,
                face_angle: 0.0,
                ticks: 0,
            },
        );
        Ok(InstanceHandle(id))
    }

    fn character_tick(
        &mut self,
        instance: InstanceHandle,
        inputs: &SimInputs,
        state: &mut SimState,
        geometry: &mut TriangleSoup,
    ) {
        let Some(position) = self.characters.get(&instance.0).map(|c| c.position) else {
            return;
        };
        // Off every floor the character keeps falling
        let floor = self.floor_height_at(position).unwrap_or(f32::MIN);
        let Some(c) = self.characters.get_mut(&instance.0) else {
            return;
        };

        let grounded = c.position.y <= floor;
        c.velocity.x = inputs.stick_x * RUN_SPEED;
        c.velocity.z = inputs.stick_y * RUN_SPEED;
        if grounded && inputs.button_a != 0 {
            c.velocity.y = JUMP_SPEED;
        } else {
            c.velocity.y -= GRAVITY;
        }
        c.position += c.velocity;
        if c.position.y < floor {
            c.position.y = floor;
            c.velocity.y = 0.0;
        }
        if c.velocity.x != 0.0 || c.velocity.z != 0.0 {
            c.face_angle = c.velocity.x.atan2(c.velocity.z);
        }
        c.ticks += 1;

        *state = SimState {
            position: c.position.to_array(),
            velocity: c.velocity.to_array(),
            face_angle: c.face_angle,
            health: FULL_HEALTH,
        };

        let center = c.position + Vec3::Y * BODY_HALF_EXTENTS.y;
        let triangles = box_triangles(BODY_HALF_EXTENTS);
        let count = triangles.len().min(geometry.capacity());
        for (t, tri) in triangles.iter().take(count).enumerate() {
            let normal = (tri[1] - tri[0]).cross(tri[2] - tri[0]).normalize_or_zero();
            let shade = 0.5 + 0.5 * normal.y.abs();
            geometry.set_triangle(t, tri.map(|v| v + center), normal, [shade, 0.1, 0.1]);
        }
        geometry.triangle_count = count as u16;
    }

    fn character_delete(&mut self, instance: InstanceHandle) {
        if self.characters.remove(&instance.0).is_none() {
            self.print(&format!("delete of unknown character {}", instance.0));
        }
    }
}
