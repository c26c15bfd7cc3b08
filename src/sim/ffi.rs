//! libsm64 C ABI binding
//!
//! Only compiled with the `libsm64` feature; links against the native `sm64`
//! library. The library keeps one set of global state per process, guarded
//! here by [`GLOBAL_ACTIVE`].

use std::ffi::{CStr, c_char};
use std::sync::atomic::{AtomicBool, Ordering};

use glam::Vec3;

use super::backend::SimulationBackend;
use super::types::{
    InstanceHandle, SimInputs, SimState, SimSurface, SurfaceHandle, SurfaceObject, TriangleSoup,
};
use crate::consts::{MAX_TRIANGLES, TEXTURE_HEIGHT, TEXTURE_WIDTH};
use crate::coords::SimTransform;
use crate::error::BridgeError;

/// Set while some `Libsm64` owns the library's global state
static GLOBAL_ACTIVE: AtomicBool = AtomicBool::new(false);

#[repr(C)]
struct SM64SurfaceObject {
    transform: SimTransform,
    surface_count: u32,
    surfaces: *const SimSurface,
}

#[repr(C)]
struct SM64MarioGeometryBuffers {
    position: *mut f32,
    normal: *mut f32,
    color: *mut f32,
    uv: *mut f32,
    num_triangles_used: u16,
}

type DebugPrintFn = extern "C" fn(*const c_char);

#[link(name = "sm64")]
unsafe extern "C" {
    fn sm64_register_debug_print_function(function: DebugPrintFn);
    fn sm64_global_init(rom: *const u8, out_texture: *mut u8);
    fn sm64_global_terminate();

    fn sm64_static_surfaces_load(surfaces: *const SimSurface, num_surfaces: u32);

    fn sm64_mario_create(x: f32, y: f32, z: f32) -> i32;
    fn sm64_mario_tick(
        mario_id: i32,
        inputs: *const SimInputs,
        out_state: *mut SimState,
        out_buffers: *mut SM64MarioGeometryBuffers,
    );
    fn sm64_mario_delete(mario_id: i32);

    fn sm64_surface_object_create(object: *const SM64SurfaceObject) -> u32;
    fn sm64_surface_object_move(object_id: u32, transform: *const SimTransform);
    fn sm64_surface_object_delete(object_id: u32);
}

extern "C" fn forward_debug_print(message: *const c_char) {
    if message.is_null() {
        return;
    }
    // SAFETY: the library passes a NUL-terminated string valid for this call
    let text = unsafe { CStr::from_ptr(message) }.to_string_lossy();
    log::debug!(target: "sm64", "{}", text);
}

/// The native simulation library
#[derive(Debug)]
pub struct Libsm64 {
    initialized: bool,
    /// Full-size buffers for callers whose soup is smaller than the library writes
    scratch: TriangleSoup,
}

impl Libsm64 {
    pub fn new() -> Self {
        Self {
            initialized: false,
            scratch: TriangleSoup::with_capacity(MAX_TRIANGLES),
        }
    }
}

impl Default for Libsm64 {
    fn default() -> Self {
        Self::new()
    }
}

fn tick_into(
    instance: InstanceHandle,
    inputs: &SimInputs,
    state: &mut SimState,
    soup: &mut TriangleSoup,
) {
    let mut buffers = SM64MarioGeometryBuffers {
        position: soup.position.as_mut_ptr(),
        normal: soup.normal.as_mut_ptr(),
        color: soup.color.as_mut_ptr(),
        uv: soup.uv.as_mut_ptr(),
        num_triangles_used: 0,
    };
    // SAFETY: `soup` holds MAX_TRIANGLES triangles, the most the library writes
    unsafe { sm64_mario_tick(instance.0, inputs, state, &mut buffers) };
    soup.triangle_count = buffers.num_triangles_used;
}

impl SimulationBackend for Libsm64 {
    fn global_init(&mut self, rom: &[u8], texture: &mut [u8]) -> Result<(), BridgeError> {
        let expected = (TEXTURE_WIDTH * TEXTURE_HEIGHT * 4) as usize;
        if texture.len() != expected {
            return Err(BridgeError::TextureSize {
                expected,
                actual: texture.len(),
            });
        }
        if rom.is_empty() {
            return Err(BridgeError::EmptyAsset("rom".to_string()));
        }
        if GLOBAL_ACTIVE
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(BridgeError::GlobalStateBusy);
        }

        // SAFETY: both buffers outlive the call; the texture size was checked above
        unsafe { sm64_global_init(rom.as_ptr(), texture.as_mut_ptr()) };
        self.initialized = true;
        Ok(())
    }

    fn global_terminate(&mut self) {
        if !self.initialized {
            return;
        }
        // SAFETY: paired with the successful global_init above
        unsafe { sm64_global_terminate() };
        self.initialized = false;
        GLOBAL_ACTIVE.store(false, Ordering::Release);
    }

    fn install_debug_log(&mut self) {
        // SAFETY: the callback is a plain function with 'static lifetime
        unsafe { sm64_register_debug_print_function(forward_debug_print) };
    }

    fn load_static_surfaces(&mut self, surfaces: &[SimSurface]) {
        // SAFETY: SimSurface is #[repr(C)] and matches the library's surface layout
        unsafe { sm64_static_surfaces_load(surfaces.as_ptr(), surfaces.len() as u32) };
    }

    fn surface_object_create(&mut self, object: &SurfaceObject) -> SurfaceHandle {
        let raw = SM64SurfaceObject {
            transform: object.transform,
            surface_count: object.surfaces.len() as u32,
            surfaces: object.surfaces.as_ptr(),
        };
        // SAFETY: the library copies the surfaces before returning
        SurfaceHandle(unsafe { sm64_surface_object_create(&raw) })
    }

    fn surface_object_move(&mut self, handle: SurfaceHandle, transform: &SimTransform) {
        // SAFETY: SimTransform is #[repr(C)] { float[3], float[3] }
        unsafe { sm64_surface_object_move(handle.0, transform) };
    }

    fn surface_object_delete(&mut self, handle: SurfaceHandle) {
        // SAFETY: unknown ids are ignored by the library
        unsafe { sm64_surface_object_delete(handle.0) };
    }

    fn character_create(&mut self, position: Vec3) -> Result<InstanceHandle, BridgeError> {
        // SAFETY: plain value arguments
        let id = unsafe { sm64_mario_create(position.x, position.y, position.z) };
        if id < 0 {
            return Err(BridgeError::CharacterSpawnFailed(position));
        }
        Ok(InstanceHandle(id))
    }

    fn character_tick(
        &mut self,
        instance: InstanceHandle,
        inputs: &SimInputs,
        state: &mut SimState,
        geometry: &mut TriangleSoup,
    ) {
        if geometry.capacity() >= MAX_TRIANGLES {
            tick_into(instance, inputs, state, geometry);
            return;
        }

        tick_into(instance, inputs, state, &mut self.scratch);
        let count = (self.scratch.triangle_count as usize).min(geometry.capacity());
        geometry.position[..count * 9].copy_from_slice(&self.scratch.position[..count * 9]);
        geometry.normal[..count * 9].copy_from_slice(&self.scratch.normal[..count * 9]);
        geometry.color[..count * 9].copy_from_slice(&self.scratch.color[..count * 9]);
        geometry.uv[..count * 6].copy_from_slice(&self.scratch.uv[..count * 6]);
        geometry.triangle_count = self.scratch.triangle_count;
    }

    fn character_delete(&mut self, instance: InstanceHandle) {
        // SAFETY: plain value argument
        unsafe { sm64_mario_delete(instance.0) };
    }
}

impl Drop for Libsm64 {
    fn drop(&mut self) {
        self.global_terminate();
    }
}
