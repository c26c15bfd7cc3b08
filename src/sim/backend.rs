//! The embedded simulation as a capability set
//!
//! The rest of the crate only sees this trait. `ffi::Libsm64` binds it to the
//! native library, `headless::HeadlessSimulation` runs in-process.

use glam::Vec3;

use super::types::{
    InstanceHandle, SimInputs, SimState, SimSurface, SurfaceHandle, SurfaceObject, TriangleSoup,
};
use crate::coords::SimTransform;
use crate::error::BridgeError;

/// Process-wide simulation entry points
///
/// Global state is valid between `global_init` and `global_terminate`; every
/// other call must happen inside that window. Callers are single-threaded.
pub trait SimulationBackend {
    /// Initialize global state from the asset payload, filling `texture` (RGBA8)
    fn global_init(&mut self, rom: &[u8], texture: &mut [u8]) -> Result<(), BridgeError>;

    fn global_terminate(&mut self);

    /// Route the simulation's debug prints into the `log` facade
    fn install_debug_log(&mut self);

    /// Level geometry that lives until `global_terminate`
    fn load_static_surfaces(&mut self, surfaces: &[SimSurface]);

    fn surface_object_create(&mut self, object: &SurfaceObject) -> SurfaceHandle;

    fn surface_object_move(&mut self, handle: SurfaceHandle, transform: &SimTransform);

    fn surface_object_delete(&mut self, handle: SurfaceHandle);

    /// Fails when the simulation finds no floor surface for `position`
    fn character_create(&mut self, position: Vec3) -> Result<InstanceHandle, BridgeError>;

    /// Advance one fixed tick, overwriting `state` and `geometry`
    fn character_tick(
        &mut self,
        instance: InstanceHandle,
        inputs: &SimInputs,
        state: &mut SimState,
        geometry: &mut TriangleSoup,
    );

    fn character_delete(&mut self, instance: InstanceHandle);
}
