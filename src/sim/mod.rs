//! Embedded simulation module
//!
//! Everything that talks to the character simulation lives here:
//! - `backend`: the capability trait the rest of the crate programs against
//! - `driver`: fixed timestep stepping of one character
//! - `headless`: deterministic in-process backend
//! - `ffi`: native libsm64 binding (feature `libsm64`)

pub mod backend;
pub mod driver;
#[cfg(feature = "libsm64")]
pub mod ffi;
pub mod headless;
pub mod types;

pub use backend::SimulationBackend;
pub use driver::{DriverPhase, FrameReport, SimulationDriver, TickAccumulator};
#[cfg(feature = "libsm64")]
pub use ffi::Libsm64;
pub use headless::HeadlessSimulation;
pub use types::{
    CharacterId, InstanceHandle, SimInputs, SimState, SimSurface, SurfaceHandle, SurfaceObject,
    TriangleSoup,
};
