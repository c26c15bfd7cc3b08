//! SM64 Bridge - embeds a fixed-rate character simulation in a host engine
//!
//! Core modules:
//! - `coords`: Host ↔ simulation transform conversion
//! - `sim`: Simulation boundary (backend trait, C ABI, headless backend) and fixed-step driver
//! - `renderer`: Host vertex format, triangle streaming, texture upload
//! - `surfaces`: Host collider → simulation surface object lifecycle
//! - `session`: Global simulation start/stop and per-frame composition
//! - `host`: Host collaborator interfaces (observers, input, assets)
//! - `settings`: Data-driven bridge configuration

pub mod coords;
pub mod error;
pub mod host;
pub mod renderer;
pub mod session;
pub mod settings;
pub mod sim;
pub mod surfaces;

pub use coords::{HostTransform, SimTransform};
pub use error::BridgeError;
pub use session::BridgeSession;
pub use settings::BridgeSettings;

/// Bridge configuration constants
pub mod consts {
    /// Fixed simulation timestep (the embedded simulation runs at 30 Hz)
    pub const FIXED_PERIOD: f64 = 1.0 / 30.0;

    /// Simulation units → host render units
    pub const GEOMETRY_SCALE: f32 = 0.01;
    /// Host collider dimensions → simulation surface units
    pub const COLLIDER_EXTENT_SCALE: f32 = 10.0;

    /// Triangle capacity of one character's geometry buffers
    pub const MAX_TRIANGLES: usize = 1024;
    /// Vertex capacity of one character's geometry buffers
    pub const MAX_VERTICES: usize = 3 * MAX_TRIANGLES;

    /// Texture atlas written by the simulation at global init
    pub const TEXTURE_WIDTH: u32 = 64 * 11;
    pub const TEXTURE_HEIGHT: u32 = 64;

    /// Surface / terrain tags
    pub const SURFACE_DEFAULT: i16 = 0x0000;
    pub const TERRAIN_GRASS: u16 = 0x0000;

    /// Logical name of the simulation's binary asset
    pub const ROM_RESOURCE: &str = "sm64.z64";
    pub const ROM_EXTENSION: &str = "z64";

    /// Base ground triangle registered at session start
    pub const GROUND_TRIANGLE: [[i32; 3]; 3] = [[-2000, 130, -2000], [0, 130, 2000], [2000, 130, -2000]];
}
