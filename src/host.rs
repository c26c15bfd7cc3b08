//! Host collaborator interfaces
//!
//! The host engine owns entities, colliders, input mapping, assets and the
//! renderer. The bridge only sees it through these traits.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::coords::HostTransform;
use crate::error::BridgeError;
use crate::renderer::{HostVertex, TextureDescriptor};
use crate::sim::{CharacterId, SimInputs};
use crate::surfaces::{ColliderDescriptor, ColliderId};

/// Host input state sampled before every simulation step
///
/// Axis values come straight from the host's axis monitors; opposing
/// directions are signed by the host mapping and summed here.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputSnapshot {
    pub move_left: f32,
    pub move_right: f32,
    pub move_up: f32,
    pub move_down: f32,
    pub camera_left: f32,
    pub camera_right: f32,
    pub camera_up: f32,
    pub camera_down: f32,
    pub jump: bool,
    pub attack: bool,
    pub crouch: bool,
}

impl InputSnapshot {
    /// Host axis mappings monitored for a character, in monitor-slot order
    pub const AXIS_MAPPINGS: [&'static str; 8] = [
        "PlayerMoveLeft",
        "PlayerMoveRight",
        "PlayerMoveUp",
        "PlayerMoveDown",
        "CameraMoveLeft",
        "CameraMoveRight",
        "CameraMoveUp",
        "CameraMoveDown",
    ];

    /// Host action mappings monitored for a character
    pub const ACTION_MAPPINGS: [&'static str; 1] = ["PlayerJump"];

    /// Build from raw monitor slots laid out as [`Self::AXIS_MAPPINGS`]
    pub fn from_monitors(axes: [f32; 8], jump: bool) -> Self {
        Self {
            move_left: axes[0],
            move_right: axes[1],
            move_up: axes[2],
            move_down: axes[3],
            camera_left: axes[4],
            camera_right: axes[5],
            camera_up: axes[6],
            camera_down: axes[7],
            jump,
            attack: false,
            crouch: false,
        }
    }
}

impl From<&InputSnapshot> for SimInputs {
    fn from(input: &InputSnapshot) -> Self {
        Self {
            cam_look_x: input.camera_left + input.camera_right,
            cam_look_z: input.camera_down + input.camera_up,
            stick_x: input.move_left + input.move_right,
            stick_y: input.move_down + input.move_up,
            button_a: input.jump as u8,
            button_b: input.attack as u8,
            button_z: input.crouch as u8,
        }
    }
}

/// Source of the current input state
pub trait InputSource {
    fn snapshot(&self) -> InputSnapshot;
}

impl InputSource for InputSnapshot {
    fn snapshot(&self) -> InputSnapshot {
        *self
    }
}

/// Host collision subsystem callbacks
pub trait ColliderObserver {
    fn collider_added(&mut self, id: ColliderId, collider: &ColliderDescriptor);
    fn collider_removed(&mut self, id: ColliderId);
}

/// What the host exposes to the bridge during one frame callback
pub trait HostFrame {
    /// Host global clock, seconds
    fn global_time(&self) -> f64;
    fn character_transform(&self, id: CharacterId) -> Option<HostTransform>;
    fn character_input(&self, id: CharacterId) -> InputSnapshot;
    fn collider_transform(&self, id: ColliderId) -> Option<HostTransform>;
    /// Hand a finished vertex buffer to the host renderer
    fn present(&mut self, id: CharacterId, vertices: &[HostVertex]);
}

/// Host frame-update callback
pub trait FrameTicked {
    fn frame_ticked(&mut self, host: &mut dyn HostFrame);
}

/// Host renderer texture creation
pub trait TextureSink {
    fn create_texture(&mut self, descriptor: &TextureDescriptor, pixels: &[u8]);
}

/// Host resource loading
pub trait AssetSource {
    /// Raw bytes of the resource with the given logical name
    fn load(&self, name: &str) -> Result<Vec<u8>, BridgeError>;
}

impl AssetSource for HashMap<String, Vec<u8>> {
    fn load(&self, name: &str) -> Result<Vec<u8>, BridgeError> {
        self.get(name)
            .cloned()
            .ok_or_else(|| BridgeError::AssetNotFound(name.to_string()))
    }
}

/// Resource types the bridge knows how to consume
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    /// Binary payload handed to the simulation's global init
    SimulationRom,
}

/// Directory-backed assets with an extension → type table
#[derive(Debug, Clone)]
pub struct AssetRegistry {
    root: PathBuf,
    extensions: HashMap<String, AssetKind>,
}

impl AssetRegistry {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extensions: HashMap::new(),
        }
    }

    /// Registry with the simulation ROM extension pre-registered
    pub fn with_defaults(root: impl Into<PathBuf>) -> Self {
        let mut registry = Self::new(root);
        registry.register_extension(crate::consts::ROM_EXTENSION, AssetKind::SimulationRom);
        registry
    }

    pub fn register_extension(&mut self, extension: &str, kind: AssetKind) {
        self.extensions.insert(extension.to_ascii_lowercase(), kind);
    }

    /// Type registered for a resource name's extension
    pub fn kind_of(&self, name: &str) -> Option<AssetKind> {
        let extension = Path::new(name).extension()?.to_str()?;
        self.extensions.get(&extension.to_ascii_lowercase()).copied()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetSource for AssetRegistry {
    fn load(&self, name: &str) -> Result<Vec<u8>, BridgeError> {
        if self.kind_of(name).is_none() {
            let extension = Path::new(name)
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("")
                .to_string();
            return Err(BridgeError::UnregisteredExtension(extension));
        }

        let path = self.root.join(name);
        match std::fs::read(&path) {
            Ok(bytes) => {
                log::debug!("Loaded asset {} ({} bytes)", path.display(), bytes.len());
                Ok(bytes)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(BridgeError::AssetNotFound(name.to_string()))
            }
            Err(source) => Err(BridgeError::AssetIo { path, source }),
        }
    }
}
