//! Bridge error type

use std::path::PathBuf;

use glam::Vec3;

use crate::sim::CharacterId;

/// Errors surfaced by session and driver operations
///
/// Protocol-order violations (duplicate collider add, remove without add)
/// are never errors; they are logged and ignored.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// Per-instance or per-collider operation before `start`
    #[error("simulation session not started")]
    SessionNotStarted,

    /// `start` called on a running session
    #[error("simulation session already started")]
    SessionAlreadyStarted,

    /// Another session owns the process-wide simulation state
    #[error("embedded simulation global state is already initialized in this process")]
    GlobalStateBusy,

    /// No asset under that logical name
    #[error("asset `{0}` not found")]
    AssetNotFound(String),

    /// Asset name has an extension with no registered type
    #[error("no asset type registered for extension `{0}`")]
    UnregisteredExtension(String),

    /// Texture buffer handed to global init has the wrong size
    #[error("texture buffer must be {expected} bytes, got {actual}")]
    TextureSize { expected: usize, actual: usize },

    /// Asset loaded but carried no bytes
    #[error("asset `{0}` is empty")]
    EmptyAsset(String),

    /// Reading an asset from disk failed
    #[error("failed to read asset {path}: {source}")]
    AssetIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The simulation refused to create a character (no floor below the spawn point)
    #[error("simulation could not create a character at {0}")]
    CharacterSpawnFailed(Vec3),

    /// Character id not owned by this session
    #[error("unknown character {0:?}")]
    UnknownCharacter(CharacterId),

    /// Settings failed validation
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// Settings JSON could not be parsed
    #[error("failed to parse settings: {0}")]
    SettingsParse(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
