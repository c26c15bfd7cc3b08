//! Host rendering module
//!
//! Streams simulation triangles into the host's fixed-capacity vertex format
//! and uploads the simulation's texture atlas.

pub mod streamer;
pub mod texture;
pub mod vertex;

pub use streamer::GeometryStreamer;
pub use texture::{TextureDescriptor, WgpuTextureSink};
pub use vertex::HostVertex;
