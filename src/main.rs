//! SM64 Bridge demo entry point
//!
//! Runs a headless session: spawns one character, feeds it jittered host
//! frames with stick input, adds and removes a box collider, and logs what
//! the bridge did.

use std::collections::HashMap;

use anyhow::Context;
use glam::{Quat, Vec3};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use sm64_bridge::consts::ROM_RESOURCE;
use sm64_bridge::host::{ColliderObserver, FrameTicked, HostFrame, InputSnapshot, TextureSink};
use sm64_bridge::renderer::{HostVertex, TextureDescriptor};
use sm64_bridge::sim::{CharacterId, HeadlessSimulation};
use sm64_bridge::surfaces::{ColliderDescriptor, ColliderId};
use sm64_bridge::{BridgeSession, BridgeSettings, HostTransform};

/// Host frames to simulate
const FRAMES: u32 = 120;
/// Nominal host frame time (60 Hz)
const FRAME_TIME: f64 = 1.0 / 60.0;
/// Fixed seed so runs are reproducible
const SEED: u64 = 0x5364_6272;

/// Texture sink that only records the upload
#[derive(Default)]
struct LoggingSink {
    uploaded: usize,
}

impl TextureSink for LoggingSink {
    fn create_texture(&mut self, descriptor: &TextureDescriptor, pixels: &[u8]) {
        log::info!(
            "Texture {}x{} ({:?}, {} bytes)",
            descriptor.width,
            descriptor.height,
            descriptor.format,
            pixels.len()
        );
        self.uploaded += 1;
    }
}

/// Minimal host: one entity per character, a clock and a stick
struct DemoHost {
    time: f64,
    entities: HashMap<CharacterId, HostTransform>,
    colliders: HashMap<ColliderId, HostTransform>,
    input: InputSnapshot,
    presented_frames: u32,
    last_triangles: usize,
}

impl HostFrame for DemoHost {
    fn global_time(&self) -> f64 {
        self.time
    }

    fn character_transform(&self, id: CharacterId) -> Option<HostTransform> {
        self.entities.get(&id).copied()
    }

    fn character_input(&self, _id: CharacterId) -> InputSnapshot {
        self.input
    }

    fn collider_transform(&self, id: ColliderId) -> Option<HostTransform> {
        self.colliders.get(&id).copied()
    }

    fn present(&mut self, _id: CharacterId, vertices: &[HostVertex]) {
        self.presented_frames += 1;
        self.last_triangles = vertices.chunks_exact(3).filter(|t| t[0].alpha() != 0).count();
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    log::info!("SM64 Bridge (headless) starting...");

    let settings = match std::env::args().nth(1) {
        Some(path) => BridgeSettings::load(&path)
            .with_context(|| format!("loading settings from {path}"))?,
        None => BridgeSettings::default(),
    };

    let mut assets = HashMap::new();
    assets.insert(ROM_RESOURCE.to_string(), vec![0x80, 0x37, 0x12, 0x40]);

    let mut session = BridgeSession::new(HeadlessSimulation::new(), settings);
    let mut sink = LoggingSink::default();
    session
        .start(&assets, &mut sink)
        .context("starting simulation session")?;

    let mut host = DemoHost {
        time: 0.0,
        entities: HashMap::new(),
        colliders: HashMap::new(),
        input: InputSnapshot::default(),
        presented_frames: 0,
        last_triangles: 0,
    };

    let spawn = HostTransform::from_position(Vec3::new(0.0, 400.0, 0.0));
    let mario = session.spawn_character(&spawn, host.time)?;
    host.entities.insert(mario, spawn);

    let crate_id = ColliderId(1);
    let crate_world = HostTransform::from_position_rotation(
        Vec3::new(300.0, 130.0, 0.0),
        Quat::from_rotation_y(0.5),
    );
    host.colliders.insert(crate_id, crate_world);
    session.collider_added(crate_id, &ColliderDescriptor::cuboid(Vec3::splat(20.0), crate_world));
    log::info!("Live collider surfaces: {}", session.surfaces().len());

    let mut rng = Pcg32::seed_from_u64(SEED);
    for frame in 0..FRAMES {
        host.time += FRAME_TIME * rng.random_range(0.5..2.0);
        host.input = InputSnapshot {
            move_right: if frame < FRAMES / 4 { 1.0 } else { 0.0 },
            jump: frame % 40 == 0,
            ..InputSnapshot::default()
        };
        session.frame_ticked(&mut host);
    }

    session.collider_removed(crate_id);
    host.colliders.remove(&crate_id);

    if let Some(driver) = session.character(mario) {
        let state = driver.last_state();
        log::info!(
            "After {:.2}s: {} ticks, position {:?}, {} presented frames, {} visible triangles",
            host.time,
            driver.clock().steps(),
            state.position,
            host.presented_frames,
            host.last_triangles
        );
    }
    log::info!(
        "Live collider surfaces: {}, textures uploaded: {}",
        session.surfaces().len(),
        sink.uploaded
    );

    session.despawn_character(mario);
    session.stop();
    Ok(())
}
