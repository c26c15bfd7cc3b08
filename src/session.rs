//! Simulation session
//!
//! Owns the backend for the lifetime of one global init window. Characters
//! and collider surfaces only exist while the session runs; `stop` tears
//! them down before terminating the global state.

use std::collections::BTreeMap;

use crate::coords::HostTransform;
use crate::error::BridgeError;
use crate::host::{AssetSource, ColliderObserver, FrameTicked, HostFrame, InputSource, TextureSink};
use crate::renderer::{HostVertex, TextureDescriptor};
use crate::settings::BridgeSettings;
use crate::sim::{CharacterId, FrameReport, SimSurface, SimulationBackend, SimulationDriver};
use crate::surfaces::{ColliderDescriptor, ColliderId, SurfaceLifecycleBridge};

/// One embedded simulation session
pub struct BridgeSession<B: SimulationBackend> {
    backend: B,
    settings: BridgeSettings,
    running: bool,
    characters: BTreeMap<CharacterId, SimulationDriver>,
    next_character: u32,
    surfaces: SurfaceLifecycleBridge,
}

impl<B: SimulationBackend> BridgeSession<B> {
    pub fn new(backend: B, settings: BridgeSettings) -> Self {
        let surfaces = SurfaceLifecycleBridge::new(settings.collider_extent_scale);
        Self {
            backend,
            settings,
            running: false,
            characters: BTreeMap::new(),
            next_character: 0,
            surfaces,
        }
    }

    /// Bring up the simulation's global state
    ///
    /// Loads the ROM asset, initializes the simulation with it, registers the
    /// ground triangle and hands the filled texture atlas to the renderer.
    pub fn start(
        &mut self,
        assets: &dyn AssetSource,
        renderer: &mut dyn TextureSink,
    ) -> Result<(), BridgeError> {
        if self.running {
            return Err(BridgeError::SessionAlreadyStarted);
        }
        self.settings.validate()?;

        let name = self.settings.rom_resource.as_str();
        let rom = assets.load(name)?;
        if rom.is_empty() {
            return Err(BridgeError::EmptyAsset(name.to_string()));
        }

        self.backend.install_debug_log();

        let descriptor = TextureDescriptor::sim_atlas();
        let mut pixels = vec![0u8; descriptor.byte_len()];
        self.backend.global_init(&rom, &mut pixels)?;
        self.running = true;

        self.backend.load_static_surfaces(&[SimSurface::new(self.settings.ground)]);
        renderer.create_texture(&descriptor, &pixels);

        log::info!(
            "Simulation session started ({} byte ROM, {}x{} atlas)",
            rom.len(),
            descriptor.width,
            descriptor.height
        );
        Ok(())
    }

    /// Tear down characters, surfaces and the global state
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }

        for (id, driver) in std::mem::take(&mut self.characters) {
            log::debug!("Releasing character {:?}", id);
            driver.destroy(&mut self.backend);
        }
        self.surfaces.clear(&mut self.backend);
        self.backend.global_terminate();
        self.running = false;

        log::info!("Simulation session stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn settings(&self) -> &BridgeSettings {
        &self.settings
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn surfaces(&self) -> &SurfaceLifecycleBridge {
        &self.surfaces
    }

    fn ensure_running(&self, op: &str) -> Result<(), BridgeError> {
        debug_assert!(self.running, "{op} called before the session started");
        if self.running {
            Ok(())
        } else {
            Err(BridgeError::SessionNotStarted)
        }
    }

    /// Create a simulation character at the host entity's position
    pub fn spawn_character(
        &mut self,
        transform: &HostTransform,
        now: f64,
    ) -> Result<CharacterId, BridgeError> {
        self.ensure_running("spawn_character")?;

        let driver =
            SimulationDriver::new(&mut self.backend, transform.position, now, &self.settings)?;
        let id = CharacterId(self.next_character);
        self.next_character += 1;
        self.characters.insert(id, driver);

        log::info!("Spawned character {:?} at {}", id, transform.position);
        Ok(id)
    }

    /// Release a character; `false` if the session does not own it
    pub fn despawn_character(&mut self, id: CharacterId) -> bool {
        let Some(driver) = self.characters.remove(&id) else {
            log::warn!("Despawn of unknown character {:?}", id);
            return false;
        };
        driver.destroy(&mut self.backend);
        true
    }

    /// Advance one character to host time `now`
    pub fn update_character(
        &mut self,
        id: CharacterId,
        now: f64,
        input: &dyn InputSource,
        host: &HostTransform,
    ) -> Result<FrameReport, BridgeError> {
        self.ensure_running("update_character")?;
        let driver = self
            .characters
            .get_mut(&id)
            .ok_or(BridgeError::UnknownCharacter(id))?;
        Ok(driver.update(&mut self.backend, now, input, host))
    }

    pub fn character(&self, id: CharacterId) -> Option<&SimulationDriver> {
        self.characters.get(&id)
    }

    pub fn character_ids(&self) -> impl Iterator<Item = CharacterId> + '_ {
        self.characters.keys().copied()
    }

    /// Current host vertex buffer of a character
    pub fn vertex_buffer(&self, id: CharacterId) -> Option<&[HostVertex]> {
        self.characters.get(&id).map(|d| d.vertices())
    }
}

impl<B: SimulationBackend> ColliderObserver for BridgeSession<B> {
    fn collider_added(&mut self, id: ColliderId, collider: &ColliderDescriptor) {
        if self.ensure_running("collider_added").is_err() {
            log::warn!("Collider {:?} added before session start; ignoring", id);
            return;
        }
        self.surfaces.on_collider_added(&mut self.backend, id, collider);
    }

    fn collider_removed(&mut self, id: ColliderId) {
        // Hosts may tear colliders down after the session stopped
        if !self.running {
            log::trace!("Collider {:?} removed while the session is stopped", id);
            return;
        }
        self.surfaces.on_collider_removed(&mut self.backend, id);
    }
}

impl<B: SimulationBackend> FrameTicked for BridgeSession<B> {
    fn frame_ticked(&mut self, host: &mut dyn HostFrame) {
        if !self.running {
            return;
        }
        let now = host.global_time();

        if self.settings.track_collider_motion {
            let moved = self
                .surfaces
                .sync_motion(&mut self.backend, |id| host.collider_transform(id));
            log::trace!("Synced {} collider transforms", moved);
        }

        for (&id, driver) in self.characters.iter_mut() {
            let Some(transform) = host.character_transform(id) else {
                log::trace!("Character {:?} has no host entity this frame", id);
                continue;
            };
            let input = host.character_input(id);
            let report = driver.update(&mut self.backend, now, &input, &transform);
            if report.synced {
                host.present(id, driver.vertices());
            }
        }
    }
}

impl<B: SimulationBackend> Drop for BridgeSession<B> {
    fn drop(&mut self) {
        self.stop();
    }
}
