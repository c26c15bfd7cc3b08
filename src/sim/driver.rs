//! Fixed timestep character driver
//!
//! The host runs at whatever frame rate it likes; the simulation must only
//! ever advance in whole 1/30 s ticks. Each update drains every tick that is
//! due, catching up several in one frame if the host is slow. Geometry is not
//! interpolated between ticks.

use glam::Vec3;

use super::backend::SimulationBackend;
use super::types::{InstanceHandle, SimInputs, SimState, TriangleSoup};
use crate::coords::{HostTransform, host_inverse};
use crate::error::BridgeError;
use crate::host::InputSource;
use crate::renderer::{GeometryStreamer, HostVertex};
use crate::settings::BridgeSettings;

/// Where the driver is in its update cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverPhase {
    /// Last update drained every due tick
    Idle,
    /// Last update found less than one period of backlog
    Accumulating,
    /// Inside the step loop
    Stepping,
}

/// Host clock → whole simulation ticks
///
/// Tracks the tick count rather than summing periods, so the stepped time is
/// always an exact multiple of the period past the origin.
#[derive(Debug, Clone, Copy)]
pub struct TickAccumulator {
    origin: f64,
    period: f64,
    steps: u64,
}

impl TickAccumulator {
    pub fn new(now: f64, period: f64) -> Self {
        Self {
            origin: now,
            period,
            steps: 0,
        }
    }

    pub fn period(&self) -> f64 {
        self.period
    }

    /// Ticks taken since creation
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn last_stepped_time(&self) -> f64 {
        self.origin + self.steps as f64 * self.period
    }

    /// Whole ticks due at host time `now`
    pub fn due(&self, now: f64) -> u64 {
        let elapsed = now - self.origin;
        // Also rejects NaN and a clock that went backwards
        if !(elapsed >= 0.0) {
            return 0;
        }
        let total = (elapsed / self.period).floor() as u64;
        total.saturating_sub(self.steps)
    }

    /// Host time not yet consumed by a tick
    pub fn backlog(&self, now: f64) -> f64 {
        now - self.last_stepped_time()
    }

    fn advance(&mut self) {
        self.steps += 1;
    }
}

/// Outcome of one host frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Simulation ticks run this frame
    pub steps: u32,
    /// Whether the vertex buffer was rewritten
    pub synced: bool,
}

/// Owns one simulation character and its geometry
#[derive(Debug)]
pub struct SimulationDriver {
    instance: InstanceHandle,
    clock: TickAccumulator,
    max_steps: Option<u32>,
    phase: DriverPhase,
    state: SimState,
    geometry: TriangleSoup,
    streamer: GeometryStreamer,
    released: bool,
}

impl SimulationDriver {
    /// Create a simulation character at the host entity's spawn position
    ///
    /// Only the position is handed over; host rotation and velocity are not.
    pub fn new<B: SimulationBackend + ?Sized>(
        backend: &mut B,
        spawn: Vec3,
        now: f64,
        settings: &BridgeSettings,
    ) -> Result<Self, BridgeError> {
        settings.validate()?;
        let instance = backend.character_create(spawn)?;
        log::debug!("Created simulation character {:?} at {}", instance, spawn);

        Ok(Self {
            instance,
            clock: TickAccumulator::new(now, settings.fixed_period),
            max_steps: settings.max_steps_per_update,
            phase: DriverPhase::Idle,
            state: SimState::default(),
            geometry: TriangleSoup::with_capacity(settings.max_triangles),
            streamer: GeometryStreamer::new(settings.max_triangles, settings.geometry_scale)
                .with_normal_transform(settings.transform_normals),
            released: false,
        })
    }

    /// Run every due tick, then restream geometry if anything stepped
    pub fn update<B: SimulationBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        now: f64,
        input: &dyn InputSource,
        host: &HostTransform,
    ) -> FrameReport {
        let due = self.clock.due(now);
        if due == 0 {
            self.phase = DriverPhase::Accumulating;
            return FrameReport::default();
        }

        let capped = self.max_steps.map_or(due, |cap| due.min(cap as u64));
        let run = u32::try_from(capped).unwrap_or(u32::MAX);
        if (run as u64) < due {
            log::debug!(
                "Character {:?}: deferring {} ticks to later frames",
                self.instance,
                due - run as u64
            );
        }

        self.phase = DriverPhase::Stepping;
        for _ in 0..run {
            let inputs = SimInputs::from(&input.snapshot());
            backend.character_tick(self.instance, &inputs, &mut self.state, &mut self.geometry);
            self.clock.advance();
            log::trace!(
                "Character {:?} tick {}: {} triangles",
                self.instance,
                self.clock.steps(),
                self.geometry.triangle_count
            );
        }

        self.streamer.sync(&self.geometry, &host_inverse(host));
        self.phase = DriverPhase::Idle;

        FrameReport {
            steps: run,
            synced: true,
        }
    }

    /// Release the simulation character
    pub fn destroy<B: SimulationBackend + ?Sized>(mut self, backend: &mut B) {
        backend.character_delete(self.instance);
        self.released = true;
        log::debug!("Deleted simulation character {:?}", self.instance);
    }

    pub fn instance(&self) -> InstanceHandle {
        self.instance
    }

    pub fn phase(&self) -> DriverPhase {
        self.phase
    }

    pub fn clock(&self) -> &TickAccumulator {
        &self.clock
    }

    /// State written by the most recent tick
    pub fn last_state(&self) -> &SimState {
        &self.state
    }

    pub fn geometry(&self) -> &TriangleSoup {
        &self.geometry
    }

    pub fn streamer(&self) -> &GeometryStreamer {
        &self.streamer
    }

    pub fn vertices(&self) -> &[HostVertex] {
        self.streamer.vertices()
    }
}

impl Drop for SimulationDriver {
    fn drop(&mut self) {
        if !self.released {
            log::warn!(
                "Simulation character {:?} dropped without being destroyed; its instance leaks",
                self.instance
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::InputSnapshot;
    use crate::sim::headless::HeadlessSimulation;
    use proptest::prelude::*;
    use std::cell::Cell;

    const PERIOD: f64 = 1.0 / 30.0;

    fn backend() -> HeadlessSimulation {
        let mut sim = HeadlessSimulation::new();
        let mut texture = vec![0; crate::renderer::TextureDescriptor::sim_atlas().byte_len()];
        sim.global_init(&[1, 2, 3], &mut texture).unwrap();
        sim.load_static_surfaces(&[crate::sim::SimSurface::new(crate::consts::GROUND_TRIANGLE)]);
        sim
    }

    fn settings() -> BridgeSettings {
        BridgeSettings {
            max_triangles: 64,
            ..BridgeSettings::default()
        }
    }

    struct CountingInput(Cell<u32>);

    impl InputSource for CountingInput {
        fn snapshot(&self) -> InputSnapshot {
            self.0.set(self.0.get() + 1);
            InputSnapshot::default()
        }
    }

    #[test]
    fn test_small_deltas_accumulate_into_one_step() {
        let mut sim = backend();
        let mut driver = SimulationDriver::new(&mut sim, Vec3::new(0.0, 200.0, 0.0), 0.0, &settings()).unwrap();
        let input = InputSnapshot::default();
        let host = HostTransform::IDENTITY;

        let mut now = 0.0;
        let mut steps = 0;
        for dt in [0.01, 0.01, 0.02] {
            now += dt;
            steps += driver.update(&mut sim, now, &input, &host).steps;
        }

        assert_eq!(steps, 1);
        assert_eq!(sim.ticks_run(driver.instance()), Some(1));
        let backlog = driver.clock().backlog(now);
        assert!((backlog - (0.04 - PERIOD)).abs() < 1e-9, "backlog {backlog}");
        assert!(backlog < PERIOD);
        driver.destroy(&mut sim);
    }

    #[test]
    fn test_frame_without_tick_keeps_geometry() {
        let mut sim = backend();
        let mut driver = SimulationDriver::new(&mut sim, Vec3::new(0.0, 200.0, 0.0), 0.0, &settings()).unwrap();
        let input = InputSnapshot::default();

        let report = driver.update(&mut sim, 0.01, &input, &HostTransform::IDENTITY);
        assert_eq!(report, FrameReport::default());
        assert_eq!(driver.phase(), DriverPhase::Accumulating);
        assert!(driver.vertices().iter().all(|v| v.alpha() == 0));

        let report = driver.update(&mut sim, 0.05, &input, &HostTransform::IDENTITY);
        assert_eq!(report, FrameReport { steps: 1, synced: true });
        assert_eq!(driver.phase(), DriverPhase::Idle);
        let live = driver.streamer().live_triangles();
        assert!(live > 0);
        let before = driver.vertices().to_vec();

        // Moving the host without a tick must not touch the buffer
        let moved = HostTransform::from_position(Vec3::splat(5.0));
        driver.update(&mut sim, 0.06, &input, &moved);
        assert_eq!(driver.vertices(), &before[..]);
        driver.destroy(&mut sim);
    }

    #[test]
    fn test_slow_frame_catches_up_and_samples_input_per_step() {
        let mut sim = backend();
        let mut driver = SimulationDriver::new(&mut sim, Vec3::new(0.0, 200.0, 0.0), 1.0, &settings()).unwrap();
        let input = CountingInput(Cell::new(0));

        let report = driver.update(&mut sim, 1.0 + 5.5 * PERIOD, &input, &HostTransform::IDENTITY);
        assert_eq!(report.steps, 5);
        assert_eq!(input.0.get(), 5);
        assert!((driver.clock().last_stepped_time() - (1.0 + 5.0 * PERIOD)).abs() < 1e-9);
        driver.destroy(&mut sim);
    }

    #[test]
    fn test_step_cap_defers_backlog() {
        let mut sim = backend();
        let capped = BridgeSettings {
            max_steps_per_update: Some(2),
            ..settings()
        };
        let mut driver = SimulationDriver::new(&mut sim, Vec3::new(0.0, 200.0, 0.0), 0.0, &capped).unwrap();
        let input = InputSnapshot::default();
        let now = 5.5 * PERIOD;

        assert_eq!(driver.update(&mut sim, now, &input, &HostTransform::IDENTITY).steps, 2);
        assert_eq!(driver.update(&mut sim, now, &input, &HostTransform::IDENTITY).steps, 2);
        assert_eq!(driver.update(&mut sim, now, &input, &HostTransform::IDENTITY).steps, 1);
        assert_eq!(driver.update(&mut sim, now, &input, &HostTransform::IDENTITY).steps, 0);
        assert_eq!(driver.clock().steps(), 5);
        driver.destroy(&mut sim);
    }

    #[test]
    fn test_clock_going_backwards_is_ignored() {
        let clock = TickAccumulator::new(10.0, PERIOD);
        assert_eq!(clock.due(9.0), 0);
        assert_eq!(clock.due(f64::NAN), 0);
    }

    #[test]
    fn test_destroy_releases_instance() {
        let mut sim = backend();
        let driver = SimulationDriver::new(&mut sim, Vec3::new(0.0, 200.0, 0.0), 0.0, &settings()).unwrap();
        assert_eq!(sim.live_characters(), 1);
        driver.destroy(&mut sim);
        assert_eq!(sim.live_characters(), 0);
    }

    #[test]
    fn test_spawn_without_floor_fails() {
        let mut sim = HeadlessSimulation::new();
        let mut texture = vec![0; crate::renderer::TextureDescriptor::sim_atlas().byte_len()];
        sim.global_init(&[1], &mut texture).unwrap();
        let result = SimulationDriver::new(&mut sim, Vec3::ZERO, 0.0, &settings());
        assert!(matches!(result, Err(BridgeError::CharacterSpawnFailed(_))));
    }

    #[test]
    fn test_invalid_settings_are_rejected_before_spawn() {
        let mut sim = backend();
        let zero_period = BridgeSettings {
            fixed_period: 0.0,
            ..settings()
        };
        let result = SimulationDriver::new(&mut sim, Vec3::new(0.0, 200.0, 0.0), 0.0, &zero_period);
        assert!(matches!(result, Err(BridgeError::InvalidSettings(_))));
        assert_eq!(sim.live_characters(), 0);
    }

    proptest! {
        #[test]
        fn prop_step_count_matches_total_time(deltas in proptest::collection::vec(0.0f64..0.2, 0..64)) {
            let mut sim = backend();
            let mut driver = SimulationDriver::new(&mut sim, Vec3::new(0.0, 200.0, 0.0), 0.0, &settings()).unwrap();
            let input = InputSnapshot::default();

            let mut now = 0.0;
            let mut steps = 0u64;
            for dt in &deltas {
                now += dt;
                steps += driver.update(&mut sim, now, &input, &HostTransform::IDENTITY).steps as u64;
            }

            prop_assert_eq!(steps, (now / PERIOD).floor() as u64);
            prop_assert!(driver.clock().backlog(now) < PERIOD);
            driver.destroy(&mut sim);
        }
    }
}
