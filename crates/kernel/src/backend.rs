use deepfield_common::EntityId;
use glam::Vec3;

/// A body as the backend sees it: local-frame, single precision only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackendBody {
    pub id: EntityId,
    pub position: Vec3,
    pub velocity: Vec3,
    pub radius: f32,
}

/// The physics/rendering engine the world drives.
///
/// The world owns stepping: it turns the backend's own automatic simulation
/// off on creation and back on at shutdown. `step` may move bodies however
/// it likes, but only within the local frame it was given.
pub trait Backend {
    fn set_auto_simulation(&mut self, enabled: bool);

    fn step(&mut self, bodies: &mut [BackendBody], dt: f32);
}

/// Backend that never moves anything.
#[derive(Debug, Clone, PartialEq)]
pub struct NullBackend {
    pub auto_simulation: bool,
    pub steps: u64,
}

impl Default for NullBackend {
    fn default() -> Self {
        Self {
            auto_simulation: true,
            steps: 0,
        }
    }
}

impl Backend for NullBackend {
    fn set_auto_simulation(&mut self, enabled: bool) {
        self.auto_simulation = enabled;
    }

    fn step(&mut self, _bodies: &mut [BackendBody], _dt: f32) {
        self.steps += 1;
    }
}

/// Backend that integrates each body's velocity (semi-implicit Euler) under
/// an optional uniform gravity. No collision response.
#[derive(Debug, Clone, PartialEq)]
pub struct KinematicBackend {
    pub gravity: Vec3,
    pub auto_simulation: bool,
    pub steps: u64,
}

impl Default for KinematicBackend {
    fn default() -> Self {
        Self {
            gravity: Vec3::ZERO,
            auto_simulation: true,
            steps: 0,
        }
    }
}

impl KinematicBackend {
    pub fn with_gravity(gravity: Vec3) -> Self {
        Self {
            gravity,
            ..Self::default()
        }
    }
}

impl Backend for KinematicBackend {
    fn set_auto_simulation(&mut self, enabled: bool) {
        self.auto_simulation = enabled;
    }

    fn step(&mut self, bodies: &mut [BackendBody], dt: f32) {
        for body in bodies.iter_mut() {
            body.velocity += self.gravity * dt;
            body.position += body.velocity * dt;
        }
        self.steps += 1;
    }
}
