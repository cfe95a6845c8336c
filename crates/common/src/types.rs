use glam::Vec3;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of an entity within one world.
///
/// Ids are handed out sequentially by the owning world, so ordering by id is
/// ordering by registration. That keeps every tick reproducible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Unique identifier for a world session. Several worlds may coexist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorldId(pub Uuid);

impl WorldId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for WorldId {
    fn default() -> Self {
        Self::new()
    }
}

/// A single-precision transform in a local frame: position plus uniform scale.
///
/// Only ever holds small, relative magnitudes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocalTransform {
    pub position: Vec3,
    pub scale: f32,
}

impl Default for LocalTransform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            scale: 1.0,
        }
    }
}

impl LocalTransform {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            scale: 1.0,
        }
    }
}
