//! Delta sync between the authoritative `f64` model and the backend frame.
//!
//! Partitioned mode never casts an absolute position to `f32`: placement uses
//! the packer's small local offset, and reconciliation only widens the local
//! displacement the backend produced. A body the backend leaves alone drifts
//! by exactly zero.
//!
//! Direct mode treats the local frame as the authoritative frame and casts
//! straight across in both directions.

use deepfield_common::{LocalTransform, Narrow, widen};
use glam::{DVec3, Vec3};

use crate::backend::BackendBody;
use crate::entity::Entity;

/// How the local frame relates to the authoritative frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    Partitioned,
    Direct,
}

impl SyncMode {
    pub fn from_wrap_space(wrap_space: bool) -> Self {
        if wrap_space {
            Self::Partitioned
        } else {
            Self::Direct
        }
    }

    /// Pre-step: put `entity` into the local frame.
    ///
    /// `slot` is the packer's local position and is only used in partitioned mode.
    pub fn place(self, entity: &mut Entity, slot: Vec3) {
        let local = match self {
            Self::Partitioned => slot,
            Self::Direct => entity.position.narrow(),
        };
        entity.local = LocalTransform::at(local);
        entity.last_local = local;
    }

    /// Post-step: fold the local result back into the authoritative position.
    /// Returns the change applied.
    pub fn reconcile(self, entity: &mut Entity) -> DVec3 {
        match self {
            Self::Partitioned => {
                let delta = widen(entity.local.position - entity.last_local);
                entity.position += delta;
                delta
            }
            Self::Direct => {
                let next = widen(entity.local.position);
                let delta = next - entity.position;
                entity.position = next;
                delta
            }
        }
    }
}

/// Snapshot an entity's local state for the backend.
pub(crate) fn to_backend(entity: &Entity) -> BackendBody {
    BackendBody {
        id: entity.id,
        position: entity.local.position,
        velocity: entity.velocity,
        radius: entity.bounding_radius(),
    }
}

/// Copy the backend's result back onto the entity's local frame.
pub(crate) fn from_backend(entity: &mut Entity, body: &BackendBody) {
    entity.local.position = body.position;
    entity.velocity = body.velocity;
}
