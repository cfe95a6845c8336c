use deepfield_common::{EntityId, widen};
use deepfield_kernel::{Backend, FieldError, World};
use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::error::ViewError;

/// What a viewpoint is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Anchor {
    Fixed(DVec3),
    Follow(EntityId),
}

/// The eye the view pass measures distances from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewpoint {
    pub anchor: Anchor,
    pub offset: DVec3,
    /// Fraction of a fixed tick elapsed since the last step. A followed
    /// entity's position is extrapolated by `velocity * interpolation` seconds.
    pub interpolation: f32,
}

impl Viewpoint {
    pub fn fixed(position: DVec3) -> Self {
        Self {
            anchor: Anchor::Fixed(position),
            offset: DVec3::ZERO,
            interpolation: 0.0,
        }
    }

    pub fn follow(id: EntityId) -> Self {
        Self {
            anchor: Anchor::Follow(id),
            offset: DVec3::ZERO,
            interpolation: 0.0,
        }
    }

    pub fn with_offset(mut self, offset: DVec3) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_interpolation(mut self, interpolation: f32) -> Self {
        self.interpolation = interpolation;
        self
    }

    /// Authoritative position of the eye in `world`.
    pub fn resolve<B: Backend>(&self, world: &World<B>) -> Result<DVec3, ViewError> {
        let base = match self.anchor {
            Anchor::Fixed(position) => position,
            Anchor::Follow(id) => {
                let entity = world.get(id).ok_or(FieldError::UnknownEntity(id))?;
                entity.position() + widen(entity.velocity() * self.interpolation)
            }
        };
        Ok(base + self.offset)
    }

    /// Move a view-anchored rig entity onto this viewpoint.
    pub fn sync_rig<B: Backend>(
        &self,
        world: &mut World<B>,
        rig: EntityId,
    ) -> Result<DVec3, ViewError> {
        let eye = self.resolve(world)?;
        world.anchor_to_view(rig, eye)?;
        Ok(eye)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deepfield_kernel::{EntityDesc, NullBackend, WorldConfig};
    use glam::Vec3;

    fn world() -> World<NullBackend> {
        World::create(WorldConfig::default(), NullBackend::default()).unwrap()
    }

    #[test]
    fn fixed_viewpoint_adds_offset() {
        let w = world();
        let vp = Viewpoint::fixed(DVec3::new(1.0e12, 0.0, 0.0)).with_offset(DVec3::Y * 2.0);
        assert_eq!(vp.resolve(&w).unwrap(), DVec3::new(1.0e12, 2.0, 0.0));
    }

    #[test]
    fn follow_tracks_entity() {
        let mut w = world();
        let id = w.spawn(EntityDesc::body(DVec3::new(5.0e11, 0.0, 0.0))).unwrap();
        let vp = Viewpoint::follow(id).with_offset(DVec3::new(0.0, 10.0, -20.0));
        assert_eq!(vp.resolve(&w).unwrap(), DVec3::new(5.0e11, 10.0, -20.0));

        w.move_by(id, DVec3::X).unwrap();
        assert_eq!(vp.resolve(&w).unwrap().x, 5.0e11 + 1.0);
    }

    #[test]
    fn follow_interpolates_by_velocity() {
        let mut w = world();
        let id = w
            .spawn(EntityDesc::body(DVec3::ZERO).with_velocity(Vec3::new(4.0, 0.0, 0.0)))
            .unwrap();
        let vp = Viewpoint::follow(id).with_interpolation(0.25);
        assert_eq!(vp.resolve(&w).unwrap(), DVec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn follow_unknown_entity_fails() {
        let w = world();
        let vp = Viewpoint::follow(EntityId(42));
        assert_eq!(
            vp.resolve(&w),
            Err(ViewError::World(FieldError::UnknownEntity(EntityId(42))))
        );
    }

    #[test]
    fn rig_follows_viewpoint() {
        let mut w = world();
        let target = w.spawn(EntityDesc::body(DVec3::new(3.0, 4.0, 5.0))).unwrap();
        let rig = w.spawn(EntityDesc::view_anchored(DVec3::ZERO)).unwrap();
        let vp = Viewpoint::follow(target).with_offset(DVec3::Z);
        let eye = vp.sync_rig(&mut w, rig).unwrap();
        assert_eq!(eye, DVec3::new(3.0, 4.0, 6.0));
        assert_eq!(w.get(rig).unwrap().position(), eye);

        assert!(matches!(
            vp.sync_rig(&mut w, target),
            Err(ViewError::World(FieldError::NotViewAnchored(_)))
        ));
    }
}
