use deepfield_common::LocalTransform;
use deepfield_kernel::{Backend, Viewability, World};
use glam::DVec3;

use crate::compressor::ViewCompressor;

/// Counts from one view pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Entities carrying the `VISIBLE` flag.
    pub considered: usize,
    pub visible: usize,
    pub hidden: usize,
    /// Entities whose visibility differs from the previous pass.
    pub toggled: usize,
}

/// Write every viewable entity's render state as seen from `eye`.
///
/// Offsets are taken in `f64` before narrowing, so the eye can sit anywhere.
/// The physics local frame is left alone.
pub fn apply_view<B: Backend>(
    world: &mut World<B>,
    compressor: &ViewCompressor,
    eye: DVec3,
) -> FrameStats {
    let _span = tracing::debug_span!("view_pass").entered();
    let mut stats = FrameStats::default();

    for entity in world.entities_mut() {
        if !entity.viewability().contains(Viewability::VISIBLE) {
            continue;
        }
        stats.considered += 1;

        let sample = compressor.compress(entity.position() - eye);
        let transform = LocalTransform {
            position: sample.position,
            scale: sample.scale,
        };
        if entity.set_render(transform, sample.visible) {
            stats.toggled += 1;
        }
        if sample.visible {
            stats.visible += 1;
        } else {
            stats.hidden += 1;
        }
    }

    tracing::trace!(
        considered = stats.considered,
        visible = stats.visible,
        toggled = stats.toggled,
        "view pass"
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compressor::ViewSettings;
    use deepfield_kernel::{EntityDesc, NullBackend, WorldConfig};
    use glam::Vec3;

    fn world() -> World<NullBackend> {
        World::create(WorldConfig::default(), NullBackend::default()).unwrap()
    }

    #[test]
    fn pass_compresses_relative_to_eye() {
        let mut w = world();
        let eye = DVec3::new(4.0e12, 0.0, -2.0e12);
        let near = w.spawn(EntityDesc::body(eye + DVec3::new(1000.0, 0.0, 0.0))).unwrap();
        let mid = w.spawn(EntityDesc::body(eye + DVec3::new(0.0, 0.0, 30_000.0))).unwrap();
        let far = w.spawn(EntityDesc::body(eye + DVec3::new(60_000.0, 0.0, 0.0))).unwrap();

        let compressor = ViewCompressor::new(ViewSettings::default()).unwrap();
        let stats = apply_view(&mut w, &compressor, eye);
        assert_eq!(stats.considered, 3);
        assert_eq!(stats.visible, 2);
        assert_eq!(stats.hidden, 1);
        assert_eq!(stats.toggled, 1);

        let near = w.get(near).unwrap().render();
        assert_eq!(near.transform.position, Vec3::new(1000.0, 0.0, 0.0));
        assert_eq!(near.transform.scale, 1.0);
        let mid = w.get(mid).unwrap().render();
        assert!((mid.transform.position.z - 289.47).abs() < 0.01);
        assert!(!w.get(far).unwrap().render().visible);
    }

    #[test]
    fn pass_leaves_physics_frame_alone() {
        let mut w = world();
        let id = w.spawn(EntityDesc::body(DVec3::new(20_000.0, 0.0, 0.0))).unwrap();
        w.step().unwrap();
        let local = w.get(id).unwrap().local();
        let compressor = ViewCompressor::new(ViewSettings::default()).unwrap();
        apply_view(&mut w, &compressor, DVec3::ZERO);
        assert_eq!(w.get(id).unwrap().local(), local);
        assert_ne!(w.get(id).unwrap().render().transform, local);
    }

    #[test]
    fn toggles_are_counted_once() {
        let mut w = world();
        let id = w.spawn(EntityDesc::body(DVec3::new(60_000.0, 0.0, 0.0))).unwrap();
        let compressor = ViewCompressor::new(ViewSettings::default()).unwrap();
        assert_eq!(apply_view(&mut w, &compressor, DVec3::ZERO).toggled, 1);
        assert_eq!(apply_view(&mut w, &compressor, DVec3::ZERO).toggled, 0);

        w.teleport(id, DVec3::new(10.0, 0.0, 0.0)).unwrap();
        let stats = apply_view(&mut w, &compressor, DVec3::ZERO);
        assert_eq!(stats.toggled, 1);
        assert!(w.get(id).unwrap().render().visible);
    }

    #[test]
    fn non_viewable_entities_are_skipped() {
        let mut w = world();
        w.spawn(EntityDesc::body(DVec3::ZERO).with_viewability(Viewability::NONE))
            .unwrap();
        w.spawn(EntityDesc::view_anchored(DVec3::ZERO)).unwrap();
        w.spawn(
            EntityDesc::body(DVec3::ZERO).with_viewability(Viewability::VISIBLE | Viewability::FOCUSABLE),
        )
        .unwrap();
        let compressor = ViewCompressor::unconfigured();
        let stats = apply_view(&mut w, &compressor, DVec3::ZERO);
        assert_eq!(stats.considered, 1);
        assert_eq!(stats.visible, 1);
    }
}
