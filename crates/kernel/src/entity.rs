use std::ops::{BitOr, BitOrAssign};

use deepfield_common::{Bounded, EntityId, LocalTransform};
use glam::{DVec3, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::FieldError;

/// Radius used when an entity asks for an automatic radius but has no colliders.
pub const DEFAULT_RADIUS: f32 = 1.0;

/// What kind of body an entity is. Closed set; behaviour beyond this lives in
/// an optional [`StepHook`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    /// A simulated body. Its authoritative position follows the backend.
    Body,
    /// Positioned by a viewpoint (camera rigs and the like). Never partitioned,
    /// and cannot be moved through `move_by` / `teleport`.
    ViewAnchored,
}

/// Collision shape attached to an entity, relative to the entity origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ColliderShape {
    Box { half_extents: [f32; 3] },
    Sphere { radius: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Collider {
    pub shape: ColliderShape,
    pub offset: Vec3,
}

impl Collider {
    pub fn sphere(radius: f32) -> Self {
        Self {
            shape: ColliderShape::Sphere { radius },
            offset: Vec3::ZERO,
        }
    }

    pub fn cuboid(half_extents: [f32; 3]) -> Self {
        Self {
            shape: ColliderShape::Box { half_extents },
            offset: Vec3::ZERO,
        }
    }

    pub fn with_offset(mut self, offset: Vec3) -> Self {
        self.offset = offset;
        self
    }

    /// Axis-aligned bounds relative to the entity origin.
    pub fn bounds(&self) -> (Vec3, Vec3) {
        let half = match self.shape {
            ColliderShape::Box { half_extents } => Vec3::from_array(half_extents),
            ColliderShape::Sphere { radius } => Vec3::splat(radius),
        };
        (self.offset - half, self.offset + half)
    }
}

/// Where an entity's bounding radius comes from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RadiusSource {
    /// Half-diagonal of the box enclosing the origin and every collider.
    Auto,
    /// Explicit override, e.g. a proximity-fused missile.
    Fixed(f32),
}

/// Bounding radius derived from collider geometry.
///
/// The enclosing box always contains the entity origin, so an off-center
/// collider grows the radius on the far side too.
pub fn radius_from_colliders(colliders: &[Collider]) -> Option<f32> {
    if colliders.is_empty() {
        return None;
    }
    let (min, max) = colliders
        .iter()
        .map(Collider::bounds)
        .fold((Vec3::ZERO, Vec3::ZERO), |(lo, hi), (min, max)| {
            (lo.min(min), hi.max(max))
        });
    Some(((max - min) * 0.5).length())
}

fn resolve_radius(source: RadiusSource, colliders: &[Collider]) -> f32 {
    match source {
        RadiusSource::Fixed(r) => r,
        RadiusSource::Auto => radius_from_colliders(colliders).unwrap_or(DEFAULT_RADIUS),
    }
}

fn checked_radius(
    id: EntityId,
    source: RadiusSource,
    colliders: &[Collider],
) -> Result<f32, FieldError> {
    let radius = resolve_radius(source, colliders);
    if radius.is_finite() && radius >= 0.0 {
        Ok(radius)
    } else {
        Err(FieldError::InvalidRadius { id, radius })
    }
}

/// View flags: which render passes an entity takes part in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Viewability(u8);

impl Viewability {
    pub const NONE: Self = Self(0);
    pub const VISIBLE: Self = Self(1);
    pub const FOCUSABLE: Self = Self(1 << 1);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl Default for Viewability {
    fn default() -> Self {
        Self::VISIBLE
    }
}

impl BitOr for Viewability {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Viewability {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Render-side state written by the view pass. Kept apart from the physics
/// local frame so rendering never disturbs delta sync.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderState {
    pub transform: LocalTransform,
    pub visible: bool,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            transform: LocalTransform::default(),
            visible: true,
        }
    }
}

/// Mutable view of an entity handed to a [`StepHook`].
#[derive(Debug)]
pub struct StepContext<'a> {
    pub id: EntityId,
    /// Local-frame transform as placed this tick.
    pub local: &'a mut LocalTransform,
    pub velocity: &'a mut Vec3,
    /// Clearing this takes the entity out of partitioning from the next tick.
    pub interactable: &'a mut bool,
    pub dt: f32,
}

/// Custom per-tick behaviour, run after placement and before the backend step.
pub trait StepHook: Send {
    fn on_custom_step(&mut self, ctx: StepContext<'_>, has_neighbors: bool);
}

impl<F> StepHook for F
where
    F: FnMut(StepContext<'_>, bool) + Send,
{
    fn on_custom_step(&mut self, ctx: StepContext<'_>, has_neighbors: bool) {
        self(ctx, has_neighbors)
    }
}

/// Everything needed to spawn an entity.
pub struct EntityDesc {
    pub kind: EntityKind,
    pub position: DVec3,
    pub velocity: Vec3,
    pub radius: RadiusSource,
    pub colliders: Vec<Collider>,
    pub interactable: bool,
    pub viewability: Viewability,
    pub hook: Option<Box<dyn StepHook>>,
}

impl Default for EntityDesc {
    fn default() -> Self {
        Self {
            kind: EntityKind::Body,
            position: DVec3::ZERO,
            velocity: Vec3::ZERO,
            radius: RadiusSource::Auto,
            colliders: Vec::new(),
            interactable: true,
            viewability: Viewability::default(),
            hook: None,
        }
    }
}

impl EntityDesc {
    pub fn body(position: DVec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn view_anchored(position: DVec3) -> Self {
        Self {
            kind: EntityKind::ViewAnchored,
            position,
            interactable: false,
            viewability: Viewability::NONE,
            ..Self::default()
        }
    }

    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = RadiusSource::Fixed(radius);
        self
    }

    pub fn with_colliders(mut self, colliders: Vec<Collider>) -> Self {
        self.colliders = colliders;
        self
    }

    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn inert(mut self) -> Self {
        self.interactable = false;
        self
    }

    pub fn with_viewability(mut self, viewability: Viewability) -> Self {
        self.viewability = viewability;
        self
    }

    pub fn with_hook(mut self, hook: impl StepHook + 'static) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }
}

/// A tracked body: authoritative `f64` position plus its `f32` local frame.
///
/// `position` is only written by the sync protocol during a tick, or by
/// explicit moves between ticks.
pub struct Entity {
    pub(crate) id: EntityId,
    pub(crate) kind: EntityKind,
    pub(crate) position: DVec3,
    pub(crate) local: LocalTransform,
    /// Local position recorded at placement; the post-step delta is measured from here.
    pub(crate) last_local: Vec3,
    pub(crate) velocity: Vec3,
    radius: f32,
    radius_source: RadiusSource,
    colliders: Vec<Collider>,
    pub(crate) interactable: bool,
    viewability: Viewability,
    render: RenderState,
    hook: Option<Box<dyn StepHook>>,
}

impl std::fmt::Debug for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("position", &self.position)
            .field("local", &self.local)
            .field("radius", &self.radius)
            .field("interactable", &self.interactable)
            .field("has_hook", &self.hook.is_some())
            .finish()
    }
}

impl Entity {
    pub(crate) fn from_desc(id: EntityId, desc: EntityDesc) -> Self {
        let interactable = desc.interactable && desc.kind == EntityKind::Body;
        Self {
            id,
            kind: desc.kind,
            position: desc.position,
            local: LocalTransform::default(),
            last_local: Vec3::ZERO,
            velocity: desc.velocity,
            radius: resolve_radius(desc.radius, &desc.colliders),
            radius_source: desc.radius,
            colliders: desc.colliders,
            interactable,
            viewability: desc.viewability,
            render: RenderState::default(),
            hook: desc.hook,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Authoritative double-precision position.
    pub fn position(&self) -> DVec3 {
        self.position
    }

    /// Transform in the backend's local frame.
    pub fn local(&self) -> LocalTransform {
        self.local
    }

    /// Overwrite the local-frame transform, as a backend or hook would.
    pub fn set_local_transform(&mut self, position: Vec3, scale: f32) {
        self.local = LocalTransform { position, scale };
    }

    /// Local-frame velocity as last reported by the backend.
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
    }

    pub fn bounding_radius(&self) -> f32 {
        self.radius
    }

    pub fn radius_source(&self) -> RadiusSource {
        self.radius_source
    }

    /// Change where the bounding radius comes from. A radius that is not
    /// finite and non-negative is rejected and the previous source kept.
    pub fn set_radius_source(&mut self, source: RadiusSource) -> Result<(), FieldError> {
        self.radius = checked_radius(self.id, source, &self.colliders)?;
        self.radius_source = source;
        Ok(())
    }

    pub fn colliders(&self) -> &[Collider] {
        &self.colliders
    }

    /// Replace the colliders, recomputing an automatic radius.
    pub fn set_colliders(&mut self, colliders: Vec<Collider>) -> Result<(), FieldError> {
        self.radius = checked_radius(self.id, self.radius_source, &colliders)?;
        self.colliders = colliders;
        Ok(())
    }

    /// Reject state the partitioner cannot place.
    pub(crate) fn validate(&self) -> Result<(), FieldError> {
        if !self.position.is_finite() {
            return Err(FieldError::NonFinitePosition(self.id));
        }
        checked_radius(self.id, self.radius_source, &self.colliders).map(|_| ())
    }

    pub fn is_interactable(&self) -> bool {
        self.interactable
    }

    /// View-anchored entities never become interactable.
    pub fn set_interactable(&mut self, interactable: bool) {
        self.interactable = interactable && self.kind == EntityKind::Body;
    }

    pub fn viewability(&self) -> Viewability {
        self.viewability
    }

    pub fn set_viewability(&mut self, viewability: Viewability) {
        self.viewability = viewability;
    }

    pub fn render(&self) -> RenderState {
        self.render
    }

    /// Store the render transform and visibility. Returns true if visibility flipped.
    pub fn set_render(&mut self, transform: LocalTransform, visible: bool) -> bool {
        let toggled = self.render.visible != visible;
        self.render = RenderState { transform, visible };
        toggled
    }

    pub fn has_hook(&self) -> bool {
        self.hook.is_some()
    }

    pub(crate) fn run_hook(&mut self, has_neighbors: bool, dt: f32) {
        let Self {
            id,
            hook,
            local,
            velocity,
            interactable,
            ..
        } = self;
        if let Some(hook) = hook.as_mut() {
            hook.on_custom_step(
                StepContext {
                    id: *id,
                    local,
                    velocity,
                    interactable,
                    dt,
                },
                has_neighbors,
            );
        }
    }
}

impl Bounded for Entity {
    fn position(&self) -> DVec3 {
        self.position
    }

    fn bounding_radius(&self) -> f64 {
        f64::from(self.radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_radius_without_colliders_uses_default() {
        let e = Entity::from_desc(EntityId(1), EntityDesc::body(DVec3::ZERO));
        assert_eq!(e.bounding_radius(), DEFAULT_RADIUS);
    }

    #[test]
    fn auto_radius_from_centered_box() {
        let desc = EntityDesc::body(DVec3::ZERO).with_colliders(vec![Collider::cuboid([3.0, 4.0, 0.0])]);
        let e = Entity::from_desc(EntityId(1), desc);
        assert_eq!(e.bounding_radius(), 5.0);
    }

    #[test]
    fn auto_radius_includes_origin_for_offset_collider() {
        // Sphere of radius 1 centered 3 units up: box spans y 0..4, half-height 2.
        let colliders = vec![Collider::sphere(1.0).with_offset(Vec3::new(0.0, 3.0, 0.0))];
        let r = radius_from_colliders(&colliders).unwrap();
        let expected = Vec3::new(1.0, 2.0, 1.0).length();
        assert!((r - expected).abs() < 1e-6);
    }

    #[test]
    fn fixed_radius_overrides_colliders() {
        let desc = EntityDesc::body(DVec3::ZERO)
            .with_colliders(vec![Collider::sphere(10.0)])
            .with_radius(0.5);
        let mut e = Entity::from_desc(EntityId(1), desc);
        assert_eq!(e.bounding_radius(), 0.5);

        e.set_radius_source(RadiusSource::Auto).unwrap();
        assert!((e.bounding_radius() - Vec3::splat(10.0).length()).abs() < 1e-4);

        e.set_colliders(vec![Collider::sphere(2.0)]).unwrap();
        assert!((e.bounding_radius() - Vec3::splat(2.0).length()).abs() < 1e-5);
    }

    #[test]
    fn unusable_radii_are_rejected() {
        let mut e = Entity::from_desc(EntityId(5), EntityDesc::body(DVec3::ZERO).with_radius(2.0));
        for radius in [f32::INFINITY, f32::NAN, -5.0] {
            assert!(matches!(
                e.set_radius_source(RadiusSource::Fixed(radius)),
                Err(FieldError::InvalidRadius { id: EntityId(5), .. })
            ));
            assert_eq!(e.bounding_radius(), 2.0);
            assert_eq!(e.radius_source(), RadiusSource::Fixed(2.0));
        }
        e.set_radius_source(RadiusSource::Fixed(0.0)).unwrap();
        assert_eq!(e.bounding_radius(), 0.0);

        let mut auto = Entity::from_desc(EntityId(6), EntityDesc::body(DVec3::ZERO));
        assert!(auto.set_colliders(vec![Collider::sphere(f32::NAN)]).is_err());
        assert!(auto.colliders().is_empty());
        assert_eq!(auto.bounding_radius(), DEFAULT_RADIUS);
    }

    #[test]
    fn validate_flags_bad_descriptions() {
        let bad = Entity::from_desc(EntityId(7), EntityDesc::body(DVec3::ZERO).with_radius(-1.0));
        assert_eq!(
            bad.validate(),
            Err(FieldError::InvalidRadius {
                id: EntityId(7),
                radius: -1.0
            })
        );
        let lost = Entity::from_desc(EntityId(8), EntityDesc::body(DVec3::new(f64::NAN, 0.0, 0.0)));
        assert_eq!(lost.validate(), Err(FieldError::NonFinitePosition(EntityId(8))));
        let fine = Entity::from_desc(EntityId(9), EntityDesc::body(DVec3::splat(1.0e15)));
        assert!(fine.validate().is_ok());
    }

    #[test]
    fn view_anchored_is_never_interactable() {
        let mut e = Entity::from_desc(EntityId(2), EntityDesc::view_anchored(DVec3::ONE));
        assert!(!e.is_interactable());
        e.set_interactable(true);
        assert!(!e.is_interactable());
        assert_eq!(e.kind(), EntityKind::ViewAnchored);
    }

    #[test]
    fn viewability_flags_combine() {
        let both = Viewability::VISIBLE | Viewability::FOCUSABLE;
        assert!(both.contains(Viewability::VISIBLE));
        assert!(both.contains(Viewability::FOCUSABLE));
        assert!(!Viewability::FOCUSABLE.contains(Viewability::VISIBLE));
        assert!(Viewability::NONE.contains(Viewability::NONE));

        let mut flags = Viewability::NONE;
        flags |= Viewability::FOCUSABLE;
        assert_eq!(flags, Viewability::FOCUSABLE);
    }

    #[test]
    fn set_render_reports_visibility_toggles() {
        let mut e = Entity::from_desc(EntityId(3), EntityDesc::body(DVec3::ZERO));
        assert!(!e.set_render(LocalTransform::default(), true));
        assert!(e.set_render(LocalTransform::default(), false));
        assert!(!e.set_render(LocalTransform::default(), false));
        assert!(!e.render().visible);
    }

    #[test]
    fn hook_sees_local_frame() {
        let desc = EntityDesc::body(DVec3::ZERO).with_hook(|ctx: StepContext<'_>, neighbors: bool| {
            ctx.local.position.x += if neighbors { 2.0 } else { 1.0 };
            *ctx.interactable = false;
        });
        let mut e = Entity::from_desc(EntityId(4), desc);
        assert!(e.has_hook());
        e.run_hook(true, 0.02);
        assert_eq!(e.local().position.x, 2.0);
        assert!(!e.is_interactable());
    }
}
