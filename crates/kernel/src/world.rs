use std::collections::BTreeMap;
use std::time::Instant;

use deepfield_common::{Bounded, EntityId, WorldId};
use deepfield_partition::{ArenaPacker, Partitioner};
use glam::{DVec3, Vec3};
use serde::{Deserialize, Serialize};

use crate::backend::{Backend, BackendBody};
use crate::config::WorldConfig;
use crate::entity::{Entity, EntityDesc, EntityKind};
use crate::error::FieldError;
use crate::report::{TickReport, TickTimer};
use crate::sync::{self, SyncMode};

/// An event record produced by every mutation to the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorldEvent {
    Added { id: EntityId },
    Removed { id: EntityId },
    /// Explicit move between ticks.
    Moved { id: EntityId, delta: DVec3 },
    /// Simulation advanced one tick.
    Stepped {
        tick: u64,
        groups: usize,
        overflowed: bool,
    },
}

/// Frozen copy of an interactable entity taken at the start of a tick.
#[derive(Debug, Clone, Copy)]
struct Snapshot {
    id: EntityId,
    position: DVec3,
    radius: f64,
}

impl Bounded for Snapshot {
    fn position(&self) -> DVec3 {
        self.position
    }

    fn bounding_radius(&self) -> f64 {
        self.radius
    }
}

/// One floating-origin session: the entity registry, the backend it drives,
/// and the per-tick partition / pack / step / sync pipeline.
///
/// Entities are kept in a BTreeMap keyed by sequential ids, so iteration is
/// registration order and every tick is reproducible. Creating a world takes
/// over stepping from the backend; [`World::shutdown`] (or drop) clears the
/// registry and hands it back.
pub struct World<B: Backend> {
    id: WorldId,
    config: WorldConfig,
    mode: SyncMode,
    partitioner: Partitioner,
    packer: ArenaPacker,
    backend: B,
    entities: BTreeMap<EntityId, Entity>,
    next_id: u64,
    tick: u64,
    open: bool,
    event_log: Vec<WorldEvent>,
    timer: TickTimer,
}

impl<B: Backend> World<B> {
    /// Open a world over `backend`. Disables the backend's own auto-simulation.
    pub fn create(config: WorldConfig, mut backend: B) -> Result<Self, FieldError> {
        config.validate()?;
        let partitioner = Partitioner::new(config.axis_count)?;
        let packer = ArenaPacker::new(config.arena)?;
        backend.set_auto_simulation(false);

        let id = WorldId::new();
        tracing::info!(world = %id.0, wrap_space = config.wrap_space, "world created");

        Ok(Self {
            id,
            mode: SyncMode::from_wrap_space(config.wrap_space),
            config,
            partitioner,
            packer,
            backend,
            entities: BTreeMap::new(),
            next_id: 1,
            tick: 0,
            open: true,
            event_log: Vec::new(),
            timer: TickTimer::default(),
        })
    }

    /// Identity of this world, distinct from every other.
    pub fn id(&self) -> WorldId {
        self.id
    }

    /// Configuration the world was created with.
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// How local results flow back into authoritative positions.
    pub fn sync_mode(&self) -> SyncMode {
        self.mode
    }

    /// True until the world is shut down.
    pub fn exists(&self) -> bool {
        self.open
    }

    /// Current simulation tick.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Number of registered entities.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// The backend this world steps.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable access to the backend, e.g. to change gravity between ticks.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Durations of recent ticks.
    pub fn tick_timer(&self) -> &TickTimer {
        &self.timer
    }

    /// Take all recorded events, leaving the log empty.
    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.event_log)
    }

    /// Events recorded since the last drain.
    pub fn events(&self) -> &[WorldEvent] {
        &self.event_log
    }

    fn ensure_open(&self) -> Result<(), FieldError> {
        if self.open { Ok(()) } else { Err(FieldError::Closed) }
    }

    /// Create and register an entity. Returns its id.
    ///
    /// Fails if the position is not finite or the bounding radius is not
    /// finite and non-negative.
    pub fn spawn(&mut self, desc: EntityDesc) -> Result<EntityId, FieldError> {
        self.ensure_open()?;
        let id = EntityId(self.next_id);
        let entity = Entity::from_desc(id, desc);
        entity.validate()?;
        self.next_id += 1;
        self.entities.insert(id, entity);
        self.event_log.push(WorldEvent::Added { id });
        Ok(id)
    }

    /// Register an existing entity (e.g. one previously removed).
    /// Returns false if an entity with the same id is already registered.
    pub fn add(&mut self, entity: Entity) -> Result<bool, FieldError> {
        self.ensure_open()?;
        let id = entity.id();
        if self.entities.contains_key(&id) {
            return Ok(false);
        }
        entity.validate()?;
        self.next_id = self.next_id.max(id.0 + 1);
        self.entities.insert(id, entity);
        self.event_log.push(WorldEvent::Added { id });
        Ok(true)
    }

    /// Unregister an entity. Removing an unknown id is a no-op.
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let removed = self.entities.remove(&id);
        if removed.is_some() {
            self.event_log.push(WorldEvent::Removed { id });
        }
        removed
    }

    /// Check whether an entity is registered.
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Get an entity by id.
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Get a mutable entity by id.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// All entities in registration order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// All entities in registration order, mutably.
    pub fn entities_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.values_mut()
    }

    fn movable(&mut self, id: EntityId) -> Result<&mut Entity, FieldError> {
        let entity = self
            .entities
            .get_mut(&id)
            .ok_or(FieldError::UnknownEntity(id))?;
        if entity.kind() == EntityKind::ViewAnchored {
            return Err(FieldError::UnsupportedMove(id));
        }
        Ok(entity)
    }

    /// Shift an entity's authoritative position by `delta`.
    pub fn move_by(&mut self, id: EntityId, delta: DVec3) -> Result<(), FieldError> {
        let entity = self.movable(id)?;
        let target = entity.position + delta;
        if !target.is_finite() {
            return Err(FieldError::NonFinitePosition(id));
        }
        entity.position = target;
        self.event_log.push(WorldEvent::Moved { id, delta });
        Ok(())
    }

    /// Set an entity's authoritative position outright.
    pub fn teleport(&mut self, id: EntityId, position: DVec3) -> Result<(), FieldError> {
        let entity = self.movable(id)?;
        if !position.is_finite() {
            return Err(FieldError::NonFinitePosition(id));
        }
        let delta = position - entity.position;
        entity.position = position;
        self.event_log.push(WorldEvent::Moved { id, delta });
        Ok(())
    }

    /// Write the position of a view-anchored entity (a camera rig tracking its
    /// viewpoint). Fails for ordinary bodies.
    pub fn anchor_to_view(&mut self, id: EntityId, position: DVec3) -> Result<(), FieldError> {
        let entity = self
            .entities
            .get_mut(&id)
            .ok_or(FieldError::UnknownEntity(id))?;
        if entity.kind() != EntityKind::ViewAnchored {
            return Err(FieldError::NotViewAnchored(id));
        }
        if !position.is_finite() {
            return Err(FieldError::NonFinitePosition(id));
        }
        entity.position = position;
        Ok(())
    }

    /// Advance the simulation by one fixed tick.
    ///
    /// Interactable entities are snapshotted, partitioned into disjoint groups,
    /// packed into the arena and placed; step hooks run; the backend steps; the
    /// local displacement is folded back into each authoritative position.
    /// With no interactable entities nothing is placed, stepped, or synced.
    pub fn step(&mut self) -> Result<TickReport, FieldError> {
        self.ensure_open()?;
        let tick = self.tick + 1;
        let _span = tracing::info_span!("tick", world = %self.id.0, tick).entered();
        let started = Instant::now();

        let snapshot: Vec<Snapshot> = self
            .entities
            .values()
            .filter(|e| e.is_interactable())
            .map(|e| Snapshot {
                id: e.id(),
                position: e.position(),
                radius: f64::from(e.bounding_radius()),
            })
            .collect();

        let mut report = TickReport {
            tick,
            interactable: snapshot.len(),
            ..TickReport::default()
        };

        if snapshot.is_empty() {
            tracing::trace!("no interactable entities, skipping tick");
            report.skipped = true;
        } else {
            match self.mode {
                SyncMode::Partitioned => self.step_partitioned(&snapshot, &mut report),
                SyncMode::Direct => self.step_direct(&mut report),
            }
        }

        self.tick = tick;
        report.elapsed = started.elapsed();
        self.timer.record(report.elapsed);
        self.event_log.push(WorldEvent::Stepped {
            tick,
            groups: report.groups,
            overflowed: report.overflowed(),
        });

        tracing::debug!(
            interactable = report.interactable,
            groups = report.groups,
            synced = report.synced,
            "tick complete"
        );
        Ok(report)
    }

    fn step_partitioned(&mut self, snapshot: &[Snapshot], report: &mut TickReport) {
        let groups = self.partitioner.partition(snapshot);
        let packing = self.packer.pack(snapshot, &groups);
        let dt = self.config.fixed_dt;

        let mut placed = Vec::with_capacity(snapshot.len());
        for placement in &packing.placements {
            for body in &placement.bodies {
                let id = snapshot[body.index].id;
                if let Some(entity) = self.entities.get_mut(&id) {
                    SyncMode::Partitioned.place(entity, body.local);
                    placed.push(id);
                }
            }
            // Hooks run once the whole group is in place, so they can see their neighbours.
            let has_neighbors = placement.has_neighbors();
            for body in &placement.bodies {
                if let Some(entity) = self.entities.get_mut(&snapshot[body.index].id) {
                    entity.run_hook(has_neighbors, dt);
                }
            }
        }

        report.groups = groups.len();
        report.pack = Some(packing.stats);
        self.simulate(&placed, SyncMode::Partitioned, report);
    }

    fn step_direct(&mut self, report: &mut TickReport) {
        let dt = self.config.fixed_dt;
        let ids: Vec<EntityId> = self
            .entities
            .values()
            .filter(|e| e.kind() == EntityKind::Body)
            .map(Entity::id)
            .collect();

        for id in &ids {
            if let Some(entity) = self.entities.get_mut(id) {
                SyncMode::Direct.place(entity, Vec3::ZERO);
            }
        }
        for id in &ids {
            if let Some(entity) = self.entities.get_mut(id) {
                entity.run_hook(true, dt);
            }
        }

        self.simulate(&ids, SyncMode::Direct, report);
    }

    fn simulate(&mut self, ids: &[EntityId], mode: SyncMode, report: &mut TickReport) {
        let mut bodies: Vec<BackendBody> = ids
            .iter()
            .filter_map(|id| self.entities.get(id))
            .map(sync::to_backend)
            .collect();

        self.backend.step(&mut bodies, self.config.fixed_dt);

        for body in &bodies {
            if let Some(entity) = self.entities.get_mut(&body.id) {
                sync::from_backend(entity, body);
                mode.reconcile(entity);
                report.synced += 1;
            }
        }
    }

    /// Tear the session down: clear the registry and restore the backend's
    /// auto-simulation. Further mutations fail with [`FieldError::Closed`].
    pub fn shutdown(&mut self) {
        if !self.open {
            return;
        }
        self.entities.clear();
        self.backend.set_auto_simulation(true);
        self.open = false;
        tracing::info!(world = %self.id.0, tick = self.tick, "world shut down");
    }
}

impl<B: Backend> Drop for World<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
