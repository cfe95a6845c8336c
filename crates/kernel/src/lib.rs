//! World kernel: authoritative `f64` entity state stepped through a bounded
//! `f32` backend frame.
//!
//! # Invariants
//! - An entity's authoritative position only changes by explicit moves or by
//!   the local displacement the backend produced during a tick.
//! - Interactable entities are placed in disjoint groups; a body the backend
//!   leaves alone never drifts.
//! - Arena overflow degrades a tick but never fails it.
//! - Iteration and stepping follow registration order.

pub mod backend;
pub mod config;
pub mod entity;
pub mod error;
pub mod report;
pub mod sync;
pub mod world;

pub use backend::{Backend, BackendBody, KinematicBackend, NullBackend};
pub use config::WorldConfig;
pub use entity::{
    Collider, ColliderShape, DEFAULT_RADIUS, Entity, EntityDesc, EntityKind, RadiusSource,
    RenderState, StepContext, StepHook, Viewability, radius_from_colliders,
};
pub use error::FieldError;
pub use report::{TickReport, TickTimer};
pub use sync::SyncMode;
pub use world::{World, WorldEvent};

pub fn crate_info() -> &'static str {
    "deepfield-kernel v0.1.0"
}
