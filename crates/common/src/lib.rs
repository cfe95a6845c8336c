//! Shared types for the deepfield workspace.

pub mod coords;
pub mod rng;
pub mod types;

pub use coords::{AXES, Bounded, Narrow, from_engine_axes, to_engine_axes, widen};
pub use rng::SplitMix64;
pub use types::{EntityId, LocalTransform, WorldId};
