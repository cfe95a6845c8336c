//! Partition: spatial grouping and arena packing.
//!
//! # Invariants
//! - Any two groups are separated along at least one axis.
//! - Every group's bounds enclose every member's bounding sphere.
//! - Packing is deterministic for a given group order; groups in the arena
//!   never share footprint unless the arena has overflowed.

mod arena;
mod error;
mod group;
mod partitioner;

pub use arena::{ArenaConfig, ArenaPacker, GroupPlacement, PackStats, Packing, PlacedBody};
pub use error::PartitionError;
pub use group::Group;
pub use partitioner::Partitioner;

pub fn crate_info() -> &'static str {
    "deepfield-partition v0.1.0"
}
