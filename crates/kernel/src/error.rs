use deepfield_common::EntityId;
use deepfield_partition::PartitionError;

/// Errors surfaced by world operations.
///
/// Capacity overflow is deliberately absent: it degrades a tick, it does not
/// fail it. Everything here is a contract violation by the caller.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FieldError {
    #[error("entity {0} is not registered in this world")]
    UnknownEntity(EntityId),
    #[error("entity {0} is positioned relative to a viewpoint and cannot be moved directly")]
    UnsupportedMove(EntityId),
    #[error("entity {0} is not anchored to a viewpoint")]
    NotViewAnchored(EntityId),
    #[error("world has been shut down")]
    Closed,
    #[error(transparent)]
    Partition(#[from] PartitionError),
    #[error("entity {id} has bounding radius {radius}, expected a finite non-negative value")]
    InvalidRadius { id: EntityId, radius: f32 },
    #[error("entity {0} would move to a non-finite position")]
    NonFinitePosition(EntityId),
    #[error("fixed timestep must be positive and finite, got {0}")]
    InvalidTimestep(f32),
}
