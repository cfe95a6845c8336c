use deepfield_common::AXES;
use deepfield_partition::{ArenaConfig, Partitioner};
use serde::{Deserialize, Serialize};

use crate::error::FieldError;

/// World configuration: arena layout plus how ticks map onto the backend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub arena: ArenaConfig,
    /// Partition and pack bodies into the arena each tick. When false the
    /// local frame is the authoritative frame cast straight to `f32`, which
    /// loses precision far from the origin.
    pub wrap_space: bool,
    /// Number of axes the partitioner splits on (1..=3).
    pub axis_count: usize,
    /// Seconds per simulation tick.
    pub fixed_dt: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            arena: ArenaConfig::default(),
            wrap_space: true,
            axis_count: AXES,
            fixed_dt: 1.0 / 50.0,
        }
    }
}

impl WorldConfig {
    pub fn validate(&self) -> Result<(), FieldError> {
        self.arena.validate()?;
        Partitioner::new(self.axis_count)?;
        if !(self.fixed_dt.is_finite() && self.fixed_dt > 0.0) {
            return Err(FieldError::InvalidTimestep(self.fixed_dt));
        }
        Ok(())
    }
}
