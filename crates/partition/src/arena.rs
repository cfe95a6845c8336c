use std::time::{Duration, Instant};

use deepfield_common::{Bounded, Narrow};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::PartitionError;
use crate::group::Group;

/// Groups are laid out in rows along x...
const PRIMARY: usize = 0;
/// ...and rows stack along z.
const SECONDARY: usize = 2;

/// Dimensions of the bounded local-frame rectangle the backend simulates in.
///
/// The arena is centered on the local origin, so coordinates run from
/// `-width/2..width/2` along x and `-depth/2..depth/2` along z.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    pub width: f32,
    pub depth: f32,
    /// Gap left between neighbouring groups and between rows.
    pub spacing: f32,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            width: 4000.0,
            depth: 4000.0,
            spacing: 3.0,
        }
    }
}

impl ArenaConfig {
    pub fn validate(&self) -> Result<(), PartitionError> {
        for (name, value) in [("width", self.width), ("depth", self.depth)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(PartitionError::InvalidDimension { name, value });
            }
        }
        if !(self.spacing.is_finite() && self.spacing >= 0.0) {
            return Err(PartitionError::InvalidSpacing(self.spacing));
        }
        Ok(())
    }

    /// Corner where packing starts: minimum x, minimum z.
    pub fn top_left(&self) -> Vec3 {
        Vec3::new(-self.width / 2.0, 0.0, -self.depth / 2.0)
    }

    /// The four corners of the arena on the y = 0 plane, for debug outlines.
    pub fn corners(&self) -> [Vec3; 4] {
        let (hx, hz) = (self.width / 2.0, self.depth / 2.0);
        [
            Vec3::new(-hx, 0.0, -hz),
            Vec3::new(hx, 0.0, -hz),
            Vec3::new(hx, 0.0, hz),
            Vec3::new(-hx, 0.0, hz),
        ]
    }
}

/// A body's slot in the local frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedBody {
    /// Index into the body slice that was packed.
    pub index: usize,
    pub local: Vec3,
}

/// Where one group landed in the arena.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupPlacement {
    /// Local-frame position of the group's `start` corner.
    pub origin: Vec3,
    /// Group extent, narrowed.
    pub size: Vec3,
    pub bodies: Vec<PlacedBody>,
}

impl GroupPlacement {
    pub fn has_neighbors(&self) -> bool {
        self.bodies.len() > 1
    }

    /// True if the x/z footprints of the two placements intersect.
    pub fn footprint_overlaps(&self, other: &GroupPlacement) -> bool {
        let apart = |axis: usize| {
            self.origin[axis] + self.size[axis] <= other.origin[axis]
                || other.origin[axis] + other.size[axis] <= self.origin[axis]
        };
        !(apart(PRIMARY) || apart(SECONDARY))
    }
}

/// Per-pack statistics for instrumentation.
#[derive(Debug, Clone, Default)]
pub struct PackStats {
    pub groups: usize,
    pub bodies: usize,
    pub rows: usize,
    /// The arena ran out of room; placements past this point may overlap.
    pub overflowed: bool,
    pub overflowed_groups: usize,
    pub elapsed: Duration,
}

/// Output of one pack pass.
#[derive(Debug, Clone, Default)]
pub struct Packing {
    pub placements: Vec<GroupPlacement>,
    pub stats: PackStats,
}

/// Greedy shelf packer: fills rows left to right, starting a new row when the
/// next group would run past the arena width.
#[derive(Debug, Clone)]
pub struct ArenaPacker {
    config: ArenaConfig,
}

impl ArenaPacker {
    pub fn new(config: ArenaConfig) -> Result<Self, PartitionError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Lay out `groups` (built over `bodies`) in input order.
    ///
    /// Running out of depth is not an error: every group is still placed, the
    /// overflow is logged and flagged in the returned stats.
    pub fn pack<B: Bounded>(&self, bodies: &[B], groups: &[Group]) -> Packing {
        let _span = tracing::debug_span!("pack", groups = groups.len()).entered();
        let started = Instant::now();

        let left = -self.config.width / 2.0;
        let right = self.config.width / 2.0;
        let bottom = self.config.depth / 2.0;
        let spacing = self.config.spacing;

        let mut cursor = self.config.top_left();
        let mut row_depth = 0.0_f32;
        let mut stats = PackStats {
            groups: groups.len(),
            rows: usize::from(!groups.is_empty()),
            ..PackStats::default()
        };
        let mut placements = Vec::with_capacity(groups.len());

        for group in groups {
            let size = group.size().narrow();

            if cursor[PRIMARY] > left && cursor[PRIMARY] + size[PRIMARY] > right {
                cursor[PRIMARY] = left;
                cursor[SECONDARY] += row_depth + spacing;
                row_depth = 0.0;
                stats.rows += 1;
            }

            if cursor[SECONDARY] + size[SECONDARY] > bottom || size[PRIMARY] > self.config.width {
                if !stats.overflowed {
                    tracing::warn!(
                        width = self.config.width,
                        depth = self.config.depth,
                        groups = groups.len(),
                        "arena has run out of room; expand the arena size"
                    );
                }
                stats.overflowed = true;
                stats.overflowed_groups += 1;
            }

            let origin = cursor;
            let start = group.start();
            let placed: Vec<PlacedBody> = group
                .members()
                .iter()
                .map(|&index| PlacedBody {
                    index,
                    local: origin + (bodies[index].position() - start).narrow(),
                })
                .collect();
            stats.bodies += placed.len();

            placements.push(GroupPlacement {
                origin,
                size,
                bodies: placed,
            });

            cursor[PRIMARY] += size[PRIMARY] + spacing;
            row_depth = row_depth.max(size[SECONDARY]);
        }

        stats.elapsed = started.elapsed();
        tracing::trace!(
            rows = stats.rows,
            bodies = stats.bodies,
            overflowed = stats.overflowed,
            "pack complete"
        );

        Packing { placements, stats }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Partitioner;
    use deepfield_common::SplitMix64;
    use glam::DVec3;

    #[derive(Debug)]
    struct Ball(DVec3, f64);

    impl Bounded for Ball {
        fn position(&self) -> DVec3 {
            self.0
        }
        fn bounding_radius(&self) -> f64 {
            self.1
        }
    }

    fn pack(config: ArenaConfig, bodies: &[Ball]) -> Packing {
        let groups = Partitioner::default().partition(bodies);
        ArenaPacker::new(config).unwrap().pack(bodies, &groups)
    }

    #[test]
    fn arena_config_defaults() {
        let config = ArenaConfig::default();
        assert_eq!(config.width, 4000.0);
        assert_eq!(config.depth, 4000.0);
        assert_eq!(config.spacing, 3.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let bad = ArenaConfig {
            width: 0.0,
            ..ArenaConfig::default()
        };
        assert_eq!(
            ArenaPacker::new(bad).unwrap_err(),
            PartitionError::InvalidDimension {
                name: "width",
                value: 0.0
            }
        );
        let bad = ArenaConfig {
            spacing: -1.0,
            ..ArenaConfig::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn corners_outline_the_arena() {
        let config = ArenaConfig {
            width: 10.0,
            depth: 6.0,
            spacing: 0.0,
        };
        let c = config.corners();
        assert_eq!(c[0], Vec3::new(-5.0, 0.0, -3.0));
        assert_eq!(c[2], Vec3::new(5.0, 0.0, 3.0));
        assert_eq!(config.top_left(), c[0]);
    }

    #[test]
    fn two_distant_bodies_share_a_row() {
        let bodies = [
            Ball(DVec3::new(1.0e9, 0.0, 0.0), 1.0),
            Ball(DVec3::new(1.0e9 + 10_000.0, 0.0, 0.0), 1.0),
        ];
        let packing = pack(ArenaConfig::default(), &bodies);
        assert_eq!(packing.placements.len(), 2);
        assert_eq!(packing.stats.rows, 1);
        assert!(!packing.stats.overflowed);

        let (a, b) = (&packing.placements[0], &packing.placements[1]);
        assert_eq!(a.origin, Vec3::new(-2000.0, 0.0, -2000.0));
        assert_eq!(a.origin.z, b.origin.z);
        // Gap between footprints is exactly the spacing.
        assert_eq!(b.origin.x - (a.origin.x + a.size.x), 3.0);
        assert_eq!(a.bodies[0].local, Vec3::new(-1999.0, 1.0, -1999.0));
    }

    #[test]
    fn wraps_to_a_new_row_when_width_runs_out() {
        let config = ArenaConfig {
            width: 10.0,
            depth: 100.0,
            spacing: 1.0,
        };
        // Three 4-wide groups: two fit in a 10-wide row, the third wraps.
        let bodies = [
            Ball(DVec3::new(0.0, 0.0, 0.0), 2.0),
            Ball(DVec3::new(1.0e6, 0.0, 0.0), 2.0),
            Ball(DVec3::new(2.0e6, 0.0, 0.0), 2.0),
        ];
        let packing = pack(config, &bodies);
        assert_eq!(packing.stats.rows, 2);
        let p = &packing.placements;
        assert_eq!(p[0].origin, Vec3::new(-5.0, 0.0, -50.0));
        assert_eq!(p[1].origin, Vec3::new(0.0, 0.0, -50.0));
        assert_eq!(p[2].origin, Vec3::new(-5.0, 0.0, -45.0));
        assert!(!packing.stats.overflowed);
    }

    #[test]
    fn overflow_is_flagged_but_everything_is_placed() {
        let config = ArenaConfig {
            width: 10.0,
            depth: 10.0,
            spacing: 1.0,
        };
        let bodies: Vec<Ball> = (0..8)
            .map(|i| Ball(DVec3::new(i as f64 * 1000.0, 0.0, 0.0), 2.0))
            .collect();
        let packing = pack(config, &bodies);
        assert_eq!(packing.placements.len(), 8);
        assert_eq!(packing.stats.bodies, 8);
        assert!(packing.stats.overflowed);
        assert!(packing.stats.overflowed_groups > 0);
    }

    #[test]
    fn local_offsets_preserve_relative_layout() {
        let base = DVec3::new(-7.5e11, 3.0e10, 9.9e11);
        let bodies = [
            Ball(base, 1.0),
            Ball(base + DVec3::new(1.25, 0.5, -0.75), 1.0),
        ];
        let packing = pack(ArenaConfig::default(), &bodies);
        assert_eq!(packing.placements.len(), 1);
        let placed = &packing.placements[0].bodies;
        let local = |i: usize| placed.iter().find(|p| p.index == i).unwrap().local;
        assert_eq!(local(1) - local(0), Vec3::new(1.25, 0.5, -0.75));
    }

    #[test]
    fn random_packings_do_not_overlap() {
        for seed in 0..20 {
            let mut rng = SplitMix64::new(seed);
            let bodies: Vec<Ball> = (0..150)
                .map(|_| {
                    Ball(
                        DVec3::new(
                            rng.range(-1.0e8, 1.0e8),
                            rng.range(-1.0e4, 1.0e4),
                            rng.range(-1.0e8, 1.0e8),
                        ),
                        rng.range(0.5, 30.0),
                    )
                })
                .collect();
            let packing = pack(ArenaConfig::default(), &bodies);
            assert!(!packing.stats.overflowed);
            let p = &packing.placements;
            for (i, a) in p.iter().enumerate() {
                for b in &p[i + 1..] {
                    assert!(!a.footprint_overlaps(b), "{a:?} overlaps {b:?}");
                }
            }
        }
    }

    #[test]
    fn empty_pack_is_empty() {
        let bodies: [Ball; 0] = [];
        let packing = ArenaPacker::new(ArenaConfig::default())
            .unwrap()
            .pack(&bodies, &[]);
        assert!(packing.placements.is_empty());
        assert_eq!(packing.stats.rows, 0);
    }
}
