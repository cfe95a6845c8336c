use deepfield_common::{AXES, Bounded};

use crate::error::PartitionError;
use crate::group::Group;

/// Splits a set of bodies into groups that cannot touch each other.
///
/// Works one axis at a time with a 1-D interval merge: sort by lower bound,
/// sweep, and start a new group wherever a body begins at or past the running
/// group's upper bound. Each merged run is then split again on the next axis.
/// Any two returned groups are separated along at least one of the first
/// `axis_count` axes.
#[derive(Debug, Clone, Copy)]
pub struct Partitioner {
    axis_count: usize,
}

impl Default for Partitioner {
    fn default() -> Self {
        Self { axis_count: AXES }
    }
}

impl Partitioner {
    /// Create a partitioner that considers the first `axis_count` axes (1..=3).
    pub fn new(axis_count: usize) -> Result<Self, PartitionError> {
        if axis_count == 0 || axis_count > AXES {
            return Err(PartitionError::InvalidAxisCount(axis_count));
        }
        Ok(Self { axis_count })
    }

    pub fn axis_count(&self) -> usize {
        self.axis_count
    }

    /// Partition `bodies` into disjoint groups. Output is deterministic for a
    /// given input order; group members are indices into `bodies`.
    pub fn partition<B: Bounded>(&self, bodies: &[B]) -> Vec<Group> {
        let _span = tracing::debug_span!("partition", bodies = bodies.len()).entered();

        let mut groups = Vec::new();
        let Some(root) = Group::from_members(bodies, (0..bodies.len()).collect()) else {
            return groups;
        };
        self.split(bodies, root, 0, &mut groups);

        tracing::trace!(groups = groups.len(), "partition complete");
        groups
    }

    fn split<B: Bounded>(&self, bodies: &[B], group: Group, axis: usize, out: &mut Vec<Group>) {
        if axis >= self.axis_count || group.len() <= 1 {
            out.push(group);
            return;
        }

        // Stable: ties keep the order they arrived in.
        let mut order = group.into_members();
        order.sort_by(|&a, &b| bodies[a].lower(axis).total_cmp(&bodies[b].lower(axis)));

        let mut iter = order.into_iter();
        let Some(first) = iter.next() else {
            return;
        };
        let mut current = Group::seeded(first, &bodies[first]);

        for i in iter {
            if bodies[i].lower(axis) < current.end()[axis] {
                current.absorb(i, &bodies[i]);
            } else {
                let closed = std::mem::replace(&mut current, Group::seeded(i, &bodies[i]));
                self.split(bodies, closed, axis + 1, out);
            }
        }

        self.split(bodies, current, axis + 1, out);
    }
}
