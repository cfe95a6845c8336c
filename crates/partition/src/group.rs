use deepfield_common::{AXES, Bounded};
use glam::DVec3;

/// A cluster of bodies whose bounding volumes could not be proven apart.
///
/// Members are indices into the body slice the group was built from. `start`
/// and `end` always form the tight AABB over every member's bounding sphere.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    members: Vec<usize>,
    start: DVec3,
    end: DVec3,
}

impl Group {
    /// A group holding a single body.
    pub fn seeded<B: Bounded>(index: usize, body: &B) -> Self {
        Self {
            members: vec![index],
            start: body.min_corner(),
            end: body.max_corner(),
        }
    }

    /// Build a group over the given members. Returns `None` if `members` is empty.
    pub fn from_members<B: Bounded>(bodies: &[B], members: Vec<usize>) -> Option<Self> {
        let (&first, rest) = members.split_first()?;
        let mut start = bodies[first].min_corner();
        let mut end = bodies[first].max_corner();
        for &i in rest {
            start = start.min(bodies[i].min_corner());
            end = end.max(bodies[i].max_corner());
        }
        Some(Self {
            members,
            start,
            end,
        })
    }

    /// Add a body and grow the bounds to cover it on every axis.
    pub fn absorb<B: Bounded>(&mut self, index: usize, body: &B) {
        self.members.push(index);
        self.start = self.start.min(body.min_corner());
        self.end = self.end.max(body.max_corner());
    }

    pub fn members(&self) -> &[usize] {
        &self.members
    }

    pub fn into_members(self) -> Vec<usize> {
        self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// More than one body shares this group.
    pub fn has_neighbors(&self) -> bool {
        self.members.len() > 1
    }

    pub fn start(&self) -> DVec3 {
        self.start
    }

    pub fn end(&self) -> DVec3 {
        self.end
    }

    pub fn size(&self) -> DVec3 {
        self.end - self.start
    }

    pub fn center(&self) -> DVec3 {
        (self.start + self.end) * 0.5
    }

    /// True if `body`'s bounding sphere lies inside this group's bounds.
    pub fn encloses<B: Bounded>(&self, body: &B) -> bool {
        (0..AXES).all(|axis| self.start[axis] <= body.lower(axis) && self.end[axis] >= body.upper(axis))
    }

    /// True if the two groups' intervals do not overlap along `axis`.
    /// Touching intervals count as separated.
    pub fn separated_on(&self, other: &Group, axis: usize) -> bool {
        self.end[axis] <= other.start[axis] || other.end[axis] <= self.start[axis]
    }

    /// True if the groups are separated along at least one of the first `axes` axes.
    pub fn disjoint_from(&self, other: &Group, axes: usize) -> bool {
        (0..axes.min(AXES)).any(|axis| self.separated_on(other, axis))
    }
}
