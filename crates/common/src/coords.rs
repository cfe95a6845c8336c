//! Double-precision coordinates and the narrow/widen boundary.
//!
//! Authoritative positions are `glam::DVec3`. Crossing into single precision is
//! lossy, so it only happens through [`Narrow`], and only on offsets that are
//! already small (a difference of two nearby positions, never a raw position).

use glam::{DVec3, Vec3};

/// Number of spatial axes in the world.
pub const AXES: usize = 3;

/// Explicit lossy conversion between the `f64` model and the `f32` local frame.
pub trait Narrow {
    /// Narrow a relative offset to single precision.
    fn narrow(self) -> Vec3;
}

impl Narrow for DVec3 {
    #[inline]
    fn narrow(self) -> Vec3 {
        self.as_vec3()
    }
}

/// Widen a single-precision delta back into the `f64` model.
#[inline]
pub fn widen(v: Vec3) -> DVec3 {
    v.as_dvec3()
}

/// Anything with an authoritative position and a bounding sphere.
pub trait Bounded {
    fn position(&self) -> DVec3;
    fn bounding_radius(&self) -> f64;

    /// Lower end of the bounding interval along `axis`.
    #[inline]
    fn lower(&self, axis: usize) -> f64 {
        self.position()[axis] - self.bounding_radius()
    }

    /// Upper end of the bounding interval along `axis`.
    #[inline]
    fn upper(&self, axis: usize) -> f64 {
        self.position()[axis] + self.bounding_radius()
    }

    fn min_corner(&self) -> DVec3 {
        self.position() - DVec3::splat(self.bounding_radius())
    }

    fn max_corner(&self) -> DVec3 {
        self.position() + DVec3::splat(self.bounding_radius())
    }
}

impl<T: Bounded + ?Sized> Bounded for &T {
    fn position(&self) -> DVec3 {
        (**self).position()
    }

    fn bounding_radius(&self) -> f64 {
        (**self).bounding_radius()
    }
}

/// Convert right-handed geodetic axes (x north, y west, z up) into the
/// left-handed, y-up engine frame.
pub fn to_engine_axes(v: DVec3) -> DVec3 {
    DVec3::new(-v.y, v.z, v.x)
}

/// Inverse of [`to_engine_axes`].
pub fn from_engine_axes(v: DVec3) -> DVec3 {
    DVec3::new(v.z, -v.x, v.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ball(DVec3, f64);

    impl Bounded for Ball {
        fn position(&self) -> DVec3 {
            self.0
        }
        fn bounding_radius(&self) -> f64 {
            self.1
        }
    }

    #[test]
    fn bounds_per_axis() {
        let b = Ball(DVec3::new(10.0, -4.0, 2.5), 1.5);
        assert_eq!(b.lower(0), 8.5);
        assert_eq!(b.upper(1), -2.5);
        assert_eq!(b.min_corner(), DVec3::new(8.5, -5.5, 1.0));
        assert_eq!(b.max_corner(), DVec3::new(11.5, -2.5, 4.0));
    }

    #[test]
    fn narrowing_a_nearby_difference_is_exact_enough() {
        let a = DVec3::new(1.0e12 + 0.25, 7.0e11, -3.0e12);
        let b = DVec3::new(1.0e12, 7.0e11 - 2.0, -3.0e12 + 0.5);
        let offset = (a - b).narrow();
        assert_eq!(offset, Vec3::new(0.25, 2.0, -0.5));
        assert_eq!(b + widen(offset), a);
    }

    #[test]
    fn engine_axes_round_trip() {
        let geo = DVec3::new(1.0, 2.0, 3.0);
        let engine = to_engine_axes(geo);
        assert_eq!(engine, DVec3::new(-2.0, 3.0, 1.0));
        assert_eq!(from_engine_axes(engine), geo);
    }
}
