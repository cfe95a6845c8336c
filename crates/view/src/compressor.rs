//! Radial distance compression for rendering far-away entities.
//!
//! Inside `inner_radius` an offset is drawn as-is. Between `inner_radius` and
//! `outer_real_radius` the distance beyond the inner bubble is squeezed into
//! `outer_scaled_radius - inner_radius` and the entity is shrunk by the same
//! ratio, so its apparent size is preserved. Beyond `outer_real_radius` the
//! entity is hidden.
//!
//! The compressed band is anchored at zero, not at `inner_radius`: an entity
//! just outside the inner bubble jumps to the viewpoint with a near-zero
//! scale. That seam is kept as-is.

use std::sync::atomic::{AtomicBool, Ordering};

use deepfield_common::Narrow;
use glam::{DVec3, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::ViewError;

/// Radii of the view bubble, in world units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewSettings {
    /// Distance up to which entities are drawn at full scale.
    pub inner_radius: f32,
    /// True distance beyond which entities are hidden.
    pub outer_real_radius: f32,
    /// Rendered distance that `outer_real_radius` maps onto.
    pub outer_scaled_radius: f32,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            inner_radius: 2500.0,
            outer_real_radius: 50_000.0,
            outer_scaled_radius: 3000.0,
        }
    }
}

impl ViewSettings {
    pub fn validate(&self) -> Result<(), ViewError> {
        for (name, value) in [
            ("inner_radius", self.inner_radius),
            ("outer_real_radius", self.outer_real_radius),
            ("outer_scaled_radius", self.outer_scaled_radius),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ViewError::InvalidRadius { name, value });
            }
        }
        if self.outer_real_radius <= self.inner_radius {
            return Err(ViewError::OuterWithinInner {
                inner: self.inner_radius,
                outer: self.outer_real_radius,
            });
        }
        if self.outer_scaled_radius <= self.inner_radius {
            tracing::warn!(
                inner = self.inner_radius,
                outer_scaled = self.outer_scaled_radius,
                "outer scaled radius does not exceed inner radius, compressed band will be inverted"
            );
        }
        Ok(())
    }
}

/// Where and how large to draw one entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewSample {
    pub visible: bool,
    /// Position relative to the viewpoint.
    pub position: Vec3,
    /// Uniform scale factor.
    pub scale: f32,
}

impl ViewSample {
    fn unscaled(position: Vec3, visible: bool) -> Self {
        Self {
            visible,
            position,
            scale: 1.0,
        }
    }
}

/// Evaluates the compression for offsets from a viewpoint.
///
/// Holds no per-call state, so one compressor can be shared across threads.
#[derive(Debug, Default)]
pub struct ViewCompressor {
    settings: Option<ViewSettings>,
    scaled_span: f32,
    real_span: f32,
    warned: AtomicBool,
}

impl ViewCompressor {
    pub fn new(settings: ViewSettings) -> Result<Self, ViewError> {
        let mut compressor = Self::default();
        compressor.set_settings(Some(settings))?;
        Ok(compressor)
    }

    /// A compressor without settings. Every offset passes through unscaled.
    pub fn unconfigured() -> Self {
        Self::default()
    }

    pub fn new_or_unconfigured(settings: Option<ViewSettings>) -> Result<Self, ViewError> {
        let mut compressor = Self::default();
        compressor.set_settings(settings)?;
        Ok(compressor)
    }

    pub fn settings(&self) -> Option<&ViewSettings> {
        self.settings.as_ref()
    }

    /// Replace the settings and recompute the cached spans.
    /// On error the previous settings stay in effect.
    pub fn set_settings(&mut self, settings: Option<ViewSettings>) -> Result<(), ViewError> {
        match settings {
            Some(s) => {
                s.validate()?;
                self.scaled_span = s.outer_scaled_radius - s.inner_radius;
                self.real_span = s.outer_real_radius - s.inner_radius;
                self.warned.store(false, Ordering::Relaxed);
            }
            None => {
                self.scaled_span = 0.0;
                self.real_span = 0.0;
            }
        }
        self.settings = settings;
        Ok(())
    }

    /// Compress a world-space offset (entity minus viewpoint).
    pub fn compress(&self, offset: DVec3) -> ViewSample {
        self.compress_local(offset.narrow())
    }

    /// Compress an offset already in single precision.
    pub fn compress_local(&self, r: Vec3) -> ViewSample {
        let Some(settings) = self.settings.as_ref() else {
            if !self.warned.swap(true, Ordering::Relaxed) {
                tracing::warn!("no view settings configured, positions pass through unscaled");
            }
            return ViewSample::unscaled(r, true);
        };

        let d0 = r.length();
        if d0 <= settings.inner_radius {
            ViewSample::unscaled(r, true)
        } else if d0 <= settings.outer_real_radius {
            let d1 = (d0 - settings.inner_radius) * self.scaled_span / self.real_span;
            ViewSample {
                visible: true,
                position: r / d0 * d1,
                scale: d1 / d0,
            }
        } else {
            ViewSample::unscaled(r, false)
        }
    }
}
