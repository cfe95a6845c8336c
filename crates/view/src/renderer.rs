use std::fmt::Write as _;

use deepfield_kernel::{Backend, Viewability, World};
use glam::DVec3;

use crate::pass::FrameStats;

/// Inputs of one rendered frame beyond the world itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderView {
    /// Authoritative eye position.
    pub eye: DVec3,
    /// Result of the view pass that produced the render states.
    pub stats: FrameStats,
}

/// Renderer-agnostic interface.
///
/// A renderer reads the render states the view pass wrote and produces
/// output. It never mutates the world.
pub trait Renderer {
    type Output;

    fn render<B: Backend>(&self, world: &World<B>, view: &RenderView) -> Self::Output;
}

/// Produces a human-readable dump of the compressed view.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    /// List hidden entities too.
    pub show_hidden: bool,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render<B: Backend>(&self, world: &World<B>, view: &RenderView) -> String {
        let mut out = String::new();
        let world_id = world.id().0.to_string();
        let _ = writeln!(
            out,
            "=== View (tick={}, world={}) ===",
            world.tick(),
            &world_id[..8]
        );
        let _ = writeln!(
            out,
            "Entities: {} (visible={}, hidden={}, toggled={})",
            world.entity_count(),
            view.stats.visible,
            view.stats.hidden,
            view.stats.toggled
        );
        let _ = writeln!(
            out,
            "Eye: ({:.3}, {:.3}, {:.3})",
            view.eye.x, view.eye.y, view.eye.z
        );

        for entity in world.entities() {
            if !entity.viewability().contains(Viewability::VISIBLE) {
                continue;
            }
            let render = entity.render();
            if !render.visible && !self.show_hidden {
                continue;
            }
            let p = render.transform.position;
            let _ = writeln!(
                out,
                "  [{}] pos=({:.2}, {:.2}, {:.2}) scale={:.5}{}",
                entity.id(),
                p.x,
                p.y,
                p.z,
                render.transform.scale,
                if render.visible { "" } else { " hidden" }
            );
        }

        out
    }
}
