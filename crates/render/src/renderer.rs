use mekanix_common::View;
use std::fmt::Write;

use crate::frame::{Frame, ShapeRole};

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// The renderer reads a frame and a view and produces output. It never sees
/// the level or the world directly.
pub trait Renderer {
    type Output;

    fn render(&self, frame: &Frame, view: &View) -> Self::Output;
}

/// Produces a line-per-item text dump of a frame, in screen coordinates.
///
/// Used by the CLI and in tests of the render boundary.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    /// Also print world coordinates next to screen coordinates.
    pub world_coords: bool,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_world_coords(mut self) -> Self {
        self.world_coords = true;
        self
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, frame: &Frame, view: &View) -> String {
        let mut out = String::new();
        if let Err(err) = self.write_frame(&mut out, frame, view) {
            tracing::warn!(%err, "debug frame truncated");
        }
        tracing::trace!(bytes = out.len(), "rendered debug frame");
        out
    }
}

impl DebugTextRenderer {
    fn write_frame(&self, out: &mut String, frame: &Frame, view: &View) -> std::fmt::Result {
        match frame.tick {
            Some(tick) => writeln!(
                out,
                "=== {} (tick={tick}, held={}) ===",
                frame.mode, frame.input_held
            )?,
            None => writeln!(out, "=== {} ===", frame.mode)?,
        }
        writeln!(out, "scale={:.3}", view.view_scale())?;

        for shape in &frame.shapes {
            let role = match shape.role {
                ShapeRole::Part => "part",
                ShapeRole::Platform => "platform",
            };
            let s = view.world_to_screen(shape.rect.center);
            write!(
                out,
                "  {role} {} at ({:.1}, {:.1}) size {:.1}x{:.1} angle {:.3}",
                shape.id,
                s.x,
                s.y,
                shape.rect.width(),
                shape.rect.height(),
                shape.rect.angle
            )?;
            if self.world_coords {
                write!(out, " world ({:.1}, {:.1})", shape.rect.center.x, shape.rect.center.y)?;
            }
            writeln!(out)?;
        }

        for joint in &frame.joints {
            let a = view.world_to_screen(joint.anchor_a);
            let b = view.world_to_screen(joint.anchor_b);
            let kind = if joint.contraction { "muscle" } else { "pivot" };
            writeln!(
                out,
                "  {kind} {} ({:.1}, {:.1}) - ({:.1}, {:.1})",
                joint.id, a.x, a.y, b.x, b.y
            )?;
        }

        let g = view.world_to_screen(frame.goal.center);
        writeln!(
            out,
            "  goal {} at ({:.1}, {:.1}) r {:.1} progress {:.0}%",
            frame.goal.id,
            g.x,
            g.y,
            frame.goal.radius * view.view_scale(),
            frame.goal.progress * 100.0
        )?;

        if let Some(ring) = frame.highlight {
            let c = view.world_to_screen(ring.center);
            writeln!(out, "  selected {} ring ({:.1}, {:.1}) r {:.1}", ring.id, c.x, c.y, ring.radius)?;
        }
        for (handle, pos) in &frame.handles {
            let p = view.world_to_screen(*pos);
            writeln!(out, "  handle {handle:?} ({:.1}, {:.1})", p.x, p.y)?;
        }
        Ok(())
    }
}
