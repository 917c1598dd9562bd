//! Ink/eraser compositing policy: visible segments to draw operations.

use crate::document::normalize::{MotionPoint, Tool};
use crate::foundation::core::{Point, Rgb8};
use crate::visibility::FrameView;

/// Smallest line width emitted, so zero-pressure segments stay visible.
pub const DEFAULT_MIN_WIDTH: f64 = 0.5;

/// How a segment combines with what is already painted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawMode {
    /// Normal paint compositing in the stroke's color.
    Ink(Rgb8),
    /// Replace everything under the path with the page background.
    Erase,
}

/// One line segment to draw, already in output pixel space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawOp {
    pub from: Point,
    pub to: Point,
    pub width: f64,
    pub mode: DrawMode,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompositeOpts {
    /// Page units to pixels.
    pub scale: f64,
    /// Width floor in page units.
    pub min_width: f64,
}

impl Default for CompositeOpts {
    fn default() -> Self {
        Self {
            scale: 1.0,
            min_width: DEFAULT_MIN_WIDTH,
        }
    }
}

/// Pressure of a sample, with unknown pressure treated as full pressure.
pub fn resolve_pressure(p: &MotionPoint) -> f64 {
    match p.pressure {
        Some(v) if (0.0..=1.0).contains(&v) => v,
        _ => 1.0,
    }
}

pub fn line_width(base: f64, pressure: f64, min_width: f64) -> f64 {
    (base * pressure).max(min_width)
}

/// Draw operations for every visible segment of `view`, strokes in timeline order.
pub fn segment_ops(view: &FrameView<'_>, opts: &CompositeOpts) -> Vec<DrawOp> {
    let scale = opts.scale;
    let mut ops = Vec::new();
    for vs in &view.strokes {
        let stroke = vs.stroke;
        let tool_erases = stroke.tool == Tool::Eraser;
        for pair in vs.points.windows(2) {
            let (p1, p2) = (&pair[0], &pair[1]);
            let mode = if tool_erases || p1.is_eraser || p2.is_eraser {
                DrawMode::Erase
            } else {
                DrawMode::Ink(stroke.color)
            };
            let width = line_width(stroke.width, resolve_pressure(p2), opts.min_width);
            ops.push(DrawOp {
                from: Point::new(p1.pos.x * scale, p1.pos.y * scale),
                to: Point::new(p2.pos.x * scale, p2.pos.y * scale),
                width: width * scale,
                mode,
            });
        }
    }
    ops
}
