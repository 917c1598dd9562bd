//! CPU raster backend powered by `vello_cpu`.

use kurbo::Shape;
use vello_cpu::kurbo::{Affine, BezPath, Cap, Join, Rect, Stroke};
use vello_cpu::peniko::Color;

use crate::composite::{DrawMode, DrawOp};
use crate::document::normalize::{Background, Pattern};
use crate::foundation::core::{Point, Rgb8};
use crate::foundation::error::{PenReplayError, PenReplayResult};
use crate::render::backend::{CursorPlan, FramePlan, FrameRGBA, RenderBackend};
use crate::visibility::CursorKind;

// Page decoration, in page units.
const RULED_SPACING: f64 = 24.0;
const RULED_TOP: f64 = 80.0;
const RULED_MARGIN_X: f64 = 72.0;
const GRID_SPACING: f64 = 14.17;
const DOT_RADIUS: f64 = 0.75;
const PATTERN_LINE_WIDTH: f64 = 0.5;

const PATTERN_COLOR: [u8; 4] = [64, 160, 255, 96];
const MARGIN_COLOR: [u8; 4] = [255, 0, 128, 96];

// Cursor glyphs, in pixels before `CursorPlan::size`.
const PEN_RADIUS: f64 = 3.5;
const PEN_RING: f64 = 1.5;
const ERASER_SIDE: f64 = 14.0;

/// CPU backend; keeps one render context alive across same-sized frames.
#[derive(Default)]
pub struct CpuBackend {
    ctx: Option<vello_cpu::RenderContext>,
}

impl CpuBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_ctx_mut<R>(
        &mut self,
        width: u16,
        height: u16,
        f: impl FnOnce(&mut vello_cpu::RenderContext) -> PenReplayResult<R>,
    ) -> PenReplayResult<R> {
        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == width && ctx.height() == height => ctx,
            _ => vello_cpu::RenderContext::new(width, height),
        };
        ctx.reset();
        let out = f(&mut ctx)?;
        self.ctx = Some(ctx);
        Ok(out)
    }
}

impl RenderBackend for CpuBackend {
    fn render_plan(&mut self, plan: &FramePlan) -> PenReplayResult<FrameRGBA> {
        let w = raster_dim(plan.width, "width")?;
        let h = raster_dim(plan.height, "height")?;

        let data = self.with_ctx_mut(w, h, |ctx| {
            ctx.set_transform(Affine::IDENTITY);
            draw_background(ctx, plan);
            for op in &plan.ops {
                draw_segment(ctx, op, plan.background.color);
            }
            if let Some(cursor) = &plan.cursor {
                draw_cursor(ctx, cursor);
            }

            ctx.flush();
            let mut pixmap = vello_cpu::Pixmap::new(w, h);
            ctx.render_to_pixmap(&mut pixmap);
            Ok(pixmap.data_as_u8_slice().to_vec())
        })?;

        Ok(FrameRGBA {
            width: plan.width,
            height: plan.height,
            data,
            premultiplied: true,
        })
    }
}

fn raster_dim(v: u32, what: &str) -> PenReplayResult<u16> {
    match u16::try_from(v) {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(PenReplayError::validation(format!(
            "frame {what} {v} is outside the raster range 1..=65535"
        ))),
    }
}

fn color(c: [u8; 4]) -> Color {
    Color::from_rgba8(c[0], c[1], c[2], c[3])
}

fn opaque(c: Rgb8) -> Color {
    color(c.to_rgba())
}

fn cpu_point(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn shape_to_cpu(shape: &impl Shape) -> BezPath {
    let mut out = BezPath::new();
    for el in shape.path_elements(0.1) {
        match el {
            kurbo::PathEl::MoveTo(p) => out.move_to(cpu_point(p)),
            kurbo::PathEl::LineTo(p) => out.line_to(cpu_point(p)),
            kurbo::PathEl::QuadTo(p1, p2) => out.quad_to(cpu_point(p1), cpu_point(p2)),
            kurbo::PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(cpu_point(p1), cpu_point(p2), cpu_point(p3))
            }
            kurbo::PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

fn round_stroke(width: f64) -> Stroke {
    Stroke::new(width)
        .with_caps(Cap::Round)
        .with_join(Join::Round)
}

fn draw_background(ctx: &mut vello_cpu::RenderContext, plan: &FramePlan) {
    let (w, h) = (f64::from(plan.width), f64::from(plan.height));
    ctx.set_paint(opaque(plan.background.color));
    ctx.fill_rect(&Rect::new(0.0, 0.0, w, h));
    draw_pattern(ctx, &plan.background, plan.scale, w, h);
}

fn draw_pattern(
    ctx: &mut vello_cpu::RenderContext,
    bg: &Background,
    scale: f64,
    w: f64,
    h: f64,
) {
    let line_width = (PATTERN_LINE_WIDTH * scale).max(1.0);
    match bg.pattern {
        Pattern::Plain => {}
        Pattern::Ruled => {
            ctx.set_paint(color(PATTERN_COLOR));
            ctx.set_stroke(Stroke::new(line_width));
            for y in grid_lines(RULED_TOP * scale, RULED_SPACING * scale, h) {
                ctx.stroke_path(&line(Point::new(0.0, y), Point::new(w, y)));
            }
            let x = RULED_MARGIN_X * scale;
            if x < w {
                ctx.set_paint(color(MARGIN_COLOR));
                ctx.stroke_path(&line(Point::new(x, 0.0), Point::new(x, h)));
            }
        }
        Pattern::Graph => {
            let step = GRID_SPACING * scale;
            ctx.set_paint(color(PATTERN_COLOR));
            ctx.set_stroke(Stroke::new(line_width));
            for y in grid_lines(step, step, h) {
                ctx.stroke_path(&line(Point::new(0.0, y), Point::new(w, y)));
            }
            for x in grid_lines(step, step, w) {
                ctx.stroke_path(&line(Point::new(x, 0.0), Point::new(x, h)));
            }
        }
        Pattern::Dotted => {
            let step = GRID_SPACING * scale;
            let r = (DOT_RADIUS * scale).max(0.5);
            ctx.set_paint(color(PATTERN_COLOR));
            for y in grid_lines(step, step, h) {
                for x in grid_lines(step, step, w) {
                    ctx.fill_path(&shape_to_cpu(&kurbo::Circle::new((x, y), r)));
                }
            }
        }
    }
}

/// Offsets `first, first + step, ...` strictly below `limit`.
fn grid_lines(first: f64, step: f64, limit: f64) -> impl Iterator<Item = f64> {
    let step = if step.is_finite() && step > 0.0 { step } else { limit.max(1.0) };
    (0u32..)
        .map(move |i| first + f64::from(i) * step)
        .take_while(move |v| *v < limit)
}

fn line(from: Point, to: Point) -> BezPath {
    let mut p = BezPath::new();
    p.move_to(cpu_point(from));
    p.line_to(cpu_point(to));
    p
}

fn draw_segment(ctx: &mut vello_cpu::RenderContext, op: &DrawOp, background: Rgb8) {
    let paint = match op.mode {
        DrawMode::Ink(c) => opaque(c),
        DrawMode::Erase => opaque(background),
    };
    ctx.set_paint(paint);
    if op.from == op.to {
        // A zero-length segment still leaves a round dab.
        let dab = kurbo::Circle::new(op.from, op.width / 2.0);
        ctx.fill_path(&shape_to_cpu(&dab));
        return;
    }
    ctx.set_stroke(round_stroke(op.width));
    ctx.stroke_path(&line(op.from, op.to));
}

fn draw_cursor(ctx: &mut vello_cpu::RenderContext, cursor: &CursorPlan) {
    let size = if cursor.size.is_finite() && cursor.size > 0.0 {
        cursor.size
    } else {
        1.0
    };
    match cursor.kind {
        CursorKind::Pen => {
            let r = PEN_RADIUS * size;
            ctx.set_paint(color([255, 255, 255, 230]));
            ctx.fill_path(&shape_to_cpu(&kurbo::Circle::new(cursor.pos, r + PEN_RING * size)));
            ctx.set_paint(color([40, 40, 40, 230]));
            ctx.fill_path(&shape_to_cpu(&kurbo::Circle::new(cursor.pos, r)));
        }
        CursorKind::Eraser => {
            let half = ERASER_SIDE * size / 2.0;
            let rect = kurbo::Rect::new(
                cursor.pos.x - half,
                cursor.pos.y - half,
                cursor.pos.x + half,
                cursor.pos.y + half,
            );
            ctx.set_paint(color([255, 255, 255, 200]));
            ctx.fill_path(&shape_to_cpu(&rect));
            ctx.set_paint(color([80, 80, 80, 255]));
            ctx.set_stroke(Stroke::new(1.5 * size).with_join(Join::Miter));
            ctx.stroke_path(&shape_to_cpu(&rect));
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
