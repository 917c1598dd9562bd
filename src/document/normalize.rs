//! Stroke normalizer: boundary records in, trusted replay model out.

use std::path::Path;

use crate::document::model::{
    BackgroundDef, ColorDef, DocumentDef, MotionPointDef, PageDef, StrokeDef,
};
use crate::foundation::core::{Fps, Point, Rgb8};
use crate::foundation::error::{PenReplayError, PenReplayResult};

const DEFAULT_STROKE_WIDTH: f64 = 2.0;
// A4 in points, the recorder's default page.
const DEFAULT_PAGE_WIDTH: f64 = 595.0;
const DEFAULT_PAGE_HEIGHT: f64 = 842.0;

/// Tool that produced a stroke.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tool {
    Pen,
    Highlighter,
    Eraser,
    Other,
}

impl Tool {
    fn parse(name: Option<&str>) -> Self {
        match name.map(str::trim) {
            None | Some("pen") => Self::Pen,
            Some("highlighter") => Self::Highlighter,
            Some("eraser") => Self::Eraser,
            Some(_) => Self::Other,
        }
    }
}

/// Decorative page pattern drawn under the ink.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Pattern {
    #[default]
    Plain,
    Dotted,
    Graph,
    Ruled,
}

impl Pattern {
    fn parse(name: Option<&str>) -> Self {
        match name.map(str::trim) {
            Some("dotted" | "isodotted") => Self::Dotted,
            Some("graph" | "isograph") => Self::Graph,
            Some("ruled" | "lined") => Self::Ruled,
            _ => Self::Plain,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Background {
    pub color: Rgb8,
    pub pattern: Pattern,
}

impl Default for Background {
    fn default() -> Self {
        Self {
            color: Rgb8::WHITE,
            pattern: Pattern::Plain,
        }
    }
}

/// One timestamped pen observation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionPoint {
    pub pos: Point,
    /// Milliseconds since the stroke's earliest sample.
    pub t_ms: u64,
    /// Normalized pressure in `[0, 1]`; `None` when the device reported none.
    pub pressure: Option<f64>,
    pub is_eraser: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Stroke {
    pub tool: Tool,
    pub color: Rgb8,
    /// Base line width in page units.
    pub width: f64,
    /// Samples in recorded order, which is not guaranteed to be timestamp order.
    pub points: Vec<MotionPoint>,
}

impl Stroke {
    /// Whether any part of this stroke erases.
    pub fn is_eraser_stroke(&self) -> bool {
        self.tool == Tool::Eraser || self.points.iter().any(|p| p.is_eraser)
    }

    /// Time span of the stroke, `max t - min t`, robust to unsorted samples.
    ///
    /// `None` when the stroke has fewer than two samples.
    pub fn duration_ms(&self) -> Option<u64> {
        if self.points.len() < 2 {
            return None;
        }
        let (lo, hi) = self
            .points
            .iter()
            .fold((u64::MAX, 0u64), |(lo, hi), p| (lo.min(p.t_ms), hi.max(p.t_ms)));
        Some(hi - lo)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Page {
    pub index: usize,
    pub width: f64,
    pub height: f64,
    pub background: Background,
    pub strokes: Vec<Stroke>,
}

/// Trusted recording: every stroke here has well-formed samples.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub fps: Fps,
    /// Authoritative replay duration from the exporter, if present.
    pub total_duration_ms: Option<f64>,
    /// Point count reported by the exporter (or counted, when absent).
    pub total_motion_points: u64,
    pub pages: Vec<Page>,
}

/// Counters describing what normalization kept and dropped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    pub strokes_total: usize,
    pub strokes_skipped: usize,
    pub points_total: usize,
}

impl Document {
    /// Read, parse and normalize a recording file.
    #[tracing::instrument]
    pub fn load(path: &Path) -> PenReplayResult<(Self, NormalizeReport)> {
        let def = DocumentDef::from_path(path)?;
        Self::from_def(def)
    }

    /// Normalize a parsed boundary document.
    ///
    /// Malformed strokes are dropped with a warning; only a bad header fails.
    pub fn from_def(def: DocumentDef) -> PenReplayResult<(Self, NormalizeReport)> {
        let fps = Fps::from_rate(def.frame_rate)
            .map_err(|e| PenReplayError::document(format!("invalid frameRate: {e}")))?;

        let total_duration_ms = match def.total_duration_ms {
            Some(d) if d.is_finite() && d >= 0.0 => Some(d),
            Some(d) => {
                tracing::warn!(value = d, "ignoring invalid totalDurationMs");
                None
            }
            None => None,
        };

        let mut report = NormalizeReport::default();
        let pages = def
            .pages
            .into_iter()
            .enumerate()
            .map(|(pos, page)| normalize_page(pos, page, &mut report))
            .collect::<Vec<_>>();

        if report.strokes_skipped > 0 {
            tracing::warn!(
                skipped = report.strokes_skipped,
                total = report.strokes_total,
                "skipped malformed strokes"
            );
        }

        let total_motion_points = def
            .total_motion_points
            .unwrap_or(report.points_total as u64);

        Ok((
            Self {
                fps,
                total_duration_ms,
                total_motion_points,
                pages,
            },
            report,
        ))
    }

    /// Whether any sample carries real pressure data.
    pub fn has_pressure(&self) -> bool {
        self.strokes()
            .any(|s| s.points.iter().any(|p| p.pressure.is_some()))
    }

    /// All strokes in page order.
    pub fn strokes(&self) -> impl Iterator<Item = &Stroke> {
        self.pages.iter().flat_map(|p| p.strokes.iter())
    }
}

fn normalize_page(pos: usize, def: PageDef, report: &mut NormalizeReport) -> Page {
    let index = def
        .page_index
        .and_then(|i| usize::try_from(i).ok())
        .unwrap_or(pos);
    let width = positive_or(def.width, DEFAULT_PAGE_WIDTH);
    let height = positive_or(def.height, DEFAULT_PAGE_HEIGHT);
    let background = def.background.map(normalize_background).unwrap_or_default();

    let mut strokes = Vec::with_capacity(def.strokes.len());
    for (stroke_pos, stroke) in def.strokes.into_iter().enumerate() {
        report.strokes_total += 1;
        match normalize_stroke(stroke) {
            Ok(s) => {
                report.points_total += s.points.len();
                strokes.push(s);
            }
            Err(reason) => {
                report.strokes_skipped += 1;
                tracing::warn!(page = index, stroke = stroke_pos, reason, "skipping stroke");
            }
        }
    }

    Page {
        index,
        width,
        height,
        background,
        strokes,
    }
}

fn normalize_background(def: BackgroundDef) -> Background {
    Background {
        color: def.color.map(|c| color(c, Rgb8::WHITE)).unwrap_or(Rgb8::WHITE),
        pattern: Pattern::parse(def.kind.as_deref()),
    }
}

fn normalize_stroke(def: StrokeDef) -> Result<Stroke, &'static str> {
    let mut raw = Vec::with_capacity(def.motion_points.len());
    for p in &def.motion_points {
        raw.push(raw_point(p)?);
    }

    let t0 = raw.iter().map(|(_, t, _, _)| *t).fold(f64::INFINITY, f64::min);
    let points = raw
        .into_iter()
        .map(|(pos, t, pressure, is_eraser)| MotionPoint {
            pos,
            t_ms: (t - t0).round() as u64,
            pressure,
            is_eraser,
        })
        .collect();

    Ok(Stroke {
        tool: Tool::parse(def.tool.as_deref()),
        color: def.color.map(|c| color(c, Rgb8::BLACK)).unwrap_or(Rgb8::BLACK),
        width: positive_or(def.width, DEFAULT_STROKE_WIDTH),
        points,
    })
}

type RawPoint = (Point, f64, Option<f64>, bool);

fn raw_point(p: &MotionPointDef) -> Result<RawPoint, &'static str> {
    let t = p.t.ok_or("motion point without timestamp")?;
    if !t.is_finite() || t < 0.0 {
        return Err("motion point with unusable timestamp");
    }
    let (x, y) = match (p.x, p.y) {
        (Some(x), Some(y)) if x.is_finite() && y.is_finite() => (x, y),
        _ => return Err("motion point without a finite position"),
    };
    let pressure = p.p.filter(|v| (0.0..=1.0).contains(v));
    Ok((Point::new(x, y), t, pressure, p.is_eraser.unwrap_or(false)))
}

fn color(def: ColorDef, fallback: Rgb8) -> Rgb8 {
    let ch = |v: Option<f64>, d: u8| -> u8 {
        v.filter(|v| v.is_finite())
            .map(|v| v.round().clamp(0.0, 255.0) as u8)
            .unwrap_or(d)
    };
    Rgb8::new(
        ch(def.r, fallback.r),
        ch(def.g, fallback.g),
        ch(def.b, fallback.b),
    )
}

fn positive_or(v: Option<f64>, default: f64) -> f64 {
    v.filter(|v| v.is_finite() && *v > 0.0).unwrap_or(default)
}

#[cfg(test)]
#[path = "../../tests/unit/document/normalize.rs"]
mod tests;
