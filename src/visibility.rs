//! What has been drawn by a given instant of the replay clock.

use crate::document::normalize::{Document, MotionPoint, Stroke};
use crate::foundation::core::Point;
use crate::timeline::builder::Timeline;

/// A stroke with the prefix of its samples that has "occurred".
#[derive(Clone, Copy, Debug)]
pub struct VisibleStroke<'a> {
    /// Index into [`Timeline::entries`].
    pub entry: usize,
    pub stroke: &'a Stroke,
    /// Stored-order prefix, always at least two samples long.
    pub points: &'a [MotionPoint],
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CursorKind {
    Pen,
    Eraser,
}

/// Where the tool is at the resolved instant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CursorState {
    pub pos: Point,
    pub kind: CursorKind,
}

/// Everything visible on screen at one instant.
#[derive(Clone, Debug)]
pub struct FrameView<'a> {
    pub time_ms: f64,
    /// Index into [`Document::pages`].
    pub page: usize,
    pub strokes: Vec<VisibleStroke<'a>>,
    pub cursor: Option<CursorState>,
}

/// Resolve the active page and every stroke's visible prefix at `t_ms`.
///
/// The page comes from the first timeline entry containing `t_ms`, falling back to the first
/// page. Only strokes on that page contribute. Returns `None` for a document without pages.
pub fn resolve_frame<'a>(
    doc: &'a Document,
    timeline: &Timeline,
    t_ms: f64,
) -> Option<FrameView<'a>> {
    if doc.pages.is_empty() {
        return None;
    }

    let active = timeline.active_entry_at(t_ms);
    let page = active.map(|i| timeline.entries()[i].page).unwrap_or(0);

    let mut strokes = Vec::new();
    let mut cursor = None;
    for (idx, entry) in timeline.entries().iter().enumerate() {
        if entry.page != page || entry.start_ms > t_ms {
            continue;
        }
        let Some(stroke) = entry.resolve(doc) else {
            continue;
        };
        let relative = (t_ms - entry.start_ms).max(0.0);
        let points = visible_prefix(&stroke.points, relative);

        if active == Some(idx)
            && let Some(last) = points.last()
        {
            cursor = Some(CursorState {
                pos: last.pos,
                kind: if stroke.is_eraser_stroke() {
                    CursorKind::Eraser
                } else {
                    CursorKind::Pen
                },
            });
        }

        if points.len() >= 2 {
            strokes.push(VisibleStroke {
                entry: idx,
                stroke,
                points,
            });
        }
    }

    Some(FrameView {
        time_ms: t_ms,
        page,
        strokes,
        cursor,
    })
}

/// Samples up to (not including) the first one stamped after `relative_ms`, in stored order.
pub fn visible_prefix(points: &[MotionPoint], relative_ms: f64) -> &[MotionPoint] {
    let n = points
        .iter()
        .position(|p| p.t_ms as f64 > relative_ms)
        .unwrap_or(points.len());
    &points[..n]
}
