use crate::composite::DrawOp;
use crate::document::normalize::Background;
use crate::foundation::core::Point;
use crate::foundation::error::PenReplayResult;
use crate::visibility::CursorKind;

/// A rendered frame as RGBA8 pixels.
///
/// Frames are **premultiplied alpha**; the `premultiplied` flag makes this explicit at API
/// boundaries.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether the `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Premultiplied RGBA of the pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y * self.width + x) * 4) as usize;
        self.data.get(i..i + 4).map(|p| [p[0], p[1], p[2], p[3]])
    }
}

/// Tool glyph drawn on top of the ink.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CursorPlan {
    /// Position in output pixels.
    pub pos: Point,
    pub kind: CursorKind,
    /// Glyph size multiplier.
    pub size: f64,
}

/// Everything a backend needs to rasterize one frame, already in pixel space.
#[derive(Clone, Debug, PartialEq)]
pub struct FramePlan {
    pub width: u32,
    pub height: u32,
    /// Page units to pixels, used for background patterns.
    pub scale: f64,
    pub background: Background,
    /// Segments in paint order.
    pub ops: Vec<DrawOp>,
    pub cursor: Option<CursorPlan>,
}

/// A renderer that rasterizes a [`FramePlan`] into a [`FrameRGBA`].
///
/// Most users do not call [`RenderBackend::render_plan`] directly; prefer
/// [`crate::RenderJob::render_frame`], which resolves visibility and compositing first.
pub trait RenderBackend {
    /// Rasterize `plan` and read back the final frame.
    fn render_plan(&mut self, plan: &FramePlan) -> PenReplayResult<FrameRGBA>;
}
