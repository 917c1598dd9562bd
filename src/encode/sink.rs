use std::path::{Path, PathBuf};

use crate::foundation::core::{Fps, FrameIndex, Rgb8};
use crate::foundation::error::{PenReplayError, PenReplayResult};
use crate::foundation::math::flatten_premul_px;
use crate::render::backend::FrameRGBA;

/// File name of frame `idx` inside a sequence directory.
pub fn frame_file_name(idx: FrameIndex) -> String {
    format!("frame_{:06}.png", idx.0)
}

/// `ffmpeg` input pattern matching [`frame_file_name`].
pub const FRAME_PATTERN: &str = "frame_%06d.png";

/// Configuration provided to a [`FrameSink`] at the start of a render.
#[derive(Debug, Clone)]
pub struct SinkConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Output frames-per-second.
    pub fps: Fps,
    /// Color that transparent pixels are flattened over.
    pub background: Rgb8,
}

/// Sink contract for consuming rendered frames in timeline order.
///
/// Ordering contract: `push_frame` is called in strictly increasing `FrameIndex` order.
pub trait FrameSink: Send {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> PenReplayResult<()>;
    /// Push one frame in strictly increasing timeline order.
    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> PenReplayResult<()>;
    /// Called once after the last frame is pushed.
    fn end(&mut self) -> PenReplayResult<()>;
}

/// Flatten `frame` to opaque RGB8 and write it as a PNG.
pub fn save_frame_png(frame: &FrameRGBA, background: Rgb8, path: &Path) -> PenReplayResult<()> {
    let expected = frame.width as usize * frame.height as usize * 4;
    if frame.data.len() != expected {
        return Err(PenReplayError::validation(
            "frame.data size mismatch with width*height*4",
        ));
    }
    let bg = [background.r, background.g, background.b];
    let rgb: Vec<u8> = frame
        .data
        .chunks_exact(4)
        .flat_map(|px| {
            let px = [px[0], px[1], px[2], px[3]];
            if frame.premultiplied {
                flatten_premul_px(px, bg)
            } else {
                [px[0], px[1], px[2]]
            }
        })
        .collect();

    image::save_buffer_with_format(
        path,
        &rgb,
        frame.width,
        frame.height,
        image::ColorType::Rgb8,
        image::ImageFormat::Png,
    )
    .map_err(|e| {
        PenReplayError::encode(format!("failed to write frame '{}': {e}", path.display()))
    })
}

/// Writes every frame as `frame_NNNNNN.png` into one directory.
#[derive(Debug)]
pub struct PngSequenceSink {
    dir: PathBuf,
    cfg: Option<SinkConfig>,
    last_idx: Option<FrameIndex>,
    written: Vec<PathBuf>,
}

impl PngSequenceSink {
    /// Create the output directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> PenReplayResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| {
            PenReplayError::encode(format!(
                "failed to create frames directory '{}': {e}",
                dir.display()
            ))
        })?;
        Ok(Self {
            dir,
            cfg: None,
            last_idx: None,
            written: Vec::new(),
        })
    }

    /// Paths of the frames written so far, in index order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

fn is_frame_file_name(name: &str) -> bool {
    name.strip_prefix("frame_")
        .and_then(|rest| rest.strip_suffix(".png"))
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

/// Remove every `frame_NNNNNN.png` in `dir`; other files are left alone.
fn clear_frame_files(dir: &Path) -> PenReplayResult<usize> {
    let read_err = |e: std::io::Error| {
        PenReplayError::encode(format!(
            "failed to list frames directory '{}': {e}",
            dir.display()
        ))
    };
    let mut removed = 0;
    for entry in std::fs::read_dir(dir).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        let is_frame = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(is_frame_file_name);
        if !is_frame || !path.is_file() {
            continue;
        }
        std::fs::remove_file(&path).map_err(|e| {
            PenReplayError::encode(format!(
                "failed to remove stale frame '{}': {e}",
                path.display()
            ))
        })?;
        removed += 1;
    }
    Ok(removed)
}

impl FrameSink for PngSequenceSink {
    fn begin(&mut self, cfg: SinkConfig) -> PenReplayResult<()> {
        if cfg.width == 0 || cfg.height == 0 {
            return Err(PenReplayError::validation(
                "png sink width/height must be non-zero",
            ));
        }
        // The directory holds exactly this run's sequence.
        let stale = clear_frame_files(&self.dir)?;
        if stale > 0 {
            tracing::debug!(stale, dir = %self.dir.display(), "removed frames of an earlier run");
        }
        self.cfg = Some(cfg);
        self.last_idx = None;
        self.written.clear();
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> PenReplayResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| PenReplayError::encode("png sink not started"))?;
        if let Some(last) = self.last_idx
            && idx.0 <= last.0
        {
            return Err(PenReplayError::encode(
                "png sink received out-of-order frame index",
            ));
        }
        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(PenReplayError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        self.last_idx = Some(idx);

        let path = self.dir.join(frame_file_name(idx));
        save_frame_png(frame, cfg.background, &path)?;
        self.written.push(path);
        Ok(())
    }

    fn end(&mut self) -> PenReplayResult<()> {
        tracing::debug!(frames = self.written.len(), dir = %self.dir.display(), "frame sequence written");
        self.cfg = None;
        Ok(())
    }
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(FrameIndex, FrameRGBA)>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the sink configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg.clone()
    }

    /// Borrow the captured frames.
    pub fn frames(&self) -> &[(FrameIndex, FrameRGBA)] {
        &self.frames
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> PenReplayResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> PenReplayResult<()> {
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> PenReplayResult<()> {
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
