use std::path::PathBuf;

use rayon::prelude::*;

use crate::audio::clip::SoundBank;
use crate::audio::mix::{AudioBuffer, MIX_SAMPLE_RATE, write_f32le};
use crate::audio::synth::synthesize;
use crate::composite::{CompositeOpts, DEFAULT_MIN_WIDTH, segment_ops};
use crate::document::normalize::Document;
use crate::encode::ffmpeg::{
    EncodeRequest, Quality, cleanup_frames, encode_sequence, is_ffmpeg_on_path,
};
use crate::encode::sink::{FrameSink, PngSequenceSink, SinkConfig};
use crate::foundation::core::{Canvas, Fps, FrameIndex, Point};
use crate::foundation::error::{PenReplayError, PenReplayResult};
use crate::render::backend::{CursorPlan, FramePlan, FrameRGBA, RenderBackend};
use crate::render::cpu::CpuBackend;
use crate::timeline::builder::Timeline;
use crate::timeline::sampler::FrameSchedule;
use crate::visibility::resolve_frame;

/// File name of the synthesized track inside the frames directory.
pub const AUDIO_FILE_NAME: &str = "audio.f32le";

#[derive(Clone, Debug)]
/// Threading and chunking controls for multi-frame rendering.
pub struct RenderThreading {
    /// Enable parallel rendering when `true`.
    pub parallel: bool,
    /// Chunk size in frames for batched scheduling.
    pub chunk_size: usize,
    /// Optional explicit worker thread count.
    pub threads: Option<usize>,
}

impl Default for RenderThreading {
    fn default() -> Self {
        Self {
            parallel: false,
            chunk_size: 64,
            threads: None,
        }
    }
}

/// Video output settings for [`RenderJob::run`].
#[derive(Clone, Debug)]
pub struct VideoOpts {
    pub out_path: PathBuf,
    pub quality: Quality,
    /// Delete the PNG sequence and audio track after a successful encode.
    pub cleanup_frames: bool,
    pub overwrite: bool,
}

impl VideoOpts {
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            quality: Quality::default(),
            cleanup_frames: false,
            overwrite: true,
        }
    }
}

/// Everything a replay job can be configured with.
#[derive(Clone, Debug)]
pub struct RenderOpts {
    /// Replaces the recording's frame rate.
    pub fps_override: Option<f64>,
    /// Where the PNG sequence (and audio track) is written.
    pub frames_dir: PathBuf,
    pub video: Option<VideoOpts>,
    pub show_cursor: bool,
    /// Page units to pixels.
    pub scale: f64,
    pub cursor_scale: f64,
    /// Width floor in page units.
    pub min_width: f64,
    pub tap_sample: Option<PathBuf>,
    pub scratch_sample: Option<PathBuf>,
    pub threading: RenderThreading,
}

impl Default for RenderOpts {
    fn default() -> Self {
        Self {
            fps_override: None,
            frames_dir: PathBuf::from("frames"),
            video: None,
            show_cursor: false,
            scale: 1.0,
            cursor_scale: 1.0,
            min_width: DEFAULT_MIN_WIDTH,
            tap_sample: None,
            scratch_sample: None,
            threading: RenderThreading::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// Aggregated rendering counters.
pub struct RenderStats {
    /// Total scheduled frames.
    pub frames_total: u64,
    /// Frames that were rendered and handed to the sink.
    pub frames_rendered: u64,
}

/// What [`RenderJob::run`] produced.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderSummary {
    pub stats: RenderStats,
    pub frames_dir: PathBuf,
    /// Raw mono `f32le` track, unless no samples were configured or it was cleaned up.
    pub audio_path: Option<PathBuf>,
    /// Encoded video, when requested and `ffmpeg` was available.
    pub video_path: Option<PathBuf>,
}

/// A replay of one document: its timeline, frame schedule and output settings.
///
/// The timeline is built once in [`RenderJob::new`] and only read afterwards, so frames can be
/// rendered in any order and on any thread.
#[derive(Debug)]
pub struct RenderJob<'a> {
    doc: &'a Document,
    opts: RenderOpts,
    fps: Fps,
    timeline: Timeline,
    schedule: FrameSchedule,
    canvas: Canvas,
    composite: CompositeOpts,
}

impl<'a> RenderJob<'a> {
    /// Validate `opts` and lay out the replay of `doc`.
    ///
    /// Every frame shares one canvas sized to the largest page times `opts.scale`, so a video
    /// keeps a single frame size. Ink on smaller pages keeps its page coordinates from the
    /// top-left corner, while the page background and pattern cover the whole canvas.
    pub fn new(doc: &'a Document, opts: RenderOpts) -> PenReplayResult<Self> {
        let fps = match opts.fps_override {
            Some(rate) => Fps::from_rate(rate)?,
            None => doc.fps,
        };
        if !opts.min_width.is_finite() || opts.min_width < 0.0 {
            return Err(PenReplayError::validation(format!(
                "minimum line width must be a non-negative number, got {}",
                opts.min_width
            )));
        }
        if !opts.cursor_scale.is_finite() || opts.cursor_scale <= 0.0 {
            return Err(PenReplayError::validation(format!(
                "cursor scale must be positive, got {}",
                opts.cursor_scale
            )));
        }

        // One canvas for the whole replay: frames of a video must share a size.
        let (w, h) = doc
            .pages
            .iter()
            .fold(None, |acc: Option<(f64, f64)>, p| match acc {
                None => Some((p.width, p.height)),
                Some((w, h)) => Some((w.max(p.width), h.max(p.height))),
            })
            .ok_or_else(|| PenReplayError::validation("document has no pages to render"))?;
        let canvas = Canvas::for_page(w, h, opts.scale)?;

        let timeline = Timeline::build(doc);
        let total_ms = doc
            .total_duration_ms
            .filter(|d| d.is_finite() && *d >= 0.0)
            .unwrap_or_else(|| timeline.total_duration_ms());
        let schedule = FrameSchedule::new(total_ms, fps);

        tracing::debug!(
            entries = timeline.entries().len(),
            total_ms,
            frames = schedule.len(),
            width = canvas.width,
            height = canvas.height,
            "render job prepared"
        );

        let composite = CompositeOpts {
            scale: opts.scale,
            min_width: opts.min_width,
        };
        Ok(Self {
            doc,
            opts,
            fps,
            timeline,
            schedule,
            canvas,
            composite,
        })
    }

    pub fn fps(&self) -> Fps {
        self.fps
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn schedule(&self) -> &FrameSchedule {
        &self.schedule
    }

    /// Resolve frame `k` into backend-ready draw operations.
    pub fn plan_frame(&self, k: u64) -> PenReplayResult<FramePlan> {
        let sample = self.schedule.sample(k).ok_or_else(|| {
            PenReplayError::validation(format!(
                "frame {k} is out of range (0..{})",
                self.schedule.len()
            ))
        })?;
        let view = resolve_frame(self.doc, &self.timeline, sample.time_ms)
            .ok_or_else(|| PenReplayError::validation("document has no pages to render"))?;
        let page = self.doc.pages.get(view.page).ok_or_else(|| {
            PenReplayError::validation(format!("page {} does not exist", view.page))
        })?;

        let scale = self.composite.scale;
        let cursor = if self.opts.show_cursor {
            view.cursor.map(|c| CursorPlan {
                pos: Point::new(c.pos.x * scale, c.pos.y * scale),
                kind: c.kind,
                size: self.opts.cursor_scale,
            })
        } else {
            None
        };

        Ok(FramePlan {
            width: self.canvas.width,
            height: self.canvas.height,
            scale,
            background: page.background,
            ops: segment_ops(&view, &self.composite),
            cursor,
        })
    }

    /// Render frame `k` with a fresh CPU backend.
    pub fn render_frame(&self, k: u64) -> PenReplayResult<FrameRGBA> {
        self.render_frame_with(k, &mut CpuBackend::new())
    }

    pub fn render_frame_with(
        &self,
        k: u64,
        backend: &mut dyn RenderBackend,
    ) -> PenReplayResult<FrameRGBA> {
        let plan = self.plan_frame(k)?;
        backend.render_plan(&plan)
    }

    /// Render every scheduled frame into `sink`, in index order.
    ///
    /// In parallel mode frames are rendered in chunks, one backend per worker, and pushed once
    /// the whole chunk is done.
    #[tracing::instrument(skip(self, sink), fields(frames = self.schedule.len()))]
    pub fn render_to_sink(&self, sink: &mut dyn FrameSink) -> PenReplayResult<RenderStats> {
        let background = self
            .doc
            .pages
            .first()
            .map(|p| p.background.color)
            .unwrap_or_default();
        sink.begin(SinkConfig {
            width: self.canvas.width,
            height: self.canvas.height,
            fps: self.fps,
            background,
        })?;

        let len = self.schedule.len();
        let mut stats = RenderStats {
            frames_total: len,
            frames_rendered: 0,
        };

        if !self.opts.threading.parallel {
            let mut backend = CpuBackend::new();
            for k in 0..len {
                let frame = self.render_frame_with(k, &mut backend)?;
                sink.push_frame(FrameIndex(k), &frame)?;
                stats.frames_rendered += 1;
            }
            sink.end()?;
            return Ok(stats);
        }

        let pool = build_thread_pool(self.opts.threading.threads)?;
        let chunk_size = normalized_chunk_size(self.opts.threading.chunk_size);
        let mut chunk_start = 0;
        while chunk_start < len {
            let chunk_end = (chunk_start + chunk_size).min(len);
            let rendered = pool.install(|| {
                (chunk_start..chunk_end)
                    .into_par_iter()
                    .map_init(CpuBackend::new, |backend, k| {
                        self.render_frame_with(k, backend)
                    })
                    .collect::<Vec<_>>()
            });
            for (k, frame) in (chunk_start..chunk_end).zip(rendered) {
                sink.push_frame(FrameIndex(k), &frame?)?;
                stats.frames_rendered += 1;
            }
            tracing::debug!(chunk_start, chunk_end, "chunk rendered");
            chunk_start = chunk_end;
        }

        sink.end()?;
        Ok(stats)
    }

    /// Synthesize the pen track for this replay from `bank`.
    pub fn synthesize_audio(&self, bank: &SoundBank) -> AudioBuffer {
        synthesize(
            self.doc,
            &self.timeline,
            bank,
            self.schedule.total_ms(),
            MIX_SAMPLE_RATE,
        )
    }

    fn wants_audio(&self) -> bool {
        self.opts.tap_sample.is_some() || self.opts.scratch_sample.is_some()
    }

    /// Full job: PNG sequence, audio track and optional video.
    ///
    /// Frames and audio are produced concurrently. A missing `ffmpeg` skips the video with a
    /// warning and keeps the frames.
    #[tracing::instrument(skip(self), fields(frames_dir = %self.opts.frames_dir.display()))]
    pub fn run(&self) -> PenReplayResult<RenderSummary> {
        let frames_dir = self.opts.frames_dir.clone();
        let mut sink = PngSequenceSink::new(&frames_dir)?;

        let (frames, audio) = rayon::join(
            || self.render_to_sink(&mut sink),
            || {
                self.wants_audio().then(|| {
                    let bank = SoundBank::load(
                        self.opts.tap_sample.as_deref(),
                        self.opts.scratch_sample.as_deref(),
                        MIX_SAMPLE_RATE,
                    );
                    self.synthesize_audio(&bank)
                })
            },
        );
        let stats = frames?;

        let mut audio_path = match audio {
            Some(buf) => {
                let path = frames_dir.join(AUDIO_FILE_NAME);
                write_f32le(&buf.samples, &path)?;
                tracing::debug!(path = %path.display(), ms = buf.duration_ms(), "audio written");
                Some(path)
            }
            None => None,
        };

        let mut video_path = None;
        if let Some(video) = &self.opts.video {
            if is_ffmpeg_on_path() {
                encode_sequence(&EncodeRequest {
                    frames_dir: frames_dir.clone(),
                    fps: self.fps,
                    audio: audio_path.clone(),
                    out_path: video.out_path.clone(),
                    quality: video.quality,
                    overwrite: video.overwrite,
                })?;
                video_path = Some(video.out_path.clone());

                if video.cleanup_frames {
                    let mut paths = sink.written().to_vec();
                    paths.extend(audio_path.take());
                    let removed = cleanup_frames(&paths);
                    tracing::debug!(removed, "intermediates removed");
                }
            } else {
                tracing::warn!(
                    out = %video.out_path.display(),
                    "ffmpeg not found on PATH; skipping video, frames are kept"
                );
            }
        }

        tracing::info!(
            frames = stats.frames_rendered,
            audio = audio_path.is_some(),
            video = video_path.is_some(),
            "replay finished"
        );
        Ok(RenderSummary {
            stats,
            frames_dir,
            audio_path,
            video_path,
        })
    }
}

fn build_thread_pool(threads: Option<usize>) -> PenReplayResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(PenReplayError::validation(
            "render threading 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| PenReplayError::validation(format!("failed to build rayon thread pool: {e}")))
}

fn normalized_chunk_size(chunk_size: usize) -> u64 {
    chunk_size.max(1) as u64
}

#[cfg(test)]
#[path = "../../tests/unit/render/pipeline.rs"]
mod tests;
