//! penreplay reconstructs a recorded handwriting session as a replay.
//!
//! Pen-stroke motion samples are laid on a gap-free timeline, sampled at a fixed frame rate and
//! rendered as progressively accumulating ink. A procedural tap/scratch track can be synthesized
//! alongside, and the system `ffmpeg` can encode both into a video.
//!
//! - Load a [`Document`] from `motion_metadata.json`
//! - Create a [`RenderJob`] with [`RenderOpts`]
//! - Render single frames, stream frames into a [`FrameSink`], or [`RenderJob::run`] everything
#![forbid(unsafe_code)]

mod foundation;

pub mod audio;
pub mod composite;
pub mod document;
pub mod encode;
pub mod render;
pub mod timeline;
pub mod visibility;

pub use crate::foundation::core::{Canvas, Fps, FrameIndex, Point, Rgb8};
pub use crate::foundation::error::{PenReplayError, PenReplayResult};

pub use crate::audio::clip::{AudioClip, SoundBank};
pub use crate::audio::mix::{AudioBuffer, MIX_SAMPLE_RATE};
pub use crate::composite::{CompositeOpts, DrawMode, DrawOp};
pub use crate::document::model::DocumentDef;
pub use crate::document::normalize::{
    Background, Document, MotionPoint, NormalizeReport, Page, Pattern, Stroke, Tool,
};
pub use crate::encode::ffmpeg::{EncodeRequest, Quality, encode_sequence, is_ffmpeg_on_path};
pub use crate::encode::sink::{FrameSink, InMemorySink, PngSequenceSink, SinkConfig};
pub use crate::render::backend::{FramePlan, FrameRGBA, RenderBackend};
pub use crate::render::cpu::CpuBackend;
pub use crate::render::pipeline::{
    RenderJob, RenderOpts, RenderStats, RenderSummary, RenderThreading, VideoOpts,
};
pub use crate::timeline::builder::{Timeline, TimelineEntry};
pub use crate::timeline::sampler::{FrameSchedule, FrameSample};
pub use crate::visibility::{CursorKind, FrameView, resolve_frame};
