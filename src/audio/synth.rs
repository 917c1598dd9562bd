//! Procedural pen audio: short strokes tap, long strokes scratch.
//!
//! A scratch is the scratch clip looped to the stroke's length with a gain envelope computed
//! every [`CHUNK_MS`] from how fast and how hard the pen moved in that chunk. Every stroke is
//! rendered independently and overlaid onto one master buffer at its timeline slot.

use std::sync::Arc;

use rayon::prelude::*;

use crate::audio::clip::{AudioClip, SoundBank};
use crate::audio::mix::{AudioBuffer, clamp_in_place, ms_to_samples, overlay};
use crate::composite::resolve_pressure;
use crate::document::normalize::{Document, MotionPoint};
use crate::foundation::core::Point;
use crate::timeline::builder::{Timeline, TimelineEntry};

/// Strokes shorter than this sound as a single tap.
pub const TAP_THRESHOLD_MS: f64 = 300.0;
/// Envelope resolution.
pub const CHUNK_MS: f64 = 10.0;
/// Below this speed (units/ms) a chunk is silent.
pub const SPEED_FLOOR: f64 = 0.02;
/// Speed (units/ms) at which the scratch reaches full level.
pub const REFERENCE_SPEED: f64 = 0.5;
pub const SILENCE_DB: f64 = -100.0;
pub const MAX_FADE_MS: f64 = 50.0;
/// Silence appended after the last stroke.
pub const TRAILING_PADDING_MS: f64 = 500.0;
const NO_POINTS_PRESSURE: f64 = 0.5;

/// Gain of one envelope chunk, relative to the start of its stroke.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnvelopeChunk {
    pub start_offset_ms: f64,
    pub duration_ms: f64,
    pub gain_db: f64,
}

/// Scan position carried from one chunk to the next.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ChunkCursor {
    /// First time-sorted sample not yet consumed.
    pub next: usize,
    /// Last pen position seen, carried across empty chunks.
    pub last_pos: Option<Point>,
}

/// How one timeline entry sounds.
#[derive(Clone, Debug, PartialEq)]
pub enum StrokeSound {
    Silent,
    Tap,
    Scratch(Vec<EnvelopeChunk>),
}

/// Map chunk speed and pressure to a gain that never exceeds 0 dB.
pub fn gain_db(speed: f64, avg_pressure: f64) -> f64 {
    if !speed.is_finite() || speed < SPEED_FLOOR {
        return SILENCE_DB;
    }
    let speed_factor = (speed / REFERENCE_SPEED).clamp(0.0, 1.0);
    let pressure_factor = 0.2 + 0.8 * avg_pressure.clamp(0.0, 1.0);
    let level = speed_factor * pressure_factor;
    if level <= 0.0 {
        return SILENCE_DB;
    }
    (20.0 * level.log10()).clamp(SILENCE_DB, 0.0)
}

pub fn db_to_gain(db: f64) -> f32 {
    10f64.powf(db / 20.0) as f32
}

/// Envelope of one chunk `[start, start + len)` over time-sorted `points`.
///
/// Pure in its inputs: the cursor returned here is the only state the next chunk needs. The
/// final chunk also takes samples stamped exactly at its end.
pub fn chunk_envelope(
    points: &[MotionPoint],
    cursor: ChunkCursor,
    start_ms: f64,
    len_ms: f64,
    is_last: bool,
) -> (EnvelopeChunk, ChunkCursor) {
    let end_ms = start_ms + len_ms;
    let mut next = cursor.next;
    let mut last_pos = cursor.last_pos;
    let mut distance = 0.0;
    let mut pressure_sum = 0.0;
    let mut count = 0usize;

    while let Some(p) = points.get(next) {
        let t = p.t_ms as f64;
        if t > end_ms || (t == end_ms && !is_last) {
            break;
        }
        if let Some(prev) = last_pos {
            distance += prev.distance(p.pos);
        }
        last_pos = Some(p.pos);
        pressure_sum += resolve_pressure(p);
        count += 1;
        next += 1;
    }

    let avg_pressure = if count == 0 {
        NO_POINTS_PRESSURE
    } else {
        pressure_sum / count as f64
    };
    let speed = if len_ms > 0.0 { distance / len_ms } else { 0.0 };

    (
        EnvelopeChunk {
            start_offset_ms: start_ms,
            duration_ms: len_ms,
            gain_db: gain_db(speed, avg_pressure),
        },
        ChunkCursor { next, last_pos },
    )
}

/// Per-chunk envelope for a stroke lasting `duration_ms`.
pub fn envelope(points: &[MotionPoint], duration_ms: f64) -> Vec<EnvelopeChunk> {
    if duration_ms.is_nan() || duration_ms <= 0.0 {
        return Vec::new();
    }
    let mut sorted = points.to_vec();
    sorted.sort_by_key(|p| p.t_ms);

    let n_chunks = (duration_ms / CHUNK_MS).ceil() as usize;
    let mut chunks = Vec::with_capacity(n_chunks);
    let mut cursor = ChunkCursor::default();
    for i in 0..n_chunks {
        let start = i as f64 * CHUNK_MS;
        let len = CHUNK_MS.min(duration_ms - start);
        let (chunk, next) = chunk_envelope(&sorted, cursor, start, len, i + 1 == n_chunks);
        chunks.push(chunk);
        cursor = next;
    }
    chunks
}

/// Classify an entry by its slot length.
pub fn stroke_sound(entry: &TimelineEntry, points: &[MotionPoint]) -> StrokeSound {
    let duration = entry.duration_ms();
    if duration.is_nan() || duration <= 0.0 {
        StrokeSound::Silent
    } else if duration < TAP_THRESHOLD_MS {
        StrokeSound::Tap
    } else {
        StrokeSound::Scratch(envelope(points, duration))
    }
}

/// Loop `scratch` to exactly `duration_ms`, shape it with `chunks` and fade both ends.
pub fn render_scratch(
    scratch: &AudioClip,
    duration_ms: f64,
    chunks: &[EnvelopeChunk],
) -> Vec<f32> {
    let rate = scratch.sample_rate;
    let len = ms_to_samples(duration_ms, rate);
    let src = scratch.samples.as_slice();
    if src.is_empty() || len == 0 {
        return Vec::new();
    }

    let mut out: Vec<f32> = src.iter().copied().cycle().take(len).collect();

    for c in chunks {
        let a = ms_to_samples(c.start_offset_ms, rate).min(len);
        let b = ms_to_samples(c.start_offset_ms + c.duration_ms, rate).min(len);
        let g = db_to_gain(c.gain_db);
        for s in &mut out[a..b] {
            *s *= g;
        }
    }

    let fade = ms_to_samples(MAX_FADE_MS.min(duration_ms / 4.0), rate).min(len / 2);
    for i in 0..fade {
        let g = i as f32 / fade as f32;
        out[i] *= g;
        out[len - 1 - i] *= g;
    }
    out
}

/// Audio for one entry, positioned on the master buffer.
#[derive(Clone, Debug)]
pub struct SegmentAudio {
    pub start_sample: usize,
    pub samples: Arc<Vec<f32>>,
}

fn segment_audio(
    doc: &Document,
    entry: &TimelineEntry,
    bank: &SoundBank,
    rate: u32,
) -> Option<SegmentAudio> {
    let stroke = entry.resolve(doc)?;
    let start_sample = ms_to_samples(entry.start_ms, rate);
    match stroke_sound(entry, &stroke.points) {
        StrokeSound::Silent => None,
        StrokeSound::Tap => {
            let tap = bank.tap.as_ref()?;
            Some(SegmentAudio {
                start_sample,
                samples: Arc::clone(&tap.samples),
            })
        }
        StrokeSound::Scratch(chunks) => {
            let scratch = bank.scratch.as_ref()?;
            let samples = render_scratch(scratch, entry.duration_ms(), &chunks);
            (!samples.is_empty()).then(|| SegmentAudio {
                start_sample,
                samples: Arc::new(samples),
            })
        }
    }
}

/// Mix one audio track for the whole replay.
///
/// The buffer spans `total_ms` plus [`TRAILING_PADDING_MS`]. Entries are rendered in parallel and
/// overlaid in timeline order, so the result is deterministic.
#[tracing::instrument(skip(doc, timeline, bank))]
pub fn synthesize(
    doc: &Document,
    timeline: &Timeline,
    bank: &SoundBank,
    total_ms: f64,
    sample_rate: u32,
) -> AudioBuffer {
    let bank = SoundBank {
        tap: bank.tap.as_ref().map(|c| c.at_rate(sample_rate)),
        scratch: bank.scratch.as_ref().map(|c| c.at_rate(sample_rate)),
    };
    if bank.tap.is_none() {
        tracing::debug!("no tap sample, short strokes stay silent");
    }
    if bank.scratch.is_none() {
        tracing::debug!("no scratch sample, long strokes stay silent");
    }

    let len = ms_to_samples(total_ms.max(0.0) + TRAILING_PADDING_MS, sample_rate);
    let mut out = AudioBuffer::silent(sample_rate, len);

    let segments: Vec<Option<SegmentAudio>> = timeline
        .entries()
        .par_iter()
        .map(|e| segment_audio(doc, e, &bank, sample_rate))
        .collect();

    let mut mixed = 0usize;
    for seg in segments.into_iter().flatten() {
        overlay(&mut out.samples, &seg.samples, seg.start_sample);
        mixed += 1;
    }
    clamp_in_place(&mut out.samples);

    tracing::debug!(mixed, samples = out.samples.len(), "synthesized audio");
    out
}

#[cfg(test)]
#[path = "../../tests/unit/audio/synth.rs"]
mod tests;
