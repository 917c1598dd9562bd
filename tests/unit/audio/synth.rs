use super::*;
use crate::document::normalize::{Background, Page, Stroke, Tool};
use crate::foundation::core::{Fps, Rgb8};

const RATE: u32 = 1000;

fn pt(t: u64, x: f64, pressure: Option<f64>) -> MotionPoint {
    MotionPoint {
        pos: Point::new(x, 0.0),
        t_ms: t,
        pressure,
        is_eraser: false,
    }
}

fn stroke(points: Vec<MotionPoint>) -> Stroke {
    Stroke {
        tool: Tool::Pen,
        color: Rgb8::BLACK,
        width: 2.0,
        points,
    }
}

/// Moves one unit per millisecond, sampled every 10 ms.
fn fast_stroke(duration_ms: u64) -> Stroke {
    stroke(
        (0..=duration_ms / 10)
            .map(|i| pt(i * 10, (i * 10) as f64, None))
            .collect(),
    )
}

fn doc(strokes: Vec<Stroke>) -> Document {
    Document {
        fps: Fps::new(30, 1).unwrap(),
        total_duration_ms: None,
        total_motion_points: 0,
        pages: vec![Page {
            index: 0,
            width: 100.0,
            height: 100.0,
            background: Background::default(),
            strokes,
        }],
    }
}

fn entry(duration_ms: f64) -> TimelineEntry {
    TimelineEntry {
        page: 0,
        stroke: 0,
        start_ms: 40.0,
        end_ms: 40.0 + duration_ms,
    }
}

#[test]
fn gain_is_silent_below_speed_floor_and_never_amplifies() {
    assert_eq!(gain_db(0.0, 1.0), SILENCE_DB);
    assert_eq!(gain_db(0.019, 1.0), SILENCE_DB);
    assert_eq!(gain_db(f64::NAN, 1.0), SILENCE_DB);
    assert!((gain_db(0.5, 1.0) - 0.0).abs() < 1e-12);
    assert!((gain_db(5.0, 1.0) - 0.0).abs() < 1e-12);
    // Half speed, lightest pressure: 0.5 * 0.2 = 0.1 -> -20 dB.
    assert!((gain_db(0.25, 0.0) + 20.0).abs() < 1e-9);
    for speed in [0.02, 0.1, 0.3, 0.7, 10.0] {
        for p in [0.0, 0.3, 1.0] {
            assert!(gain_db(speed, p) <= 0.0);
        }
    }
}

#[test]
fn db_to_gain_matches_reference_points() {
    assert!((db_to_gain(0.0) - 1.0).abs() < 1e-6);
    assert!((db_to_gain(-20.0) - 0.1).abs() < 1e-6);
    assert!(db_to_gain(SILENCE_DB) < 1e-4);
}

#[test]
fn short_strokes_tap_and_empty_ones_are_silent() {
    let s = fast_stroke(150);
    assert_eq!(stroke_sound(&entry(150.0), &s.points), StrokeSound::Tap);
    assert_eq!(stroke_sound(&entry(0.0), &s.points), StrokeSound::Silent);
}

#[test]
fn long_stroke_has_one_chunk_per_ten_ms() {
    let s = fast_stroke(1200);
    let StrokeSound::Scratch(chunks) = stroke_sound(&entry(1200.0), &s.points) else {
        panic!("expected scratch");
    };
    assert_eq!(chunks.len(), 120);
    assert!(chunks.iter().all(|c| c.gain_db <= 0.0));
    assert_eq!(chunks[119].start_offset_ms, 1190.0);
    // Every chunk after the first sees ten units of travel.
    assert!(chunks[1..].iter().all(|c| c.gain_db.abs() < 1e-9));
}

#[test]
fn uneven_duration_gets_short_final_chunk() {
    let s = fast_stroke(305);
    let chunks = envelope(&s.points, 305.0);
    assert_eq!(chunks.len(), 31);
    assert_eq!(chunks[30].duration_ms, 5.0);
}

#[test]
fn position_carries_across_empty_chunks() {
    let points = vec![pt(0, 0.0, Some(1.0)), pt(25, 10.0, Some(1.0))];
    let (c0, cur) = chunk_envelope(&points, ChunkCursor::default(), 0.0, 10.0, false);
    assert_eq!(c0.gain_db, SILENCE_DB);
    assert_eq!(cur.next, 1);

    let (c1, cur) = chunk_envelope(&points, cur, 10.0, 10.0, false);
    assert_eq!(c1.gain_db, SILENCE_DB);
    assert_eq!(cur.last_pos, Some(Point::new(0.0, 0.0)));

    let (c2, cur) = chunk_envelope(&points, cur, 20.0, 10.0, true);
    // 10 units over 10 ms at full pressure.
    assert!(c2.gain_db.abs() < 1e-9);
    assert_eq!(cur.next, 2);
}

#[test]
fn envelope_orders_unsorted_samples_by_time() {
    let sorted = vec![pt(0, 0.0, None), pt(10, 10.0, None), pt(20, 20.0, None)];
    let shuffled = vec![sorted[2], sorted[0], sorted[1]];
    assert_eq!(envelope(&sorted, 20.0), envelope(&shuffled, 20.0));
}

#[test]
fn scratch_is_tiled_to_length_and_faded() {
    let clip = AudioClip::new(RATE, vec![0.5, 0.5, 0.5]);
    let chunks = vec![EnvelopeChunk {
        start_offset_ms: 0.0,
        duration_ms: 400.0,
        gain_db: 0.0,
    }];
    let out = render_scratch(&clip, 400.0, &chunks);
    assert_eq!(out.len(), 400);
    assert_eq!(out[0], 0.0);
    assert_eq!(out[399], 0.0);
    assert!((out[200] - 0.5).abs() < 1e-6);
    assert!(out[25] > 0.0 && out[25] < 0.5);
    assert!(out.iter().all(|s| s.abs() <= 0.5 + 1e-6));
}

#[test]
fn short_scratch_fade_is_a_quarter_of_duration() {
    let clip = AudioClip::new(RATE, vec![1.0]);
    let out = render_scratch(&clip, 100.0, &[]);
    // 25 ms fade each side at 1 sample/ms.
    assert!(out[24] < 1.0);
    assert_eq!(out[25], 1.0);
    assert_eq!(out[74], 1.0);
    assert!(out[75] < 1.0);
}

#[test]
fn tap_and_scratch_land_at_their_slots() {
    let d = doc(vec![fast_stroke(150), fast_stroke(1200)]);
    let tl = Timeline::build(&d);
    let bank = SoundBank {
        tap: Some(AudioClip::new(RATE, vec![1.0])),
        scratch: Some(AudioClip::new(RATE, vec![0.5])),
    };
    let out = synthesize(&d, &tl, &bank, tl.total_duration_ms(), RATE);

    assert_eq!(out.samples.len(), 1350 + 500);
    assert_eq!(out.samples[0], 1.0);
    assert!(out.samples[1..150].iter().all(|&s| s == 0.0));
    assert!((out.samples[150 + 600] - 0.5).abs() < 1e-6);
    assert!(out.samples[1350..].iter().all(|&s| s == 0.0));
}

#[test]
fn missing_clips_silence_their_strokes_only() {
    let d = doc(vec![fast_stroke(150), fast_stroke(1200)]);
    let tl = Timeline::build(&d);
    let bank = SoundBank {
        tap: None,
        scratch: Some(AudioClip::new(RATE, vec![0.5])),
    };
    let out = synthesize(&d, &tl, &bank, tl.total_duration_ms(), RATE);
    assert_eq!(out.samples[0], 0.0);
    assert!(out.samples[750] > 0.0);

    let out = synthesize(&d, &tl, &SoundBank::default(), tl.total_duration_ms(), RATE);
    assert!(out.samples.iter().all(|&s| s == 0.0));
}

#[test]
fn synthesis_is_deterministic() {
    let d = doc(vec![fast_stroke(150), fast_stroke(700), fast_stroke(90)]);
    let tl = Timeline::build(&d);
    let bank = SoundBank {
        tap: Some(AudioClip::new(RATE, vec![0.3, -0.3, 0.2])),
        scratch: Some(AudioClip::new(RATE, vec![0.1, 0.4, -0.2, 0.0])),
    };
    let a = synthesize(&d, &tl, &bank, tl.total_duration_ms(), RATE);
    let b = synthesize(&d, &tl, &bank, tl.total_duration_ms(), RATE);
    assert_eq!(a, b);
}
