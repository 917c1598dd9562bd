use super::*;
use crate::document::normalize::{Background, MotionPoint, Page, Stroke, Tool};
use crate::foundation::core::{Fps, Point, Rgb8};

fn stroke(ts: &[u64]) -> Stroke {
    Stroke {
        tool: Tool::Pen,
        color: Rgb8::BLACK,
        width: 2.0,
        points: ts
            .iter()
            .enumerate()
            .map(|(i, &t)| MotionPoint {
                pos: Point::new(i as f64, 0.0),
                t_ms: t,
                pressure: None,
                is_eraser: false,
            })
            .collect(),
    }
}

fn doc(pages: Vec<Vec<Stroke>>) -> Document {
    Document {
        fps: Fps::new(30, 1).unwrap(),
        total_duration_ms: None,
        total_motion_points: 0,
        pages: pages
            .into_iter()
            .enumerate()
            .map(|(index, strokes)| Page {
                index,
                width: 100.0,
                height: 100.0,
                background: Background::default(),
                strokes,
            })
            .collect(),
    }
}

#[test]
fn entries_are_contiguous_and_start_at_zero() {
    let d = doc(vec![
        vec![stroke(&[0, 120]), stroke(&[0]), stroke(&[0, 30, 75])],
        vec![stroke(&[]), stroke(&[5, 5]), stroke(&[0, 400])],
    ]);
    let tl = Timeline::build(&d);
    let e = tl.entries();

    assert_eq!(e.len(), 4);
    assert_eq!(e[0].start_ms, 0.0);
    for w in e.windows(2) {
        assert_eq!(w[0].end_ms, w[1].start_ms);
    }
    assert_eq!(
        e.iter().map(|x| (x.page, x.stroke)).collect::<Vec<_>>(),
        vec![(0, 0), (0, 2), (1, 1), (1, 2)]
    );
    assert_eq!(tl.total_duration_ms(), 120.0 + 75.0 + 0.0 + 400.0);
}

#[test]
fn duration_uses_min_and_max_not_order() {
    let d = doc(vec![vec![stroke(&[50, 0, 200, 10])]]);
    let tl = Timeline::build(&d);
    assert_eq!(tl.entries()[0].duration_ms(), 200.0);
}

#[test]
fn zero_duration_strokes_take_zero_width_slots() {
    let d = doc(vec![vec![stroke(&[0, 100]), stroke(&[7, 7]), stroke(&[0, 50])]]);
    let tl = Timeline::build(&d);
    let e = tl.entries();
    assert_eq!(e[1].start_ms, 100.0);
    assert_eq!(e[1].end_ms, 100.0);
    assert_eq!(e[2].start_ms, 100.0);
}

#[test]
fn empty_document_has_empty_timeline() {
    let tl = Timeline::build(&doc(vec![vec![stroke(&[1])]]));
    assert!(tl.is_empty());
    assert_eq!(tl.total_duration_ms(), 0.0);
    assert_eq!(tl.active_entry_at(0.0), None);
}

#[test]
fn active_entry_matches_linear_first_match_scan() {
    let d = doc(vec![
        vec![stroke(&[0, 100]), stroke(&[3, 3])],
        vec![stroke(&[0, 0]), stroke(&[0, 40])],
        vec![stroke(&[0, 250])],
    ]);
    let tl = Timeline::build(&d);

    let linear = |t: f64| tl.entries().iter().position(|e| e.contains(t));
    let mut t = -10.0;
    while t <= 420.0 {
        assert_eq!(tl.active_entry_at(t), linear(t), "t = {t}");
        t += 2.5;
    }

    // Shared boundary resolves to the earlier entry.
    assert_eq!(tl.active_entry_at(100.0), Some(0));
    assert_eq!(tl.active_entry_at(140.0), Some(3));
}

#[test]
fn entry_resolves_back_to_its_stroke() {
    let d = doc(vec![vec![stroke(&[0]), stroke(&[0, 9])]]);
    let tl = Timeline::build(&d);
    let s = tl.entries()[0].resolve(&d).unwrap();
    assert_eq!(s.points.len(), 2);
}
