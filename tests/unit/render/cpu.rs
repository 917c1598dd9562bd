use super::*;

fn plan(width: u32, height: u32, ops: Vec<DrawOp>) -> FramePlan {
    FramePlan {
        width,
        height,
        scale: 1.0,
        background: Background::default(),
        ops,
        cursor: None,
    }
}

fn seg(x0: f64, x1: f64, y: f64, width: f64, mode: DrawMode) -> DrawOp {
    DrawOp {
        from: Point::new(x0, y),
        to: Point::new(x1, y),
        width,
        mode,
    }
}

fn is_white(px: [u8; 4]) -> bool {
    px == [255, 255, 255, 255]
}

#[test]
fn empty_plan_is_filled_with_background() {
    let mut be = CpuBackend::new();
    let mut p = plan(16, 8, Vec::new());
    p.background.color = Rgb8::new(10, 20, 30);
    let frame = be.render_plan(&p).unwrap();
    assert_eq!((frame.width, frame.height), (16, 8));
    assert_eq!(frame.data.len(), 16 * 8 * 4);
    assert!(frame.premultiplied);
    assert!(frame.data.chunks_exact(4).all(|px| px == [10, 20, 30, 255]));
}

#[test]
fn ink_segment_covers_its_path_only() {
    let mut be = CpuBackend::new();
    let frame = be
        .render_plan(&plan(
            32,
            20,
            vec![seg(2.0, 30.0, 10.0, 6.0, DrawMode::Ink(Rgb8::BLACK))],
        ))
        .unwrap();
    let mid = frame.pixel(16, 10).unwrap();
    assert!(mid[0] < 10 && mid[3] == 255);
    assert!(is_white(frame.pixel(16, 1).unwrap()));
    assert!(is_white(frame.pixel(16, 18).unwrap()));
}

#[test]
fn erase_restores_background_over_ink() {
    let mut be = CpuBackend::new();
    let frame = be
        .render_plan(&plan(
            32,
            20,
            vec![
                seg(2.0, 30.0, 10.0, 6.0, DrawMode::Ink(Rgb8::new(200, 0, 0))),
                seg(10.0, 22.0, 10.0, 8.0, DrawMode::Erase),
            ],
        ))
        .unwrap();
    assert!(is_white(frame.pixel(16, 10).unwrap()));
    let kept = frame.pixel(4, 10).unwrap();
    assert!(kept[0] > 150 && kept[1] < 50);
}

#[test]
fn ruled_pattern_marks_lines_but_not_gaps() {
    let mut be = CpuBackend::new();
    let mut p = plan(40, 120, Vec::new());
    p.background.pattern = Pattern::Ruled;
    let frame = be.render_plan(&p).unwrap();
    assert!(!is_white(frame.pixel(20, 80).unwrap()));
    assert!(is_white(frame.pixel(20, 92).unwrap()));
}

#[test]
fn cursor_glyph_is_drawn_at_its_position() {
    let mut be = CpuBackend::new();
    let mut p = plan(40, 40, Vec::new());
    p.cursor = Some(CursorPlan {
        pos: Point::new(20.0, 20.0),
        kind: CursorKind::Pen,
        size: 2.0,
    });
    let frame = be.render_plan(&p).unwrap();
    assert!(frame.pixel(20, 20).unwrap()[0] < 100);
    assert!(is_white(frame.pixel(2, 2).unwrap()));
}

#[test]
fn oversize_frames_are_rejected() {
    let mut be = CpuBackend::new();
    assert!(be.render_plan(&plan(70_000, 10, Vec::new())).is_err());
    assert!(be.render_plan(&plan(0, 10, Vec::new())).is_err());
}

#[test]
fn grid_lines_stop_before_limit() {
    let v: Vec<f64> = grid_lines(10.0, 10.0, 35.0).collect();
    assert_eq!(v, vec![10.0, 20.0, 30.0]);
    assert_eq!(grid_lines(5.0, 0.0, 3.0).count(), 0);
}
