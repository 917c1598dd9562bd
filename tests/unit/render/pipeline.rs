use super::*;
use crate::document::model::DocumentDef;
use crate::encode::sink::{InMemorySink, frame_file_name};

fn doc(json: &str) -> Document {
    Document::from_def(DocumentDef::from_json_str(json).unwrap())
        .unwrap()
        .0
}

const TWO_STROKES: &str = r#"{
    "frameRate": 10,
    "pages": [{
        "pageIndex": 0, "width": 40, "height": 30,
        "strokes": [
            {"tool": "pen", "width": 4, "motionPoints": [
                {"t": 0, "x": 5, "y": 10, "p": 1.0},
                {"t": 100, "x": 35, "y": 10, "p": 1.0}
            ]},
            {"tool": "pen", "width": 4, "motionPoints": [
                {"t": 0, "x": 5, "y": 20, "p": 1.0},
                {"t": 200, "x": 35, "y": 20, "p": 1.0}
            ]}
        ]
    }]
}"#;

#[test]
fn defaults_match_documented_values() {
    let o = RenderOpts::default();
    assert_eq!(o.scale, 1.0);
    assert_eq!(o.cursor_scale, 1.0);
    assert_eq!(o.min_width, 0.5);
    assert_eq!(o.threading.chunk_size, 64);
    assert!(!o.threading.parallel);
    assert!(o.video.is_none());
    assert_eq!(VideoOpts::new("x.mp4").quality, Quality::Medium);
}

#[test]
fn schedule_spans_the_whole_timeline() {
    let d = doc(TWO_STROKES);
    let job = RenderJob::new(&d, RenderOpts::default()).unwrap();
    assert_eq!(job.timeline().total_duration_ms(), 300.0);
    assert_eq!(job.schedule().len(), 4);
    assert_eq!(job.schedule().sample(3).unwrap().time_ms, 300.0);
    assert_eq!(job.canvas(), Canvas { width: 40, height: 30 });
}

#[test]
fn fps_override_and_scale_apply() {
    let d = doc(TWO_STROKES);
    let job = RenderJob::new(
        &d,
        RenderOpts {
            fps_override: Some(20.0),
            scale: 1.5,
            ..RenderOpts::default()
        },
    )
    .unwrap();
    assert_eq!(job.fps(), Fps::new(20, 1).unwrap());
    assert_eq!(job.schedule().len(), 7);
    assert_eq!(job.canvas(), Canvas { width: 60, height: 45 });

    let plan = job.plan_frame(6).unwrap();
    assert_eq!(plan.ops.len(), 2);
    assert_eq!(plan.ops[0].from, Point::new(7.5, 15.0));
    assert_eq!(plan.ops[0].width, 6.0);
}

#[test]
fn invalid_options_are_rejected() {
    let d = doc(TWO_STROKES);
    let bad = |o: RenderOpts| RenderJob::new(&d, o).is_err();
    assert!(bad(RenderOpts {
        fps_override: Some(0.0),
        ..RenderOpts::default()
    }));
    assert!(bad(RenderOpts {
        scale: -1.0,
        ..RenderOpts::default()
    }));
    assert!(bad(RenderOpts {
        cursor_scale: 0.0,
        ..RenderOpts::default()
    }));
    assert!(bad(RenderOpts {
        min_width: f64::NAN,
        ..RenderOpts::default()
    }));

    let empty = doc(r#"{"frameRate": 30, "pages": []}"#);
    assert!(RenderJob::new(&empty, RenderOpts::default()).is_err());
}

#[test]
fn out_of_range_frame_is_an_error() {
    let d = doc(TWO_STROKES);
    let job = RenderJob::new(&d, RenderOpts::default()).unwrap();
    assert!(job.plan_frame(4).is_err());
}

#[test]
fn cursor_follows_option() {
    let d = doc(TWO_STROKES);
    let plain = RenderJob::new(&d, RenderOpts::default()).unwrap();
    assert!(plain.plan_frame(1).unwrap().cursor.is_none());

    let job = RenderJob::new(
        &d,
        RenderOpts {
            show_cursor: true,
            cursor_scale: 2.0,
            ..RenderOpts::default()
        },
    )
    .unwrap();
    let cursor = job.plan_frame(1).unwrap().cursor.unwrap();
    assert_eq!(cursor.pos, Point::new(35.0, 10.0));
    assert_eq!(cursor.size, 2.0);
}

#[test]
fn sink_receives_every_frame_in_order() {
    let d = doc(TWO_STROKES);
    let job = RenderJob::new(&d, RenderOpts::default()).unwrap();
    let mut sink = InMemorySink::new();
    let stats = job.render_to_sink(&mut sink).unwrap();
    assert_eq!(
        stats,
        RenderStats {
            frames_total: 4,
            frames_rendered: 4
        }
    );
    let idx: Vec<u64> = sink.frames().iter().map(|(i, _)| i.0).collect();
    assert_eq!(idx, vec![0, 1, 2, 3]);
    let cfg = sink.config().unwrap();
    assert_eq!((cfg.width, cfg.height), (40, 30));
}

#[test]
fn parallel_chunks_match_sequential() {
    let d = doc(TWO_STROKES);
    let seq = RenderJob::new(&d, RenderOpts::default()).unwrap();
    let par = RenderJob::new(
        &d,
        RenderOpts {
            threading: RenderThreading {
                parallel: true,
                chunk_size: 3,
                threads: Some(2),
            },
            ..RenderOpts::default()
        },
    )
    .unwrap();

    let mut a = InMemorySink::new();
    let mut b = InMemorySink::new();
    seq.render_to_sink(&mut a).unwrap();
    par.render_to_sink(&mut b).unwrap();
    assert_eq!(a.frames(), b.frames());
}

#[test]
fn zero_threads_is_rejected() {
    assert!(build_thread_pool(Some(0)).is_err());
    assert_eq!(normalized_chunk_size(0), 1);
}

#[test]
fn rerun_into_same_dir_leaves_only_the_new_sequence() {
    let d = doc(TWO_STROKES);
    let dir = std::env::temp_dir().join(format!("penreplay_rerun_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    let opts = |fps: f64| RenderOpts {
        frames_dir: dir.clone(),
        fps_override: Some(fps),
        ..RenderOpts::default()
    };

    let long = RenderJob::new(&d, opts(20.0)).unwrap().run().unwrap();
    assert_eq!(long.stats.frames_rendered, 7);
    let short = RenderJob::new(&d, opts(10.0)).unwrap().run().unwrap();
    assert_eq!(short.stats.frames_rendered, 4);
    assert_eq!(short.frames_dir, dir);

    let mut names: Vec<String> = std::fs::read_dir(&dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    let expected: Vec<String> = (0..4).map(|k| frame_file_name(FrameIndex(k))).collect();
    assert_eq!(names, expected);

    let _ = std::fs::remove_dir_all(&dir);
}
