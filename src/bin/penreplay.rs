use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use penreplay::{
    CpuBackend, Document, FrameSchedule, Quality, RenderBackend as _, RenderJob, RenderOpts,
    RenderThreading, Timeline, VideoOpts,
};

#[derive(Parser, Debug)]
#[command(name = "penreplay", version)]
struct Cli {
    /// Log debug diagnostics to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the PNG sequence, pen audio and optionally a video.
    Render(RenderArgs),
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
    /// Print a summary of a recording.
    Info(InfoArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input motion_metadata.json.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output directory for frames and the audio track.
    #[arg(long)]
    out: PathBuf,

    /// Override the recording's frame rate.
    #[arg(long)]
    fps: Option<f64>,

    /// Encode a video to this path (requires `ffmpeg` on PATH).
    #[arg(long)]
    video: Option<PathBuf>,

    /// Encoder preset: high, medium, low or gif.
    #[arg(long, default_value = "medium")]
    quality: Quality,

    /// Delete frames and audio after a successful encode.
    #[arg(long, default_value_t = false)]
    cleanup: bool,

    /// Draw the tool cursor.
    #[arg(long, default_value_t = false)]
    cursor: bool,

    /// Page units to pixels.
    #[arg(long, default_value_t = 1.0)]
    scale: f64,

    #[arg(long, default_value_t = 1.0)]
    cursor_scale: f64,

    /// Tap sample for short strokes.
    #[arg(long)]
    tap: Option<PathBuf>,

    /// Scratch sample for long strokes.
    #[arg(long)]
    scratch: Option<PathBuf>,

    /// Enable frame-level parallelism.
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Override rayon worker threads (parallel mode only).
    #[arg(long)]
    threads: Option<usize>,

    /// Render chunk size (parallel mode only).
    #[arg(long, default_value_t = 64)]
    chunk_size: usize,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input motion_metadata.json.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Frame index (0-based).
    #[arg(long)]
    frame: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    #[arg(long)]
    fps: Option<f64>,

    #[arg(long, default_value_t = 1.0)]
    scale: f64,

    #[arg(long, default_value_t = false)]
    cursor: bool,
}

#[derive(Parser, Debug)]
struct InfoArgs {
    /// Input motion_metadata.json.
    #[arg(long = "in")]
    in_path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Info(args) => cmd_info(args),
    }
}

fn load(path: &std::path::Path) -> anyhow::Result<Document> {
    let (doc, report) =
        Document::load(path).with_context(|| format!("load recording '{}'", path.display()))?;
    tracing::debug!(?report, "recording normalized");
    Ok(doc)
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let doc = load(&args.in_path)?;
    let opts = RenderOpts {
        fps_override: args.fps,
        frames_dir: args.out,
        video: args.video.map(|out_path| VideoOpts {
            quality: args.quality,
            cleanup_frames: args.cleanup,
            ..VideoOpts::new(out_path)
        }),
        show_cursor: args.cursor,
        scale: args.scale,
        cursor_scale: args.cursor_scale,
        tap_sample: args.tap,
        scratch_sample: args.scratch,
        threading: RenderThreading {
            parallel: args.parallel,
            chunk_size: args.chunk_size,
            threads: args.threads,
        },
        ..RenderOpts::default()
    };

    let job = RenderJob::new(&doc, opts).context("prepare render job")?;
    let summary = job.run().context("render replay")?;

    eprintln!(
        "wrote {} frames to {}",
        summary.stats.frames_rendered,
        summary.frames_dir.display()
    );
    if let Some(audio) = &summary.audio_path {
        eprintln!("wrote audio {}", audio.display());
    }
    if let Some(video) = &summary.video_path {
        eprintln!("wrote {}", video.display());
    }
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let doc = load(&args.in_path)?;
    let opts = RenderOpts {
        fps_override: args.fps,
        scale: args.scale,
        show_cursor: args.cursor,
        ..RenderOpts::default()
    };
    let job = RenderJob::new(&doc, opts).context("prepare render job")?;
    let plan = job
        .plan_frame(args.frame)
        .with_context(|| format!("plan frame {}", args.frame))?;
    let background = plan.background.color;
    let frame = CpuBackend::new()
        .render_plan(&plan)
        .with_context(|| format!("render frame {}", args.frame))?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    penreplay::encode::sink::save_frame_png(&frame, background, &args.out)
        .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_info(args: InfoArgs) -> anyhow::Result<()> {
    let doc = load(&args.in_path)?;
    let timeline = Timeline::build(&doc);
    let total_ms = doc
        .total_duration_ms
        .unwrap_or_else(|| timeline.total_duration_ms());
    let frames = FrameSchedule::new(total_ms, doc.fps).len();
    let strokes = doc.strokes().count();
    let points: usize = doc.strokes().map(|s| s.points.len()).sum();

    println!("frame rate:     {:.3} fps", doc.fps.as_f64());
    println!("pages:          {}", doc.pages.len());
    println!("strokes:        {strokes} ({} on the timeline)", timeline.entries().len());
    println!("motion points:  {points}");
    println!("duration:       {:.3} s", total_ms / 1000.0);
    println!("frames:         {frames}");
    println!(
        "pressure data:  {}",
        if doc.has_pressure() { "yes" } else { "no" }
    );
    Ok(())
}
