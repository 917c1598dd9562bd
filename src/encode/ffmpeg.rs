use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::audio::mix::MIX_SAMPLE_RATE;
use crate::encode::sink::FRAME_PATTERN;
use crate::foundation::core::Fps;
use crate::foundation::error::{PenReplayError, PenReplayResult};

/// GIF output width in pixels; height follows the aspect ratio.
pub const GIF_WIDTH: u32 = 800;

/// Encoder preset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Quality {
    High,
    #[default]
    Medium,
    Low,
    /// Animated GIF; audio is ignored.
    Gif,
}

impl Quality {
    /// `(crf, preset)` for the H.264 presets.
    fn x264(self) -> Option<(u8, &'static str)> {
        match self {
            Self::High => Some((18, "slow")),
            Self::Medium => Some((23, "medium")),
            Self::Low => Some((28, "veryfast")),
            Self::Gif => None,
        }
    }
}

impl std::str::FromStr for Quality {
    type Err = PenReplayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            "gif" => Ok(Self::Gif),
            other => Err(PenReplayError::validation(format!(
                "unknown quality '{other}' (expected high, medium, low or gif)"
            ))),
        }
    }
}

/// One `ffmpeg` run turning a frame directory (plus optional audio) into a video.
#[derive(Clone, Debug)]
pub struct EncodeRequest {
    /// Directory holding `frame_NNNNNN.png`.
    pub frames_dir: PathBuf,
    pub fps: Fps,
    /// Mono `f32le` PCM at [`MIX_SAMPLE_RATE`].
    pub audio: Option<PathBuf>,
    pub out_path: PathBuf,
    pub quality: Quality,
    /// Overwrite `out_path` if it already exists.
    pub overwrite: bool,
}

/// Full `ffmpeg` argument list for `req`.
pub fn build_args(req: &EncodeRequest) -> Vec<OsString> {
    let mut args: Vec<OsString> = Vec::new();
    let mut push = |a: &str| args.push(a.into());

    push(if req.overwrite { "-y" } else { "-n" });
    push("-loglevel");
    push("error");
    push("-framerate");
    push(&format!("{}/{}", req.fps.num, req.fps.den));
    push("-i");
    args.push(req.frames_dir.join(FRAME_PATTERN).into_os_string());

    let Some((crf, preset)) = req.quality.x264() else {
        args.extend(
            [
                "-vf",
                format!(
                    "scale={GIF_WIDTH}:-1:flags=lanczos,split[s0][s1];[s0]palettegen[p];[s1][p]paletteuse"
                )
                .as_str(),
                "-loop",
                "0",
            ]
            .map(OsString::from),
        );
        args.push(req.out_path.clone().into_os_string());
        return args;
    };

    if let Some(audio) = &req.audio {
        args.extend(
            ["-f", "f32le", "-ar", MIX_SAMPLE_RATE.to_string().as_str(), "-ac", "1", "-i"]
                .map(OsString::from),
        );
        args.push(audio.clone().into_os_string());
    }

    // yuv420p needs even dimensions.
    args.extend(
        [
            "-vf",
            "pad=ceil(iw/2)*2:ceil(ih/2)*2",
            "-c:v",
            "libx264",
            "-crf",
            crf.to_string().as_str(),
            "-preset",
            preset,
            "-pix_fmt",
            "yuv420p",
        ]
        .map(OsString::from),
    );
    if req.audio.is_some() {
        args.extend(["-c:a", "aac", "-shortest"].map(OsString::from));
    } else {
        args.push("-an".into());
    }
    args.extend(["-movflags", "+faststart"].map(OsString::from));
    args.push(req.out_path.clone().into_os_string());
    args
}

/// Encode a PNG sequence with the system `ffmpeg`.
#[tracing::instrument(skip(req), fields(out = %req.out_path.display(), quality = ?req.quality))]
pub fn encode_sequence(req: &EncodeRequest) -> PenReplayResult<()> {
    if !is_ffmpeg_on_path() {
        return Err(PenReplayError::encode(
            "ffmpeg is required for video encoding, but was not found on PATH",
        ));
    }
    ensure_parent_dir(&req.out_path)?;
    if !req.overwrite && req.out_path.exists() {
        return Err(PenReplayError::validation(format!(
            "output file '{}' already exists",
            req.out_path.display()
        )));
    }

    let args = build_args(req);
    tracing::debug!(?args, "spawning ffmpeg");
    let out = Command::new("ffmpeg")
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| {
            PenReplayError::encode(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

    if !out.status.success() {
        let stderr = String::from_utf8_lossy(&out.stderr);
        return Err(PenReplayError::encode(format!(
            "ffmpeg exited with status {}: {}",
            out.status,
            stderr.trim()
        )));
    }
    tracing::info!("video encoded");
    Ok(())
}

/// Remove intermediate files, returning how many were deleted.
pub fn cleanup_frames(paths: &[PathBuf]) -> usize {
    let mut removed = 0;
    for p in paths {
        match std::fs::remove_file(p) {
            Ok(()) => removed += 1,
            Err(e) => tracing::warn!(path = %p.display(), error = %e, "failed to remove intermediate"),
        }
    }
    removed
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> PenReplayResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
