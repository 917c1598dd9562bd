use std::path::Path;
use std::sync::Arc;

use crate::audio::mix::f32le_to_samples;
use crate::foundation::error::{PenReplayError, PenReplayResult};

/// A short mono sound used as synthesis source material.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioClip {
    pub sample_rate: u32,
    pub samples: Arc<Vec<f32>>,
}

impl AudioClip {
    pub fn new(sample_rate: u32, samples: Vec<f32>) -> Self {
        Self {
            sample_rate,
            samples: Arc::new(samples),
        }
    }

    /// Decode any audio file `ffmpeg` understands into mono `f32` at `sample_rate`.
    pub fn load(path: &Path, sample_rate: u32) -> PenReplayResult<Self> {
        if !path.is_file() {
            return Err(PenReplayError::audio(format!(
                "audio sample '{}' does not exist",
                path.display()
            )));
        }

        let out = std::process::Command::new("ffmpeg")
            .args(["-v", "error", "-i"])
            .arg(path)
            .args([
                "-vn",
                "-f",
                "f32le",
                "-acodec",
                "pcm_f32le",
                "-ac",
                "1",
                "-ar",
                &sample_rate.to_string(),
                "pipe:1",
            ])
            .output()
            .map_err(|e| {
                PenReplayError::audio(format!("failed to run ffmpeg for audio decode: {e}"))
            })?;

        if !out.status.success() {
            return Err(PenReplayError::audio(format!(
                "ffmpeg audio decode failed for '{}': {}",
                path.display(),
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }

        let samples = f32le_to_samples(&out.stdout)?;
        if samples.is_empty() {
            return Err(PenReplayError::audio(format!(
                "audio sample '{}' decoded to no samples",
                path.display()
            )));
        }
        Ok(Self::new(sample_rate, samples))
    }

    /// This clip at `sample_rate`, linearly interpolated when the rates differ.
    pub fn at_rate(&self, sample_rate: u32) -> Self {
        if sample_rate == self.sample_rate || self.samples.is_empty() || self.sample_rate == 0 {
            return Self {
                sample_rate,
                samples: Arc::clone(&self.samples),
            };
        }

        let src = self.samples.as_slice();
        let ratio = f64::from(self.sample_rate) / f64::from(sample_rate);
        let len = ((src.len() as f64) / ratio).round().max(1.0) as usize;
        let last = src.len() - 1;
        let out = (0..len)
            .map(|i| {
                let pos = i as f64 * ratio;
                let i0 = (pos.floor() as usize).min(last);
                let i1 = (i0 + 1).min(last);
                let frac = (pos - i0 as f64) as f32;
                src[i0] + (src[i1] - src[i0]) * frac
            })
            .collect();
        Self::new(sample_rate, out)
    }
}

/// Source clips for synthesis; either may be missing.
#[derive(Clone, Debug, Default)]
pub struct SoundBank {
    pub tap: Option<AudioClip>,
    pub scratch: Option<AudioClip>,
}

impl SoundBank {
    /// Load whichever samples are configured. Never fails: a clip that cannot be loaded is
    /// logged and left out, which silences the strokes that would have used it.
    pub fn load(tap: Option<&Path>, scratch: Option<&Path>, sample_rate: u32) -> Self {
        let load = |label: &str, path: Option<&Path>| {
            let path = path?;
            match AudioClip::load(path, sample_rate) {
                Ok(clip) => {
                    tracing::debug!(label, samples = clip.samples.len(), "loaded audio sample");
                    Some(clip)
                }
                Err(e) => {
                    tracing::warn!(label, error = %e, "audio sample unavailable");
                    None
                }
            }
        };
        Self {
            tap: load("tap", tap),
            scratch: load("scratch", scratch),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tap.is_none() && self.scratch.is_none()
    }
}
