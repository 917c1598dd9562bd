use std::path::Path;

use crate::foundation::error::{PenReplayError, PenReplayResult};

/// Internal audio mixing sample rate used across decode/synthesis/encode.
pub const MIX_SAMPLE_RATE: u32 = 48_000;

/// Mono `f32` PCM ready for the encoder.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioBuffer {
    pub sample_rate: u32,
    pub samples: Vec<f32>,
}

impl AudioBuffer {
    /// Silent buffer of `len` samples.
    pub fn silent(sample_rate: u32, len: usize) -> Self {
        Self {
            sample_rate,
            samples: vec![0.0; len],
        }
    }

    pub fn duration_ms(&self) -> f64 {
        self.samples.len() as f64 * 1000.0 / f64::from(self.sample_rate.max(1))
    }
}

/// Milliseconds to the nearest sample index at `sample_rate`.
pub fn ms_to_samples(ms: f64, sample_rate: u32) -> usize {
    if !ms.is_finite() || ms <= 0.0 {
        return 0;
    }
    (ms * f64::from(sample_rate) / 1000.0).round() as usize
}

/// Add `src` into `dst` starting at `offset`; anything past the end of `dst` is dropped.
pub fn overlay(dst: &mut [f32], src: &[f32], offset: usize) {
    let Some(window) = dst.get_mut(offset..) else {
        return;
    };
    for (d, s) in window.iter_mut().zip(src) {
        *d += *s;
    }
}

pub fn clamp_in_place(samples: &mut [f32]) {
    for s in samples {
        *s = s.clamp(-1.0, 1.0);
    }
}

/// Write `f32` PCM samples to a raw little-endian `.f32le` file.
pub fn write_f32le(samples: &[f32], out_path: &Path) -> PenReplayResult<()> {
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            PenReplayError::audio(format!(
                "failed to create audio output directory '{}': {e}",
                parent.display()
            ))
        })?;
    }

    let mut bytes = Vec::<u8>::with_capacity(samples.len() * 4);
    for &sample in samples {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    std::fs::write(out_path, bytes).map_err(|e| {
        PenReplayError::audio(format!(
            "failed to write audio file '{}': {e}",
            out_path.display()
        ))
    })
}

/// Decode raw little-endian `f32` PCM bytes.
pub fn f32le_to_samples(bytes: &[u8]) -> PenReplayResult<Vec<f32>> {
    if !bytes.len().is_multiple_of(4) {
        return Err(PenReplayError::audio(
            "decoded audio byte length is not aligned to f32 samples",
        ));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

#[cfg(test)]
#[path = "../../tests/unit/audio/mix.rs"]
mod tests;
