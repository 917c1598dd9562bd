use crate::foundation::core::{Fps, FrameIndex};

/// One instant to render.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameSample {
    pub index: FrameIndex,
    pub time_ms: f64,
}

/// Evenly spaced frame instants spanning `[0, total]`.
///
/// The frame count follows the frame rate (`floor(total_ms * fps / 1000) + 1`), but the step is
/// stretched so the first frame lands on 0 and the last exactly on `total`. Random access lets
/// frames be rendered out of order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameSchedule {
    total_ms: f64,
    len: u64,
    step_ms: f64,
}

impl FrameSchedule {
    pub fn new(total_ms: f64, fps: Fps) -> Self {
        let total_ms = if total_ms.is_finite() { total_ms.max(0.0) } else { 0.0 };
        let len = fps.ms_to_frames_floor(total_ms).saturating_add(1);
        let step_ms = total_ms / (len.saturating_sub(1).max(1)) as f64;
        Self {
            total_ms,
            len,
            step_ms,
        }
    }

    /// Number of frames; always at least 1.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// A schedule always holds at least one frame.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn total_ms(&self) -> f64 {
        self.total_ms
    }

    /// Instant of frame `k`, or `None` past the end.
    pub fn sample(&self, k: u64) -> Option<FrameSample> {
        if k >= self.len {
            return None;
        }
        // Pin the last frame so rounding never leaves it short of the end.
        let time_ms = if k + 1 == self.len && self.len > 1 {
            self.total_ms
        } else {
            k as f64 * self.step_ms
        };
        Some(FrameSample {
            index: FrameIndex(k),
            time_ms,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = FrameSample> + '_ {
        (0..self.len).filter_map(|k| self.sample(k))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/sampler.rs"]
mod tests;
