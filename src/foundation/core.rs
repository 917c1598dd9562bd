use crate::foundation::error::{PenReplayError, PenReplayResult};

pub use kurbo::Point;

/// Absolute 0-based frame index in the reconstructed timeline.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32, // must be > 0
}

impl Fps {
    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> PenReplayResult<Self> {
        if den == 0 {
            return Err(PenReplayError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(PenReplayError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Convert a floating-point rate (as found in recordings and on the command line).
    ///
    /// Whole rates stay exact (`30.0` -> `30/1`); fractional rates are kept to a millisecond
    /// precision denominator and reduced (`29.97` -> `2997/100`).
    pub fn from_rate(rate: f64) -> PenReplayResult<Self> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(PenReplayError::validation(format!(
                "frame rate must be a positive number, got {rate}"
            )));
        }
        if rate > f64::from(u32::MAX) / 1000.0 {
            return Err(PenReplayError::validation(format!(
                "frame rate {rate} is out of range"
            )));
        }
        if rate.fract() == 0.0 {
            return Self::new(rate as u32, 1);
        }

        let num = (rate * 1000.0).round() as u32;
        let g = gcd(num, 1000);
        Self::new(num / g, 1000 / g)
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Whole frames elapsed after `ms` milliseconds: `floor(ms * num / (1000 * den))`.
    ///
    /// Whole-millisecond durations use exact integer math. Fractional ones allow for a little
    /// float noise so `1160 ms @ 25` still counts 29 frames.
    pub fn ms_to_frames_floor(self, ms: f64) -> u64 {
        if !ms.is_finite() || ms <= 0.0 {
            return 0;
        }
        let per = 1000 * u128::from(self.den);
        if ms.fract() == 0.0 && ms <= u64::MAX as f64 {
            let frames = (ms as u128).saturating_mul(u128::from(self.num)) / per;
            return u64::try_from(frames).unwrap_or(u64::MAX);
        }
        let frames = ms * f64::from(self.num) / per as f64;
        (frames + 1e-9 * frames.max(1.0)).floor() as u64
    }
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a.max(1)
}

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Pixel size of a page of `width x height` units rendered at `scale`.
    pub fn for_page(width: f64, height: f64, scale: f64) -> PenReplayResult<Self> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(PenReplayError::validation(format!(
                "render scale must be positive, got {scale}"
            )));
        }
        let px = |v: f64| -> PenReplayResult<u32> {
            let scaled = (v * scale).ceil();
            if !scaled.is_finite() || scaled > f64::from(u16::MAX) {
                return Err(PenReplayError::validation(format!(
                    "scaled page dimension {scaled} exceeds the raster limit"
                )));
            }
            Ok((scaled as u32).max(1))
        };
        Ok(Self {
            width: px(width)?,
            height: px(height)?,
        })
    }
}

/// Opaque 8-bit RGB color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Rgb8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb8 {
    /// Build a color from channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Pure white.
    pub const WHITE: Self = Self::new(255, 255, 255);
    /// Pure black.
    pub const BLACK: Self = Self::new(0, 0, 0);

    /// The color as an opaque RGBA8 quadruple.
    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, 255]
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
