//! Scalar units used across the pipeline.
//!
//! Linear magnitudes and decibels are kept apart as newtypes; the only way
//! from one to the other is [`Magnitude::to_db`].

use serde::Serialize;
use std::fmt;

/// Smallest magnitude fed into the logarithm.
pub const MIN_MAGNITUDE: f32 = 1e-4;

/// `20 * log10(MIN_MAGNITUDE)`.
pub const MIN_DB: Decibel = Decibel(-80.0);

/// Linear spectral magnitude (non-negative).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize)]
#[serde(transparent)]
pub struct Magnitude(f32);

impl Magnitude {
    pub const FLOOR: Magnitude = Magnitude(MIN_MAGNITUDE);

    /// Negative and NaN inputs collapse to zero.
    pub fn new(value: f32) -> Self {
        if value > 0.0 {
            Magnitude(value)
        } else {
            Magnitude(0.0)
        }
    }

    pub fn value(self) -> f32 {
        self.0
    }

    /// Converts to decibels, clamping at [`MIN_MAGNITUDE`] first.
    pub fn to_db(self) -> Decibel {
        let db = 20.0 * self.0.max(MIN_MAGNITUDE).log10();
        Decibel(db.max(MIN_DB.0))
    }
}

/// Level in decibels relative to a unit magnitude.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Decibel(f32);

impl Decibel {
    pub fn value(self) -> f32 {
        self.0
    }

    pub fn max(self, other: Decibel) -> Decibel {
        if other.0 > self.0 {
            other
        } else {
            self
        }
    }

    /// Linear interpolation between two levels, `t` in `[0, 1]`.
    pub fn lerp(self, other: Decibel, t: f32) -> Decibel {
        let t = t.clamp(0.0, 1.0);
        Decibel(self.0 + (other.0 - self.0) * t)
    }
}

impl Default for Decibel {
    fn default() -> Self {
        MIN_DB
    }
}

impl fmt::Display for Decibel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} dB", self.0)
    }
}

pub fn hz_to_mel(hz: f32) -> f32 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

pub fn mel_to_hz(mel: f32) -> f32 {
    700.0 * (10f32.powf(mel / 2595.0) - 1.0)
}
